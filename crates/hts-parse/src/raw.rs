//! Raw-data parser: applies a rule set to a cell matrix, yielding one or
//! more named datasets.

use tracing::debug;

use hts_model::{Cell, CellMatrix, PlateFormat, row_labels};
use hts_rules::{
    Axis, DatasetAnchor, DatasetNaming, DatasetRules, DatasetSeparator, GridOrTable, RawRuleSet,
    Verification,
};

use crate::anchor::{apply_offset, find_keyword, next_occupied_row};
use crate::error::ParseError;

/// One extracted dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub name: String,
    pub kind: DatasetKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetKind {
    /// Plate-shaped readings in well-index order; `None` for empty cells.
    Grid {
        format: PlateFormat,
        values: Vec<Option<f64>>,
    },
    /// Per-sample (or per-sample/time) rows under discovered headers.
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<Cell>>,
    },
}

#[derive(Debug, Clone)]
struct Region {
    top_left: (usize, usize),
    kind: DatasetKind,
    /// Exclusive end of the sliced rows.
    end_row: usize,
    /// Exclusive end of the sliced columns.
    end_column: usize,
    /// Keyword cell or first header, used by from-file naming.
    title: Option<String>,
}

/// Parses the matrix according to the rule set.
pub fn parse_raw(matrix: &CellMatrix, rules: &RawRuleSet) -> Result<Vec<Dataset>, ParseError> {
    verify(matrix, &rules.verification)?;

    let regions = extract_regions(matrix, &rules.datasets, rules)?;
    debug!(rule_set = %rules.name, datasets = regions.len(), "datasets extracted");

    let names = dataset_names(&rules.naming, &regions)?;

    let mut datasets = Vec::with_capacity(regions.len());
    for (index, region) in regions.iter().enumerate() {
        match &rules.sub_datasets {
            Some(sub_rules) => {
                let window = window_matrix(matrix, region, regions.get(index + 1));
                let sub_regions = extract_regions(&window, sub_rules, rules)?;
                for (sub_index, sub_region) in sub_regions.iter().enumerate() {
                    let sub_name = sub_region
                        .title
                        .clone()
                        .unwrap_or_else(|| format!("{}", sub_index + 1));
                    datasets.push(Dataset {
                        name: format!("{}/{}", names[index], sub_name),
                        kind: sub_region.kind.clone(),
                    });
                }
            }
            None => datasets.push(Dataset {
                name: names[index].clone(),
                kind: region.kind.clone(),
            }),
        }
    }
    Ok(datasets)
}

fn verify(matrix: &CellMatrix, verification: &Verification) -> Result<(), ParseError> {
    if !verification.enabled {
        return Ok(());
    }
    let found = find_keyword(
        matrix,
        &verification.keyword,
        verification.exact,
        verification.row,
        verification.column,
        verification.axis,
    );
    if found.is_none() {
        return Err(ParseError::VerificationFailed {
            keyword: verification.keyword.clone(),
        });
    }
    Ok(())
}

/// Runs the anchor/slice/re-anchor state machine for one level of
/// dataset nesting.
fn extract_regions(
    matrix: &CellMatrix,
    rules: &DatasetRules,
    config: &RawRuleSet,
) -> Result<Vec<Region>, ParseError> {
    let (first, first_title) = anchor_first(matrix, &rules.anchor)?;
    let mut regions: Vec<Region> = Vec::new();
    let mut top_left = first;
    let mut title = first_title;
    loop {
        let mut region = slice_region(matrix, top_left, config)?;
        // A keyword-anchor title is more specific than a header cell.
        if let Some(anchor_title) = title.take() {
            region.title = Some(anchor_title);
        }
        regions.push(region);

        if !rules.multiple || (rules.count > 0 && regions.len() as i64 == rules.count) {
            break;
        }
        let previous = regions.last().map(|r| (r.top_left, r.end_row, r.end_column));
        let (previous_top, end_row, end_column) = match previous {
            Some(p) => p,
            None => break,
        };
        match next_anchor(matrix, rules, first, previous_top, end_row, end_column) {
            Ok(Some((next, next_title))) => {
                // Dynamic discovery ends at the first anchor pointing into
                // blank space.
                if rules.count == -1 && !region_present(matrix, next) {
                    break;
                }
                top_left = next;
                title = next_title;
            }
            Ok(None) | Err(_) if rules.count == -1 => break,
            Ok(None) => {
                return Err(ParseError::AnchorOutOfBounds {
                    row: end_row as i64,
                    column: end_column as i64,
                });
            }
            Err(error) => return Err(error),
        }
    }
    Ok(regions)
}

/// Anchor search honoring fixed row/column restrictions (either may be
/// `None`, meaning scan). Returns the dataset top-left and the keyword
/// cell text when anchored by keyword.
fn anchor_first(
    matrix: &CellMatrix,
    anchor: &DatasetAnchor,
) -> Result<((usize, usize), Option<String>), ParseError> {
    match anchor {
        DatasetAnchor::Coordinates { row, column } => {
            if *row >= matrix.n_rows() || *column >= matrix.n_columns() {
                return Err(ParseError::AnchorOutOfBounds {
                    row: *row as i64,
                    column: *column as i64,
                });
            }
            Ok(((*row, *column), None))
        }
        DatasetAnchor::Keyword {
            keyword,
            exact,
            row,
            column,
            offset,
        } => {
            let hit = find_anchor_keyword(matrix, keyword, *exact, *row, *column, 0)
                .ok_or_else(|| ParseError::KeywordNotFound {
                    keyword: keyword.clone(),
                })?;
            let title = Some(matrix.get(hit.0, hit.1).display());
            let top_left = apply_offset(hit, *offset, matrix)?;
            Ok((top_left, title))
        }
    }
}

/// Keyword search for dataset anchoring: fixed row scans that row's
/// columns, fixed column scans that column's rows, both fixed checks one
/// cell, neither scans row-major. `from_row` skips already-consumed rows.
fn find_anchor_keyword(
    matrix: &CellMatrix,
    keyword: &str,
    exact: bool,
    row: Option<usize>,
    column: Option<usize>,
    from_row: usize,
) -> Option<(usize, usize)> {
    match (row, column) {
        (Some(r), Some(c)) => {
            (r >= from_row && matrix.get(r, c).matches(keyword, exact)).then_some((r, c))
        }
        (Some(r), None) => {
            if r < from_row {
                return None;
            }
            (0..matrix.n_columns())
                .find(|&c| matrix.get(r, c).matches(keyword, exact))
                .map(|c| (r, c))
        }
        (None, Some(c)) => (from_row..matrix.n_rows())
            .find(|&r| matrix.get(r, c).matches(keyword, exact))
            .map(|r| (r, c)),
        (None, None) => {
            for r in from_row..matrix.n_rows() {
                for c in 0..matrix.n_columns() {
                    if matrix.get(r, c).matches(keyword, exact) {
                        return Some((r, c));
                    }
                }
            }
            None
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn next_anchor(
    matrix: &CellMatrix,
    rules: &DatasetRules,
    first_top: (usize, usize),
    previous_top: (usize, usize),
    end_row: usize,
    end_column: usize,
) -> Result<Option<((usize, usize), Option<String>)>, ParseError> {
    match &rules.separator {
        DatasetSeparator::SameAsMain => match &rules.anchor {
            DatasetAnchor::Keyword {
                keyword,
                exact,
                row: _,
                column,
                offset,
            } => {
                // Fixed-row anchors cannot recur; scan onward from the end
                // of the previous dataset instead.
                let Some(hit) =
                    find_anchor_keyword(matrix, keyword, *exact, None, *column, end_row)
                else {
                    return Ok(None);
                };
                let title = Some(matrix.get(hit.0, hit.1).display());
                Ok(Some((apply_offset(hit, *offset, matrix)?, title)))
            }
            DatasetAnchor::Coordinates { .. } => Ok(None),
        },
        DatasetSeparator::EmptyLine => match rules.axis {
            Axis::Down => {
                let Some(next) = next_occupied_row(matrix, end_row) else {
                    return Ok(None);
                };
                if next == end_row {
                    // No separating blank line; the region ended for
                    // another reason.
                    return Ok(None);
                }
                Ok(Some(((next, first_top.1), None)))
            }
            Axis::Right => {
                let next = (end_column..matrix.n_columns())
                    .find(|&c| !matrix.column_is_empty(c));
                match next {
                    Some(c) if c > end_column => Ok(Some(((first_top.0, c), None))),
                    Some(c) if c == end_column => Ok(None),
                    _ => Ok(None),
                }
            }
        },
        DatasetSeparator::Keyword {
            keyword,
            column,
            offset,
        } => {
            let search_column = column.or(Some(first_top.1));
            let Some(hit) =
                find_anchor_keyword(matrix, keyword, false, None, search_column, end_row)
            else {
                return Ok(None);
            };
            let title = Some(matrix.get(hit.0, hit.1).display());
            Ok(Some((apply_offset(hit, *offset, matrix)?, title)))
        }
        DatasetSeparator::SetDistance { rows, columns } => {
            let next = apply_offset(previous_top, (*rows, *columns), matrix)?;
            Ok(Some((next, None)))
        }
    }
}

/// True when the first row of a would-be dataset region holds any cell.
fn region_present(matrix: &CellMatrix, top_left: (usize, usize)) -> bool {
    (top_left.1..matrix.n_columns()).any(|c| !matrix.get(top_left.0, c).is_empty())
}

fn slice_region(
    matrix: &CellMatrix,
    top_left: (usize, usize),
    config: &RawRuleSet,
) -> Result<Region, ParseError> {
    match config.grid_or_table {
        GridOrTable::Grid => slice_grid(matrix, top_left, config),
        GridOrTable::Table => slice_table(matrix, top_left),
    }
}

fn slice_grid(
    matrix: &CellMatrix,
    top_left: (usize, usize),
    config: &RawRuleSet,
) -> Result<Region, ParseError> {
    let format = config.assay_plate_format;
    let rows = format.rows();
    let columns = format.columns();
    let label_band = usize::from(config.grid_labels_included);
    let data_origin = (top_left.0 + label_band, top_left.1 + label_band);

    let last_row = data_origin.0 + rows - 1;
    let last_column = data_origin.1 + columns - 1;
    if last_row >= matrix.n_rows() || last_column >= matrix.n_columns() {
        return Err(ParseError::AnchorOutOfBounds {
            row: last_row as i64,
            column: last_column as i64,
        });
    }

    if config.grid_labels_included {
        validate_labels(matrix, top_left, format)?;
    }

    let mut values = Vec::with_capacity(format.wells());
    for r in 0..rows {
        for c in 0..columns {
            values.push(matrix.get(data_origin.0 + r, data_origin.1 + c).as_number());
        }
    }
    Ok(Region {
        top_left,
        kind: DatasetKind::Grid { format, values },
        end_row: last_row + 1,
        end_column: last_column + 1,
        title: None,
    })
}

/// Checks the label band of a labelled grid against the canonical row
/// letters and column numbers.
fn validate_labels(
    matrix: &CellMatrix,
    top_left: (usize, usize),
    format: PlateFormat,
) -> Result<(), ParseError> {
    for (r, expected) in row_labels(format).iter().enumerate() {
        let actual = matrix.get(top_left.0 + 1 + r, top_left.1).display();
        if &actual != expected {
            return Err(ParseError::GridMisaligned {
                message: format!("row label {expected:?} expected, found {actual:?}"),
            });
        }
    }
    for c in 0..format.columns() {
        let cell = matrix.get(top_left.0, top_left.1 + 1 + c);
        let matches = cell.as_number() == Some((c + 1) as f64);
        if !matches {
            return Err(ParseError::GridMisaligned {
                message: format!("column label {} expected, found {:?}", c + 1, cell.display()),
            });
        }
    }
    Ok(())
}

/// Consumes rows until a blank row or the end of the matrix; headers come
/// from the first row.
fn slice_table(matrix: &CellMatrix, top_left: (usize, usize)) -> Result<Region, ParseError> {
    if top_left.0 >= matrix.n_rows() {
        return Err(ParseError::AnchorOutOfBounds {
            row: top_left.0 as i64,
            column: top_left.1 as i64,
        });
    }
    let mut headers: Vec<String> = matrix.row(top_left.0)[top_left.1.min(matrix.row(top_left.0).len())..]
        .iter()
        .map(Cell::display)
        .collect();
    while headers.last().is_some_and(String::is_empty) {
        headers.pop();
    }
    let width = headers.len();
    let mut rows = Vec::new();
    let mut row = top_left.0 + 1;
    while row < matrix.n_rows() && !matrix.row_is_empty(row) {
        let cells: Vec<Cell> = (0..width)
            .map(|c| matrix.get(row, top_left.1 + c).clone())
            .collect();
        rows.push(cells);
        row += 1;
    }
    let title = headers.first().cloned().filter(|h| !h.is_empty());
    Ok(Region {
        top_left,
        kind: DatasetKind::Table { headers, rows },
        end_row: row,
        end_column: top_left.1 + width,
        title,
    })
}

/// Sub-matrix covering one dataset's window: from its top-left row to the
/// start of the next dataset (or the end of the matrix).
fn window_matrix(matrix: &CellMatrix, region: &Region, next: Option<&Region>) -> CellMatrix {
    let start = region.top_left.0;
    let end = next.map_or(matrix.n_rows(), |n| n.top_left.0);
    let rows: Vec<Vec<Cell>> = (start..end).map(|r| matrix.row(r).to_vec()).collect();
    CellMatrix::new(rows)
}

fn dataset_names(
    naming: &DatasetNaming,
    regions: &[Region],
) -> Result<Vec<String>, ParseError> {
    match naming {
        DatasetNaming::FromFile => Ok(regions
            .iter()
            .enumerate()
            .map(|(i, region)| {
                region
                    .title
                    .clone()
                    .unwrap_or_else(|| format!("Dataset {}", i + 1))
            })
            .collect()),
        DatasetNaming::Supplied { names } => {
            if names.len() != regions.len() {
                return Err(ParseError::NameCardinality {
                    expected: names.len(),
                    found: regions.len(),
                });
            }
            Ok(names.clone())
        }
    }
}
