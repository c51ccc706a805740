//! Keyword scanning and offset arithmetic shared by both parsers.

use hts_model::CellMatrix;
use hts_rules::Axis;

use crate::error::ParseError;

/// Scans for `keyword` along `axis`. A fixed `row`/`column` restricts the
/// perpendicular coordinate; `None` scans the whole axis. On multiple
/// matches the axis-smallest coordinate wins.
pub fn find_keyword(
    matrix: &CellMatrix,
    keyword: &str,
    exact: bool,
    row: Option<usize>,
    column: Option<usize>,
    axis: Axis,
) -> Option<(usize, usize)> {
    match axis {
        Axis::Down => {
            let columns: Vec<usize> = match column {
                Some(c) => vec![c],
                None => (0..matrix.n_columns()).collect(),
            };
            for r in row.unwrap_or(0)..matrix.n_rows() {
                for &c in &columns {
                    if matrix.get(r, c).matches(keyword, exact) {
                        return Some((r, c));
                    }
                }
            }
            None
        }
        Axis::Right => {
            let rows: Vec<usize> = match row {
                Some(r) => vec![r],
                None => (0..matrix.n_rows()).collect(),
            };
            for c in column.unwrap_or(0)..matrix.n_columns() {
                for &r in &rows {
                    if matrix.get(r, c).matches(keyword, exact) {
                        return Some((r, c));
                    }
                }
            }
            None
        }
    }
}

/// Adds a signed (rows, columns) offset to a position, bounds-checked
/// against the matrix. Offsets may be negative.
pub fn apply_offset(
    position: (usize, usize),
    offset: (i64, i64),
    matrix: &CellMatrix,
) -> Result<(usize, usize), ParseError> {
    let row = position.0 as i64 + offset.0;
    let column = position.1 as i64 + offset.1;
    if row < 0
        || column < 0
        || row as usize >= matrix.n_rows()
        || column as usize >= matrix.n_columns()
    {
        return Err(ParseError::AnchorOutOfBounds { row, column });
    }
    Ok((row as usize, column as usize))
}

/// First row at or after `from` whose cells are all empty.
pub fn next_empty_row(matrix: &CellMatrix, from: usize) -> Option<usize> {
    (from..matrix.n_rows()).find(|&r| matrix.row_is_empty(r))
}

/// First row at or after `from` with any non-empty cell.
pub fn next_occupied_row(matrix: &CellMatrix, from: usize) -> Option<usize> {
    (from..matrix.n_rows()).find(|&r| !matrix.row_is_empty(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hts_model::Cell;

    fn matrix(rows: &[&[&str]]) -> CellMatrix {
        CellMatrix::new(
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| {
                            if cell.is_empty() {
                                Cell::Empty
                            } else {
                                Cell::Text(cell.to_string())
                            }
                        })
                        .collect()
                })
                .collect(),
        )
    }

    #[test]
    fn first_match_along_axis_wins() {
        let m = matrix(&[&["", "key"], &["key", ""]]);
        // Down: row 0 scanned before row 1.
        assert_eq!(
            find_keyword(&m, "key", true, None, None, Axis::Down),
            Some((0, 1))
        );
        // Right: column 0 scanned before column 1.
        assert_eq!(
            find_keyword(&m, "key", true, None, None, Axis::Right),
            Some((1, 0))
        );
    }

    #[test]
    fn fixed_column_restricts_the_scan() {
        let m = matrix(&[&["", "key"], &["key", ""]]);
        assert_eq!(
            find_keyword(&m, "key", true, None, Some(0), Axis::Down),
            Some((1, 0))
        );
    }

    #[test]
    fn negative_offsets_are_bounds_checked() {
        let m = matrix(&[&["a", "b"], &["c", "d"]]);
        assert_eq!(apply_offset((1, 1), (-1, -1), &m).unwrap(), (0, 0));
        assert!(apply_offset((0, 0), (-1, 0), &m).is_err());
        assert!(apply_offset((1, 1), (1, 0), &m).is_err());
    }
}
