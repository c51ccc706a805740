//! Assembles parsed datasets into the reading shapes the reducers consume:
//! one value per well for endpoint assays, an (x, y) series per well for
//! melt curves and time courses.

use std::collections::BTreeMap;

use hts_model::{Cell, ModelError, PlateFormat, well_to_index};
use hts_parse::{Dataset, DatasetKind};

use crate::error::CoreError;

/// Per-well measurement series (temperature or time on the x axis).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

fn missing(dataset: &Dataset, column: &str) -> CoreError {
    CoreError::MissingSeriesColumn {
        dataset: dataset.name.clone(),
        column: column.to_string(),
    }
}

fn well_column(headers: &[String]) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.to_ascii_lowercase().contains("well"))
}

/// First column outside `exclude` holding any numeric cell.
fn numeric_column(headers: &[String], rows: &[Vec<Cell>], exclude: &[usize]) -> Option<usize> {
    (0..headers.len()).find(|c| {
        !exclude.contains(c) && rows.iter().any(|row| row.get(*c).and_then(Cell::as_number).is_some())
    })
}

fn hinted_column(headers: &[String], hints: &[&str], exclude: &[usize]) -> Option<usize> {
    (0..headers.len()).find(|&c| {
        !exclude.contains(&c)
            && hints
                .iter()
                .any(|hint| headers[c].to_ascii_lowercase().contains(hint))
    })
}

/// One reading per well in index order. Grids map directly; list-format
/// tables are routed through their well column.
pub fn endpoint_readings(
    dataset: &Dataset,
    format: PlateFormat,
) -> Result<Vec<Option<f64>>, CoreError> {
    match &dataset.kind {
        DatasetKind::Grid {
            format: grid_format,
            values,
        } => {
            if *grid_format != format {
                return Err(ModelError::PlateFormatMismatch {
                    expected: format.wells() as u16,
                    actual: grid_format.wells() as u16,
                }
                .into());
            }
            Ok(values.clone())
        }
        DatasetKind::Table { headers, rows } => {
            let well = well_column(headers).ok_or_else(|| missing(dataset, "well"))?;
            let value =
                numeric_column(headers, rows, &[well]).ok_or_else(|| missing(dataset, "reading"))?;
            let mut readings = vec![None; format.wells()];
            for row in rows {
                let well_text = row.get(well).map(Cell::display).unwrap_or_default();
                if well_text.is_empty() {
                    continue;
                }
                let index = well_to_index(&well_text, format)?;
                readings[index] = row.get(value).and_then(Cell::as_number);
            }
            Ok(readings)
        }
    }
}

/// Per-well (x, y) series from a list-format table. The x column is found
/// by header hint (for example "temp" or "time") with a positional
/// fallback; rows keep their file order within each well.
pub fn series_readings(
    dataset: &Dataset,
    format: PlateFormat,
    x_hints: &[&str],
) -> Result<BTreeMap<usize, Series>, CoreError> {
    let DatasetKind::Table { headers, rows } = &dataset.kind else {
        return Err(missing(dataset, "well"));
    };
    let well = well_column(headers).ok_or_else(|| missing(dataset, "well"))?;
    let x = hinted_column(headers, x_hints, &[well])
        .or_else(|| numeric_column(headers, rows, &[well]))
        .ok_or_else(|| missing(dataset, x_hints.first().copied().unwrap_or("x")))?;
    let y = numeric_column(headers, rows, &[well, x]).ok_or_else(|| missing(dataset, "signal"))?;

    let mut series: BTreeMap<usize, Series> = BTreeMap::new();
    for row in rows {
        let well_text = row.get(well).map(Cell::display).unwrap_or_default();
        if well_text.is_empty() {
            continue;
        }
        let index = well_to_index(&well_text, format)?;
        let (Some(xv), Some(yv)) = (
            row.get(x).and_then(Cell::as_number),
            row.get(y).and_then(Cell::as_number),
        ) else {
            continue;
        };
        let entry = series.entry(index).or_default();
        entry.x.push(xv);
        entry.y.push(yv);
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[Cell]]) -> Dataset {
        Dataset {
            name: "t".to_string(),
            kind: DatasetKind::Table {
                headers: headers.iter().map(|h| h.to_string()).collect(),
                rows: rows.iter().map(|row| row.to_vec()).collect(),
            },
        }
    }

    fn text(t: &str) -> Cell {
        Cell::Text(t.to_string())
    }

    #[test]
    fn list_table_routes_through_the_well_column() {
        let dataset = table(
            &["Well", "Value"],
            &[
                &[text("A01"), Cell::Number(1.5)],
                &[text("B12"), Cell::Number(2.5)],
            ],
        );
        let readings = endpoint_readings(&dataset, PlateFormat::F96).unwrap();
        assert_eq!(readings[0], Some(1.5));
        assert_eq!(readings[23], Some(2.5));
        assert_eq!(readings.iter().flatten().count(), 2);
    }

    #[test]
    fn series_groups_rows_by_well_in_file_order() {
        let dataset = table(
            &["Well Position", "Temperature", "Fluorescence"],
            &[
                &[text("A01"), Cell::Number(25.0), Cell::Number(0.1)],
                &[text("A02"), Cell::Number(25.0), Cell::Number(0.2)],
                &[text("A01"), Cell::Number(26.0), Cell::Number(0.3)],
            ],
        );
        let series = series_readings(&dataset, PlateFormat::F96, &["temp"]).unwrap();
        assert_eq!(series[&0].x, vec![25.0, 26.0]);
        assert_eq!(series[&0].y, vec![0.1, 0.3]);
        assert_eq!(series[&1].y, vec![0.2]);
    }

    #[test]
    fn missing_well_column_is_typed() {
        let dataset = table(&["Sample", "Value"], &[&[text("S1"), Cell::Number(1.0)]]);
        assert!(matches!(
            endpoint_readings(&dataset, PlateFormat::F96),
            Err(CoreError::MissingSeriesColumn { .. })
        ));
    }
}
