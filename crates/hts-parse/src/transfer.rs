//! Transfer parser: dispenser log matrix + transfer rule set to a list of
//! transfer records.
//!
//! Totality: every row between the start and stop anchors yields exactly
//! one record, or carries a typed exception annotation. Nothing is
//! silently dropped.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use hts_model::{Cell, CellMatrix, Transfer, well_to_index};
use hts_rules::{
    CanonicalColumn, ExceptionRules, TableAnchor, TableStop, TransferRuleSet, Verification,
    VolumeUnit,
};

use crate::anchor::{find_keyword, next_empty_row};
use crate::error::ParseError;

/// Parses the transfer table (and its exceptions block, when configured).
pub fn parse_transfers(
    matrix: &CellMatrix,
    rules: &TransferRuleSet,
) -> Result<Vec<Transfer>, ParseError> {
    verify(matrix, &rules.verification)?;

    let header_row = locate_header(matrix, &rules.start)?;
    let headers = header_cells(matrix, header_row);
    let columns = resolve_columns(rules, &headers)?;
    let end_row = locate_end(matrix, &rules.stop, header_row);

    let mut transfers = Vec::new();
    for row in (header_row + 1)..end_row {
        if matrix.row_is_empty(row) {
            continue;
        }
        transfers.push(build_transfer(matrix, row, &headers, &columns, rules)?);
    }
    debug!(count = transfers.len(), "transfer rows parsed");

    if let Some(exception_rules) = &rules.exceptions {
        annotate_exceptions(matrix, rules, exception_rules, &mut transfers)?;
    }
    Ok(transfers)
}

fn verify(matrix: &CellMatrix, verification: &Verification) -> Result<(), ParseError> {
    if !verification.enabled {
        return Ok(());
    }
    find_keyword(
        matrix,
        &verification.keyword,
        verification.exact,
        verification.row,
        verification.column,
        verification.axis,
    )
    .map(|_| ())
    .ok_or_else(|| ParseError::VerificationFailed {
        keyword: verification.keyword.clone(),
    })
}

fn locate_header(matrix: &CellMatrix, start: &TableAnchor) -> Result<usize, ParseError> {
    match start {
        TableAnchor::Coordinates { row } => {
            if *row >= matrix.n_rows() {
                return Err(ParseError::AnchorOutOfBounds {
                    row: *row as i64,
                    column: 0,
                });
            }
            Ok(*row)
        }
        TableAnchor::Keyword { keyword, exact } => (0..matrix.n_rows())
            .find(|&r| {
                (0..matrix.n_columns()).any(|c| matrix.get(r, c).matches(keyword, *exact))
            })
            .ok_or_else(|| ParseError::KeywordNotFound {
                keyword: keyword.clone(),
            }),
    }
}

fn locate_end(matrix: &CellMatrix, stop: &TableStop, header_row: usize) -> usize {
    match stop {
        TableStop::Coordinates { row } => (*row).min(matrix.n_rows()),
        TableStop::EmptyLine => {
            next_empty_row(matrix, header_row + 1).unwrap_or(matrix.n_rows())
        }
        TableStop::Keyword { keyword } => ((header_row + 1)..matrix.n_rows())
            .find(|&r| (0..matrix.n_columns()).any(|c| matrix.get(r, c).matches(keyword, false)))
            .unwrap_or(matrix.n_rows()),
    }
}

fn header_cells(matrix: &CellMatrix, header_row: usize) -> Vec<String> {
    matrix.row(header_row).iter().map(Cell::display).collect()
}

/// Maps canonical columns to source column indices; a required canonical
/// column with no matching header is a typed failure.
fn resolve_columns(
    rules: &TransferRuleSet,
    headers: &[String],
) -> Result<BTreeMap<CanonicalColumn, usize>, ParseError> {
    let mut columns = BTreeMap::new();
    for column in CanonicalColumn::ALL {
        let Some(label) = rules.label_for(column) else {
            if column.is_required() {
                return Err(ParseError::MissingColumn {
                    name: column.as_str().to_string(),
                });
            }
            continue;
        };
        match headers.iter().position(|h| h.eq_ignore_ascii_case(label)) {
            Some(index) => {
                columns.insert(column, index);
            }
            None if column.is_required() => {
                return Err(ParseError::MissingColumn {
                    name: column.as_str().to_string(),
                });
            }
            None => {}
        }
    }
    Ok(columns)
}

fn text_at(
    matrix: &CellMatrix,
    row: usize,
    columns: &BTreeMap<CanonicalColumn, usize>,
    column: CanonicalColumn,
) -> Option<String> {
    let index = columns.get(&column)?;
    let value = matrix.get(row, *index).display();
    if value.is_empty() { None } else { Some(value) }
}

fn build_transfer(
    matrix: &CellMatrix,
    row: usize,
    headers: &[String],
    columns: &BTreeMap<CanonicalColumn, usize>,
    rules: &TransferRuleSet,
) -> Result<Transfer, ParseError> {
    let destination_plate =
        text_at(matrix, row, columns, CanonicalColumn::DestPlate).unwrap_or_default();
    let destination_well =
        text_at(matrix, row, columns, CanonicalColumn::DestWell).unwrap_or_default();
    let sample_id = text_at(matrix, row, columns, CanonicalColumn::SampleId);
    let solvent = text_at(matrix, row, columns, CanonicalColumn::Solvent);
    // Volumes are normalized to microliters regardless of dialect unit.
    let volume = columns
        .get(&CanonicalColumn::Volume)
        .and_then(|index| matrix.get(row, *index).as_number())
        .map(|v| match rules.volume_unit {
            VolumeUnit::Microliter => v,
            VolumeUnit::Nanoliter => v / 1000.0,
        });

    let solvent_only = sample_id.is_none() && solvent.is_some();
    let mut exception_reason = None;
    if destination_well.is_empty() {
        exception_reason = Some("missing destination well".to_string());
        warn!(row, "transfer row without destination well");
    } else {
        // Destination well must sit on the declared plate format.
        well_to_index(&destination_well, rules.destination_plate_format)?;
    }
    if sample_id.is_none() && solvent.is_none() {
        // Totality: a row carrying neither sample nor solvent is kept,
        // tagged, never dropped.
        exception_reason = Some("row carries neither sample nor solvent".to_string());
        warn!(row, "transfer row without sample or solvent");
    }
    if solvent_only && !rules.catch_solvent_only_transfers {
        exception_reason = Some("solvent-only transfer not caught by rule set".to_string());
    }

    // Preserve vendor columns the canonical mapping does not claim.
    let claimed: Vec<usize> = columns.values().copied().collect();
    let mut attributes = BTreeMap::new();
    for (index, header) in headers.iter().enumerate() {
        if header.is_empty() || claimed.contains(&index) {
            continue;
        }
        let value = matrix.get(row, index).display();
        if !value.is_empty() {
            attributes.insert(header.clone(), value);
        }
    }

    Ok(Transfer {
        destination_plate,
        destination_well,
        source_plate: text_at(matrix, row, columns, CanonicalColumn::SourcePlate),
        source_well: text_at(matrix, row, columns, CanonicalColumn::SourceWell),
        sample_id,
        volume,
        solvent,
        solvent_only: solvent_only && rules.catch_solvent_only_transfers,
        exception_reason,
        attributes,
    })
}

/// Re-applies the anchor-and-slice algorithm to the exceptions block and
/// annotates matching transfer records.
fn annotate_exceptions(
    matrix: &CellMatrix,
    rules: &TransferRuleSet,
    exception_rules: &ExceptionRules,
    transfers: &mut [Transfer],
) -> Result<(), ParseError> {
    let Some(banner_row) = (0..matrix.n_rows()).find(|&r| {
        (0..matrix.n_columns())
            .any(|c| matrix.get(r, c).matches(&exception_rules.keyword, false))
    }) else {
        // The block is optional even when configured.
        return Ok(());
    };
    let header_row = banner_row + 1;
    if header_row >= matrix.n_rows() {
        return Ok(());
    }
    let headers = header_cells(matrix, header_row);
    let columns = resolve_columns(rules, &headers)?;
    let reason_column = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(&exception_rules.reason_label));

    let stop = exception_rules.stop.clone().unwrap_or(TableStop::EmptyLine);
    let end_row = locate_end(matrix, &stop, header_row);

    for row in (header_row + 1)..end_row {
        if matrix.row_is_empty(row) {
            continue;
        }
        let plate = text_at(matrix, row, &columns, CanonicalColumn::DestPlate);
        let well = text_at(matrix, row, &columns, CanonicalColumn::DestWell);
        let reason = reason_column
            .map(|c| matrix.get(row, c).display())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "flagged in exceptions block".to_string());
        let mut matched = false;
        for transfer in transfers.iter_mut() {
            let plate_matches = plate
                .as_deref()
                .is_none_or(|p| p == transfer.destination_plate);
            if plate_matches && well.as_deref() == Some(transfer.destination_well.as_str()) {
                transfer.exception_reason = Some(reason.clone());
                matched = true;
            }
        }
        if !matched {
            warn!(?plate, ?well, "exception row matched no transfer");
        }
    }
    Ok(())
}
