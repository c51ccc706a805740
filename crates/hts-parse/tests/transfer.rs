//! Transfer parser behaviour: totality, solvent-only tagging, column
//! resolution, exceptions block.

use std::collections::BTreeMap;

use hts_model::{Cell, CellMatrix, PlateFormat};
use hts_parse::{ParseError, parse_transfers};
use hts_rules::{
    CanonicalColumn, ColumnBinding, ExceptionRules, FileType, TableAnchor, TableStop,
    TransferRuleSet, Verification, VolumeUnit,
};

fn cell(text: &str) -> Cell {
    if text.is_empty() {
        Cell::Empty
    } else if let Ok(number) = text.parse::<f64>() {
        Cell::Number(number)
    } else {
        Cell::Text(text.to_string())
    }
}

fn matrix(rows: &[&[&str]]) -> CellMatrix {
    CellMatrix::new(
        rows.iter()
            .map(|row| row.iter().map(|&text| cell(text)).collect())
            .collect(),
    )
}

fn bindings() -> BTreeMap<CanonicalColumn, ColumnBinding> {
    let labels = [
        (CanonicalColumn::SourcePlate, "Source Plate Name"),
        (CanonicalColumn::SourceWell, "Source Well"),
        (CanonicalColumn::DestPlate, "Destination Plate Name"),
        (CanonicalColumn::DestWell, "Destination Well"),
        (CanonicalColumn::SampleId, "Sample ID"),
        (CanonicalColumn::Volume, "Actual Volume"),
        (CanonicalColumn::Solvent, "Fluid Type"),
    ];
    labels
        .into_iter()
        .map(|(column, label)| {
            (
                column,
                ColumnBinding {
                    label: label.to_string(),
                    mapped: true,
                },
            )
        })
        .collect()
}

fn acoustic_rules() -> TransferRuleSet {
    TransferRuleSet {
        name: "acoustic".to_string(),
        extension: "csv".to_string(),
        file_type: FileType::Csv,
        engine: None,
        worksheet: None,
        destination_plate_format: PlateFormat::F384,
        verification: Verification::default(),
        start: TableAnchor::Keyword {
            keyword: "Source Plate Name".to_string(),
            exact: true,
        },
        stop: TableStop::EmptyLine,
        catch_solvent_only_transfers: true,
        volume_unit: VolumeUnit::Nanoliter,
        columns: bindings(),
        exceptions: Some(ExceptionRules {
            keyword: "[EXCEPTIONS]".to_string(),
            reason_label: "Transfer Status".to_string(),
            stop: None,
        }),
    }
}

const HEADER: &[&str] = &[
    "Source Plate Name",
    "Source Well",
    "Destination Plate Name",
    "Destination Well",
    "Sample ID",
    "Actual Volume",
    "Fluid Type",
];

#[test]
fn every_row_yields_a_record() {
    let m = matrix(&[
        &["Run: 2024-03-12"],
        HEADER,
        &["SRC1", "A01", "DEST1", "A01", "CMPD-1", "25", "DMSO"],
        &["SRC1", "A02", "DEST1", "A02", "", "25", "DMSO"],
        &["SRC1", "A03", "DEST1", "A03", "", "", ""],
    ]);
    let transfers = parse_transfers(&m, &acoustic_rules()).unwrap();
    assert_eq!(transfers.len(), 3);

    assert_eq!(transfers[0].sample_id.as_deref(), Some("CMPD-1"));
    assert!(!transfers[0].solvent_only);
    assert!(transfers[0].exception_reason.is_none());
    // 25 nL normalized to microliters.
    assert_eq!(transfers[0].volume, Some(0.025));

    assert!(transfers[1].solvent_only);
    assert_eq!(transfers[1].solvent.as_deref(), Some("DMSO"));

    // A row with neither sample nor solvent is kept and annotated.
    assert!(!transfers[2].solvent_only);
    assert!(transfers[2].exception_reason.is_some());
}

#[test]
fn solvent_only_rows_need_the_rule_flag() {
    let mut rules = acoustic_rules();
    rules.catch_solvent_only_transfers = false;
    let m = matrix(&[
        HEADER,
        &["SRC1", "A02", "DEST1", "A02", "", "25", "DMSO"],
    ]);
    let transfers = parse_transfers(&m, &rules).unwrap();
    assert!(!transfers[0].solvent_only);
    assert!(transfers[0].exception_reason.is_some());
}

#[test]
fn unmapped_required_column_is_typed() {
    let m = matrix(&[
        &[
            "Source Plate Name",
            "Source Well",
            "Destination Plate Name",
            "Sample ID",
            "Actual Volume",
            "Fluid Type",
        ],
        &["SRC1", "A01", "DEST1", "CMPD-1", "25", "DMSO"],
    ]);
    let error = parse_transfers(&m, &acoustic_rules()).unwrap_err();
    assert!(matches!(
        error,
        ParseError::MissingColumn { ref name } if name == "DestWell"
    ));
}

#[test]
fn destination_well_must_fit_the_plate_format() {
    let m = matrix(&[
        HEADER,
        &["SRC1", "A01", "DEST1", "Z99", "CMPD-1", "25", "DMSO"],
    ]);
    assert!(matches!(
        parse_transfers(&m, &acoustic_rules()),
        Err(ParseError::Model(_))
    ));
}

#[test]
fn exceptions_block_annotates_matching_transfers() {
    let mut exception_header: Vec<&str> = HEADER.to_vec();
    exception_header.push("Transfer Status");
    let m = matrix(&[
        HEADER,
        &["SRC1", "A01", "DEST1", "A01", "CMPD-1", "25", "DMSO"],
        &["SRC1", "A02", "DEST1", "A02", "CMPD-2", "25", "DMSO"],
        &[],
        &["[EXCEPTIONS]"],
        &exception_header,
        &["SRC1", "A01", "DEST1", "A01", "CMPD-1", "0", "DMSO", "Instrument failure"],
    ]);
    let transfers = parse_transfers(&m, &acoustic_rules()).unwrap();
    assert_eq!(transfers.len(), 2);
    assert_eq!(
        transfers[0].exception_reason.as_deref(),
        Some("Instrument failure")
    );
    assert!(transfers[1].exception_reason.is_none());
}

#[test]
fn unknown_vendor_columns_land_in_attributes() {
    let mut header: Vec<&str> = HEADER.to_vec();
    header.push("Survey Fluid Volume");
    let m = matrix(&[
        &header,
        &["SRC1", "A01", "DEST1", "A01", "CMPD-1", "25", "DMSO", "4.8"],
    ]);
    let transfers = parse_transfers(&m, &acoustic_rules()).unwrap();
    assert_eq!(
        transfers[0].attributes.get("Survey Fluid Volume").map(String::as_str),
        Some("4.8")
    );
}

#[test]
fn missing_verification_keyword_is_typed() {
    let mut rules = acoustic_rules();
    rules.verification = Verification {
        enabled: true,
        keyword: "Echo Transfer Log".to_string(),
        ..Verification::default()
    };
    let m = matrix(&[HEADER]);
    assert!(matches!(
        parse_transfers(&m, &rules),
        Err(ParseError::VerificationFailed { .. })
    ));
}
