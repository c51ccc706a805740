//! Integration tests for run-input resolution.

use std::fs;

use hts_cli::commands::{assign_raw_files, load_layouts};
use hts_model::{PlateFormat, WellRole};

#[test]
fn raw_files_are_keyed_by_stem() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("DEST1.csv"), "Well,Signal\n").unwrap();
    fs::write(dir.path().join("DEST2.txt"), "Well\tSignal\n").unwrap();
    fs::create_dir(dir.path().join("archive")).unwrap();

    let files = assign_raw_files(dir.path()).unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files["DEST1"], dir.path().join("DEST1.csv"));
    assert_eq!(files["DEST2"], dir.path().join("DEST2.txt"));
}

#[test]
fn missing_raw_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let gone = dir.path().join("nope");

    assert!(assign_raw_files(&gone).is_err());
}

#[test]
fn layout_file_maps_destinations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layouts.json");
    fs::write(
        &path,
        r#"{
            "DEST1": {
                "format": "384",
                "roles": {
                    "0": { "role": "Control" },
                    "23": { "role": "Solvent" }
                }
            }
        }"#,
    )
    .unwrap();

    let layouts = load_layouts(Some(&path)).unwrap();

    let layout = &layouts["DEST1"];
    assert_eq!(layout.format, PlateFormat::F384);
    assert_eq!(layout.roles.get(&0), Some(&WellRole::Control));
    assert_eq!(layout.roles.get(&23), Some(&WellRole::Solvent));
    assert!(layout.concentrations.is_empty());
}

#[test]
fn omitted_layout_file_yields_no_layouts() {
    assert!(load_layouts(None).unwrap().is_empty());
}

#[test]
fn malformed_layout_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layouts.json");
    fs::write(&path, "not json").unwrap();

    assert!(load_layouts(Some(&path)).is_err());
}
