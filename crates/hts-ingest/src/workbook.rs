//! Worksheet discovery.
//!
//! Modern spreadsheet containers are zip archives; the worksheet list
//! comes from the `xl/workbook.xml` manifest, read in memory straight out
//! of the archive. Single-sheet workbooks carry a single `<sheet>` entry
//! rather than a sequence, which event-based parsing handles uniformly.
//! Legacy binary workbooks go through calamine.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use calamine::{Reader as _, Xls, open_workbook};
use quick_xml::events::Event;
use tracing::debug;

use crate::error::IngestError;

/// One worksheet entry from the workbook manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worksheet {
    pub sheet_id: String,
    pub name: String,
}

/// Enumerates worksheet names, preferring the manifest probe and falling
/// back to the legacy engine.
pub fn worksheet_names(path: &Path) -> Result<Vec<Worksheet>, IngestError> {
    match manifest_worksheets(path) {
        Ok(sheets) => Ok(sheets),
        Err(manifest_error) => {
            debug!(path = %path.display(), error = %manifest_error, "manifest probe failed, trying legacy workbook");
            legacy_worksheets(path).map_err(|_| manifest_error)
        }
    }
}

/// Reads `xl/workbook.xml` from the archive and extracts sheetId/name pairs.
pub fn manifest_worksheets(path: &Path) -> Result<Vec<Worksheet>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::io(path, source))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|_| IngestError::NotTabular {
        path: path.to_path_buf(),
    })?;
    let mut xml = String::new();
    archive
        .by_name("xl/workbook.xml")
        .map_err(|_| IngestError::NotTabular {
            path: path.to_path_buf(),
        })?
        .read_to_string(&mut xml)
        .map_err(|source| IngestError::io(path, source))?;
    parse_manifest(&xml).map_err(|message| IngestError::MalformedWorkbook {
        path: path.to_path_buf(),
        message,
    })
}

fn parse_manifest(xml: &str) -> Result<Vec<Worksheet>, String> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut sheets = Vec::new();
    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(element) | Event::Empty(element)
                if element.local_name().as_ref() == b"sheet" =>
            {
                let mut sheet_id = None;
                let mut name = None;
                for attribute in element.attributes().flatten() {
                    let value = attribute
                        .unescape_value()
                        .map_err(|e| e.to_string())?
                        .into_owned();
                    match attribute.key.local_name().as_ref() {
                        b"sheetId" => sheet_id = Some(value),
                        b"name" => name = Some(value),
                        _ => {}
                    }
                }
                match (sheet_id, name) {
                    (Some(sheet_id), Some(name)) => sheets.push(Worksheet { sheet_id, name }),
                    _ => return Err("sheet entry missing sheetId or name".to_string()),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if sheets.is_empty() {
        return Err("manifest lists no sheets".to_string());
    }
    Ok(sheets)
}

fn legacy_worksheets(path: &Path) -> Result<Vec<Worksheet>, IngestError> {
    let workbook: Xls<_> = open_workbook(path).map_err(|_| IngestError::NotTabular {
        path: path.to_path_buf(),
    })?;
    Ok(workbook
        .sheet_names()
        .iter()
        .enumerate()
        .map(|(index, name)| Worksheet {
            sheet_id: (index + 1).to_string(),
            name: name.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_sheet_manifest() {
        let xml = r#"<?xml version="1.0"?>
            <workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
              <sheets>
                <sheet name="Results" sheetId="1" r:id="rId1" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"/>
                <sheet name="Melt Curve Raw Data" sheetId="2" r:id="rId2" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"/>
              </sheets>
            </workbook>"#;
        let sheets = parse_manifest(xml).expect("parse");
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name, "Results");
        assert_eq!(sheets[1].sheet_id, "2");
    }

    #[test]
    fn parses_single_sheet_manifest() {
        let xml = r#"<workbook><sheets><sheet name="Sheet1" sheetId="1"/></sheets></workbook>"#;
        let sheets = parse_manifest(xml).expect("parse");
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].name, "Sheet1");
    }

    #[test]
    fn empty_manifest_is_malformed() {
        assert!(parse_manifest("<workbook><sheets/></workbook>").is_err());
    }
}
