//! Well-coordinate geometry for 96/384/1536-well plates.
//!
//! Canonical well strings zero-pad the column number to two digits for 96
//! and 384 plates and three digits for 1536 plates, so that lexical order
//! equals row-major order. Rows beyond `Z` on a 1536 plate continue as
//! `AA..AF`.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Supported microtiter-plate formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlateFormat {
    #[serde(rename = "96")]
    F96,
    #[serde(rename = "384")]
    F384,
    #[serde(rename = "1536")]
    F1536,
}

impl PlateFormat {
    /// Number of wells.
    pub fn wells(self) -> usize {
        match self {
            Self::F96 => 96,
            Self::F384 => 384,
            Self::F1536 => 1536,
        }
    }

    pub fn rows(self) -> usize {
        match self {
            Self::F96 => 8,
            Self::F384 => 16,
            Self::F1536 => 32,
        }
    }

    pub fn columns(self) -> usize {
        match self {
            Self::F96 => 12,
            Self::F384 => 24,
            Self::F1536 => 48,
        }
    }

    /// Digits the column number is padded to in canonical form.
    pub fn column_digits(self) -> usize {
        match self {
            Self::F96 | Self::F384 => 2,
            Self::F1536 => 3,
        }
    }

    pub fn from_wells(wells: usize) -> Result<Self, ModelError> {
        match wells {
            96 => Ok(Self::F96),
            384 => Ok(Self::F384),
            1536 => Ok(Self::F1536),
            other => Err(ModelError::UnsupportedPlateSize { wells: other }),
        }
    }
}

impl std::fmt::Display for PlateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wells())
    }
}

/// Quadrant of a 384-well plate when consolidating four 96-well sources.
///
/// Q1 and Q2 interleave the odd rows, Q3 and Q4 the even rows; see
/// [`well_z`] for the exact mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quadrant {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quadrant {
    pub fn from_number(n: u8) -> Result<Self, ModelError> {
        match n {
            1 => Ok(Self::Q1),
            2 => Ok(Self::Q2),
            3 => Ok(Self::Q3),
            4 => Ok(Self::Q4),
            _ => Err(ModelError::InvalidWell {
                well: format!("quadrant {n}"),
            }),
        }
    }
}

fn row_label(row: usize) -> String {
    if row < 26 {
        ((b'A' + row as u8) as char).to_string()
    } else {
        // 1536 plates extend past Z as AA..AF.
        format!("A{}", (b'A' + (row - 26) as u8) as char)
    }
}

fn row_from_label(label: &str) -> Option<usize> {
    let bytes = label.as_bytes();
    match bytes {
        [r] if r.is_ascii_uppercase() => Some((r - b'A') as usize),
        [b'A', r] if r.is_ascii_uppercase() => Some(26 + (r - b'A') as usize),
        _ => None,
    }
}

/// Splits a well string into its letter and digit parts.
fn split_well(well: &str) -> Option<(&str, &str)> {
    let digits_at = well.find(|ch: char| ch.is_ascii_digit())?;
    let (letters, digits) = well.split_at(digits_at);
    if letters.is_empty() || letters.len() > 2 || digits.is_empty() || digits.len() > 3 {
        return None;
    }
    if !letters.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((letters, digits))
}

/// Parses a well string into zero-based (row, column) for the given format.
pub fn parse_well(well: &str, format: PlateFormat) -> Result<(usize, usize), ModelError> {
    let invalid = || ModelError::InvalidWell {
        well: well.to_string(),
    };
    let (letters, digits) = split_well(well.trim()).ok_or_else(invalid)?;
    let row = row_from_label(letters).ok_or_else(invalid)?;
    let column: usize = digits.parse().map_err(|_| invalid())?;
    if row >= format.rows() || column == 0 || column > format.columns() {
        return Err(invalid());
    }
    Ok((row, column - 1))
}

/// Formats zero-based (row, column) as a canonical well string.
pub fn format_well(row: usize, column: usize, format: PlateFormat) -> Result<String, ModelError> {
    if row >= format.rows() || column >= format.columns() {
        return Err(ModelError::IndexOutOfRange {
            index: row * format.columns() + column,
            format: format.wells() as u16,
        });
    }
    let width = format.column_digits();
    Ok(format!("{}{:0width$}", row_label(row), column + 1))
}

/// True when `well` is a valid coordinate on the given format.
pub fn is_well(well: &str, format: PlateFormat) -> bool {
    parse_well(well, format).is_ok()
}

/// Row-major linear index of a well.
pub fn well_to_index(well: &str, format: PlateFormat) -> Result<usize, ModelError> {
    let (row, column) = parse_well(well, format)?;
    Ok(row * format.columns() + column)
}

/// Canonical well string for a row-major linear index.
pub fn index_to_well(index: usize, format: PlateFormat) -> Result<String, ModelError> {
    if index >= format.wells() {
        return Err(ModelError::IndexOutOfRange {
            index,
            format: format.wells() as u16,
        });
    }
    format_well(index / format.columns(), index % format.columns(), format)
}

/// Row letters for the format, `A..H` / `A..P` / `A..AF`.
pub fn row_labels(format: PlateFormat) -> Vec<String> {
    (0..format.rows()).map(row_label).collect()
}

/// The canonical well list in row-major (= lexical) order.
pub fn well_list(format: PlateFormat) -> Vec<String> {
    (0..format.wells())
        .map(|i| index_to_well(i, format).unwrap_or_default())
        .collect()
}

/// Index of the well after a 180-degree plate rotation.
pub fn rotate180(index: usize, format: PlateFormat) -> Result<usize, ModelError> {
    if index >= format.wells() {
        return Err(ModelError::IndexOutOfRange {
            index,
            format: format.wells() as u16,
        });
    }
    // Flipping row and column about the plate centre mirrors the linear index.
    Ok(format.wells() - 1 - index)
}

/// Maps a 96-well coordinate into its position on a 384-well plate for the
/// given consolidation quadrant (Z-merge).
pub fn well_z(well: &str, quadrant: Quadrant) -> Result<String, ModelError> {
    let (row, column) = parse_well(well, PlateFormat::F96)?;
    let (r, c) = (row + 1, column + 1);
    let (dr, dc) = match quadrant {
        Quadrant::Q1 => (2 * r - 1, 2 * c - 1),
        Quadrant::Q2 => (2 * r - 1, 2 * c),
        Quadrant::Q3 => (2 * r, 2 * c - 1),
        Quadrant::Q4 => (2 * r, 2 * c),
    };
    format_well(dr - 1, dc - 1, PlateFormat::F384)
}
