use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use hts_model::{PlateResult, PlateStatus, Processed, RunOutcome};

pub fn print_summary(outcome: &RunOutcome) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Destination"),
        header_cell("Category"),
        header_cell("Status"),
        header_cell("Samples"),
        header_cell("Z'"),
        header_cell("Notes"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for plate in &outcome.plates {
        table.add_row(vec![
            Cell::new(&plate.destination)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(plate.category),
            status_cell(plate.status),
            sample_cell(plate),
            z_prime_cell(plate),
            notes_cell(plate),
        ]);
    }
    println!("{table}");
    println!(
        "{} processed, {} failed, {} plates total{}",
        outcome.processed_count(),
        outcome.failed_count(),
        outcome.plates.len(),
        if outcome.cancelled { " (cancelled)" } else { "" }
    );
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: PlateStatus) -> Cell {
    match status {
        PlateStatus::Processed => Cell::new("processed").fg(Color::Green),
        PlateStatus::Failed => Cell::new("FAILED")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        PlateStatus::Cancelled => Cell::new("cancelled").fg(Color::Yellow),
    }
}

fn sample_cell(plate: &PlateResult) -> Cell {
    let count = match &plate.processed {
        Some(Processed::SingleDose(samples)) => samples.len(),
        Some(Processed::DoseResponse(samples)) => samples.len(),
        Some(Processed::ThermalShift(curves)) => curves.len(),
        Some(Processed::KineticRate(fits)) => fits.len(),
        None => return dim_cell("-"),
    };
    Cell::new(count)
}

fn z_prime_cell(plate: &PlateResult) -> Cell {
    match plate.stats.as_ref().and_then(|s| s.z_prime) {
        Some(z) if z >= 0.5 => Cell::new(format!("{z:.2}")).fg(Color::Green),
        Some(z) => Cell::new(format!("{z:.2}")).fg(Color::Yellow),
        None => dim_cell("-"),
    }
}

fn notes_cell(plate: &PlateResult) -> Cell {
    if let Some(error) = &plate.error {
        return Cell::new(error).fg(Color::Red);
    }
    if plate.notes.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(plate.notes.len()).fg(Color::Yellow)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
