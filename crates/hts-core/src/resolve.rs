//! Layout resolver: composes transfer records with the user-declared
//! layout to classify every well of a destination plate.

use tracing::debug;

use hts_model::{
    ClassifiedPlate, PlateLayout, Transfer, WellAssignment, WellRole, well_to_index,
};

use crate::error::CoreError;

/// Classifies each well of `destination`. Role precedence per well:
/// explicit layout role, then transferred sample, then solvent only,
/// then empty. Reference classes come only from the layout.
pub fn resolve_layout(
    destination: &str,
    transfers: &[Transfer],
    layout: &PlateLayout,
) -> Result<ClassifiedPlate, CoreError> {
    let format = layout.format;
    let mut wells = vec![WellAssignment::empty(); format.wells()];

    for transfer in transfers {
        if transfer.destination_plate != destination || transfer.is_exception() {
            continue;
        }
        let index = well_to_index(&transfer.destination_well, format)?;
        let well = &mut wells[index];
        if well.sample_id.is_none() {
            well.sample_id = transfer.sample_id.clone();
        }
        if well.solvent.is_none() {
            well.solvent = transfer.solvent.clone();
        }
        if let Some(volume) = transfer.volume {
            well.volume = Some(well.volume.unwrap_or(0.0) + volume);
        }
    }

    for (index, well) in wells.iter_mut().enumerate() {
        well.role = match layout.roles.get(&index) {
            Some(role) => role.clone(),
            None if well.sample_id.is_some() => WellRole::Sample,
            None if well.solvent.is_some() => WellRole::Solvent,
            None => WellRole::Empty,
        };
        well.concentration = layout.concentrations.get(&index).copied().or_else(|| {
            // A sample registered with a single declared concentration
            // carries it onto every one of its wells.
            let sample = well.sample_id.as_ref()?;
            let meta = layout.samples.get(sample)?;
            (meta.concentrations.len() == 1).then(|| meta.concentrations[0])
        });
    }

    let classified = wells
        .iter()
        .filter(|w| w.role != WellRole::Empty)
        .count();
    debug!(destination, classified, "layout resolved");

    Ok(ClassifiedPlate {
        destination: destination.to_string(),
        format,
        wells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hts_model::PlateFormat;
    use std::collections::BTreeMap;

    fn transfer(well: &str, sample: Option<&str>, solvent: Option<&str>) -> Transfer {
        Transfer {
            destination_plate: "DEST1".to_string(),
            destination_well: well.to_string(),
            source_plate: None,
            source_well: None,
            sample_id: sample.map(str::to_string),
            volume: Some(0.025),
            solvent: solvent.map(str::to_string),
            solvent_only: sample.is_none() && solvent.is_some(),
            exception_reason: None,
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn explicit_roles_win_over_transfers() {
        let mut layout = PlateLayout::empty(PlateFormat::F96);
        layout.roles.insert(0, WellRole::Control);
        let transfers = vec![transfer("A01", Some("CMPD-1"), Some("DMSO"))];
        let plate = resolve_layout("DEST1", &transfers, &layout).unwrap();
        assert_eq!(plate.wells[0].role, WellRole::Control);
        // Transfer data stays attached even under an explicit role.
        assert_eq!(plate.wells[0].sample_id.as_deref(), Some("CMPD-1"));
    }

    #[test]
    fn sample_then_solvent_then_empty() {
        let layout = PlateLayout::empty(PlateFormat::F96);
        let transfers = vec![
            transfer("A01", Some("CMPD-1"), Some("DMSO")),
            transfer("A02", None, Some("DMSO")),
        ];
        let plate = resolve_layout("DEST1", &transfers, &layout).unwrap();
        assert_eq!(plate.wells[0].role, WellRole::Sample);
        assert_eq!(plate.wells[1].role, WellRole::Solvent);
        assert_eq!(plate.wells[2].role, WellRole::Empty);
    }

    #[test]
    fn exception_transfers_do_not_classify() {
        let layout = PlateLayout::empty(PlateFormat::F96);
        let mut failed = transfer("A01", Some("CMPD-1"), Some("DMSO"));
        failed.exception_reason = Some("Instrument failure".to_string());
        let plate = resolve_layout("DEST1", &[failed], &layout).unwrap();
        assert_eq!(plate.wells[0].role, WellRole::Empty);
    }

    #[test]
    fn volumes_accumulate_across_transfers() {
        let layout = PlateLayout::empty(PlateFormat::F96);
        let transfers = vec![
            transfer("A01", Some("CMPD-1"), None),
            transfer("A01", None, Some("DMSO")),
        ];
        let plate = resolve_layout("DEST1", &transfers, &layout).unwrap();
        assert_eq!(plate.wells[0].volume, Some(0.05));
    }

    #[test]
    fn single_declared_concentration_propagates() {
        let mut layout = PlateLayout::empty(PlateFormat::F96);
        layout.samples.insert(
            "CMPD-1".to_string(),
            hts_model::SampleMeta {
                concentrations: vec![1e-6],
                ..Default::default()
            },
        );
        let transfers = vec![transfer("A01", Some("CMPD-1"), None)];
        let plate = resolve_layout("DEST1", &transfers, &layout).unwrap();
        assert_eq!(plate.wells[0].concentration, Some(1e-6));
    }
}
