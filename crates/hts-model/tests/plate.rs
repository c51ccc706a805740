//! Geometry invariants: coordinate round-trips, quadrant merge, rotation.

use std::collections::BTreeSet;

use proptest::prelude::*;

use hts_model::{
    PlateFormat, Quadrant, index_to_well, rotate180, well_list, well_to_index, well_z,
};

const FORMATS: [PlateFormat; 3] = [PlateFormat::F96, PlateFormat::F384, PlateFormat::F1536];

#[test]
fn well_list_is_lexically_sorted_and_complete() {
    for format in FORMATS {
        let wells = well_list(format);
        assert_eq!(wells.len(), format.wells());
        let mut sorted = wells.clone();
        sorted.sort();
        assert_eq!(wells, sorted, "{format} canonical list not lexical");
        assert_eq!(
            wells.iter().collect::<BTreeSet<_>>().len(),
            format.wells(),
            "{format} canonical list has duplicates"
        );
    }
}

#[test]
fn quadrant_merge_partitions_the_384_plate() {
    let mut seen = BTreeSet::new();
    for quadrant in [Quadrant::Q1, Quadrant::Q2, Quadrant::Q3, Quadrant::Q4] {
        for source in well_list(PlateFormat::F96) {
            let dest = well_z(&source, quadrant).expect("merge");
            assert!(seen.insert(dest.clone()), "collision at {dest}");
        }
    }
    assert_eq!(seen.len(), 384);
    for well in well_list(PlateFormat::F384) {
        assert!(seen.contains(&well), "{well} not covered");
    }
}

proptest! {
    #[test]
    fn index_roundtrips(index in 0usize..1536, pick in 0usize..3) {
        let format = FORMATS[pick];
        prop_assume!(index < format.wells());
        let well = index_to_well(index, format).expect("well");
        prop_assert_eq!(well_to_index(&well, format).expect("index"), index);
    }

    #[test]
    fn rotation_is_an_involution(index in 0usize..1536, pick in 0usize..3) {
        let format = FORMATS[pick];
        prop_assume!(index < format.wells());
        let once = rotate180(index, format).expect("rotate");
        prop_assert!(once < format.wells());
        prop_assert_eq!(rotate180(once, format).expect("rotate"), index);
    }
}
