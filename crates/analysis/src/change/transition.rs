//! Transition classification between land-cover classes
//!
//! A region's change type comes from a static rule table over the dominant
//! (modal) class before and after. Transitions outside the table fall through
//! to a distribution check for disaster signatures.

use terrashift_core::Raster;

/// Land-cover legend of the segmentation grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandCoverClass {
    Water,
    Forest,
    Urban,
    Agriculture,
    Barren,
    Grassland,
    Wetland,
    IceSnow,
}

impl LandCoverClass {
    /// Map a raw label value onto the legend
    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            0 => Some(LandCoverClass::Water),
            1 => Some(LandCoverClass::Forest),
            2 => Some(LandCoverClass::Urban),
            3 => Some(LandCoverClass::Agriculture),
            4 => Some(LandCoverClass::Barren),
            5 => Some(LandCoverClass::Grassland),
            6 => Some(LandCoverClass::Wetland),
            7 => Some(LandCoverClass::IceSnow),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LandCoverClass::Water => "water",
            LandCoverClass::Forest => "forest",
            LandCoverClass::Urban => "urban",
            LandCoverClass::Agriculture => "agriculture",
            LandCoverClass::Barren => "barren",
            LandCoverClass::Grassland => "grassland",
            LandCoverClass::Wetland => "wetland",
            LandCoverClass::IceSnow => "ice_snow",
        }
    }
}

/// Categories a region-level transition can classify into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeType {
    Deforestation,
    Reforestation,
    Urbanization,
    UrbanDecline,
    WaterIncrease,
    WaterDecrease,
    BarrenToVegetation,
    VegetationToBarren,
    DisasterDamage,
    Recovery,
    NoChange,
}

impl ChangeType {
    /// Stable serialized label
    pub fn name(&self) -> &'static str {
        match self {
            ChangeType::Deforestation => "deforestation",
            ChangeType::Reforestation => "reforestation",
            ChangeType::Urbanization => "urbanization",
            ChangeType::UrbanDecline => "urban_decline",
            ChangeType::WaterIncrease => "water_increase",
            ChangeType::WaterDecrease => "water_decrease",
            ChangeType::BarrenToVegetation => "barren_to_vegetation",
            ChangeType::VegetationToBarren => "vegetation_to_barren",
            ChangeType::DisasterDamage => "disaster_damage",
            ChangeType::Recovery => "recovery",
            ChangeType::NoChange => "no_change",
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Rule table for dominant-class transitions.
///
/// Returns `None` for pairs the table does not cover; callers fall through
/// to the disaster-pattern check.
pub fn transition_rule(before: LandCoverClass, after: LandCoverClass) -> Option<ChangeType> {
    use ChangeType::*;
    use LandCoverClass::*;

    let change = match (before, after) {
        (Forest, Urban) => Urbanization,
        (Forest, Barren) => Deforestation,
        (Forest, Agriculture) => Deforestation,
        (Urban, Barren) => DisasterDamage,
        (Urban, Water) => DisasterDamage,
        (Barren, Forest) => Reforestation,
        (Barren, Urban) => Urbanization,
        (Barren, Water) => WaterIncrease,
        (Water, Barren) => WaterDecrease,
        (Water, Urban) => Urbanization,
        (Agriculture, Urban) => Urbanization,
        (Agriculture, Barren) => VegetationToBarren,
        (Barren, Agriculture) => BarrenToVegetation,
        (Grassland, Urban) => Urbanization,
        (Grassland, Barren) => VegetationToBarren,
        _ => return None,
    };
    Some(change)
}

/// Per-class occurrence counts over a region, indexed by label value
fn class_counts(grid: &Raster<u16>, pixels: &[(usize, usize)]) -> Vec<usize> {
    let mut counts = Vec::new();
    for &(r, c) in pixels {
        let v = unsafe { grid.get_unchecked(r, c) } as usize;
        if v >= counts.len() {
            counts.resize(v + 1, 0);
        }
        counts[v] += 1;
    }
    counts
}

/// Modal label of a region; ties resolve to the lowest label value
fn dominant_class(counts: &[usize]) -> u16 {
    let mut best = 0;
    let mut best_count = 0;
    for (id, &count) in counts.iter().enumerate() {
        if count > best_count {
            best = id;
            best_count = count;
        }
    }
    best as u16
}

/// Disaster signature: barren or water share of the region grew by > 0.3
fn is_disaster_pattern(before_counts: &[usize], after_counts: &[usize], len: usize) -> bool {
    if len == 0 {
        return false;
    }
    let frac = |counts: &[usize], id: usize| -> f64 {
        counts.get(id).copied().unwrap_or(0) as f64 / len as f64
    };
    let barren_growth = frac(after_counts, 4) - frac(before_counts, 4);
    let water_growth = frac(after_counts, 0) - frac(before_counts, 0);
    barren_growth > 0.3 || water_growth > 0.3
}

/// Classify the change type of one region.
///
/// `pixels` is the region's member list over both grids (same shape assumed,
/// checked upstream). Empty regions classify as `NoChange`.
pub fn classify_region(
    before: &Raster<u16>,
    after: &Raster<u16>,
    pixels: &[(usize, usize)],
) -> ChangeType {
    if pixels.is_empty() {
        return ChangeType::NoChange;
    }

    let before_counts = class_counts(before, pixels);
    let after_counts = class_counts(after, pixels);

    let rule = LandCoverClass::from_id(dominant_class(&before_counts))
        .zip(LandCoverClass::from_id(dominant_class(&after_counts)))
        .and_then(|(b, a)| transition_rule(b, a));

    match rule {
        Some(change) => change,
        None if is_disaster_pattern(&before_counts, &after_counts, pixels.len()) => {
            ChangeType::DisasterDamage
        }
        None => ChangeType::NoChange,
    }
}

/// Estimate region confidence from label consistency.
///
/// Mean of the modal-class fractions before and after, clamped to
/// [0.3, 0.95]. Used when no per-pixel confidence map is available.
pub fn estimate_confidence(
    before: &Raster<u16>,
    after: &Raster<u16>,
    pixels: &[(usize, usize)],
) -> f64 {
    if pixels.is_empty() {
        return 0.3;
    }

    let consistency = |grid: &Raster<u16>| -> f64 {
        let counts = class_counts(grid, pixels);
        let mode = dominant_class(&counts) as usize;
        counts[mode] as f64 / pixels.len() as f64
    };

    let confidence = (consistency(before) + consistency(after)) / 2.0;
    confidence.clamp(0.3, 0.95)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid_of(rows: usize, cols: usize, value: u16) -> Raster<u16> {
        Raster::filled(rows, cols, value)
    }

    fn all_pixels(rows: usize, cols: usize) -> Vec<(usize, usize)> {
        (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .collect()
    }

    #[test]
    fn test_rule_table() {
        use ChangeType::*;
        use LandCoverClass::*;

        assert_eq!(transition_rule(Forest, Urban), Some(Urbanization));
        assert_eq!(transition_rule(Forest, Barren), Some(Deforestation));
        assert_eq!(transition_rule(Urban, Water), Some(DisasterDamage));
        assert_eq!(transition_rule(Water, Barren), Some(WaterDecrease));
        assert_eq!(transition_rule(Grassland, Barren), Some(VegetationToBarren));
        assert_eq!(transition_rule(Urban, Forest), None);
    }

    #[test]
    fn test_classify_forest_to_urban() {
        let before = grid_of(4, 4, 1);
        let after = grid_of(4, 4, 2);
        let pixels = all_pixels(4, 4);
        assert_eq!(
            classify_region(&before, &after, &pixels),
            ChangeType::Urbanization
        );
    }

    #[test]
    fn test_unmapped_transition_without_disaster_signature() {
        // urban -> forest is not in the table and shows no barren/water growth
        let before = grid_of(4, 4, 2);
        let after = grid_of(4, 4, 1);
        let pixels = all_pixels(4, 4);
        assert_eq!(
            classify_region(&before, &after, &pixels),
            ChangeType::NoChange
        );
    }

    #[test]
    fn test_disaster_fallback_on_water_growth() {
        // wetland -> water is unmapped but water share jumps 0 -> 1
        let before = grid_of(4, 4, 6);
        let after = grid_of(4, 4, 0);
        let pixels = all_pixels(4, 4);
        assert_eq!(
            classify_region(&before, &after, &pixels),
            ChangeType::DisasterDamage
        );
    }

    #[test]
    fn test_confidence_uniform_region_caps_at_095() {
        let before = grid_of(4, 4, 1);
        let after = grid_of(4, 4, 2);
        let pixels = all_pixels(4, 4);
        assert_relative_eq!(estimate_confidence(&before, &after, &pixels), 0.95);
    }

    #[test]
    fn test_confidence_mixed_region() {
        // before: half forest half urban, after: uniform urban
        let mut before = grid_of(2, 4, 1);
        for c in 0..4 {
            before.set(1, c, 2).unwrap();
        }
        let after = grid_of(2, 4, 2);
        let pixels = all_pixels(2, 4);

        // (0.5 + 1.0) / 2 = 0.75
        assert_relative_eq!(estimate_confidence(&before, &after, &pixels), 0.75);
    }

    #[test]
    fn test_confidence_floor() {
        assert_relative_eq!(
            estimate_confidence(&grid_of(2, 2, 0), &grid_of(2, 2, 1), &[]),
            0.3
        );
    }
}
