//! Overall damage assessment across detected zones

use std::collections::BTreeMap;

use serde::Serialize;

use crate::detection::Severity;
use crate::disaster::zones::DamageZone;

/// Per-zone-type totals
#[derive(Debug, Clone, Serialize)]
pub struct ZoneTypeTotals {
    pub count: usize,
    pub total_area_sq_meters: f64,
    pub avg_confidence: f64,
}

/// Aggregate damage picture for one analyzed image pair
#[derive(Debug, Clone, Serialize)]
pub struct DamageAssessment {
    pub total_damage_zones: usize,
    pub total_damaged_area_sq_meters: f64,
    /// Damaged share of the full image area, in percent
    pub damage_percentage: f64,
    pub damage_by_type: BTreeMap<String, ZoneTypeTotals>,
    /// Damaged area per severity tier
    pub damage_by_severity: BTreeMap<Severity, f64>,
    pub structures_affected: u32,
    pub emergency_priority: Severity,
}

/// Overall emergency priority from summed per-zone severity weights.
///
/// Catastrophic zones weigh 4, severe 3, moderate 2, minor 1; a total of
/// 10 or more is Catastrophic, 6 Severe, 3 Moderate, otherwise Minor.
fn emergency_priority(zones: &[DamageZone]) -> Severity {
    let score: u32 = zones
        .iter()
        .map(|z| match z.severity {
            Severity::Catastrophic => 4,
            Severity::Severe => 3,
            Severity::Moderate => 2,
            Severity::Minor => 1,
        })
        .sum();

    match score {
        s if s >= 10 => Severity::Catastrophic,
        s if s >= 6 => Severity::Severe,
        s if s >= 3 => Severity::Moderate,
        _ => Severity::Minor,
    }
}

/// Aggregate zones into the overall assessment.
///
/// `image_shape` is (rows, cols) of the analyzed imagery; the damage
/// percentage is relative to the full image area in square meters.
pub fn assess_overall_damage(
    zones: &[DamageZone],
    image_shape: (usize, usize),
    pixel_to_meter_ratio: f64,
) -> DamageAssessment {
    let total_area = (image_shape.0 * image_shape.1) as f64 * pixel_to_meter_ratio;

    let mut by_type: BTreeMap<String, ZoneTypeTotals> = BTreeMap::new();
    let mut by_severity: BTreeMap<Severity, f64> =
        Severity::ALL.iter().map(|&s| (s, 0.0)).collect();
    let mut total_damaged = 0.0;

    for zone in zones {
        let entry = by_type
            .entry(zone.zone_type.as_str().to_string())
            .or_insert_with(|| ZoneTypeTotals {
                count: 0,
                total_area_sq_meters: 0.0,
                avg_confidence: 0.0,
            });
        entry.count += 1;
        entry.total_area_sq_meters += zone.area_sq_meters;
        entry.avg_confidence += zone.confidence;

        *by_severity.entry(zone.severity).or_insert(0.0) += zone.area_sq_meters;
        total_damaged += zone.area_sq_meters;
    }

    for entry in by_type.values_mut() {
        entry.avg_confidence /= entry.count as f64;
    }

    let damage_percentage = if total_area > 0.0 {
        total_damaged / total_area * 100.0
    } else {
        0.0
    };

    DamageAssessment {
        total_damage_zones: zones.len(),
        total_damaged_area_sq_meters: total_damaged,
        damage_percentage,
        damage_by_type: by_type,
        damage_by_severity: by_severity,
        structures_affected: zones.iter().map(|z| z.affected_structures).sum(),
        emergency_priority: emergency_priority(zones),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;
    use crate::disaster::zones::DamageZoneType;
    use approx::assert_relative_eq;

    fn zone(zone_type: DamageZoneType, severity: Severity, area: f64, structures: u32) -> DamageZone {
        DamageZone {
            zone_type,
            severity,
            bbox: BoundingBox::new(0, 0, 1, 1),
            area_sq_meters: area,
            confidence: 0.8,
            affected_structures: structures,
            polygon: None,
        }
    }

    #[test]
    fn test_empty_assessment() {
        let a = assess_overall_damage(&[], (100, 100), 1.0);
        assert_eq!(a.total_damage_zones, 0);
        assert_eq!(a.emergency_priority, Severity::Minor);
        assert_relative_eq!(a.damage_percentage, 0.0);
    }

    #[test]
    fn test_totals_and_percentage() {
        let zones = vec![
            zone(DamageZoneType::Flooded, Severity::Severe, 2000.0, 3),
            zone(DamageZoneType::Flooded, Severity::Moderate, 500.0, 1),
            zone(DamageZoneType::Debris, Severity::Moderate, 500.0, 0),
        ];
        // 100x100 at 1 m² per pixel = 10000 m²
        let a = assess_overall_damage(&zones, (100, 100), 1.0);

        assert_eq!(a.total_damage_zones, 3);
        assert_relative_eq!(a.total_damaged_area_sq_meters, 3000.0);
        assert_relative_eq!(a.damage_percentage, 30.0);
        assert_eq!(a.structures_affected, 4);
        assert_eq!(a.damage_by_type["flooded"].count, 2);
        assert_relative_eq!(a.damage_by_severity[&Severity::Moderate], 1000.0);
    }

    #[test]
    fn test_emergency_priority_tiers() {
        let catastrophic = vec![
            zone(DamageZoneType::Collapsed, Severity::Catastrophic, 100.0, 1),
            zone(DamageZoneType::Collapsed, Severity::Catastrophic, 100.0, 1),
            zone(DamageZoneType::Collapsed, Severity::Moderate, 100.0, 0),
        ];
        // 4 + 4 + 2 = 10
        assert_eq!(
            assess_overall_damage(&catastrophic, (10, 10), 1.0).emergency_priority,
            Severity::Catastrophic
        );

        let single = vec![zone(DamageZoneType::Burned, Severity::Severe, 100.0, 0)];
        // score 3
        assert_eq!(
            assess_overall_damage(&single, (10, 10), 1.0).emergency_priority,
            Severity::Moderate
        );
    }
}
