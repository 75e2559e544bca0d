//! Severity scoring for change detections

use crate::change::transition::ChangeType;
use crate::detection::Severity;

/// Score a detection's severity from area, change type and confidence.
///
/// Additive integer score: area over 1000/100/10 hectares adds 3/2/1;
/// critical change types add 2, high-impact types 1; confidence above 0.8
/// adds 1. Score >= 5 is Catastrophic, >= 3 Severe, >= 2 Moderate.
pub fn score_severity(change_type: ChangeType, area_hectares: f64, confidence: f64) -> Severity {
    let mut score = 0u32;

    if area_hectares > 1000.0 {
        score += 3;
    } else if area_hectares > 100.0 {
        score += 2;
    } else if area_hectares > 10.0 {
        score += 1;
    }

    score += match change_type {
        ChangeType::Deforestation | ChangeType::DisasterDamage | ChangeType::WaterDecrease => 2,
        ChangeType::Urbanization | ChangeType::VegetationToBarren => 1,
        _ => 0,
    };

    if confidence > 0.8 {
        score += 1;
    }

    match score {
        s if s >= 5 => Severity::Catastrophic,
        s if s >= 3 => Severity::Severe,
        s if s >= 2 => Severity::Moderate,
        _ => Severity::Minor,
    }
}
