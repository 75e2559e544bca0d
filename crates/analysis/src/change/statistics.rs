//! Aggregate statistics over a detection list

use std::collections::BTreeMap;

use serde::Serialize;

use crate::change::analyzer::ChangeDetection;
use crate::detection::Severity;

/// Per-change-type aggregate
#[derive(Debug, Clone, Serialize)]
pub struct TypeBreakdown {
    pub count: usize,
    pub total_area_hectares: f64,
    pub avg_confidence: f64,
    pub severity_breakdown: BTreeMap<Severity, usize>,
    pub percentage_of_image: f64,
}

/// Confidence distribution over all detections
#[derive(Debug, Clone, Serialize)]
pub struct ConfidenceSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

/// Full statistics block attached to an analysis result
#[derive(Debug, Clone, Serialize)]
pub struct ChangeStatistics {
    pub total_detections: usize,
    pub total_changed_area_hectares: f64,
    pub overall_change_percentage: f64,
    pub change_type_breakdown: BTreeMap<String, TypeBreakdown>,
    pub severity_summary: BTreeMap<Severity, usize>,
    pub confidence_summary: ConfidenceSummary,
}

fn empty_severity_counts() -> BTreeMap<Severity, usize> {
    Severity::ALL.iter().map(|&s| (s, 0)).collect()
}

fn confidence_summary(detections: &[ChangeDetection]) -> ConfidenceSummary {
    if detections.is_empty() {
        return ConfidenceSummary {
            mean: 0.0,
            min: 0.0,
            max: 0.0,
            std: 0.0,
        };
    }

    let n = detections.len() as f64;
    let mean = detections.iter().map(|d| d.confidence).sum::<f64>() / n;
    let min = detections.iter().map(|d| d.confidence).fold(f64::INFINITY, f64::min);
    let max = detections
        .iter()
        .map(|d| d.confidence)
        .fold(f64::NEG_INFINITY, f64::max);
    let variance = detections
        .iter()
        .map(|d| (d.confidence - mean).powi(2))
        .sum::<f64>()
        / n;

    ConfidenceSummary {
        mean,
        min,
        max,
        std: variance.sqrt(),
    }
}

/// Aggregate detections into per-type, severity and confidence summaries.
///
/// `image_shape` is (rows, cols) of the analyzed grids; percentages are
/// relative to the full image area in hectares.
pub fn calculate_statistics(
    detections: &[ChangeDetection],
    image_shape: (usize, usize),
    pixel_to_hectare_ratio: f64,
) -> ChangeStatistics {
    let total_area = (image_shape.0 * image_shape.1) as f64 * pixel_to_hectare_ratio;

    let mut by_type: BTreeMap<String, TypeBreakdown> = BTreeMap::new();
    let mut severity_summary = empty_severity_counts();

    for d in detections {
        let entry = by_type
            .entry(d.change_type.name().to_string())
            .or_insert_with(|| TypeBreakdown {
                count: 0,
                total_area_hectares: 0.0,
                avg_confidence: 0.0,
                severity_breakdown: empty_severity_counts(),
                percentage_of_image: 0.0,
            });
        entry.count += 1;
        entry.total_area_hectares += d.area_hectares;
        entry.avg_confidence += d.confidence;
        *entry.severity_breakdown.entry(d.severity).or_insert(0) += 1;

        *severity_summary.entry(d.severity).or_insert(0) += 1;
    }

    for entry in by_type.values_mut() {
        entry.avg_confidence /= entry.count as f64;
        if total_area > 0.0 {
            entry.percentage_of_image = entry.total_area_hectares / total_area * 100.0;
        }
    }

    let total_changed: f64 = detections.iter().map(|d| d.area_hectares).sum();
    let overall_pct = if total_area > 0.0 {
        total_changed / total_area * 100.0
    } else {
        0.0
    };

    ChangeStatistics {
        total_detections: detections.len(),
        total_changed_area_hectares: total_changed,
        overall_change_percentage: overall_pct,
        change_type_breakdown: by_type,
        severity_summary,
        confidence_summary: confidence_summary(detections),
    }
}
