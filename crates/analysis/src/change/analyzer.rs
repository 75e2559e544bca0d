//! Change analysis orchestration
//!
//! Runs the full grid pipeline: change mask, connected regions, per-region
//! classification, confidence and severity, then aggregate statistics.

use serde::Serialize;
use terrashift_core::{Error, Raster, Result};

use crate::change::change_map::{change_mask, transition_map};
use crate::change::severity::score_severity;
use crate::change::statistics::{calculate_statistics, ChangeStatistics};
use crate::change::transition::{classify_region, estimate_confidence, ChangeType};
use crate::detection::{BoundingBox, Detection, Severity};
use crate::maybe_rayon::*;
use crate::regions::{extract_regions, Region, RegionExtractorParams};

/// One detected change region
#[derive(Debug, Clone)]
pub struct ChangeDetection {
    pub change_type: ChangeType,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub bbox: BoundingBox,
    pub area_hectares: f64,
    pub severity: Severity,
    /// Closed boundary ring in pixel (x, y), when traced
    pub polygon: Option<Vec<(usize, usize)>>,
}

impl Detection for ChangeDetection {
    fn type_name(&self) -> &'static str {
        self.change_type.name()
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn area(&self) -> f64 {
        self.area_hectares
    }

    fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    fn polygon(&self) -> Option<&[(usize, usize)]> {
        self.polygon.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct ChangeAnalyzerParams {
    /// Hectares covered by one pixel
    pub pixel_to_hectare_ratio: f64,
    /// Regions below this area are dropped
    pub min_area_hectares: f64,
}

impl Default for ChangeAnalyzerParams {
    fn default() -> Self {
        Self {
            pixel_to_hectare_ratio: 0.01,
            min_area_hectares: 0.1,
        }
    }
}

/// Complete result of one before/after grid analysis
#[derive(Debug, Clone)]
pub struct ChangeAnalysis {
    pub detections: Vec<ChangeDetection>,
    pub change_map: Raster<u8>,
    pub transition_map: Raster<u16>,
    pub statistics: ChangeStatistics,
}

fn analyze_region(
    before: &Raster<u16>,
    after: &Raster<u16>,
    confidence_map: Option<&Raster<f64>>,
    region: Region,
) -> Result<ChangeDetection> {
    if region.pixels.is_empty() {
        return Err(Error::Algorithm("empty region".into()));
    }

    let change_type = classify_region(before, after, &region.pixels);

    let confidence = match confidence_map {
        Some(map) => {
            let sum: f64 = region
                .pixels
                .iter()
                .map(|&(r, c)| unsafe { map.get_unchecked(r, c) })
                .sum();
            sum / region.pixels.len() as f64
        }
        None => estimate_confidence(before, after, &region.pixels),
    };

    let severity = score_severity(change_type, region.area, confidence);

    Ok(ChangeDetection {
        change_type,
        confidence,
        bbox: region.bbox,
        area_hectares: region.area,
        severity,
        polygon: Some(region.polygon),
    })
}

/// Analyze two segmentation grids into typed change detections.
///
/// `confidence` is an optional per-pixel confidence map matching the grid
/// shape; without it, region confidence is estimated from label consistency.
/// A region whose analysis fails is logged and skipped, the rest of the
/// result is still produced.
pub fn analyze_changes(
    before: &Raster<u16>,
    after: &Raster<u16>,
    confidence: Option<&Raster<f64>>,
    params: &ChangeAnalyzerParams,
) -> Result<ChangeAnalysis> {
    let mask = change_mask(before, after)?;
    let transitions = transition_map(before, after)?;

    if let Some(map) = confidence {
        if map.shape() != before.shape() {
            return Err(Error::shape_mismatch(before.shape(), map.shape()));
        }
    }

    let regions = extract_regions(
        &mask,
        &RegionExtractorParams {
            min_area: params.min_area_hectares,
            pixel_to_area_ratio: params.pixel_to_hectare_ratio,
        },
    );

    let mut detections = Vec::with_capacity(regions.len());
    for region in regions {
        match analyze_region(before, after, confidence, region) {
            Ok(d) => detections.push(d),
            Err(e) => tracing::warn!("skipping change region: {e}"),
        }
    }

    let statistics = calculate_statistics(&detections, before.shape(), params.pixel_to_hectare_ratio);

    Ok(ChangeAnalysis {
        detections,
        change_map: mask,
        transition_map: transitions,
        statistics,
    })
}

/// Analyze many grid pairs, in parallel when the `parallel` feature is on.
///
/// Results come back in input order; each pair fails independently.
pub fn analyze_changes_batch(
    pairs: &[(Raster<u16>, Raster<u16>)],
    params: &ChangeAnalyzerParams,
) -> Vec<Result<ChangeAnalysis>> {
    pairs
        .par_iter()
        .map(|(before, after)| analyze_changes(before, after, None, params))
        .collect()
}

/// One entry in the priority alert list
#[derive(Debug, Clone, Serialize)]
pub struct PriorityAlert {
    pub change_type: &'static str,
    pub severity: Severity,
    pub area_hectares: f64,
    pub bbox: BoundingBox,
    pub confidence: f64,
}

/// Executive summary of one analysis
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub total_changes_detected: usize,
    pub priority_changes: usize,
    pub overall_confidence: f64,
    pub deforestation_hectares: f64,
    pub urbanization_hectares: f64,
    pub priority_alerts: Vec<PriorityAlert>,
    pub statistics: ChangeStatistics,
}

/// Condense an analysis into an alert-oriented report.
///
/// Priority changes are the Severe and Catastrophic detections; the alert
/// list carries at most the first ten of them.
pub fn summary_report(analysis: &ChangeAnalysis) -> SummaryReport {
    let priority: Vec<&ChangeDetection> = analysis
        .detections
        .iter()
        .filter(|d| d.severity >= Severity::Severe)
        .collect();

    let overall_confidence = if analysis.detections.is_empty() {
        0.0
    } else {
        analysis.detections.iter().map(|d| d.confidence).sum::<f64>()
            / analysis.detections.len() as f64
    };

    let area_of = |change_type: ChangeType| -> f64 {
        analysis
            .detections
            .iter()
            .filter(|d| d.change_type == change_type)
            .map(|d| d.area_hectares)
            .sum()
    };

    SummaryReport {
        total_changes_detected: analysis.detections.len(),
        priority_changes: priority.len(),
        overall_confidence,
        deforestation_hectares: area_of(ChangeType::Deforestation),
        urbanization_hectares: area_of(ChangeType::Urbanization),
        priority_alerts: priority
            .iter()
            .take(10)
            .map(|d| PriorityAlert {
                change_type: d.change_type.name(),
                severity: d.severity,
                area_hectares: d.area_hectares,
                bbox: d.bbox,
                confidence: d.confidence,
            })
            .collect(),
        statistics: analysis.statistics.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid_of(rows: usize, cols: usize, value: u16) -> Raster<u16> {
        Raster::filled(rows, cols, value)
    }

    #[test]
    fn test_identical_grids_no_detections() {
        let grid = grid_of(10, 10, 1);
        let result = analyze_changes(&grid, &grid, None, &ChangeAnalyzerParams::default()).unwrap();

        assert!(result.detections.is_empty());
        assert_eq!(result.statistics.total_detections, 0);
        assert_eq!(result.change_map.count_where(|v| v != 0), 0);
    }

    #[test]
    fn test_full_forest_to_urban() {
        let before = grid_of(10, 10, 1);
        let after = grid_of(10, 10, 2);
        let result =
            analyze_changes(&before, &after, None, &ChangeAnalyzerParams::default()).unwrap();

        assert_eq!(result.detections.len(), 1);
        let d = &result.detections[0];
        assert_eq!(d.change_type, ChangeType::Urbanization);
        // 100 pixels at 0.01 ha each
        assert_relative_eq!(d.area_hectares, 1.0);
        assert!(d.confidence >= 0.3 && d.confidence <= 0.95);
        assert!(d.polygon.is_some());
    }

    #[test]
    fn test_min_area_drops_speck() {
        let before = grid_of(10, 10, 1);
        let mut after = before.clone();
        after.set(5, 5, 2).unwrap(); // one pixel = 0.01 ha < 0.1 ha

        let result =
            analyze_changes(&before, &after, None, &ChangeAnalyzerParams::default()).unwrap();
        assert!(result.detections.is_empty());
        assert_eq!(result.change_map.get(5, 5).unwrap(), 1);
    }

    #[test]
    fn test_confidence_map_used_when_given() {
        let before = grid_of(4, 4, 1);
        let after = grid_of(4, 4, 2);
        let conf = Raster::filled(4, 4, 0.65f64);

        let params = ChangeAnalyzerParams {
            min_area_hectares: 0.0,
            ..Default::default()
        };
        let result = analyze_changes(&before, &after, Some(&conf), &params).unwrap();
        assert_relative_eq!(result.detections[0].confidence, 0.65);
    }

    #[test]
    fn test_confidence_map_shape_checked() {
        let before = grid_of(4, 4, 1);
        let after = grid_of(4, 4, 2);
        let conf: Raster<f64> = Raster::new(3, 3);

        let err = analyze_changes(&before, &after, Some(&conf), &ChangeAnalyzerParams::default());
        assert!(matches!(err, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_batch_preserves_order() {
        let a = grid_of(5, 5, 1);
        let b = grid_of(5, 5, 2);
        let pairs = vec![(a.clone(), a.clone()), (a, b)];

        let results = analyze_changes_batch(&pairs, &ChangeAnalyzerParams::default());
        assert_eq!(results.len(), 2);
        assert!(results[0].as_ref().unwrap().detections.is_empty());
        assert_eq!(results[1].as_ref().unwrap().detections.len(), 1);
    }

    #[test]
    fn test_summary_report_counts_priorities() {
        let before = grid_of(10, 10, 1);
        let after = grid_of(10, 10, 4); // deforestation, uniform labels
        let result =
            analyze_changes(&before, &after, None, &ChangeAnalyzerParams::default()).unwrap();

        let report = summary_report(&result);
        assert_eq!(report.total_changes_detected, 1);
        // deforestation (+2) with confidence 0.95 (+1) at 1 ha = Severe
        assert_eq!(report.priority_changes, 1);
        assert_eq!(report.priority_alerts.len(), 1);
        assert_relative_eq!(report.deforestation_hectares, 1.0);
    }
}
