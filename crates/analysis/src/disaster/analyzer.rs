//! Disaster analysis orchestration

use terrashift_core::{Error, Raster, Result};

use crate::disaster::assessment::{assess_overall_damage, DamageAssessment};
use crate::disaster::indices::{detect_disaster_type, DetectorThresholds, DisasterType};
use crate::disaster::priority::{evacuation_priority_map, relief_access_map};
use crate::disaster::zones::{
    detect_burn_zones, detect_collapse_zones, detect_flood_zones, detect_generic_zones,
    DamageZone, ZoneParams,
};
use crate::disaster::RgbImage;

#[derive(Debug, Clone, Default)]
pub struct DisasterAnalyzerParams {
    pub thresholds: DetectorThresholds,
    pub zones: ZoneParams,
}

/// Complete result of one before/after imagery analysis
#[derive(Debug, Clone)]
pub struct DisasterAnalysis {
    /// Detected (or caller-supplied) disaster type
    pub disaster_type: DisasterType,
    pub zones: Vec<DamageZone>,
    pub assessment: DamageAssessment,
    pub evacuation_map: Raster<u8>,
    pub access_map: Raster<u8>,
}

/// Analyze a before/after image pair for disaster damage.
///
/// When `disaster_type` is `None` the type is auto-detected from the
/// spectral-proxy indices. Types without a dedicated finder (hurricane,
/// landslide, tornado, unknown) dispatch to the generic finder.
pub fn analyze_disaster(
    pre: &RgbImage,
    post: &RgbImage,
    disaster_type: Option<DisasterType>,
    params: &DisasterAnalyzerParams,
) -> Result<DisasterAnalysis> {
    if post.shape() != pre.shape() {
        return Err(Error::shape_mismatch(pre.shape(), post.shape()));
    }

    let disaster_type = match disaster_type {
        Some(t) => t,
        None => detect_disaster_type(pre, post, &params.thresholds)?,
    };
    tracing::debug!(%disaster_type, "running damage-zone detection");

    let zones = match disaster_type {
        DisasterType::Flood => detect_flood_zones(pre, post, &params.zones)?,
        DisasterType::Fire => detect_burn_zones(pre, post, &params.zones)?,
        DisasterType::Earthquake => detect_collapse_zones(pre, post, &params.zones)?,
        _ => detect_generic_zones(pre, post, &params.zones)?,
    };

    let shape = pre.shape();
    let assessment = assess_overall_damage(&zones, shape, params.zones.pixel_to_meter_ratio);
    let evacuation_map = evacuation_priority_map(&zones, shape);
    let access_map = relief_access_map(&zones, shape);

    Ok(DisasterAnalysis {
        disaster_type,
        zones,
        assessment,
        evacuation_map,
        access_map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Severity;
    use crate::disaster::zones::DamageZoneType;
    use approx::assert_relative_eq;

    fn uniform_rgb(rows: usize, cols: usize, r: f64, g: f64, b: f64) -> RgbImage {
        RgbImage::new(
            Raster::filled(rows, cols, r),
            Raster::filled(rows, cols, g),
            Raster::filled(rows, cols, b),
        )
        .unwrap()
    }

    fn paint(band: &mut Raster<f64>, r0: usize, r1: usize, c0: usize, c1: usize, value: f64) {
        for r in r0..r1 {
            for c in c0..c1 {
                band.set(r, c, value).unwrap();
            }
        }
    }

    #[test]
    fn test_flood_pipeline_end_to_end() {
        let pre = uniform_rgb(60, 60, 120.0, 110.0, 90.0);
        let mut post = pre.clone();
        // 40x40 flooded patch drives both type detection and zoning
        paint(&mut post.red, 10, 50, 10, 50, 40.0);
        paint(&mut post.green, 10, 50, 10, 50, 160.0);
        paint(&mut post.blue, 10, 50, 10, 50, 180.0);

        let result =
            analyze_disaster(&pre, &post, None, &DisasterAnalyzerParams::default()).unwrap();

        assert_eq!(result.disaster_type, DisasterType::Flood);
        assert_eq!(result.zones.len(), 1);
        assert_eq!(result.zones[0].zone_type, DamageZoneType::Flooded);
        assert_relative_eq!(result.zones[0].area_sq_meters, 1600.0);
        assert_eq!(result.zones[0].severity, Severity::Severe);

        // Priority rasters reflect the zone
        assert_eq!(result.evacuation_map.get(30, 30).unwrap(), 200);
        assert_eq!(result.access_map.get(30, 30).unwrap(), 255);
        assert_eq!(result.access_map.get(0, 0).unwrap(), 100);

        assert_relative_eq!(result.assessment.total_damaged_area_sq_meters, 1600.0);
    }

    #[test]
    fn test_explicit_type_skips_detection() {
        let pre = uniform_rgb(20, 20, 100.0, 100.0, 100.0);
        let mut post = pre.clone();
        paint(&mut post.red, 0, 15, 0, 15, 220.0);
        paint(&mut post.green, 0, 15, 0, 15, 220.0);
        paint(&mut post.blue, 0, 15, 0, 15, 220.0);

        // Hurricane has no dedicated finder, so the generic path runs
        let result = analyze_disaster(
            &pre,
            &post,
            Some(DisasterType::Hurricane),
            &DisasterAnalyzerParams::default(),
        )
        .unwrap();

        assert_eq!(result.disaster_type, DisasterType::Hurricane);
        assert_eq!(result.zones[0].zone_type, DamageZoneType::Debris);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let pre = uniform_rgb(10, 10, 0.0, 0.0, 0.0);
        let post = uniform_rgb(10, 12, 0.0, 0.0, 0.0);
        assert!(matches!(
            analyze_disaster(&pre, &post, None, &DisasterAnalyzerParams::default()),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
