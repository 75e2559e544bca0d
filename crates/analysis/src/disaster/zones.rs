//! Damage-zone finders
//!
//! Each finder builds a binary damage mask from the before/after imagery,
//! extracts connected regions above a per-type area floor, and emits zones
//! with the type's fixed detection confidence.

use std::collections::HashSet;

use terrashift_core::{Raster, Result};

use crate::detection::{BoundingBox, Detection, Severity};
use crate::disaster::edge::edge_mask;
use crate::disaster::mask::binary_closing;
use crate::disaster::RgbImage;
use crate::regions::{extract_regions, label_components, Region, RegionExtractorParams};

use serde::Serialize;

const EPS: f64 = 1e-6;

/// Categories of damage a zone can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageZoneType {
    Flooded,
    Burned,
    Collapsed,
    Debris,
    Eroded,
    DamagedInfrastructure,
    DisplacedVegetation,
}

impl DamageZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DamageZoneType::Flooded => "flooded",
            DamageZoneType::Burned => "burned",
            DamageZoneType::Collapsed => "collapsed",
            DamageZoneType::Debris => "debris",
            DamageZoneType::Eroded => "eroded",
            DamageZoneType::DamagedInfrastructure => "damaged_infrastructure",
            DamageZoneType::DisplacedVegetation => "displaced_vegetation",
        }
    }
}

impl std::fmt::Display for DamageZoneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected damage zone
#[derive(Debug, Clone)]
pub struct DamageZone {
    pub zone_type: DamageZoneType,
    pub severity: Severity,
    pub bbox: BoundingBox,
    pub area_sq_meters: f64,
    /// Fixed per-finder detection confidence
    pub confidence: f64,
    pub affected_structures: u32,
    /// Closed boundary ring in pixel (x, y), when traced
    pub polygon: Option<Vec<(usize, usize)>>,
}

impl Detection for DamageZone {
    fn type_name(&self) -> &'static str {
        self.zone_type.as_str()
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn area(&self) -> f64 {
        self.area_sq_meters
    }

    fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    fn polygon(&self) -> Option<&[(usize, usize)]> {
        self.polygon.as_deref()
    }

    fn affected_structures(&self) -> Option<u32> {
        Some(self.affected_structures)
    }
}

#[derive(Debug, Clone)]
pub struct ZoneParams {
    /// Square meters covered by one pixel
    pub pixel_to_meter_ratio: f64,
    /// Sobel magnitude above which a pixel is an edge
    pub edge_magnitude: f64,
}

impl Default for ZoneParams {
    fn default() -> Self {
        Self {
            pixel_to_meter_ratio: 1.0,
            edge_magnitude: 100.0,
        }
    }
}

fn regions_above(mask: &Raster<u8>, min_area: f64, params: &ZoneParams) -> Vec<Region> {
    extract_regions(
        mask,
        &RegionExtractorParams {
            min_area,
            pixel_to_area_ratio: params.pixel_to_meter_ratio,
        },
    )
}

/// Water occupancy: strongly blue pixels (`blue > red + 20 && blue > 100`)
fn water_mask(img: &RgbImage) -> Raster<u8> {
    let (rows, cols) = img.shape();
    let mut mask = Raster::new(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            let r = unsafe { img.red.get_unchecked(row, col) };
            let b = unsafe { img.blue.get_unchecked(row, col) };
            unsafe { mask.set_unchecked(row, col, u8::from(b > r + 20.0 && b > 100.0)) };
        }
    }
    mask
}

fn flood_severity(area_sq_meters: f64) -> Severity {
    if area_sq_meters > 10_000.0 {
        Severity::Catastrophic
    } else if area_sq_meters > 1000.0 {
        Severity::Severe
    } else {
        Severity::Moderate
    }
}

fn burn_severity(vegetation_loss: f64) -> Severity {
    if vegetation_loss > 0.8 {
        Severity::Catastrophic
    } else if vegetation_loss > 0.6 {
        Severity::Severe
    } else if vegetation_loss > 0.4 {
        Severity::Moderate
    } else {
        Severity::Minor
    }
}

fn collapse_severity(area_sq_meters: f64) -> Severity {
    if area_sq_meters > 5000.0 {
        Severity::Catastrophic
    } else if area_sq_meters > 1000.0 {
        Severity::Severe
    } else if area_sq_meters > 200.0 {
        Severity::Moderate
    } else {
        Severity::Minor
    }
}

/// Count pre-image edge clusters larger than 100 pixels that touch the zone
fn count_affected_structures(edge_clusters: &[Vec<(usize, usize)>], zone: &Region) -> u32 {
    let members: HashSet<(usize, usize)> = zone.pixels.iter().copied().collect();
    edge_clusters
        .iter()
        .filter(|cluster| cluster.len() > 100 && cluster.iter().any(|p| members.contains(p)))
        .count() as u32
}

/// Detect newly flooded areas: water in the post image where there was none.
///
/// Zones under 100 square meters are dropped; confidence is fixed at 0.8.
pub fn detect_flood_zones(
    pre: &RgbImage,
    post: &RgbImage,
    params: &ZoneParams,
) -> Result<Vec<DamageZone>> {
    let pre_water = water_mask(pre);
    let post_water = water_mask(post);
    let (rows, cols) = pre_water.shape();

    let mut flood = Raster::new(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            let new_water = unsafe { post_water.get_unchecked(row, col) } != 0
                && unsafe { pre_water.get_unchecked(row, col) } == 0;
            unsafe { flood.set_unchecked(row, col, u8::from(new_water)) };
        }
    }

    let edge_clusters = if rows >= 3 && cols >= 3 {
        label_components(&edge_mask(&pre.grayscale(), params.edge_magnitude)?)
    } else {
        Vec::new()
    };

    Ok(regions_above(&flood, 100.0, params)
        .into_iter()
        .map(|region| DamageZone {
            zone_type: DamageZoneType::Flooded,
            severity: flood_severity(region.area),
            bbox: region.bbox,
            area_sq_meters: region.area,
            confidence: 0.8,
            affected_structures: count_affected_structures(&edge_clusters, &region),
            polygon: Some(region.polygon),
        })
        .collect())
}

/// Detect burned areas: darkened pixels that shifted toward red.
///
/// Mask: brightness dropped by more than 30 and the post-image red share of
/// the pixel exceeds 0.4. Zones under 500 square meters are dropped;
/// confidence is fixed at 0.75. Severity follows the green-channel
/// vegetation-loss fraction over the zone.
pub fn detect_burn_zones(
    pre: &RgbImage,
    post: &RgbImage,
    params: &ZoneParams,
) -> Result<Vec<DamageZone>> {
    let pre_brightness = pre.brightness();
    let post_brightness = post.brightness();
    let (rows, cols) = pre_brightness.shape();

    let mut burn = Raster::new(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            let darkening = unsafe { pre_brightness.get_unchecked(row, col) }
                - unsafe { post_brightness.get_unchecked(row, col) };
            let r = unsafe { post.red.get_unchecked(row, col) };
            let g = unsafe { post.green.get_unchecked(row, col) };
            let b = unsafe { post.blue.get_unchecked(row, col) };
            let red_ratio = r / (r + g + b + EPS);
            unsafe { burn.set_unchecked(row, col, u8::from(darkening > 30.0 && red_ratio > 0.4)) };
        }
    }

    Ok(regions_above(&burn, 500.0, params)
        .into_iter()
        .map(|region| {
            let n = region.pixels.len() as f64;
            let mean_green = |band: &Raster<f64>| -> f64 {
                region
                    .pixels
                    .iter()
                    .map(|&(r, c)| unsafe { band.get_unchecked(r, c) })
                    .sum::<f64>()
                    / n
            };
            let pre_green = mean_green(&pre.green);
            let post_green = mean_green(&post.green);
            let vegetation_loss = if pre_green > 0.0 {
                (pre_green - post_green) / pre_green
            } else {
                0.0
            };

            DamageZone {
                zone_type: DamageZoneType::Burned,
                severity: burn_severity(vegetation_loss),
                bbox: region.bbox,
                area_sq_meters: region.area,
                confidence: 0.75,
                affected_structures: 0,
                polygon: Some(region.polygon),
            }
        })
        .collect())
}

/// Detect collapsed structures: edges present before and gone after.
///
/// The edge-loss mask is cleaned with a 3x3 binary closing. Zones under 50
/// square meters are dropped; confidence is fixed at 0.7 and each zone is
/// assumed to hold at least one structure.
pub fn detect_collapse_zones(
    pre: &RgbImage,
    post: &RgbImage,
    params: &ZoneParams,
) -> Result<Vec<DamageZone>> {
    let pre_edges = edge_mask(&pre.grayscale(), params.edge_magnitude)?;
    let post_edges = edge_mask(&post.grayscale(), params.edge_magnitude)?;
    let (rows, cols) = pre_edges.shape();

    let mut loss = Raster::new(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            let lost = unsafe { pre_edges.get_unchecked(row, col) } != 0
                && unsafe { post_edges.get_unchecked(row, col) } == 0;
            unsafe { loss.set_unchecked(row, col, u8::from(lost)) };
        }
    }
    let cleaned = binary_closing(&loss);

    Ok(regions_above(&cleaned, 50.0, params)
        .into_iter()
        .map(|region| DamageZone {
            zone_type: DamageZoneType::Collapsed,
            severity: collapse_severity(region.area),
            bbox: region.bbox,
            area_sq_meters: region.area,
            confidence: 0.7,
            affected_structures: 1,
            polygon: Some(region.polygon),
        })
        .collect())
}

/// Generic fallback for unrecognized disaster types.
///
/// Any pixel whose grayscale changed by more than 50 counts as damaged;
/// zones are typed Debris at fixed Moderate severity and 0.6 confidence.
pub fn detect_generic_zones(
    pre: &RgbImage,
    post: &RgbImage,
    params: &ZoneParams,
) -> Result<Vec<DamageZone>> {
    let pre_gray = pre.grayscale();
    let post_gray = post.grayscale();
    let (rows, cols) = pre_gray.shape();

    let mut diff = Raster::new(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            let delta = (unsafe { pre_gray.get_unchecked(row, col) }
                - unsafe { post_gray.get_unchecked(row, col) })
            .abs();
            unsafe { diff.set_unchecked(row, col, u8::from(delta > 50.0)) };
        }
    }

    Ok(regions_above(&diff, 100.0, params)
        .into_iter()
        .map(|region| DamageZone {
            zone_type: DamageZoneType::Debris,
            severity: Severity::Moderate,
            bbox: region.bbox,
            area_sq_meters: region.area,
            confidence: 0.6,
            affected_structures: 0,
            polygon: Some(region.polygon),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_flood_zone_detected() {
        let pre = uniform_rgb(40, 40, 120.0, 110.0, 90.0);
        let mut post = pre.clone();
        // 20x20 patch turns to water
        paint(&mut post.red, 5, 25, 5, 25, 40.0);
        paint(&mut post.blue, 5, 25, 5, 25, 180.0);

        let zones = detect_flood_zones(&pre, &post, &ZoneParams::default()).unwrap();
        assert_eq!(zones.len(), 1);

        let z = &zones[0];
        assert_eq!(z.zone_type, DamageZoneType::Flooded);
        assert_relative_eq!(z.area_sq_meters, 400.0);
        assert_eq!(z.severity, Severity::Moderate);
        assert_relative_eq!(z.confidence, 0.8);
        assert_eq!(z.bbox, BoundingBox::new(5, 5, 20, 20));
    }

    #[test]
    fn test_small_flood_patch_dropped() {
        let pre = uniform_rgb(20, 20, 120.0, 110.0, 90.0);
        let mut post = pre.clone();
        // 5x5 patch = 25 sq meters, below the 100 floor
        paint(&mut post.red, 2, 7, 2, 7, 40.0);
        paint(&mut post.blue, 2, 7, 2, 7, 180.0);

        let zones = detect_flood_zones(&pre, &post, &ZoneParams::default()).unwrap();
        assert!(zones.is_empty());
    }

    #[test]
    fn test_burn_zone_severity_tracks_vegetation_loss() {
        let pre = uniform_rgb(40, 40, 100.0, 200.0, 80.0);
        let mut post = pre.clone();
        // 30x30 burned patch: dark, red-dominant, green nearly gone
        paint(&mut post.red, 0, 30, 0, 30, 90.0);
        paint(&mut post.green, 0, 30, 0, 30, 20.0);
        paint(&mut post.blue, 0, 30, 0, 30, 20.0);

        let zones = detect_burn_zones(&pre, &post, &ZoneParams::default()).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].zone_type, DamageZoneType::Burned);
        // vegetation loss (200 - 20) / 200 = 0.9
        assert_eq!(zones[0].severity, Severity::Catastrophic);
        assert_relative_eq!(zones[0].confidence, 0.75);
    }

    #[test]
    fn test_generic_zone_is_moderate_debris() {
        let pre = uniform_rgb(20, 20, 100.0, 100.0, 100.0);
        let mut post = pre.clone();
        paint(&mut post.red, 0, 12, 0, 12, 220.0);
        paint(&mut post.green, 0, 12, 0, 12, 220.0);
        paint(&mut post.blue, 0, 12, 0, 12, 220.0);

        let zones = detect_generic_zones(&pre, &post, &ZoneParams::default()).unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].zone_type, DamageZoneType::Debris);
        assert_eq!(zones[0].severity, Severity::Moderate);
        assert_eq!(zones[0].affected_structures, 0);
    }

    #[test]
    fn test_identical_images_yield_no_zones() {
        let img = uniform_rgb(20, 20, 100.0, 120.0, 90.0);
        assert!(detect_flood_zones(&img, &img, &ZoneParams::default())
            .unwrap()
            .is_empty());
        assert!(detect_generic_zones(&img, &img, &ZoneParams::default())
            .unwrap()
            .is_empty());
        assert!(detect_collapse_zones(&img, &img, &ZoneParams::default())
            .unwrap()
            .is_empty());
    }
}
