//! Spectral-proxy indices and disaster-type detection
//!
//! True spectral bands are unavailable in plain RGB imagery, so the indices
//! approximate them: the water index uses green against red, the burn index
//! red against blue, and structural loss compares edge densities.

use serde::Serialize;
use terrashift_core::{Raster, Result};

use crate::disaster::edge::edge_density;
use crate::disaster::RgbImage;

const EPS: f64 = 1e-6;

/// Disaster categories the detector can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisasterType {
    Flood,
    Fire,
    Earthquake,
    Hurricane,
    Landslide,
    Tornado,
    Unknown,
}

impl DisasterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisasterType::Flood => "flood",
            DisasterType::Fire => "fire",
            DisasterType::Earthquake => "earthquake",
            DisasterType::Hurricane => "hurricane",
            DisasterType::Landslide => "landslide",
            DisasterType::Tornado => "tornado",
            DisasterType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DisasterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DisasterType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "flood" => Ok(DisasterType::Flood),
            "fire" => Ok(DisasterType::Fire),
            "earthquake" => Ok(DisasterType::Earthquake),
            "hurricane" => Ok(DisasterType::Hurricane),
            "landslide" => Ok(DisasterType::Landslide),
            "tornado" => Ok(DisasterType::Tornado),
            "unknown" => Ok(DisasterType::Unknown),
            other => Err(format!("unknown disaster type: {other}")),
        }
    }
}

/// Detection thresholds with the calibrated defaults
#[derive(Debug, Clone)]
pub struct DetectorThresholds {
    /// Water-index value above which a pixel counts as water
    pub water_detection: f64,
    /// Burn-index delta above which a pixel counts as burned
    pub burn_detection: f64,
    /// Image water-fraction growth that indicates a flood
    pub water_growth: f64,
    /// Image burned-pixel fraction that indicates a fire
    pub burn_fraction: f64,
    /// Edge-density loss that indicates structural collapse
    pub structural_loss: f64,
    /// Sobel magnitude above which a pixel is an edge
    pub edge_magnitude: f64,
}

impl Default for DetectorThresholds {
    fn default() -> Self {
        Self {
            water_detection: 0.3,
            burn_detection: 0.4,
            water_growth: 0.2,
            burn_fraction: 0.3,
            structural_loss: 0.4,
            edge_magnitude: 100.0,
        }
    }
}

/// Water index `(green - red) / (green + red)` per pixel
pub fn water_index(img: &RgbImage) -> Raster<f64> {
    normalized_difference(&img.green, &img.red)
}

/// Burn index `(red - blue) / (red + blue)` per pixel
pub fn burn_index(img: &RgbImage) -> Raster<f64> {
    normalized_difference(&img.red, &img.blue)
}

fn normalized_difference(a: &Raster<f64>, b: &Raster<f64>) -> Raster<f64> {
    let (rows, cols) = a.shape();
    let mut out = Raster::new(rows, cols);
    for row in 0..rows {
        for col in 0..cols {
            let va = unsafe { a.get_unchecked(row, col) };
            let vb = unsafe { b.get_unchecked(row, col) };
            unsafe { out.set_unchecked(row, col, (va - vb) / (va + vb + EPS)) };
        }
    }
    out
}

/// Growth of the water-covered image fraction between epochs.
///
/// Negative when water receded.
pub fn water_growth(pre: &RgbImage, post: &RgbImage, thresholds: &DetectorThresholds) -> f64 {
    let pre_frac = water_index(pre).fraction_where(|v| v > thresholds.water_detection);
    let post_frac = water_index(post).fraction_where(|v| v > thresholds.water_detection);
    post_frac - pre_frac
}

/// Fraction of pixels whose burn-index delta exceeds the threshold
pub fn burn_fraction(pre: &RgbImage, post: &RgbImage, thresholds: &DetectorThresholds) -> f64 {
    let pre_burn = burn_index(pre);
    let post_burn = burn_index(post);
    let (rows, cols) = pre_burn.shape();

    let mut burned = 0usize;
    for row in 0..rows {
        for col in 0..cols {
            let delta = unsafe { post_burn.get_unchecked(row, col) }
                - unsafe { pre_burn.get_unchecked(row, col) };
            if delta > thresholds.burn_detection {
                burned += 1;
            }
        }
    }
    burned as f64 / (rows * cols) as f64
}

/// Edge-density loss between epochs, floored at zero.
///
/// Collapse removes edges, so only a decrease signals damage.
pub fn structural_loss(
    pre: &RgbImage,
    post: &RgbImage,
    thresholds: &DetectorThresholds,
) -> Result<f64> {
    let pre_density = edge_density(&pre.grayscale(), thresholds.edge_magnitude)?;
    let post_density = edge_density(&post.grayscale(), thresholds.edge_magnitude)?;
    Ok((pre_density - post_density).max(0.0))
}

/// Classify the disaster type from before/after imagery.
///
/// First match wins: flood, then fire, then earthquake, else unknown.
pub fn detect_disaster_type(
    pre: &RgbImage,
    post: &RgbImage,
    thresholds: &DetectorThresholds,
) -> Result<DisasterType> {
    if water_growth(pre, post, thresholds) > thresholds.water_growth {
        return Ok(DisasterType::Flood);
    }
    if burn_fraction(pre, post, thresholds) > thresholds.burn_fraction {
        return Ok(DisasterType::Fire);
    }
    if structural_loss(pre, post, thresholds)? > thresholds.structural_loss {
        return Ok(DisasterType::Earthquake);
    }
    Ok(DisasterType::Unknown)
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

    #[test]
    fn test_water_index_of_green_scene() {
        let img = uniform_rgb(4, 4, 50.0, 150.0, 80.0);
        let wi = water_index(&img);
        assert_relative_eq!(wi.get(0, 0).unwrap(), 100.0 / 200.0, epsilon = 1e-4);
    }

    #[test]
    fn test_water_index_epsilon_guard() {
        let img = uniform_rgb(2, 2, 0.0, 0.0, 0.0);
        let v = water_index(&img).get(0, 0).unwrap();
        assert!(v.is_finite());
        assert_relative_eq!(v, 0.0);
    }

    #[test]
    fn test_flood_detected_on_water_growth() {
        let pre = uniform_rgb(8, 8, 120.0, 100.0, 80.0); // dry scene
        let post = uniform_rgb(8, 8, 40.0, 160.0, 150.0); // water index well over 0.3

        let t = DetectorThresholds::default();
        assert!(water_growth(&pre, &post, &t) > t.water_growth);
        assert_eq!(
            detect_disaster_type(&pre, &post, &t).unwrap(),
            DisasterType::Flood
        );
    }

    #[test]
    fn test_fire_detected_on_burn_signature() {
        let pre = uniform_rgb(8, 8, 90.0, 120.0, 90.0); // balanced scene
        let post = uniform_rgb(8, 8, 200.0, 60.0, 30.0); // strong red shift

        let t = DetectorThresholds::default();
        assert!(water_growth(&pre, &post, &t) <= t.water_growth);
        assert!(burn_fraction(&pre, &post, &t) > t.burn_fraction);
        assert_eq!(
            detect_disaster_type(&pre, &post, &t).unwrap(),
            DisasterType::Fire
        );
    }

    #[test]
    fn test_unchanged_scene_is_unknown() {
        let pre = uniform_rgb(8, 8, 100.0, 110.0, 90.0);
        let post = pre.clone();
        assert_eq!(
            detect_disaster_type(&pre, &post, &DetectorThresholds::default()).unwrap(),
            DisasterType::Unknown
        );
    }
}
