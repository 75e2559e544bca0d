//! Disaster impact analysis over raw before/after imagery
//!
//! The raw-imagery path: spectral-proxy indices classify the disaster type,
//! per-type finders build damage masks and extract zones, and the zones feed
//! an overall assessment plus emergency-response priority rasters.

mod analyzer;
mod assessment;
mod edge;
mod indices;
mod mask;
mod priority;
mod zones;

pub use analyzer::{analyze_disaster, DisasterAnalysis, DisasterAnalyzerParams};
pub use assessment::{assess_overall_damage, DamageAssessment, ZoneTypeTotals};
pub use edge::{edge_density, edge_mask, sobel_magnitude};
pub use indices::{
    burn_fraction, burn_index, detect_disaster_type, structural_loss, water_growth, water_index,
    DetectorThresholds, DisasterType,
};
pub use mask::{binary_closing, binary_dilate, binary_erode};
pub use priority::{evacuation_priority_map, relief_access_map};
pub use zones::{
    detect_burn_zones, detect_collapse_zones, detect_flood_zones, detect_generic_zones,
    DamageZone, DamageZoneType, ZoneParams,
};

use terrashift_core::{Error, Raster, Result};

/// Three-band RGB image as separate float rasters.
///
/// Band values are expected in the 0..255 range.
#[derive(Debug, Clone)]
pub struct RgbImage {
    pub red: Raster<f64>,
    pub green: Raster<f64>,
    pub blue: Raster<f64>,
}

impl RgbImage {
    /// Bundle three bands, checking they agree in shape
    pub fn new(red: Raster<f64>, green: Raster<f64>, blue: Raster<f64>) -> Result<Self> {
        let shape = red.shape();
        for band in [&green, &blue] {
            if band.shape() != shape {
                return Err(Error::shape_mismatch(shape, band.shape()));
            }
        }
        Ok(Self { red, green, blue })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.red.shape()
    }

    /// Per-pixel mean of the three bands
    pub fn brightness(&self) -> Raster<f64> {
        let (rows, cols) = self.shape();
        let mut out = Raster::new(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                let r = unsafe { self.red.get_unchecked(row, col) };
                let g = unsafe { self.green.get_unchecked(row, col) };
                let b = unsafe { self.blue.get_unchecked(row, col) };
                unsafe { out.set_unchecked(row, col, (r + g + b) / 3.0) };
            }
        }
        out
    }

    /// Luminance-weighted grayscale
    pub fn grayscale(&self) -> Raster<f64> {
        let (rows, cols) = self.shape();
        let mut out = Raster::new(rows, cols);
        for row in 0..rows {
            for col in 0..cols {
                let r = unsafe { self.red.get_unchecked(row, col) };
                let g = unsafe { self.green.get_unchecked(row, col) };
                let b = unsafe { self.blue.get_unchecked(row, col) };
                unsafe { out.set_unchecked(row, col, 0.299 * r + 0.587 * g + 0.114 * b) };
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rgb_shape_check() {
        let band = Raster::filled(4, 4, 0.0);
        let short: Raster<f64> = Raster::new(4, 3);
        assert!(RgbImage::new(band.clone(), band.clone(), short).is_err());
    }

    #[test]
    fn test_brightness_is_band_mean() {
        let img = RgbImage::new(
            Raster::filled(2, 2, 30.0),
            Raster::filled(2, 2, 60.0),
            Raster::filled(2, 2, 90.0),
        )
        .unwrap();
        assert_relative_eq!(img.brightness().get(0, 0).unwrap(), 60.0);
    }

    #[test]
    fn test_grayscale_weights_sum_to_one() {
        let img = RgbImage::new(
            Raster::filled(2, 2, 100.0),
            Raster::filled(2, 2, 100.0),
            Raster::filled(2, 2, 100.0),
        )
        .unwrap();
        assert_relative_eq!(img.grayscale().get(1, 1).unwrap(), 100.0, epsilon = 1e-9);
    }
}
