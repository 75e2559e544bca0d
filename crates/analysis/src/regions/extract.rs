//! Region extraction: turn a binary mask into measured regions.

use terrashift_core::{Algorithm, Error, Raster};

use crate::detection::BoundingBox;
use crate::regions::{label_components, trace_region_boundary};

/// A connected region measured from a binary mask
#[derive(Debug, Clone)]
pub struct Region {
    /// Member pixels as (row, col), row-major
    pub pixels: Vec<(usize, usize)>,
    pub pixel_count: usize,
    pub bbox: BoundingBox,
    /// Pixel count scaled by the caller's area ratio
    pub area: f64,
    /// Closed boundary ring in pixel (x, y) coordinates
    pub polygon: Vec<(usize, usize)>,
}

#[derive(Debug, Clone)]
pub struct RegionExtractorParams {
    /// Regions with `area` below this are dropped
    pub min_area: f64,
    /// Area contributed by one pixel, in the caller's unit
    pub pixel_to_area_ratio: f64,
}

impl Default for RegionExtractorParams {
    fn default() -> Self {
        Self {
            min_area: 0.0,
            pixel_to_area_ratio: 1.0,
        }
    }
}

fn pixel_bbox(pixels: &[(usize, usize)]) -> BoundingBox {
    let mut min_r = usize::MAX;
    let mut min_c = usize::MAX;
    let mut max_r = 0;
    let mut max_c = 0;
    for &(r, c) in pixels {
        min_r = min_r.min(r);
        min_c = min_c.min(c);
        max_r = max_r.max(r);
        max_c = max_c.max(c);
    }
    BoundingBox::new(min_c, min_r, max_c - min_c + 1, max_r - min_r + 1)
}

/// Extract measured regions from a binary mask (non-zero = set).
///
/// Regions come back ordered by first pixel appearance in row-major scan
/// order; regions smaller than `min_area` are silently dropped.
pub fn extract_regions(mask: &Raster<u8>, params: &RegionExtractorParams) -> Vec<Region> {
    label_components(mask)
        .into_iter()
        .filter_map(|pixels| {
            let area = pixels.len() as f64 * params.pixel_to_area_ratio;
            if area < params.min_area {
                return None;
            }
            let bbox = pixel_bbox(&pixels);
            let polygon = trace_region_boundary(&pixels, &bbox);
            Some(Region {
                pixel_count: pixels.len(),
                pixels,
                bbox,
                area,
                polygon,
            })
        })
        .collect()
}

/// [`Algorithm`] wrapper around [`extract_regions`]
pub struct RegionExtraction;

impl Algorithm for RegionExtraction {
    type Input = Raster<u8>;
    type Output = Vec<Region>;
    type Params = RegionExtractorParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "region_extraction"
    }

    fn description(&self) -> &'static str {
        "Extract connected regions from a binary mask with area filtering"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output, Error> {
        if params.pixel_to_area_ratio <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "pixel_to_area_ratio",
                value: params.pixel_to_area_ratio.to_string(),
                reason: "must be positive".into(),
            });
        }
        Ok(extract_regions(&input, &params))
    }
}
