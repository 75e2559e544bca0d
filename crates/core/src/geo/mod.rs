//! Geographic types and the pixel-to-geographic transform
//!
//! Terrashift georeferences imagery through a plain bounding box rather than
//! an affine transform: pixel positions are linearly interpolated across the
//! box (an equirectangular approximation). This is only acceptable over small
//! extents; true geodetic projection is explicitly out of scope.

use serde::{Deserialize, Serialize};

/// Geographic bounding box in decimal degrees.
///
/// Invariants `north > south` and `east > west` are the caller's
/// responsibility and are not defensively checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Latitude span in degrees
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees
    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    /// Center of the box
    pub fn center(&self) -> GeoCoordinate {
        GeoCoordinate {
            latitude: (self.north + self.south) / 2.0,
            longitude: (self.east + self.west) / 2.0,
        }
    }
}

/// A geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Linear pixel-to-geographic transform over a bounding box.
///
/// Maps pixel `(x, y)` of a `width`x`height` image to `(lat, lon)`:
/// ```text
/// lon = west  + (x / width)        * (east - west)
/// lat = south + (1 - y / height)   * (north - south)
/// ```
/// The vertical flip accounts for pixel origin top-left vs geographic origin
/// bottom-left: pixel (0, 0) maps to the north-west corner.
#[derive(Debug, Clone, Copy)]
pub struct BoundsTransform {
    bounds: GeoBounds,
    width: f64,
    height: f64,
}

impl BoundsTransform {
    /// Create a transform for an image of `(height, width)` pixels over `bounds`
    pub fn new(bounds: GeoBounds, height: usize, width: usize) -> Self {
        Self {
            bounds,
            width: width as f64,
            height: height as f64,
        }
    }

    /// The bounds this transform interpolates over
    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    /// Convert pixel coordinates to geographic coordinates
    pub fn pixel_to_geo(&self, x: f64, y: f64) -> GeoCoordinate {
        let norm_x = x / self.width;
        let norm_y = 1.0 - y / self.height;

        GeoCoordinate {
            latitude: self.bounds.south + norm_y * self.bounds.lat_span(),
            longitude: self.bounds.west + norm_x * self.bounds.lon_span(),
        }
    }

    /// Convert geographic coordinates back to fractional pixel coordinates.
    ///
    /// Exact inverse of [`pixel_to_geo`](Self::pixel_to_geo); degenerate
    /// (zero-span) bounds yield NaN rather than raising.
    pub fn geo_to_pixel(&self, coord: GeoCoordinate) -> (f64, f64) {
        let lat_span = self.bounds.lat_span();
        let lon_span = self.bounds.lon_span();

        if lat_span.abs() < 1e-12 || lon_span.abs() < 1e-12 {
            return (f64::NAN, f64::NAN);
        }

        let norm_x = (coord.longitude - self.bounds.west) / lon_span;
        let norm_y = (coord.latitude - self.bounds.south) / lat_span;

        (norm_x * self.width, (1.0 - norm_y) * self.height)
    }
}
