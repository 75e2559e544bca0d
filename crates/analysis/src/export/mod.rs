//! Vector export of detections
//!
//! Turns detection lists into GeoJSON FeatureCollections and KML documents,
//! georeferencing pixel outlines through a bounds-based transform. Detections
//! without a traced polygon export their bounding-box quadrilateral.

mod geojson;
mod kml;

pub use geojson::{Feature, FeatureCollection, FeatureProperties, GeoJsonExporter, Geometry};
pub use kml::KmlExporter;

use terrashift_core::geo::{BoundsTransform, GeoBounds};

use crate::detection::Detection;

/// Closed lon-lat ring for a detection, from its polygon or bbox corners
pub(crate) fn geo_ring<D: Detection>(
    detection: &D,
    transform: &BoundsTransform,
) -> Vec<[f64; 2]> {
    let pixel_ring: Vec<(usize, usize)> = match detection.polygon() {
        Some(ring) if ring.len() >= 2 => ring.to_vec(),
        _ => detection.bbox().corner_ring(),
    };

    let mut ring: Vec<[f64; 2]> = pixel_ring
        .iter()
        .map(|&(x, y)| {
            let coord = transform.pixel_to_geo(x as f64, y as f64);
            [coord.longitude, coord.latitude]
        })
        .collect();

    if ring.first() != ring.last() {
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
    }
    ring
}

pub(crate) fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shared default bounds for exports without georeferencing
pub(crate) fn default_bounds() -> GeoBounds {
    GeoBounds {
        north: 1.0,
        south: 0.0,
        east: 1.0,
        west: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("water_increase"), "Water Increase");
        assert_eq!(title_case("flooded"), "Flooded");
    }
}
