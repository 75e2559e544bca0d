//! GeoJSON export

use chrono::Utc;
use serde::Serialize;
use terrashift_core::geo::{BoundsTransform, GeoBounds};

use crate::detection::{BoundingBox, Detection, Severity};
use crate::export::{default_bounds, geo_ring};

/// Polygon geometry with one closed lon-lat outer ring
#[derive(Debug, Clone, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureProperties {
    pub id: String,
    pub change_type: &'static str,
    pub confidence: f64,
    pub severity: Severity,
    pub area: f64,
    pub detection_timestamp: String,
    pub bbox: BoundingBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_structures: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionMetadata {
    pub generated: String,
    pub coordinate_system: String,
    /// (rows, cols) of the analyzed imagery
    pub image_shape: (usize, usize),
    pub bounds: GeoBounds,
    pub feature_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub metadata: CollectionMetadata,
    pub features: Vec<Feature>,
}

/// Builds GeoJSON FeatureCollections from detection lists
#[derive(Debug, Clone)]
pub struct GeoJsonExporter {
    pub bounds: GeoBounds,
    pub coordinate_system: String,
}

impl Default for GeoJsonExporter {
    fn default() -> Self {
        Self {
            bounds: default_bounds(),
            coordinate_system: "WGS84".to_string(),
        }
    }
}

impl GeoJsonExporter {
    pub fn new(bounds: GeoBounds) -> Self {
        Self {
            bounds,
            ..Default::default()
        }
    }

    /// Convert detections to a FeatureCollection.
    ///
    /// `image_shape` is (rows, cols) of the analyzed imagery; feature ids
    /// are `change_{index}` in input order.
    pub fn export<D: Detection>(&self, detections: &[D], image_shape: (usize, usize)) -> FeatureCollection {
        let transform = BoundsTransform::new(self.bounds, image_shape.0, image_shape.1);
        let timestamp = Utc::now().to_rfc3339();

        let features: Vec<Feature> = detections
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let id = format!("change_{i}");
                Feature {
                    kind: "Feature",
                    id: id.clone(),
                    geometry: Geometry {
                        kind: "Polygon",
                        coordinates: vec![geo_ring(d, &transform)],
                    },
                    properties: FeatureProperties {
                        id,
                        change_type: d.type_name(),
                        confidence: d.confidence(),
                        severity: d.severity(),
                        area: d.area(),
                        detection_timestamp: timestamp.clone(),
                        bbox: d.bbox(),
                        affected_structures: d.affected_structures(),
                    },
                }
            })
            .collect();

        FeatureCollection {
            kind: "FeatureCollection",
            metadata: CollectionMetadata {
                generated: timestamp,
                coordinate_system: self.coordinate_system.clone(),
                image_shape,
                bounds: self.bounds,
                feature_count: features.len(),
            },
            features,
        }
    }
}
