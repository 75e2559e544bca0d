//! # Terrashift Analysis
//!
//! Post-inference analytics for land-cover change and disaster assessment.
//!
//! Turns pixel-level segmentation grids (or raw before/after RGB imagery)
//! into structured, geolocated change events: typed, severity-scored,
//! spatially clustered, and exportable as GeoJSON/KML.
//!
//! ## Module map
//!
//! - **regions**: connected-component extraction and boundary tracing
//! - **change**: change maps, transition classification, severity, statistics
//! - **disaster**: spectral-proxy indices, damage zones, priority rasters
//! - **cluster**: density grouping of nearby detections
//! - **export**: GeoJSON and KML serialization

pub mod change;
pub mod cluster;
pub mod detection;
pub mod disaster;
pub mod export;
pub mod regions;

pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::change::{
        analyze_changes, ChangeAnalysis, ChangeAnalyzerParams, ChangeDetection, ChangeType,
        LandCoverClass,
    };
    pub use crate::cluster::{cluster_detections, ClusterGroup, ClusterParams, GroupKind};
    pub use crate::detection::{BoundingBox, Detection, Severity};
    pub use crate::disaster::{
        analyze_disaster, detect_burn_zones, detect_collapse_zones, detect_flood_zones,
        detect_generic_zones, DamageAssessment, DamageZone, DamageZoneType, DetectorThresholds,
        DisasterAnalysis, DisasterAnalyzerParams, DisasterType, RgbImage, ZoneParams,
    };
    pub use crate::export::{GeoJsonExporter, KmlExporter};
    pub use terrashift_core::prelude::*;
}
