//! Shared detection vocabulary: severity tiers, bounding boxes and the
//! read-only surface every detection exposes to downstream stages.

use serde::Serialize;

/// Ordered severity tier on the canonical four-level scale.
///
/// Two vocabularies feed into this scale: the change-analysis path scores
/// low/medium/high/critical and the damage-zone path scores
/// minor/moderate/severe/catastrophic. They map 1:1 (low→minor, …,
/// critical→catastrophic); the canonical serialized labels are the
/// minor/moderate/severe/catastrophic set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
    Catastrophic,
}

impl Severity {
    /// Canonical serialized label
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Catastrophic => "catastrophic",
        }
    }

    /// All tiers in ascending order
    pub const ALL: [Severity; 4] = [
        Severity::Minor,
        Severity::Moderate,
        Severity::Severe,
        Severity::Catastrophic,
    ];

    /// Evacuation-priority raster fill value for this tier
    pub fn priority_fill(&self) -> u8 {
        match self {
            Severity::Catastrophic => 255,
            Severity::Severe => 200,
            Severity::Moderate => 150,
            Severity::Minor => 100,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned pixel bounding box (x, y = top-left corner)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl BoundingBox {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point as fractional pixel coordinates (x, y)
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Corner ring as a closed quadrilateral (first == last), pixel (x, y)
    pub fn corner_ring(&self) -> Vec<(usize, usize)> {
        vec![
            (self.x, self.y),
            (self.x + self.width, self.y),
            (self.x + self.width, self.y + self.height),
            (self.x, self.y + self.height),
            (self.x, self.y),
        ]
    }
}

/// Common read-only surface of a detection.
///
/// Implemented by [`crate::change::ChangeDetection`] and
/// [`crate::disaster::DamageZone`]; the clusterer and both exporters are
/// generic over this trait. Area units depend on the producer (hectares for
/// change detections, square meters for damage zones).
pub trait Detection {
    /// Stable type label ("deforestation", "flooded", …)
    fn type_name(&self) -> &'static str;

    /// Confidence in [0, 1]
    fn confidence(&self) -> f64;

    /// Severity on the canonical scale
    fn severity(&self) -> Severity;

    /// Area in the producer's unit
    fn area(&self) -> f64;

    /// Pixel bounding box
    fn bbox(&self) -> BoundingBox;

    /// Closed polygon outline in pixel (x, y) coordinates, when traced
    fn polygon(&self) -> Option<&[(usize, usize)]>;

    /// Estimated affected-structure count, when the detector computes one
    fn affected_structures(&self) -> Option<u32> {
        None
    }
}
