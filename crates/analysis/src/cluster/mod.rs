//! Spatial clustering of detections
//!
//! Density grouping of detection centroids: two detections belong to the
//! same group when a chain of detections connects them with hops no longer
//! than the eps radius. With a minimum cluster size of one there is no
//! noise class; a detection reachable from nothing becomes its own group.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::detection::{Detection, Severity};
use crate::regions::UnionFind;

#[derive(Debug, Clone)]
pub struct ClusterParams {
    /// Grouping radius in meters
    pub max_distance_meters: f64,
    /// Ground sample distance: meters covered by one pixel edge
    pub ground_sample_distance: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            max_distance_meters: 500.0,
            ground_sample_distance: 10.0,
        }
    }
}

/// Whether a group holds one detection or several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Individual,
    Cluster,
}

/// One group of spatially related detections
#[derive(Debug, Clone, Serialize)]
pub struct ClusterGroup {
    pub kind: GroupKind,
    /// Indices into the input detection slice, ascending
    pub members: Vec<usize>,
    pub count: usize,
    /// Most frequent member type; ties resolve to the lexicographically
    /// smallest name
    pub dominant_type: &'static str,
    pub max_severity: Severity,
    /// Sum of member areas, in the producer's unit
    pub total_area: f64,
    pub avg_confidence: f64,
}

/// Group detections whose centroids lie within eps of a chain of others.
///
/// `eps = max_distance_meters / ground_sample_distance` pixels. Groups come
/// back ordered by their first member's index and members ascend within a
/// group, so clustering the same input twice gives identical output.
pub fn cluster_detections<D: Detection>(detections: &[D], params: &ClusterParams) -> Vec<ClusterGroup> {
    if detections.is_empty() {
        return Vec::new();
    }

    let eps = params.max_distance_meters / params.ground_sample_distance;
    let eps_sq = eps * eps;
    let centers: Vec<(f64, f64)> = detections.iter().map(|d| d.bbox().center()).collect();

    let mut uf = UnionFind::new(detections.len());
    for i in 0..centers.len() {
        for j in (i + 1)..centers.len() {
            let dx = centers[i].0 - centers[j].0;
            let dy = centers[i].1 - centers[j].1;
            if dx * dx + dy * dy <= eps_sq {
                uf.union(i, j);
            }
        }
    }

    // Collect members per root, ordered by first appearance
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of_root: BTreeMap<usize, usize> = BTreeMap::new();
    for i in 0..detections.len() {
        let root = uf.find(i);
        let idx = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[idx].push(i);
    }

    groups
        .into_iter()
        .map(|members| summarize_group(detections, members))
        .collect()
}

fn summarize_group<D: Detection>(detections: &[D], members: Vec<usize>) -> ClusterGroup {
    let mut type_counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut max_severity = Severity::Minor;
    let mut total_area = 0.0;
    let mut confidence_sum = 0.0;

    for &i in &members {
        let d = &detections[i];
        *type_counts.entry(d.type_name()).or_insert(0) += 1;
        max_severity = max_severity.max(d.severity());
        total_area += d.area();
        confidence_sum += d.confidence();
    }

    // BTreeMap iterates in name order; requiring a strictly greater count
    // lets the lexicographically smallest name win ties
    let mut dominant_type = "unknown";
    let mut dominant_count = 0;
    for (&name, &count) in &type_counts {
        if count > dominant_count {
            dominant_type = name;
            dominant_count = count;
        }
    }

    let count = members.len();
    ClusterGroup {
        kind: if count == 1 {
            GroupKind::Individual
        } else {
            GroupKind::Cluster
        },
        count,
        dominant_type,
        max_severity,
        total_area,
        avg_confidence: confidence_sum / count as f64,
        members,
    }
}
