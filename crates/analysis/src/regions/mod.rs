//! Region machinery: connected-component labeling of binary masks,
//! boundary tracing, and extraction of measured regions.

mod boundary;
mod extract;
mod label;

pub use boundary::trace_region_boundary;
pub use extract::{extract_regions, Region, RegionExtraction, RegionExtractorParams};
pub use label::label_components;

pub(crate) use label::UnionFind;
