//! Land-cover change analysis
//!
//! Pipeline: change map → connected regions → per-region transition
//! classification, confidence and severity → detection list → statistics.

mod analyzer;
mod change_map;
mod severity;
mod statistics;
mod transition;

pub use analyzer::{
    analyze_changes, analyze_changes_batch, summary_report, ChangeAnalysis, ChangeAnalyzerParams,
    ChangeDetection, PriorityAlert, SummaryReport,
};
pub use change_map::{change_mask, transition_map, ChangeMapBuilder};
pub use severity::score_severity;
pub use statistics::{
    calculate_statistics, ChangeStatistics, ConfidenceSummary, TypeBreakdown,
};
pub use transition::{
    classify_region, estimate_confidence, transition_rule, ChangeType, LandCoverClass,
};
