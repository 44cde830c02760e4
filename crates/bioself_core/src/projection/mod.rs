//! Read-only projections over a store snapshot.
//!
//! # Responsibility
//! - Derive dashboard, timeline and recovery views from one snapshot.
//!
//! # Invariants
//! - Projections never mutate and never persist.
//! - Output depends only on the snapshot (no wall clock), so the same
//!   snapshot always yields the same view.

mod dashboard;
mod recovery;
mod timeline;

pub use dashboard::{get_dashboard, Dashboard, EntityCounts, LatestVitals, RECENT_SYMPTOM_LIMIT};
pub use recovery::{get_recovery_summary, MetricMean, RecoverySummary};
pub use timeline::{get_timeline, get_timeline_filtered, TimelineEvent, TimelineFilter, TimelineKind};

use crate::model::{BiologicalSelf, Condition};

/// Conditions whose status is active or chronic, in insertion order.
pub fn get_active_conditions(snapshot: &BiologicalSelf) -> Vec<&Condition> {
    snapshot
        .conditions
        .iter()
        .filter(|condition| condition.status.is_current())
        .collect()
}
