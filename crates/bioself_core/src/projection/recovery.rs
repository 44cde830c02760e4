//! Rolling means of wearable cycle metrics.
//!
//! # Invariants
//! - The window is anchored at the most recent `cycle_start` in the
//!   snapshot and covers `(latest - window_days, latest]`.
//! - A cycle missing a metric contributes to neither the sum nor the
//!   sample count of that metric.

use crate::model::{BiologicalSelf, WhoopMetric};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricMean {
    /// `None` when no cycle in the window recorded this metric.
    pub mean: Option<f64>,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverySummary {
    pub window_days: u32,
    /// Most recent `cycle_start`; `None` when there are no cycles.
    pub anchor: Option<NaiveDateTime>,
    pub cycles_in_window: usize,
    pub metrics: BTreeMap<WhoopMetric, MetricMean>,
}

impl RecoverySummary {
    pub fn mean(&self, metric: WhoopMetric) -> Option<f64> {
        self.metrics.get(&metric).and_then(|m| m.mean)
    }
}

pub fn get_recovery_summary(snapshot: &BiologicalSelf, window_days: u32) -> RecoverySummary {
    let anchor = snapshot.whoop_cycles.iter().map(|c| c.cycle_start).max();
    let in_window: Vec<_> = match anchor {
        Some(latest) if window_days > 0 => {
            // A window reaching past the calendar range covers every cycle.
            let cutoff = latest.checked_sub_signed(Duration::days(i64::from(window_days)));
            snapshot
                .whoop_cycles
                .iter()
                .filter(|c| cutoff.map_or(true, |cutoff| c.cycle_start > cutoff))
                .filter(|c| c.cycle_start <= latest)
                .collect()
        }
        _ => Vec::new(),
    };

    let metrics = WhoopMetric::ALL
        .iter()
        .map(|&metric| {
            let values: Vec<f64> = in_window
                .iter()
                .filter_map(|cycle| metric.read(&cycle.metrics))
                .collect();
            let samples = values.len();
            let mean = (samples > 0).then(|| values.iter().sum::<f64>() / samples as f64);
            (metric, MetricMean { mean, samples })
        })
        .collect();

    RecoverySummary {
        window_days,
        anchor,
        cycles_in_window: in_window.len(),
        metrics,
    }
}
