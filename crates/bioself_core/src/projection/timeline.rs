//! Chronological merge of dated entities.
//!
//! # Invariants
//! - Sorted by date descending; ties broken by entity id ascending.
//! - Date-only entities sort as midnight of that date.

use crate::model::BiologicalSelf;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Condition,
    Symptom,
    Imaging,
    Workout,
}

impl TimelineKind {
    pub const ALL: [TimelineKind; 4] = [
        Self::Condition,
        Self::Symptom,
        Self::Imaging,
        Self::Workout,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Condition => "condition",
            Self::Symptom => "symptom",
            Self::Imaging => "imaging",
            Self::Workout => "workout",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "condition" | "conditions" => Some(Self::Condition),
            "symptom" | "symptoms" => Some(Self::Symptom),
            "imaging" | "imaging_report" => Some(Self::Imaging),
            "workout" | "workouts" => Some(Self::Workout),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: TimelineKind,
    pub date: NaiveDateTime,
    pub title: String,
    pub subtitle: Option<String>,
}

/// Kind subset plus inclusive date bounds. Empty `kinds` means all kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineFilter {
    pub kinds: Vec<TimelineKind>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl TimelineFilter {
    fn accepts(&self, event: &TimelineEvent) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&event.kind) {
            return false;
        }
        let day = event.date.date();
        if self.start.is_some_and(|start| day < start) {
            return false;
        }
        !self.end.is_some_and(|end| day > end)
    }
}

pub fn get_timeline(snapshot: &BiologicalSelf) -> Vec<TimelineEvent> {
    let mut events = Vec::with_capacity(
        snapshot.conditions.len()
            + snapshot.symptoms.len()
            + snapshot.imaging_reports.len()
            + snapshot.whoop_workouts.len(),
    );

    events.extend(snapshot.conditions.iter().map(|c| TimelineEvent {
        id: c.id,
        kind: TimelineKind::Condition,
        date: at_midnight(c.diagnosed_date),
        title: c.name.clone(),
        subtitle: Some(format!("{} · {}", c.status.as_str(), c.severity.as_str())),
    }));
    events.extend(snapshot.symptoms.iter().map(|s| TimelineEvent {
        id: s.id,
        kind: TimelineKind::Symptom,
        date: at_midnight(s.onset_date),
        title: s.name.clone(),
        subtitle: Some(format!("severity {}/10", s.severity)),
    }));
    events.extend(snapshot.imaging_reports.iter().map(|r| TimelineEvent {
        id: r.id,
        kind: TimelineKind::Imaging,
        date: at_midnight(r.date),
        title: format!("{} {}", r.modality.label(), r.body_part),
        subtitle: (!r.impression.trim().is_empty()).then(|| r.impression.clone()),
    }));
    events.extend(snapshot.whoop_workouts.iter().map(|w| TimelineEvent {
        id: w.id,
        kind: TimelineKind::Workout,
        date: w.workout_start,
        title: w.activity_name.clone(),
        subtitle: Some(format!(
            "strain {:.1} · {:.0} min",
            w.activity_strain, w.duration_minutes
        )),
    }));

    events.sort_by(newest_first);
    events
}

pub fn get_timeline_filtered(
    snapshot: &BiologicalSelf,
    filter: &TimelineFilter,
) -> Vec<TimelineEvent> {
    get_timeline(snapshot)
        .into_iter()
        .filter(|event| filter.accepts(event))
        .collect()
}

fn newest_first(a: &TimelineEvent, b: &TimelineEvent) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id))
}

fn at_midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
