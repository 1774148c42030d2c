//! Cross-participant statistics
//!
//! Every row of one submission shares a timestamp, so grouping the full
//! store by timestamp yields one entry per participant.

use crate::model::PersistedResultRow;
use crate::scoring::{accuracy_percent, round_one_decimal};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

/// Format of the timestamp column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Totals for one participant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantStat {
    pub timestamp: String,
    pub correct: usize,
    pub total: usize,
    /// Percentage rounded to one decimal
    pub accuracy: f64,
}

/// Per-participant table plus summary figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantSummary {
    /// Most recent first
    pub participants: Vec<ParticipantStat>,
    pub participant_count: usize,
    /// Mean of the rounded per-participant accuracies; `None` for an empty store
    pub average_accuracy: Option<f64>,
    pub best_accuracy: Option<f64>,
}

/// Group stored rows by timestamp and summarize
pub fn aggregate(rows: &[PersistedResultRow]) -> ParticipantSummary {
    let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for row in rows {
        let entry = groups.entry(row.timestamp.as_str()).or_insert((0, 0));
        if row.row.is_correct {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    let mut participants: Vec<ParticipantStat> = groups
        .into_iter()
        .map(|(timestamp, (correct, total))| ParticipantStat {
            timestamp: timestamp.to_string(),
            correct,
            total,
            accuracy: round_one_decimal(accuracy_percent(correct, total)),
        })
        .collect();

    participants.sort_by(|a, b| {
        recency_key(&b.timestamp)
            .cmp(&recency_key(&a.timestamp))
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });

    let participant_count = participants.len();
    let (average_accuracy, best_accuracy) = if participant_count == 0 {
        (None, None)
    } else {
        let sum: f64 = participants.iter().map(|p| p.accuracy).sum();
        let best = participants
            .iter()
            .map(|p| p.accuracy)
            .fold(f64::MIN, f64::max);
        (
            Some(round_one_decimal(sum / participant_count as f64)),
            Some(best),
        )
    };

    ParticipantSummary {
        participants,
        participant_count,
        average_accuracy,
        best_accuracy,
    }
}

fn recency_key(timestamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()
}
