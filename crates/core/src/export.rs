//! Training-example merge: join aggregated labels with entity text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row of the weighted-majority aggregation for a label.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedVote {
    pub entity: String,
    pub value: i32,
    pub weight: f64,
}

/// One training record: `{"text": ..., "labels": {label: value}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub text: String,
    pub labels: BTreeMap<String, i32>,
}

/// Result of the merge, with the count of entities dropped for missing
/// text. Drops are logged and counted, never raised.
#[derive(Debug)]
pub struct MergeOutcome {
    pub examples: Vec<TrainingExample>,
    pub dropped: usize,
}

/// Resolve each aggregated entity's text through `lookup` and emit
/// training examples. Entities with no text are dropped; empty text is
/// allowed but discouraged.
pub fn merge_examples(
    label: &str,
    rows: &[AggregatedVote],
    lookup: impl Fn(&str) -> Option<String>,
) -> MergeOutcome {
    let mut examples = Vec::with_capacity(rows.len());
    let mut dropped = 0;
    let mut empty = 0;

    for row in rows {
        match lookup(&row.entity) {
            Some(text) => {
                if text.is_empty() {
                    empty += 1;
                }
                let mut labels = BTreeMap::new();
                labels.insert(label.to_string(), row.value);
                examples.push(TrainingExample { text, labels });
            }
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::warn!(label, dropped, "Entities dropped for missing text");
    }
    if empty > 0 {
        tracing::debug!(label, empty, "Examples exported with empty text");
    }

    MergeOutcome { examples, dropped }
}
