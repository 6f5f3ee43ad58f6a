//! Annotation values, vote aggregation math, and context validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A user's judgement for one (entity, label).
///
/// The stored column additionally admits NULL (`NOT_ANNOTATED`) for
/// placeholder rows that mark a label's existence without carrying a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum AnnotationValue {
    Positive,
    Negative,
    Unsure,
}

impl AnnotationValue {
    /// The integer stored in the database: +1, -1, or 0.
    pub fn as_i32(self) -> i32 {
        match self {
            AnnotationValue::Positive => 1,
            AnnotationValue::Negative => -1,
            AnnotationValue::Unsure => 0,
        }
    }
}

impl From<AnnotationValue> for i32 {
    fn from(value: AnnotationValue) -> Self {
        value.as_i32()
    }
}

impl TryFrom<i32> for AnnotationValue {
    type Error = CoreError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AnnotationValue::Positive),
            -1 => Ok(AnnotationValue::Negative),
            0 => Ok(AnnotationValue::Unsure),
            other => Err(CoreError::Validation(format!(
                "value must be -1, 0, or 1, got {other}"
            ))),
        }
    }
}

/// Tie policy for the weighted majority vote when positive and negative
/// weight are equal. Positive wins by default for determinism.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    #[default]
    Positive,
    Negative,
}

impl TieBreak {
    pub fn decided_value(self) -> i32 {
        match self {
            TieBreak::Positive => 1,
            TieBreak::Negative => -1,
        }
    }
}

/// One weighted vote for the in-memory form of the majority vote.
#[derive(Debug, Clone, Copy)]
pub struct WeightedVote {
    pub value: i32,
    pub weight: f64,
}

/// Weighted majority vote over one entity's annotations.
///
/// Unsure (0) votes never contribute to the decision. Returns
/// `(decided_value, total_decisive_weight)`, or `None` when no decisive
/// votes exist. The SQL aggregation in `labelforge-db` mirrors this; the
/// in-memory form exists for tests and the exporter fallback path.
pub fn weighted_majority(votes: &[WeightedVote], tie_break: TieBreak) -> Option<(i32, f64)> {
    let mut positive = 0.0;
    let mut negative = 0.0;
    for vote in votes {
        match vote.value {
            1 => positive += vote.weight,
            -1 => negative += vote.weight,
            _ => {}
        }
    }
    let total = positive + negative;
    if total <= 0.0 {
        return None;
    }
    let decided = if positive > negative {
        1
    } else if negative > positive {
        -1
    } else {
        tie_break.decided_value()
    };
    Some((decided, total))
}

/// Metadata attached to an annotation's context blob.
///
/// `extra` keeps unknown keys intact so the blob stays opaque at the
/// storage edge while the known shape is enforced at the core boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Typed view of the context captured at annotation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationContext {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub meta: ContextMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_info: Option<serde_json::Value>,
}

impl AnnotationContext {
    /// Validate an incoming context blob. Callers cannot smuggle
    /// arbitrary shapes past this point: `text` must be a string and
    /// `meta` an object when present.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        if !value.is_object() {
            return Err(CoreError::Validation(
                "context must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("malformed context: {e}")))
    }
}
