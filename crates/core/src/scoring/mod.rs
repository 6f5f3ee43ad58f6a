//! Scoring models: a uniform interface producing one score per text.
//!
//! Higher means "more worth asking an annotator about". Three variants:
//! uniform random (exploration), pattern match density (cheap positives),
//! and classifier uncertainty (active learning). The request generator
//! polymorphizes over [`ScoringModel`] only.

pub mod pattern;
pub mod uncertainty;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub use pattern::PatternModel;
pub use uncertainty::UncertaintyModel;

/// Which model produced a score. Also keys the interleave proportions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Random,
    Pattern,
    Uncertainty,
}

/// One scored text.
#[derive(Debug, Clone, Serialize)]
pub struct Scored {
    pub score: f64,
    /// The cached probability vector, when the uncertainty model had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probs: Option<Vec<f64>>,
    /// Matched spans for explanation, when produced by the pattern model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_info: Option<pattern::PatternInfo>,
}

impl Scored {
    pub fn plain(score: f64) -> Self {
        Self {
            score,
            probs: None,
            pattern_info: None,
        }
    }
}

/// A scoring model variant. Tagged alternatives instead of trait objects:
/// the set is closed and the request generator matches on the source.
pub enum ScoringModel {
    Random,
    Pattern(PatternModel),
    Uncertainty(UncertaintyModel),
}

impl ScoringModel {
    pub fn source(&self) -> ScoreSource {
        match self {
            ScoringModel::Random => ScoreSource::Random,
            ScoringModel::Pattern(_) => ScoreSource::Pattern,
            ScoringModel::Uncertainty(_) => ScoreSource::Uncertainty,
        }
    }

    /// Whether repeated scoring of the same texts yields the same scores.
    pub fn is_finite(&self) -> bool {
        !matches!(self, ScoringModel::Random)
    }

    /// Score a batch of texts, one record per input.
    pub fn score<R: Rng>(&self, texts: &[&str], rng: &mut R) -> Vec<Scored> {
        match self {
            ScoringModel::Random => texts
                .iter()
                .map(|_| Scored::plain(rng.random_range(0.0..1.0)))
                .collect(),
            ScoringModel::Pattern(model) => model.score(texts),
            ScoringModel::Uncertainty(model) => model.score(texts),
        }
    }
}
