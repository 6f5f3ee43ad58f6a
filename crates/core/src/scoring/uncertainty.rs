//! Classifier-uncertainty scoring.
//!
//! Scores each text by the Shannon entropy of a trained classifier's
//! cached probability distribution for that text. Texts the classifier
//! has never seen score 0; they are counted, never fatal.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use sha2::{Digest, Sha256};

use super::Scored;

const ENTROPY_EPS: f64 = 1e-6;

/// Shannon entropy `-sum(p * ln(p + eps))` of a probability vector.
pub fn entropy(probs: &[f64]) -> f64 {
    -probs.iter().map(|p| p * (p + ENTROPY_EPS).ln()).sum::<f64>()
}

/// Cache key: SHA-256 hex of the trimmed text.
pub fn text_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Scores texts from a warmed cache of per-text probability vectors.
pub struct UncertaintyModel {
    cache: HashMap<String, Vec<f64>>,
    not_scored: AtomicUsize,
}

impl UncertaintyModel {
    /// Build from cached inference output: (text hash, probs) pairs,
    /// typically one classifier version's stored predictions.
    pub fn new(cache: HashMap<String, Vec<f64>>) -> Self {
        Self {
            cache,
            not_scored: AtomicUsize::new(0),
        }
    }

    /// Build from raw (text, probs) pairs, hashing the texts.
    pub fn from_texts(pairs: impl IntoIterator<Item = (String, Vec<f64>)>) -> Self {
        let cache = pairs
            .into_iter()
            .map(|(text, probs)| (text_key(&text), probs))
            .collect();
        Self::new(cache)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// How many texts scored 0 because they were missing from the cache.
    pub fn not_scored_count(&self) -> usize {
        self.not_scored.load(Ordering::Relaxed)
    }

    pub fn score(&self, texts: &[&str]) -> Vec<Scored> {
        texts
            .iter()
            .map(|text| match self.cache.get(&text_key(text)) {
                Some(probs) => Scored {
                    score: entropy(probs),
                    probs: Some(probs.clone()),
                    pattern_info: None,
                },
                None => {
                    self.not_scored.fetch_add(1, Ordering::Relaxed);
                    Scored::plain(0.0)
                }
            })
            .collect()
    }
}
