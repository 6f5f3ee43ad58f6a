//! Candidate stream for a task: per-source ranked lists interleaved by
//! repeated weighted draw.
//!
//! Uncertainty-driven samples dominate but are reliably diluted with
//! pattern-matched positives and true random draws, so the classifier
//! never starves exploration. Default proportions are
//! RANDOM:1 / PATTERN:3 / UNCERTAINTY:12, renormalized over the sources
//! actually present for the task.

use std::collections::{HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::scoring::ScoreSource;

/// One scored datapoint. `(fname, line_number)` is the unique fingerprint
/// of the underlying line; the entity name is resolved from its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub fname: String,
    pub line_number: usize,
    pub entity: String,
    pub score: f64,
    pub source: ScoreSource,
    pub text: String,
    pub meta: serde_json::Value,
    /// Pattern tokens and matched spans for this line, shown to the
    /// annotator alongside the text. Carried whichever source drew the
    /// candidate.
    pub pattern_info: Option<serde_json::Value>,
}

impl Candidate {
    fn fingerprint(&self) -> (String, usize) {
        (self.fname.clone(), self.line_number)
    }
}

/// Interleave weight for a source before normalization.
pub fn proportion_for(source: ScoreSource) -> f64 {
    match source {
        ScoreSource::Random => 1.0,
        ScoreSource::Pattern => 3.0,
        ScoreSource::Uncertainty => 12.0,
    }
}

/// Sort candidates in descending score order. Stable, so equal scores
/// keep file order.
pub fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}

struct Source {
    weight: f64,
    queue: VecDeque<Candidate>,
}

/// Lazy merged stream over ranked per-source candidate lists.
///
/// Each `next()` draws a source with probability proportional to its
/// remaining weight and pops that source's head. An exhausted source
/// effectively has weight zero. Candidates whose fingerprint was already
/// emitted are skipped and the same source is tried again.
pub struct CandidateStream {
    sources: Vec<Source>,
    emitted: HashSet<(String, usize)>,
    rng: StdRng,
}

impl CandidateStream {
    /// Build from (weight, ranked candidates) pairs. Pass a seed for
    /// reproducible interleaving; `None` seeds from the OS.
    pub fn new(sources: Vec<(f64, Vec<Candidate>)>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            sources: sources
                .into_iter()
                .map(|(weight, candidates)| Source {
                    weight,
                    queue: candidates.into(),
                })
                .collect(),
            emitted: HashSet::new(),
            rng,
        }
    }

    /// Build with the standard proportions for each list's source.
    pub fn with_default_proportions(
        ranked: Vec<(ScoreSource, Vec<Candidate>)>,
        seed: Option<u64>,
    ) -> Self {
        let sources = ranked
            .into_iter()
            .map(|(source, candidates)| (proportion_for(source), candidates))
            .collect();
        Self::new(sources, seed)
    }

    fn draw_source(&mut self) -> Option<usize> {
        let total: f64 = self
            .sources
            .iter()
            .filter(|s| !s.queue.is_empty())
            .map(|s| s.weight)
            .sum();
        if total <= 0.0 {
            return None;
        }
        let mut draw = self.rng.random_range(0.0..total);
        for (idx, source) in self.sources.iter().enumerate() {
            if source.queue.is_empty() {
                continue;
            }
            if draw < source.weight {
                return Some(idx);
            }
            draw -= source.weight;
        }
        // Float underflow on the last active source.
        self.sources.iter().rposition(|s| !s.queue.is_empty())
    }

    fn pop_fresh(&mut self, idx: usize) -> Option<Candidate> {
        while let Some(candidate) = self.sources[idx].queue.pop_front() {
            if self.emitted.insert(candidate.fingerprint()) {
                return Some(candidate);
            }
        }
        None
    }
}

impl Iterator for CandidateStream {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            let idx = self.draw_source()?;
            if let Some(candidate) = self.pop_fresh(idx) {
                return Some(candidate);
            }
            // Source went stale during dedup; redraw over the rest.
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(fname: &str, line: usize, score: f64, source: ScoreSource) -> Candidate {
        Candidate {
            fname: fname.to_string(),
            line_number: line,
            entity: format!("{line}.com"),
            score,
            source,
            text: format!("line {line}"),
            meta: serde_json::Value::Null,
            pattern_info: None,
        }
    }

    fn list(fname: &str, n: usize, source: ScoreSource) -> Vec<Candidate> {
        (0..n).map(|i| candidate(fname, i, 0.5, source)).collect()
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let ranked = rank(vec![
            candidate("a", 0, 0.1, ScoreSource::Random),
            candidate("a", 1, 0.9, ScoreSource::Random),
            candidate("a", 2, 0.9, ScoreSource::Random),
            candidate("a", 3, 0.5, ScoreSource::Random),
        ]);
        let lines: Vec<usize> = ranked.iter().map(|c| c.line_number).collect();
        assert_eq!(lines, vec![1, 2, 3, 0]);
    }

    #[test]
    fn all_unique_candidates_are_emitted() {
        let stream = CandidateStream::new(
            vec![
                (0.8, list("a", 100, ScoreSource::Uncertainty)),
                (0.2, list("b", 100, ScoreSource::Random)),
            ],
            Some(1),
        );
        let emitted: Vec<Candidate> = stream.collect();
        assert_eq!(emitted.len(), 200);
    }

    #[test]
    fn duplicate_fingerprints_are_emitted_once() {
        // Both sources score the same file, so every line appears twice.
        let stream = CandidateStream::new(
            vec![
                (0.5, list("a", 50, ScoreSource::Pattern)),
                (0.5, list("a", 50, ScoreSource::Random)),
            ],
            Some(2),
        );
        let emitted: Vec<Candidate> = stream.collect();
        assert_eq!(emitted.len(), 50);
        let mut lines: Vec<usize> = emitted.iter().map(|c| c.line_number).collect();
        lines.sort_unstable();
        assert_eq!(lines, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_gives_identical_streams() {
        let build = || {
            CandidateStream::new(
                vec![
                    (0.25, list("a", 40, ScoreSource::Pattern)),
                    (0.75, list("b", 40, ScoreSource::Uncertainty)),
                ],
                Some(99),
            )
        };
        let first: Vec<(String, usize)> =
            build().map(|c| (c.fname, c.line_number)).collect();
        let second: Vec<(String, usize)> =
            build().map(|c| (c.fname, c.line_number)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn interleave_respects_proportions() {
        // Two sources at 0.8 / 0.2 with 1000 disjoint candidates each;
        // the first 500 emitted should be ~80% from the first source.
        let stream = CandidateStream::new(
            vec![
                (0.8, list("a", 1000, ScoreSource::Uncertainty)),
                (0.2, list("b", 1000, ScoreSource::Random)),
            ],
            Some(3),
        );
        let first_half: Vec<Candidate> = stream.take(500).collect();
        let n_first = first_half.iter().filter(|c| c.fname == "a").count();
        let proportion = n_first as f64 / 500.0;
        assert!(
            (proportion - 0.8).abs() < 0.1,
            "proportion {proportion} too far from 0.8"
        );
    }

    #[test]
    fn minority_source_share_matches_expectation_over_many_runs() {
        // Proportions [1, 3], disjoint sources of 100 each. Averaged over
        // 500 seeded runs, the share of minority-source items among the
        // first 20 emitted converges to 0.25.
        let mut total = 0usize;
        const RUNS: usize = 500;
        for seed in 0..RUNS as u64 {
            let stream = CandidateStream::new(
                vec![
                    (1.0, list("minority", 100, ScoreSource::Random)),
                    (3.0, list("majority", 100, ScoreSource::Pattern)),
                ],
                Some(seed),
            );
            total += stream
                .take(20)
                .filter(|c| c.fname == "minority")
                .count();
        }
        let mean = total as f64 / (RUNS as f64 * 20.0);
        assert!((mean - 0.25).abs() < 0.1, "mean share {mean} too far from 0.25");
    }

    #[test]
    fn exhausted_source_hands_over_to_the_rest() {
        let stream = CandidateStream::new(
            vec![
                (0.9, list("a", 5, ScoreSource::Uncertainty)),
                (0.1, list("b", 50, ScoreSource::Random)),
            ],
            Some(4),
        );
        let emitted: Vec<Candidate> = stream.collect();
        assert_eq!(emitted.len(), 55);
        // The tail must come from the surviving source.
        assert!(emitted[50..].iter().all(|c| c.fname == "b"));
    }

    #[test]
    fn default_proportions_follow_the_one_three_twelve_split() {
        assert_eq!(proportion_for(ScoreSource::Random), 1.0);
        assert_eq!(proportion_for(ScoreSource::Pattern), 3.0);
        assert_eq!(proportion_for(ScoreSource::Uncertainty), 12.0);
    }
}
