//! Phrase-pattern scoring.
//!
//! Given a set of positive-class phrases, a text's score is the summed
//! token length of a maximum non-overlapping set of phrase matches,
//! divided by the text's token count. Empty text scores 0.

use serde::Serialize;

use super::Scored;

/// A phrase match over the token sequence. `start..end` in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Match {
    start: usize,
    end: usize,
}

impl Match {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Matched-span explanation emitted alongside the score.
#[derive(Debug, Clone, Serialize)]
pub struct PatternInfo {
    pub tokens: Vec<String>,
    /// (start token, end token, matched text) triples.
    pub matches: Vec<(usize, usize, String)>,
}

/// Scores texts by phrase-match density.
pub struct PatternModel {
    phrases: Vec<Vec<String>>,
}

/// Lowercased alphanumeric tokens; everything else separates.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Select a maximum non-overlapping subset of matches.
///
/// Matches are sorted by (start, length); walking left to right, the
/// shorter of two adjacent candidates is accepted whenever it ends
/// before the next one starts, ties broken by earlier start.
fn maximize_non_overlapping(mut matches: Vec<Match>) -> Vec<Match> {
    if matches.is_empty() {
        return matches;
    }
    matches.sort_by_key(|m| (m.start, m.len()));

    let mut selected = Vec::new();
    let mut i = 0;
    let mut j = 1;
    while i < matches.len() - 1 && j < matches.len() {
        let left = matches[i];
        let right = matches[j];
        if left.len() <= right.len() {
            if left.end <= right.start {
                selected.push(left);
            }
            i = j;
        } else if left.end <= right.start {
            selected.push(left);
            i = j;
        }
        j += 1;
    }
    selected.push(matches[i]);
    selected.sort_by_key(|m| m.start);
    selected.dedup();
    selected
}

impl PatternModel {
    /// Build from positive-class phrases. Phrases that tokenize to
    /// nothing are dropped.
    pub fn new(phrases: Vec<String>) -> Self {
        let phrases = phrases
            .iter()
            .map(|p| tokenize(p))
            .filter(|tokens| !tokens.is_empty())
            .collect();
        Self { phrases }
    }

    fn find_matches(&self, tokens: &[String]) -> Vec<Match> {
        let mut matches = Vec::new();
        for phrase in &self.phrases {
            if phrase.len() > tokens.len() {
                continue;
            }
            for start in 0..=(tokens.len() - phrase.len()) {
                if tokens[start..start + phrase.len()] == phrase[..] {
                    matches.push(Match {
                        start,
                        end: start + phrase.len(),
                    });
                }
            }
        }
        matches
    }

    fn score_one(&self, text: &str) -> (f64, Vec<Match>, Vec<String>) {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return (0.0, Vec::new(), tokens);
        }
        let selected = maximize_non_overlapping(self.find_matches(&tokens));
        let matched_len: usize = selected.iter().map(Match::len).sum();
        let score = matched_len as f64 / tokens.len() as f64;
        (score, selected, tokens)
    }

    /// Score a batch of texts. Each result carries the tokens and the
    /// selected spans, so callers can show an annotator what matched.
    pub fn score(&self, texts: &[&str]) -> Vec<Scored> {
        texts
            .iter()
            .map(|text| {
                let (score, selected, tokens) = self.score_one(text);
                let matches = selected
                    .iter()
                    .map(|m| (m.start, m.end, tokens[m.start..m.end].join(" ")))
                    .collect();
                Scored {
                    score,
                    probs: None,
                    pattern_info: Some(PatternInfo { tokens, matches }),
                }
            })
            .collect()
    }
}
