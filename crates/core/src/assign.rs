//! Candidate-to-annotator assignment.
//!
//! Distributes a candidate stream across annotators so the load stays
//! balanced: each candidate goes to up to `max_per_datapoint` distinct
//! annotators, always preferring whoever currently has the fewest
//! assignments, skipping annotators blacklisted for that candidate and
//! annotators already at `max_per_annotator`.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Per-annotator queues in the annotator list's original order.
/// Assignment order within a queue is stream order.
pub type AssignmentResult<T> = Vec<(String, Vec<T>)>;

/// Assign candidates to annotators.
///
/// The heap is keyed by (current assignment count, insertion index), so
/// ties go to the annotator listed first. Blacklisted or full annotators
/// are pushed aside during a candidate's round and reinstated afterward,
/// which guarantees each annotator is considered at most once per
/// candidate.
pub fn assign<T: Clone>(
    candidates: &[T],
    annotators: &[String],
    max_per_annotator: usize,
    max_per_datapoint: usize,
    mut blacklisted: impl FnMut(&T, &str) -> bool,
) -> AssignmentResult<T> {
    let mut queues: Vec<Vec<T>> = vec![Vec::new(); annotators.len()];
    let mut heap: BinaryHeap<Reverse<(usize, usize)>> = (0..annotators.len())
        .map(|idx| Reverse((0, idx)))
        .collect();

    for candidate in candidates {
        // Annotators taken out of the heap during this candidate's
        // round; reinstated afterward so each is considered once.
        let mut aside = Vec::new();
        let mut assigned = 0;

        while assigned < max_per_datapoint {
            let Some(Reverse((count, idx))) = heap.pop() else {
                break;
            };
            // Heap is ordered by count, so everyone else is at least
            // this full: stop the round.
            if count >= max_per_annotator {
                aside.push(Reverse((count, idx)));
                break;
            }
            if blacklisted(candidate, &annotators[idx]) {
                aside.push(Reverse((count, idx)));
                continue;
            }
            queues[idx].push(candidate.clone());
            aside.push(Reverse((count + 1, idx)));
            assigned += 1;
        }

        for entry in aside {
            heap.push(entry);
        }
    }

    annotators
        .iter()
        .cloned()
        .zip(queues)
        .collect()
}
