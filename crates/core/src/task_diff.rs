//! Task-update side effects as a diff.
//!
//! Editing a task invalidates queued requests. The update is modeled as
//! a diff between the old and new task producing purge operations that
//! the repository applies before writing the new task row, all in one
//! transaction.

use std::collections::HashSet;

/// The task fields whose edits invalidate queued requests.
#[derive(Debug, Clone, Copy)]
pub struct TaskFields<'a> {
    pub labels: &'a [String],
    pub annotators: &'a [String],
    pub data_filenames: &'a [String],
}

/// A purge of Pending annotation requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurgeOp {
    /// The data-file set changed: every Pending request for the task is
    /// stale.
    ByFile,
    /// An annotator was removed: purge that user's Pending requests.
    ByAnnotator(String),
    /// A label was removed: purge Pending requests carrying it.
    ByLabel(String),
}

/// Compute the purges a task edit requires.
///
/// A changed file set supersedes the narrower purges: everything is
/// stale anyway.
pub fn diff_tasks(old: TaskFields<'_>, new: TaskFields<'_>) -> Vec<PurgeOp> {
    let old_files: HashSet<&String> = old.data_filenames.iter().collect();
    let new_files: HashSet<&String> = new.data_filenames.iter().collect();
    if old_files != new_files {
        return vec![PurgeOp::ByFile];
    }

    let mut ops = Vec::new();

    let kept_annotators: HashSet<&String> = new.annotators.iter().collect();
    for annotator in old.annotators {
        if !kept_annotators.contains(annotator) {
            ops.push(PurgeOp::ByAnnotator(annotator.clone()));
        }
    }

    let kept_labels: HashSet<&String> = new.labels.iter().collect();
    for label in old.labels {
        if !kept_labels.contains(label) {
            ops.push(PurgeOp::ByLabel(label.clone()));
        }
    }

    ops
}
