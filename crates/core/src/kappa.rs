//! Inter-annotator agreement: pairwise Cohen's kappa.
//!
//! For each unordered pair of users, agreement is computed over the
//! entities both annotated, after dropping every pair where either user
//! voted Unsure (0). The diagonal is 1 by definition; pairs with no
//! usable overlap are NaN.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::DbId;

/// Deep-link descriptor for one off-diagonal cell. The UI collaborator
/// resolves this to a side-by-side comparison view.
#[derive(Debug, Clone, Serialize)]
pub struct KappaLink {
    pub task_id: Option<DbId>,
    pub label: String,
    pub users: (String, String),
}

/// Symmetric agreement matrix keyed by username, sorted on both axes.
#[derive(Debug, Clone, Serialize)]
pub struct KappaMatrix {
    pub label: String,
    pub usernames: Vec<String>,
    /// `values[i][j]` is the kappa between `usernames[i]` and
    /// `usernames[j]`. NaN serializes as null.
    pub values: Vec<Vec<f64>>,
    pub links: Vec<KappaLink>,
}

/// Cohen's kappa over two aligned vote sequences in {-1, +1}.
///
/// Degenerate case: when chance agreement is 1 (both raters used a
/// single, identical category), kappa is 1 for perfect observed
/// agreement and 0 otherwise.
pub fn cohen_kappa(a: &[i32], b: &[i32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len();
    if n == 0 {
        return f64::NAN;
    }
    let nf = n as f64;
    let observed = a.iter().zip(b).filter(|(x, y)| x == y).count() as f64 / nf;

    let mut expected = 0.0;
    for category in [-1, 1] {
        let pa = a.iter().filter(|v| **v == category).count() as f64 / nf;
        let pb = b.iter().filter(|v| **v == category).count() as f64 / nf;
        expected += pa * pb;
    }

    let denom = 1.0 - expected;
    if denom.abs() < f64::EPSILON {
        if (observed - 1.0).abs() < f64::EPSILON {
            1.0
        } else {
            0.0
        }
    } else {
        (observed - expected) / denom
    }
}

/// Restrict two users' votes to their shared entities, dropping pairs
/// where either voted 0. Returns aligned vote vectors.
fn overlapping_votes(
    a: &BTreeMap<String, i32>,
    b: &BTreeMap<String, i32>,
) -> (Vec<i32>, Vec<i32>) {
    let mut votes_a = Vec::new();
    let mut votes_b = Vec::new();
    for (entity, &va) in a {
        if let Some(&vb) = b.get(entity) {
            if va != 0 && vb != 0 {
                votes_a.push(va);
                votes_b.push(vb);
            }
        }
    }
    (votes_a, votes_b)
}

/// Build the full matrix from each user's (entity -> value) votes.
pub fn compute_matrix(
    label: &str,
    task_id: Option<DbId>,
    votes_by_user: &BTreeMap<String, BTreeMap<String, i32>>,
) -> KappaMatrix {
    let usernames: Vec<String> = votes_by_user.keys().cloned().collect();
    let n = usernames.len();
    let mut values = vec![vec![f64::NAN; n]; n];
    let mut links = Vec::new();

    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let (votes_a, votes_b) = overlapping_votes(
                &votes_by_user[&usernames[i]],
                &votes_by_user[&usernames[j]],
            );
            let kappa = cohen_kappa(&votes_a, &votes_b);
            values[i][j] = kappa;
            values[j][i] = kappa;
            links.push(KappaLink {
                task_id,
                label: label.to_string(),
                users: (usernames[i].clone(), usernames[j].clone()),
            });
        }
    }

    KappaMatrix {
        label: label.to_string(),
        usernames,
        values,
        links,
    }
}
