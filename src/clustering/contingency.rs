//! Co-occurrence counts and information-theoretic summaries of two labelings.

use crate::utils::AssocError;
use std::collections::{BTreeMap, HashMap};

/// Sparse (class, cluster) co-occurrence counts.
///
/// `classes` and `clusters` hold the distinct labels in sorted order; `cells`
/// holds one `(class_idx, cluster_idx, count)` entry per non-zero cell, sorted
/// by class then cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyMatrix<T> {
    pub classes: Vec<T>,
    pub clusters: Vec<T>,
    pub cells: Vec<(usize, usize, u64)>,
}

impl<T> ContingencyMatrix<T> {
    pub fn total(&self) -> u64 {
        self.cells.iter().map(|&(_, _, count)| count).sum()
    }
}

/// The entropy quintuple of a pair of labelings, in nats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entropies {
    pub joint: f64,
    pub true_given_pred: f64,
    pub pred_given_true: f64,
    pub true_marginal: f64,
    pub pred_marginal: f64,
}

fn check_lengths<T>(labels_true: &[T], labels_pred: &[T]) -> Result<(), AssocError> {
    if labels_true.len() != labels_pred.len() {
        return Err(AssocError::LengthMismatch {
            true_len: labels_true.len(),
            pred_len: labels_pred.len(),
        });
    }
    Ok(())
}

fn label_index<T: Ord + Clone>(labels: &[T]) -> (Vec<T>, BTreeMap<&T, usize>) {
    let mut index: BTreeMap<&T, usize> = labels.iter().map(|l| (l, 0)).collect();
    for (i, slot) in index.values_mut().enumerate() {
        *slot = i;
    }
    let distinct = index.keys().map(|&l| l.clone()).collect();
    (distinct, index)
}

pub fn contingency_matrix<T: Ord + Clone>(
    labels_true: &[T],
    labels_pred: &[T],
) -> Result<ContingencyMatrix<T>, AssocError> {
    check_lengths(labels_true, labels_pred)?;
    let (classes, class_index) = label_index(labels_true);
    let (clusters, cluster_index) = label_index(labels_pred);

    let mut counts: HashMap<(usize, usize), u64> = HashMap::new();
    for (t, p) in labels_true.iter().zip(labels_pred) {
        *counts
            .entry((class_index[t], cluster_index[p]))
            .or_insert(0) += 1;
    }
    let mut cells = counts
        .into_iter()
        .map(|((row, col), count)| (row, col, count))
        .collect::<Vec<_>>();
    cells.sort_unstable();

    Ok(ContingencyMatrix {
        classes,
        clusters,
        cells,
    })
}

fn entropy_of_counts(counts: impl IntoIterator<Item = u64>) -> f64 {
    let counts = counts.into_iter().filter(|&c| c > 0).collect::<Vec<_>>();
    if counts.len() <= 1 {
        return 0.0;
    }
    let total = counts.iter().sum::<u64>() as f64;
    let ln_total = total.ln();
    -counts
        .iter()
        .map(|&c| {
            let c = c as f64;
            (c / total) * (c.ln() - ln_total)
        })
        .sum::<f64>()
}

/// Shannon entropy (natural log) of a labeling.
///
/// An empty labeling has entropy 1.0 and a single-class labeling 0.0.
pub fn entropy<T: Ord>(labels: &[T]) -> f64 {
    if labels.is_empty() {
        return 1.0;
    }
    let mut counts: BTreeMap<&T, u64> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    entropy_of_counts(counts.into_values())
}

/// Joint, conditional and marginal entropies of two labelings of the same
/// items.
pub fn conditional_entropies<T: Ord + Clone>(
    labels_true: &[T],
    labels_pred: &[T],
) -> Result<Entropies, AssocError> {
    check_lengths(labels_true, labels_pred)?;
    if labels_true.is_empty() {
        return Err(AssocError::DegenerateInput(
            "joint entropy of empty labelings is undefined".to_string(),
        ));
    }
    let matrix = contingency_matrix(labels_true, labels_pred)?;
    let total = matrix.total() as f64;
    let joint = -matrix
        .cells
        .iter()
        .map(|&(_, _, count)| {
            let count = count as f64;
            count * count.ln()
        })
        .sum::<f64>()
        / total
        + total.ln();

    let true_marginal = entropy(labels_true);
    let pred_marginal = entropy(labels_pred);
    Ok(Entropies {
        joint,
        true_given_pred: joint - pred_marginal,
        pred_given_true: joint - true_marginal,
        true_marginal,
        pred_marginal,
    })
}
