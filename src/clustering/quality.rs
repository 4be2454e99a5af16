use super::contingency::conditional_entropies;
use crate::utils::AssocError;

/// Compression score of a predicted clustering against the true labels:
/// `1 - (H(joint) - H(true)) / (ln n - H(true))`.
///
/// The numerator is the extra information the prediction carries once the
/// true labels are known, so the score lies in [0, 1]: merging items within
/// their true classes keeps it at 1 and splitting every item into its own
/// cluster drives it to 0. Errors when the denominator vanishes, i.e. when
/// every true label is distinct or there is at most one item.
pub fn compression_score<T: Ord + Clone>(
    labels_true: &[T],
    labels_pred: &[T],
) -> Result<f64, AssocError> {
    let entropies = conditional_entropies(labels_true, labels_pred)?;
    let ln_n = (labels_true.len() as f64).ln();
    let denominator = ln_n - entropies.true_marginal;
    if denominator.abs() <= 1e-9 * ln_n.max(1.0) {
        return Err(AssocError::DegenerateInput(format!(
            "compression score is undefined for {} items with all-distinct true labels",
            labels_true.len()
        )));
    }
    Ok(1.0 - entropies.pred_given_true / denominator)
}
