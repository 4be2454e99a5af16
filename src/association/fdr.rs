use itertools::Itertools;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct FdrCorrection {
    pub rejected: Vec<bool>,
    pub adjusted: Vec<f64>,
}

/// NaN p-values sort after every real value and are never rejected.
fn pvalue_order(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

/// Benjamini-Hochberg step-up procedure over one batch of p-values.
///
/// Must be called once on the complete batch; correcting subsets separately
/// understates the number of comparisons. Outputs are in input order.
pub fn benjamini_hochberg(pvalues: &[f64], alpha: f64) -> FdrCorrection {
    let m = pvalues.len();
    let order = (0..m)
        .sorted_by(|&i, &j| pvalue_order(pvalues[i], pvalues[j]))
        .collect_vec();

    let last_rejected = order
        .iter()
        .enumerate()
        .filter(|(rank, &idx)| pvalues[idx] <= alpha * (rank + 1) as f64 / m as f64)
        .map(|(rank, _)| rank)
        .last();

    let mut rejected = vec![false; m];
    if let Some(last) = last_rejected {
        for &idx in &order[..=last] {
            rejected[idx] = true;
        }
    }

    let mut adjusted = vec![f64::NAN; m];
    let mut running_min = f64::INFINITY;
    for (rank, &idx) in order.iter().enumerate().rev() {
        let pvalue = pvalues[idx];
        if pvalue.is_nan() {
            continue;
        }
        running_min = running_min.min(pvalue * m as f64 / (rank + 1) as f64);
        adjusted[idx] = running_min.min(1.0);
    }

    FdrCorrection { rejected, adjusted }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_batch() {
        let correction = benjamini_hochberg(&[], 0.1);
        assert!(correction.rejected.is_empty());
        assert!(correction.adjusted.is_empty());
    }

    #[test]
    fn single_test_rejected_below_alpha() {
        let correction = benjamini_hochberg(&[0.05], 0.1);
        assert_eq!(correction.rejected, vec![true]);
        assert_relative_eq!(correction.adjusted[0], 0.05);
    }

    #[test]
    fn step_up_rejects_everything_below_the_last_crossing() {
        // ranks 1..4 thresholds at alpha=0.05: 0.0125, 0.025, 0.0375, 0.05
        let correction = benjamini_hochberg(&[0.04, 0.001, 0.02, 0.2], 0.05);
        assert_eq!(correction.rejected, vec![false, true, true, false]);

        // 0.04 misses its own threshold but sits below the rank-4 crossing
        let correction = benjamini_hochberg(&[0.02, 0.001, 0.04, 0.045], 0.05);
        assert_eq!(correction.rejected, vec![true, true, true, true]);
    }

    #[test]
    fn adjusted_pvalues_are_monotone_in_rank() {
        let correction = benjamini_hochberg(&[0.01, 0.04, 0.03, 0.5], 0.1);
        let expected = [0.04, 0.04 * 4.0 / 3.0, 0.04 * 4.0 / 3.0, 0.5];
        for (q, e) in correction.adjusted.iter().zip(expected) {
            assert_relative_eq!(*q, e, max_relative = 1e-12);
        }
    }

    #[test]
    fn adjusted_values_capped_at_one() {
        let correction = benjamini_hochberg(&[0.9, 0.95, 1.0], 0.1);
        assert!(correction.adjusted.iter().all(|&q| q <= 1.0));
        assert!(correction.rejected.iter().all(|&r| !r));
    }

    #[test]
    fn nan_is_never_rejected() {
        let correction = benjamini_hochberg(&[f64::NAN, 0.001], 0.1);
        assert_eq!(correction.rejected, vec![false, true]);
        assert!(correction.adjusted[0].is_nan());
        assert_relative_eq!(correction.adjusted[1], 0.002);
    }

    #[test]
    fn more_lenient_alpha_never_rejects_fewer() {
        let pvalues = [0.001, 0.008, 0.039, 0.041, 0.042, 0.06, 0.074, 0.205, 0.212, 0.216];
        let mut previous = 0;
        for alpha in [0.01, 0.05, 0.1, 0.2, 0.3, 0.5, 1.0] {
            let count = benjamini_hochberg(&pvalues, alpha)
                .rejected
                .iter()
                .filter(|&&r| r)
                .count();
            assert!(count >= previous);
            previous = count;
        }
        assert_eq!(previous, pvalues.len());
    }
}
