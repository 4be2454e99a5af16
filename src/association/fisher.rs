//! Fisher's exact test and the conditional maximum-likelihood odds ratio for a
//! 2x2 table, both computed on the log scale so large donor cohorts do not
//! overflow the binomial coefficients.

use super::TwoByTwo;
use statrs::function::factorial::ln_binomial;

const MAX_BRACKET_STEPS: usize = 64;
const MAX_BISECTION_STEPS: usize = 200;
const LOG_ODDS_TOLERANCE: f64 = 1e-12;

/// Support of the (central or noncentral) hypergeometric distribution of the
/// top-left cell given all margins.
fn support(table: &TwoByTwo) -> (u64, u64) {
    let carriers = table.carriers();
    let lo = carriers.saturating_sub(table.total_other);
    let hi = carriers.min(table.total_allele);
    (lo, hi)
}

/// log C(n1, x) + log C(n2, K - x): the unnormalised log weight of `x`
/// in-cluster carriers.
fn ln_weight(table: &TwoByTwo, x: u64) -> f64 {
    ln_binomial(table.total_allele, x) + ln_binomial(table.total_other, table.carriers() - x)
}

fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

/// One-sided Fisher exact p-value for in-cluster enrichment:
/// P(X >= count_allele) for X hypergeometric with the table's margins.
pub fn fisher_greater(table: &TwoByTwo) -> f64 {
    let (lo, hi) = support(table);
    if table.count_allele <= lo {
        return 1.0;
    }
    let all = (lo..=hi).map(|x| ln_weight(table, x)).collect::<Vec<_>>();
    let tail = (table.count_allele..=hi)
        .map(|x| ln_weight(table, x))
        .collect::<Vec<_>>();
    (log_sum_exp(&tail) - log_sum_exp(&all)).exp().min(1.0)
}

/// Conditional maximum-likelihood estimate of the odds ratio.
///
/// Solves E[X | psi] = count_allele under Fisher's noncentral hypergeometric
/// distribution. Returns NaN when any margin is zero, 0 when the observed
/// count sits at the lower end of its support and +inf at the upper end.
pub fn conditional_odds_ratio(table: &TwoByTwo) -> f64 {
    let [[a, b], [c, d]] = table.cells();
    if a + b == 0 || c + d == 0 || a + c == 0 || b + d == 0 {
        return f64::NAN;
    }
    let (lo, hi) = support(table);
    if a == lo {
        return 0.0;
    }
    if a == hi {
        return f64::INFINITY;
    }

    let weights = (lo..=hi)
        .map(|x| (x as f64, ln_weight(table, x)))
        .collect::<Vec<_>>();
    let observed = a as f64;
    let mean = |log_odds: f64| -> f64 {
        let shifted = weights
            .iter()
            .map(|(x, w)| w + x * log_odds)
            .collect::<Vec<_>>();
        let max = shifted.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (numerator, denominator) = weights.iter().zip(&shifted).fold(
            (0.0, 0.0),
            |(num, den), ((x, _), s)| {
                let p = (s - max).exp();
                (num + x * p, den + p)
            },
        );
        numerator / denominator
    };

    // The mean is increasing in the log odds; bracket the root, then bisect.
    let mut lower = -1.0;
    let mut upper = 1.0;
    for _ in 0..MAX_BRACKET_STEPS {
        if mean(lower) <= observed {
            break;
        }
        lower *= 2.0;
    }
    for _ in 0..MAX_BRACKET_STEPS {
        if mean(upper) >= observed {
            break;
        }
        upper *= 2.0;
    }
    for _ in 0..MAX_BISECTION_STEPS {
        let mid = 0.5 * (lower + upper);
        if mean(mid) < observed {
            lower = mid;
        } else {
            upper = mid;
        }
        if upper - lower < LOG_ODDS_TOLERANCE {
            break;
        }
    }
    (0.5 * (lower + upper)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfectly_enriched_table() {
        // 5/5 carriers in cluster, 0/5 outside
        let table = TwoByTwo::new(5, 5, 0, 5);
        assert_relative_eq!(fisher_greater(&table), 1.0 / 252.0, max_relative = 1e-10);
        assert_eq!(conditional_odds_ratio(&table), f64::INFINITY);
    }

    #[test]
    fn depleted_table_is_not_significant() {
        let table = TwoByTwo::new(0, 5, 5, 5);
        assert_eq!(fisher_greater(&table), 1.0);
        assert_eq!(conditional_odds_ratio(&table), 0.0);
    }

    #[test]
    fn tea_tasting_table() {
        // [[3, 1], [1, 3]]: one-sided p = 17/70
        let table = TwoByTwo::new(3, 4, 1, 4);
        assert_relative_eq!(fisher_greater(&table), 17.0 / 70.0, max_relative = 1e-10);
        // Conditional MLE for this table (scipy.stats.contingency.odds_ratio)
        assert_relative_eq!(
            conditional_odds_ratio(&table),
            6.408309,
            max_relative = 1e-5
        );
    }

    #[test]
    fn symmetric_table_has_unit_odds() {
        let table = TwoByTwo::new(2, 4, 2, 4);
        assert_relative_eq!(conditional_odds_ratio(&table), 1.0, max_relative = 1e-9);
    }

    #[test]
    fn zero_margins_do_not_panic() {
        // No carriers at all
        let table = TwoByTwo::new(0, 3, 0, 7);
        assert_eq!(fisher_greater(&table), 1.0);
        assert!(conditional_odds_ratio(&table).is_nan());

        // Cluster spans every sample
        let table = TwoByTwo::new(2, 4, 0, 0);
        assert_eq!(fisher_greater(&table), 1.0);
        assert!(conditional_odds_ratio(&table).is_nan());
    }

    #[test]
    fn large_cohort_stays_finite() {
        let table = TwoByTwo::new(40, 50, 300, 1500);
        let pvalue = fisher_greater(&table);
        assert!(pvalue > 0.0 && pvalue < 1e-10);
        let odds = conditional_odds_ratio(&table);
        assert!(odds.is_finite() && odds > 10.0);
    }
}
