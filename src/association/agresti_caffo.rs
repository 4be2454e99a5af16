use super::TwoByTwo;
use statrs::distribution::{ContinuousCDF, Normal};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProportionsTest {
    pub statistic: f64,
    pub pvalue: f64,
    /// Sample odds ratio of the unadjusted proportions.
    pub odds_ratio: f64,
}

/// Upper tail of the standard normal distribution.
fn normal_sf(z: f64) -> f64 {
    Normal::new(0.0, 1.0).map_or(f64::NAN, |normal| normal.sf(z))
}

/// One-sided test that the in-cluster carrier proportion is larger than the
/// out-of-cluster one, using the Agresti-Caffo adjusted difference of
/// proportions (one pseudo-success and one pseudo-failure per group).
///
/// Empty groups do not panic: the odds ratio follows IEEE arithmetic and may be
/// 0, +inf or NaN.
pub fn agresti_caffo_larger(table: &TwoByTwo) -> ProportionsTest {
    let count1 = table.count_allele as f64;
    let nobs1 = table.total_allele as f64;
    let count2 = table.count_other as f64;
    let nobs2 = table.total_other as f64;

    let p1 = count1 / nobs1;
    let p2 = count2 / nobs2;
    let odds_ratio = p1 / (1.0 - p1) / p2 * (1.0 - p2);

    let adjusted_nobs1 = nobs1 + 2.0;
    let adjusted_nobs2 = nobs2 + 2.0;
    let adjusted_p1 = (count1 + 1.0) / adjusted_nobs1;
    let adjusted_p2 = (count2 + 1.0) / adjusted_nobs2;
    let variance = adjusted_p1 * (1.0 - adjusted_p1) / adjusted_nobs1
        + adjusted_p2 * (1.0 - adjusted_p2) / adjusted_nobs2;
    let statistic = (adjusted_p1 - adjusted_p2) / variance.sqrt();

    ProportionsTest {
        statistic,
        pvalue: normal_sf(statistic),
        odds_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normal_tail_reference_values() {
        assert_relative_eq!(normal_sf(0.0), 0.5, max_relative = 1e-12);
        assert_relative_eq!(normal_sf(1.959963984540054), 0.025, max_relative = 1e-9);
    }

    #[test]
    fn enriched_cluster() {
        let result = agresti_caffo_larger(&TwoByTwo::new(5, 5, 0, 5));
        // adjusted proportions 6/7 and 1/7
        let p1: f64 = 6.0 / 7.0;
        let p2 = 1.0 / 7.0;
        let expected = (p1 - p2) / (2.0 * p1 * (1.0 - p1) / 7.0).sqrt();
        assert_relative_eq!(result.statistic, expected, max_relative = 1e-12);
        assert!(result.pvalue < 0.001);
        assert_eq!(result.odds_ratio, f64::INFINITY);
    }

    #[test]
    fn reference_pvalue() {
        // statsmodels test_proportions_2indep(7, 10, 3, 10, method="agresti-caffo",
        // alternative="larger"): z = sqrt(3), p = 0.0416322583...
        let result = agresti_caffo_larger(&TwoByTwo::new(7, 10, 3, 10));
        assert_relative_eq!(result.statistic, 3f64.sqrt(), max_relative = 1e-12);
        assert_relative_eq!(result.pvalue, 0.04163225833177522, max_relative = 1e-9);
        assert_relative_eq!(result.odds_ratio, 49.0 / 9.0, max_relative = 1e-12);
    }

    #[test]
    fn equal_proportions() {
        let result = agresti_caffo_larger(&TwoByTwo::new(2, 4, 4, 8));
        assert_relative_eq!(result.statistic, 0.0, epsilon = 1e-12);
        assert_relative_eq!(result.pvalue, 0.5, max_relative = 1e-12);
        assert_relative_eq!(result.odds_ratio, 1.0, max_relative = 1e-12);
    }

    #[test]
    fn empty_outgroup_does_not_panic() {
        let result = agresti_caffo_larger(&TwoByTwo::new(3, 6, 0, 0));
        assert!(result.pvalue.is_finite());
        assert!(result.odds_ratio.is_nan());
    }

    #[test]
    fn absent_allele_gives_nan_odds() {
        let result = agresti_caffo_larger(&TwoByTwo::new(0, 4, 0, 6));
        assert!(result.odds_ratio.is_nan());
        assert!(result.pvalue > 0.0 && result.pvalue < 1.0);
    }
}
