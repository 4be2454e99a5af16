use crate::utils::AssocError;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestMethod {
    #[default]
    Fisher,
    AgrestiCaffo,
}

impl FromStr for TestMethod {
    type Err = AssocError;
    fn from_str(method: &str) -> Result<Self, Self::Err> {
        match method {
            "fisher" => Ok(TestMethod::Fisher),
            "agresti-caffo" => Ok(TestMethod::AgrestiCaffo),
            _ => Err(AssocError::UnknownTestMethod(method.to_string())),
        }
    }
}

impl fmt::Display for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestMethod::Fisher => write!(f, "fisher"),
            TestMethod::AgrestiCaffo => write!(f, "agresti-caffo"),
        }
    }
}

/// How non-finite test output is treated for a single pair.
///
/// `Ignore` returns whatever the test produced, NaN included. `Strict` turns
/// a NaN p-value or odds ratio into a failure for that pair only. Infinite
/// odds ratios are valid under both policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericPolicy {
    #[default]
    Ignore,
    Strict,
}

impl NumericPolicy {
    pub fn check(&self, pvalue: f64, odds_ratio: f64) -> Result<(), String> {
        match self {
            NumericPolicy::Ignore => Ok(()),
            NumericPolicy::Strict if pvalue.is_nan() => Err("p-value is undefined".to_string()),
            NumericPolicy::Strict if odds_ratio.is_nan() => {
                Err("odds ratio is undefined".to_string())
            }
            NumericPolicy::Strict => Ok(()),
        }
    }
}

impl FromStr for NumericPolicy {
    type Err = AssocError;
    fn from_str(policy: &str) -> Result<Self, Self::Err> {
        match policy {
            "ignore" => Ok(NumericPolicy::Ignore),
            "strict" => Ok(NumericPolicy::Strict),
            _ => Err(AssocError::UnknownNumericPolicy(policy.to_string())),
        }
    }
}

impl fmt::Display for NumericPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericPolicy::Ignore => write!(f, "ignore"),
            NumericPolicy::Strict => write!(f, "strict"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusteringMetric {
    Compression,
    Entropies,
}

impl FromStr for ClusteringMetric {
    type Err = AssocError;
    fn from_str(metric: &str) -> Result<Self, Self::Err> {
        match metric {
            "compression" => Ok(ClusteringMetric::Compression),
            "entropies" => Ok(ClusteringMetric::Entropies),
            _ => Err(AssocError::UnknownMetric(metric.to_string())),
        }
    }
}
