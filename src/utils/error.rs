use thiserror::Error;

/// Errors raised by the association and clustering-evaluation core.
///
/// Zero cells, zero or infinite odds ratios are not errors; they are returned
/// as values. Per-pair failures never surface here, they are collected in the
/// association batch instead.
#[derive(Debug, Error, PartialEq)]
pub enum AssocError {
    #[error("Unknown test method '{0}'. Options are: fisher, agresti-caffo")]
    UnknownTestMethod(String),
    #[error("Unknown clustering metric '{0}'. Options are: compression, entropies")]
    UnknownMetric(String),
    #[error("Unknown numeric policy '{0}'. Options are: ignore, strict")]
    UnknownNumericPolicy(String),
    #[error("FDR alpha must be in (0, 1], got {0}")]
    InvalidAlpha(f64),
    #[error("Duplicate sample in allele table: {0}")]
    DuplicateSample(String),
    #[error("Label sequences differ in length: {true_len} true vs {pred_len} predicted")]
    LengthMismatch { true_len: usize, pred_len: usize },
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
}

impl From<AssocError> for String {
    fn from(err: AssocError) -> Self {
        err.to_string()
    }
}
