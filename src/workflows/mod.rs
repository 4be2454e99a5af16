mod associate;
mod null_model;

pub use associate::{
    prepare_inputs, run_association, significant_clonotypes, PreparedInput, RunOutcome,
    RunParams, SignificantClonotype, DEFAULT_MIN_DONORS,
};
pub use null_model::{shuffle_samples, PassStats, RunSummary, DEFAULT_SEED};
