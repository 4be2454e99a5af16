mod agresti_caffo;
mod cluster;
mod contingency;
mod fdr;
mod fisher;
mod tester;

pub use agresti_caffo::{agresti_caffo_larger, ProportionsTest};
pub use cluster::{ClonotypeRecord, ClusterAssignment, ClusterLabel};
pub use contingency::TwoByTwo;
pub use fdr::{benjamini_hochberg, FdrCorrection};
pub use fisher::{conditional_odds_ratio, fisher_greater};
pub use tester::{
    hla_association, AssociationBatch, AssociationParams, AssociationResult, TestFailure,
    DEFAULT_FDR_ALPHA,
};
