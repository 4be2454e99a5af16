//! Label-permutation null model and the real-vs-shuffled run summary.

use super::associate::{RunParams, SignificantClonotype};
use crate::association::{AssociationBatch, ClusterAssignment};
use crate::hla::AllelePresenceTable;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::BTreeSet;

pub const DEFAULT_SEED: u64 = 42;

/// Applies one uniform random permutation to the sample ids of `table`.
///
/// Presence rows stay where they are, so every allele keeps its carrier count
/// while the link between a donor and its alleles is broken.
pub fn shuffle_samples(table: &AllelePresenceTable, seed: u64) -> AllelePresenceTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = table.samples().to_vec();
    samples.shuffle(&mut rng);
    log::debug!(
        "Permuted {} sample ids with seed {}",
        samples.len(),
        seed
    );
    table.relabeled(samples)
}

fn fraction(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Counts for one association pass, relative to the prepared repertoire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassStats {
    pub nassociations: usize,
    pub nmetaclones: usize,
    pub sig_clonotype_fraction: f64,
    pub sig_read_fraction: f64,
    pub id_fraction: f64,
}

impl PassStats {
    pub fn new(
        batch: &AssociationBatch,
        significant: &[SignificantClonotype],
        clusters: &ClusterAssignment,
        repertoire: &ClusterAssignment,
    ) -> Self {
        // One row per (clonotype, allele) hit, so a clonotype in a cluster
        // hit by two alleles it carries counts twice
        let reads = significant
            .iter()
            .map(|s| s.record(clusters).reads())
            .sum::<u64>();
        let samples = significant
            .iter()
            .map(|s| s.record(clusters).sample.as_str())
            .collect::<BTreeSet<_>>();
        let total_reads = repertoire.total_reads();

        Self {
            nassociations: batch.num_significant(),
            nmetaclones: batch.significant_clusters().len(),
            sig_clonotype_fraction: fraction(significant.len(), repertoire.len()),
            sig_read_fraction: if total_reads == 0 {
                0.0
            } else {
                reads as f64 / total_reads as f64
            },
            id_fraction: fraction(samples.len(), repertoire.samples().len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub params: RunParams,
    pub clustered_fraction: f64,
    pub real: PassStats,
    pub shuffled: PassStats,
}

impl RunSummary {
    pub fn new(
        params: &RunParams,
        clusters: &ClusterAssignment,
        repertoire: &ClusterAssignment,
        real: PassStats,
        shuffled: PassStats,
    ) -> Self {
        Self {
            params: params.clone(),
            clustered_fraction: fraction(clusters.len(), repertoire.len()),
            real,
            shuffled,
        }
    }

    /// Key/value rows of the stats report, real and shuffled side by side.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("hlatest", self.params.association.method.to_string()),
            ("fdr_alpha", self.params.association.fdr_alpha.to_string()),
            ("numeric_policy", self.params.association.numeric_policy.to_string()),
            ("min_donors", self.params.min_donors.to_string()),
            (
                "mincount",
                self.params.min_count.map(|c| c.to_string()).unwrap_or_default(),
            ),
            ("seed", self.params.seed.to_string()),
            ("nassociations", self.real.nassociations.to_string()),
            ("nassociations_shuffled", self.shuffled.nassociations.to_string()),
            ("nmetaclones", self.real.nmetaclones.to_string()),
            ("nmetaclones_shuffled", self.shuffled.nmetaclones.to_string()),
            ("clustered_fraction", self.clustered_fraction.to_string()),
            (
                "sig_clonotype_fraction",
                self.real.sig_clonotype_fraction.to_string(),
            ),
            (
                "sig_clonotype_fraction_shuffled",
                self.shuffled.sig_clonotype_fraction.to_string(),
            ),
            ("sig_read_fraction", self.real.sig_read_fraction.to_string()),
            (
                "sig_read_fraction_shuffled",
                self.shuffled.sig_read_fraction.to_string(),
            ),
            ("id_fraction", self.real.id_fraction.to_string()),
            ("id_fraction_shuffled", self.shuffled.id_fraction.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> AllelePresenceTable {
        let samples = (0..n).map(|i| format!("s{}", i)).collect();
        let rows = (0..n).map(|i| vec![i % 2 == 0, i % 3 == 0]).collect();
        AllelePresenceTable::new(samples, vec!["A".into(), "B".into()], rows).unwrap()
    }

    #[test]
    fn same_seed_same_permutation() {
        let table = table(20);
        let first = shuffle_samples(&table, 7);
        let second = shuffle_samples(&table, 7);
        assert_eq!(first, second);
        assert_ne!(first.samples(), shuffle_samples(&table, 8).samples());
    }

    #[test]
    fn permutation_keeps_carrier_counts() {
        let table = table(20);
        let shuffled = shuffle_samples(&table, DEFAULT_SEED);
        assert_eq!(shuffled.carriers(), table.carriers());
        assert_eq!(
            shuffled.samples().iter().collect::<BTreeSet<_>>(),
            table.samples().iter().collect::<BTreeSet<_>>()
        );
        for sample in table.samples() {
            assert!(shuffled.contains_sample(sample));
        }
    }

    #[test]
    fn empty_fraction_is_zero() {
        assert_eq!(fraction(0, 0), 0.0);
        assert_eq!(fraction(1, 4), 0.25);
    }
}
