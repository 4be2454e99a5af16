//! Input preparation and the paired real/shuffled association run.

use super::null_model::{shuffle_samples, PassStats, RunSummary, DEFAULT_SEED};
use crate::association::{
    hla_association, AssociationBatch, AssociationParams, AssociationResult, ClonotypeRecord,
    ClusterAssignment, ClusterLabel,
};
use crate::hla::AllelePresenceTable;
use crate::utils::AssocError;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_MIN_DONORS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    pub association: AssociationParams,
    pub min_donors: usize,
    pub min_count: Option<u64>,
    pub seed: u64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            association: AssociationParams::default(),
            min_donors: DEFAULT_MIN_DONORS,
            min_count: None,
            seed: DEFAULT_SEED,
        }
    }
}

/// Inputs after the sample join and the donor filters.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    /// Every clonotype kept after the count filter and the sample join,
    /// clustered or not. Fractions in the summary are relative to it.
    pub repertoire: ClusterAssignment,
    /// Clustered records of clusters spanning at least `min_donors` samples.
    pub clusters: ClusterAssignment,
    pub table: AllelePresenceTable,
}

/// Joins clonotypes and alleles on sample id and applies the count and donor
/// filters.
pub fn prepare_inputs(
    records: Vec<ClonotypeRecord>,
    table: &AllelePresenceTable,
    params: &RunParams,
) -> PreparedInput {
    let num_input = records.len();
    let mut repertoire = ClusterAssignment::new(records);
    if let Some(min_count) = params.min_count {
        repertoire = repertoire.filtered(|r| r.reads() >= min_count);
        log::info!(
            "Kept {}/{} clonotypes with clonal count >= {}",
            repertoire.len(),
            num_input,
            min_count
        );
    }

    let hla_samples = table
        .samples()
        .iter()
        .map(String::as_str)
        .collect::<HashSet<_>>();
    let repertoire = repertoire.retain_samples(&hla_samples);
    let tcr_samples = repertoire.samples().into_iter().collect::<HashSet<_>>();
    let table = table
        .restrict_samples(&tcr_samples)
        .retain_min_carriers(params.min_donors);
    log::info!(
        "{} samples with both clonotypes and HLA typing; {} clonotypes, {} alleles carried by >= {} donors",
        table.n_samples(),
        repertoire.len(),
        table.n_alleles(),
        params.min_donors
    );

    let clusters = repertoire.retain_min_donors(params.min_donors);
    log::info!(
        "{} clonotypes in {} clusters spanning >= {} donors",
        clusters.len(),
        clusters.samples_by_cluster().len(),
        params.min_donors
    );

    PreparedInput {
        repertoire,
        clusters,
        table,
    }
}

/// A clonotype of a significant cluster whose donor carries the associated
/// allele.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificantClonotype {
    /// Index into the records of the tested `ClusterAssignment`.
    pub record_index: usize,
    pub association: AssociationResult,
}

impl SignificantClonotype {
    pub fn record<'a>(&self, clusters: &'a ClusterAssignment) -> &'a ClonotypeRecord {
        &clusters.records()[self.record_index]
    }
}

/// Expands significant pairs into their clonotypes, keeping only clonotypes
/// whose sample carries the allele in `table`. Rows follow the batch order,
/// then record order; a clonotype appears once per significant allele its
/// sample carries.
pub fn significant_clonotypes(
    clusters: &ClusterAssignment,
    batch: &AssociationBatch,
    table: &AllelePresenceTable,
) -> Vec<SignificantClonotype> {
    let mut members: HashMap<&ClusterLabel, Vec<usize>> = HashMap::new();
    for (index, record) in clusters.records().iter().enumerate() {
        if let Some(cluster) = &record.cluster {
            members.entry(cluster).or_default().push(index);
        }
    }

    let mut significant = Vec::new();
    for association in batch.significant() {
        let Some(indices) = members.get(&association.cluster) else {
            continue;
        };
        for &record_index in indices {
            let sample = &clusters.records()[record_index].sample;
            if table.carries(sample, &association.hla) {
                significant.push(SignificantClonotype {
                    record_index,
                    association: association.clone(),
                });
            }
        }
    }
    significant
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub real: AssociationBatch,
    pub shuffled: AssociationBatch,
    pub shuffled_table: AllelePresenceTable,
    pub significant: Vec<SignificantClonotype>,
    pub significant_shuffled: Vec<SignificantClonotype>,
    pub summary: RunSummary,
}

/// Tests the prepared clusters against the real allele table and against one
/// seeded permutation of it, concurrently on the current rayon pool.
///
/// Clonotypes of both passes are matched against the real allele table.
pub fn run_association(input: &PreparedInput, params: &RunParams) -> Result<RunOutcome, AssocError> {
    params.association.validate()?;
    let shuffled_table = shuffle_samples(&input.table, params.seed);

    let (real, shuffled) = rayon::join(
        || hla_association(&input.clusters, &input.table, &params.association),
        || hla_association(&input.clusters, &shuffled_table, &params.association),
    );
    let real = real?;
    let shuffled = shuffled?;

    let significant = significant_clonotypes(&input.clusters, &real, &input.table);
    // Null hits are matched against the real typing, like the real pass
    let significant_shuffled = significant_clonotypes(&input.clusters, &shuffled, &input.table);

    let summary = RunSummary::new(
        params,
        &input.clusters,
        &input.repertoire,
        PassStats::new(&real, &significant, &input.clusters, &input.repertoire),
        PassStats::new(
            &shuffled,
            &significant_shuffled,
            &input.clusters,
            &input.repertoire,
        ),
    );
    log::info!(
        "Significant associations: {} real vs {} shuffled ({} vs {} metaclonotypes)",
        summary.real.nassociations,
        summary.shuffled.nassociations,
        summary.real.nmetaclones,
        summary.shuffled.nmetaclones
    );

    Ok(RunOutcome {
        real,
        shuffled,
        shuffled_table,
        significant,
        significant_shuffled,
        summary,
    })
}
