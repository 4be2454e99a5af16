//! Per-(cluster, allele) association testing with one global FDR correction.

use super::{
    agresti_caffo::agresti_caffo_larger,
    fdr::benjamini_hochberg,
    fisher::{conditional_odds_ratio, fisher_greater},
    ClusterAssignment, ClusterLabel, TwoByTwo,
};
use crate::hla::AllelePresenceTable;
use crate::utils::{AssocError, NumericPolicy, TestMethod};
use rayon::prelude::*;
use std::collections::BTreeSet;

pub const DEFAULT_FDR_ALPHA: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssociationParams {
    pub method: TestMethod,
    pub fdr_alpha: f64,
    pub numeric_policy: NumericPolicy,
}

impl Default for AssociationParams {
    fn default() -> Self {
        Self {
            method: TestMethod::Fisher,
            fdr_alpha: DEFAULT_FDR_ALPHA,
            numeric_policy: NumericPolicy::Ignore,
        }
    }
}

impl AssociationParams {
    pub fn validate(&self) -> Result<(), AssocError> {
        if self.fdr_alpha > 0.0 && self.fdr_alpha <= 1.0 {
            Ok(())
        } else {
            Err(AssocError::InvalidAlpha(self.fdr_alpha))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociationResult {
    pub cluster: ClusterLabel,
    pub hla: String,
    pub count_allele: u64,
    pub total_allele: u64,
    pub count_other: u64,
    pub total_other: u64,
    pub pvalue: f64,
    pub pvalue_adjusted: f64,
    pub odds_ratio: f64,
    pub significant: bool,
}

/// A cluster or a single pair that could not be scored. `hla` is `None` when
/// the whole cluster was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct TestFailure {
    pub cluster: ClusterLabel,
    pub hla: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationBatch {
    pub results: Vec<AssociationResult>,
    pub failures: Vec<TestFailure>,
}

impl AssociationBatch {
    pub fn significant(&self) -> impl Iterator<Item = &AssociationResult> {
        self.results.iter().filter(|r| r.significant)
    }

    pub fn num_significant(&self) -> usize {
        self.significant().count()
    }

    pub fn significant_clusters(&self) -> BTreeSet<&ClusterLabel> {
        self.significant().map(|r| &r.cluster).collect()
    }
}

/// Scored pair awaiting the batch-wide correction.
struct PendingResult {
    cluster: ClusterLabel,
    hla: String,
    table: TwoByTwo,
    pvalue: f64,
    odds_ratio: f64,
}

type ClusterOutcome = Result<Vec<Result<PendingResult, TestFailure>>, TestFailure>;

/// Tests every observed cluster against every allele column of `table`.
///
/// Clusters are scored in parallel on the current rayon pool and collected in
/// (cluster, allele) order; the Benjamini-Hochberg correction then runs once
/// over all p-values. Failed clusters or pairs are reported in
/// `AssociationBatch::failures` and take no part in the correction.
pub fn hla_association(
    clusters: &ClusterAssignment,
    table: &AllelePresenceTable,
    params: &AssociationParams,
) -> Result<AssociationBatch, AssocError> {
    params.validate()?;
    let carriers = table.carriers();
    let groups = clusters.samples_by_cluster().into_iter().collect::<Vec<_>>();
    log::debug!(
        "Testing {} clusters against {} alleles ({})",
        groups.len(),
        table.n_alleles(),
        params.method
    );

    let outcomes: Vec<ClusterOutcome> = groups
        .into_par_iter()
        .map(|(cluster, samples)| score_cluster(cluster, &samples, table, &carriers, params))
        .collect();

    let mut pending = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(pairs) => {
                for pair in pairs {
                    match pair {
                        Ok(result) => pending.push(result),
                        Err(failure) => failures.push(failure),
                    }
                }
            }
            Err(failure) => failures.push(failure),
        }
    }
    for failure in &failures {
        match &failure.hla {
            Some(hla) => log::warn!("Cluster {} / {}: {}", failure.cluster, hla, failure.reason),
            None => log::warn!("Cluster {}: {}", failure.cluster, failure.reason),
        }
    }

    let pvalues = pending.iter().map(|p| p.pvalue).collect::<Vec<_>>();
    let correction = benjamini_hochberg(&pvalues, params.fdr_alpha);
    let results = pending
        .into_iter()
        .zip(correction.rejected)
        .zip(correction.adjusted)
        .map(|((p, significant), pvalue_adjusted)| AssociationResult {
            cluster: p.cluster,
            hla: p.hla,
            count_allele: p.table.count_allele,
            total_allele: p.table.total_allele,
            count_other: p.table.count_other,
            total_other: p.table.total_other,
            pvalue: p.pvalue,
            pvalue_adjusted,
            odds_ratio: p.odds_ratio,
            significant,
        })
        .collect::<Vec<_>>();

    let batch = AssociationBatch { results, failures };
    log::info!(
        "Tested {} cluster/allele pairs: {} significant at FDR {}, {} failed",
        batch.results.len(),
        batch.num_significant(),
        params.fdr_alpha,
        batch.failures.len()
    );
    Ok(batch)
}

fn score_cluster(
    cluster: &ClusterLabel,
    samples: &BTreeSet<&str>,
    table: &AllelePresenceTable,
    carriers: &[u64],
    params: &AssociationParams,
) -> ClusterOutcome {
    let mut rows = Vec::with_capacity(samples.len());
    let mut missing = BTreeSet::new();
    for sample in samples {
        match table.sample_index(sample) {
            Some(row) => rows.push(row),
            None => {
                missing.insert(*sample);
            }
        }
    }
    if !missing.is_empty() {
        return Err(TestFailure {
            cluster: cluster.clone(),
            hla: None,
            reason: format!(
                "{} sample(s) missing from the allele table: {}",
                missing.len(),
                missing.into_iter().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    let total_allele = rows.len() as u64;
    let total_other = (table.n_samples() - rows.len()) as u64;
    let mut counts = vec![0u64; table.n_alleles()];
    for &row in &rows {
        for (count, &present) in counts.iter_mut().zip(table.row(row)) {
            if present {
                *count += 1;
            }
        }
    }
    log::trace!("Cluster {}: {} samples", cluster, total_allele);

    Ok(table
        .alleles()
        .iter()
        .zip(counts)
        .zip(carriers)
        .map(|((hla, count_allele), &carried)| {
            // Out-of-cluster carriers come from the column total, not a second scan
            let pair = TwoByTwo::new(count_allele, total_allele, carried - count_allele, total_other);
            score_pair(&pair, params)
                .map(|(pvalue, odds_ratio)| PendingResult {
                    cluster: cluster.clone(),
                    hla: hla.clone(),
                    table: pair,
                    pvalue,
                    odds_ratio,
                })
                .map_err(|reason| TestFailure {
                    cluster: cluster.clone(),
                    hla: Some(hla.clone()),
                    reason,
                })
        })
        .collect())
}

fn score_pair(table: &TwoByTwo, params: &AssociationParams) -> Result<(f64, f64), String> {
    let (pvalue, odds_ratio) = match params.method {
        TestMethod::Fisher => (fisher_greater(table), conditional_odds_ratio(table)),
        TestMethod::AgrestiCaffo => {
            let test = agresti_caffo_larger(table);
            (test.pvalue, test.odds_ratio)
        }
    };
    params.numeric_policy.check(pvalue, odds_ratio)?;
    Ok((pvalue, odds_ratio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::ClonotypeRecord;
    use approx::assert_relative_eq;

    /// Two clusters of five donors; allele A in every donor of cluster 1 only.
    fn enriched_fixture() -> (ClusterAssignment, AllelePresenceTable) {
        let mut records = Vec::new();
        let mut samples = Vec::new();
        let mut rows = Vec::new();
        for i in 0..10 {
            let sample = format!("s{}", i);
            let cluster = if i < 5 { 1 } else { 2 };
            records.push(ClonotypeRecord::new(
                &format!("c{}", i),
                Some(ClusterLabel::Id(cluster)),
                &sample,
            ));
            samples.push(sample);
            rows.push(vec![i < 5]);
        }
        let table = AllelePresenceTable::new(samples, vec!["A".to_string()], rows).unwrap();
        (ClusterAssignment::new(records), table)
    }

    #[test]
    fn enriched_cluster_is_significant() {
        let (clusters, table) = enriched_fixture();
        let batch = hla_association(&clusters, &table, &AssociationParams::default()).unwrap();
        assert_eq!(batch.results.len(), 2);
        assert!(batch.failures.is_empty());

        let hit = &batch.results[0];
        assert_eq!(hit.cluster, ClusterLabel::Id(1));
        assert_eq!(
            (hit.count_allele, hit.total_allele, hit.count_other, hit.total_other),
            (5, 5, 0, 5)
        );
        assert_relative_eq!(hit.pvalue, 1.0 / 252.0, max_relative = 1e-10);
        assert_relative_eq!(hit.pvalue_adjusted, 2.0 / 252.0, max_relative = 1e-10);
        assert_eq!(hit.odds_ratio, f64::INFINITY);
        assert!(hit.significant);

        let miss = &batch.results[1];
        assert_eq!(miss.cluster, ClusterLabel::Id(2));
        assert_eq!(miss.pvalue, 1.0);
        assert_eq!(miss.odds_ratio, 0.0);
        assert!(!miss.significant);
        assert_eq!(batch.num_significant(), 1);
    }

    #[test]
    fn counts_partition_the_table() {
        let (clusters, table) = enriched_fixture();
        let mut records = clusters.records().to_vec();
        // Same donor twice in a cluster and a cluster straddling both groups
        records.push(ClonotypeRecord::new("x1", Some(ClusterLabel::Id(3)), "s0"));
        records.push(ClonotypeRecord::new("x2", Some(ClusterLabel::Id(3)), "s0"));
        records.push(ClonotypeRecord::new("x3", Some(ClusterLabel::Id(3)), "s7"));
        let clusters = ClusterAssignment::new(records);

        let batch = hla_association(&clusters, &table, &AssociationParams::default()).unwrap();
        let carriers = table.carriers()[0];
        for result in &batch.results {
            assert_eq!(result.count_allele + result.count_other, carriers);
            assert_eq!(
                result.total_allele + result.total_other,
                table.n_samples() as u64
            );
        }
        let straddling = batch
            .results
            .iter()
            .find(|r| r.cluster == ClusterLabel::Id(3))
            .unwrap();
        assert_eq!((straddling.count_allele, straddling.total_allele), (1, 2));
    }

    #[test]
    fn agresti_caffo_method() {
        let (clusters, table) = enriched_fixture();
        let params = AssociationParams {
            method: TestMethod::AgrestiCaffo,
            ..Default::default()
        };
        let batch = hla_association(&clusters, &table, &params).unwrap();
        assert!(batch.results[0].significant);
        assert!(batch.results[0].pvalue < 0.001);
        assert!(batch.results[1].pvalue > 0.99);
    }

    #[test]
    fn unknown_sample_fails_only_its_cluster() {
        let (clusters, table) = enriched_fixture();
        let mut records = clusters.records().to_vec();
        records.push(ClonotypeRecord::new("x1", Some(ClusterLabel::Id(9)), "ghost"));
        let clusters = ClusterAssignment::new(records);

        let batch = hla_association(&clusters, &table, &AssociationParams::default()).unwrap();
        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].cluster, ClusterLabel::Id(9));
        assert_eq!(batch.failures[0].hla, None);
    }

    #[test]
    fn strict_policy_isolates_undefined_pairs() {
        let (clusters, _) = enriched_fixture();
        // Allele B is carried by nobody, so its odds ratio is undefined
        let samples = (0..10).map(|i| format!("s{}", i)).collect();
        let rows = (0..10).map(|i| vec![i < 5, false]).collect();
        let table =
            AllelePresenceTable::new(samples, vec!["A".into(), "B".into()], rows).unwrap();

        let lenient = hla_association(&clusters, &table, &AssociationParams::default()).unwrap();
        assert_eq!(lenient.results.len(), 4);
        assert!(lenient.failures.is_empty());

        let params = AssociationParams {
            numeric_policy: NumericPolicy::Strict,
            ..Default::default()
        };
        let strict = hla_association(&clusters, &table, &params).unwrap();
        assert_eq!(strict.results.len(), 2);
        assert_eq!(strict.failures.len(), 2);
        assert!(strict.failures.iter().all(|f| f.hla.as_deref() == Some("B")));
        assert!(strict.results[0].significant);
    }

    #[test]
    fn invalid_alpha_err() {
        let (clusters, table) = enriched_fixture();
        let params = AssociationParams {
            fdr_alpha: 0.0,
            ..Default::default()
        };
        assert_eq!(
            hla_association(&clusters, &table, &params),
            Err(AssocError::InvalidAlpha(0.0))
        );
    }

    #[test]
    fn unclustered_records_are_ignored() {
        let (clusters, table) = enriched_fixture();
        let mut records = clusters.records().to_vec();
        records.push(ClonotypeRecord::new("u1", None, "s9"));
        let batch = hla_association(
            &ClusterAssignment::new(records),
            &table,
            &AssociationParams::default(),
        )
        .unwrap();
        assert_eq!(batch.results.len(), 2);
    }
}
