use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Cluster id as produced by the clustering step; integer ids order
/// numerically and before any named cluster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClusterLabel {
    Id(i64),
    Name(String),
}

impl ClusterLabel {
    pub fn parse(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(id) => ClusterLabel::Id(id),
            Err(_) => ClusterLabel::Name(value.to_string()),
        }
    }
}

impl From<i64> for ClusterLabel {
    fn from(id: i64) -> Self {
        ClusterLabel::Id(id)
    }
}

impl From<&str> for ClusterLabel {
    fn from(name: &str) -> Self {
        ClusterLabel::parse(name)
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterLabel::Id(id) => write!(f, "{}", id),
            ClusterLabel::Name(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClonotypeRecord {
    pub clonotype: String,
    /// `None` for clonotypes left unclustered.
    pub cluster: Option<ClusterLabel>,
    pub sample: String,
    pub clonal_count: Option<u64>,
}

impl ClonotypeRecord {
    pub fn new(clonotype: &str, cluster: Option<ClusterLabel>, sample: &str) -> Self {
        Self {
            clonotype: clonotype.to_string(),
            cluster,
            sample: sample.to_string(),
            clonal_count: None,
        }
    }

    pub fn with_count(mut self, clonal_count: u64) -> Self {
        self.clonal_count = Some(clonal_count);
        self
    }

    /// Reads backing this clonotype; a record without a count stands for one.
    pub fn reads(&self) -> u64 {
        self.clonal_count.unwrap_or(1)
    }
}

/// Clonotype to cluster to sample assignment, treated as a read-only snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterAssignment {
    records: Vec<ClonotypeRecord>,
}

impl ClusterAssignment {
    pub fn new(records: Vec<ClonotypeRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ClonotypeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clustered(&self) -> impl Iterator<Item = (&ClusterLabel, &ClonotypeRecord)> {
        self.records
            .iter()
            .filter_map(|r| r.cluster.as_ref().map(|c| (c, r)))
    }

    /// Distinct samples per cluster id; unclustered records are skipped.
    pub fn samples_by_cluster(&self) -> BTreeMap<&ClusterLabel, BTreeSet<&str>> {
        let mut groups: BTreeMap<&ClusterLabel, BTreeSet<&str>> = BTreeMap::new();
        for (cluster, record) in self.clustered() {
            groups
                .entry(cluster)
                .or_default()
                .insert(record.sample.as_str());
        }
        groups
    }

    pub fn samples(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.sample.as_str()).collect()
    }

    pub fn total_reads(&self) -> u64 {
        self.records.iter().map(ClonotypeRecord::reads).sum()
    }

    /// Keeps records whose sample is in `keep`.
    pub fn retain_samples(&self, keep: &HashSet<&str>) -> Self {
        self.filtered(|r| keep.contains(r.sample.as_str()))
    }

    /// Keeps clustered records whose cluster spans at least `min_donors`
    /// distinct samples. Unclustered records are dropped.
    pub fn retain_min_donors(&self, min_donors: usize) -> Self {
        let kept: HashSet<ClusterLabel> = self
            .samples_by_cluster()
            .into_iter()
            .filter(|(_, samples)| samples.len() >= min_donors)
            .map(|(cluster, _)| cluster.clone())
            .collect();
        self.filtered(|r| r.cluster.as_ref().is_some_and(|c| kept.contains(c)))
    }

    pub fn filtered<F>(&self, keep: F) -> Self
    where
        F: Fn(&ClonotypeRecord) -> bool,
    {
        Self {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}
