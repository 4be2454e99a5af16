//! Dense sample x allele presence matrix.

use std::collections::{HashMap, HashSet};

/// Boolean presence of each allele (column) in each sample (row).
///
/// Rows are stored contiguously; `presence[row * n_alleles + col]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AllelePresenceTable {
    samples: Vec<String>,
    alleles: Vec<String>,
    presence: Vec<bool>,
    index: HashMap<String, usize>,
}

impl AllelePresenceTable {
    /// Builds a table from per-sample presence rows. Every row must have one
    /// entry per allele and sample ids must be unique.
    pub fn new(
        samples: Vec<String>,
        alleles: Vec<String>,
        rows: Vec<Vec<bool>>,
    ) -> std::result::Result<Self, String> {
        if samples.len() != rows.len() {
            return Err(format!(
                "Expected {} presence rows, got {}",
                samples.len(),
                rows.len()
            ));
        }
        let mut presence = Vec::with_capacity(samples.len() * alleles.len());
        for (sample, row) in samples.iter().zip(rows) {
            if row.len() != alleles.len() {
                return Err(format!(
                    "Sample {} has {} presence values, expected {}",
                    sample,
                    row.len(),
                    alleles.len()
                ));
            }
            presence.extend(row);
        }
        let index = build_index(&samples)?;
        Ok(Self {
            samples,
            alleles,
            presence,
            index,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn n_alleles(&self) -> usize {
        self.alleles.len()
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn alleles(&self) -> &[String] {
        &self.alleles
    }

    pub fn sample_index(&self, sample: &str) -> Option<usize> {
        self.index.get(sample).copied()
    }

    pub fn contains_sample(&self, sample: &str) -> bool {
        self.index.contains_key(sample)
    }

    pub fn row(&self, row: usize) -> &[bool] {
        let width = self.alleles.len();
        &self.presence[row * width..(row + 1) * width]
    }

    pub fn allele_index(&self, allele: &str) -> Option<usize> {
        self.alleles.iter().position(|a| a == allele)
    }

    /// Whether `sample` carries `allele`; false when either is unknown.
    pub fn carries(&self, sample: &str, allele: &str) -> bool {
        match (self.sample_index(sample), self.allele_index(allele)) {
            (Some(row), Some(col)) => self.row(row)[col],
            _ => false,
        }
    }

    /// Number of samples carrying each allele, in column order.
    pub fn carriers(&self) -> Vec<u64> {
        let mut counts = vec![0u64; self.alleles.len()];
        for row in 0..self.samples.len() {
            for (count, &present) in counts.iter_mut().zip(self.row(row)) {
                if present {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// Keeps only rows whose sample is in `keep`, preserving row order.
    pub fn restrict_samples(&self, keep: &HashSet<&str>) -> Self {
        let rows = (0..self.samples.len())
            .filter(|&row| keep.contains(self.samples[row].as_str()))
            .collect::<Vec<_>>();
        self.select(&rows, &(0..self.alleles.len()).collect::<Vec<_>>())
    }

    /// Keeps only alleles carried by at least `min_carriers` samples.
    pub fn retain_min_carriers(&self, min_carriers: usize) -> Self {
        let cols = self
            .carriers()
            .iter()
            .enumerate()
            .filter(|(_, &count)| count >= min_carriers as u64)
            .map(|(col, _)| col)
            .collect::<Vec<_>>();
        self.select(&(0..self.samples.len()).collect::<Vec<_>>(), &cols)
    }

    /// Reassigns sample ids to rows, leaving the presence rows in place.
    ///
    /// `samples` must be a permutation of the current sample ids.
    pub fn relabeled(&self, samples: Vec<String>) -> Self {
        debug_assert_eq!(samples.len(), self.samples.len());
        let index = samples
            .iter()
            .enumerate()
            .map(|(row, sample)| (sample.clone(), row))
            .collect();
        Self {
            samples,
            alleles: self.alleles.clone(),
            presence: self.presence.clone(),
            index,
        }
    }

    fn select(&self, rows: &[usize], cols: &[usize]) -> Self {
        let samples = rows
            .iter()
            .map(|&row| self.samples[row].clone())
            .collect::<Vec<_>>();
        let alleles = cols.iter().map(|&col| self.alleles[col].clone()).collect();
        let mut presence = Vec::with_capacity(rows.len() * cols.len());
        for &row in rows {
            let values = self.row(row);
            presence.extend(cols.iter().map(|&col| values[col]));
        }
        let index = samples
            .iter()
            .enumerate()
            .map(|(row, sample)| (sample.clone(), row))
            .collect();
        Self {
            samples,
            alleles,
            presence,
            index,
        }
    }
}

fn build_index(samples: &[String]) -> std::result::Result<HashMap<String, usize>, String> {
    let mut index = HashMap::with_capacity(samples.len());
    for (row, sample) in samples.iter().enumerate() {
        if index.insert(sample.clone(), row).is_some() {
            return Err(format!("Duplicate sample in allele table: {}", sample));
        }
    }
    Ok(index)
}
