use super::AllelePresenceTable;
use crate::utils::AssocError;
use std::collections::{BTreeSet, HashSet};

/// One sample's raw allele calls, typically one cell per HLA locus column.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAlleleRow {
    pub sample: String,
    pub calls: Vec<Option<String>>,
}

/// Reshapes per-sample allele calls into a boolean presence table.
///
/// Columns are the sorted union of every non-missing call, so the result does
/// not depend on which locus column a call came from. Rows keep input order.
pub fn normalize_allele_table(rows: &[RawAlleleRow]) -> Result<AllelePresenceTable, AssocError> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.sample.as_str()) {
            return Err(AssocError::DuplicateSample(row.sample.clone()));
        }
    }

    let alleles: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.calls.iter().flatten())
        .map(String::as_str)
        .collect();

    let presence: Vec<Vec<bool>> = rows
        .iter()
        .map(|row| {
            let calls: HashSet<&str> = row.calls.iter().flatten().map(String::as_str).collect();
            alleles.iter().map(|allele| calls.contains(allele)).collect()
        })
        .collect();

    let samples = rows.iter().map(|row| row.sample.clone()).collect();
    let alleles = alleles.into_iter().map(str::to_string).collect();
    let table = AllelePresenceTable::new(samples, alleles, presence)
        .map_err(AssocError::DegenerateInput)?;
    log::debug!(
        "Normalized {} samples into {} allele columns",
        table.n_samples(),
        table.n_alleles()
    );
    Ok(table)
}
