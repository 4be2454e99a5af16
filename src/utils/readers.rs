use super::Result;
use crate::association::{ClonotypeRecord, ClusterLabel};
use crate::hla::RawAlleleRow;
use std::path::Path;

/// Cell values read as missing, matching the markers pandas treats as NA.
const MISSING_MARKERS: [&str; 12] = [
    "", "NA", "NaN", "nan", "-nan", "None", "NULL", "null", "N/A", "n/a", "<NA>", "#N/A",
];

pub fn parse_optional_cell(value: &str) -> Option<String> {
    let value = value.trim();
    if MISSING_MARKERS.contains(&value) {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_count(value: &str) -> std::result::Result<u64, String> {
    if let Ok(count) = value.parse::<u64>() {
        return Ok(count);
    }
    match value.parse::<f64>() {
        Ok(count) if count >= 0.0 && count.fract() == 0.0 => Ok(count as u64),
        _ => Err(format!("Invalid clonal count: {}", value)),
    }
}

fn open_csv(path: &Path) -> Result<(csv::Reader<std::fs::File>, csv::StringRecord)> {
    let mut reader =
        csv::Reader::from_path(path).map_err(|e| format!("File {}: {}", path.display(), e))?;
    let headers = reader
        .headers()
        .map_err(|e| format!("File {}: {}", path.display(), e))?
        .clone();
    Ok((reader, headers))
}

fn column_index(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| format!("Missing column '{}' in {}", name, path.display()))
}

/// Reads a cluster assignment table.
///
/// Required columns are `clonotype`, `cluster` and the sample column; an
/// optional `clonal_count` column carries read counts. An empty or NA
/// `cluster` cell marks an unclustered clonotype.
pub fn read_cluster_table(path: &Path, sample_column: &str) -> Result<Vec<ClonotypeRecord>> {
    let (mut reader, headers) = open_csv(path)?;
    let clonotype_idx = column_index(&headers, "clonotype", path)?;
    let cluster_idx = column_index(&headers, "cluster", path)?;
    let sample_idx = column_index(&headers, sample_column, path)?;
    let count_idx = headers.iter().position(|h| h == "clonal_count");

    let mut records = Vec::new();
    for (row_number, row) in reader.records().enumerate() {
        let row =
            row.map_err(|e| format!("File {} row {}: {}", path.display(), row_number + 1, e))?;
        let field = |idx: usize| row.get(idx).unwrap_or("");

        let sample = parse_optional_cell(field(sample_idx)).ok_or(format!(
            "Missing sample id in {} at row {}",
            path.display(),
            row_number + 1
        ))?;
        let clonal_count = match count_idx.and_then(|idx| parse_optional_cell(field(idx))) {
            Some(value) => Some(parse_count(&value).map_err(|e| {
                format!("File {} row {}: {}", path.display(), row_number + 1, e)
            })?),
            None => None,
        };

        records.push(ClonotypeRecord {
            clonotype: field(clonotype_idx).to_string(),
            cluster: parse_optional_cell(field(cluster_idx)).map(|v| ClusterLabel::parse(&v)),
            sample,
            clonal_count,
        });
    }
    log::debug!("Read {} clonotype records from {}", records.len(), path.display());
    Ok(records)
}

/// Reads a raw HLA table: the first column is the sample id, every other
/// column holds allele calls.
pub fn read_hla_table(path: &Path) -> Result<Vec<RawAlleleRow>> {
    let (mut reader, headers) = open_csv(path)?;
    if headers.is_empty() {
        return Err(format!("HLA table {} has no columns", path.display()));
    }

    let mut rows = Vec::new();
    for (row_number, row) in reader.records().enumerate() {
        let row =
            row.map_err(|e| format!("File {} row {}: {}", path.display(), row_number + 1, e))?;
        let sample = row.get(0).map(str::trim).unwrap_or_default().to_string();
        if sample.is_empty() {
            return Err(format!(
                "Missing sample id in {} at row {}",
                path.display(),
                row_number + 1
            ));
        }
        let calls = row.iter().skip(1).map(parse_optional_cell).collect();
        rows.push(RawAlleleRow { sample, calls });
    }
    log::debug!("Read {} HLA rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Reads two label columns for clustering evaluation.
pub fn read_label_table(
    path: &Path,
    true_column: &str,
    pred_column: &str,
) -> Result<(Vec<String>, Vec<String>)> {
    let (mut reader, headers) = open_csv(path)?;
    let true_idx = column_index(&headers, true_column, path)?;
    let pred_idx = column_index(&headers, pred_column, path)?;

    let mut labels_true = Vec::new();
    let mut labels_pred = Vec::new();
    for (row_number, row) in reader.records().enumerate() {
        let row =
            row.map_err(|e| format!("File {} row {}: {}", path.display(), row_number + 1, e))?;
        labels_true.push(row.get(true_idx).unwrap_or("").to_string());
        labels_pred.push(row.get(pred_idx).unwrap_or("").to_string());
    }
    Ok((labels_true, labels_pred))
}
