//! Defines the `CsvReportWriter` struct used for every tabular report of an
//! association run.
//!

use crate::association::{AssociationResult, ClusterAssignment};
use crate::utils::Result;
use crate::workflows::{RunSummary, SignificantClonotype};
use std::fs::File;

/// Association columns shared by every association-bearing report.
const ASSOCIATION_COLUMNS: [&str; 7] = [
    "cluster",
    "hla",
    "count_allele",
    "total_allele",
    "count_other",
    "total_other",
    "pvalue",
];

/// Which association columns to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationLayout {
    /// All tested pairs with the adjusted p-value and the significance flag.
    Full,
    /// Significant pairs only, without the (always true) flag.
    Significant,
}

/// Structure for writing CSV reports.
pub struct CsvReportWriter {
    /// The underlying CSV writer.
    writer: csv::Writer<File>,
    /// Path of the report, kept for error messages.
    path: String,
}

impl CsvReportWriter {
    /// Constructs a new `CsvReportWriter` instance.
    ///
    /// # Arguments
    /// * `output_path` - Path of the output CSV file.
    ///
    /// # Returns
    /// Returns a `Result` with either a new `CsvReportWriter` instance or an error message.
    pub fn new(output_path: &str) -> Result<CsvReportWriter> {
        let writer = csv::Writer::from_path(output_path)
            .map_err(|e| format!("Invalid CSV output path {}: {}", output_path, e))?;
        Ok(CsvReportWriter {
            writer,
            path: output_path.to_string(),
        })
    }

    fn write_row<I, T>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(row)
            .map_err(|e| format!("Failed to write {}: {}", self.path, e))
    }

    fn finish(mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| format!("Failed to flush {}: {}", self.path, e))
    }

    /// Writes association results.
    ///
    /// # Arguments
    /// * `results` - Association results in batch order.
    /// * `layout` - `Full` writes every result with `pvalue_adjusted` and
    ///   `significant`; `Significant` writes significant results only.
    pub fn write_associations(
        mut self,
        results: &[AssociationResult],
        layout: AssociationLayout,
    ) -> Result<()> {
        let mut header = ASSOCIATION_COLUMNS.to_vec();
        match layout {
            AssociationLayout::Full => header.extend(["pvalue_adjusted", "odds_ratio", "significant"]),
            AssociationLayout::Significant => header.push("odds_ratio"),
        }
        self.write_row(&header)?;

        for result in results {
            if layout == AssociationLayout::Significant && !result.significant {
                continue;
            }
            let mut row = association_fields(result);
            if layout == AssociationLayout::Full {
                row.push(result.pvalue_adjusted.to_string());
            }
            row.push(result.odds_ratio.to_string());
            if layout == AssociationLayout::Full {
                row.push(result.significant.to_string());
            }
            self.write_row(&row)?;
        }
        self.finish()
    }

    /// Writes the clonotypes of significant clusters joined with their
    /// association.
    ///
    /// # Arguments
    /// * `clusters` - The assignment the clonotype indices point into.
    /// * `clonotypes` - Significant clonotypes in report order.
    pub fn write_clonotypes(
        mut self,
        clusters: &ClusterAssignment,
        clonotypes: &[SignificantClonotype],
    ) -> Result<()> {
        let mut header = vec!["clonotype", "sample", "clonal_count"];
        header.extend(ASSOCIATION_COLUMNS);
        header.push("odds_ratio");
        self.write_row(&header)?;

        for clonotype in clonotypes {
            let record = clonotype.record(clusters);
            let mut row = vec![
                record.clonotype.clone(),
                record.sample.clone(),
                record
                    .clonal_count
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            ];
            row.extend(association_fields(&clonotype.association));
            row.push(clonotype.association.odds_ratio.to_string());
            self.write_row(&row)?;
        }
        self.finish()
    }

    /// Writes the two-column run summary.
    pub fn write_stats(mut self, summary: &RunSummary) -> Result<()> {
        self.write_row(["statistic", "value"])?;
        for (key, value) in summary.rows() {
            self.write_row([key, value.as_str()])?;
        }
        self.finish()
    }
}

fn association_fields(result: &AssociationResult) -> Vec<String> {
    vec![
        result.cluster.to_string(),
        result.hla.clone(),
        result.count_allele.to_string(),
        result.total_allele.to_string(),
        result.count_other.to_string(),
        result.total_other.to_string(),
        result.pvalue.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::ClusterLabel;
    use std::fs;
    use tempfile::tempdir;

    fn results() -> Vec<AssociationResult> {
        let hit = AssociationResult {
            cluster: ClusterLabel::Id(1),
            hla: "A*02:01".to_string(),
            count_allele: 5,
            total_allele: 5,
            count_other: 0,
            total_other: 5,
            pvalue: 0.25,
            pvalue_adjusted: 0.5,
            odds_ratio: f64::INFINITY,
            significant: true,
        };
        let miss = AssociationResult {
            cluster: ClusterLabel::Id(2),
            count_allele: 0,
            pvalue: 1.0,
            pvalue_adjusted: 1.0,
            odds_ratio: 0.0,
            significant: false,
            ..hit.clone()
        };
        vec![hit, miss]
    }

    #[test]
    fn full_layout_lists_every_pair() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.associations.csv");
        let path = path.to_str().unwrap();
        CsvReportWriter::new(path)
            .unwrap()
            .write_associations(&results(), AssociationLayout::Full)
            .unwrap();

        let contents = fs::read_to_string(path).unwrap();
        let lines = contents.lines().collect::<Vec<_>>();
        assert_eq!(
            lines[0],
            "cluster,hla,count_allele,total_allele,count_other,total_other,pvalue,pvalue_adjusted,odds_ratio,significant"
        );
        assert_eq!(lines[1], "1,A*02:01,5,5,0,5,0.25,0.5,inf,true");
        assert_eq!(lines[2], "2,A*02:01,0,5,0,5,1,1,0,false");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn significant_layout_drops_flag_and_misses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.significant.csv");
        let path = path.to_str().unwrap();
        CsvReportWriter::new(path)
            .unwrap()
            .write_associations(&results(), AssociationLayout::Significant)
            .unwrap();

        let contents = fs::read_to_string(path).unwrap();
        let lines = contents.lines().collect::<Vec<_>>();
        assert_eq!(
            lines[0],
            "cluster,hla,count_allele,total_allele,count_other,total_other,pvalue,odds_ratio"
        );
        assert_eq!(lines[1], "1,A*02:01,5,5,0,5,0.25,inf");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn invalid_path_err() {
        assert!(CsvReportWriter::new("/nonexistent/dir/out.csv").is_err());
    }
}
