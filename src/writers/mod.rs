mod write_csv;

pub use write_csv::{AssociationLayout, CsvReportWriter};
