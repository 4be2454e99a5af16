mod error;
mod io_utils;
mod readers;
mod test_method;
mod util;

pub use error::AssocError;
pub use io_utils::create_writer;
pub use readers::{parse_optional_cell, read_cluster_table, read_hla_table, read_label_table};
pub use test_method::{ClusteringMetric, NumericPolicy, TestMethod};
pub use util::{handle_error_and_exit, Result};
