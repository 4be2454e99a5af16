mod normalize;
mod table;

pub use normalize::{normalize_allele_table, RawAlleleRow};
pub use table::AllelePresenceTable;
