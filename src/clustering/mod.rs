mod contingency;
mod quality;

pub use contingency::{
    conditional_entropies, contingency_matrix, entropy, ContingencyMatrix, Entropies,
};
pub use quality::compression_score;
