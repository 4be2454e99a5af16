pub mod associate;
pub mod evaluate;
