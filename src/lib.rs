pub mod association;
pub mod cli;
pub mod clustering;
pub mod commands;
pub mod hla;
pub mod utils;
pub mod workflows;
pub mod writers;
