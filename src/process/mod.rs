//! Subprocess execution

pub mod prompt;
pub mod runner;
