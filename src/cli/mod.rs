//! Provider CLI discovery and environment construction

pub mod env;
pub mod locate;
