//! Data models

pub mod outcome;
pub mod request;
