//! Deployment orchestration

pub mod netlify;
pub mod railway;
pub mod service;
pub mod topology;
