//! shipwright — deployment orchestration for scaffolded web projects.
//!
//! Drives two provider CLIs (a Railway-style project CLI and a
//! Netlify-style site CLI) through multi-step deploy sequences, recovers
//! identifiers from their free-form text output, and coordinates with the
//! Railway GraphQL API to create and wire up multi-service deployments.

pub mod api;
pub mod cli;
pub mod deploy;
pub mod errors;
pub mod logs;
pub mod models;
pub mod parse;
pub mod process;
pub mod utils;

// Re-export primary types for convenience.
pub use deploy::service::DeploymentService;
pub use errors::DeployError;
pub use models::outcome::{CliAvailability, CommandOutcome};
pub use models::request::{DeploymentRequest, DeploymentResult, ProgressSink, Provider};
