//! Subprocess and CLI status models

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Outcome of a single subprocess run. Ephemeral; never persisted.
#[derive(Debug, Clone, Default)]
pub struct CommandOutcome {
    /// True when the process exited with code 0
    pub success: bool,

    /// Full captured stdout
    pub stdout: String,

    /// Stderr or exit-code-derived message on failure
    pub error: Option<String>,
}

impl CommandOutcome {
    pub fn spawn_failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            error: Some(message.into()),
        }
    }

    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Unknown error")
    }
}

/// Availability of one provider CLI, probed at service initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliAvailability {
    pub available: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CliAvailability {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            resolved_path: None,
            version: None,
            error: Some(message.into()),
        }
    }
}
