//! Deployment request and result models

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Deployment provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Project/service oriented platform, deploys one or more services
    Railway,

    /// Static-site oriented platform, deploys a single build output
    Netlify,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Railway => "railway",
            Provider::Netlify => "netlify",
        }
    }

    /// Executable name of the provider CLI
    pub fn cli_name(&self) -> &'static str {
        self.as_str()
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Railway => "Railway",
            Provider::Netlify => "Netlify",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "railway" => Ok(Provider::Railway),
            "netlify" => Ok(Provider::Netlify),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

/// Sink receiving every progress line and raw CLI output line of a deploy
pub type ProgressSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Parameters for one deployment invocation. Immutable for its duration.
pub struct DeploymentRequest {
    pub provider: Provider,

    /// Absolute path to the project root
    pub project_path: PathBuf,

    /// Display name; slugified before reaching any provider
    pub project_name: String,

    pub auth_token: SecretString,

    /// Ordered name/value pairs; set-calls are issued in this order
    pub env_vars: Vec<(String, String)>,

    /// Site/project id from a previous deploy, for idempotent redeploys
    pub existing_id: Option<String>,

    pub progress: ProgressSink,
}

impl DeploymentRequest {
    /// Mirror one narrative line to both audiences: the diagnostic log
    /// and the caller's progress sink.
    pub fn emit(&self, line: &str) {
        tracing::info!(provider = self.provider.as_str(), "{}", line);
        (self.progress)(line);
    }
}

impl fmt::Debug for DeploymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentRequest")
            .field("provider", &self.provider)
            .field("project_path", &self.project_path)
            .field("project_name", &self.project_name)
            .field("env_vars", &self.env_vars.len())
            .field("existing_id", &self.existing_id)
            .finish()
    }
}

/// Final outcome of one deployment invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub success: bool,

    /// Public URL of the deployed site or frontend service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Provider-side resource id (site id or project id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_or_project_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentResult {
    pub fn succeeded(url: Option<String>, site_or_project_id: Option<String>) -> Self {
        Self {
            success: true,
            url,
            site_or_project_id,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            message
        };
        Self {
            success: false,
            url: None,
            site_or_project_id: None,
            error: Some(message),
        }
    }
}
