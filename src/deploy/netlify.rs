//! Single-target deploy orchestration (Netlify-style CLI).
//!
//! Strictly sequential: Build -> ResolveSite -> SetEnvVars -> Deploy ->
//! ParseUrl. The build and deploy steps are hard failures; env-var
//! setting and id parsing are best-effort.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use crate::cli::env::build_environment;
use crate::cli::locate::Invocation;
use crate::errors::DeployError;
use crate::models::outcome::CommandOutcome;
use crate::models::request::{DeploymentRequest, DeploymentResult, Provider};
use crate::parse;
use crate::process::prompt::PromptPolicy;
use crate::process::runner::{CommandRunner, RunOptions};
use crate::utils::{sanitize_site_name, timestamped};

/// Conventional build output directories, probed in order
const BUILD_DIRS: [&str; 5] = ["dist", "frontend/dist", "build", "frontend/build", "out"];

pub struct NetlifyDeployer {
    runner: Arc<dyn CommandRunner>,
    cli: Invocation,
}

impl NetlifyDeployer {
    pub fn new(runner: Arc<dyn CommandRunner>, cli: Invocation) -> Self {
        Self { runner, cli }
    }

    /// Run the whole flow; errors are folded into the result record
    pub async fn deploy(&self, request: &DeploymentRequest) -> DeploymentResult {
        match self.deploy_inner(request).await {
            Ok(result) => result,
            Err(e) => DeploymentResult::failed(e.to_string()),
        }
    }

    async fn deploy_inner(
        &self,
        request: &DeploymentRequest,
    ) -> Result<DeploymentResult, DeployError> {
        let project = request.project_path.as_path();

        request.emit("Building project...");
        // The local build sees the ambient environment only; deployment
        // secrets stay out of it.
        let build = self
            .runner
            .run(
                Path::new("npm"),
                &to_args(["run", "build"]),
                &RunOptions::in_dir(project),
                &request.progress,
            )
            .await;
        if !build.success {
            return Err(DeployError::Build(build.error_message().to_string()));
        }

        let build_dir = find_build_dir(project).ok_or_else(|| {
            DeployError::Deploy(format!(
                "No build output directory found (tried {})",
                BUILD_DIRS.join(", ")
            ))
        })?;
        request.emit(&format!("Using build directory {}", build_dir.display()));

        let provider_env = build_environment(Provider::Netlify, &request.auth_token);

        let site_id = match &request.existing_id {
            Some(id) => {
                request.emit(&format!("Reusing existing site {}", id));
                Some(id.clone())
            }
            None => self.create_site(request, &provider_env).await?,
        };

        if let Some(id) = &site_id {
            if let Err(e) = write_site_state(project, id).await {
                warn!("Failed to persist site state: {}", e);
            }
        }

        self.set_env_vars(request, &provider_env, site_id.as_deref())
            .await;

        request.emit("Deploying to Netlify...");
        let dir_arg = build_dir.to_string_lossy().to_string();
        let mut deploy_args =
            self.cli_args(["deploy", "--dir", dir_arg.as_str(), "--prod", "--no-build"]);
        if let Some(id) = &site_id {
            deploy_args.push("--site".to_string());
            deploy_args.push(id.clone());
        }
        let deploy = self
            .runner
            .run(
                &self.cli.program,
                &deploy_args,
                &RunOptions::in_dir(project).with_env(provider_env.clone()),
                &request.progress,
            )
            .await;
        if !deploy.success {
            return Err(DeployError::Deploy(deploy.error_message().to_string()));
        }

        let url = parse::extract_netlify_url(&deploy.stdout);
        if let Some(url) = &url {
            request.emit(&format!("Deployed: {}", url));
        }

        Ok(DeploymentResult::succeeded(url, site_id))
    }

    /// Create a site, retrying once with a timestamp suffix on failure
    /// (commonly a name collision). A missing id in the output is not
    /// fatal; later steps just omit the `--site` flag.
    async fn create_site(
        &self,
        request: &DeploymentRequest,
        env: &HashMap<String, String>,
    ) -> Result<Option<String>, DeployError> {
        let desired = sanitize_site_name(&request.project_name);
        request.emit(&format!("Creating site {}...", desired));

        let first = self.run_site_create(request, env, &desired).await;
        let outcome = if first.success {
            first
        } else {
            let retry_name = timestamped(&desired);
            request.emit(&format!("Site creation failed, retrying as {}...", retry_name));
            let second = self.run_site_create(request, env, &retry_name).await;
            if !second.success {
                return Err(DeployError::Deploy(format!(
                    "Site creation failed: {}",
                    second.error_message()
                )));
            }
            second
        };

        let site_id = parse::extract_labeled(&outcome.stdout, "Site ID:")
            .or_else(|| parse::extract_uuid(&outcome.stdout));
        if site_id.is_none() {
            warn!("Site created but no id was found in the CLI output");
        }
        Ok(site_id)
    }

    async fn run_site_create(
        &self,
        request: &DeploymentRequest,
        env: &HashMap<String, String>,
        name: &str,
    ) -> CommandOutcome {
        // sites:create asks which account/team owns the site; the blank
        // answer takes the default.
        let options = RunOptions::in_dir(&request.project_path)
            .with_env(env.clone())
            .with_prompt(PromptPolicy::accept_default());
        self.runner
            .run(
                &self.cli.program,
                &self.cli_args(["sites:create", "--name", name]),
                &options,
                &request.progress,
            )
            .await
    }

    /// One env:set per non-blank value; failures are logged, not fatal,
    /// and not retried
    async fn set_env_vars(
        &self,
        request: &DeploymentRequest,
        env: &HashMap<String, String>,
        site_id: Option<&str>,
    ) {
        for (key, value) in &request.env_vars {
            if value.trim().is_empty() {
                continue;
            }
            request.emit(&format!("Setting {}...", key));
            let mut args = self.cli_args(["env:set", key.as_str(), value.as_str()]);
            if let Some(id) = site_id {
                args.push("--site".to_string());
                args.push(id.to_string());
            }
            let outcome = self
                .runner
                .run(
                    &self.cli.program,
                    &args,
                    &RunOptions::in_dir(&request.project_path).with_env(env.clone()),
                    &request.progress,
                )
                .await;
            if !outcome.success {
                warn!("Failed to set {}: {}", key, outcome.error_message());
                request.emit(&format!("Warning: failed to set {}", key));
            }
        }
    }

    fn cli_args<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut full = self.cli.leading_args.clone();
        full.extend(args.into_iter().map(str::to_string));
        full
    }
}

fn to_args<'a>(args: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    args.into_iter().map(str::to_string).collect()
}

fn find_build_dir(project: &Path) -> Option<PathBuf> {
    BUILD_DIRS
        .iter()
        .map(|dir| project.join(dir))
        .find(|path| path.is_dir())
}

/// Persist the site id for future redeploys. Not a secret; the only
/// state this service ever writes to disk.
async fn write_site_state(project: &Path, site_id: &str) -> Result<(), DeployError> {
    let dir = project.join(".netlify");
    tokio::fs::create_dir_all(&dir).await?;
    let body = serde_json::to_string_pretty(&json!({ "siteId": site_id }))?;
    tokio::fs::write(dir.join("state.json"), body).await?;
    Ok(())
}

/// Read back a previously persisted site id, if any
pub async fn read_site_state(project: &Path) -> Option<String> {
    let raw = tokio::fs::read_to_string(project.join(".netlify/state.json"))
        .await
        .ok()?;
    let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
    value
        .get("siteId")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}
