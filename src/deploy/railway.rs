//! Multi-service deploy orchestration (Railway-style CLI + project API).
//!
//! A project with both `backend/` and `frontend/` subtrees deploys as
//! two independent services with their URLs cross-wired into each
//! other's environment; anything else deploys as a single service.
//! Only project creation and the deploy steps themselves are hard
//! failures; every API-backed step degrades gracefully.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::client::ProjectApi;
use crate::api::schema::pick_environment;
use crate::cli::env::build_environment;
use crate::cli::locate::Invocation;
use crate::deploy::topology::ServiceTopology;
use crate::errors::DeployError;
use crate::models::outcome::CommandOutcome;
use crate::models::request::{DeploymentRequest, DeploymentResult, Provider};
use crate::parse;
use crate::process::prompt::PromptPolicy;
use crate::process::runner::{CommandRunner, RunOptions};
use crate::utils::sanitize_service_name;

/// Variable injected into the frontend with the backend's public URL
pub const BACKEND_URL_VAR: &str = "VITE_API_URL";

/// Variable injected into the backend with the frontend's public URL
pub const FRONTEND_URL_VAR: &str = "FRONTEND_URL";

/// Prefix marking frontend-only variables
pub const FRONTEND_VAR_PREFIX: &str = "VITE_";

/// A project with both subtrees deploys as two services
pub fn is_full_stack(project: &Path) -> bool {
    project.join("backend").is_dir() && project.join("frontend").is_dir()
}

pub struct RailwayDeployer {
    runner: Arc<dyn CommandRunner>,
    api: Arc<dyn ProjectApi>,
    cli: Invocation,
}

impl RailwayDeployer {
    pub fn new(runner: Arc<dyn CommandRunner>, api: Arc<dyn ProjectApi>, cli: Invocation) -> Self {
        Self { runner, api, cli }
    }

    /// Run the whole flow; errors are folded into the result record
    pub async fn deploy(&self, request: &DeploymentRequest) -> DeploymentResult {
        let result = if is_full_stack(&request.project_path) {
            self.deploy_full_stack(request).await
        } else {
            self.deploy_single_service(request).await
        };
        match result {
            Ok(result) => result,
            Err(e) => DeploymentResult::failed(e.to_string()),
        }
    }

    async fn deploy_single_service(
        &self,
        request: &DeploymentRequest,
    ) -> Result<DeploymentResult, DeployError> {
        let env = build_environment(Provider::Railway, &request.auth_token);
        let project_id = self.resolve_project(request, &env).await?;

        request.emit("Deploying service...");
        let up = self.run_up(request, &env, ".", None).await;
        if !up.success {
            return Err(DeployError::Deploy(up.error_message().to_string()));
        }

        let service_id = parse::extract_service_id(&up.stdout);
        let vars_set = match &service_id {
            Some(id) => {
                self.set_service_vars(request, &env, id, |_key| true).await
            }
            None => {
                warn!("No service id recovered from deploy output; skipping env vars");
                0
            }
        };

        if vars_set > 0 {
            if let Some(id) = &service_id {
                request.emit("Redeploying to pick up environment variables...");
                let redeploy = self.run_up(request, &env, ".", Some(id)).await;
                if !redeploy.success {
                    warn!("Redeploy failed: {}", redeploy.error_message());
                }
            }
        }

        let url = match &service_id {
            Some(id) => self.fetch_domain(request, &env, id).await,
            None => None,
        };

        Ok(DeploymentResult::succeeded(url, project_id))
    }

    async fn deploy_full_stack(
        &self,
        request: &DeploymentRequest,
    ) -> Result<DeploymentResult, DeployError> {
        request.emit("Full-stack project detected (backend/ + frontend/)");
        let env = build_environment(Provider::Railway, &request.auth_token);

        let mut topology =
            ServiceTopology::for_project(self.resolve_project(request, &env).await?);
        topology.environment_id = self.fetch_environment_id(request, &topology).await;

        // Backend first, so its URL exists by the time the frontend's
        // variables are written.
        topology.backend_service_id = self.precreate_service(request, &topology, "backend").await;
        let backend_up = self
            .run_up(request, &env, "backend", topology.backend_service_id.as_deref())
            .await;
        if !backend_up.success {
            return Err(DeployError::Deploy(format!(
                "Backend deploy failed: {}",
                backend_up.error_message()
            )));
        }
        if topology.backend_service_id.is_none() {
            topology.backend_service_id = parse::extract_service_id(&backend_up.stdout);
        }

        if let Some(id) = topology.backend_service_id.clone() {
            topology.backend_url = self.fetch_domain(request, &env, &id).await;
            if let Some(url) = &topology.backend_url {
                info!("Backend URL: {}", url);
                request.emit(&format!("Backend deployed at {}", url));
            }
            self.set_service_vars(request, &env, &id, |key| {
                !key.starts_with(FRONTEND_VAR_PREFIX)
            })
            .await;
        } else {
            warn!("No backend service id recovered; skipping backend domain and variables");
        }

        topology.frontend_service_id = self.precreate_service(request, &topology, "frontend").await;
        let frontend_up = self
            .run_up(request, &env, "frontend", topology.frontend_service_id.as_deref())
            .await;
        if !frontend_up.success {
            return Err(DeployError::Deploy(format!(
                "Frontend deploy failed: {}",
                frontend_up.error_message()
            )));
        }
        if topology.frontend_service_id.is_none() {
            topology.frontend_service_id = parse::extract_service_id(&frontend_up.stdout);
        }

        topology.frontend_url = self.resolve_frontend_domain(request, &topology).await;
        if let Some(url) = &topology.frontend_url {
            request.emit(&format!("Frontend deployed at {}", url));
        }

        self.cross_wire(request, &env, &topology).await;

        // Both services redeploy so they see the just-written variables;
        // there is no cheap way to detect that nothing changed.
        if let Some(id) = topology.backend_service_id.as_deref() {
            request.emit("Redeploying backend...");
            let redeploy = self.run_up(request, &env, "backend", Some(id)).await;
            if !redeploy.success {
                warn!("Backend redeploy failed: {}", redeploy.error_message());
            }
        }
        if let Some(id) = topology.frontend_service_id.as_deref() {
            request.emit("Redeploying frontend...");
            let redeploy = self.run_up(request, &env, "frontend", Some(id)).await;
            if !redeploy.success {
                warn!("Frontend redeploy failed: {}", redeploy.error_message());
            }
        }

        // The backend URL stays internal; callers get the frontend URL.
        Ok(DeploymentResult::succeeded(
            topology.frontend_url.clone(),
            topology.project_id.clone(),
        ))
    }

    /// Create the project unless an id was supplied. Command failure is
    /// fatal; a missing id in the output is tolerated (the directory is
    /// linked either way).
    async fn resolve_project(
        &self,
        request: &DeploymentRequest,
        env: &HashMap<String, String>,
    ) -> Result<Option<String>, DeployError> {
        if let Some(id) = &request.existing_id {
            request.emit(&format!("Reusing existing project {}", id));
            return Ok(Some(id.clone()));
        }

        let name = sanitize_service_name(&request.project_name);
        request.emit(&format!("Creating project {}...", name));
        let options = RunOptions::in_dir(&request.project_path)
            .with_env(env.clone())
            .with_prompt(PromptPolicy::accept_default());
        let outcome = self
            .runner
            .run(
                &self.cli.program,
                &self.cli_args(["init", "--name", name.as_str()]),
                &options,
                &request.progress,
            )
            .await;
        if !outcome.success {
            return Err(DeployError::Deploy(format!(
                "Project creation failed: {}",
                outcome.error_message()
            )));
        }

        let project_id = parse::extract_uuid(&outcome.stdout);
        if project_id.is_none() {
            warn!("Project created but no id was found in the CLI output");
        }
        Ok(project_id)
    }

    /// `up` with the path as the upload root, so only that subtree ships
    async fn run_up(
        &self,
        request: &DeploymentRequest,
        env: &HashMap<String, String>,
        path: &str,
        service_id: Option<&str>,
    ) -> CommandOutcome {
        let mut args = self.cli_args(["up", path, "--path-as-root", "--detach"]);
        if let Some(id) = service_id {
            args.push("--service".to_string());
            args.push(id.to_string());
        }
        self.runner
            .run(
                &self.cli.program,
                &args,
                &self.run_options(request, env),
                &request.progress,
            )
            .await
    }

    /// Set every non-blank variable accepted by `filter` on a service.
    /// Best-effort per key; returns how many were set.
    async fn set_service_vars<F>(
        &self,
        request: &DeploymentRequest,
        env: &HashMap<String, String>,
        service_id: &str,
        filter: F,
    ) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let mut set = 0;
        for (key, value) in &request.env_vars {
            if value.trim().is_empty() || !filter(key) {
                continue;
            }
            if self.set_var(request, env, service_id, key, value).await {
                set += 1;
            }
        }
        set
    }

    async fn set_var(
        &self,
        request: &DeploymentRequest,
        env: &HashMap<String, String>,
        service_id: &str,
        key: &str,
        value: &str,
    ) -> bool {
        request.emit(&format!("Setting {} on service {}...", key, service_id));
        let assignment = format!("{}={}", key, value);
        let args = self.cli_args([
            "variables",
            "--set",
            assignment.as_str(),
            "--service",
            service_id,
        ]);
        let outcome = self
            .runner
            .run(
                &self.cli.program,
                &args,
                &self.run_options(request, env),
                &request.progress,
            )
            .await;
        if !outcome.success {
            warn!("Failed to set {}: {}", key, outcome.error_message());
            request.emit(&format!("Warning: failed to set {}", key));
        }
        outcome.success
    }

    /// Ask the CLI for the service's public domain; best-effort
    async fn fetch_domain(
        &self,
        request: &DeploymentRequest,
        env: &HashMap<String, String>,
        service_id: &str,
    ) -> Option<String> {
        let outcome = self
            .runner
            .run(
                &self.cli.program,
                &self.cli_args(["domain", "--service", service_id]),
                &self.run_options(request, env),
                &request.progress,
            )
            .await;
        if !outcome.success {
            warn!("Domain lookup failed: {}", outcome.error_message());
            return None;
        }
        parse::extract_url(&outcome.stdout)
    }

    async fn fetch_environment_id(
        &self,
        request: &DeploymentRequest,
        topology: &ServiceTopology,
    ) -> Option<String> {
        let project_id = topology.project_id.as_deref()?;
        match self
            .api
            .project_environments(project_id, &request.auth_token)
            .await
        {
            Ok(environments) => {
                let picked = pick_environment(&environments).map(|e| e.id.clone());
                if picked.is_none() {
                    warn!(
                        "Project {} has no environments; domain creation will be skipped",
                        project_id
                    );
                }
                picked
            }
            Err(e) => {
                warn!("Failed to fetch environments: {}", e);
                None
            }
        }
    }

    /// Pre-create a service through the API so it gets a clean display
    /// name; the deploy step creates one implicitly if this fails
    async fn precreate_service(
        &self,
        request: &DeploymentRequest,
        topology: &ServiceTopology,
        role: &str,
    ) -> Option<String> {
        let project_id = topology.project_id.as_deref()?;
        let name = format!("{}-{}", sanitize_service_name(&request.project_name), role);
        match self
            .api
            .create_service(project_id, &name, &request.auth_token)
            .await
        {
            Ok(Some(id)) => {
                request.emit(&format!("Created {} service {}", role, id));
                Some(id)
            }
            Ok(None) => {
                warn!("{} service creation returned no id", role);
                None
            }
            Err(e) => {
                warn!("Failed to pre-create {} service: {}", role, e);
                None
            }
        }
    }

    /// Prefer creating a new domain through the API; fall back to
    /// querying what already exists and matching by service id
    async fn resolve_frontend_domain(
        &self,
        request: &DeploymentRequest,
        topology: &ServiceTopology,
    ) -> Option<String> {
        let service_id = topology.frontend_service_id.as_deref()?;
        let environment_id = topology.environment_id.as_deref()?;

        match self
            .api
            .create_service_domain(service_id, environment_id, &request.auth_token)
            .await
        {
            Ok(Some(domain)) => return Some(normalize_domain(&domain)),
            Ok(None) => {}
            Err(e) => warn!("Domain creation failed: {}", e),
        }

        let project_id = topology.project_id.as_deref()?;
        match self
            .api
            .service_domains(project_id, environment_id, &request.auth_token)
            .await
        {
            Ok(domains) => domains
                .into_iter()
                .find(|d| d.service_id == service_id)
                .map(|d| normalize_domain(&d.domain)),
            Err(e) => {
                warn!("Domain lookup failed: {}", e);
                None
            }
        }
    }

    /// Inject each side's URL into the other. A wiring step runs only
    /// when the producing side's id and URL are both known; otherwise it
    /// is skipped without failing the deployment.
    async fn cross_wire(
        &self,
        request: &DeploymentRequest,
        env: &HashMap<String, String>,
        topology: &ServiceTopology,
    ) {
        if let Some(frontend_id) = topology.frontend_service_id.as_deref() {
            if topology.backend_wireable() {
                if let Some(backend_url) = topology.backend_url.as_deref() {
                    self.set_var(request, env, frontend_id, BACKEND_URL_VAR, backend_url)
                        .await;
                }
            }
            self.set_service_vars(request, env, frontend_id, |key| {
                key.starts_with(FRONTEND_VAR_PREFIX) && key != BACKEND_URL_VAR
            })
            .await;
        }

        if let Some(backend_id) = topology.backend_service_id.as_deref() {
            if topology.frontend_wireable() {
                if let Some(frontend_url) = topology.frontend_url.as_deref() {
                    self.set_var(request, env, backend_id, FRONTEND_URL_VAR, frontend_url)
                        .await;
                }
            }
        }
    }

    fn run_options(
        &self,
        request: &DeploymentRequest,
        env: &HashMap<String, String>,
    ) -> RunOptions {
        RunOptions::in_dir(&request.project_path).with_env(env.clone())
    }

    fn cli_args<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut full = self.cli.leading_args.clone();
        full.extend(args.into_iter().map(str::to_string));
        full
    }
}

fn normalize_domain(domain: &str) -> String {
    if domain.starts_with("https://") || domain.starts_with("http://") {
        domain.to_string()
    } else {
        format!("https://{}", domain)
    }
}
