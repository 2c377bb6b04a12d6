//! Deployment service facade.
//!
//! Owns the resolved CLI paths and cached availability (established by
//! [`DeploymentService::initialize`]), routes deploy requests to the
//! provider orchestrators, and answers provider-selection queries.
//! Explicitly constructed and passed by handle; there is no module-level
//! instance.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::api::client::{ProjectApi, RailwayApi};
use crate::cli::locate::{CliLocator, Invocation, PackagingMode};
use crate::deploy::netlify::NetlifyDeployer;
use crate::deploy::railway::RailwayDeployer;
use crate::errors::DeployError;
use crate::models::outcome::CliAvailability;
use crate::models::request::{DeploymentRequest, DeploymentResult, ProgressSink, Provider};
use crate::process::runner::{CommandRunner, ProcessRunner, RunOptions};

/// Upper bound on a `--version` probe; the deploy commands themselves
/// run without a timeout and rely on the subprocess's own exit behavior.
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const PROVIDERS: [Provider; 2] = [Provider::Railway, Provider::Netlify];

pub struct DeploymentService {
    runner: Arc<dyn CommandRunner>,
    api: Arc<dyn ProjectApi>,
    locator: CliLocator,
    invocations: HashMap<Provider, Invocation>,
    availability: HashMap<Provider, CliAvailability>,
}

impl DeploymentService {
    pub fn new(mode: PackagingMode) -> Result<Self, DeployError> {
        Ok(Self::with_parts(
            Arc::new(ProcessRunner),
            Arc::new(RailwayApi::new()?),
            CliLocator::new(mode),
        ))
    }

    /// Dependency-injected constructor; all mutable state lives on the
    /// instance
    pub fn with_parts(
        runner: Arc<dyn CommandRunner>,
        api: Arc<dyn ProjectApi>,
        locator: CliLocator,
    ) -> Self {
        Self {
            runner,
            api,
            locator,
            invocations: HashMap::new(),
            availability: HashMap::new(),
        }
    }

    /// Locate both provider CLIs and probe their versions. The result is
    /// cached until the next call.
    pub async fn initialize(&mut self) {
        let probes = PROVIDERS.map(|provider| self.probe(provider));
        let results = futures::future::join_all(probes).await;

        self.invocations.clear();
        self.availability.clear();
        for (provider, (invocation, availability)) in PROVIDERS.into_iter().zip(results) {
            info!(
                "{} CLI available: {} ({:?})",
                provider, availability.available, availability.version
            );
            if let Some(invocation) = invocation {
                self.invocations.insert(provider, invocation);
            }
            self.availability.insert(provider, availability);
        }
    }

    async fn probe(&self, provider: Provider) -> (Option<Invocation>, CliAvailability) {
        let Some(invocation) = self.locator.locate(provider) else {
            return (
                None,
                CliAvailability::unavailable(format!("{} CLI not found", provider)),
            );
        };

        let sink: ProgressSink = Arc::new(|_line: &str| {});
        let mut args = invocation.leading_args.clone();
        args.push("--version".to_string());
        let options = RunOptions::in_dir(".");
        let run = self
            .runner
            .run(&invocation.program, &args, &options, &sink);

        let availability = match tokio::time::timeout(VERSION_PROBE_TIMEOUT, run).await {
            Ok(outcome) if outcome.success => CliAvailability {
                available: true,
                resolved_path: Some(invocation.program.clone()),
                version: outcome.stdout.lines().next().map(|l| l.trim().to_string()),
                error: None,
            },
            Ok(outcome) => CliAvailability {
                available: false,
                resolved_path: Some(invocation.program.clone()),
                version: None,
                error: Some(outcome.error_message().to_string()),
            },
            Err(_) => CliAvailability {
                available: false,
                resolved_path: Some(invocation.program.clone()),
                version: None,
                error: Some("Version probe timed out".to_string()),
            },
        };
        (Some(invocation), availability)
    }

    pub fn availability(&self, provider: Provider) -> Option<&CliAvailability> {
        self.availability.get(&provider)
    }

    pub fn is_available(&self, provider: Provider) -> bool {
        self.availability
            .get(&provider)
            .map(|a| a.available)
            .unwrap_or(false)
    }

    /// Run one deployment to completion. Never panics or rejects; the
    /// returned record is the single source of truth for success or
    /// failure, decoupled from the progress narrative.
    pub async fn deploy(&self, request: &DeploymentRequest) -> DeploymentResult {
        if !self.is_available(request.provider) {
            return DeploymentResult::failed(
                DeployError::CliUnavailable(request.provider.display_name().to_string())
                    .to_string(),
            );
        }
        let Some(invocation) = self.invocations.get(&request.provider) else {
            return DeploymentResult::failed(
                DeployError::CliUnavailable(request.provider.display_name().to_string())
                    .to_string(),
            );
        };

        match request.provider {
            Provider::Netlify => {
                NetlifyDeployer::new(self.runner.clone(), invocation.clone())
                    .deploy(request)
                    .await
            }
            Provider::Railway => {
                RailwayDeployer::new(self.runner.clone(), self.api.clone(), invocation.clone())
                    .deploy(request)
                    .await
            }
        }
    }

    /// First provider the template needs that the user has connected and
    /// whose CLI is available. Deterministic by template order; no
    /// ranking heuristic.
    pub fn select_provider(
        &self,
        template_services: &[Provider],
        connected_services: &[Provider],
    ) -> Option<Provider> {
        template_services
            .iter()
            .copied()
            .find(|provider| connected_services.contains(provider) && self.is_available(*provider))
    }
}
