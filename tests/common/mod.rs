//! Shared test doubles for the orchestration flows

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;

use shipwright::api::client::ProjectApi;
use shipwright::api::schema::{Environment, ServiceDomain};
use shipwright::errors::DeployError;
use shipwright::models::outcome::CommandOutcome;
use shipwright::models::request::{DeploymentRequest, ProgressSink, Provider};
use shipwright::process::runner::{CommandRunner, RunOptions};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl RecordedCall {
    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

type Matcher = Box<dyn Fn(&RecordedCall) -> bool + Send + Sync>;

struct Rule {
    matcher: Matcher,
    outcomes: VecDeque<CommandOutcome>,
}

/// Command runner that answers from scripted rules instead of spawning
/// processes. The first matching rule wins; a rule with several queued
/// outcomes pops one per call and keeps replaying the last. Unmatched
/// calls succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome of every call whose argument vector contains `arg`
    pub fn on_arg(&self, arg: &str, outcome: CommandOutcome) {
        let arg = arg.to_string();
        self.push_rule(
            Box::new(move |call| call.has_arg(&arg)),
            vec![outcome],
        );
    }

    /// Like `on_arg`, but with one outcome per successive call
    pub fn on_arg_seq(&self, arg: &str, outcomes: Vec<CommandOutcome>) {
        let arg = arg.to_string();
        self.push_rule(Box::new(move |call| call.has_arg(&arg)), outcomes);
    }

    /// Script the outcome of every call to a program with this file name
    pub fn on_program(&self, name: &str, outcome: CommandOutcome) {
        let name = name.to_string();
        self.push_rule(
            Box::new(move |call| {
                call.program.file_name().map(|f| f == name.as_str()) == Some(true)
            }),
            vec![outcome],
        );
    }

    fn push_rule(&self, matcher: Matcher, outcomes: Vec<CommandOutcome>) {
        self.rules.lock().unwrap().push(Rule {
            matcher,
            outcomes: outcomes.into(),
        });
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_with_arg(&self, arg: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.has_arg(arg))
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        _options: &RunOptions,
        sink: &ProgressSink,
    ) -> CommandOutcome {
        let call = RecordedCall {
            program: program.to_path_buf(),
            args: args.to_vec(),
        };
        self.calls.lock().unwrap().push(call.clone());

        let outcome = {
            let mut rules = self.rules.lock().unwrap();
            match rules.iter_mut().find(|rule| (rule.matcher)(&call)) {
                Some(rule) if rule.outcomes.len() > 1 => {
                    rule.outcomes.pop_front().unwrap_or_default()
                }
                Some(rule) => rule.outcomes.front().cloned().unwrap_or_default(),
                None => ok(""),
            }
        };

        for line in outcome.stdout.lines() {
            sink(line);
        }
        outcome
    }
}

pub fn ok(stdout: &str) -> CommandOutcome {
    CommandOutcome {
        success: true,
        stdout: stdout.to_string(),
        error: None,
    }
}

pub fn fail(stderr: &str) -> CommandOutcome {
    CommandOutcome {
        success: false,
        stdout: String::new(),
        error: Some(stderr.to_string()),
    }
}

/// Project API double with canned responses
#[derive(Default)]
pub struct FakeApi {
    pub environments: Vec<Environment>,
    pub created_services: Mutex<VecDeque<Option<String>>>,
    pub created_domain: Option<String>,
    pub existing_domains: Vec<ServiceDomain>,
}

impl FakeApi {
    pub fn with_environment(id: &str, name: &str) -> Self {
        Self {
            environments: vec![Environment {
                id: id.to_string(),
                name: name.to_string(),
            }],
            ..Self::default()
        }
    }

    pub fn queue_service(&self, id: Option<&str>) {
        self.created_services
            .lock()
            .unwrap()
            .push_back(id.map(str::to_string));
    }
}

#[async_trait]
impl ProjectApi for FakeApi {
    async fn project_environments(
        &self,
        _project_id: &str,
        _token: &SecretString,
    ) -> Result<Vec<Environment>, DeployError> {
        Ok(self.environments.clone())
    }

    async fn create_service(
        &self,
        _project_id: &str,
        _name: &str,
        _token: &SecretString,
    ) -> Result<Option<String>, DeployError> {
        Ok(self
            .created_services
            .lock()
            .unwrap()
            .pop_front()
            .flatten())
    }

    async fn create_service_domain(
        &self,
        _service_id: &str,
        _environment_id: &str,
        _token: &SecretString,
    ) -> Result<Option<String>, DeployError> {
        Ok(self.created_domain.clone())
    }

    async fn service_domains(
        &self,
        _project_id: &str,
        _environment_id: &str,
        _token: &SecretString,
    ) -> Result<Vec<ServiceDomain>, DeployError> {
        Ok(self.existing_domains.clone())
    }
}

/// Request builder with sensible defaults for a scripted deploy
pub fn request(provider: Provider, project_path: &Path) -> DeploymentRequest {
    DeploymentRequest {
        provider,
        project_path: project_path.to_path_buf(),
        project_name: "My App".to_string(),
        auth_token: SecretString::from("test-token"),
        env_vars: Vec::new(),
        existing_id: None,
        progress: Arc::new(|_line: &str| {}),
    }
}
