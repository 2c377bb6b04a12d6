//! Railway GraphQL API client

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::api::schema::{
    decode_created_domain, decode_created_service, decode_environments, decode_service_domains,
    ApiOutcome, Environment, GqlResponse, ServiceDomain,
};
use crate::errors::DeployError;

pub const DEFAULT_ENDPOINT: &str = "https://backboard.railway.app/graphql/v2";

const PROJECT_ENVIRONMENTS_QUERY: &str = r#"
query project($id: String!) {
  project(id: $id) {
    environments {
      edges { node { id name } }
    }
  }
}
"#;

const SERVICE_CREATE_MUTATION: &str = r#"
mutation serviceCreate($input: ServiceCreateInput!) {
  serviceCreate(input: $input) { id }
}
"#;

const SERVICE_DOMAIN_CREATE_MUTATION: &str = r#"
mutation serviceDomainCreate($input: ServiceDomainCreateInput!) {
  serviceDomainCreate(input: $input) { domain }
}
"#;

const SERVICE_DOMAINS_QUERY: &str = r#"
query domains($projectId: String!, $environmentId: String!) {
  domains(projectId: $projectId, environmentId: $environmentId) {
    serviceDomains { domain serviceId }
  }
}
"#;

/// Remote project API used by the multi-service orchestrator.
///
/// Exactly four operations; every one of them backs a best-effort step,
/// so callers log failures and degrade instead of aborting.
#[async_trait]
pub trait ProjectApi: Send + Sync {
    /// Environments of a project
    async fn project_environments(
        &self,
        project_id: &str,
        token: &SecretString,
    ) -> Result<Vec<Environment>, DeployError>;

    /// Create a named service under a project; `None` when the API
    /// accepted the call but returned no id
    async fn create_service(
        &self,
        project_id: &str,
        name: &str,
        token: &SecretString,
    ) -> Result<Option<String>, DeployError>;

    /// Create a domain for a service in an environment
    async fn create_service_domain(
        &self,
        service_id: &str,
        environment_id: &str,
        token: &SecretString,
    ) -> Result<Option<String>, DeployError>;

    /// Existing domains of a project, used as a fallback when creation
    /// was ambiguous
    async fn service_domains(
        &self,
        project_id: &str,
        environment_id: &str,
        token: &SecretString,
    ) -> Result<Vec<ServiceDomain>, DeployError>;
}

/// Production client against the Railway GraphQL endpoint
pub struct RailwayApi {
    client: reqwest::Client,
    endpoint: String,
}

impl RailwayApi {
    pub fn new() -> Result<Self, DeployError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// POST one GraphQL document and collapse the response envelope
    async fn call(
        &self,
        query: &str,
        variables: Value,
        token: &SecretString,
    ) -> Result<ApiOutcome, DeployError> {
        debug!("POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            )
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("GraphQL call failed: {} - {}", status, body);
            return Err(DeployError::Api(format!("{}: {}", status, body)));
        }

        let envelope: GqlResponse = response.json().await?;
        Ok(envelope.outcome())
    }

    fn data(outcome: ApiOutcome, context: &str) -> Result<Option<Value>, DeployError> {
        match outcome {
            ApiOutcome::Data(data) => Ok(Some(data)),
            ApiOutcome::Empty => Ok(None),
            ApiOutcome::Errors(messages) => Err(DeployError::Api(format!(
                "{}: {}",
                context,
                messages.join("; ")
            ))),
        }
    }
}

#[async_trait]
impl ProjectApi for RailwayApi {
    async fn project_environments(
        &self,
        project_id: &str,
        token: &SecretString,
    ) -> Result<Vec<Environment>, DeployError> {
        let outcome = self
            .call(PROJECT_ENVIRONMENTS_QUERY, json!({ "id": project_id }), token)
            .await?;

        Ok(Self::data(outcome, "project query")?
            .map(|data| decode_environments(&data))
            .unwrap_or_default())
    }

    async fn create_service(
        &self,
        project_id: &str,
        name: &str,
        token: &SecretString,
    ) -> Result<Option<String>, DeployError> {
        let variables = json!({ "input": { "projectId": project_id, "name": name } });
        let outcome = self.call(SERVICE_CREATE_MUTATION, variables, token).await?;

        Ok(Self::data(outcome, "serviceCreate")?.and_then(|data| decode_created_service(&data)))
    }

    async fn create_service_domain(
        &self,
        service_id: &str,
        environment_id: &str,
        token: &SecretString,
    ) -> Result<Option<String>, DeployError> {
        let variables = json!({
            "input": { "serviceId": service_id, "environmentId": environment_id }
        });
        let outcome = self
            .call(SERVICE_DOMAIN_CREATE_MUTATION, variables, token)
            .await?;

        Ok(Self::data(outcome, "serviceDomainCreate")?
            .and_then(|data| decode_created_domain(&data)))
    }

    async fn service_domains(
        &self,
        project_id: &str,
        environment_id: &str,
        token: &SecretString,
    ) -> Result<Vec<ServiceDomain>, DeployError> {
        let variables = json!({ "projectId": project_id, "environmentId": environment_id });
        let outcome = self.call(SERVICE_DOMAINS_QUERY, variables, token).await?;

        Ok(Self::data(outcome, "domains query")?
            .map(|data| decode_service_domains(&data))
            .unwrap_or_default())
    }
}
