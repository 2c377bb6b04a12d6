//! GraphQL response shapes, decoded once at the boundary.
//!
//! The API may return partial shapes on network or permission problems;
//! every field defaults instead of failing, and downstream code matches
//! on the closed [`ApiOutcome`] set instead of re-checking nulls.

use serde::Deserialize;
use serde_json::Value;

/// Top-level GraphQL envelope
#[derive(Debug, Deserialize)]
pub struct GqlResponse {
    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default)]
    pub errors: Vec<GqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GqlError {
    #[serde(default)]
    pub message: String,
}

impl GqlResponse {
    /// Collapse the envelope into the closed set of call outcomes
    pub fn outcome(self) -> ApiOutcome {
        if !self.errors.is_empty() {
            ApiOutcome::Errors(self.errors.into_iter().map(|e| e.message).collect())
        } else {
            match self.data {
                Some(data) if !data.is_null() => ApiOutcome::Data(data),
                _ => ApiOutcome::Empty,
            }
        }
    }
}

/// What one GraphQL call produced
#[derive(Debug)]
pub enum ApiOutcome {
    Data(Value),

    /// The request succeeded but carried no usable payload
    Empty,

    Errors(Vec<String>),
}

/// One project environment
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Environment {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,
}

/// Domain attached to a service in an environment
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServiceDomain {
    #[serde(default)]
    pub domain: String,

    #[serde(default, rename = "serviceId")]
    pub service_id: String,
}

/// Prefer the environment named "production", else the first one
pub fn pick_environment(environments: &[Environment]) -> Option<&Environment> {
    environments
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case("production"))
        .or_else(|| environments.first())
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    #[serde(default)]
    edges: Vec<Edge<T>>,
}

impl<T> Default for Connection<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    #[serde(default)]
    node: Option<T>,
}

/// Environments of a `project` query response
pub fn decode_environments(data: &Value) -> Vec<Environment> {
    #[derive(Debug, Deserialize)]
    struct Data {
        #[serde(default)]
        project: Option<Project>,
    }
    #[derive(Debug, Deserialize)]
    struct Project {
        #[serde(default)]
        environments: Connection<Environment>,
    }

    serde_json::from_value::<Data>(data.clone())
        .ok()
        .and_then(|d| d.project)
        .map(|p| {
            p.environments
                .edges
                .into_iter()
                .filter_map(|e| e.node)
                .collect()
        })
        .unwrap_or_default()
}

/// Service id of a `serviceCreate` mutation response
pub fn decode_created_service(data: &Value) -> Option<String> {
    #[derive(Debug, Deserialize)]
    struct Data {
        #[serde(default, rename = "serviceCreate")]
        service_create: Option<Created>,
    }
    #[derive(Debug, Deserialize)]
    struct Created {
        #[serde(default)]
        id: String,
    }

    serde_json::from_value::<Data>(data.clone())
        .ok()
        .and_then(|d| d.service_create)
        .map(|c| c.id)
        .filter(|id| !id.is_empty())
}

/// Domain of a `serviceDomainCreate` mutation response
pub fn decode_created_domain(data: &Value) -> Option<String> {
    #[derive(Debug, Deserialize)]
    struct Data {
        #[serde(default, rename = "serviceDomainCreate")]
        domain_create: Option<Created>,
    }
    #[derive(Debug, Deserialize)]
    struct Created {
        #[serde(default)]
        domain: String,
    }

    serde_json::from_value::<Data>(data.clone())
        .ok()
        .and_then(|d| d.domain_create)
        .map(|c| c.domain)
        .filter(|domain| !domain.is_empty())
}

/// Service domains of a `domains` query response
pub fn decode_service_domains(data: &Value) -> Vec<ServiceDomain> {
    #[derive(Debug, Deserialize)]
    struct Data {
        #[serde(default)]
        domains: Option<Domains>,
    }
    #[derive(Debug, Deserialize)]
    struct Domains {
        #[serde(default, rename = "serviceDomains")]
        service_domains: Vec<ServiceDomain>,
    }

    serde_json::from_value::<Data>(data.clone())
        .ok()
        .and_then(|d| d.domains)
        .map(|d| d.service_domains)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_outcome_with_errors() {
        let response: GqlResponse = serde_json::from_value(json!({
            "data": null,
            "errors": [{ "message": "Not Authorized" }]
        }))
        .unwrap();

        match response.outcome() {
            ApiOutcome::Errors(messages) => assert_eq!(messages, vec!["Not Authorized"]),
            other => panic!("expected errors, got {:?}", other),
        }
    }

    #[test]
    fn test_outcome_empty_when_data_missing() {
        let response: GqlResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(response.outcome(), ApiOutcome::Empty));
    }

    #[test]
    fn test_decode_environments_full_shape() {
        let data = json!({
            "project": {
                "environments": {
                    "edges": [
                        { "node": { "id": "env-1", "name": "staging" } },
                        { "node": { "id": "env-2", "name": "production" } }
                    ]
                }
            }
        });

        let environments = decode_environments(&data);
        assert_eq!(environments.len(), 2);
        assert_eq!(pick_environment(&environments).map(|e| e.id.as_str()), Some("env-2"));
    }

    #[test]
    fn test_decode_environments_partial_shapes() {
        assert!(decode_environments(&json!({})).is_empty());
        assert!(decode_environments(&json!({ "project": null })).is_empty());
        assert!(decode_environments(&json!({ "project": { "environments": {} } })).is_empty());

        // an edge without a node is dropped, not an error
        let data = json!({
            "project": { "environments": { "edges": [ { "node": null } ] } }
        });
        assert!(decode_environments(&data).is_empty());
    }

    #[test]
    fn test_pick_environment_falls_back_to_first() {
        let environments = vec![
            Environment { id: "a".into(), name: "dev".into() },
            Environment { id: "b".into(), name: "preview".into() },
        ];
        assert_eq!(pick_environment(&environments).map(|e| e.id.as_str()), Some("a"));
        assert_eq!(pick_environment(&[]), None);
    }

    #[test]
    fn test_decode_created_service() {
        let data = json!({ "serviceCreate": { "id": "svc-1" } });
        assert_eq!(decode_created_service(&data).as_deref(), Some("svc-1"));
        assert_eq!(decode_created_service(&json!({ "serviceCreate": {} })), None);
        assert_eq!(decode_created_service(&json!({})), None);
    }

    #[test]
    fn test_decode_created_domain() {
        let data = json!({ "serviceDomainCreate": { "domain": "my-app.up.railway.app" } });
        assert_eq!(
            decode_created_domain(&data).as_deref(),
            Some("my-app.up.railway.app")
        );
        assert_eq!(decode_created_domain(&json!({})), None);
    }

    #[test]
    fn test_decode_service_domains() {
        let data = json!({
            "domains": {
                "serviceDomains": [
                    { "domain": "a.up.railway.app", "serviceId": "svc-a" },
                    { "domain": "b.up.railway.app", "serviceId": "svc-b" }
                ]
            }
        });

        let domains = decode_service_domains(&data);
        assert_eq!(domains.len(), 2);
        assert_eq!(domains[1].service_id, "svc-b");
        assert!(decode_service_domains(&json!({})).is_empty());
    }
}
