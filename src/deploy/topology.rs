//! Resolved identifiers for one multi-service deploy

/// Accumulates identifiers as the full-stack pipeline progresses.
///
/// Rebuilt from scratch on every deploy call and never persisted; on a
/// redeploy the caller supplies the project id and the rest is
/// re-derived from CLI output and API responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceTopology {
    pub project_id: Option<String>,
    pub environment_id: Option<String>,
    pub backend_service_id: Option<String>,
    pub frontend_service_id: Option<String>,
    pub backend_url: Option<String>,
    pub frontend_url: Option<String>,
}

impl ServiceTopology {
    pub fn for_project(project_id: Option<String>) -> Self {
        Self {
            project_id,
            ..Self::default()
        }
    }

    /// The backend's id and URL are both known, so its URL may be wired
    /// into the frontend
    pub fn backend_wireable(&self) -> bool {
        self.backend_service_id.is_some() && self.backend_url.is_some()
    }

    /// The frontend's id and URL are both known, so its URL may be
    /// wired into the backend
    pub fn frontend_wireable(&self) -> bool {
        self.frontend_service_id.is_some() && self.frontend_url.is_some()
    }
}
