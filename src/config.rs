//! File-based client configuration
//!
//! ```json
//! {
//!   "project": "my-project",
//!   "admin": true,
//!   "user_agent": "my-app/1.0",
//!   "client_options": { "api_endpoint": "us-east1-bigtable.googleapis.com" },
//!   "admin_client_options": { "quota_project_id": "billing-project" }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use bigtable_gapic::ClientOptions;
use serde::{Deserialize, Serialize};

use crate::client::{BaseClient, BaseClientBuilder};
use crate::error::Result;
use crate::CLIENT_INFO;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub project: Option<String>,
    pub admin: bool,
    pub read_only: bool,
    /// Appended to the default client info
    pub user_agent: Option<String>,
    pub client_options: Option<ClientOptions>,
    pub admin_client_options: Option<ClientOptions>,
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading client config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// A builder preloaded with this configuration
    ///
    /// Credentials and collaborators can still be set on the returned
    /// builder before calling `build`.
    pub fn builder(&self) -> BaseClientBuilder {
        let mut builder = BaseClient::builder()
            .admin(self.admin)
            .read_only(self.read_only);

        if let Some(project) = &self.project {
            builder = builder.project(project.clone());
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.client_info(Arc::new(CLIENT_INFO.with_user_agent(user_agent.clone())));
        }
        if let Some(options) = &self.client_options {
            builder = builder.client_options(options.clone());
        }
        if let Some(options) = &self.admin_client_options {
            builder = builder.admin_client_options(options.clone());
        }

        builder
    }
}
