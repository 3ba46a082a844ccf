//! Per-client metadata and endpoint options

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::GAPIC_VERSION;

/// Library identification attached to every request
///
/// Rendered into the `x-goog-api-client` header. `user_agent`, when set, is
/// used as the HTTP/2 user agent of credentialed channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_library_version: Cow<'static, str>,
    #[serde(default = "default_gapic_version")]
    pub gapic_version: Cow<'static, str>,
    #[serde(default)]
    pub user_agent: Option<Cow<'static, str>>,
}

fn default_gapic_version() -> Cow<'static, str> {
    Cow::Borrowed(GAPIC_VERSION)
}

impl ClientInfo {
    /// Usable in `const` context, so callers can keep a process-wide default
    pub const fn new(client_library_version: &'static str) -> Self {
        Self {
            client_library_version: Cow::Borrowed(client_library_version),
            gapic_version: Cow::Borrowed(GAPIC_VERSION),
            user_agent: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(Cow::Owned(user_agent.into()));
        self
    }

    /// Value of the `x-goog-api-client` header
    pub fn api_client_header(&self) -> String {
        format!(
            "gccl/{} gapic/{}",
            self.client_library_version, self.gapic_version
        )
    }
}

/// Endpoint-level options for a single RPC client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientOptions {
    /// Overrides the service's default endpoint (e.g. a regional endpoint)
    pub api_endpoint: Option<String>,

    /// Project billed for quota, sent as `x-goog-user-project`
    pub quota_project_id: Option<String>,
}

impl ClientOptions {
    pub fn with_api_endpoint(mut self, api_endpoint: impl Into<String>) -> Self {
        self.api_endpoint = Some(api_endpoint.into());
        self
    }

    pub fn with_quota_project_id(mut self, quota_project_id: impl Into<String>) -> Self {
        self.quota_project_id = Some(quota_project_id.into());
        self
    }
}
