//! Channel construction and per-request metadata
//!
//! Every RPC client wraps a [`GapicTransport`]: a channel whose requests pass
//! through [`RequestMetadata`], which stamps the library identification and
//! quota project onto each call. The `authorization` header is fetched from
//! the credentials per call by [`GapicTransport::authorize`], since token
//! refresh is asynchronous.

use std::fmt;
use std::sync::Arc;

use tonic::metadata::AsciiMetadataValue;
use tonic::service::interceptor::InterceptedService;
use tonic::service::Interceptor;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Request, Status};

use crate::auth::Credentials;
use crate::error::{GapicError, Result};
use crate::options::{ClientInfo, ClientOptions};

/// Channel with [`RequestMetadata`] applied to every request
pub type AuthenticatedChannel = InterceptedService<Channel, RequestMetadata>;

/// Interceptor adding Google API metadata to outgoing requests
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    api_client: AsciiMetadataValue,
    user_project: Option<AsciiMetadataValue>,
}

impl RequestMetadata {
    pub fn new(client_info: &ClientInfo) -> Result<Self> {
        Ok(Self {
            api_client: ascii_value("x-goog-api-client", client_info.api_client_header())?,
            user_project: None,
        })
    }

    pub fn with_user_project(mut self, project: &str) -> Result<Self> {
        self.user_project = Some(ascii_value("x-goog-user-project", project.to_string())?);
        Ok(self)
    }
}

impl Interceptor for RequestMetadata {
    fn call(&mut self, mut request: Request<()>) -> std::result::Result<Request<()>, Status> {
        let metadata = request.metadata_mut();
        metadata.insert("x-goog-api-client", self.api_client.clone());

        if let Some(project) = &self.user_project {
            metadata.insert("x-goog-user-project", project.clone());
        }

        Ok(request)
    }
}

fn ascii_value(key: &'static str, value: String) -> Result<AsciiMetadataValue> {
    value
        .parse::<AsciiMetadataValue>()
        .map_err(|_| GapicError::InvalidMetadata { key, value })
}

/// Accepts `host:port` as well as full URIs, defaulting to TLS
fn endpoint_uri(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    }
}

/// Channel to `endpoint`, connected on first use
///
/// tonic spawns the connection task onto the current tokio runtime, so this
/// fails with `GapicError::NoRuntime` when there is none.
pub fn lazy_channel(endpoint: &Endpoint) -> Result<Channel> {
    tokio::runtime::Handle::try_current().map_err(|_| GapicError::NoRuntime)?;
    Ok(endpoint.connect_lazy())
}

/// Shared plumbing behind every RPC client handle
#[derive(Clone)]
pub struct GapicTransport {
    channel: AuthenticatedChannel,
    target: Option<String>,
    client_info: Arc<ClientInfo>,
    credentials: Option<Arc<dyn Credentials>>,
    client_options: Option<ClientOptions>,
}

impl GapicTransport {
    /// Build a credentialed transport to `client_options.api_endpoint`, or to
    /// `default_endpoint` when no override is given
    ///
    /// No connection is made until the first request.
    ///
    /// # Errors
    ///
    /// - `GapicError::InvalidEndpoint` / `GapicError::InvalidMetadata` for
    ///   malformed options or client info
    /// - `GapicError::NoRuntime` when called outside a tokio runtime
    pub fn with_credentials(
        default_endpoint: &str,
        credentials: Arc<dyn Credentials>,
        client_info: Arc<ClientInfo>,
        client_options: Option<ClientOptions>,
    ) -> Result<Self> {
        let target = endpoint_uri(
            client_options
                .as_ref()
                .and_then(|options| options.api_endpoint.as_deref())
                .unwrap_or(default_endpoint),
        );

        let mut endpoint =
            Endpoint::from_shared(target.clone()).map_err(|e| GapicError::InvalidEndpoint {
                endpoint: target.clone(),
                reason: e.to_string(),
            })?;

        if target.starts_with("https://") {
            endpoint = endpoint.tls_config(ClientTlsConfig::new().with_native_roots())?;
        }

        if let Some(user_agent) = &client_info.user_agent {
            endpoint = endpoint.user_agent(user_agent.to_string())?;
        }

        let mut metadata = RequestMetadata::new(&client_info)?;
        if let Some(project) = client_options
            .as_ref()
            .and_then(|options| options.quota_project_id.as_deref())
        {
            metadata = metadata.with_user_project(project)?;
        }

        let channel = lazy_channel(&endpoint)?;
        tracing::debug!("Built credentialed channel to {}", target);

        Ok(Self {
            channel: InterceptedService::new(channel, metadata),
            target: Some(target),
            client_info,
            credentials: Some(credentials),
            client_options,
        })
    }

    /// Wrap an existing channel without credentials or client options
    pub fn with_channel(channel: Channel, client_info: Arc<ClientInfo>) -> Result<Self> {
        let metadata = RequestMetadata::new(&client_info)?;

        Ok(Self {
            channel: InterceptedService::new(channel, metadata),
            target: None,
            client_info,
            credentials: None,
            client_options: None,
        })
    }

    /// Endpoint URI of a credentialed transport; `None` for wrapped channels
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn client_info(&self) -> &Arc<ClientInfo> {
        &self.client_info
    }

    pub fn credentials(&self) -> Option<&Arc<dyn Credentials>> {
        self.credentials.as_ref()
    }

    pub fn client_options(&self) -> Option<&ClientOptions> {
        self.client_options.as_ref()
    }

    /// A clone of the intercepted channel, for building generated stubs
    pub fn channel(&self) -> AuthenticatedChannel {
        self.channel.clone()
    }

    /// Attach the credentials' `authorization` header to `request`
    ///
    /// A transport built on a bare channel sends no header.
    pub async fn authorize<T>(
        &self,
        request: &mut Request<T>,
    ) -> std::result::Result<(), Status> {
        let Some(credentials) = &self.credentials else {
            return Ok(());
        };

        let header = credentials.authorization_header().await.map_err(|e| {
            tracing::error!("Failed to obtain authorization header: {}", e);
            Status::unauthenticated(e.to_string())
        })?;

        if let Some(header) = header {
            let value = header.parse::<AsciiMetadataValue>().map_err(|_| {
                tracing::error!("Credentials produced an unencodable authorization header");
                Status::unauthenticated("Invalid authorization header")
            })?;
            request.metadata_mut().insert("authorization", value);
        }

        Ok(())
    }
}

impl fmt::Debug for GapicTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GapicTransport")
            .field("target", &self.target)
            .field("client_info", &self.client_info)
            .field("authenticated", &self.credentials.is_some())
            .field("client_options", &self.client_options)
            .finish()
    }
}
