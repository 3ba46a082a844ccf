//! Credentials consumed by the RPC clients
//!
//! The clients only need two things from a credential: a way to narrow it to
//! a scope set, and the `authorization` header value to attach to requests.
//! [`GoogleCredentials`] provides both on top of `google-cloud-auth`, which
//! owns token exchange and refresh.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use google_cloud_auth::credentials::{
    service_account, user_account, Builder as CredentialsBuilder, CacheableResource,
};
use http::Extensions;

use crate::error::{GapicError, Result};

/// A credential that can be scoped and turned into an `authorization` header
#[async_trait]
pub trait Credentials: Send + Sync {
    /// Return a copy of these credentials restricted to `scopes`
    fn with_scopes(&self, scopes: Vec<String>) -> Result<Arc<dyn Credentials>>;

    /// Scopes currently applied
    fn scopes(&self) -> Vec<String>;

    /// Value for the `authorization` header, or `None` to send no header
    ///
    /// Implementations backed by a token service may refresh here.
    async fn authorization_header(&self) -> Result<Option<String>>;
}

impl fmt::Debug for dyn Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("scopes", &self.scopes())
            .finish_non_exhaustive()
    }
}

/// Static OAuth2 bearer token
#[derive(Clone)]
pub struct AccessTokenCredentials {
    token: String,
    scopes: Vec<String>,
}

impl AccessTokenCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            scopes: Vec::new(),
        }
    }
}

impl fmt::Debug for AccessTokenCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the token itself
        f.debug_struct("AccessTokenCredentials")
            .field(
                "token",
                &format_args!("{}...", self.token.chars().take(8).collect::<String>()),
            )
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[async_trait]
impl Credentials for AccessTokenCredentials {
    fn with_scopes(&self, scopes: Vec<String>) -> Result<Arc<dyn Credentials>> {
        Ok(Arc::new(Self {
            token: self.token.clone(),
            scopes,
        }))
    }

    fn scopes(&self) -> Vec<String> {
        self.scopes.clone()
    }

    async fn authorization_header(&self) -> Result<Option<String>> {
        Ok(Some(format!("Bearer {}", self.token)))
    }
}

/// Credentials that never authenticate, for emulators and local testing
#[derive(Debug, Clone, Default)]
pub struct AnonymousCredentials {
    scopes: Vec<String>,
}

impl AnonymousCredentials {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Credentials for AnonymousCredentials {
    fn with_scopes(&self, scopes: Vec<String>) -> Result<Arc<dyn Credentials>> {
        Ok(Arc::new(Self { scopes }))
    }

    fn scopes(&self) -> Vec<String> {
        self.scopes.clone()
    }

    async fn authorization_header(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Where Google credentials are loaded from
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialSource {
    /// Let `google-cloud-auth` look for them: `GOOGLE_APPLICATION_CREDENTIALS`,
    /// the gcloud well-known file, then the metadata server
    ApplicationDefault,
    /// Contents of a service account or authorized user key file
    Json(serde_json::Value),
}

impl CredentialSource {
    /// Read and parse a key file
    ///
    /// # Errors
    ///
    /// `GapicError::Authentication` if the file is unreadable or not JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            tracing::error!("Failed to read credentials file {}: {}", path.display(), e);
            GapicError::Authentication(format!(
                "Failed to read credentials file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let json = serde_json::from_str(&contents).map_err(|e| {
            GapicError::Authentication(format!(
                "Failed to parse credentials file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(CredentialSource::Json(json))
    }

    /// Project named by the key file
    ///
    /// Service account keys carry `project_id`; authorized user files may
    /// carry `quota_project_id`.
    pub fn project_id(&self) -> Option<String> {
        match self {
            CredentialSource::ApplicationDefault => None,
            CredentialSource::Json(json) => json
                .get("project_id")
                .or_else(|| json.get("quota_project_id"))
                .and_then(|value| value.as_str())
                .filter(|project| !project.is_empty())
                .map(|project| project.to_string()),
        }
    }

    fn kind(&self) -> &str {
        match self {
            CredentialSource::ApplicationDefault => "application_default",
            CredentialSource::Json(json) => json
                .get("type")
                .and_then(|value| value.as_str())
                .unwrap_or("unknown"),
        }
    }
}

/// Google OAuth2 credentials with a fixed scope set
///
/// Tokens are fetched and refreshed by `google-cloud-auth`, whose token cache
/// runs on tokio: construct these inside a runtime.
#[derive(Clone)]
pub struct GoogleCredentials {
    source: CredentialSource,
    scopes: Vec<String>,
    inner: google_cloud_auth::credentials::Credentials,
}

impl GoogleCredentials {
    /// Build credentials from `source`, requesting `scopes`
    ///
    /// # Errors
    ///
    /// - `GapicError::NoRuntime` outside a tokio runtime
    /// - `GapicError::Authentication` for an unsupported key type or a key
    ///   `google-cloud-auth` rejects
    pub fn new(source: CredentialSource, scopes: Vec<String>) -> Result<Self> {
        tokio::runtime::Handle::try_current().map_err(|_| GapicError::NoRuntime)?;

        let built = match &source {
            CredentialSource::ApplicationDefault => CredentialsBuilder::default()
                .with_scopes(scopes.clone())
                .build(),
            CredentialSource::Json(json) => match source.kind() {
                "service_account" => service_account::Builder::new(json.clone())
                    .with_access_specifier(service_account::AccessSpecifier::from_scopes(
                        scopes.clone(),
                    ))
                    .build(),
                "authorized_user" => user_account::Builder::new(json.clone())
                    .with_scopes(scopes.clone())
                    .build(),
                other => {
                    return Err(GapicError::Authentication(format!(
                        "Unsupported credential type '{}'. \
                         Expected 'service_account' or 'authorized_user'",
                        other
                    )));
                }
            },
        };

        let inner = built.map_err(|e| {
            tracing::error!("Failed to load {} credentials: {}", source.kind(), e);
            GapicError::Authentication(format!(
                "Failed to load {} credentials: {}",
                source.kind(),
                e
            ))
        })?;

        tracing::debug!("Loaded {} credentials", source.kind());

        Ok(Self {
            source,
            scopes,
            inner,
        })
    }

    pub fn source(&self) -> &CredentialSource {
        &self.source
    }
}

impl fmt::Debug for GoogleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The key material stays out of logs
        f.debug_struct("GoogleCredentials")
            .field("source", &self.source.kind())
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Credentials for GoogleCredentials {
    fn with_scopes(&self, scopes: Vec<String>) -> Result<Arc<dyn Credentials>> {
        Ok(Arc::new(Self::new(self.source.clone(), scopes)?))
    }

    fn scopes(&self) -> Vec<String> {
        self.scopes.clone()
    }

    async fn authorization_header(&self) -> Result<Option<String>> {
        let headers = self.inner.headers(Extensions::new()).await.map_err(|e| {
            tracing::error!("Failed to fetch access token: {}", e);
            GapicError::Authentication(format!("Failed to fetch access token: {}", e))
        })?;

        let headers = match headers {
            CacheableResource::New { data, .. } => data,
            CacheableResource::NotModified => {
                return Err(GapicError::Authentication(
                    "Received NotModified response but no cached token available".to_string(),
                ));
            }
        };

        headers
            .get(http::header::AUTHORIZATION)
            .map(|value| {
                value.to_str().map(str::to_string).map_err(|e| {
                    GapicError::Authentication(format!("Invalid authorization header: {}", e))
                })
            })
            .transpose()
    }
}
