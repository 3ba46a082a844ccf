//! # Bigtable GAPIC
//!
//! RPC client handles for the Cloud Bigtable services.
//!
//! This crate is the generated-SDK layer: it knows how to turn credentials (or
//! a ready channel) into a client for one service, and how to decorate every
//! request with the metadata the service expects. Service stubs are generated
//! from `proto/` at build time. It does not decide which
//! credentials, scopes or channel to use; that is the job of the `bigtable`
//! crate's `BaseClient`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bigtable_gapic::{AccessTokenCredentials, BigtableClient, ClientInfo, GapicClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Arc::new(AccessTokenCredentials::new("ya29.token"));
//!     let client_info = Arc::new(ClientInfo::new("0.1.0"));
//!     let client = BigtableClient::from_credentials(credentials, client_info, None)?;
//!
//!     client
//!         .ping_and_warm("projects/my-project/instances/my-instance", "")
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tonic::transport::Channel;

pub mod admin;
pub mod auth;
pub mod data;
pub mod error;
pub mod options;
pub mod transport;

pub use admin::BigtableTableAdminClient;
pub use auth::{
    AccessTokenCredentials, AnonymousCredentials, CredentialSource, Credentials, GoogleCredentials,
};
pub use data::BigtableClient;
pub use error::{GapicError, Result};
pub use options::{ClientInfo, ClientOptions};
pub use transport::{lazy_channel, AuthenticatedChannel, GapicTransport, RequestMetadata};

/// Version of the RPC surface this crate was written against
pub const GAPIC_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Constructors shared by every RPC client handle.
///
/// A client can be built either against the service's real endpoint with
/// credentials, or on top of an already established channel (the emulator
/// path). The channel path takes no credentials and no client options.
pub trait GapicClient: Sized {
    /// Endpoint used when `ClientOptions::api_endpoint` is unset
    const DEFAULT_ENDPOINT: &'static str;

    /// Fully-qualified gRPC service name
    const SERVICE_NAME: &'static str;

    /// Build a client that authenticates every request with `credentials`
    ///
    /// Fails with [`GapicError::NoRuntime`] outside a tokio runtime.
    fn from_credentials(
        credentials: Arc<dyn Credentials>,
        client_info: Arc<ClientInfo>,
        client_options: Option<ClientOptions>,
    ) -> Result<Self>;

    /// Build a client on top of an existing channel
    fn from_channel(channel: Channel, client_info: Arc<ClientInfo>) -> Result<Self>;
}
