//! # Bigtable
//!
//! Client bootstrap for Cloud Bigtable.
//!
//! [`BaseClient`] resolves everything a Bigtable RPC client needs up front
//! (project, OAuth scopes, credentials and emulator mode) and then builds the
//! data-plane and table-admin RPC clients lazily, once each.
//!
//! ## Features
//!
//! - **Scope policy**: data, admin or read-only access from two flags
//! - **Credential discovery**: explicit credentials, or Google application
//!   default credentials via `google-cloud-auth`
//! - **Emulator support**: `BIGTABLE_EMULATOR_HOST` switches every sub-client
//!   to a plaintext local channel
//! - **Lazy sub-clients**: built on first access, cached afterwards
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bigtable::BaseClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BaseClient::builder().project("my-project").build()?;
//!
//!     let data = client.table_data_client()?;
//!     data.ping_and_warm(&format!("{}/instances/my-instance", client.project_path()), "")
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod emulator;
pub mod error;
pub mod factory;
pub mod scopes;

pub use client::{BaseClient, BaseClientBuilder};
pub use config::ClientConfig;
pub use credentials::{ApplicationDefaultCredentials, CredentialsProvider};
pub use emulator::{ClientMode, Emulator, BIGTABLE_EMULATOR};
pub use error::{BigtableError, Result};
pub use factory::{create_gapic_client, ClientContext, GapicClientFactory};
pub use scopes::{resolve_scopes, ADMIN_SCOPE, DATA_SCOPE, READ_ONLY_SCOPE};

// Re-export the RPC client layer
pub use bigtable_gapic::{
    AccessTokenCredentials, AnonymousCredentials, BigtableClient, BigtableTableAdminClient,
    ClientInfo, ClientOptions, CredentialSource, Credentials, GapicError, GoogleCredentials,
};

/// Client info attached to every RPC client unless the caller supplies one
pub const CLIENT_INFO: ClientInfo = ClientInfo::new(env!("CARGO_PKG_VERSION"));
