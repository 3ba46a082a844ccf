//! Bigtable client check
//!
//! Builds a `BaseClient` the way an application would and reports what it
//! resolved. With `--ping`, also sends `PingAndWarm` for an instance through
//! the data client.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -- --project my-project --admin --ping my-instance
//! ```
//!
//! ## Environment Variables
//!
//! - `BIGTABLE_EMULATOR_HOST`: use a local emulator (e.g. "localhost:8086")
//! - `GOOGLE_OAUTH_ACCESS_TOKEN`: ready bearer token, used instead of
//!   application default credentials
//! - `GOOGLE_APPLICATION_CREDENTIALS`: service account or user key file
//! - `GOOGLE_CLOUD_PROJECT`: default project
//! - `RUST_LOG`: Logging level (default: "bigtable=info,bigtable_gapic=info")

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bigtable::{AccessTokenCredentials, AnonymousCredentials, ClientConfig, BIGTABLE_EMULATOR};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding a ready OAuth2 access token
const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

#[derive(Parser, Debug)]
#[command(name = "bigtable")]
#[command(about = "Build a Bigtable client and report the resolved configuration")]
struct Args {
    /// JSON client configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Project ID (overrides the config file)
    #[arg(long)]
    project: Option<String>,

    /// Request the admin scope and build the table admin client
    #[arg(long, conflicts_with = "read_only")]
    admin: bool,

    /// Request the read-only scope
    #[arg(long)]
    read_only: bool,

    /// Instance ID to send PingAndWarm to
    #[arg(long, value_name = "INSTANCE")]
    ping: Option<String>,
}

impl Args {
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if self.project.is_some() {
            config.project = self.project.clone();
        }
        config.admin |= self.admin;
        config.read_only |= self.read_only;

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bigtable=info,bigtable_gapic=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = args.client_config()?;

    let mut builder = config.builder();
    // The emulator does not check credentials, so don't require any
    if std::env::var_os(BIGTABLE_EMULATOR).is_some() {
        builder = builder.credentials(Arc::new(AnonymousCredentials::new()));
    } else if let Some(token) = std::env::var(ACCESS_TOKEN_ENV)
        .ok()
        .filter(|token| !token.is_empty())
    {
        builder = builder.credentials(Arc::new(AccessTokenCredentials::new(token)));
    }
    let client = builder.build().context("Failed to construct client")?;

    tracing::info!("Project path: {}", client.project_path());
    tracing::info!("Scopes: {:?}", client.scopes());
    match client.emulator_host() {
        Some(host) => tracing::info!("Emulator: {}", host),
        None => tracing::info!("Emulator: not in use"),
    }

    let data = client.table_data_client()?;
    tracing::info!(
        "Data client ready ({})",
        data.transport().target().unwrap_or("emulator channel")
    );

    if client.is_admin() {
        let admin = client.table_admin_client()?;
        tracing::info!(
            "Table admin client ready ({})",
            admin.transport().target().unwrap_or("emulator channel")
        );
    }

    if let Some(instance) = &args.ping {
        let name = format!("{}/instances/{}", client.project_path(), instance);
        data.ping_and_warm(&name, "")
            .await
            .with_context(|| format!("PingAndWarm failed for {}", name))?;
        tracing::info!("PingAndWarm succeeded for {}", name);
    }

    Ok(())
}
