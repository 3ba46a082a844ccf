//! Emulator override
//!
//! When `BIGTABLE_EMULATOR_HOST` is set, sub-clients talk to a local,
//! unauthenticated emulator over a plaintext channel instead of the
//! credentialed service endpoints. A set but empty value counts as unset.

use std::sync::Arc;

use bigtable_gapic::lazy_channel;
use tonic::transport::{Channel, Endpoint};

use crate::error::{BigtableError, Result};

/// Environment variable naming the emulator's `host:port`
pub const BIGTABLE_EMULATOR: &str = "BIGTABLE_EMULATOR_HOST";

/// Read access to the process environment
#[cfg_attr(test, mockall::automock)]
pub trait Environment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// [`Environment`] backed by `std::env`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Builds unauthenticated channels to an emulator
#[cfg_attr(test, mockall::automock)]
pub trait ChannelFactory: Send + Sync {
    fn insecure_channel(&self, host: &str) -> Result<Channel>;
}

/// Plaintext HTTP/2 channel, connected on first use
///
/// Fails with `GapicError::NoRuntime` outside a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsecureChannelFactory;

impl ChannelFactory for InsecureChannelFactory {
    fn insecure_channel(&self, host: &str) -> Result<Channel> {
        let uri = format!("http://{}", host);
        let endpoint = Endpoint::from_shared(uri).map_err(|e| {
            tracing::error!("Invalid emulator host {}: {}", host, e);
            BigtableError::Configuration(format!(
                "{} is not a valid host:port ({}): {}",
                BIGTABLE_EMULATOR, host, e
            ))
        })?;
        Ok(lazy_channel(&endpoint)?)
    }
}

/// A running emulator: its address and the channel to it
#[derive(Debug, Clone)]
pub struct Emulator {
    host: String,
    channel: Channel,
}

impl Emulator {
    pub fn new(host: impl Into<String>, channel: Channel) -> Self {
        Self {
            host: host.into(),
            channel,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }
}

/// How sub-clients reach the service
#[derive(Debug, Clone, Default)]
pub enum ClientMode {
    /// Real endpoints, authenticated with the client's credentials
    #[default]
    Credentialed,
    /// Local emulator over an insecure channel
    Emulator(Emulator),
}

impl ClientMode {
    pub fn emulator(&self) -> Option<&Emulator> {
        match self {
            ClientMode::Emulator(emulator) => Some(emulator),
            ClientMode::Credentialed => None,
        }
    }
}

/// Check the environment once for an emulator host
///
/// The channel is built lazily, so an unreachable emulator surfaces on the
/// first RPC rather than here.
pub fn detect_emulator(
    environment: &dyn Environment,
    channels: &dyn ChannelFactory,
) -> Result<ClientMode> {
    match environment.var(BIGTABLE_EMULATOR) {
        Some(host) if !host.is_empty() => {
            let channel = channels.insecure_channel(&host)?;
            tracing::info!("Using Bigtable emulator at {}", host);
            Ok(ClientMode::Emulator(Emulator::new(host, channel)))
        }
        _ => Ok(ClientMode::Credentialed),
    }
}

/// Default collaborators, shared so builders can clone them cheaply
pub(crate) fn default_environment() -> Arc<dyn Environment> {
    Arc::new(ProcessEnvironment)
}

pub(crate) fn default_channel_factory() -> Arc<dyn ChannelFactory> {
    Arc::new(InsecureChannelFactory)
}
