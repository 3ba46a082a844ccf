//! Data-plane client (`google.bigtable.v2.Bigtable`)

use std::sync::Arc;

use tonic::metadata::AsciiMetadataValue;
use tonic::transport::Channel;
use tonic::{Request, Response, Status};

use crate::auth::Credentials;
use crate::error::Result;
use crate::options::{ClientInfo, ClientOptions};
use crate::transport::{AuthenticatedChannel, GapicTransport};
use crate::GapicClient;

/// Generated messages and stub of the data-plane service
pub mod v2 {
    tonic::include_proto!("google.bigtable.v2");
}

use v2::bigtable_client::BigtableClient as BigtableStub;

/// Handle to the data-plane service
///
/// Cheap to clone; clones share the underlying channel.
#[derive(Debug, Clone)]
pub struct BigtableClient {
    transport: GapicTransport,
    stub: BigtableStub<AuthenticatedChannel>,
}

impl BigtableClient {
    fn new(transport: GapicTransport) -> Self {
        Self {
            stub: BigtableStub::new(transport.channel()),
            transport,
        }
    }

    pub fn transport(&self) -> &GapicTransport {
        &self.transport
    }

    pub fn client_info(&self) -> &Arc<ClientInfo> {
        self.transport.client_info()
    }

    /// `None` when the client was built on a bare channel
    pub fn credentials(&self) -> Option<&Arc<dyn Credentials>> {
        self.transport.credentials()
    }

    pub fn client_options(&self) -> Option<&ClientOptions> {
        self.transport.client_options()
    }

    /// Warm the channel for `instance_name`
    ///
    /// Useful as a connectivity check: succeeds once the service (or
    /// emulator) has accepted the call.
    pub async fn ping_and_warm(
        &self,
        instance_name: &str,
        app_profile_id: &str,
    ) -> std::result::Result<Response<v2::PingAndWarmResponse>, Status> {
        tracing::debug!("PingAndWarm {}", instance_name);

        let params = format!("name={}", instance_name)
            .parse::<AsciiMetadataValue>()
            .map_err(|_| Status::invalid_argument("Instance name is not valid metadata"))?;

        let mut request = Request::new(v2::PingAndWarmRequest {
            name: instance_name.to_string(),
            app_profile_id: app_profile_id.to_string(),
        });
        request
            .metadata_mut()
            .insert("x-goog-request-params", params);
        self.transport.authorize(&mut request).await?;

        self.stub.clone().ping_and_warm(request).await
    }
}

impl GapicClient for BigtableClient {
    const DEFAULT_ENDPOINT: &'static str = "https://bigtable.googleapis.com";
    const SERVICE_NAME: &'static str = "google.bigtable.v2.Bigtable";

    fn from_credentials(
        credentials: Arc<dyn Credentials>,
        client_info: Arc<ClientInfo>,
        client_options: Option<ClientOptions>,
    ) -> Result<Self> {
        Ok(Self::new(GapicTransport::with_credentials(
            Self::DEFAULT_ENDPOINT,
            credentials,
            client_info,
            client_options,
        )?))
    }

    fn from_channel(channel: Channel, client_info: Arc<ClientInfo>) -> Result<Self> {
        Ok(Self::new(GapicTransport::with_channel(channel, client_info)?))
    }
}
