//! Admin-plane client (`google.bigtable.admin.v2.BigtableTableAdmin`)

use std::sync::Arc;

use tonic::transport::Channel;

use crate::auth::Credentials;
use crate::error::Result;
use crate::options::{ClientInfo, ClientOptions};
use crate::transport::GapicTransport;
use crate::GapicClient;

/// Handle to the table admin service
///
/// Schema management stubs are built on [`GapicTransport::channel`].
#[derive(Debug, Clone)]
pub struct BigtableTableAdminClient {
    transport: GapicTransport,
}

impl BigtableTableAdminClient {
    pub fn transport(&self) -> &GapicTransport {
        &self.transport
    }

    pub fn client_info(&self) -> &Arc<ClientInfo> {
        self.transport.client_info()
    }

    pub fn credentials(&self) -> Option<&Arc<dyn Credentials>> {
        self.transport.credentials()
    }

    pub fn client_options(&self) -> Option<&ClientOptions> {
        self.transport.client_options()
    }
}

impl GapicClient for BigtableTableAdminClient {
    const DEFAULT_ENDPOINT: &'static str = "https://bigtableadmin.googleapis.com";
    const SERVICE_NAME: &'static str = "google.bigtable.admin.v2.BigtableTableAdmin";

    fn from_credentials(
        credentials: Arc<dyn Credentials>,
        client_info: Arc<ClientInfo>,
        client_options: Option<ClientOptions>,
    ) -> Result<Self> {
        Ok(Self {
            transport: GapicTransport::with_credentials(
                Self::DEFAULT_ENDPOINT,
                credentials,
                client_info,
                client_options,
            )?,
        })
    }

    fn from_channel(channel: Channel, client_info: Arc<ClientInfo>) -> Result<Self> {
        Ok(Self {
            transport: GapicTransport::with_channel(channel, client_info)?,
        })
    }
}
