//! Deferred construction of RPC clients
//!
//! A [`GapicClientFactory`] captures the client type and its options up
//! front, and builds the client later against a fully constructed
//! [`ClientContext`]. Nothing is cached here; memoization belongs to the
//! caller.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bigtable_gapic::{ClientInfo, ClientOptions, Credentials, GapicClient};

use crate::emulator::ClientMode;
use crate::error::Result;

/// What a factory needs from the owning client
pub trait ClientContext {
    fn credentials(&self) -> &Arc<dyn Credentials>;
    fn client_info(&self) -> &Arc<ClientInfo>;
    fn mode(&self) -> &ClientMode;
}

/// Builds one kind of RPC client with fixed options
pub struct GapicClientFactory<C> {
    client_options: Option<ClientOptions>,
    _client: PhantomData<fn() -> C>,
}

impl<C: GapicClient> GapicClientFactory<C> {
    pub fn new(client_options: Option<ClientOptions>) -> Self {
        Self {
            client_options,
            _client: PhantomData,
        }
    }

    pub fn client_options(&self) -> Option<&ClientOptions> {
        self.client_options.as_ref()
    }

    /// Construct the client for `context`
    ///
    /// In emulator mode the client gets only the emulator channel and the
    /// client info: credentials and this factory's client options are not
    /// forwarded.
    pub fn build(&self, context: &(impl ClientContext + ?Sized)) -> Result<C> {
        let client_info = Arc::clone(context.client_info());

        let client = match context.mode() {
            ClientMode::Emulator(emulator) => {
                tracing::debug!(
                    "Building {} against emulator {}",
                    C::SERVICE_NAME,
                    emulator.host()
                );
                C::from_channel(emulator.channel().clone(), client_info)?
            }
            ClientMode::Credentialed => {
                tracing::debug!("Building {} with credentials", C::SERVICE_NAME);
                C::from_credentials(
                    Arc::clone(context.credentials()),
                    client_info,
                    self.client_options.clone(),
                )?
            }
        };

        Ok(client)
    }
}

impl<C> fmt::Debug for GapicClientFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GapicClientFactory")
            .field("client", &std::any::type_name::<C>())
            .field("client_options", &self.client_options)
            .finish()
    }
}

/// Bind `client_options` to client type `C` for later construction
pub fn create_gapic_client<C: GapicClient>(
    client_options: Option<ClientOptions>,
) -> GapicClientFactory<C> {
    GapicClientFactory::new(client_options)
}
