//! The top-level client
//!
//! [`BaseClient`] fixes project, credentials, scopes and emulator mode at
//! construction time, then hands out the data and table admin RPC clients,
//! building each one on first access.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use bigtable_gapic::{
    BigtableClient, BigtableTableAdminClient, ClientInfo, ClientOptions, Credentials, GapicClient,
};
use tonic::transport::Channel;

use crate::credentials::{resolve_credentials, ApplicationDefaultCredentials, CredentialsProvider};
use crate::emulator::{
    default_channel_factory, default_environment, detect_emulator, ChannelFactory, ClientMode,
    Environment,
};
use crate::error::{BigtableError, Result};
use crate::factory::{create_gapic_client, ClientContext};
use crate::scopes::resolve_scopes;
use crate::CLIENT_INFO;

/// Client for Cloud Bigtable
///
/// Construction is cheap and makes no network calls. The data and admin RPC
/// clients are created on first access and cached for the client's lifetime;
/// concurrent first accesses build a single instance.
///
/// Building sub-clients, detecting the emulator and discovering application
/// default credentials all need a tokio runtime; outside one they fail with
/// `GapicError::NoRuntime` instead of panicking.
///
/// # Example
///
/// ```rust,no_run
/// use bigtable::BaseClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = BaseClient::builder()
///         .project("my-project")
///         .admin(true)
///         .build()?;
///
///     let data = client.table_data_client()?;
///     let admin = client.table_admin_client()?;
///     Ok(())
/// }
/// ```
pub struct BaseClient {
    project: String,
    credentials: Arc<dyn Credentials>,
    scopes: &'static [&'static str],
    read_only: bool,
    admin: bool,
    mode: ClientMode,
    channel: Option<Channel>,
    client_info: Arc<ClientInfo>,
    client_options: Option<ClientOptions>,
    admin_client_options: Option<ClientOptions>,
    table_data_client: Mutex<Option<Arc<BigtableClient>>>,
    table_admin_client: Mutex<Option<Arc<BigtableTableAdminClient>>>,
}

impl BaseClient {
    pub fn builder() -> BaseClientBuilder {
        BaseClientBuilder::default()
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Resource name of the project, `projects/<project>`
    pub fn project_path(&self) -> String {
        format!("projects/{}", self.project)
    }

    /// Credentials with this client's scopes applied
    pub fn credentials(&self) -> &Arc<dyn Credentials> {
        &self.credentials
    }

    pub fn scopes(&self) -> &'static [&'static str] {
        self.scopes
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn emulator_host(&self) -> Option<&str> {
        self.mode.emulator().map(|emulator| emulator.host())
    }

    pub fn emulator_channel(&self) -> Option<&Channel> {
        self.mode.emulator().map(|emulator| emulator.channel())
    }

    /// Channel passed through the deprecated builder parameter
    pub fn channel(&self) -> Option<&Channel> {
        self.channel.as_ref()
    }

    pub fn client_info(&self) -> &Arc<ClientInfo> {
        &self.client_info
    }

    pub fn client_options(&self) -> Option<&ClientOptions> {
        self.client_options.as_ref()
    }

    pub fn admin_client_options(&self) -> Option<&ClientOptions> {
        self.admin_client_options.as_ref()
    }

    /// Data-plane client, built on first call
    ///
    /// # Errors
    ///
    /// `GapicError::NoRuntime` (wrapped in `BigtableError::Gapic`) when first
    /// called outside a tokio runtime in credentialed mode.
    pub fn table_data_client(&self) -> Result<Arc<BigtableClient>> {
        self.cached_client(&self.table_data_client, &self.client_options)
    }

    /// Table admin client, built on first call
    ///
    /// # Errors
    ///
    /// `BigtableError::Usage` unless the client was built with `admin(true)`.
    pub fn table_admin_client(&self) -> Result<Arc<BigtableTableAdminClient>> {
        if !self.admin {
            return Err(BigtableError::Usage(
                "table_admin_client requires a client constructed with admin = true".to_string(),
            ));
        }

        self.cached_client(&self.table_admin_client, &self.admin_client_options)
    }

    fn cached_client<C: GapicClient>(
        &self,
        slot: &Mutex<Option<Arc<C>>>,
        client_options: &Option<ClientOptions>,
    ) -> Result<Arc<C>> {
        memoize(slot, || create_gapic_client::<C>(client_options.clone()).build(self))
    }
}

/// Return the cached value, building it under the lock if absent
fn memoize<T>(
    slot: &Mutex<Option<Arc<T>>>,
    build: impl FnOnce() -> Result<T>,
) -> Result<Arc<T>> {
    let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(client) = cached.as_ref() {
        return Ok(Arc::clone(client));
    }

    let client = Arc::new(build()?);
    *cached = Some(Arc::clone(&client));
    Ok(client)
}

impl ClientContext for BaseClient {
    fn credentials(&self) -> &Arc<dyn Credentials> {
        &self.credentials
    }

    fn client_info(&self) -> &Arc<ClientInfo> {
        &self.client_info
    }

    fn mode(&self) -> &ClientMode {
        &self.mode
    }
}

impl fmt::Debug for BaseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseClient")
            .field("project", &self.project)
            .field("scopes", &self.scopes)
            .field("read_only", &self.read_only)
            .field("admin", &self.admin)
            .field("emulator_host", &self.emulator_host())
            .field("client_info", &self.client_info)
            .finish_non_exhaustive()
    }
}

/// Builder for [`BaseClient`]
///
/// Ambient collaborators (credential discovery, environment, emulator
/// channel construction) default to the real process environment and can be
/// replaced for testing.
pub struct BaseClientBuilder {
    project: Option<String>,
    credentials: Option<Arc<dyn Credentials>>,
    read_only: bool,
    admin: bool,
    channel: Option<Channel>,
    client_info: Option<Arc<ClientInfo>>,
    client_options: Option<ClientOptions>,
    admin_client_options: Option<ClientOptions>,
    credentials_provider: Option<Arc<dyn CredentialsProvider>>,
    environment: Arc<dyn Environment>,
    channel_factory: Arc<dyn ChannelFactory>,
}

impl Default for BaseClientBuilder {
    fn default() -> Self {
        Self {
            project: None,
            credentials: None,
            read_only: false,
            admin: false,
            channel: None,
            client_info: None,
            client_options: None,
            admin_client_options: None,
            credentials_provider: None,
            environment: default_environment(),
            channel_factory: default_channel_factory(),
        }
    }
}

impl BaseClientBuilder {
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Explicit credentials; skips ambient discovery
    pub fn credentials(mut self, credentials: Arc<dyn Credentials>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Enable the admin scope and [`BaseClient::table_admin_client`]
    pub fn admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    #[deprecated(note = "the channel is no longer used to build RPC clients")]
    pub fn channel(mut self, channel: Channel) -> Self {
        tracing::warn!("The 'channel' parameter is deprecated and no longer used");
        self.channel = Some(channel);
        self
    }

    pub fn client_info(mut self, client_info: Arc<ClientInfo>) -> Self {
        self.client_info = Some(client_info);
        self
    }

    /// Options for the data client
    pub fn client_options(mut self, client_options: ClientOptions) -> Self {
        self.client_options = Some(client_options);
        self
    }

    /// Options for the table admin client
    pub fn admin_client_options(mut self, admin_client_options: ClientOptions) -> Self {
        self.admin_client_options = Some(admin_client_options);
        self
    }

    pub fn credentials_provider(mut self, provider: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials_provider = Some(provider);
        self
    }

    pub fn environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    pub fn channel_factory(mut self, channel_factory: Arc<dyn ChannelFactory>) -> Self {
        self.channel_factory = channel_factory;
        self
    }

    /// Resolve scopes, credentials and emulator mode
    ///
    /// # Errors
    ///
    /// - `BigtableError::Configuration` if `admin` and `read_only` are both
    ///   set, no project can be determined, or the emulator host is invalid
    /// - `BigtableError::Authentication` if no credentials were given and
    ///   none could be discovered
    pub fn build(self) -> Result<BaseClient> {
        let scopes = resolve_scopes(self.admin, self.read_only)?;

        let provider = match self.credentials_provider {
            Some(provider) => provider,
            None => Arc::new(ApplicationDefaultCredentials::new(Arc::clone(
                &self.environment,
            ))),
        };
        let resolved =
            resolve_credentials(self.credentials, self.project, scopes, provider.as_ref())?;

        let mode = detect_emulator(self.environment.as_ref(), self.channel_factory.as_ref())?;

        tracing::debug!(
            "Constructed client for project {} (admin: {}, read_only: {}, emulator: {})",
            resolved.project,
            self.admin,
            self.read_only,
            mode.emulator().is_some()
        );

        Ok(BaseClient {
            project: resolved.project,
            credentials: resolved.credentials,
            scopes,
            read_only: self.read_only,
            admin: self.admin,
            mode,
            channel: self.channel,
            client_info: self
                .client_info
                .unwrap_or_else(|| Arc::new(CLIENT_INFO)),
            client_options: self.client_options,
            admin_client_options: self.admin_client_options,
            table_data_client: Mutex::new(None),
            table_admin_client: Mutex::new(None),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulator::{MockChannelFactory, MockEnvironment, BIGTABLE_EMULATOR};
    use crate::scopes::{ADMIN_SCOPE, DATA_SCOPE, READ_ONLY_SCOPE};
    use bigtable_gapic::{AccessTokenCredentials, GapicError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;
    use tonic::transport::Endpoint;

    const PROJECT: &str = "PROJECT";

    fn no_emulator() -> Arc<dyn Environment> {
        let mut environment = MockEnvironment::new();
        environment.expect_var().returning(|_| None);
        Arc::new(environment)
    }

    fn builder() -> BaseClientBuilder {
        BaseClient::builder()
            .project(PROJECT)
            .credentials(Arc::new(AccessTokenCredentials::new("token")))
            .environment(no_emulator())
    }

    #[test]
    fn test_constructor_defaults() {
        let client = builder().build().unwrap();

        assert_eq!(client.project(), PROJECT);
        assert!(!client.is_read_only());
        assert!(!client.is_admin());
        assert_eq!(**client.client_info(), CLIENT_INFO);
        assert!(client.channel().is_none());
        assert!(client.emulator_host().is_none());
        assert!(client.emulator_channel().is_none());
        assert_eq!(client.scopes(), &[DATA_SCOPE]);
        assert_eq!(client.credentials().scopes(), vec![DATA_SCOPE.to_string()]);
    }

    #[tokio::test]
    #[allow(deprecated)]
    async fn test_constructor_explicit() {
        let client_info = Arc::new(ClientInfo::new("7.0.0").with_user_agent("you-sir-age-int"));
        let channel = Endpoint::from_static("http://localhost:1234").connect_lazy();

        let client = builder()
            .read_only(false)
            .admin(true)
            .client_info(client_info.clone())
            .channel(channel)
            .build()
            .unwrap();

        assert!(client.is_admin());
        assert!(!client.is_read_only());
        assert!(Arc::ptr_eq(client.client_info(), &client_info));
        assert!(client.channel().is_some());
        assert_eq!(client.scopes(), &[DATA_SCOPE, ADMIN_SCOPE]);
    }

    #[test]
    fn test_constructor_both_admin_and_read_only() {
        let err = builder().admin(true).read_only(true).build().unwrap_err();
        assert!(matches!(err, BigtableError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_constructor_with_emulator_host() {
        let mut environment = MockEnvironment::new();
        environment
            .expect_var()
            .withf(|key| key == BIGTABLE_EMULATOR)
            .times(1)
            .returning(|_| Some("localhost:8081".to_string()));

        let mut channels = MockChannelFactory::new();
        channels
            .expect_insecure_channel()
            .withf(|host| host == "localhost:8081")
            .times(1)
            .returning(|_| Ok(Endpoint::from_static("http://localhost:8081").connect_lazy()));

        let client = builder()
            .environment(Arc::new(environment))
            .channel_factory(Arc::new(channels))
            .build()
            .unwrap();

        assert_eq!(client.emulator_host(), Some("localhost:8081"));
        assert!(client.emulator_channel().is_some());
    }

    #[test]
    fn test_scopes_read_only() {
        let client = builder().read_only(true).build().unwrap();
        assert_eq!(client.scopes(), &[READ_ONLY_SCOPE]);
    }

    #[test]
    fn test_project_path() {
        let client = builder().admin(true).build().unwrap();
        assert_eq!(client.project_path(), "projects/PROJECT");
        assert_eq!(client.project_path(), client.project_path());
    }

    #[tokio::test]
    async fn test_table_data_client_initialized() {
        let client = builder().admin(true).build().unwrap();

        let channel = Endpoint::from_static("http://localhost:1234").connect_lazy();
        let already = Arc::new(
            BigtableClient::from_channel(channel, Arc::new(ClientInfo::new("0.0.0"))).unwrap(),
        );
        *client.table_data_client.lock().unwrap() = Some(already.clone());

        assert!(Arc::ptr_eq(&client.table_data_client().unwrap(), &already));
    }

    #[tokio::test]
    async fn test_table_admin_client_initialized() {
        let client = builder().admin(true).build().unwrap();

        let channel = Endpoint::from_static("http://localhost:1234").connect_lazy();
        let already = Arc::new(
            BigtableTableAdminClient::from_channel(channel, Arc::new(ClientInfo::new("0.0.0")))
                .unwrap(),
        );
        *client.table_admin_client.lock().unwrap() = Some(already.clone());

        assert!(Arc::ptr_eq(&client.table_admin_client().unwrap(), &already));
    }

    #[test]
    fn test_table_admin_client_without_admin_flag() {
        let client = builder().build().unwrap();

        let err = client.table_admin_client().unwrap_err();
        assert!(matches!(err, BigtableError::Usage(_)));
        assert!(err.to_string().contains("admin"));
        assert!(client.table_admin_client.lock().unwrap().is_none());
    }

    #[test]
    fn test_memoize_does_not_cache_failures() {
        let slot: Mutex<Option<Arc<u32>>> = Mutex::new(None);

        let failed = memoize(&slot, || Err(BigtableError::Usage("first".to_string())));
        assert!(failed.is_err());

        let value = memoize(&slot, || Ok(7)).unwrap();
        assert_eq!(*value, 7);

        let cached = memoize(&slot, || Ok(8)).unwrap();
        assert!(Arc::ptr_eq(&value, &cached));
    }

    #[test]
    fn test_table_data_client_outside_runtime() {
        let client = builder().build().unwrap();

        let err = client.table_data_client().unwrap_err();
        assert!(matches!(err, BigtableError::Gapic(GapicError::NoRuntime)));
        assert!(client.table_data_client.lock().unwrap().is_none());
    }

    #[test]
    fn test_emulator_outside_runtime() {
        let mut environment = MockEnvironment::new();
        environment
            .expect_var()
            .withf(|key| key == BIGTABLE_EMULATOR)
            .returning(|_| Some("localhost:8086".to_string()));

        let err = builder()
            .environment(Arc::new(environment))
            .build()
            .unwrap_err();
        assert!(matches!(err, BigtableError::Gapic(GapicError::NoRuntime)));
    }

    static COUNTED_BUILDS: AtomicUsize = AtomicUsize::new(0);

    /// Counts how often the factory constructs it
    struct CountedClient {
        build: usize,
    }

    impl CountedClient {
        fn construct() -> Self {
            let build = COUNTED_BUILDS.fetch_add(1, Ordering::SeqCst);
            // Stay inside the lock long enough for every thread to contend
            std::thread::sleep(Duration::from_millis(50));
            Self { build }
        }
    }

    impl GapicClient for CountedClient {
        const DEFAULT_ENDPOINT: &'static str = "https://counted.invalid";
        const SERVICE_NAME: &'static str = "test.Counted";

        fn from_credentials(
            _credentials: Arc<dyn Credentials>,
            _client_info: Arc<ClientInfo>,
            _client_options: Option<ClientOptions>,
        ) -> bigtable_gapic::Result<Self> {
            Ok(Self::construct())
        }

        fn from_channel(
            _channel: Channel,
            _client_info: Arc<ClientInfo>,
        ) -> bigtable_gapic::Result<Self> {
            Ok(Self::construct())
        }
    }

    #[test]
    fn test_concurrent_first_access_builds_once() {
        const THREADS: usize = 8;

        let client = builder().build().unwrap();
        let slot: Mutex<Option<Arc<CountedClient>>> = Mutex::new(None);
        let barrier = Barrier::new(THREADS);

        let built: Vec<Arc<CountedClient>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        client.cached_client(&slot, &None).unwrap()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        assert_eq!(COUNTED_BUILDS.load(Ordering::SeqCst), 1);
        assert!(built.iter().all(|c| Arc::ptr_eq(c, &built[0])));
        assert_eq!(built[0].build, 0);
    }

    #[test]
    fn test_debug_output() {
        let client = builder().build().unwrap();
        let rendered = format!("{:?}", client);

        assert!(rendered.contains("PROJECT"));
        assert!(!rendered.contains("token"));
    }
}
