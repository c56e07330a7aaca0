use std::{
    sync::{LazyLock, RwLock},
    time::Duration,
};

use ureq::{Agent, Proxy};

/// Default per-request timeout for archive downloads.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Default number of redirect hops followed before giving up.
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub user_agent: Option<String>,
    pub proxy: Option<Proxy>,
    pub timeout: Option<Duration>,
    pub max_redirects: u32,
}

impl Default for ClientConfig {
    /// Creates a default ClientConfig with the filekit user agent, a 30 second timeout and
    /// up to ten redirect hops.
    ///
    /// # Examples
    ///
    /// ```
    /// use filekit_dl::http_client::ClientConfig;
    ///
    /// let cfg = ClientConfig::default();
    /// assert!(cfg.user_agent.as_deref().unwrap().starts_with("filekit/"));
    /// assert!(cfg.proxy.is_none());
    /// assert_eq!(cfg.timeout.unwrap().as_millis(), 30_000);
    /// ```
    fn default() -> Self {
        Self {
            user_agent: Some(concat!("filekit/", env!("CARGO_PKG_VERSION")).into()),
            proxy: None,
            timeout: Some(DEFAULT_TIMEOUT),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl ClientConfig {
    /// Builds an HTTP `Agent` configured from this `ClientConfig`.
    ///
    /// Redirects are never followed by the agent itself and non-2xx statuses are returned as
    /// regular responses: [`crate::http::Http`] resolves `Location` headers and classifies
    /// statuses on its own. The configured timeout bounds the whole request, body included.
    pub fn build(&self) -> Agent {
        let mut config = ureq::Agent::config_builder()
            .proxy(self.proxy.clone())
            .timeout_global(self.timeout)
            .max_redirects(0)
            .http_status_as_error(false);

        if let Some(user_agent) = &self.user_agent {
            config = config.user_agent(user_agent);
        }

        config.build().into()
    }
}

static SHARED_CLIENT_CONFIG: LazyLock<RwLock<ClientConfig>> =
    LazyLock::new(|| RwLock::new(ClientConfig::default()));

/// Returns a copy of the process-wide client configuration.
pub fn shared_client_config() -> ClientConfig {
    SHARED_CLIENT_CONFIG
        .read()
        .map(|config| config.clone())
        .unwrap_or_default()
}

/// Updates the process-wide HTTP client configuration.
///
/// Requests issued after this call observe the updated configuration.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use filekit_dl::http_client::{configure_http_client, shared_client_config};
///
/// configure_http_client(|cfg| {
///     cfg.timeout = Some(Duration::from_secs(5));
/// });
/// assert_eq!(shared_client_config().timeout, Some(Duration::from_secs(5)));
/// ```
pub fn configure_http_client<F>(updater: F)
where
    F: FnOnce(&mut ClientConfig),
{
    let mut state = SHARED_CLIENT_CONFIG
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    updater(&mut state);
}
