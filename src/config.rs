use tokio::runtime::Handle;

use crate::{HaumeaClient, Platform, Result};

/// Configuration for [`HaumeaClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub(crate) api_key: String,
    pub(crate) app_id: String,
    pub(crate) platform: Option<Platform>,
    pub(crate) base_url: String,
    pub(crate) user_id: Option<String>,
    pub(crate) runtime: Option<Handle>,
}

impl ClientConfig {
    /// Default base URL for API calls.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.haumealabs.com";

    /// Create a default configuration for the given API key and application id.
    ///
    /// ```
    /// # use haumea::ClientConfig;
    /// ClientConfig::new("api-key", "app-id");
    /// ```
    pub fn new(api_key: impl Into<String>, app_id: impl Into<String>) -> ClientConfig {
        ClientConfig {
            api_key: api_key.into(),
            app_id: app_id.into(),
            platform: None,
            base_url: ClientConfig::DEFAULT_BASE_URL.to_owned(),
            user_id: None,
            runtime: None,
        }
    }

    /// Set the platform explicitly. When unset, the platform is detected from the compilation
    /// target, and building the client fails on targets other than Android and iOS.
    ///
    /// ```
    /// # use haumea::{ClientConfig, Platform};
    /// let config = ClientConfig::new("api-key", "app-id").platform(Platform::Ios);
    /// ```
    pub fn platform(mut self, platform: Platform) -> ClientConfig {
        self.platform = Some(platform);
        self
    }

    /// Override base URL for API calls. Clients should use the default setting in most cases.
    pub fn base_url(mut self, base_url: impl Into<String>) -> ClientConfig {
        self.base_url = base_url.into();
        self
    }

    /// Start with a known user id instead of a randomly generated one.
    pub fn user_id(mut self, user_id: impl Into<String>) -> ClientConfig {
        self.user_id = Some(user_id.into());
        self
    }

    /// Run background tasks on this tokio runtime.
    ///
    /// Defaults to the runtime the client is created on. If the client is created outside of any
    /// tokio runtime, it starts a small runtime of its own and shuts it down on close.
    pub fn runtime(mut self, handle: Handle) -> ClientConfig {
        self.runtime = Some(handle);
        self
    }

    /// Create a new [`HaumeaClient`] using this configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPlatform`](crate::Error::InvalidPlatform) if no platform was set and
    ///   none could be detected.
    /// - [`Error::InvalidBaseUrl`](crate::Error::InvalidBaseUrl) if the base URL does not parse.
    pub fn to_client(self) -> Result<HaumeaClient> {
        HaumeaClient::new(self)
    }
}
