use std::{collections::HashMap, sync::Arc};

use tokio::sync::watch;

use crate::{
    api::ApiClient,
    configuration_store::{ConfigurationStore, Snapshot},
    identity::ClientIdentity,
    task_scope::TaskScope,
    telemetry::{EventRequest, LogRequest},
    Callbacks, ClientConfig, Error, Flags, Platform, Result, Severity,
};

/// A client for the Haumea Labs API.
///
/// In order to create a client instance, first create [`ClientConfig`].
///
/// The client owns an HTTP connection pool, the last fetched configuration and a scope for its
/// background tasks. [`close`](HaumeaClient::close) (or dropping the client) cancels every
/// background task; no callback runs after that.
///
/// # Examples
/// ```no_run
/// # use haumea::{ClientConfig, Platform};
/// # async fn run() -> haumea::Result<()> {
/// let client = ClientConfig::new("api-key", "app-id")
///     .platform(Platform::Android)
///     .to_client()?;
///
/// let flags = client.fetch_config().await?;
/// println!("theme: {:?}", flags.get("theme"));
/// # Ok(())
/// # }
/// ```
pub struct HaumeaClient {
    inner: Arc<Inner>,
    scope: TaskScope,
}

/// State shared with background tasks.
struct Inner {
    api: ApiClient,
    identity: ClientIdentity,
    configuration_store: ConfigurationStore,
}

impl Inner {
    /// Fetch configuration and store the outcome: the new flags on success, nothing on failure.
    async fn fetch_config(&self) -> Result<Arc<Flags>> {
        match self.api.fetch_configuration(&self.identity).await {
            Ok(flags) => {
                let flags = Arc::new(flags);
                self.configuration_store.set_configuration(flags.clone());
                Ok(flags)
            }
            Err(err) => {
                log::warn!(target: "haumea", "failed to fetch remote configuration: {}", err);
                self.configuration_store.clear();
                Err(err)
            }
        }
    }
}

impl HaumeaClient {
    /// Create a new `HaumeaClient` using the specified configuration.
    ///
    /// Same as [`ClientConfig::to_client`].
    pub fn new(config: ClientConfig) -> Result<HaumeaClient> {
        let platform = config
            .platform
            .or_else(Platform::detect)
            .ok_or_else(|| Error::InvalidPlatform(std::env::consts::OS.to_owned()))?;

        let api = ApiClient::new(&config)?;
        let scope = TaskScope::new(config.runtime.clone())?;
        let identity = ClientIdentity::new(config.api_key, config.app_id, platform, config.user_id);

        log::debug!(target: "haumea",
                    app_id = identity.app_id.as_str(),
                    platform = platform.as_str();
                    "client created");

        Ok(HaumeaClient {
            inner: Arc::new(Inner {
                api,
                identity,
                configuration_store: ConfigurationStore::new(),
            }),
            scope,
        })
    }

    /// Fetch remote configuration and wait for the result.
    ///
    /// On success the fetched flags replace the current configuration. On any failure (network,
    /// non-2xx status, error envelope, undecodable body) the current configuration is cleared and
    /// the error is returned.
    ///
    /// Dropping the returned future abandons the request; the configuration is then left as it
    /// was.
    pub async fn fetch_config(&self) -> Result<Arc<Flags>> {
        self.ensure_open()?;
        let inner = self.inner.clone();
        self.scope.run(async move { inner.fetch_config().await }).await?
    }

    /// Fetch remote configuration in the background.
    ///
    /// The outcome is only visible through [`config`](HaumeaClient::config) and
    /// [`subscribe`](HaumeaClient::subscribe). Concurrent refreshes are not de-duplicated; the
    /// one that completes last wins.
    pub fn fetch_config_async(&self) -> Result<()> {
        self.ensure_open()?;
        let inner = self.inner.clone();
        self.scope.spawn(
            async move { inner.fetch_config().await },
            |result| match result {
                Ok(flags) => {
                    log::trace!(target: "haumea", flag_count = flags.len(); "successfully updated remote configuration")
                }
                Err(err) => {
                    log::trace!(target: "haumea", "failed to refresh remote configuration: {}", err)
                }
            },
        );
        Ok(())
    }

    /// Send an analytics event in the background.
    ///
    /// Returns immediately. The outcome is reported through `callbacks`.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `name` is empty. Nothing is sent in that case.
    /// - [`Error::Closed`] if the client has been closed.
    pub fn add_event(
        &self,
        name: impl Into<String>,
        params: HashMap<String, String>,
        callbacks: Callbacks,
    ) -> Result<()> {
        self.ensure_open()?;
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Validation("event name must not be empty".to_owned()));
        }

        let event = EventRequest::new(name, params);
        let user_id = self.inner.identity.user_id();
        let inner = self.inner.clone();
        self.scope.spawn(
            async move {
                inner
                    .api
                    .send_event(&inner.identity, &user_id, &event)
                    .await
            },
            move |result| callbacks.complete(result),
        );
        Ok(())
    }

    /// Send a log line in the background.
    ///
    /// Returns immediately. The outcome is reported through `callbacks`.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `severity` is not one of `debug`, `info`, `warn`, `error`.
    ///   Nothing is sent in that case.
    /// - [`Error::Closed`] if the client has been closed.
    pub fn add_log(
        &self,
        severity: &str,
        message: impl Into<String>,
        callbacks: Callbacks,
    ) -> Result<()> {
        self.ensure_open()?;
        let severity: Severity = severity.parse()?;

        let entry = LogRequest::new(severity, message.into());
        let user_id = self.inner.identity.user_id();
        let inner = self.inner.clone();
        self.scope.spawn(
            async move { inner.api.send_log(&inner.identity, &user_id, &entry).await },
            move |result| callbacks.complete(result),
        );
        Ok(())
    }

    /// Currently active configuration. `None` until a fetch succeeds, and again after a fetch
    /// fails.
    pub fn config(&self) -> Snapshot {
        self.inner.configuration_store.get_configuration()
    }

    /// Value of a single flag in the currently active configuration.
    pub fn flag(&self, key: &str) -> Option<String> {
        self.config()?.get(key).cloned()
    }

    /// Subscribe to configuration changes. The receiver starts with the current configuration.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.configuration_store.subscribe()
    }

    /// User id sent with events and logs.
    pub fn user_id(&self) -> String {
        self.inner.identity.user_id()
    }

    /// Replace the user id, e.g. once the real user is known. Affects events and logs sent after
    /// this call.
    pub fn set_user_id(&self, user_id: impl Into<String>) {
        self.inner.identity.set_user_id(user_id.into());
    }

    /// Platform the client reports to the server.
    pub fn platform(&self) -> Platform {
        self.inner.identity.platform
    }

    /// Application id the client was created with.
    pub fn app_id(&self) -> &str {
        &self.inner.identity.app_id
    }

    /// Cancel all background tasks and release resources. Idempotent.
    ///
    /// Operations called after `close` return [`Error::Closed`].
    pub fn close(&self) {
        if self.scope.is_closed() {
            return;
        }
        log::debug!(target: "haumea", "closing client");
        self.scope.close();
    }

    /// Whether [`close`](HaumeaClient::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.scope.is_closed()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.scope.is_closed() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    #[cfg(test)]
    fn configuration_store(&self) -> &ConfigurationStore {
        &self.inner.configuration_store
    }
}

impl Drop for HaumeaClient {
    fn drop(&mut self) {
        self.close();
    }
}
