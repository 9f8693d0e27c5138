use std::sync::Arc;

use thiserror::Error;

/// Result type used throughout the SDK.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by [`HaumeaClient`](crate::HaumeaClient).
///
/// Remote configuration should never be critical enough to take a host application down. Every
/// failure is surfaced as a value: either returned from
/// [`fetch_config`](crate::HaumeaClient::fetch_config) or handed to a telemetry error callback.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The server answered 401. The API key is likely invalid.
    #[error("invalid or missing API key")]
    Unauthorized,

    /// The server answered 404: there is no application for this app id and platform.
    #[error("application not found (app_id: {app_id}, platform: {platform})")]
    AppNotFound {
        /// App id the client was configured with.
        app_id: String,
        /// Platform the client was configured with.
        platform: String,
    },

    /// The server answered 400.
    ///
    /// Carries the standard reason phrase for the status ("Bad Request"), not the phrase the
    /// server sent.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The server answered with any other non-2xx status.
    ///
    /// Carries the standard reason phrase for the status, or the numeric code when the status
    /// has none. The phrase the server sent is not available through `reqwest`.
    #[error("server error: {0}")]
    Server(String),

    /// The server answered 2xx with an error envelope.
    #[error("{0}")]
    Rejected(String),

    /// The response body matched no known envelope.
    #[error("{reason}: {cause}")]
    Decode {
        /// Short description, usually "Invalid response format".
        reason: String,
        /// Message of the underlying parse failure.
        cause: String,
    },

    /// Transport failure: connection refused, TLS, truncated body and so on.
    #[error(transparent)]
    Network(Arc<reqwest::Error>),

    /// Input rejected before any network activity.
    #[error("{0}")]
    Validation(String),

    /// Invalid base_url configuration.
    #[error("invalid base_url configuration")]
    InvalidBaseUrl(#[source] url::ParseError),

    /// Platform is neither `android` nor `ios`.
    #[error("platform must be either 'android' or 'ios', got {0:?}")]
    InvalidPlatform(String),

    /// The background runtime could not be started.
    // std::io::Error is not clonable, so we're wrapping it in an Arc.
    #[error("failed to start background runtime")]
    Runtime(#[source] Arc<std::io::Error>),

    /// The client has been closed.
    #[error("client is closed")]
    Closed,
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(Arc::new(value.without_url()))
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Runtime(Arc::new(value))
    }
}
