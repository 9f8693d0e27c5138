use std::{collections::HashMap, str::FromStr};

use chrono::Utc;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Log severity accepted by the log ingestion endpoint.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Debug.
    #[display(fmt = "debug")]
    Debug,
    /// Info.
    #[display(fmt = "info")]
    Info,
    /// Warn.
    #[display(fmt = "warn")]
    Warn,
    /// Error.
    #[display(fmt = "error")]
    Error,
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "warn" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            _ => Err(Error::Validation(format!(
                "invalid severity level {s:?}. Must be one of: debug, info, warn, error"
            ))),
        }
    }
}

/// Body of `POST /addEvent`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct EventRequest {
    pub name: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub params: HashMap<String, String>,
}

impl EventRequest {
    pub fn new(name: String, params: HashMap<String, String>) -> EventRequest {
        EventRequest {
            name,
            timestamp: Utc::now().timestamp_millis(),
            params,
        }
    }
}

/// Body of `POST /addLog`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LogRequest {
    pub severity: Severity,
    pub message: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl LogRequest {
    pub fn new(severity: Severity, message: String) -> LogRequest {
        LogRequest {
            severity,
            message,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Server acknowledgment of an event or log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Whether the server reported success.
    #[serde(default = "default_success")]
    pub success: bool,
    /// Optional message from the server.
    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl Ack {
    /// Parse an acknowledgment from a 2xx response body. Bodies that are not an acknowledgment
    /// object still count as a plain success.
    pub(crate) fn from_body(body: &[u8]) -> Ack {
        serde_json::from_slice(body).unwrap_or(Ack {
            success: true,
            message: None,
        })
    }
}

type SuccessCallback = Box<dyn FnOnce(Ack) + Send + 'static>;
type ErrorCallback = Box<dyn FnOnce(Error) + Send + 'static>;

/// Completion callbacks for [`add_event`](crate::HaumeaClient::add_event) and
/// [`add_log`](crate::HaumeaClient::add_log).
///
/// At most one of the two is invoked, exactly once, from a background task. Neither is invoked
/// once the client is closed.
///
/// ```
/// # use haumea::Callbacks;
/// let callbacks = Callbacks::new()
///     .on_success(|ack| println!("sent: {:?}", ack))
///     .on_error(|err| eprintln!("failed: {}", err));
/// ```
#[derive(Default)]
pub struct Callbacks {
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
}

impl Callbacks {
    /// Callbacks that do nothing. Failures are then only visible in the `haumea` log target.
    pub fn new() -> Callbacks {
        Callbacks::default()
    }

    /// Set the callback invoked on a 2xx response.
    pub fn on_success(mut self, f: impl FnOnce(Ack) + Send + 'static) -> Callbacks {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Set the callback invoked on any transport or server failure.
    pub fn on_error(mut self, f: impl FnOnce(Error) + Send + 'static) -> Callbacks {
        self.on_error = Some(Box::new(f));
        self
    }

    pub(crate) fn complete(self, result: crate::Result<Ack>) {
        match result {
            Ok(ack) => {
                if let Some(on_success) = self.on_success {
                    on_success(ack);
                }
            }
            Err(err) => match self.on_error {
                Some(on_error) => on_error(err),
                None => {
                    log::warn!(target: "haumea", "telemetry dispatch failed: {}", err);
                }
            },
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}
