//! The Rust SDK for Haumea Labs: remote configuration plus fire-and-forget analytics events and
//! logs for mobile applications.
//!
//! # Overview
//!
//! The SDK revolves around a [`HaumeaClient`], identified to the server by an API key, an
//! application id and a [`Platform`]. The client fetches a remote configuration snapshot
//! ([`Flags`]: string keys to string values) and keeps the last successfully fetched one
//! available through [`HaumeaClient::config`] and [`HaumeaClient::subscribe`].
//!
//! Events and logs are sent with [`HaumeaClient::add_event`] and [`HaumeaClient::add_log`]. They
//! never block the caller; the outcome is delivered to optional [`Callbacks`].
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum. Fetching configuration always returns a
//! [`Result`]; telemetry failures go to the error callback, or to the log if none is set.
//!
//! In production, it is recommended not to treat configuration errors as fatal. A failed fetch
//! clears the current configuration, so cache the last known value yourself if you need it.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging
//! messages under the `haumea` target. Consider integrating a `log`-compatible logger
//! implementation for better visibility into SDK operations.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod api;
mod client;
mod config;
mod configuration_store;
mod error;
mod identity;
mod platform;
mod response;
mod task_scope;
mod telemetry;

pub use client::HaumeaClient;
pub use config::ClientConfig;
pub use configuration_store::Snapshot;
pub use error::{Error, Result};
pub use identity::generate_user_id;
pub use platform::Platform;
pub use response::{decode, Flags, RemoteConfigResult};
pub use telemetry::{Ack, Callbacks, Severity};
