//! HTTP client for the Haumea Labs API.
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    RequestBuilder, StatusCode, Url,
};
use serde::Serialize;

use crate::{
    identity::ClientIdentity,
    response::decode,
    telemetry::{Ack, EventRequest, LogRequest},
    ClientConfig, Error, Flags, Result,
};

const REMOTE_CONFIG_ENDPOINT: &str = "/remote-config";
const ADD_EVENT_ENDPOINT: &str = "/addEvent";
const ADD_LOG_ENDPOINT: &str = "/addLog";

struct Endpoints {
    remote_config: Url,
    add_event: Url,
    add_log: Url,
}

impl Endpoints {
    fn new(base_url: &str) -> Result<Endpoints> {
        let base_url = base_url.trim_end_matches('/');
        let endpoint = |path: &str| {
            Url::parse(&format!("{}{}", base_url, path)).map_err(Error::InvalidBaseUrl)
        };

        Ok(Endpoints {
            remote_config: endpoint(REMOTE_CONFIG_ENDPOINT)?,
            add_event: endpoint(ADD_EVENT_ENDPOINT)?,
            add_log: endpoint(ADD_LOG_ENDPOINT)?,
        })
    }
}

/// Issues single requests to the API. Never retries.
pub(crate) struct ApiClient {
    // Client holds a connection pool internally, so we're reusing the client between requests.
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<ApiClient> {
        let endpoints = Endpoints::new(&config.base_url)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .user_agent(concat!("haumea-rust/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(ApiClient { client, endpoints })
    }

    /// Fetch and decode remote configuration.
    pub async fn fetch_configuration(&self, identity: &ClientIdentity) -> Result<Flags> {
        log::debug!(target: "haumea", app_id = identity.app_id.as_str(); "fetching remote configuration");

        let response = self
            .client
            .get(self.endpoints.remote_config.clone())
            .with_identity(identity)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!(target: "haumea", status = status.as_u16(); "received non-2xx response while fetching remote configuration");
            return Err(status_error(status, identity));
        }

        let body = response.bytes().await?;
        let flags = decode(&body).into_result()?;

        log::debug!(target: "haumea", flag_count = flags.len(); "successfully fetched remote configuration");
        Ok(flags)
    }

    pub async fn send_event(
        &self,
        identity: &ClientIdentity,
        user_id: &str,
        event: &EventRequest,
    ) -> Result<Ack> {
        log::debug!(target: "haumea", event = event.name.as_str(); "sending event");
        self.post(&self.endpoints.add_event, identity, user_id, event)
            .await
    }

    pub async fn send_log(
        &self,
        identity: &ClientIdentity,
        user_id: &str,
        entry: &LogRequest,
    ) -> Result<Ack> {
        log::debug!(target: "haumea", severity:% = entry.severity; "sending log");
        self.post(&self.endpoints.add_log, identity, user_id, entry)
            .await
    }

    async fn post(
        &self,
        url: &Url,
        identity: &ClientIdentity,
        user_id: &str,
        body: &impl Serialize,
    ) -> Result<Ack> {
        let response = self
            .client
            .post(url.clone())
            .with_identity(identity)
            .header("userid", user_id)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, identity));
        }

        let body = response.bytes().await?;
        Ok(Ack::from_body(&body))
    }
}

trait RequestBuilderExt {
    fn with_identity(self, identity: &ClientIdentity) -> Self;
}

impl RequestBuilderExt for RequestBuilder {
    fn with_identity(self, identity: &ClientIdentity) -> Self {
        self.header("x-api-key", identity.api_key.as_str())
            .header("app-id", identity.app_id.as_str())
            .header("platform", identity.platform.as_str())
    }
}

/// Map a non-2xx status to an error.
///
/// The description is the standard reason phrase for `status`, falling back to the numeric code.
fn status_error(status: StatusCode, identity: &ClientIdentity) -> Error {
    let description = status
        .canonical_reason()
        .unwrap_or(status.as_str())
        .to_owned();

    match status {
        StatusCode::UNAUTHORIZED => {
            log::warn!(target: "haumea", "client is not authorized. Check your API key");
            Error::Unauthorized
        }
        StatusCode::NOT_FOUND => Error::AppNotFound {
            app_id: identity.app_id.clone(),
            platform: identity.platform.to_string(),
        },
        StatusCode::BAD_REQUEST => Error::BadRequest(description),
        _ => Error::Server(description),
    }
}
