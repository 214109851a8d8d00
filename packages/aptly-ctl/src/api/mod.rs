//! A thin client for the Aptly REST API.
//!
//! Every method issues exactly one request: no retries, no batching. Non-2xx
//! responses come back as [`ApiError`]s carrying the status and the server's
//! message; everything else is deserialized into the types in the submodules.

use percent_encoding::{AsciiSet, CONTROLS, PercentEncode, percent_encode};
use reqwest::{
    RequestBuilder, Url,
    header::{HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::{
    Error,
    config::{Config, ConfigError},
};

mod error;
pub mod publish;
pub mod repo;
pub mod snapshot;

pub use error::ApiError;

/// Characters that must be escaped inside a single URL path segment.
pub const PATH_SEGMENT_PERCENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode one path segment.
pub fn segment(value: &str) -> PercentEncode<'_> {
    percent_encode(value.as_bytes(), PATH_SEGMENT_PERCENT_ENCODE_SET)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Version {
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    endpoint: Url,
}

impl Client {
    /// Build a client for the API served under `endpoint`.
    ///
    /// The endpoint is the server root: requests go to `<endpoint>/api/...`.
    pub fn new(endpoint: Url) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        // A single CLI invocation may spawn several requests; this lets the
        // server logs tie them together.
        if let Ok(invocation) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            headers.insert("X-Invocation-ID", invocation);
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("aptly-ctl/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Self::new(config.url.clone())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Resolve an API path (already percent-encoded) against the endpoint.
    fn url(&self, path: &str) -> Result<Url, Error> {
        let path = format!("api/{path}");
        self.endpoint.join(&path).map_err(|source| {
            Error::from(ConfigError::Url {
                url: format!("{}{path}", self.endpoint),
                source,
            })
        })
    }

    fn get(&self, path: &str) -> Result<RequestBuilder, Error> {
        Ok(self.client.get(self.url(path)?))
    }

    fn post(&self, path: &str) -> Result<RequestBuilder, Error> {
        Ok(self.client.post(self.url(path)?))
    }

    fn put(&self, path: &str) -> Result<RequestBuilder, Error> {
        Ok(self.client.put(self.url(path)?))
    }

    fn delete(&self, path: &str) -> Result<RequestBuilder, Error> {
        Ok(self.client.delete(self.url(path)?))
    }

    /// Send a request and return the body of a 2xx response.
    async fn execute(&self, request: RequestBuilder) -> Result<String, Error> {
        let res = request.send().await?;
        let status = res.status();
        let url = res.url().to_string();
        let body = res.text().await?;
        trace!(%url, %status, %body, "response");

        if !status.is_success() {
            debug!(%url, %status, %body, "error response");
            return Err(ApiError::from_body(status, &body).into());
        }
        Ok(body)
    }

    /// Send a request and deserialize the body of a 2xx response.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let body = self.execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// The version of the Aptly server.
    #[instrument(skip(self))]
    pub async fn version(&self) -> Result<Version, Error> {
        self.send(self.get("version")?).await
    }
}
