//! HTTP client for the simulator API.
//!
//! Every request carries the active trace context, so client and server
//! spans land in one trace. Requests are limited to the API's own origin,
//! mirroring a browser's cross-origin policy.

use std::time::Duration;

use axum::http::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::observability::tracing::inject_context;

/// Errors raised on the client side.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cross-origin request to {target} blocked; allowed origin is {allowed}")]
    CrossOriginBlocked { target: String, allowed: String },

    #[error("malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

impl ClientError {
    /// Short name used as the reported error type.
    pub fn name(&self) -> &'static str {
        match self {
            ClientError::InvalidUrl { .. } => "InvalidUrl",
            ClientError::Request { .. } => "NetworkError",
            ClientError::CrossOriginBlocked { .. } => "CrossOriginBlocked",
            ClientError::MalformedJson(_) => "SyntaxError",
        }
    }
}

/// A decoded response from the API.
#[derive(Debug, Clone)]
pub struct ServerReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ServerReply {
    /// Trace ID echoed by the server, if any.
    pub fn trace_id(&self) -> Option<&str> {
        self.body.get("traceId").and_then(Value::as_str)
    }

    /// `"<status> <error|message|status> (traceId: <id|none>)"`.
    pub fn summary(&self) -> String {
        let headline = ["error", "message", "status"]
            .iter()
            .find_map(|key| self.body.get(*key).and_then(Value::as_str))
            .unwrap_or("no body");
        format!(
            "{} {} (traceId: {})",
            self.status.as_u16(),
            headline,
            self.trace_id().unwrap_or("none")
        )
    }
}

/// Client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base = parse_url(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::Request {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self { http, base })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for `path` under the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET `path` under the base URL and decode the JSON body.
    ///
    /// Non-2xx answers are returned as replies, not errors.
    pub async fn get(&self, path: &str) -> Result<ServerReply, ClientError> {
        let url = self.endpoint(path);
        let response = self.fetch(&url).await?;
        let status = response.status();
        let text = response.text().await.map_err(|source| ClientError::Request {
            url: url.clone(),
            source,
        })?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        Ok(ServerReply { status, body })
    }

    /// GET an absolute URL, refusing foreign origins.
    pub async fn fetch(&self, url: &str) -> Result<reqwest::Response, ClientError> {
        let target = parse_url(url)?;
        if target.origin() != self.base.origin() {
            return Err(ClientError::CrossOriginBlocked {
                target: target.origin().ascii_serialization(),
                allowed: self.base.origin().ascii_serialization(),
            });
        }
        self.send(target).await
    }

    /// GET an absolute URL without the origin check. Only meaningful for
    /// targets where the connection itself is expected to fail.
    pub async fn fetch_unguarded(&self, url: &str) -> Result<reqwest::Response, ClientError> {
        let target = parse_url(url)?;
        self.send(target).await
    }

    async fn send(&self, target: Url) -> Result<reqwest::Response, ClientError> {
        let mut headers = HeaderMap::new();
        inject_context(&mut headers);

        tracing::debug!(url = %target, "Sending request");
        self.http
            .get(target.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|source| ClientError::Request {
                url: target.to_string(),
                source,
            })
    }
}

fn parse_url(url: &str) -> Result<Url, ClientError> {
    Url::parse(url).map_err(|source| ClientError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}
