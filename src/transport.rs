//! HTTP transport bound to the dashboard base URL.
//!
//! Every network failure is returned as a [`TransportError`] value; nothing
//! here panics or retries.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::TargetConfig;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid base URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("connection to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("response from {url} is not valid JSON (HTTP {status}): {reason}")]
    Decode {
        url: String,
        status: u16,
        reason: String,
    },
}

impl TransportError {
    fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        let url = url.to_string();
        if source.is_timeout() {
            Self::Timeout { url }
        } else if source.is_connect() {
            Self::Connect { url, source }
        } else {
            Self::Request { url, source }
        }
    }
}

/// Response body: parsed JSON when possible, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
}

/// Status code and body of one completed request.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub url: String,
    pub status: u16,
    pub body: Body,
}

impl ApiResponse {
    /// The JSON body, or a decode failure naming the call.
    pub fn json(&self) -> Result<&Value, TransportError> {
        match &self.body {
            Body::Json(v) => Ok(v),
            Body::Text(text) => Err(TransportError::Decode {
                url: self.url.clone(),
                status: self.status,
                reason: format!("body starts with {:?}", excerpt(text, 80)),
            }),
        }
    }

    /// Short body excerpt for failure details.
    pub fn body_excerpt(&self) -> String {
        match &self.body {
            Body::Json(v) => excerpt(&v.to_string(), 200),
            Body::Text(t) => excerpt(t, 200),
        }
    }
}

fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

/// Reusable client for the dashboard API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client with the fixed process-wide headers.
    pub fn new(target: &TargetConfig) -> Result<Self, TransportError> {
        let base_url = target.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| TransportError::InvalidUrl {
            url: target.base_url.clone(),
            reason: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder()
            .default_headers(headers)
            .user_agent(target.user_agent.clone());
        if let Some(timeout) = target.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue `GET {base_url}{path}` with the given query pairs.
    ///
    /// `path` is appended verbatim, so empty segments such as
    /// `/api/player//history` reach the server untouched.
    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse, TransportError> {
        let raw = format!("{}{}", self.base_url, path);
        let url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&raw, e))?;

        let status = response.status().as_u16();
        let full_url = response.url().to_string();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(&raw, e))?;
        debug!(method = "GET", url = %full_url, status, bytes = text.len(), "response received");

        let body = match serde_json::from_str::<Value>(&text) {
            Ok(v) => Body::Json(v),
            Err(_) => Body::Text(text),
        };

        Ok(ApiResponse {
            url: full_url,
            status,
            body,
        })
    }
}
