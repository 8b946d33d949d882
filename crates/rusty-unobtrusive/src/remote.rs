// File: src/remote.rs
// Purpose: Remote rule runner - one HTTP round-trip per check, JSON bool-or-string answer

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::RemoteConfig;
use crate::dom::NodeId;
use crate::error::RemoteError;

/// HTTP verb used by a remote rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    /// `POST` in any case selects POST, anything else GET
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("post") => HttpMethod::Post,
            _ => HttpMethod::Get,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Configuration of a remote rule, as produced by the `remote` adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSpec {
    pub url: String,
    pub method: HttpMethod,
    /// Fully-qualified field names whose values are sent along
    pub additional_fields: Vec<String>,
}

/// One issued remote check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRequest {
    pub form: NodeId,
    pub field: String,
    /// Only the latest generation issued for `field` is applied
    pub generation: u64,
    pub url: String,
    pub method: HttpMethod,
    pub data: Vec<(String, String)>,
}

/// Interpreted server answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOutcome {
    Valid,
    /// Invalid; a server-supplied message replaces the configured one
    Invalid(Option<String>),
}

impl RemoteOutcome {
    /// `true`/`"true"` pass, other strings fail with that message,
    /// anything else fails with the configured message
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Bool(true) => RemoteOutcome::Valid,
            JsonValue::String(s) if s == "true" => RemoteOutcome::Valid,
            JsonValue::String(s) => RemoteOutcome::Invalid(Some(s.clone())),
            _ => RemoteOutcome::Invalid(None),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, RemoteOutcome::Valid)
    }
}

/// Sends a remote request and returns the decoded JSON body
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn send(&self, request: &RemoteRequest) -> Result<JsonValue, RemoteError>;

    /// Transport name for logs
    fn name(&self) -> &'static str;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Option<Url>,
}

impl HttpTransport {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|e| RemoteError::InvalidUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// Transport against `base_url` with no timeout
    pub fn with_base_url(base_url: &str) -> Result<Self, RemoteError> {
        Self::new(&RemoteConfig {
            base_url: Some(base_url.to_string()),
            ..RemoteConfig::default()
        })
    }

    /// Absolute URLs are used as-is; relative ones join the base URL
    pub fn resolve(&self, raw: &str) -> Result<Url, RemoteError> {
        let invalid = |reason: String| RemoteError::InvalidUrl {
            url: raw.to_string(),
            reason,
        };
        match Url::parse(raw) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match &self.base_url {
                Some(base) => base.join(raw).map_err(|e| invalid(e.to_string())),
                None => Err(invalid("relative url without a base url".to_string())),
            },
            Err(e) => Err(invalid(e.to_string())),
        }
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn send(&self, request: &RemoteRequest) -> Result<JsonValue, RemoteError> {
        let mut url = self.resolve(&request.url)?;

        let builder = match request.method {
            HttpMethod::Get => {
                url.query_pairs_mut().extend_pairs(request.data.iter());
                self.client.get(url)
            }
            HttpMethod::Post => self.client.post(url).form(&request.data),
        };

        let response = builder
            .header(
                ACCEPT,
                HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
            )
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Runs remote checks and folds every failure into an invalid outcome
pub struct RemoteRunner<T> {
    transport: T,
    failure_message: String,
}

impl<T: RemoteTransport> RemoteRunner<T> {
    pub fn new(transport: T, failure_message: impl Into<String>) -> Self {
        Self {
            transport,
            failure_message: failure_message.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn failure_message(&self) -> &str {
        &self.failure_message
    }

    pub async fn run(&self, request: &RemoteRequest) -> RemoteOutcome {
        debug!(
            field = %request.field,
            generation = request.generation,
            method = request.method.as_str(),
            url = %request.url,
            transport = self.transport.name(),
            "remote check issued"
        );
        match self.transport.send(request).await {
            Ok(body) => RemoteOutcome::from_json(&body),
            Err(e) => {
                warn!(field = %request.field, url = %request.url, "remote check failed: {}", e);
                RemoteOutcome::Invalid(Some(self.failure_message.clone()))
            }
        }
    }
}
