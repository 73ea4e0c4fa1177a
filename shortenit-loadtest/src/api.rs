//! Wire types of the shortener API and the client capability used by the driver.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::TransportError;

/// One of the endpoints exercised by the workload.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Endpoint {
    /// `POST /forward`, maps a long URL to a short identifier.
    Forward,
    /// `POST /backward`, resolves a short identifier back to its long URL.
    Backward,
    /// `GET /healthz`.
    Healthz,
}

impl Endpoint {
    /// The request path, relative to the target host.
    pub fn path(self) -> &'static str {
        match self {
            Self::Forward => "/forward",
            Self::Backward => "/backward",
            Self::Healthz => "/healthz",
        }
    }

    /// Returns `true` if requests to this endpoint are sent as `POST` with a JSON body.
    pub fn is_post(self) -> bool {
        !matches!(self, Self::Healthz)
    }

    /// Name under which requests to this endpoint are aggregated in reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::Forward => "POST /forward",
            Self::Backward => "POST /backward",
            Self::Healthz => "GET /healthz",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Response body of `POST /forward`.
///
/// All fields are optional so that presence can be validated explicitly.
#[derive(Debug, Default, Deserialize)]
pub struct ForwardResponse {
    /// The short identifier assigned to the long URL.
    #[serde(default)]
    pub short_url: Option<String>,
}

/// Response body of `POST /backward`.
///
/// Held as a raw JSON object, since a resolve is judged by which keys are present rather than by
/// the types of their values.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct BackwardResponse {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl BackwardResponse {
    /// The value of the `long_url` key, if the key is present at all. May be `null`.
    pub fn long_url(&self) -> Option<&serde_json::Value> {
        self.fields.get("long_url")
    }

    /// Returns `true` if `status` is the `"not_found"` marker for unknown identifiers.
    pub fn is_not_found(&self) -> bool {
        self.fields.get("status").and_then(serde_json::Value::as_str) == Some("not_found")
    }
}

/// A single request against the shortener API.
#[derive(Debug)]
pub struct ApiRequest {
    /// The endpoint to call.
    pub endpoint: Endpoint,
    /// JSON body for `POST` endpoints.
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// A `POST /forward` request for `long_url`.
    pub fn forward(long_url: &str) -> Self {
        Self {
            endpoint: Endpoint::Forward,
            body: Some(json!({ "long_url": long_url })),
        }
    }

    /// A `POST /backward` request for `short_url`.
    pub fn backward(short_url: &str) -> Self {
        Self {
            endpoint: Endpoint::Backward,
            body: Some(json!({ "short_url": short_url })),
        }
    }

    /// A `GET /healthz` request.
    pub fn healthz() -> Self {
        Self {
            endpoint: Endpoint::Healthz,
            body: None,
        }
    }
}

/// The parts of a response that matter for validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl ApiResponse {
    /// Creates a response from a status code and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The capability of issuing requests to the shortener API.
///
/// The driver only ever talks to the service through this trait, which makes it independent of the
/// load-testing framework and lets tests substitute scripted responses.
#[async_trait]
pub trait ShortenerApi: Send {
    /// Sends `request` and returns the status and body of the response.
    async fn call(&mut self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

