//! Contains a remote implementation using HTTP to interact with the shortener.

use async_trait::async_trait;

use crate::api::{ApiRequest, ApiResponse, ShortenerApi};
use crate::error::TransportError;

/// A [`ShortenerApi`] that sends requests with a plain [`reqwest::Client`].
///
/// This drives the workload without a load-testing framework, for example from tests or tools that
/// want to issue individual operations.
#[derive(Clone, Debug)]
pub struct HttpRemote {
    /// Base URL of the shortener, without a trailing slash.
    remote: String,
    /// The HTTP client used to talk to the service.
    client: reqwest::Client,
}

impl HttpRemote {
    /// Creates a new `HttpRemote` instance with the given remote URL and a default client.
    pub fn new(remote: impl Into<String>) -> Self {
        Self::with_client(remote, reqwest::Client::new())
    }

    /// Creates a new `HttpRemote` that sends requests through `client`.
    ///
    /// Timeouts and connection pooling are taken from the client's configuration.
    pub fn with_client(remote: impl Into<String>, client: reqwest::Client) -> Self {
        let mut remote = remote.into();
        while remote.ends_with('/') {
            remote.pop();
        }
        Self { remote, client }
    }

    /// The base URL requests are sent to.
    pub fn remote(&self) -> &str {
        &self.remote
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.remote, path)
    }
}

#[async_trait]
impl ShortenerApi for HttpRemote {
    async fn call(&mut self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let endpoint = request.endpoint;
        let url = self.url(endpoint.path());

        let mut builder = if endpoint.is_post() {
            self.client.post(url)
        } else {
            self.client.get(url)
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::new(endpoint, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(endpoint, e))?;

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slashes() {
        let remote = HttpRemote::new("http://localhost:8080//");
        assert_eq!(remote.remote(), "http://localhost:8080");
        assert_eq!(remote.url("/forward"), "http://localhost:8080/forward");
    }
}
