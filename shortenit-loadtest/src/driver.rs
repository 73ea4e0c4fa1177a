//! The operations performed by a simulated user, and how their responses are judged.
//!
//! Every operation issues at most one request through a [`ShortenerApi`], validates the response
//! and returns a [`Sample`]. Failures never escape as errors; they are part of the sample.

use crate::api::{
    ApiRequest, ApiResponse, BackwardResponse, Endpoint, ForwardResponse, ShortenerApi,
};
use crate::error::ValidationError;
use crate::pool::ShortUrlPool;
use crate::workload::{Action, random_long_url};

/// The verdict on a single response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The response satisfied all rules of its endpoint.
    Success,
    /// The response violated a rule; the error describes which.
    Failure(ValidationError),
}

impl ValidationOutcome {
    /// Returns `true` for [`ValidationOutcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// The diagnostic message of a failure.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Success => None,
            Self::Failure(error) => Some(error.to_string()),
        }
    }
}

impl<T> From<Result<T, ValidationError>> for ValidationOutcome {
    fn from(result: Result<T, ValidationError>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(error) => Self::Failure(error),
        }
    }
}

/// How a successful resolve was answered.
///
/// Both variants count as success; they are kept apart so hit and miss rates can be told apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The service answered with a `long_url` key.
    ///
    /// Holds the value as is for strings, and as JSON text for any other value.
    Found(String),
    /// The service answered with the `not_found` marker.
    NotFound,
}

/// The recorded result of one operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    /// The endpoint that was actually called.
    pub endpoint: Endpoint,
    /// Whether the response passed validation.
    pub outcome: ValidationOutcome,
    /// For successful resolves, what the short URL resolved to.
    pub resolution: Option<Resolution>,
}

impl Sample {
    fn new(endpoint: Endpoint, outcome: impl Into<ValidationOutcome>) -> Self {
        Self {
            endpoint,
            outcome: outcome.into(),
            resolution: None,
        }
    }
}

/// Runs `action` once.
pub async fn perform<A>(api: &mut A, pool: &ShortUrlPool, action: Action) -> Sample
where
    A: ShortenerApi + ?Sized,
{
    match action {
        Action::CreateShortUrl => create_short_url(api, pool).await,
        Action::ResolveShortUrl => resolve_short_url(api, pool).await,
        Action::HealthCheck => health_check(api).await,
    }
}

/// Creates a short URL for a random long URL and adds it to `pool` on success.
pub async fn create_short_url<A>(api: &mut A, pool: &ShortUrlPool) -> Sample
where
    A: ShortenerApi + ?Sized,
{
    let long_url = random_long_url();
    let result = match api.call(ApiRequest::forward(&long_url)).await {
        Ok(response) => validate_forward(&response),
        Err(error) => Err(error.into()),
    };

    if let Ok(short_url) = &result {
        tracing::trace!(%long_url, %short_url, "created short url");
        pool.push(short_url.as_str());
    }

    Sample::new(Endpoint::Forward, result)
}

/// Resolves a random short URL from `pool`.
///
/// Falls back to [`create_short_url`] while the pool is empty, in which case no resolve request is
/// made.
pub async fn resolve_short_url<A>(api: &mut A, pool: &ShortUrlPool) -> Sample
where
    A: ShortenerApi + ?Sized,
{
    let Some(short_url) = pool.choose() else {
        tracing::debug!("no short urls to resolve yet, creating one instead");
        return create_short_url(api, pool).await;
    };

    let result = match api.call(ApiRequest::backward(&short_url)).await {
        Ok(response) => validate_backward(&response),
        Err(error) => Err(error.into()),
    };

    let mut sample = Sample::new(Endpoint::Backward, result.clone());
    if let Ok(resolution) = result {
        tracing::trace!(%short_url, ?resolution, "resolved short url");
        sample.resolution = Some(resolution);
    }
    sample
}

/// Checks the health endpoint.
pub async fn health_check<A>(api: &mut A) -> Sample
where
    A: ShortenerApi + ?Sized,
{
    let result = match api.call(ApiRequest::healthz()).await {
        Ok(response) => validate_health(&response),
        Err(error) => Err(error.into()),
    };

    Sample::new(Endpoint::Healthz, result)
}

/// Validates a `POST /forward` response and returns the created short URL.
pub fn validate_forward(response: &ApiResponse) -> Result<String, ValidationError> {
    expect_ok(response)?;
    let data: ForwardResponse = decode(response)?;

    match data.short_url {
        Some(short_url) if !short_url.is_empty() => Ok(short_url),
        _ => Err(ValidationError::MissingField {
            field: "short_url",
            body: response.body.clone(),
        }),
    }
}

/// Validates a `POST /backward` response.
///
/// A known short URL and an explicit `not_found` are equally valid answers. Only the presence of
/// the `long_url` key matters, not the type of its value.
pub fn validate_backward(response: &ApiResponse) -> Result<Resolution, ValidationError> {
    expect_ok(response)?;
    let data: BackwardResponse = decode(response)?;

    if let Some(long_url) = data.long_url() {
        let long_url = match long_url.as_str() {
            Some(long_url) => long_url.to_owned(),
            None => long_url.to_string(),
        };
        return Ok(Resolution::Found(long_url));
    }
    if data.is_not_found() {
        return Ok(Resolution::NotFound);
    }

    Err(ValidationError::MissingField {
        field: "long_url or not_found status",
        body: response.body.clone(),
    })
}

/// Validates a `GET /healthz` response. The body is ignored.
pub fn validate_health(response: &ApiResponse) -> Result<(), ValidationError> {
    expect_ok(response)
}

fn expect_ok(response: &ApiResponse) -> Result<(), ValidationError> {
    if response.status != 200 {
        return Err(ValidationError::UnexpectedStatus {
            status: response.status,
            body: response.body.clone(),
        });
    }
    Ok(())
}

fn decode<T: serde::de::DeserializeOwned>(response: &ApiResponse) -> Result<T, ValidationError> {
    serde_json::from_str(&response.body).map_err(|e| ValidationError::MalformedBody(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use super::*;
    use crate::error::TransportError;

    /// Answers calls with canned responses and records what was requested.
    #[derive(Debug, Default)]
    struct ScriptedApi {
        responses: VecDeque<Result<ApiResponse, String>>,
        calls: Vec<ApiRequest>,
    }

    impl ScriptedApi {
        fn respond(mut self, status: u16, body: &str) -> Self {
            self.responses.push_back(Ok(ApiResponse::new(status, body)));
            self
        }

        fn fail(mut self, message: &str) -> Self {
            self.responses.push_back(Err(message.to_owned()));
            self
        }

        fn endpoints(&self) -> Vec<Endpoint> {
            self.calls.iter().map(|call| call.endpoint).collect()
        }
    }

    #[async_trait]
    impl ShortenerApi for ScriptedApi {
        async fn call(&mut self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
            let endpoint = request.endpoint;
            self.calls.push(request);
            self.responses
                .pop_front()
                .expect("unexpected request")
                .map_err(|message| TransportError::new(endpoint, message))
        }
    }

    #[tokio::test]
    async fn create_adds_short_url_to_pool() {
        let mut api = ScriptedApi::default().respond(200, r#"{"short_url": "abc123"}"#);
        let pool = ShortUrlPool::new();

        let sample = create_short_url(&mut api, &pool).await;

        assert_eq!(sample.endpoint, Endpoint::Forward);
        assert_eq!(sample.outcome, ValidationOutcome::Success);
        assert_eq!(pool.snapshot(), ["abc123"]);
    }

    #[tokio::test]
    async fn create_sends_generated_long_url() {
        let mut api = ScriptedApi::default().respond(200, r#"{"short_url": "b"}"#);
        let pool = ShortUrlPool::new();

        create_short_url(&mut api, &pool).await;

        let body = api.calls[0].body.as_ref().unwrap();
        let long_url = body["long_url"].as_str().unwrap();
        assert!(long_url.starts_with("https://example.com/"));
    }

    #[tokio::test]
    async fn create_without_short_url_fails() {
        let mut api = ScriptedApi::default().respond(200, "{}");
        let pool = ShortUrlPool::new();

        let sample = create_short_url(&mut api, &pool).await;

        let reason = sample.outcome.reason().unwrap();
        assert!(reason.contains("missing short_url"), "{reason}");
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn create_with_empty_short_url_fails() {
        let mut api = ScriptedApi::default().respond(200, r#"{"short_url": ""}"#);
        let pool = ShortUrlPool::new();

        let sample = create_short_url(&mut api, &pool).await;

        assert!(matches!(
            sample.outcome,
            ValidationOutcome::Failure(ValidationError::MissingField {
                field: "short_url",
                ..
            })
        ));
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn create_with_error_status_fails() {
        let mut api = ScriptedApi::default().respond(
            400,
            r#"{"status":"error","error":"invalid long_url"}"#,
        );
        let pool = ShortUrlPool::new();

        let sample = create_short_url(&mut api, &pool).await;

        assert_eq!(
            sample.outcome.reason().unwrap(),
            r#"unexpected status code: 400 - {"status":"error","error":"invalid long_url"}"#
        );
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn create_with_garbage_body_fails() {
        let mut api = ScriptedApi::default().respond(200, "<html>oops</html>");
        let pool = ShortUrlPool::new();

        let sample = create_short_url(&mut api, &pool).await;

        assert!(matches!(
            sample.outcome,
            ValidationOutcome::Failure(ValidationError::MalformedBody(_))
        ));
    }

    #[tokio::test]
    async fn transport_errors_become_failed_samples() {
        let mut api = ScriptedApi::default().fail("connection refused");
        let pool = ShortUrlPool::new();

        let sample = create_short_url(&mut api, &pool).await;

        assert_eq!(
            sample.outcome.reason().unwrap(),
            "request failed: POST /forward: connection refused"
        );
    }

    #[tokio::test]
    async fn resolve_on_empty_pool_creates_instead() {
        let mut api = ScriptedApi::default().respond(200, r#"{"short_url": "abc123"}"#);
        let pool = ShortUrlPool::new();

        let sample = resolve_short_url(&mut api, &pool).await;

        assert_eq!(api.endpoints(), [Endpoint::Forward]);
        assert_eq!(sample.endpoint, Endpoint::Forward);
        assert!(sample.outcome.is_success());
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn resolve_uses_pooled_short_url() {
        let mut api = ScriptedApi::default().respond(
            200,
            r#"{"long_url": "https://example.com/abc"}"#,
        );
        let pool = ShortUrlPool::new();
        pool.push("xyz");

        let sample = resolve_short_url(&mut api, &pool).await;

        assert_eq!(api.endpoints(), [Endpoint::Backward]);
        assert_eq!(
            api.calls[0].body,
            Some(serde_json::json!({"short_url": "xyz"}))
        );
        assert!(sample.outcome.is_success());
        assert_eq!(
            sample.resolution,
            Some(Resolution::Found("https://example.com/abc".into()))
        );
    }

    #[tokio::test]
    async fn resolve_accepts_not_found() {
        let mut api = ScriptedApi::default().respond(200, r#"{"status": "not_found"}"#);
        let pool = ShortUrlPool::new();
        pool.push("xyz");

        let sample = resolve_short_url(&mut api, &pool).await;

        assert_eq!(sample.outcome, ValidationOutcome::Success);
        assert_eq!(sample.resolution, Some(Resolution::NotFound));
    }

    #[tokio::test]
    async fn resolve_rejects_unrelated_body() {
        let mut api = ScriptedApi::default().respond(200, r#"{"foo": "bar"}"#);
        let pool = ShortUrlPool::new();
        pool.push("xyz");

        let sample = resolve_short_url(&mut api, &pool).await;

        assert!(!sample.outcome.is_success());
        assert_eq!(sample.resolution, None);
        assert_eq!(
            sample.outcome.reason().unwrap(),
            r#"missing long_url or not_found status in response: {"foo": "bar"}"#
        );
    }

    #[tokio::test]
    async fn resolve_rejects_other_status_marker() {
        let mut api = ScriptedApi::default().respond(200, r#"{"status": "error"}"#);
        let pool = ShortUrlPool::new();
        pool.push("xyz");

        let sample = resolve_short_url(&mut api, &pool).await;

        assert!(!sample.outcome.is_success());
    }

    #[test]
    fn resolve_only_checks_long_url_presence() {
        let found = |body: &str| validate_backward(&ApiResponse::new(200, body));

        assert_eq!(
            found(r#"{"status": "not_found", "long_url": 5}"#),
            Ok(Resolution::Found("5".into()))
        );
        assert_eq!(
            found(r#"{"long_url": null}"#),
            Ok(Resolution::Found("null".into()))
        );
        assert_eq!(
            found(r#"{"long_url": 123}"#),
            Ok(Resolution::Found("123".into()))
        );
    }

    #[test]
    fn resolve_ignores_non_string_status() {
        let response = ApiResponse::new(200, r#"{"status": 404}"#);

        assert!(matches!(
            validate_backward(&response),
            Err(ValidationError::MissingField { .. })
        ));
        assert_eq!(
            validate_backward(&ApiResponse::new(200, r#"{"status": 404, "long_url": "x"}"#)),
            Ok(Resolution::Found("x".into()))
        );
    }

    #[test]
    fn resolve_rejects_non_object_body() {
        let response = ApiResponse::new(200, r#"["long_url"]"#);

        assert!(matches!(
            validate_backward(&response),
            Err(ValidationError::MalformedBody(_))
        ));
    }

    #[tokio::test]
    async fn resolve_with_error_status_fails() {
        let mut api = ScriptedApi::default().respond(500, r#"{"status":"error"}"#);
        let pool = ShortUrlPool::new();
        pool.push("xyz");

        let sample = resolve_short_url(&mut api, &pool).await;

        assert!(matches!(
            sample.outcome,
            ValidationOutcome::Failure(ValidationError::UnexpectedStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn health_check_only_looks_at_status() {
        let mut api = ScriptedApi::default()
            .respond(503, r#"{"status":"unhealthy"}"#)
            .respond(200, "not even json");

        let unhealthy = health_check(&mut api).await;
        let healthy = health_check(&mut api).await;

        assert!(!unhealthy.outcome.is_success());
        assert!(healthy.outcome.is_success());
        assert_eq!(api.endpoints(), [Endpoint::Healthz, Endpoint::Healthz]);
        assert_eq!(api.calls[0].body, None);
    }

    #[tokio::test]
    async fn perform_dispatches_actions() {
        let mut api = ScriptedApi::default()
            .respond(200, r#"{"short_url": "a"}"#)
            .respond(200, r#"{"long_url": "https://example.com/a"}"#)
            .respond(200, "");
        let pool = ShortUrlPool::new();

        for action in Action::ALL {
            assert!(perform(&mut api, &pool, action).await.outcome.is_success());
        }

        assert_eq!(
            api.endpoints(),
            [Endpoint::Forward, Endpoint::Backward, Endpoint::Healthz]
        );
    }
}
