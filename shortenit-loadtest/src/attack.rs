//! Runs the workload as a [goose](https://docs.rs/goose) load test.
//!
//! Goose owns everything around the workload: command line, user spawning, think time, weighted
//! transaction selection, metrics and reports. This module registers one scenario whose
//! transactions call into the [`driver`](crate::driver) through [`GooseApi`], so every request is
//! issued and timed by goose and every validation outcome ends up in its statistics.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use goose::metrics::{GooseMetrics, GooseRequestMetric};
use goose::prelude::*;

use crate::api::{ApiRequest, ApiResponse, Endpoint, ShortenerApi};
use crate::config::Config;
use crate::driver::{self, Sample, ValidationOutcome};
use crate::error::TransportError;
use crate::pool::ShortUrlPool;
use crate::workload::{Action, Workload};

/// Transaction name of the per-user bootstrap.
const BOOTSTRAP: &str = "bootstrap";

/// A [`ShortenerApi`] that sends requests through a [`GooseUser`].
///
/// Goose records every request on its own; the outcome of validation is applied afterwards with
/// [`GooseApi::report`], which marks the recorded request as success or failure.
pub struct GooseApi<'a> {
    user: &'a mut GooseUser,
    request: Option<GooseRequestMetric>,
    error: Option<Box<TransactionError>>,
}

impl<'a> GooseApi<'a> {
    /// Wraps `user` for a single transaction.
    pub fn new(user: &'a mut GooseUser) -> Self {
        Self {
            user,
            request: None,
            error: None,
        }
    }

    /// Reports the outcome of `sample` for the last request sent through this client.
    ///
    /// Failures are returned as the transaction error goose expects; goose counts and logs it and
    /// the user carries on with its next transaction.
    pub fn report(mut self, sample: &Sample) -> TransactionResult {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        let Some(mut request) = self.request.take() else {
            return Ok(());
        };

        match &sample.outcome {
            ValidationOutcome::Success => {
                if let Some(resolution) = &sample.resolution {
                    tracing::debug!(endpoint = %sample.endpoint, ?resolution, "sample succeeded");
                }
                self.user.set_success(&mut request)
            }
            ValidationOutcome::Failure(error) => {
                let reason = error.to_string();
                tracing::debug!(endpoint = %sample.endpoint, %reason, "sample failed");
                self.user.set_failure(&reason, &mut request, None, None)
            }
        }
    }

    /// Keeps goose's own error for [`GooseApi::report`] when no request could be recorded.
    fn fail(&mut self, endpoint: Endpoint, error: Box<TransactionError>) -> TransportError {
        let transport_error = TransportError::new(endpoint, &error);
        self.error = Some(error);
        transport_error
    }
}

impl std::fmt::Debug for GooseApi<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GooseApi")
            .field("user", &self.user.weighted_users_index)
            .field("request", &self.request)
            .finish()
    }
}

#[async_trait]
impl ShortenerApi for GooseApi<'_> {
    async fn call(&mut self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let endpoint = request.endpoint;
        let method = if endpoint.is_post() {
            GooseMethod::Post
        } else {
            GooseMethod::Get
        };

        let mut builder = match self.user.get_request_builder(&method, endpoint.path()) {
            Ok(builder) => builder,
            Err(error) => return Err(self.fail(endpoint, error)),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let goose_request = GooseRequest::builder()
            .method(method)
            .path(endpoint.path())
            .name(endpoint.name())
            .set_request_builder(builder)
            .build();

        let goose = match self.user.request(goose_request).await {
            Ok(goose) => goose,
            Err(error) => return Err(self.fail(endpoint, error)),
        };
        self.request = Some(goose.request);

        let response = goose
            .response
            .map_err(|e| TransportError::new(endpoint, e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(endpoint, e))?;

        Ok(ApiResponse { status, body })
    }
}

async fn run_action(
    user: &mut GooseUser,
    pool: &ShortUrlPool,
    action: Action,
) -> TransactionResult {
    let mut api = GooseApi::new(user);
    let sample = driver::perform(&mut api, pool, action).await;
    api.report(&sample)
}

/// A weighted transaction running `action`.
fn action_transaction(pool: &ShortUrlPool, action: Action) -> Transaction {
    let pool = pool.clone();
    let function: TransactionFunction = Arc::new(move |user| {
        let pool = pool.clone();
        Box::pin(async move { run_action(user, &pool, action).await })
    });

    Transaction::new(function).set_name(action.name())
}

/// The `on_start` transaction that makes sure resolves have something to work with.
fn bootstrap_transaction(pool: &ShortUrlPool) -> Transaction {
    let pool = pool.clone();
    let function: TransactionFunction = Arc::new(move |user| {
        let pool = pool.clone();
        Box::pin(async move {
            if !pool.is_empty() {
                return Ok(());
            }
            run_action(user, &pool, Action::CreateShortUrl).await
        })
    });

    Transaction::new(function).set_name(BOOTSTRAP).set_on_start()
}

/// Builds the goose scenario for `workload`, with all users sharing `pool`.
pub fn scenario(workload: &Workload, pool: &ShortUrlPool) -> Result<Scenario, GooseError> {
    let mut scenario = Scenario::new(workload.name())
        .set_wait_time(workload.min_wait, workload.max_wait)?
        .register_transaction(bootstrap_transaction(pool));

    for (action, weight) in workload.weighted_actions() {
        let transaction = action_transaction(pool, action).set_weight(weight)?;
        scenario = scenario.register_transaction(transaction);
    }

    Ok(scenario)
}

/// Runs the load test described by `config` on `attack`.
///
/// `attack` carries goose's own configuration, usually from
/// [`GooseAttack::initialize`]; `config.api_base_url` only becomes the default host.
pub async fn execute(
    attack: GooseAttack,
    config: &Config,
    pool: &ShortUrlPool,
) -> Result<GooseMetrics> {
    let workload = config.workload();
    tracing::info!(
        host = %config.api_base_url,
        resolve = workload.weight(Action::ResolveShortUrl),
        create = workload.weight(Action::CreateShortUrl),
        health_check = workload.weight(Action::HealthCheck),
        "starting load test"
    );

    let metrics = attack
        .register_scenario(scenario(&workload, pool)?)
        .set_default(GooseDefault::Host, config.api_base_url.as_str())?
        .execute()
        .await?;

    tracing::info!(short_urls = pool.len(), "load test finished");
    Ok(metrics)
}
