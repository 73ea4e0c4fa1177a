//! A load-testing workload for the shorten.it URL-shortener API.
//!
//! The workload simulates users that create short URLs (`POST /forward`), resolve previously
//! created ones (`POST /backward`) and poll the health endpoint (`GET /healthz`). Actions are
//! weighted, by default *resolve* : *create* : *health check* = `10 : 5 : 1`, which models the
//! read-heavy traffic a URL shortener sees in practice.
//!
//! All short URLs created during a run are collected in a [`ShortUrlPool`] that is shared by every
//! simulated user, so resolve requests always target identifiers that the service handed out.
//!
//! The [`driver`] operations are independent of any scheduler: they take a [`ShortenerApi`]
//! implementation and the pool as arguments and return a [`Sample`]. The [`attack`] module plugs
//! them into [goose](https://docs.rs/goose), which owns user spawning, think time, metrics and
//! reporting.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod api;
pub mod attack;
pub mod config;
pub mod driver;
pub mod error;
pub mod http;
pub mod observability;
pub mod pool;
pub mod workload;

pub use crate::api::{ApiRequest, ApiResponse, Endpoint, ShortenerApi};
pub use crate::driver::{Resolution, Sample, ValidationOutcome};
pub use crate::error::{TransportError, ValidationError};
pub use crate::pool::ShortUrlPool;
pub use crate::workload::{Action, Workload};
