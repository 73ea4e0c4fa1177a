//! Test utilities for the shorten.it load test.
//!
//! This crate provides an in-process stand-in for the shortener API and test logging. See the
//! modules for all available utilities.

pub mod server;
pub mod tracing;
