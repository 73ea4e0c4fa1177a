use tracing_subscriber::EnvFilter;

/// Default filter: everything at `WARN`, the load test crates at `TRACE`.
const DEFAULT_FILTER: &str = "WARN,shortenit_loadtest=TRACE,shortenit_test=TRACE";

/// Initialize the logger for testing.
///
/// This logs to the stdout registered by the Rust test runner. Goose and HTTP client internals are
/// only logged from `WARN` upwards unless `RUST_LOG` replaces the default filter.
///
/// # Example
///
/// ```
/// shortenit_test::tracing::init();
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}
