//! Logging setup for the load test binary.

use std::env;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Installs the global `tracing` subscriber, logging to stderr.
///
/// See [`parse_rust_log`] for how `RUST_LOG` is interpreted.
pub fn init_tracing() {
    let (level, env_filter) = parse_rust_log();
    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(format.with_filter(LevelFilter::from(level)))
        .with(env_filter)
        .init();
}

/// Parses `RUST_LOG` into a maximum level and a target filter.
///
/// A plain level such as `debug` is applied on top of the built-in per-target defaults. Anything
/// else is used as a filter directive verbatim.
pub fn parse_rust_log() -> (Level, EnvFilter) {
    let value = env::var(EnvFilter::DEFAULT_ENV).ok();
    rust_log_filter(value.as_deref())
}

fn rust_log_filter(value: Option<&str>) -> (Level, EnvFilter) {
    let level = match value {
        Some(value) => match value.parse::<Level>() {
            Ok(level) => level,
            Err(_) => return (Level::TRACE, EnvFilter::new(value)),
        },
        None => Level::INFO,
    };

    // This is the maximum verbosity that will be logged, we filter this down to `level`.
    let env_filter = EnvFilter::new(
        "INFO,\
        goose=INFO,\
        hyper=WARN,\
        reqwest=WARN,\
        shortenit_loadtest=TRACE,\
        ",
    );

    (level, env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info() {
        let (level, filter) = rust_log_filter(None);
        assert_eq!(level, Level::INFO);
        assert!(filter.to_string().contains("shortenit_loadtest=trace"));
    }

    #[test]
    fn plain_level_keeps_default_filter() {
        let (level, filter) = rust_log_filter(Some("debug"));
        assert_eq!(level, Level::DEBUG);
        assert!(filter.to_string().contains("reqwest=warn"));
    }

    #[test]
    fn directives_are_used_verbatim() {
        let (level, filter) = rust_log_filter(Some("shortenit_loadtest::driver=trace"));
        assert_eq!(level, Level::TRACE);
        let filter = filter.to_string();
        assert!(filter.contains("shortenit_loadtest::driver=trace"));
        assert!(!filter.contains("reqwest"));
    }
}
