//! Load test binary for the shorten.it API.
//!
//! The command line is goose's, for example:
//!
//! ```sh
//! API_BASE_URL=http://localhost:8080 shortenit-loadtest --users 50 --hatch-rate 10 --run-time 5m
//! ```
//!
//! `API_BASE_URL` (or a `.env` file defining it) sets the default target host; goose's `--host`
//! flag takes precedence. See [`shortenit_loadtest::config`] for the remaining settings.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

use anyhow::Context;
use goose::GooseAttack;

use shortenit_loadtest::ShortUrlPool;
use shortenit_loadtest::attack;
use shortenit_loadtest::config::{Config, load_dotenv};
use shortenit_loadtest::observability::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The .env file has to be in the environment before any configuration is resolved.
    let dotenv = load_dotenv()?;

    init_tracing();
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded environment file");
    }

    let config = Config::from_env()?;
    tracing::debug!(?config);

    let attack = GooseAttack::initialize().context("failed to initialize goose")?;
    let pool = ShortUrlPool::new();

    attack::execute(attack, &config, &pool).await?;

    Ok(())
}
