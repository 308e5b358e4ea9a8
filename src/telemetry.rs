//! Logging setup for the CLI.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a stderr `tracing` subscriber; `RUST_LOG` overrides the default `warn` filter.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}
