// src/logging.rs
use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG` plus `default_directive`
/// (for example `"dependency_monitor=info"`).
///
/// Returns `Ok(false)` when the host already installed a global subscriber.
pub fn init_logging(default_directive: &str) -> Result<bool> {
    let filter = EnvFilter::from_default_env().add_directive(default_directive.parse()?);

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(directive = default_directive, "Logging initialized");
    }
    Ok(installed)
}
