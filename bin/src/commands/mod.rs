//! CLI command implementations.

pub(crate) mod continuous;
pub(crate) mod event;

use anyhow::{Context, Result};
use seiswave_lib::prelude::*;
use std::path::Path;

/// Loads the configuration and connects to the configured data center.
fn connect(config: &Path) -> Result<Orchestrator> {
    let settings = Settings::load(config)
        .with_context(|| format!("Failed to load configuration from {}", config.display()))?;
    tracing::info!(
        data_dir = %settings.data_dir.display(),
        provider = %settings.client.provider,
        workers = settings.ncpu,
        "loaded configuration"
    );

    Orchestrator::connect(settings).context("Failed to set up the data center client")
}
