//! Continuous-mode command.

use crate::display::{continuous_summary, progress_bar};
use anyhow::{Context, Result};
use std::path::Path;

/// Downloads continuous waveforms for every network in the configured domain.
pub(crate) async fn continuous(config: &Path, quiet: bool) -> Result<()> {
    let progress = progress_bar(quiet, "chunks");
    let run = super::connect(config)?.with_progress(progress.clone());

    let report = run
        .run_continuous()
        .await
        .context("Continuous download failed")?;
    progress.finish_and_clear();

    if !quiet {
        println!("{}", continuous_summary(&report));
        println!("Data written to: {}", run.settings().data_dir.display());
    }

    Ok(())
}
