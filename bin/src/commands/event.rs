//! Event-mode command.

use crate::display::{event_summary, failed_events, progress_bar};
use anyhow::{Context, Result};
use seiswave_lib::{JsonFormatter, persist};
use std::path::Path;

/// Downloads a waveform window around every catalog event.
///
/// Individual event failures do not fail the command. The orchestrator logs
/// each one; they are also listed after the summary and in the optional JSON
/// report.
pub(crate) async fn event(config: &Path, report_path: Option<&Path>, quiet: bool) -> Result<()> {
    let progress = progress_bar(quiet, "events");
    let run = super::connect(config)?.with_progress(progress.clone());

    let report = run.run_event().await.context("Event download failed")?;
    progress.finish_and_clear();

    if let Some(path) = report_path {
        persist(&JsonFormatter::new().with_pretty(true), &report, path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote event report");
    }

    if !quiet {
        println!("{}", event_summary(&report));
        for line in failed_events(&report) {
            println!("  {line}");
        }
    }

    Ok(())
}
