//! Progress bar and run summaries.

use indicatif::{ProgressBar, ProgressStyle};
use seiswave_lib::{ContinuousReport, EventReport, EventStatus};

/// Creates the pool progress bar, hidden in quiet mode.
pub(crate) fn progress_bar(quiet: bool, unit: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    let template = format!(
        "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {unit} ({{percent}}%)"
    );
    // Fall back to the default style if the template is rejected
    if let Ok(style) = ProgressStyle::default_bar().template(&template) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

/// Formats the summary line of a continuous run.
pub(crate) fn continuous_summary(report: &ContinuousReport) -> String {
    let totals = &report.totals;
    format!(
        "{} networks, {} chunks: {} files written, {} already present, {} without data, {} rejected",
        report.networks,
        report.chunks,
        totals.files_written,
        totals.files_existing,
        totals.no_data,
        totals.rejected
    )
}

/// Formats the summary line of an event run.
pub(crate) fn event_summary(report: &EventReport) -> String {
    format!(
        "{} events: {} downloaded, {} already downloaded, {} failed",
        report.outcomes.len(),
        report.downloaded(),
        report.already_downloaded(),
        report.failed()
    )
}

/// Lists the events that failed in this run, one `id: reason` line each.
pub(crate) fn failed_events(report: &EventReport) -> Vec<String> {
    report
        .outcomes
        .iter()
        .filter_map(|outcome| match &outcome.status {
            EventStatus::Failed { reason } => Some(format!("{}: {reason}", outcome.resource_id)),
            _ => None,
        })
        .collect()
}
