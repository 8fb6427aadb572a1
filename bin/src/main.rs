//! seiswave CLI - Seismic waveform downloader for FDSN data centers.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

mod commands;
mod display;
mod logging;

/// Download mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Continuous waveforms chunked per network
    Continuous,
    /// Windows around catalog events
    Event,
}

#[derive(Parser)]
#[command(name = "seiswave")]
#[command(about = "Download continuous or event-based seismic waveforms", long_about = None)]
#[command(version)]
struct Cli {
    /// Download mode
    #[arg(long, value_enum)]
    mode: Mode,

    /// Configuration file
    #[arg(short, long, default_value = seiswave_lib::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long)]
    quiet: bool,

    /// Write the event-mode outcome report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.mode {
        Mode::Continuous => commands::continuous::continuous(&cli.config, cli.quiet).await,
        Mode::Event => commands::event::event(&cli.config, cli.report.as_deref(), cli.quiet).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_mode_is_required() {
        let err = Cli::try_parse_from(["seiswave"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["seiswave", "--mode", "event", "-vv"]).unwrap();
        assert_eq!(cli.mode, Mode::Event);
        assert_eq!(cli.config, PathBuf::from("para.ini"));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        assert!(cli.report.is_none());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(Cli::try_parse_from(["seiswave", "--mode", "batch"]).is_err());
    }
}
