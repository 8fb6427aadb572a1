//! Logging init: stderr subscriber filtered by `RUST_LOG` or `-v`.

use tracing_subscriber::EnvFilter;

/// Returns the default filter directive for a `-v` count.
fn directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `-v`.
pub(crate) fn init(verbose: u8) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
