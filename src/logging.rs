//! Log output for the command-line binary.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at `info`, or at
/// `debug` when `verbose` is set.
pub fn init_logging(verbose: bool) -> Result<(), String> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { Level::DEBUG } else { Level::INFO };
        EnvFilter::new(format!("sharedbook={}", level))
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to set global default subscriber: {}", e))
}
