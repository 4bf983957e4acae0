//! Tracing subscriber setup for the server binary.

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber. `verbosity` is the number of times
/// `-v` was passed on the command line; 0 maps to `info`, each further level
/// drops one notch down to `trace`.
pub fn init(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
