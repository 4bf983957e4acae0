//! CLI entrypoint: `kv-server [config-path]`. A missing or unreadable config
//! file falls back to defaults rather than failing startup; any other
//! startup failure is logged and the process exits 0, matching the source's
//! "never crash out of main" contract.

mod connection;
mod event_loop;
mod time_event;

use std::path::PathBuf;

use clap::Parser;

use event_loop::Server;
use kv_util::Config;

#[derive(Parser)]
#[command(name = "kv-server", about = "Single-threaded in-memory key-value store")]
struct Cli {
    /// Path to a JSON config file ({ "port", "maxConnection", "maxQueryLength" }).
    config_path: Option<PathBuf>,

    /// Increase log verbosity; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    kv_util::logging::init(cli.verbose);
    kv_util::metrics::install();

    let config = match cli.config_path {
        Some(path) => Config::load(path),
        None => Config::default(),
    };

    match Server::bind(config) {
        Ok(mut server) => {
            if let Err(e) = server.run() {
                tracing::error!(error = %e, "server stopped");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to bind server");
        }
    }
}
