//! Process-wide metrics recorder installation and the handful of named
//! counters/gauges the server emits.
//!
//! Modeled on the split between a local and an external sink that larger
//! services in this codebase use for their composite recorders, but scaled
//! down to what a single-threaded store actually needs: one exporter-facing
//! recorder, installed once at startup.

use metrics_exporter_prometheus::PrometheusBuilder;

pub const CONNECTIONS_ACTIVE: &str = "kv_connections_active";
pub const CONNECTIONS_TOTAL: &str = "kv_connections_total";
pub const COMMANDS_TOTAL: &str = "kv_commands_total";
pub const PROTOCOL_ERRORS_TOTAL: &str = "kv_protocol_errors_total";
pub const EXPIRED_KEYS_TOTAL: &str = "kv_expired_keys_total";
pub const DICT_REHASHES_TOTAL: &str = "kv_dict_rehashes_total";

/// Installs the global metrics recorder. Safe to call at most once per process;
/// a second call is logged and ignored rather than panicking, since tests in
/// this workspace may share a process.
pub fn install() {
    if let Err(err) = PrometheusBuilder::new().install_recorder() {
        tracing::debug!(error = %err, "metrics recorder already installed");
    }
}

pub fn connection_opened() {
    metrics::counter!(CONNECTIONS_TOTAL).increment(1);
    metrics::gauge!(CONNECTIONS_ACTIVE).increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!(CONNECTIONS_ACTIVE).decrement(1.0);
}

pub fn command_dispatched() {
    metrics::counter!(COMMANDS_TOTAL).increment(1);
}

pub fn protocol_error() {
    metrics::counter!(PROTOCOL_ERRORS_TOTAL).increment(1);
}

pub fn key_expired() {
    metrics::counter!(EXPIRED_KEYS_TOTAL).increment(1);
}

pub fn dict_rehash_step() {
    metrics::counter!(DICT_REHASHES_TOTAL).increment(1);
}
