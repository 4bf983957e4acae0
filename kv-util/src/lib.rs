//! Ambient plumbing shared by the key-value store crates: configuration loading,
//! a small metrics facade, and logging setup.
//!
//! None of this is part of the wire protocol or the command surface; it is the
//! harness the server runs inside.

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::Config;
