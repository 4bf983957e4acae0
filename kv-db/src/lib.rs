//! The keyspace and its typed value layer: five value kinds built on
//! `kv-core`'s `Dict`, `LinkedList`, and `SkipList`, plus the static command
//! table that turns a parsed request into a [`Reply`](kv_proto::Reply).

pub mod commands;
pub mod db;
pub mod error;
pub mod value;

pub use commands::dispatch;
pub use db::Database;
pub use error::DbError;
pub use value::{SetValue, SortedSetValue, Value};
