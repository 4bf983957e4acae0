//! The data structures the store is built from: a hash table with incremental
//! rehashing, an intrusive doubly-linked list, and a score-ordered skip list.
//! Nothing here knows about the wire protocol or command semantics — that
//! lives in `kv-db`.

pub mod dict;
pub mod error;
pub mod hashing;
pub mod kind;
pub mod list;
pub mod skiplist;

pub use dict::Dict;
pub use error::DictError;
pub use kind::Kind;
pub use list::{LinkedList, NodeHandle};
pub use skiplist::SkipList;
