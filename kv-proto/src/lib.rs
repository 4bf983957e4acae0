//! The wire protocol: an incremental request parser for the inline and bulk
//! dialects, the reply frame encoder, and a backpressure-aware outgoing
//! reply queue. Nothing here opens a socket or knows about commands.

pub mod error;
pub mod parser;
pub mod reply;
pub mod reply_queue;

pub use error::ProtocolError;
pub use parser::RequestParser;
pub use reply::Reply;
pub use reply_queue::ReplyQueue;
