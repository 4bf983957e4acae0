//! Per-connection state: the nonblocking socket, its incremental request
//! parser, and its outgoing reply queue.

use mio::net::TcpStream;

use kv_proto::{ReplyQueue, RequestParser};

pub const WELCOME: &[u8] = b"+Welcome!\r\n";

pub struct Client {
    pub stream: TcpStream,
    pub parser: RequestParser,
    pub replies: ReplyQueue,
    /// Whether this socket currently holds a writable registration. The
    /// event loop flips this only on the empty/nonempty transition the
    /// reply queue reports, never on every push.
    pub writable_registered: bool,
}

impl Client {
    pub fn new(stream: TcpStream, max_query_length: usize) -> Self {
        Client {
            stream,
            parser: RequestParser::new(max_query_length),
            replies: ReplyQueue::new(),
            writable_registered: false,
        }
    }
}
