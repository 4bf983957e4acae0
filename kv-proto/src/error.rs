use thiserror::Error;

/// A fatal parse error. The connection that produced it must be closed; it
/// is never reported back to the client as a normal error reply because the
/// framing itself can no longer be trusted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("query exceeds max query length without a complete request")]
    QueryTooLong,
    #[error("malformed bulk array header")]
    BadArrayHeader,
    #[error("malformed bulk string header")]
    BadBulkHeader,
    #[error("bulk string missing trailing CRLF")]
    MissingTerminator,
}
