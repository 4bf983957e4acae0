//! Incremental parser for the two request dialects: inline (space-tokenized,
//! CRLF-terminated) and bulk (`*N\r\n` followed by N `$L\r\n<bytes>\r\n`
//! frames). A [`RequestParser`] owns a sliding-window buffer and enough state
//! to resume parsing across an arbitrary number of short reads — a request
//! split across every byte boundary parses identically to one delivered
//! whole.

use bytes::{Buf, BytesMut};

use crate::error::ProtocolError;

const INITIAL_CAPACITY: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BulkState {
    AwaitingHeader,
    AwaitingArrayHeader,
    AwaitingPayload { remaining: usize },
}

pub struct RequestParser {
    buf: BytesMut,
    max_query_length: usize,
    in_bulk_request: bool,
    bulk_state: BulkState,
    bulk_args_remaining: usize,
    args: Vec<String>,
}

impl RequestParser {
    pub fn new(max_query_length: usize) -> Self {
        RequestParser {
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
            max_query_length,
            in_bulk_request: false,
            bulk_state: BulkState::AwaitingArrayHeader,
            bulk_args_remaining: 0,
            args: Vec::new(),
        }
    }

    /// Appends freshly read bytes to the sliding window.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Attempts to parse one complete request out of the buffer. Returns
    /// `Ok(None)` when more bytes are needed; the caller should read again
    /// and call this again. A returned `Vec<String>` may be empty (a blank
    /// inline line) — callers should skip dispatch for it without treating
    /// it as an error.
    pub fn try_parse_one(&mut self) -> Result<Option<Vec<String>>, ProtocolError> {
        self.check_overflow()?;
        if !self.in_bulk_request {
            if self.buf.is_empty() {
                return Ok(None);
            }
            if self.buf[0] == b'*' {
                self.in_bulk_request = true;
                self.bulk_state = BulkState::AwaitingArrayHeader;
                self.args.clear();
            } else {
                return self.parse_inline();
            }
        }
        self.parse_bulk()
    }

    fn find_crlf(&self) -> Option<usize> {
        self.buf.windows(2).position(|w| w == b"\r\n")
    }

    fn check_overflow(&self) -> Result<(), ProtocolError> {
        if self.buf.len() > self.max_query_length {
            Err(ProtocolError::QueryTooLong)
        } else {
            Ok(())
        }
    }

    fn parse_inline(&mut self) -> Result<Option<Vec<String>>, ProtocolError> {
        match self.find_crlf() {
            None => Ok(None),
            Some(pos) => {
                let line = self.buf.split_to(pos);
                self.buf.advance(2);
                let text = String::from_utf8_lossy(&line);
                let args: Vec<String> = text.split(' ').filter(|s| !s.is_empty()).map(String::from).collect();
                Ok(Some(args))
            }
        }
    }

    fn parse_bulk(&mut self) -> Result<Option<Vec<String>>, ProtocolError> {
        loop {
            match self.bulk_state {
                BulkState::AwaitingArrayHeader => {
                    let pos = match self.find_crlf() {
                        Some(pos) => pos,
                        None => return Ok(None),
                    };
                    let header = self.buf.split_to(pos);
                    self.buf.advance(2);
                    if header.first() != Some(&b'*') {
                        return Err(ProtocolError::BadArrayHeader);
                    }
                    let n: i64 = std::str::from_utf8(&header[1..])
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .ok_or(ProtocolError::BadArrayHeader)?;
                    if n < 0 {
                        return Err(ProtocolError::BadArrayHeader);
                    }
                    self.bulk_args_remaining = n as usize;
                    self.bulk_state = BulkState::AwaitingHeader;
                    if self.bulk_args_remaining == 0 {
                        self.in_bulk_request = false;
                        return Ok(Some(std::mem::take(&mut self.args)));
                    }
                }
                BulkState::AwaitingHeader => {
                    let pos = match self.find_crlf() {
                        Some(pos) => pos,
                        None => return Ok(None),
                    };
                    let header = self.buf.split_to(pos);
                    self.buf.advance(2);
                    if header.first() != Some(&b'$') {
                        return Err(ProtocolError::BadBulkHeader);
                    }
                    let len: i64 = std::str::from_utf8(&header[1..])
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .ok_or(ProtocolError::BadBulkHeader)?;
                    if len < 0 {
                        return Err(ProtocolError::BadBulkHeader);
                    }
                    self.bulk_state = BulkState::AwaitingPayload { remaining: len as usize };
                }
                BulkState::AwaitingPayload { remaining } => {
                    if self.buf.len() < remaining + 2 {
                        return Ok(None);
                    }
                    let payload = self.buf.split_to(remaining);
                    if &self.buf[0..2] != b"\r\n" {
                        return Err(ProtocolError::MissingTerminator);
                    }
                    self.buf.advance(2);
                    self.args.push(String::from_utf8_lossy(&payload).into_owned());
                    self.bulk_args_remaining -= 1;
                    if self.bulk_args_remaining == 0 {
                        self.in_bulk_request = false;
                        return Ok(Some(std::mem::take(&mut self.args)));
                    }
                    self.bulk_state = BulkState::AwaitingHeader;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_request_parses_in_one_shot() {
        let mut p = RequestParser::new(4096);
        p.feed(b"SET k v\r\n");
        let args = p.try_parse_one().unwrap().unwrap();
        assert_eq!(args, vec!["SET", "k", "v"]);
    }

    #[test]
    fn inline_request_waits_for_more_data() {
        let mut p = RequestParser::new(4096);
        p.feed(b"SET k v");
        assert_eq!(p.try_parse_one().unwrap(), None);
        p.feed(b"\r\n");
        assert_eq!(p.try_parse_one().unwrap().unwrap(), vec!["SET", "k", "v"]);
    }

    #[test]
    fn bulk_request_parses_whole_buffer() {
        let mut p = RequestParser::new(4096);
        p.feed(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n");
        let args = p.try_parse_one().unwrap().unwrap();
        assert_eq!(args, vec!["SET", "k", "v"]);
    }

    #[test]
    fn bulk_request_survives_byte_by_byte_delivery() {
        let whole: &[u8] = b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n";
        let mut p = RequestParser::new(4096);
        let mut result = None;
        for &b in whole {
            p.feed(&[b]);
            if let Some(args) = p.try_parse_one().unwrap() {
                result = Some(args);
                break;
            }
        }
        assert_eq!(result, Some(vec!["GET".to_string(), "k".to_string()]));
    }

    #[test]
    fn pipelined_requests_parse_one_at_a_time() {
        let mut p = RequestParser::new(4096);
        p.feed(b"PING\r\nPING\r\n");
        assert_eq!(p.try_parse_one().unwrap().unwrap(), vec!["PING"]);
        assert_eq!(p.try_parse_one().unwrap().unwrap(), vec!["PING"]);
        assert_eq!(p.try_parse_one().unwrap(), None);
    }

    #[test]
    fn oversized_inline_without_crlf_is_fatal() {
        let mut p = RequestParser::new(16);
        p.feed(&[b'a'; 32]);
        assert_eq!(p.try_parse_one(), Err(ProtocolError::QueryTooLong));
    }

    #[test]
    fn oversized_inline_request_complete_in_one_read_is_still_fatal() {
        let mut p = RequestParser::new(16);
        let mut line = vec![b'a'; 32];
        line.extend_from_slice(b"\r\n");
        p.feed(&line);
        assert_eq!(p.try_parse_one(), Err(ProtocolError::QueryTooLong));
    }

    #[test]
    fn malformed_bulk_array_header_is_fatal() {
        let mut p = RequestParser::new(4096);
        p.feed(b"*x\r\n");
        assert_eq!(p.try_parse_one(), Err(ProtocolError::BadArrayHeader));
    }

    #[test]
    fn zero_arity_bulk_request_yields_empty_args() {
        let mut p = RequestParser::new(4096);
        p.feed(b"*0\r\n");
        assert_eq!(p.try_parse_one().unwrap(), Some(Vec::new()));
    }
}
