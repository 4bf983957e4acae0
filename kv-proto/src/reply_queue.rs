//! Per-client outgoing reply queue with a `sentLength` cursor, so a short
//! nonblocking write resumes exactly where it left off on the next
//! writeable event.

use std::collections::VecDeque;
use std::io;

pub struct ReplyQueue {
    pending: VecDeque<Vec<u8>>,
    sent: usize,
}

impl Default for ReplyQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyQueue {
    pub fn new() -> Self {
        ReplyQueue { pending: VecDeque::new(), sent: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Enqueues a frame. Returns `true` if the queue was empty beforehand —
    /// the caller should register for write-readiness exactly on that
    /// transition, never on every push.
    pub fn push(&mut self, bytes: Vec<u8>) -> bool {
        let was_empty = self.pending.is_empty();
        self.pending.push_back(bytes);
        was_empty
    }

    /// Writes as much of the queue as `write` accepts without blocking.
    /// Returns `Ok(true)` once the queue has fully drained (the caller
    /// should deregister write-readiness), `Ok(false)` if writing would
    /// block with data still queued, and `Err` on a real I/O failure.
    pub fn drain_with<F>(&mut self, mut write: F) -> io::Result<bool>
    where
        F: FnMut(&[u8]) -> io::Result<usize>,
    {
        while let Some(front) = self.pending.front() {
            match write(&front[self.sent..]) {
                Ok(0) => return Ok(false),
                Ok(n) => {
                    self.sent += n;
                    if self.sent == front.len() {
                        self.pending.pop_front();
                        self.sent = 0;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, ErrorKind};

    #[test]
    fn push_reports_empty_to_nonempty_transition() {
        let mut q = ReplyQueue::new();
        assert!(q.push(b"a".to_vec()));
        assert!(!q.push(b"b".to_vec()));
    }

    #[test]
    fn full_write_drains_entire_queue() {
        let mut q = ReplyQueue::new();
        q.push(b"hello".to_vec());
        let mut written = Vec::new();
        let drained = q
            .drain_with(|chunk| {
                written.extend_from_slice(chunk);
                Ok(chunk.len())
            })
            .unwrap();
        assert!(drained);
        assert_eq!(written, b"hello");
        assert!(q.is_empty());
    }

    #[test]
    fn short_write_resumes_from_sent_cursor() {
        let mut q = ReplyQueue::new();
        q.push(b"hello".to_vec());
        let mut calls = 0;
        let drained = q
            .drain_with(|chunk| {
                calls += 1;
                if calls == 1 {
                    Ok(2)
                } else {
                    Ok(chunk.len())
                }
            })
            .unwrap();
        assert!(drained);
        assert_eq!(calls, 2);
    }

    #[test]
    fn would_block_leaves_queue_nonempty_without_erroring() {
        let mut q = ReplyQueue::new();
        q.push(b"hello".to_vec());
        let drained = q
            .drain_with(|_| Err(io::Error::from(ErrorKind::WouldBlock)))
            .unwrap();
        assert!(!drained);
        assert!(!q.is_empty());
    }

    #[test]
    fn io_error_propagates() {
        let mut q = ReplyQueue::new();
        q.push(b"hello".to_vec());
        let err = q.drain_with(|_| Err(io::Error::from(ErrorKind::ConnectionReset)));
        assert!(err.is_err());
    }
}
