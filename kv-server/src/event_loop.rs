//! The single-threaded event loop: a readiness wait over client sockets
//! layered with a time-event list for periodic maintenance. All database,
//! connection-table, and loop state lives on this one thread.

use std::io::{self, ErrorKind, Read, Write};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};
use slab::Slab;
use socket2::{Domain, Protocol, Socket, Type};

use kv_db::{commands, Database};
use kv_util::{metrics, Config};

use crate::connection::{Client, WELCOME};

const LISTENER_TOKEN: Token = Token(0);
const MAX_EVENTS_PER_WAIT: usize = 128;
const ACTIVE_EXPIRE_INTERVAL_NS: i64 = 1_000_000_000;
const ACTIVE_EXPIRE_SAMPLE_SIZE: usize = 20;
const READ_CHUNK: usize = 16 * 1024;
const LISTEN_BACKLOG: i32 = 64;

/// Converts a client slab key to its `mio::Token`. Token 0 is reserved for
/// the listener, so client tokens start at 1.
fn token_for(slab_key: usize) -> Token {
    Token(slab_key + 1)
}

fn slab_key_for(token: Token) -> usize {
    token.0 - 1
}

/// Monotonic nanosecond clock. The only place this process ever reads wall
/// time; every database and time-event API below this point takes `now` as
/// an explicit parameter instead of reading a clock itself.
fn now_ns(epoch: Instant) -> i64 {
    epoch.elapsed().as_nanos() as i64
}

/// Runs once per second as a time event, reclaiming a bounded sample of
/// already-expired keys so idle keys don't linger until someone reads them.
fn active_expire_tick(db: &mut Database, now: i64) {
    let expired = db.sweep_expired_sample(now, ACTIVE_EXPIRE_SAMPLE_SIZE);
    if expired > 0 {
        tracing::trace!(expired, "active expiration sweep");
        for _ in 0..expired {
            metrics::key_expired();
        }
    }
}

pub struct Server {
    poll: Poll,
    listener: TcpListener,
    clients: Slab<Client>,
    db: Database,
    time_events: crate::time_event::TimeEvents,
    config: Config,
    epoch: Instant,
}

impl Server {
    pub fn bind(config: Config) -> io::Result<Self> {
        let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse().expect("valid socket address");
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.bind(&addr.into())?;
        socket.listen(LISTEN_BACKLOG)?;
        socket.set_nonblocking(true)?;
        let mut listener = TcpListener::from_std(socket.into());

        let poll = Poll::new()?;
        poll.registry().register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;

        let mut time_events = crate::time_event::TimeEvents::new();
        let epoch = Instant::now();
        time_events.register_normal(now_ns(epoch), ACTIVE_EXPIRE_INTERVAL_NS, active_expire_tick);

        Ok(Server { poll, listener, clients: Slab::new(), db: Database::new(), time_events, config, epoch })
    }

    /// Runs until the readiness wait itself fails. Startup failures are the
    /// caller's concern; once running, this only returns on a fatal I/O error
    /// from the poller.
    pub fn run(&mut self) -> io::Result<()> {
        tracing::info!(port = self.config.port, "server listening");
        let mut events = Events::with_capacity(MAX_EVENTS_PER_WAIT);
        loop {
            let now = now_ns(self.epoch);
            let next_deadline = self.time_events.next_deadline_ns().unwrap_or(now + 1_000_000_000).min(now + 1_000_000_000);
            let wait_ms = ((next_deadline - now).max(10_000_000) / 1_000_000).max(10) as u64;

            if let Err(e) = self.poll.poll(&mut events, Some(Duration::from_millis(wait_ms))) {
                if e.kind() == ErrorKind::Interrupted {
                    continue;
                }
                tracing::error!(error = %e, "poll failed, stopping server");
                return Err(e);
            }

            let now = now_ns(self.epoch);
            self.time_events.run_due(&mut self.db, now);

            for event in events.iter() {
                if event.token() == LISTENER_TOKEN {
                    self.accept_all(now);
                    continue;
                }
                let key = slab_key_for(event.token());
                if !self.clients.contains(key) {
                    continue;
                }
                if event.is_readable() {
                    self.handle_readable(key, now);
                }
                if self.clients.contains(key) && event.is_writable() {
                    self.handle_writable(key);
                }
            }
        }
    }

    fn accept_all(&mut self, now: i64) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => self.accept_one(stream, addr, now),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    return;
                }
            }
        }
    }

    fn accept_one(&mut self, mut stream: TcpStream, addr: SocketAddr, _now: i64) {
        if self.clients.len() >= self.config.max_connection as usize {
            tracing::warn!(%addr, "rejecting connection: max connections reached");
            let _ = stream.write_all(b"-ERROR: max connections reached\r\n");
            return;
        }

        let key = self.clients.vacant_key();
        let token = token_for(key);
        if let Err(e) = self.poll.registry().register(&mut stream, token, Interest::READABLE) {
            tracing::warn!(error = %e, "failed to register new connection");
            return;
        }

        let mut client = Client::new(stream, self.config.max_query_length as usize);
        client.replies.push(WELCOME.to_vec());
        self.clients.insert(client);
        self.sync_writable_registration(key);
        metrics::connection_opened();
        tracing::info!(%addr, "client connected");
    }

    fn handle_readable(&mut self, key: usize, now: i64) {
        let mut close = false;
        loop {
            let mut buf = [0u8; READ_CHUNK];
            let read = self.clients[key].stream.read(&mut buf);
            match read {
                Ok(0) => {
                    close = true;
                    break;
                }
                Ok(n) => {
                    self.clients[key].parser.feed(&buf[..n]);
                    if self.drain_requests(key, now) {
                        close = true;
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    tracing::warn!(error = %e, "read failed");
                    close = true;
                    break;
                }
            }
        }
        if close {
            self.teardown(key);
        } else {
            self.sync_writable_registration(key);
        }
    }

    /// Parses and dispatches every complete request currently buffered.
    /// Returns whether the connection should be torn down (a protocol error,
    /// or a `QUIT`).
    fn drain_requests(&mut self, key: usize, now: i64) -> bool {
        loop {
            let parsed = self.clients[key].parser.try_parse_one();
            let args = match parsed {
                Ok(Some(args)) => args,
                Ok(None) => return false,
                Err(e) => {
                    tracing::warn!(error = %e, "protocol error, closing connection");
                    metrics::protocol_error();
                    return true;
                }
            };
            if args.is_empty() {
                continue;
            }
            let reply = commands::dispatch(&args, &mut self.db, now);
            metrics::command_dispatched();
            tracing::debug!(command = %args[0], "dispatched command");
            if matches!(reply, kv_proto::Reply::Close) {
                return true;
            }
            self.clients[key].replies.push(reply.to_bytes());
        }
    }

    fn sync_writable_registration(&mut self, key: usize) {
        let client = &mut self.clients[key];
        let wants_write = !client.replies.is_empty();
        if wants_write == client.writable_registered {
            let _ = self.try_flush(key);
            return;
        }
        let interest = if wants_write { Interest::READABLE | Interest::WRITABLE } else { Interest::READABLE };
        let client = &mut self.clients[key];
        if self.poll.registry().reregister(&mut client.stream, token_for(key), interest).is_ok() {
            client.writable_registered = wants_write;
        }
        if wants_write {
            let _ = self.try_flush(key);
        }
    }

    fn handle_writable(&mut self, key: usize) {
        if self.try_flush(key).is_err() {
            self.teardown(key);
        }
    }

    fn try_flush(&mut self, key: usize) -> io::Result<()> {
        let client = &mut self.clients[key];
        let stream = &mut client.stream;
        let drained = client.replies.drain_with(|chunk| stream.write(chunk))?;
        if drained && client.writable_registered {
            let _ = self.poll.registry().reregister(&mut client.stream, token_for(key), Interest::READABLE);
            client.writable_registered = false;
        }
        Ok(())
    }

    fn teardown(&mut self, key: usize) {
        if !self.clients.contains(key) {
            return;
        }
        let mut client = self.clients.remove(key);
        let _ = self.poll.registry().deregister(&mut client.stream);
        metrics::connection_closed();
        tracing::info!("client disconnected");
    }
}
