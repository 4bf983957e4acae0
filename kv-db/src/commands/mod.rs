//! Static command table and dispatcher.
//!
//! Every command name is looked up uppercased against a process-wide table
//! built once at startup. Arity is checked before the handler ever runs, so
//! handlers can index straight into `args` without bounds-checking.

mod admin;
mod hash;
mod list;
mod set;
mod string;
mod zset;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::db::Database;
use crate::error::DbError;
use kv_proto::Reply;

type HandlerFn = fn(&[String], &mut Database, i64) -> Reply;

struct CommandSpec {
    handler: HandlerFn,
    arity: usize,
}

fn reply_from_err(err: DbError) -> Reply {
    Reply::error(err.to_string())
}

static COMMANDS: Lazy<HashMap<&'static str, CommandSpec>> = Lazy::new(|| {
    let mut m = HashMap::new();
    macro_rules! register {
        ($name:literal, $handler:expr, $arity:expr) => {
            m.insert($name, CommandSpec { handler: $handler, arity: $arity });
        };
    }
    register!("GET", string::get, 2);
    register!("SET", string::set, 3);
    register!("SETEX", string::setex, 4);
    register!("SETNX", string::setnx, 3);
    register!("INCR", string::incr, 2);
    register!("DECR", string::decr, 2);
    register!("INCRBY", string::incrby, 3);
    register!("HSET", hash::hset, 4);
    register!("HGET", hash::hget, 3);
    register!("HDEL", hash::hdel, 3);
    register!("SADD", set::sadd, 3);
    register!("SMEMBERS", set::smembers, 2);
    register!("SCARD", set::scard, 2);
    register!("SINTER", set::sinter, 3);
    register!("SUNION", set::sunion, 3);
    register!("SREM", set::srem, 3);
    register!("ZADD", zset::zadd, 4);
    register!("ZRANGE", zset::zrange, 4);
    register!("ZINCRBY", zset::zincrby, 4);
    register!("ZREM", zset::zrem, 3);
    register!("ZSCORE", zset::zscore, 3);
    register!("LPUSH", list::lpush, 3);
    register!("LPOP", list::lpop, 2);
    register!("RPUSH", list::rpush, 3);
    register!("RPOP", list::rpop, 2);
    register!("LLEN", list::llen, 2);
    register!("RENAME", admin::rename, 3);
    register!("DEL", admin::del, 2);
    register!("QUIT", admin::quit, 1);
    register!("PING", admin::ping, 1);
    register!("DBSIZE", admin::dbsize, 1);
    m
});

/// Looks up `args[0]` and invokes its handler, or replies with a protocol-
/// level error for an unknown command or a bad argument count. `now` is the
/// caller-supplied current time in nanoseconds, threaded through so the
/// whole database layer stays clock-free and testable.
pub fn dispatch(args: &[String], db: &mut Database, now: i64) -> Reply {
    let Some(name) = args.first() else {
        return Reply::error("Unknown command type");
    };
    let upper = name.to_uppercase();
    match COMMANDS.get(upper.as_str()) {
        None => Reply::error("Unknown command type"),
        Some(spec) => {
            if args.len() != spec.arity {
                Reply::error("Invalid parameter number")
            } else {
                (spec.handler)(args, db, now)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_command_is_reported() {
        let mut db = Database::new();
        assert_eq!(dispatch(&["NOPE".into()], &mut db, 0), Reply::error("Unknown command type"));
    }

    #[test]
    fn wrong_arity_is_reported() {
        let mut db = Database::new();
        assert_eq!(dispatch(&["GET".into()], &mut db, 0), Reply::error("Invalid parameter number"));
    }

    #[test]
    fn empty_request_is_reported() {
        let mut db = Database::new();
        assert_eq!(dispatch(&[], &mut db, 0), Reply::error("Unknown command type"));
    }

    #[test]
    fn command_name_is_case_insensitive() {
        let mut db = Database::new();
        assert_eq!(dispatch(&["ping".into()], &mut db, 0), Reply::Simple("PONG".into()));
    }
}
