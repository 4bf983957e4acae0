use std::collections::HashSet;

use kv_proto::Reply;

use super::reply_from_err;
use crate::db::Database;
use crate::value::{SetValue, Value};

pub fn sadd(args: &[String], db: &mut Database, now: i64) -> Reply {
    let container = match db.get_or_create(&args[1], now, || Value::Set(SetValue::new())) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    let set = match container.as_set_mut() {
        Ok(s) => s,
        Err(e) => return reply_from_err(e),
    };
    match set.add(args[2].clone()) {
        Ok(()) => Reply::ok(),
        Err(e) => reply_from_err(e),
    }
}

pub fn smembers(args: &[String], db: &mut Database, now: i64) -> Reply {
    let container = match db.get(&args[1], now) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    match container.as_set_mut() {
        Ok(s) => Reply::Array(s.members().into_iter().map(Reply::Bulk).collect()),
        Err(e) => reply_from_err(e),
    }
}

pub fn scard(args: &[String], db: &mut Database, now: i64) -> Reply {
    let container = match db.get(&args[1], now) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    match container.as_set_mut() {
        Ok(s) => Reply::Integer(s.card() as i64),
        Err(e) => reply_from_err(e),
    }
}

/// SINTER/SUNION are not among the documented read-only container commands,
/// so a missing key auto-creates an empty set like SADD does rather than
/// erroring with `KeyNotExist`.
fn members_of(db: &mut Database, key: &str, now: i64) -> Result<Vec<String>, Reply> {
    let container = db.get_or_create(key, now, || Value::Set(SetValue::new())).map_err(reply_from_err)?;
    container.as_set_mut().map(|s| s.members()).map_err(reply_from_err)
}

pub fn sinter(args: &[String], db: &mut Database, now: i64) -> Reply {
    let a = match members_of(db, &args[1], now) {
        Ok(m) => m,
        Err(r) => return r,
    };
    let b = match members_of(db, &args[2], now) {
        Ok(m) => m,
        Err(r) => return r,
    };
    let b_set: HashSet<&String> = b.iter().collect();
    let result: Vec<String> = a.into_iter().filter(|m| b_set.contains(m)).collect();
    Reply::Array(result.into_iter().map(Reply::Bulk).collect())
}

pub fn sunion(args: &[String], db: &mut Database, now: i64) -> Reply {
    let a = match members_of(db, &args[1], now) {
        Ok(m) => m,
        Err(r) => return r,
    };
    let b = match members_of(db, &args[2], now) {
        Ok(m) => m,
        Err(r) => return r,
    };
    let mut result = a;
    for m in b {
        if !result.contains(&m) {
            result.push(m);
        }
    }
    Reply::Array(result.into_iter().map(Reply::Bulk).collect())
}

pub fn srem(args: &[String], db: &mut Database, now: i64) -> Reply {
    let key = &args[1];
    let container = match db.get_or_create(key, now, || Value::Set(SetValue::new())) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    let set = match container.as_set_mut() {
        Ok(s) => s,
        Err(e) => return reply_from_err(e),
    };
    set.remove(&args[2]);
    let now_empty = set.card() == 0;
    if now_empty {
        let _ = db.remove(key);
    }
    Reply::ok()
}
