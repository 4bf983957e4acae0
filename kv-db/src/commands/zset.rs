use kv_proto::Reply;

use super::reply_from_err;
use crate::db::Database;
use crate::error::DbError;
use crate::value::{SortedSetValue, Value};

pub fn zadd(args: &[String], db: &mut Database, now: i64) -> Reply {
    let Ok(score) = args[2].parse::<i64>() else {
        return reply_from_err(DbError::NotANumber);
    };
    let container = match db.get_or_create(&args[1], now, || Value::SortedSet(SortedSetValue::new())) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    let zset = match container.as_sorted_set_mut() {
        Ok(z) => z,
        Err(e) => return reply_from_err(e),
    };
    match zset.add_member(args[3].clone(), score) {
        Ok(()) => Reply::ok(),
        Err(e) => reply_from_err(e),
    }
}

pub fn zrange(args: &[String], db: &mut Database, now: i64) -> Reply {
    let (Ok(left), Ok(right)) = (args[2].parse::<i64>(), args[3].parse::<i64>()) else {
        return reply_from_err(DbError::NotANumber);
    };
    let container = match db.get(&args[1], now) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    match container.as_sorted_set_mut() {
        Ok(z) => Reply::Array(z.range(left, right).into_iter().map(Reply::Bulk).collect()),
        Err(e) => reply_from_err(e),
    }
}

pub fn zincrby(args: &[String], db: &mut Database, now: i64) -> Reply {
    let Ok(delta) = args[2].parse::<i64>() else {
        return reply_from_err(DbError::NotANumber);
    };
    let container = match db.get_or_create(&args[1], now, || Value::SortedSet(SortedSetValue::new())) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    let zset = match container.as_sorted_set_mut() {
        Ok(z) => z,
        Err(e) => return reply_from_err(e),
    };
    match zset.incr(&args[3], delta) {
        Ok(_) => Reply::ok(),
        Err(e) => reply_from_err(e),
    }
}

pub fn zrem(args: &[String], db: &mut Database, now: i64) -> Reply {
    let key = &args[1];
    let container = match db.get(key, now) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    let zset = match container.as_sorted_set_mut() {
        Ok(z) => z,
        Err(e) => return reply_from_err(e),
    };
    zset.remove(&args[2]);
    let now_empty = zset.is_empty();
    if now_empty {
        let _ = db.remove(key);
    }
    Reply::ok()
}

pub fn zscore(args: &[String], db: &mut Database, now: i64) -> Reply {
    let container = match db.get(&args[1], now) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    let zset = match container.as_sorted_set_mut() {
        Ok(z) => z,
        Err(e) => return reply_from_err(e),
    };
    match zset.score(&args[2]) {
        Ok(score) => Reply::Integer(score),
        Err(e) => reply_from_err(e),
    }
}
