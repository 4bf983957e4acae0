use kv_proto::Reply;

use super::reply_from_err;
use crate::db::{Database, DEFAULT_EXPIRE_NS};
use crate::error::DbError;
use crate::value::{Value, MAX_SCORE};

pub fn get(args: &[String], db: &mut Database, now: i64) -> Reply {
    match db.get(&args[1], now).and_then(|v| v.as_str().map(str::to_string)) {
        Ok(s) => Reply::Simple(s),
        Err(e) => reply_from_err(e),
    }
}

pub fn set(args: &[String], db: &mut Database, now: i64) -> Reply {
    match db.set_str(&args[1], args[2].clone(), now + DEFAULT_EXPIRE_NS) {
        Ok(()) => Reply::ok(),
        Err(e) => reply_from_err(e),
    }
}

pub fn setex(args: &[String], db: &mut Database, now: i64) -> Reply {
    let Ok(seconds) = args[2].parse::<i64>() else {
        return reply_from_err(DbError::NotANumber);
    };
    match db.set_str(&args[1], args[3].clone(), now + seconds * 1_000_000_000) {
        Ok(()) => Reply::ok(),
        Err(e) => reply_from_err(e),
    }
}

pub fn setnx(args: &[String], db: &mut Database, now: i64) -> Reply {
    if db.exists(&args[1], now) {
        return Reply::Simple("Key already exist".to_string());
    }
    match db.set_str(&args[1], args[2].clone(), now + DEFAULT_EXPIRE_NS) {
        Ok(()) => Reply::ok(),
        Err(e) => reply_from_err(e),
    }
}

fn add_delta(args: &[String], db: &mut Database, now: i64, delta: i64) -> Reply {
    let container = match db.get_or_create(&args[1], now, || Value::Str("0".to_string())) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    let current = match container.as_str() {
        Ok(s) => s,
        Err(e) => return reply_from_err(e),
    };
    let Ok(parsed) = current.parse::<i64>() else {
        return reply_from_err(DbError::NotANumber);
    };
    let Some(next) = parsed.checked_add(delta) else {
        return reply_from_err(DbError::Overflow);
    };
    if next.unsigned_abs() as i128 > MAX_SCORE as i128 {
        return reply_from_err(DbError::Overflow);
    }
    *container = Value::Str(next.to_string());
    Reply::ok()
}

pub fn incr(args: &[String], db: &mut Database, now: i64) -> Reply {
    add_delta(args, db, now, 1)
}

pub fn decr(args: &[String], db: &mut Database, now: i64) -> Reply {
    add_delta(args, db, now, -1)
}

pub fn incrby(args: &[String], db: &mut Database, now: i64) -> Reply {
    let Ok(delta) = args[2].parse::<i64>() else {
        return reply_from_err(DbError::NotANumber);
    };
    add_delta(args, db, now, delta)
}

#[cfg(test)]
mod tests {
    use super::super::dispatch;
    use super::*;

    #[test]
    fn get_on_missing_key_is_an_error() {
        let mut db = Database::new();
        assert_eq!(get(&["GET".into(), "k".into()], &mut db, 0), Reply::error("key does not exist in database"));
    }

    #[test]
    fn set_then_get_roundtrip() {
        let mut db = Database::new();
        assert_eq!(dispatch(&["SET".into(), "k".into(), "v".into()], &mut db, 0), Reply::ok());
        assert_eq!(dispatch(&["GET".into(), "k".into()], &mut db, 0), Reply::Simple("v".into()));
    }

    #[test]
    fn setnx_refuses_an_existing_key() {
        let mut db = Database::new();
        dispatch(&["SET".into(), "k".into(), "v".into()], &mut db, 0);
        assert_eq!(
            dispatch(&["SETNX".into(), "k".into(), "v2".into()], &mut db, 0),
            Reply::Simple("Key already exist".into())
        );
    }

    #[test]
    fn incrby_accumulates_on_a_fresh_key() {
        let mut db = Database::new();
        dispatch(&["SET".into(), "k".into(), "1".into()], &mut db, 0);
        dispatch(&["INCRBY".into(), "k".into(), "41".into()], &mut db, 0);
        assert_eq!(dispatch(&["GET".into(), "k".into()], &mut db, 0), Reply::Simple("42".into()));
    }

    #[test]
    fn incr_on_a_non_numeric_value_fails() {
        let mut db = Database::new();
        dispatch(&["SET".into(), "k".into(), "nope".into()], &mut db, 0);
        assert_eq!(dispatch(&["INCR".into(), "k".into()], &mut db, 0), Reply::error("not a number"));
    }

    #[test]
    fn setex_expires_after_its_ttl() {
        let mut db = Database::new();
        dispatch(&["SETEX".into(), "k".into(), "10".into(), "v".into()], &mut db, 0);
        assert_eq!(dispatch(&["GET".into(), "k".into()], &mut db, 11_000_000_000), Reply::error("key does not exist in database"));
    }
}
