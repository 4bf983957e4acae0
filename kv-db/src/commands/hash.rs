use kv_core::Dict;
use kv_proto::Reply;

use super::reply_from_err;
use crate::db::Database;
use crate::error::DbError;
use crate::value::Value;

pub fn hset(args: &[String], db: &mut Database, now: i64) -> Reply {
    let container = match db.get_or_create(&args[1], now, || Value::Hash(Dict::new())) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    let hash = match container.as_hash_mut() {
        Ok(h) => h,
        Err(e) => return reply_from_err(e),
    };
    match hash.set(args[2].clone(), args[3].clone()) {
        Ok(()) => Reply::ok(),
        Err(e) => reply_from_err(e.into()),
    }
}

pub fn hget(args: &[String], db: &mut Database, now: i64) -> Reply {
    let container = match db.get(&args[1], now) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    let hash = match container.as_hash_mut() {
        Ok(h) => h,
        Err(e) => return reply_from_err(e),
    };
    match hash.get(&args[2]) {
        Ok(v) => Reply::Simple(v.clone()),
        Err(e) => reply_from_err(DbError::from(e)),
    }
}

pub fn hdel(args: &[String], db: &mut Database, now: i64) -> Reply {
    let key = &args[1];
    let container = match db.get_or_create(key, now, || Value::Hash(Dict::new())) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    let hash = match container.as_hash_mut() {
        Ok(h) => h,
        Err(e) => return reply_from_err(e),
    };
    let _ = hash.delete(&args[2]);
    let now_empty = hash.is_empty();
    if now_empty {
        let _ = db.remove(key);
    }
    Reply::ok()
}

#[cfg(test)]
mod tests {
    use super::super::dispatch;
    use super::*;

    #[test]
    fn hset_then_hget_roundtrip() {
        let mut db = Database::new();
        assert_eq!(dispatch(&["HSET".into(), "h".into(), "f".into(), "v".into()], &mut db, 0), Reply::ok());
        assert_eq!(dispatch(&["HGET".into(), "h".into(), "f".into()], &mut db, 0), Reply::Simple("v".into()));
    }

    #[test]
    fn hget_on_missing_hash_is_key_not_exist() {
        let mut db = Database::new();
        assert_eq!(dispatch(&["HGET".into(), "h".into(), "f".into()], &mut db, 0), Reply::error("key does not exist in database"));
    }

    #[test]
    fn hdel_of_the_only_field_removes_the_key() {
        let mut db = Database::new();
        dispatch(&["HSET".into(), "h".into(), "f".into(), "v".into()], &mut db, 0);
        dispatch(&["HDEL".into(), "h".into(), "f".into()], &mut db, 0);
        assert_eq!(dispatch(&["HGET".into(), "h".into(), "f".into()], &mut db, 0), Reply::error("key does not exist in database"));
    }

    #[test]
    fn hget_against_a_string_key_is_illegal_type() {
        let mut db = Database::new();
        dispatch(&["SET".into(), "s".into(), "v".into()], &mut db, 0);
        assert_eq!(dispatch(&["HGET".into(), "s".into(), "f".into()], &mut db, 0), Reply::error("Illegal key type"));
    }
}
