use kv_core::LinkedList;
use kv_proto::Reply;

use super::reply_from_err;
use crate::db::Database;
use crate::error::DbError;
use crate::value::Value;

pub fn lpush(args: &[String], db: &mut Database, now: i64) -> Reply {
    let container = match db.get_or_create(&args[1], now, || Value::List(LinkedList::new())) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    match container.as_list_mut() {
        Ok(l) => {
            l.push_front(args[2].clone());
            Reply::ok()
        }
        Err(e) => reply_from_err(e),
    }
}

pub fn rpush(args: &[String], db: &mut Database, now: i64) -> Reply {
    let container = match db.get_or_create(&args[1], now, || Value::List(LinkedList::new())) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    match container.as_list_mut() {
        Ok(l) => {
            l.push_back(args[2].clone());
            Reply::ok()
        }
        Err(e) => reply_from_err(e),
    }
}

fn pop(args: &[String], db: &mut Database, now: i64, from_front: bool) -> Reply {
    let key = &args[1];
    let container = match db.get(key, now) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    let list = match container.as_list_mut() {
        Ok(l) => l,
        Err(e) => return reply_from_err(e),
    };
    let popped = if from_front { list.pop_front() } else { list.pop_back() };
    let Some(value) = popped else {
        return reply_from_err(DbError::KeyNotExist);
    };
    if list.is_empty() {
        let _ = db.remove(key);
    }
    Reply::Simple(value)
}

pub fn lpop(args: &[String], db: &mut Database, now: i64) -> Reply {
    pop(args, db, now, true)
}

pub fn rpop(args: &[String], db: &mut Database, now: i64) -> Reply {
    pop(args, db, now, false)
}

pub fn llen(args: &[String], db: &mut Database, now: i64) -> Reply {
    let container = match db.get(&args[1], now) {
        Ok(c) => c,
        Err(e) => return reply_from_err(e),
    };
    match container.as_list_mut() {
        Ok(l) => Reply::Integer(l.len() as i64),
        Err(e) => reply_from_err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::super::dispatch;
    use super::*;

    #[test]
    fn lpush_then_lpop_is_lifo() {
        let mut db = Database::new();
        dispatch(&["LPUSH".into(), "l".into(), "a".into()], &mut db, 0);
        dispatch(&["LPUSH".into(), "l".into(), "b".into()], &mut db, 0);
        assert_eq!(dispatch(&["LPOP".into(), "l".into()], &mut db, 0), Reply::Simple("b".into()));
    }

    #[test]
    fn rpush_then_rpop_is_lifo_from_the_tail() {
        let mut db = Database::new();
        dispatch(&["RPUSH".into(), "l".into(), "a".into()], &mut db, 0);
        dispatch(&["RPUSH".into(), "l".into(), "b".into()], &mut db, 0);
        assert_eq!(dispatch(&["RPOP".into(), "l".into()], &mut db, 0), Reply::Simple("b".into()));
    }

    #[test]
    fn pop_of_the_last_element_removes_the_key() {
        let mut db = Database::new();
        dispatch(&["LPUSH".into(), "l".into(), "a".into()], &mut db, 0);
        dispatch(&["LPOP".into(), "l".into()], &mut db, 0);
        assert_eq!(dispatch(&["LLEN".into(), "l".into()], &mut db, 0), Reply::error("key does not exist in database"));
    }

    #[test]
    fn lpop_on_a_missing_key_is_key_not_exist() {
        let mut db = Database::new();
        assert_eq!(dispatch(&["LPOP".into(), "l".into()], &mut db, 0), Reply::error("key does not exist in database"));
    }
}
