use kv_proto::Reply;

use super::reply_from_err;
use crate::db::Database;

pub fn rename(args: &[String], db: &mut Database, now: i64) -> Reply {
    match db.rename(&args[1], &args[2], now) {
        Ok(()) => Reply::ok(),
        Err(e) => reply_from_err(e),
    }
}

pub fn del(args: &[String], db: &mut Database, _now: i64) -> Reply {
    match db.remove(&args[1]) {
        Ok(()) => Reply::ok(),
        Err(e) => reply_from_err(e),
    }
}

pub fn quit(_args: &[String], _db: &mut Database, _now: i64) -> Reply {
    Reply::Close
}

pub fn ping(_args: &[String], _db: &mut Database, _now: i64) -> Reply {
    Reply::Simple("PONG".to_string())
}

pub fn dbsize(_args: &[String], db: &mut Database, _now: i64) -> Reply {
    Reply::Integer(db.len() as i64)
}

#[cfg(test)]
mod tests {
    use super::super::dispatch;
    use super::*;

    #[test]
    fn rename_moves_the_value() {
        let mut db = Database::new();
        dispatch(&["SET".into(), "old".into(), "v".into()], &mut db, 0);
        assert_eq!(dispatch(&["RENAME".into(), "old".into(), "new".into()], &mut db, 0), Reply::ok());
        assert_eq!(dispatch(&["GET".into(), "new".into()], &mut db, 0), Reply::Simple("v".into()));
    }

    #[test]
    fn del_of_a_missing_key_errors() {
        let mut db = Database::new();
        assert_eq!(dispatch(&["DEL".into(), "missing".into()], &mut db, 0), Reply::error("key does not exist in database"));
    }

    #[test]
    fn dbsize_counts_live_keys() {
        let mut db = Database::new();
        dispatch(&["SET".into(), "a".into(), "1".into()], &mut db, 0);
        dispatch(&["SET".into(), "b".into(), "2".into()], &mut db, 0);
        assert_eq!(dispatch(&["DBSIZE".into()], &mut db, 0), Reply::Integer(2));
    }

    #[test]
    fn quit_closes_the_connection() {
        let mut db = Database::new();
        assert_eq!(dispatch(&["QUIT".into()], &mut db, 0), Reply::Close);
    }
}
