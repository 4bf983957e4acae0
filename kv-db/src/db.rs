//! The keyspace: a dict of values and a parallel dict of expiration
//! deadlines, with lazy expiration on every access.

use kv_core::Dict;

use crate::error::DbError;
use crate::value::Value;

/// Deadline handed to auto-created containers (`now + 1 hour`), matching the
/// reference implementation's default TTL for keys nobody asked to expire.
pub const DEFAULT_EXPIRE_NS: i64 = 3600 * 1_000_000_000;

pub struct Database {
    data: Dict<String, Value>,
    expire: Dict<String, i64>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Database { data: Dict::new(), expire: Dict::new() }
    }

    /// Number of live keys. Does not force an expiration sweep; it is the
    /// `Dict`'s O(1) element count, same as the reference `DBSIZE`.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Deletes `key` from both dicts if its deadline has passed. Returns
    /// whether it did. Idempotent: calling it on an already-expired-and-gone
    /// key is a no-op that returns `false`.
    pub fn delete_if_expired(&mut self, key: &str, now: i64) -> bool {
        let key = key.to_string();
        let Ok(deadline) = self.expire.get(&key) else {
            return false;
        };
        if now >= *deadline {
            let _ = self.data.delete(&key);
            let _ = self.expire.delete(&key);
            true
        } else {
            false
        }
    }

    pub fn exists(&mut self, key: &str, now: i64) -> bool {
        self.delete_if_expired(key, now);
        self.data.exists(&key.to_string())
    }

    /// Overwrites `key` with `value` and sets its deadline to the supplied
    /// absolute nanosecond timestamp.
    pub fn set_str(&mut self, key: &str, value: String, deadline_ns: i64) -> Result<(), DbError> {
        self.data.set(key.to_string(), Value::Str(value)).map_err(DbError::from)?;
        self.expire.set(key.to_string(), deadline_ns).map_err(DbError::from)?;
        Ok(())
    }

    /// Fetches the live value bound to `key`, deleting it first if it has
    /// expired. Expiration always wins over a type mismatch: an expired
    /// hash key reads back as "key does not exist", not "illegal type".
    pub fn get(&mut self, key: &str, now: i64) -> Result<&mut Value, DbError> {
        if self.delete_if_expired(key, now) {
            return Err(DbError::KeyNotExist);
        }
        self.data.get_mut(&key.to_string()).map_err(DbError::from)
    }

    /// Fetches the container bound to `key`, creating an empty one of the
    /// kind `make_default` produces (with a fresh default deadline) if
    /// absent. Used by write commands on container types (HSET, SADD, ...).
    pub fn get_or_create<F>(&mut self, key: &str, now: i64, make_default: F) -> Result<&mut Value, DbError>
    where
        F: FnOnce() -> Value,
    {
        self.delete_if_expired(key, now);
        if !self.data.exists(&key.to_string()) {
            self.data.set(key.to_string(), make_default()).map_err(DbError::from)?;
            self.expire.set(key.to_string(), now + DEFAULT_EXPIRE_NS).map_err(DbError::from)?;
        }
        self.data.get_mut(&key.to_string()).map_err(DbError::from)
    }

    pub fn remove(&mut self, key: &str) -> Result<(), DbError> {
        self.data.delete(&key.to_string()).map_err(DbError::from)?;
        let _ = self.expire.delete(&key.to_string());
        Ok(())
    }

    /// Moves a key's value and deadline to a new name. Fails with
    /// `KeyNotExist` if `from` is absent or has already expired.
    pub fn rename(&mut self, from: &str, to: &str, now: i64) -> Result<(), DbError> {
        if self.delete_if_expired(from, now) {
            return Err(DbError::KeyNotExist);
        }
        let value = self.data.delete(&from.to_string()).map_err(DbError::from)?;
        let deadline = self.expire.delete(&from.to_string()).unwrap_or(now + DEFAULT_EXPIRE_NS);
        self.data.set(to.to_string(), value).map_err(DbError::from)?;
        self.expire.set(to.to_string(), deadline).map_err(DbError::from)?;
        Ok(())
    }

    /// Samples up to `sample_size` keys and expires the ones whose deadline
    /// has passed. Feeds the active-expiration time event; never a
    /// substitute for the lazy check every read already performs.
    pub fn sweep_expired_sample(&mut self, now: i64, sample_size: usize) -> usize {
        let mut expired = 0;
        for _ in 0..sample_size {
            let Some((key, _)) = self.expire.random_get() else {
                break;
            };
            let key = key.clone();
            if self.delete_if_expired(&key, now) {
                expired += 1;
            }
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_roundtrip() {
        let mut db = Database::new();
        db.set_str("k", "v".into(), 1_000_000).unwrap();
        assert_eq!(db.get("k", 0).unwrap().as_str().unwrap(), "v");
    }

    #[test]
    fn expired_key_reads_as_not_exist() {
        let mut db = Database::new();
        db.set_str("k", "v".into(), 100).unwrap();
        assert_eq!(db.get("k", 200).unwrap_err(), DbError::KeyNotExist);
        assert_eq!(db.len(), 0);
    }

    #[test]
    fn get_or_create_only_creates_once() {
        let mut db = Database::new();
        db.get_or_create("h", 0, || Value::Hash(Dict::new())).unwrap();
        db.get_or_create("h", 0, || Value::Hash(Dict::new())).unwrap();
        assert_eq!(db.len(), 1);
    }

    #[test]
    fn rename_moves_value_and_deadline() {
        let mut db = Database::new();
        db.set_str("old", "v".into(), 1_000_000).unwrap();
        db.rename("old", "new", 0).unwrap();
        assert_eq!(db.get("new", 0).unwrap().as_str().unwrap(), "v");
        assert_eq!(db.get("old", 0).unwrap_err(), DbError::KeyNotExist);
    }

    #[test]
    fn remove_deletes_key_and_deadline() {
        let mut db = Database::new();
        db.set_str("k", "v".into(), 1_000_000).unwrap();
        db.remove("k").unwrap();
        assert_eq!(db.len(), 0);
        assert_eq!(db.remove("k").unwrap_err(), DbError::KeyNotExist);
    }
}
