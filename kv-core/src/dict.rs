//! Chained hash table with incremental, pause-free rehashing.
//!
//! A `Dict` never resizes its whole bucket array in one call. Once the load
//! factor crosses 0.75 it allocates a second table and migrates one bucket's
//! worth of entries on every subsequent operation until the old table is
//! empty, at which point the new table is promoted. Reads during a rehash
//! consult both tables; writes only ever touch the new one.

use crate::error::DictError;
use crate::hashing::hash_bytes;

const INITIAL_SIZE: usize = 16;
const LOAD_FACTOR: f64 = 0.75;
const MAX_SIZE: usize = 1 << 30;
const RANDOM_GET_PROBES: usize = 100;

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    hash: u64,
    val: V,
    next: Option<Box<Entry<K, V>>>,
}

#[derive(Debug)]
struct Table<K, V> {
    buckets: Vec<Option<Box<Entry<K, V>>>>,
    used: usize,
}

impl<K, V> Table<K, V> {
    fn with_size(size: usize) -> Self {
        let mut buckets = Vec::with_capacity(size);
        buckets.resize_with(size, || None);
        Table { buckets, used: 0 }
    }

    fn empty() -> Self {
        Table { buckets: Vec::new(), used: 0 }
    }

    fn size(&self) -> usize {
        self.buckets.len()
    }

    /// The reference implementation indexes with `hash % (size - 1)`, not the
    /// idiomatic `hash & (size - 1)`. Bucket `size - 1` is therefore never
    /// addressed by this function; preserved for observable parity (see
    /// DESIGN.md).
    fn index_for(&self, hash: u64) -> usize {
        let mask = (self.size() - 1) as u64;
        (hash % mask) as usize
    }
}

/// Associative array from string-like keys to values, with incremental
/// rehashing and an approximately-uniform random sample operation.
#[derive(Debug)]
pub struct Dict<K, V> {
    tables: [Table<K, V>; 2],
    rehash_index: isize,
}

impl<K, V> Default for Dict<K, V>
where
    K: AsRef<[u8]> + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Dict<K, V>
where
    K: AsRef<[u8]> + Eq + Clone,
{
    pub fn new() -> Self {
        Dict {
            tables: [Table::with_size(INITIAL_SIZE), Table::empty()],
            rehash_index: -1,
        }
    }

    pub fn is_rehashing(&self) -> bool {
        self.rehash_index != -1
    }

    pub fn len(&self) -> usize {
        self.tables[0].used + self.tables[1].used
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn reject_empty(key: &K) -> Result<(), DictError> {
        if key.as_ref().is_empty() {
            Err(DictError::IllegalKey)
        } else {
            Ok(())
        }
    }

    /// Inserts or overwrites `key`. Runs one rehash step first.
    pub fn set(&mut self, key: K, val: V) -> Result<(), DictError> {
        Self::reject_empty(&key)?;
        self.rehash_step();
        self.expand_if_needed();

        let hash = hash_bytes(key.as_ref());
        let write_idx = if self.is_rehashing() { 1 } else { 0 };

        // Overwrite in place if the key is already present in either table.
        for table_idx in 0..=1 {
            if self.tables[table_idx].size() == 0 {
                continue;
            }
            let bucket = self.tables[table_idx].index_for(hash);
            let mut cursor = &mut self.tables[table_idx].buckets[bucket];
            while let Some(entry) = cursor {
                if entry.key == key {
                    entry.val = val;
                    return Ok(());
                }
                cursor = &mut entry.next;
            }
        }

        let bucket = self.tables[write_idx].index_for(hash);
        let next = self.tables[write_idx].buckets[bucket].take();
        self.tables[write_idx].buckets[bucket] = Some(Box::new(Entry { key, hash, val, next }));
        self.tables[write_idx].used += 1;
        Ok(())
    }

    pub fn get(&mut self, key: &K) -> Result<&V, DictError> {
        Self::reject_empty(key)?;
        self.rehash_step();
        let hash = hash_bytes(key.as_ref());
        for table_idx in 0..=1 {
            if self.tables[table_idx].size() == 0 {
                continue;
            }
            let bucket = self.tables[table_idx].index_for(hash);
            let mut cursor = &self.tables[table_idx].buckets[bucket];
            while let Some(entry) = cursor {
                if &entry.key == key {
                    return Ok(&entry.val);
                }
                cursor = &entry.next;
            }
        }
        Err(DictError::KeyNotExist)
    }

    pub fn get_mut(&mut self, key: &K) -> Result<&mut V, DictError> {
        Self::reject_empty(key)?;
        self.rehash_step();
        let hash = hash_bytes(key.as_ref());
        let bucket0 = if self.tables[0].size() > 0 { Some(self.tables[0].index_for(hash)) } else { None };
        let bucket1 = if self.tables[1].size() > 0 { Some(self.tables[1].index_for(hash)) } else { None };
        if let Some(bucket) = bucket0 {
            if Self::chain_find_mut(&mut self.tables[0].buckets[bucket], key).is_some() {
                return Ok(Self::chain_find_mut(&mut self.tables[0].buckets[bucket], key).unwrap());
            }
        }
        if let Some(bucket) = bucket1 {
            if Self::chain_find_mut(&mut self.tables[1].buckets[bucket], key).is_some() {
                return Ok(Self::chain_find_mut(&mut self.tables[1].buckets[bucket], key).unwrap());
            }
        }
        Err(DictError::KeyNotExist)
    }

    fn chain_find_mut<'a>(
        chain: &'a mut Option<Box<Entry<K, V>>>,
        key: &K,
    ) -> Option<&'a mut V> {
        let mut cursor = chain.as_deref_mut();
        while let Some(entry) = cursor {
            if &entry.key == key {
                return Some(&mut entry.val);
            }
            cursor = entry.next.as_deref_mut();
        }
        None
    }

    pub fn exists(&mut self, key: &K) -> bool {
        self.get(key).is_ok()
    }

    pub fn delete(&mut self, key: &K) -> Result<V, DictError> {
        Self::reject_empty(key)?;
        self.rehash_step();
        let hash = hash_bytes(key.as_ref());
        self.delete_impl(key, hash)
    }

    fn delete_impl(&mut self, key: &K, hash: u64) -> Result<V, DictError> {
        for table_idx in 0..=1 {
            if self.tables[table_idx].size() == 0 {
                continue;
            }
            let bucket = self.tables[table_idx].index_for(hash);
            let chain = self.tables[table_idx].buckets[bucket].take();
            let (new_chain, removed) = Self::remove_from_chain(chain, key);
            self.tables[table_idx].buckets[bucket] = new_chain;
            if let Some(val) = removed {
                self.tables[table_idx].used -= 1;
                return Ok(val);
            }
        }
        Err(DictError::KeyNotExist)
    }

    fn remove_from_chain(
        chain: Option<Box<Entry<K, V>>>,
        key: &K,
    ) -> (Option<Box<Entry<K, V>>>, Option<V>) {
        match chain {
            None => (None, None),
            Some(mut entry) => {
                if entry.key == *key {
                    (entry.next.take(), Some(entry.val))
                } else {
                    let (rest, removed) = Self::remove_from_chain(entry.next.take(), key);
                    entry.next = rest;
                    (Some(entry), removed)
                }
            }
        }
    }

    /// Returns a uniformly-sampled entry, or `None` if the dict is empty or
    /// the probe budget runs out before finding a nonempty bucket.
    pub fn random_get(&self) -> Option<(&K, &V)> {
        use rand::Rng;
        if self.is_empty() {
            return None;
        }
        let table_idx = if self.is_rehashing() {
            if self.tables[0].used >= self.tables[1].used { 0 } else { 1 }
        } else {
            0
        };
        let table = &self.tables[table_idx];
        if table.size() == 0 {
            return None;
        }
        let mut rng = rand::rng();
        for _ in 0..RANDOM_GET_PROBES {
            let slot = rng.random_range(0..table.size());
            let mut chain_len = 0usize;
            let mut cursor = &table.buckets[slot];
            while let Some(entry) = cursor {
                chain_len += 1;
                cursor = &entry.next;
            }
            if chain_len == 0 {
                continue;
            }
            let pick = rng.random_range(0..chain_len);
            let mut cursor = &table.buckets[slot];
            for _ in 0..pick {
                cursor = &cursor.as_ref().unwrap().next;
            }
            let entry = cursor.as_ref().unwrap();
            return Some((&entry.key, &entry.val));
        }
        None
    }

    pub fn iter(&self) -> DictIter<'_, K, V> {
        DictIter { dict: self, table_idx: 0, bucket_idx: 0, cursor: None }
    }

    fn expand_if_needed(&mut self) {
        if self.is_rehashing() {
            return;
        }
        let size = self.tables[0].size();
        let used = self.tables[0].used;
        if size == 0 || (used as f64) / (size as f64) < LOAD_FACTOR {
            return;
        }
        let new_size = ((2 * used).next_power_of_two()).min(MAX_SIZE).max(INITIAL_SIZE);
        tracing::trace!(old_size = size, new_size, used, "dict rehash starting");
        self.tables[1] = Table::with_size(new_size);
        self.rehash_index = 0;
    }

    fn rehash_step(&mut self) {
        if !self.is_rehashing() {
            return;
        }
        let idx = self.rehash_index as usize;
        if idx >= self.tables[0].size() || self.tables[0].used == 0 {
            self.tables[0] = std::mem::replace(&mut self.tables[1], Table::empty());
            self.rehash_index = -1;
            tracing::trace!(new_size = self.tables[0].size(), "dict rehash completed");
            return;
        }
        let mut chain = self.tables[0].buckets[idx].take();
        while let Some(mut entry) = chain {
            chain = entry.next.take();
            let dst = self.tables[1].index_for(entry.hash);
            entry.next = self.tables[1].buckets[dst].take();
            self.tables[0].used -= 1;
            self.tables[1].used += 1;
            self.tables[1].buckets[dst] = Some(entry);
        }
        self.rehash_index += 1;
        tracing::trace!(bucket = idx, "dict rehash step");
        kv_util::metrics::dict_rehash_step();
    }
}

pub struct DictIter<'a, K, V> {
    dict: &'a Dict<K, V>,
    table_idx: usize,
    bucket_idx: usize,
    cursor: Option<&'a Entry<K, V>>,
}

impl<'a, K, V> Iterator for DictIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.cursor.take() {
                self.cursor = entry.next.as_deref();
                return Some((&entry.key, &entry.val));
            }
            let table = &self.dict.tables[self.table_idx];
            if self.bucket_idx >= table.size() {
                if self.table_idx == 0 && self.dict.tables[1].size() > 0 {
                    self.table_idx = 1;
                    self.bucket_idx = 0;
                    continue;
                }
                return None;
            }
            self.cursor = table.buckets[self.bucket_idx].as_deref();
            self.bucket_idx += 1;
        }
    }
}
