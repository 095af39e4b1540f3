//! The key-value store adapter.
//!
//! Every durable byte in vivarium goes through the `Kv` trait: plain
//! get/put/delete/list plus a single conditional primitive,
//! `put_if_absent`. There are deliberately no cross-key transactions in the
//! contract: the production backend is an eventually consistent KV
//! namespace, and every layer above this one is written for partial-failure
//! recovery rather than atomicity.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rocksdb::{DBWithThreadMode, IteratorMode, MultiThreaded, Options};

use crate::error::{Result, StoreError};

/// The storage adapter contract.
///
/// Implementations must make `put_if_absent` atomic with respect to
/// concurrent callers; it is the only lock-like construct available to the
/// layers above and backs the per-product sale claim.
pub trait Kv: Send + Sync {
    /// Get a value by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend operation fails.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Insert or replace a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend operation fails.
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a key. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend operation fails.
    fn delete(&self, key: &str) -> Result<()>;

    /// List all keys starting with `prefix`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend operation fails.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Insert a value only if the key is absent.
    ///
    /// Returns `true` if the value was written, `false` if the key already
    /// existed (the stored value is left untouched).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend operation fails.
    fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<bool>;
}

/// RocksDB-backed implementation of the `Kv` adapter.
///
/// Keys live in the default column family as prefixed strings; the layout
/// is defined in [`crate::keys`]. RocksDB is stronger than the contract
/// requires, which is fine; callers may only rely on the contract.
pub struct RocksKv {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    // RocksDB has no native compare-and-swap; conditional inserts are
    // serialized through this mutex instead.
    cas_lock: Mutex<()>,
}

impl RocksKv {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DBWithThreadMode::open(&opts, path)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            cas_lock: Mutex::new(()),
        })
    }
}

impl Kv for RocksKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.db
            .get(key.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db
            .put(key.as_bytes(), value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.db
            .delete(key.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let iter = self.db.iterator(IteratorMode::From(
            prefix.as_bytes(),
            rocksdb::Direction::Forward,
        ));

        let mut keys = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(prefix.as_bytes()) {
                break;
            }

            let key = String::from_utf8(key.to_vec())
                .map_err(|e| StoreError::MalformedKey(e.to_string()))?;
            keys.push(key);
        }

        Ok(keys)
    }

    fn put_if_absent(&self, key: &str, value: &[u8]) -> Result<bool> {
        let _guard = self
            .cas_lock
            .lock()
            .map_err(|_| StoreError::Database("cas lock poisoned".into()))?;

        if self.get(key)?.is_some() {
            return Ok(false);
        }
        self.put(key, value)?;
        Ok(true)
    }
}

/// Serialize a value as JSON bytes.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if encoding fails.
pub fn to_bytes<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Deserialize a value from JSON bytes.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if decoding fails.
pub fn from_bytes<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn create_test_kv() -> (RocksKv, TempDir) {
        let dir = TempDir::new().unwrap();
        let kv = RocksKv::open(dir.path()).unwrap();
        (kv, dir)
    }

    #[test]
    fn get_put_delete() {
        let (kv, _dir) = create_test_kv();

        assert!(kv.get("a").unwrap().is_none());

        kv.put("a", b"1").unwrap();
        assert_eq!(kv.get("a").unwrap().as_deref(), Some(b"1".as_slice()));

        kv.put("a", b"2").unwrap();
        assert_eq!(kv.get("a").unwrap().as_deref(), Some(b"2".as_slice()));

        kv.delete("a").unwrap();
        assert!(kv.get("a").unwrap().is_none());

        // Deleting again is fine.
        kv.delete("a").unwrap();
    }

    #[test]
    fn list_respects_prefix() {
        let (kv, _dir) = create_test_kv();

        kv.put("product:a", b"{}").unwrap();
        kv.put("product:b", b"{}").unwrap();
        kv.put("sale:a", b"{}").unwrap();
        kv.put("producx", b"{}").unwrap();

        let keys = kv.list("product:").unwrap();
        assert_eq!(keys, vec!["product:a", "product:b"]);

        assert!(kv.list("missing:").unwrap().is_empty());
    }

    #[test]
    fn put_if_absent_single_writer() {
        let (kv, _dir) = create_test_kv();

        assert!(kv.put_if_absent("claim:p", b"first").unwrap());
        assert!(!kv.put_if_absent("claim:p", b"second").unwrap());
        assert_eq!(
            kv.get("claim:p").unwrap().as_deref(),
            Some(b"first".as_slice())
        );
    }

    #[test]
    fn put_if_absent_admits_one_winner_under_contention() {
        let (kv, _dir) = create_test_kv();
        let kv = Arc::new(kv);
        let wins = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let kv = Arc::clone(&kv);
                let wins = Arc::clone(&wins);
                std::thread::spawn(move || {
                    let value = format!("writer-{i}");
                    if kv.put_if_absent("claim:hot", value.as_bytes()).unwrap() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert!(kv.get("claim:hot").unwrap().is_some());
    }

    #[test]
    fn json_helpers_roundtrip() {
        let bytes = to_bytes(&serde_json::json!({"k": "v"})).unwrap();
        let value: serde_json::Value = from_bytes(&bytes).unwrap();
        assert_eq!(value["k"], "v");

        let err = from_bytes::<serde_json::Value>(b"not json");
        assert!(matches!(err, Err(StoreError::Serialization(_))));
    }
}
