// src/services/cache.rs
// DOCUMENTATION: TTL cache on top of a durable string key-value medium
// PURPOSE: Avoid repeat geodata queries and profile reads; never required for correctness

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;

use super::Clock;

/// Generic caching policy
pub const GENERIC_TTL: Duration = Duration::from_secs(5 * 60);

/// Policy for place queries
pub const PLACES_TTL: Duration = Duration::from_secs(20 * 60);

/// Errors raised by a cache medium
#[derive(Error, Debug)]
pub enum MediumError {
    #[error("storage capacity exceeded: {needed} bytes needed, {capacity} available")]
    CapacityExceeded { needed: usize, capacity: usize },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable string key-value storage
/// DOCUMENTATION: Finite capacity; writes may fail and callers must tolerate it
pub trait CacheMedium: Send + Sync {
    fn read(&self, key: &str) -> Option<String>;

    fn write(&self, key: &str, value: String) -> Result<(), MediumError>;
}

/// Process-local medium with an optional byte budget
#[derive(Default)]
pub struct MemoryMedium {
    store: RwLock<HashMap<String, String>>,
    capacity_bytes: Option<usize>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Medium that refuses writes once keys plus values exceed `capacity_bytes`
    pub fn with_capacity(capacity_bytes: usize) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            capacity_bytes: Some(capacity_bytes),
        }
    }
}

impl CacheMedium for MemoryMedium {
    fn read(&self, key: &str) -> Option<String> {
        let store = self.store.read().unwrap_or_else(|p| p.into_inner());
        store.get(key).cloned()
    }

    fn write(&self, key: &str, value: String) -> Result<(), MediumError> {
        let mut store = self.store.write().unwrap_or_else(|p| p.into_inner());

        if let Some(capacity) = self.capacity_bytes {
            let used: usize = store
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = used + key.len() + value.len();
            if needed > capacity {
                return Err(MediumError::CapacityExceeded { needed, capacity });
            }
        }

        store.insert(key.to_string(), value);
        Ok(())
    }
}

/// Directory-backed medium, one file per key
/// DOCUMENTATION: Survives restarts; keys are percent-encoded into file names
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, MediumError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn file_name(key: &str) -> String {
        let mut name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'-' || byte == b'_' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("%{:02X}", byte));
            }
        }
        name
    }
}

impl CacheMedium for FileMedium {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(Self::file_name(key))).ok()
    }

    fn write(&self, key: &str, value: String) -> Result<(), MediumError> {
        // Write-then-rename keeps readers from seeing a half-written entry
        let name = Self::file_name(key);
        let path = self.dir.join(&name);
        let tmp = self.dir.join(format!("{}.tmp", name));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Serialized cache entry
#[derive(Serialize, Deserialize)]
struct StoredEntry<V> {
    /// Epoch milliseconds at write time
    t: i64,
    v: V,
}

/// TTL cache with its own expiry policy
/// DOCUMENTATION: Entries are whole JSON documents; `get` hands out an owned
/// copy so callers can never mutate what is cached
#[derive(Clone)]
pub struct TtlCache {
    medium: Arc<dyn CacheMedium>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(medium: Arc<dyn CacheMedium>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { medium, clock, ttl }
    }

    /// Get cached value
    /// Missing, unparseable and expired entries all read as None
    pub fn get<V: DeserializeOwned>(&self, key: &str) -> Option<V> {
        let raw = match self.medium.read(key) {
            Some(raw) => raw,
            None => {
                log::debug!("Cache MISS for key: {}", key);
                return None;
            }
        };

        let entry: StoredEntry<V> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Cache UNREADABLE for key {}: {}", key, e);
                return None;
            }
        };

        let age_ms = self.clock.now_ms().saturating_sub(entry.t);
        if age_ms > self.ttl.as_millis() as i64 {
            log::debug!("Cache EXPIRED for key: {} (age {}ms)", key, age_ms);
            return None;
        }

        log::debug!("Cache HIT for key: {}", key);
        Some(entry.v)
    }

    /// Set cached value
    /// Write failures are logged and swallowed; the next read is a miss
    pub fn set<V: Serialize>(&self, key: &str, value: &V) {
        let entry = StoredEntry {
            t: self.clock.now_ms(),
            v: value,
        };

        let payload = match serde_json::to_string(&entry) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Cache SKIP for key {}: {}", key, e);
                return;
            }
        };

        match self.medium.write(key, payload) {
            Ok(()) => log::debug!("Cache SET for key: {} (TTL: {}s)", key, self.ttl.as_secs()),
            Err(e) => log::warn!("Cache write failed for key {}: {}", key, e),
        }
    }
}
