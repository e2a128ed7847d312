// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Config service and storage port for the dashboard.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Logical key under which dashboard prefs are stored.
pub const PREFS_KEY: &str = "dashboard";

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Serializes config values as JSON and delegates storage to a `ConfigStore`.
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the inner store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and deserialize a config value for `key`. Returns `Ok(None)` if missing
    /// or if the stored blob is empty.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist a config value for `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::prefs::DashboardPrefs;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemStore {
        blobs: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl ConfigStore for MemStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
            self.blobs
                .borrow()
                .get(key)
                .cloned()
                .ok_or(ConfigError::NotFound)
        }

        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.blobs.borrow_mut().insert(key.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn missing_key_loads_as_none() {
        let svc = ConfigService::new(MemStore::default());
        let loaded: Option<DashboardPrefs> = svc.load(PREFS_KEY).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn empty_blob_loads_as_none() {
        let svc = ConfigService::new(MemStore::default());
        svc.store().save_raw(PREFS_KEY, b"").unwrap();
        let loaded: Option<DashboardPrefs> = svc.load(PREFS_KEY).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn saved_prefs_come_back() {
        let svc = ConfigService::new(MemStore::default());
        let mut prefs = DashboardPrefs::default();
        prefs.poll.base_url = "http://gpu-box:8050".into();
        prefs.poll.interval_ms = 250;
        svc.save(PREFS_KEY, &prefs).unwrap();
        let loaded: DashboardPrefs = svc.load(PREFS_KEY).unwrap().unwrap();
        assert_eq!(loaded.poll.base_url, "http://gpu-box:8050");
        assert_eq!(loaded.poll.interval_ms, 250);
    }

    #[test]
    fn corrupt_blob_is_a_serde_error() {
        let svc = ConfigService::new(MemStore::default());
        svc.store().save_raw(PREFS_KEY, b"{ not json").unwrap();
        let err = svc.load::<DashboardPrefs>(PREFS_KEY).unwrap_err();
        assert!(matches!(err, ConfigError::Serde(_)));
    }
}
