//! Memoization of analysis results.
//!
//! The engines are pure, so a result can be reused whenever the inputs and
//! configuration serialize to the same bytes. Entries are keyed by a SHA-256
//! fingerprint and kept in memory, optionally mirrored to
//! `<dir>/<fingerprint>.json`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Hex SHA-256 over the JSON encoding of `inputs` followed by `config`.
pub fn fingerprint<I, C>(inputs: &I, config: &C) -> Result<String>
where
    I: Serialize + ?Sized,
    C: Serialize + ?Sized,
{
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(inputs)?);
    hasher.update([0u8]);
    hasher.update(serde_json::to_vec(config)?);
    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint-keyed result store.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<String, serde_json::Value>,
    dir: Option<PathBuf>,
    hits: u64,
    misses: u64,
}

impl ResultCache {
    /// In-memory cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache mirrored to `dir`, which is created if missing.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: Some(dir),
            ..Self::default()
        })
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{key}.json")))
    }

    /// Look up a stored result. Unreadable disk entries count as misses.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        if !self.entries.contains_key(key) {
            let from_disk = self
                .entry_path(key)
                .and_then(|path| std::fs::read(path).ok())
                .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(&bytes).ok());
            if let Some(value) = from_disk {
                self.entries.insert(key.to_string(), value);
            }
        }

        let found = self
            .entries
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok());
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Store a result under `key`.
    pub fn insert<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_value(value)?;
        if let Some(path) = self.entry_path(key) {
            std::fs::write(path, serde_json::to_vec(&json)?)?;
        }
        self.entries.insert(key.to_string(), json);
        Ok(())
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_compute<T, F>(&mut self, key: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if let Some(hit) = self.get(key) {
            tracing::debug!(key, "cache hit");
            return Ok(hit);
        }
        let value = compute()?;
        self.insert(key, &value)?;
        Ok(value)
    }

    /// Drop every entry, including mirrored files.
    pub fn clear(&mut self) -> Result<()> {
        if let Some(dir) = &self.dir {
            for entry in std::fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    std::fs::remove_file(path)?;
                }
            }
        }
        self.entries.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn counters(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::AnalyticsConfig;

    #[test]
    fn test_fingerprint_is_stable_and_config_sensitive() {
        let config = AnalyticsConfig::default();
        let inputs = vec![30.0, 35.0, 32.0];

        let a = fingerprint(&inputs, &config).unwrap();
        let b = fingerprint(&inputs, &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let mut changed = config.clone();
        changed.simulation.trials = 10;
        assert_ne!(a, fingerprint(&inputs, &changed).unwrap());
        assert_ne!(a, fingerprint(&vec![30.0, 35.0], &config).unwrap());
    }

    #[test]
    fn test_get_or_compute_only_computes_once() {
        let mut cache = ResultCache::new();
        let mut calls = 0;

        let first: f64 = cache
            .get_or_compute("k", || {
                calls += 1;
                Ok(0.84)
            })
            .unwrap();
        let second: f64 = cache
            .get_or_compute("k", || {
                calls += 1;
                Ok(0.0)
            })
            .unwrap();

        assert_eq!(first, 0.84);
        assert_eq!(second, 0.84);
        assert_eq!(calls, 1);
        assert_eq!(cache.counters(), (1, 1));
    }

    #[test]
    fn test_directory_cache_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut cache = ResultCache::with_dir(dir.path()).unwrap();
            cache.insert("abc", &vec![1u32, 2, 3]).unwrap();
        }

        let mut cache = ResultCache::with_dir(dir.path()).unwrap();
        assert!(cache.is_empty());
        let restored: Option<Vec<u32>> = cache.get("abc");
        assert_eq!(restored, Some(vec![1, 2, 3]));

        cache.clear().unwrap();
        assert!(cache.is_empty());
        assert!(cache.get::<Vec<u32>>("abc").is_none());
    }
}
