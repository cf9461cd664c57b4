//! Synchronous local cache.
//!
//! The cache is a single blob: a JSON object mapping tournament ID to the
//! serialized tournament. It is always available and never authoritative.
//! The blob lives in a file ([`FileBlob`]) or in memory ([`MemoryBlob`]).

use log::warn;
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::errors::{SyncError, SyncResult};
use crate::tournament::models::Tournament;

/// Raw storage behind the cache
pub trait BlobStorage: Send + Sync {
    /// Read the blob; `None` when nothing was ever written
    fn read(&self) -> SyncResult<Option<String>>;

    /// Replace the blob
    fn write(&self, blob: &str) -> SyncResult<()>;
}

/// Blob kept in a file, replaced atomically through a temporary sibling
#[derive(Debug, Clone)]
pub struct FileBlob {
    path: PathBuf,
}

impl FileBlob {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlobStorage for FileBlob {
    fn read(&self) -> SyncResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, blob: &str) -> SyncResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(blob.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Blob kept in memory
#[derive(Debug, Default)]
pub struct MemoryBlob {
    blob: Mutex<Option<String>>,
}

impl MemoryBlob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing contents
    pub fn with_contents(contents: &str) -> Self {
        Self {
            blob: Mutex::new(Some(contents.to_string())),
        }
    }
}

impl BlobStorage for MemoryBlob {
    fn read(&self) -> SyncResult<Option<String>> {
        Ok(self.blob.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn write(&self, blob: &str) -> SyncResult<()> {
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = Some(blob.to_string());
        Ok(())
    }
}

/// Keyed tournament cache over a blob
pub struct LocalCache {
    storage: Box<dyn BlobStorage>,
    quota_bytes: Option<usize>,
    write_lock: Mutex<()>,
}

impl LocalCache {
    pub fn new(storage: Box<dyn BlobStorage>, quota_bytes: Option<usize>) -> Self {
        Self {
            storage,
            quota_bytes,
            write_lock: Mutex::new(()),
        }
    }

    /// In-memory cache without a quota
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBlob::new()), None)
    }

    /// File-backed cache
    pub fn file(path: impl Into<PathBuf>, quota_bytes: Option<usize>) -> Self {
        Self::new(Box::new(FileBlob::new(path)), quota_bytes)
    }

    fn read_map(&self) -> SyncResult<Map<String, Value>> {
        match self.storage.read()? {
            None => Ok(Map::new()),
            Some(blob) if blob.trim().is_empty() => Ok(Map::new()),
            Some(blob) => match serde_json::from_str::<Value>(&blob)? {
                Value::Object(map) => Ok(map),
                other => Err(SyncError::ParseFailure(format!(
                    "expected an object of tournaments, found {}",
                    json_kind(&other)
                ))),
            },
        }
    }

    /// Read the map for a write, starting over when the blob is unreadable
    fn read_map_for_write(&self) -> SyncResult<Map<String, Value>> {
        match self.read_map() {
            Err(SyncError::ParseFailure(reason)) => {
                warn!("Discarding unreadable local cache: {}", reason);
                Ok(Map::new())
            }
            other => other,
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> SyncResult<()> {
        let blob = serde_json::to_string(map)?;
        if let Some(limit) = self.quota_bytes {
            if blob.len() > limit {
                return Err(SyncError::QuotaExceeded {
                    needed: blob.len(),
                    limit,
                });
            }
        }
        self.storage.write(&blob)
    }

    /// Cached copy of a tournament
    pub fn get(&self, id: &str) -> SyncResult<Option<Tournament>> {
        match self.read_map()?.remove(id) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Store a tournament under its ID
    pub fn put(&self, tournament: &Tournament) -> SyncResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map_for_write()?;
        map.insert(tournament.id.clone(), serde_json::to_value(tournament)?);
        self.write_map(&map)
    }

    /// Drop a tournament; returns whether it was cached
    pub fn remove(&self, id: &str) -> SyncResult<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map_for_write()?;
        let removed = map.remove(id).is_some();
        if removed {
            self.write_map(&map)?;
        }
        Ok(removed)
    }

    /// IDs of every cached tournament
    pub fn ids(&self) -> SyncResult<Vec<String>> {
        Ok(self.read_map()?.keys().cloned().collect())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
