//! Durable at-most-once placement record

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Whether (and where) the structure has been placed
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementRecord {
    pub placed: bool,
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl PlacementRecord {
    pub fn unplaced() -> Self {
        Self::default()
    }

    pub fn at(world: impl Into<String>, pos: IVec3) -> Self {
        Self {
            placed: true,
            world: world.into(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
        }
    }

    pub fn position(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

/// Persistent storage of the single placement record.
///
/// `write` must replace the record as a whole or not at all.
pub trait RecordStore {
    fn read(&self) -> Result<PlacementRecord>;

    fn write(&self, record: &PlacementRecord) -> Result<()>;
}

/// Record kept as a JSON file.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// record, so readers see either the old or the new record.
#[derive(Clone, Debug)]
pub struct JsonRecordStore {
    path: PathBuf,
}

impl JsonRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "record".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn store_error(&self, e: impl std::fmt::Display) -> Error {
        Error::RecordStore(format!("{}: {}", self.path.display(), e))
    }
}

impl RecordStore for JsonRecordStore {
    /// A missing file reads as an unplaced record.
    fn read(&self) -> Result<PlacementRecord> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PlacementRecord::unplaced()),
            Err(e) => return Err(self.store_error(e)),
        };
        serde_json::from_str(&json).map_err(|e| self.store_error(e))
    }

    fn write(&self, record: &PlacementRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.store_error(e))?;
        }
        let tmp = self.temp_path();
        write_synced(&tmp, json.as_bytes()).map_err(|e| self.store_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.store_error(e))?;
        Ok(())
    }
}

/// Write `bytes` and flush them to disk before returning.
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// In-process record store; counts reads and writes.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    record: Mutex<PlacementRecord>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: PlacementRecord) -> Self {
        Self {
            record: Mutex::new(record),
            ..Default::default()
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Current record without counting a read
    pub fn snapshot(&self) -> PlacementRecord {
        match self.record.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl RecordStore for MemoryRecordStore {
    fn read(&self) -> Result<PlacementRecord> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.snapshot())
    }

    fn write(&self, record: &PlacementRecord) -> Result<()> {
        let mut guard = self
            .record
            .lock()
            .map_err(|_| Error::RecordStore("record lock poisoned".into()))?;
        *guard = record.clone();
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
