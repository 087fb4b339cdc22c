//! Append-only storage for confirmed records.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::permit::ConfirmedRecord;

/// Narrow save/list interface over confirmed records.
pub trait RecordStore {
    /// Append a record.
    fn save(&self, record: &ConfirmedRecord) -> Result<(), StoreError>;

    /// All records in confirmation order.
    fn list(&self) -> Result<Vec<ConfirmedRecord>, StoreError>;

    /// The most recent record for a document id.
    fn get(&self, document_id: &str) -> Result<Option<ConfirmedRecord>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .rev()
            .find(|r| r.document_id == document_id))
    }
}

/// One JSON record per line in a local file.
///
/// Writers are serialised through a lock and each record goes out in a
/// single `write_all`, so concurrent saves never interleave.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonLinesStore {
    fn save(&self, record: &ConfirmedRecord) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        debug!("Stored confirmed record {}", record.document_id);
        Ok(())
    }

    fn list(&self) -> Result<Vec<ConfirmedRecord>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    "Skipping malformed record at {}:{}: {}",
                    self.path.display(),
                    number + 1,
                    e
                ),
            }
        }
        Ok(records)
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ConfirmedRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn save(&self, record: &ConfirmedRecord) -> Result<(), StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .push(record.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<ConfirmedRecord>, StoreError> {
        Ok(self.records.lock().map_err(|_| StoreError::Poisoned)?.clone())
    }
}
