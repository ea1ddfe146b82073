//! Append-only JSON-lines record store.
//!
//! Each line is one persisted request plus its generated id. The file is read
//! once on open; lookups are served from memory and inserts append to both.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::contract::RecordStore;
use crate::error::StoreError;
use crate::request::{Organisation, RecordFilter, Request};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    #[serde(flatten)]
    request: Request,
}

pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<Vec<StoredRecord>>,
}

impl JsonFileStore {
    /// Open `path`, loading existing records. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut records = Vec::new();

        if path.exists() {
            let file = fs::File::open(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            for (index, line) in BufReader::new(file).lines().enumerate() {
                let line = line.map_err(|source| StoreError::Io {
                    path: path.clone(),
                    source,
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                let record = serde_json::from_str(&line).map_err(|source| StoreError::Corrupt {
                    path: path.clone(),
                    line: index + 1,
                    source,
                })?;
                records.push(record);
            }
        }

        info!(path = %path.display(), records = records.len(), "Opened record store");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    fn append(&self, record: &StoredRecord) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).map_err(io_err)
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn find_one(&self, filter: &RecordFilter) -> Result<Option<Request>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        let found = records
            .iter()
            .find(|r| filter.matches(&r.request))
            .map(|r| r.request.clone());
        debug!(?filter, hit = found.is_some(), "Record lookup");
        Ok(found)
    }

    async fn insert(&self, request: &Request) -> Result<String, StoreError> {
        let record = StoredRecord {
            id: Uuid::new_v4().to_string(),
            request: request.clone(),
        };
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        self.append(&record)?;
        let id = record.id.clone();
        records.push(record);
        Ok(id)
    }

    async fn list(&self, organisation: Option<Organisation>) -> Result<Vec<Request>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records
            .iter()
            .filter(|r| organisation.map_or(true, |o| o == r.request.organisation))
            .map(|r| r.request.clone())
            .collect())
    }
}
