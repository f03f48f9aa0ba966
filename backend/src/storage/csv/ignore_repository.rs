//! # CSV Ignore Repository
//!
//! Per-viewer pool suppressions in `{data}/ignored.csv`. Rows are only ever
//! appended; a repeated ignore writes nothing.
//!
//! ```csv
//! viewer_id,donation_id,ignored_at
//! user_2,donation::9f2c...,2025-02-27T10:00:00+00:00
//! ```

use anyhow::Result;
use csv::{Reader, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing::{debug, warn};

use super::connection::CsvConnection;
use crate::domain::clock::Clock;
use crate::storage::IgnoreStorage;

const IGNORED_HEADER: &str = "viewer_id,donation_id,ignored_at";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IgnoreCsvRecord {
    viewer_id: String,
    donation_id: String,
    ignored_at: String,
}

#[derive(Clone)]
pub struct IgnoreRepository {
    connection: CsvConnection,
    clock: Arc<dyn Clock>,
}

impl IgnoreRepository {
    pub fn new(connection: CsvConnection, clock: Arc<dyn Clock>) -> Self {
        Self { connection, clock }
    }

    fn read_records(&self) -> Result<Vec<IgnoreCsvRecord>> {
        let path = self.connection.ignored_file_path();
        self.connection.ensure_file_exists(&path, IGNORED_HEADER)?;

        let mut reader = Reader::from_path(&path)?;
        let mut records = Vec::new();
        for result in reader.deserialize::<IgnoreCsvRecord>() {
            match result {
                Ok(record) => records.push(record),
                Err(e) => warn!("Failed to read ignore row: {}. Skipping.", e),
            }
        }
        Ok(records)
    }
}

impl IgnoreStorage for IgnoreRepository {
    fn ignore_donation(&self, viewer_id: &str, donation_id: &str) -> Result<bool> {
        let _guard = self.connection.lock_writes()?;
        let already = self
            .read_records()?
            .iter()
            .any(|r| r.viewer_id == viewer_id && r.donation_id == donation_id);
        if already {
            return Ok(false);
        }

        let file = OpenOptions::new()
            .append(true)
            .open(self.connection.ignored_file_path())?;
        // Header already present, append rows only
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.serialize(IgnoreCsvRecord {
            viewer_id: viewer_id.to_string(),
            donation_id: donation_id.to_string(),
            ignored_at: self.clock.now().to_rfc3339(),
        })?;
        writer.flush()?;

        debug!("Appended ignore of {} for {}", donation_id, viewer_id);
        Ok(true)
    }

    fn ignored_by(&self, viewer_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .read_records()?
            .into_iter()
            .filter(|r| r.viewer_id == viewer_id)
            .map(|r| r.donation_id)
            .collect())
    }
}
