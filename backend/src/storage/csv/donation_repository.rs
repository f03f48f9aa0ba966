//! # CSV Donation Repository
//!
//! File-based donation storage in `{data}/donations.csv`, one row per
//! donation holding its latest version.
//!
//! ## CSV Format
//!
//! ```csv
//! id,status,food_items,donor_id,donor_name,receiver_id,receiver_name,location,category,quantity,expiry_date,pickup_time,description,created_at,updated_at
//! donation::9f2c...,accepted,"[""Rice"",""Beans""]",user_1,Dana,user_2,Riley,12 Market St,,2 bags,2025-03-01,after 5pm,,2025-02-27T10:00:00+00:00,2025-02-27T10:05:00+00:00
//! ```
//!
//! Empty cells stand for absent optional values. Food items are a JSON
//! array so item text may contain commas.
//!
//! ## Features
//!
//! - Whole-file rewrite through a temp file and rename
//! - Rows that fail to parse are carried through rewrites unchanged
//! - Conditional save holds the connection write lock across read and write

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{debug, info, warn};

use super::connection::CsvConnection;
use crate::domain::models::donation::{DonationDetails, DonationRecord, DonationStatus};
use crate::domain::models::identity::UserIdentity;
use crate::storage::DonationStorage;

const DONATIONS_HEADER: &str = "id,status,food_items,donor_id,donor_name,receiver_id,receiver_name,location,category,quantity,expiry_date,pickup_time,description,created_at,updated_at";

/// CSV record structure for donations
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DonationCsvRecord {
    id: String,
    status: String,
    food_items: String,
    donor_id: String,
    donor_name: String,
    receiver_id: String,
    receiver_name: String,
    location: String,
    category: String,
    quantity: String,
    expiry_date: String,
    pickup_time: String,
    description: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<&DonationRecord> for DonationCsvRecord {
    type Error = anyhow::Error;

    fn try_from(donation: &DonationRecord) -> Result<Self> {
        let (receiver_id, receiver_name) = match &donation.receiver {
            Some(receiver) => (receiver.id.clone(), receiver.display_name.clone()),
            None => (String::new(), String::new()),
        };
        Ok(DonationCsvRecord {
            id: donation.id.clone(),
            status: donation.status.as_str().to_string(),
            food_items: serde_json::to_string(&donation.food_items)?,
            donor_id: donation.donor.id.clone(),
            donor_name: donation.donor.display_name.clone(),
            receiver_id,
            receiver_name,
            location: donation.location.clone(),
            category: donation.details.category.clone().unwrap_or_default(),
            quantity: donation.details.quantity.clone().unwrap_or_default(),
            expiry_date: donation
                .details
                .expiry_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            pickup_time: donation.details.pickup_time.clone().unwrap_or_default(),
            description: donation.details.description.clone(),
            created_at: donation.created_at.to_rfc3339(),
            updated_at: donation.updated_at.to_rfc3339(),
        })
    }
}

impl TryFrom<DonationCsvRecord> for DonationRecord {
    type Error = anyhow::Error;

    fn try_from(record: DonationCsvRecord) -> Result<Self> {
        let status = DonationStatus::from_string(&record.status)
            .map_err(|e| anyhow!("Failed to parse donation status: {}", e))?;
        let food_items: Vec<String> = serde_json::from_str(&record.food_items)
            .map_err(|e| anyhow!("Failed to parse food items: {}", e))?;
        let receiver = if record.receiver_id.is_empty() {
            None
        } else {
            Some(UserIdentity::new(record.receiver_id, record.receiver_name))
        };
        let expiry_date = match optional(record.expiry_date) {
            Some(date) => Some(NaiveDate::parse_from_str(&date, "%Y-%m-%d")?),
            None => None,
        };

        Ok(DonationRecord {
            id: record.id,
            status,
            food_items,
            donor: UserIdentity::new(record.donor_id, record.donor_name),
            receiver,
            location: record.location,
            details: DonationDetails {
                category: optional(record.category),
                quantity: optional(record.quantity),
                expiry_date,
                pickup_time: optional(record.pickup_time),
                description: record.description,
            },
            created_at: parse_timestamp(&record.created_at)?,
            updated_at: parse_timestamp(&record.updated_at)?,
        })
    }
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| anyhow!("Invalid timestamp '{}': {}", value, e))?
        .with_timezone(&Utc))
}

#[derive(Default)]
struct DonationRows {
    donations: Vec<DonationRecord>,
    unparsed: Vec<StringRecord>,
}

/// CSV-based donation repository
#[derive(Clone)]
pub struct DonationRepository {
    connection: CsvConnection,
}

impl DonationRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    /// Read every donation row.
    ///
    /// Rows that fail to parse are left out of `donations` with a warning but
    /// kept verbatim in `unparsed`, so a rewrite never drops them.
    fn read_rows(&self) -> Result<DonationRows> {
        let path = self.connection.donations_file_path();
        self.connection.ensure_file_exists(&path, DONATIONS_HEADER)?;

        let mut reader = ReaderBuilder::new().flexible(true).from_path(&path)?;
        let headers = reader.headers()?.clone();
        let mut rows = DonationRows::default();
        for result in reader.records() {
            let raw = match result {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Failed to read donation row: {}. Skipping.", e);
                    continue;
                }
            };
            let parsed = raw
                .deserialize::<DonationCsvRecord>(Some(&headers))
                .map_err(|e| anyhow!(e))
                .and_then(DonationRecord::try_from);
            match parsed {
                Ok(donation) => rows.donations.push(donation),
                Err(e) => {
                    warn!("Failed to parse donation record: {}. Keeping row as is.", e);
                    rows.unparsed.push(raw);
                }
            }
        }
        Ok(rows)
    }

    /// Rewrite the whole file through a temp file
    fn write_rows(&self, rows: &DonationRows) -> Result<()> {
        let path = self.connection.donations_file_path();
        let temp_path = path.with_extension("csv.tmp");
        {
            let mut writer = WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&temp_path)?;
            writer.write_record(DONATIONS_HEADER.split(','))?;
            for donation in &rows.donations {
                writer.serialize(DonationCsvRecord::try_from(donation)?)?;
            }
            for raw in &rows.unparsed {
                writer.write_record(raw)?;
            }
            writer.flush()?;
        }
        fs::rename(&temp_path, &path)?;
        debug!(
            "Wrote {} donations ({} unparsed rows kept) to {:?}",
            rows.donations.len(),
            rows.unparsed.len(),
            path
        );
        Ok(())
    }
}

impl DonationStorage for DonationRepository {
    fn load_donation(&self, donation_id: &str) -> Result<Option<DonationRecord>> {
        Ok(self
            .read_rows()?
            .donations
            .into_iter()
            .find(|d| d.id == donation_id))
    }

    fn load_donations(&self) -> Result<Vec<DonationRecord>> {
        Ok(self.read_rows()?.donations)
    }

    fn insert_donation(&self, record: &DonationRecord) -> Result<bool> {
        let _guard = self.connection.lock_writes()?;
        let mut rows = self.read_rows()?;
        if rows.donations.iter().any(|d| d.id == record.id) {
            return Ok(false);
        }
        rows.donations.push(record.clone());
        self.write_rows(&rows)?;
        info!("Stored donation in CSV: {}", record.id);
        Ok(true)
    }

    fn save_donation_if_status(
        &self,
        record: &DonationRecord,
        expected: DonationStatus,
    ) -> Result<bool> {
        let _guard = self.connection.lock_writes()?;
        let mut rows = self.read_rows()?;
        let stored = match rows.donations.iter_mut().find(|d| d.id == record.id) {
            Some(stored) if stored.status == expected => stored,
            Some(stored) => {
                debug!(
                    "Conditional save of {} skipped: expected {}, found {}",
                    record.id, expected, stored.status
                );
                return Ok(false);
            }
            None => return Ok(false),
        };
        *stored = record.clone();
        self.write_rows(&rows)?;
        info!("Updated donation in CSV: {} ({})", record.id, record.status);
        Ok(true)
    }
}
