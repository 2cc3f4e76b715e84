//! Append-only bill ledger: the contract plus the CSV-file implementation.
//!
//! Column names and cell formats are fixed by the historical file layout:
//! `Date, Time, PlayStation, Customer, Duration_Hours, PS_Cost, Services,
//! Service_Cost, Total_Cost`, with `Duration_Hours` as `HH:MM` and money
//! rounded to two decimals before writing.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EngineError, EngineResult};

/// Station label written for walk-up orders that used no station.
pub const SERVICES_ONLY_LABEL: &str = "Services Only";

/// Customer label for station sessions, which are anonymous.
pub const ANONYMOUS_CUSTOMER: &str = "N/A";

/// One finalized bill as stored in the ledger file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Local date, `YYYY-MM-DD`.
    #[serde(rename = "Date")]
    pub date: String,
    /// Local time of day, `HH:MM:SS`.
    #[serde(rename = "Time")]
    pub time: String,
    /// Station label (`PS1`..`PS4`) or [`SERVICES_ONLY_LABEL`].
    #[serde(rename = "PlayStation")]
    pub station: String,
    /// Customer name, [`ANONYMOUS_CUSTOMER`] for station sessions.
    #[serde(rename = "Customer")]
    pub customer: String,
    /// Session length `HH:MM`, `00:00` for service-only bills.
    #[serde(rename = "Duration_Hours")]
    pub duration: String,
    /// Station cost actually charged (offer already applied or not).
    #[serde(rename = "PS_Cost")]
    pub station_cost: f64,
    /// Comma-joined `name($price)` list or the literal `None`.
    #[serde(rename = "Services")]
    pub services: String,
    /// Sum of the service charges.
    #[serde(rename = "Service_Cost")]
    pub services_cost: f64,
    /// `station_cost + services_cost`.
    #[serde(rename = "Total_Cost")]
    pub total_cost: f64,
}

/// Persistence contract the engine depends on.
///
/// Rows are immutable once appended; the only mutations are single-row
/// deletion by position in `read_all` order and a full overwrite. The store
/// is owned by a single process, so no cross-process coordination exists.
pub trait LedgerStore {
    /// Durably append one record; on failure the caller's in-memory bill
    /// stays valid and the append can be retried.
    fn append(&self, record: &LedgerRecord) -> EngineResult<()>;

    /// All records in append order.
    fn read_all(&self) -> EngineResult<Vec<LedgerRecord>>;

    /// Records whose date equals `date` (`YYYY-MM-DD`), in append order.
    fn read_on(&self, date: &str) -> EngineResult<Vec<LedgerRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|record| record.date == date)
            .collect())
    }

    /// Delete the record at `index` within `read_all` order.
    fn delete_at(&self, index: usize) -> EngineResult<()>;

    /// Replace the whole ledger with `records`.
    fn overwrite_all(&self, records: &[LedgerRecord]) -> EngineResult<()>;
}

/// [`LedgerStore`] over a single CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    /// Create a store for the given file; nothing is created until the
    /// first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a copy of the full ledger to `dest` (the export feature).
    pub fn export_to(&self, dest: impl AsRef<Path>) -> EngineResult<()> {
        let records = self.read_all()?;
        write_records(dest.as_ref(), &records)?;
        info!("exported {} ledger rows to {}", records.len(), dest.as_ref().display());
        Ok(())
    }

    fn persistence(&self, action: &str, err: impl std::fmt::Display) -> EngineError {
        EngineError::Persistence(format!("{action} {}: {err}", self.path.display()))
    }
}

impl LedgerStore for CsvLedger {
    fn append(&self, record: &LedgerRecord) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|err| self.persistence("create directory for", err))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| self.persistence("open", err))?;
        let is_new = file
            .metadata()
            .map_err(|err| self.persistence("stat", err))?
            .len()
            == 0;

        let mut writer = WriterBuilder::new().has_headers(is_new).from_writer(file);
        writer
            .serialize(record)
            .map_err(|err| self.persistence("write", err))?;
        writer
            .flush()
            .map_err(|err| self.persistence("flush", err))?;
        let file = writer
            .into_inner()
            .map_err(|err| self.persistence("flush", err))?;
        file.sync_all()
            .map_err(|err| self.persistence("sync", err))?;
        Ok(())
    }

    fn read_all(&self) -> EngineResult<Vec<LedgerRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = ReaderBuilder::new()
            .from_path(&self.path)
            .map_err(|err| self.persistence("open", err))?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row.map_err(|err| self.persistence("read", err))?);
        }
        Ok(records)
    }

    fn delete_at(&self, index: usize) -> EngineResult<()> {
        let mut records = self.read_all()?;
        if index >= records.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                len: records.len(),
            });
        }
        records.remove(index);
        self.overwrite_all(&records)
    }

    fn overwrite_all(&self, records: &[LedgerRecord]) -> EngineResult<()> {
        write_records(&self.path, records)
    }
}

fn write_records(path: &Path, records: &[LedgerRecord]) -> EngineResult<()> {
    let persistence = |action: &str, err: &dyn std::fmt::Display| {
        EngineError::Persistence(format!("{action} {}: {err}", path.display()))
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| persistence("create directory for", &err))?;
        }
    }
    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|err| persistence("open", &err))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|err| persistence("write", &err))?;
    }
    writer.flush().map_err(|err| persistence("flush", &err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(date: &str, station: &str, total: f64) -> LedgerRecord {
        LedgerRecord {
            date: date.to_string(),
            time: "12:00:00".to_string(),
            station: station.to_string(),
            customer: ANONYMOUS_CUSTOMER.to_string(),
            duration: "01:30".to_string(),
            station_cost: total - 2500.0,
            services: "coffee($2,500)".to_string(),
            services_cost: 2500.0,
            total_cost: total,
        }
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let ledger = CsvLedger::new(dir.path().join("ledger.csv"));
        assert!(ledger.read_all().unwrap().is_empty());
    }

    #[test]
    fn append_then_read_round_trips() -> EngineResult<()> {
        let dir = tempdir().unwrap();
        let ledger = CsvLedger::new(dir.path().join("ledger.csv"));

        ledger.append(&record("2026-08-30", "PS1", 11500.0))?;
        ledger.append(&record("2026-08-30", "PS2", 8200.0))?;

        let rows = ledger.read_all()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].station, "PS1");
        assert_eq!(rows[1].total_cost, 8200.0);
        assert_eq!(
            rows[0].total_cost,
            rows[0].station_cost + rows[0].services_cost
        );
        Ok(())
    }

    #[test]
    fn header_is_written_exactly_once() -> EngineResult<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        let ledger = CsvLedger::new(&path);
        ledger.append(&record("2026-08-30", "PS1", 11500.0))?;
        ledger.append(&record("2026-08-30", "PS2", 8200.0))?;

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw.matches("Total_Cost").count(), 1);
        assert!(raw.starts_with("Date,Time,PlayStation,Customer,Duration_Hours,"));
        Ok(())
    }

    #[test]
    fn read_on_filters_by_exact_date() -> EngineResult<()> {
        let dir = tempdir().unwrap();
        let ledger = CsvLedger::new(dir.path().join("ledger.csv"));
        ledger.append(&record("2026-08-29", "PS1", 6000.0))?;
        ledger.append(&record("2026-08-30", "PS2", 7000.0))?;
        ledger.append(&record("2026-08-30", "PS3", 8000.0))?;

        let rows = ledger.read_on("2026-08-30")?;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.date == "2026-08-30"));
        assert!(ledger.read_on("2020-01-01")?.is_empty());
        Ok(())
    }

    #[test]
    fn delete_at_removes_that_row_only() -> EngineResult<()> {
        let dir = tempdir().unwrap();
        let ledger = CsvLedger::new(dir.path().join("ledger.csv"));
        ledger.append(&record("2026-08-30", "PS1", 6000.0))?;
        ledger.append(&record("2026-08-30", "PS2", 7000.0))?;
        ledger.append(&record("2026-08-30", "PS3", 8000.0))?;

        ledger.delete_at(1)?;
        let rows = ledger.read_all()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].station, "PS1");
        assert_eq!(rows[1].station, "PS3");
        Ok(())
    }

    #[test]
    fn delete_at_out_of_range_leaves_file_untouched() -> EngineResult<()> {
        let dir = tempdir().unwrap();
        let ledger = CsvLedger::new(dir.path().join("ledger.csv"));
        ledger.append(&record("2026-08-30", "PS1", 6000.0))?;

        let err = ledger.delete_at(5).unwrap_err();
        assert!(matches!(
            err,
            EngineError::IndexOutOfRange { index: 5, len: 1 }
        ));
        assert_eq!(ledger.read_all()?.len(), 1);
        Ok(())
    }

    #[test]
    fn finalized_bill_round_trips_through_the_ledger() -> EngineResult<()> {
        use crate::{config::PriceConfig, session::{SessionRegistry, StationId}};
        use chrono::{Duration, Utc};

        let dir = tempdir().unwrap();
        let ledger = CsvLedger::new(dir.path().join("ledger.csv"));

        let mut registry = SessionRegistry::detached();
        let config = PriceConfig::default();
        let t0 = Utc::now();
        registry.start_at(StationId::Ps1, t0).unwrap();
        registry
            .add_charge_at(StationId::Ps1, "coffee", &config, t0)
            .unwrap();
        let bill = registry
            .end_at(StationId::Ps1, &config, t0 + Duration::minutes(125))
            .unwrap();
        let record = registry
            .finalize_at(StationId::Ps1, &bill, true, t0 + Duration::minutes(125))
            .unwrap();

        ledger.append(&record)?;
        let rows = ledger.read_all()?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], record);
        assert!(
            (rows[0].total_cost - (rows[0].station_cost + rows[0].services_cost)).abs() < 0.005
        );
        Ok(())
    }

    #[test]
    fn export_copies_every_row() -> EngineResult<()> {
        let dir = tempdir().unwrap();
        let ledger = CsvLedger::new(dir.path().join("ledger.csv"));
        ledger.append(&record("2026-08-30", "PS1", 6000.0))?;
        ledger.append(&record("2026-08-30", "PS4", 9000.0))?;

        let dest = dir.path().join("export.csv");
        ledger.export_to(&dest)?;
        let copy = CsvLedger::new(&dest);
        assert_eq!(copy.read_all()?, ledger.read_all()?);
        Ok(())
    }
}
