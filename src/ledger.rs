use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{ParkingError, Result};

/// Column order of the persisted vehicles table
pub const VEHICLE_COLUMNS: [&str; 6] = ["Token", "License", "Type", "EntryTime", "ExitTime", "Slot"];

/// One vehicle visit: created on entry, stamped once on exit, never deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    #[serde(rename = "Token")]
    pub token: String,

    #[serde(rename = "License")]
    pub license: String,

    /// Must reference a rate table entry
    #[serde(rename = "Type")]
    pub vehicle_type: String,

    #[serde(rename = "EntryTime", with = "crate::timestamp::minutes")]
    pub entry_time: NaiveDateTime,

    /// None while the vehicle is still parked
    #[serde(rename = "ExitTime", with = "crate::timestamp::minutes_opt", default)]
    pub exit_time: Option<NaiveDateTime>,

    #[serde(rename = "Slot")]
    pub slot: String,
}

impl VehicleRecord {
    pub fn new(
        token: &str,
        license: &str,
        vehicle_type: &str,
        entry_time: NaiveDateTime,
        slot: &str,
    ) -> Self {
        Self {
            token: token.to_string(),
            license: license.to_string(),
            vehicle_type: vehicle_type.to_string(),
            entry_time,
            exit_time: None,
            slot: slot.to_string(),
        }
    }

    pub fn is_parked(&self) -> bool {
        self.exit_time.is_none()
    }

    /// Exact, case-sensitive match on token or license
    pub fn matches(&self, query: &str) -> bool {
        self.token == query || self.license == query
    }
}

// ============================================================================
// VEHICLE LEDGER
// ============================================================================

/// Repository for the vehicles table
///
/// The whole table lives in memory. Every mutation is applied in memory,
/// persisted with a full rewrite, and rolled back if the write fails, so the
/// in-memory table never runs ahead of what is on disk.
#[derive(Debug)]
pub struct VehicleLedger {
    path: PathBuf,
    records: Vec<VehicleRecord>,
}

impl VehicleLedger {
    /// Load the ledger; a missing file is an empty ledger
    pub fn open(path: &Path) -> Result<Self> {
        let records = if path.exists() {
            load_records(path)?
        } else {
            log::debug!("No vehicles table at {}, starting empty", path.display());
            Vec::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[VehicleRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn parked(&self) -> impl Iterator<Item = &VehicleRecord> {
        self.records.iter().filter(|r| r.is_parked())
    }

    /// Empty result is a normal outcome, not an error
    pub fn find_by_token_or_license(&self, query: &str) -> Vec<VehicleRecord> {
        self.records
            .iter()
            .filter(|r| r.matches(query))
            .cloned()
            .collect()
    }

    pub fn find_by_token(&self, token: &str) -> Vec<&VehicleRecord> {
        self.records.iter().filter(|r| r.token == token).collect()
    }

    /// The parked record holding `token`, if any
    ///
    /// Fails with `AmbiguousToken` when the table holds several parked rows
    /// for the same token.
    pub fn parked_by_token(&self, token: &str) -> Result<Option<&VehicleRecord>> {
        let mut matches = self.parked().filter(|r| r.token == token);
        let first = matches.next();
        let extra = matches.count();

        if extra > 0 {
            return Err(ParkingError::AmbiguousToken {
                token: token.to_string(),
                count: extra + 1,
            });
        }
        Ok(first)
    }

    /// Add a new parked vehicle and persist
    pub fn append(&mut self, mut record: VehicleRecord) -> Result<()> {
        if self.parked_by_token(&record.token)?.is_some() {
            return Err(ParkingError::DuplicateActiveToken(record.token));
        }
        record.exit_time = None;

        self.records.push(record);
        if let Err(e) = self.persist() {
            self.records.pop();
            return Err(e);
        }

        if let Some(added) = self.records.last() {
            log::info!(
                "Vehicle {} ({}) entered slot {}",
                added.token,
                added.license,
                added.slot
            );
        }
        Ok(())
    }

    /// Stamp the exit time on the parked record holding `token` and persist
    ///
    /// Returns the updated record, or None if no parked record holds the token.
    pub fn set_exit_time(
        &mut self,
        token: &str,
        exit_time: NaiveDateTime,
    ) -> Result<Option<VehicleRecord>> {
        // validates uniqueness among parked rows
        if self.parked_by_token(token)?.is_none() {
            return Ok(None);
        }

        let idx = match self
            .records
            .iter()
            .position(|r| r.is_parked() && r.token == token)
        {
            Some(idx) => idx,
            None => return Ok(None),
        };

        self.records[idx].exit_time = Some(exit_time);
        if let Err(e) = self.persist() {
            self.records[idx].exit_time = None;
            return Err(e);
        }

        let updated = self.records[idx].clone();
        log::info!("Vehicle {} left slot {}", updated.token, updated.slot);
        Ok(Some(updated))
    }

    /// Rewrite the whole table: write a sibling temp file, then rename over the original
    pub fn persist(&self) -> Result<()> {
        write_records(&self.path, &self.records).map_err(|source| ParkingError::Persistence {
            path: self.path.clone(),
            source,
        })?;
        log::debug!(
            "Persisted {} vehicle records to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn load_records(path: &Path) -> Result<Vec<VehicleRecord>> {
    let load_err = |source| ParkingError::Load {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(load_err)?;

    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize().enumerate() {
        let record: VehicleRecord = result.map_err(load_err)?;
        // header is line 1
        check_required(&record, idx + 2)?;
        records.push(record);
    }

    log::debug!("Loaded {} vehicle records from {}", records.len(), path.display());
    Ok(records)
}

fn check_required(record: &VehicleRecord, row: usize) -> Result<()> {
    let fields = [
        ("Token", &record.token),
        ("License", &record.license),
        ("Type", &record.vehicle_type),
        ("Slot", &record.slot),
    ];

    match fields.iter().find(|(_, value)| value.is_empty()) {
        Some((name, _)) => Err(ParkingError::InvalidRow {
            table: "vehicles",
            row,
            reason: format!("{} is empty", name),
        }),
        None => Ok(()),
    }
}

/// Temp file the table is staged in before the rename
fn staging_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn write_records(path: &Path, records: &[VehicleRecord]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = staging_path(path);
    let result = write_table(&tmp, records).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() && tmp.is_file() {
        if let Err(e) = fs::remove_file(&tmp) {
            log::warn!("Could not remove {}: {}", tmp.display(), e);
        }
    }
    result
}

fn write_table(tmp: &Path, records: &[VehicleRecord]) -> io::Result<()> {
    // header written by hand so an empty ledger still has one
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(tmp)?;
    wtr.write_record(VEHICLE_COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::parse_timestamp;
    use tempfile::tempdir;

    fn create_test_record(token: &str, license: &str, slot: &str) -> VehicleRecord {
        VehicleRecord::new(
            token,
            license,
            "Car",
            parse_timestamp("2024-01-01 10:00").unwrap(),
            slot,
        )
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let ledger = VehicleLedger::open(&dir.path().join("vehicles.csv")).unwrap();

        assert!(ledger.is_empty());
        assert!(ledger.find_by_token_or_license("T1").is_empty());
    }

    #[test]
    fn test_append_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");

        let mut ledger = VehicleLedger::open(&path).unwrap();
        ledger.append(create_test_record("101", "KA01AB1234", "A1")).unwrap();
        ledger.append(create_test_record("102", "KA01CD5678", "A2")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Token,License,Type,EntryTime,ExitTime,Slot"));
        assert!(content.contains("101,KA01AB1234,Car,2024-01-01 10:00,,A1"));

        let reloaded = VehicleLedger::open(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.records(), ledger.records());
        assert!(reloaded.records().iter().all(|r| r.is_parked()));
    }

    #[test]
    fn test_search_matches_token_or_license_exactly() {
        let dir = tempdir().unwrap();
        let mut ledger = VehicleLedger::open(&dir.path().join("vehicles.csv")).unwrap();
        ledger.append(create_test_record("7", "MH12XY0001", "B1")).unwrap();

        assert_eq!(ledger.find_by_token_or_license("7").len(), 1);
        assert_eq!(ledger.find_by_token_or_license("MH12XY0001").len(), 1);
        assert!(ledger.find_by_token_or_license("mh12xy0001").is_empty());
        assert!(ledger.find_by_token_or_license("07").is_empty());
    }

    #[test]
    fn test_duplicate_parked_token_rejected() {
        let dir = tempdir().unwrap();
        let mut ledger = VehicleLedger::open(&dir.path().join("vehicles.csv")).unwrap();
        ledger.append(create_test_record("1", "AAA", "A1")).unwrap();

        let err = ledger.append(create_test_record("1", "BBB", "A2")).unwrap_err();
        assert!(matches!(err, ParkingError::DuplicateActiveToken(ref t) if t == "1"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_token_reusable_after_exit() {
        let dir = tempdir().unwrap();
        let mut ledger = VehicleLedger::open(&dir.path().join("vehicles.csv")).unwrap();
        ledger.append(create_test_record("1", "AAA", "A1")).unwrap();
        ledger
            .set_exit_time("1", parse_timestamp("2024-01-01 12:00").unwrap())
            .unwrap();

        ledger.append(create_test_record("1", "BBB", "A1")).unwrap();
        assert_eq!(ledger.find_by_token("1").len(), 2);
        assert_eq!(ledger.parked().count(), 1);
    }

    #[test]
    fn test_set_exit_time_updates_only_parked_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        let mut ledger = VehicleLedger::open(&path).unwrap();
        ledger.append(create_test_record("1", "AAA", "A1")).unwrap();

        let exit = parse_timestamp("2024-01-01 13:30").unwrap();
        let updated = ledger.set_exit_time("1", exit).unwrap().unwrap();
        assert_eq!(updated.exit_time, Some(exit));

        // already exited: nothing left to stamp
        assert!(ledger.set_exit_time("1", exit).unwrap().is_none());
        assert!(ledger.set_exit_time("missing", exit).unwrap().is_none());

        let reloaded = VehicleLedger::open(&path).unwrap();
        assert_eq!(reloaded.records()[0].exit_time, Some(exit));
    }

    #[test]
    fn test_ambiguous_parked_token_is_integrity_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        fs::write(
            &path,
            "Token,License,Type,EntryTime,ExitTime,Slot\n\
             5,AAA,Car,2024-01-01 10:00,,A1\n\
             5,BBB,Car,2024-01-01 11:00,,A2\n",
        )
        .unwrap();

        let mut ledger = VehicleLedger::open(&path).unwrap();
        let err = ledger
            .set_exit_time("5", parse_timestamp("2024-01-01 12:00").unwrap())
            .unwrap_err();

        assert!(matches!(err, ParkingError::AmbiguousToken { count: 2, .. }));
        assert!(ledger.records().iter().all(|r| r.is_parked()));
    }

    #[test]
    fn test_failed_persist_rolls_back_append() {
        let dir = tempdir().unwrap();
        // parent "directory" is a regular file, so every write fails
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let mut ledger = VehicleLedger::open(&blocker.join("vehicles.csv")).unwrap();
        let err = ledger.append(create_test_record("1", "AAA", "A1")).unwrap_err();

        assert!(matches!(err, ParkingError::Persistence { .. }));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_failed_persist_rolls_back_exit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        let mut ledger = VehicleLedger::open(&path).unwrap();
        ledger.append(create_test_record("1", "AAA", "A1")).unwrap();

        // a directory in place of the table makes the final rename fail
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let err = ledger
            .set_exit_time("1", parse_timestamp("2024-01-01 12:00").unwrap())
            .unwrap_err();

        assert!(matches!(err, ParkingError::Persistence { .. }));
        assert!(ledger.records()[0].is_parked());
        assert!(ledger.parked_by_token("1").unwrap().is_some());
    }

    #[test]
    fn test_failed_rename_removes_staging_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        let mut ledger = VehicleLedger::open(&path).unwrap();
        fs::create_dir(&path).unwrap();

        let err = ledger.append(create_test_record("1", "AAA", "A1")).unwrap_err();

        assert!(matches!(err, ParkingError::Persistence { .. }));
        assert!(ledger.is_empty());
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_blank_token_fails_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        fs::write(
            &path,
            "Token,License,Type,EntryTime,ExitTime,Slot\n\
             1,AAA,Car,2024-01-01 10:00,,A1\n\
             ,BBB,Car,2024-01-01 11:00,,A2\n",
        )
        .unwrap();

        let err = VehicleLedger::open(&path).unwrap_err();
        assert!(matches!(
            err,
            ParkingError::InvalidRow { row: 3, ref reason, .. } if reason == "Token is empty"
        ));
    }

    #[test]
    fn test_malformed_entry_time_fails_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vehicles.csv");
        fs::write(
            &path,
            "Token,License,Type,EntryTime,ExitTime,Slot\n1,AAA,Car,yesterday,,A1\n",
        )
        .unwrap();

        let err = VehicleLedger::open(&path).unwrap_err();
        assert!(matches!(err, ParkingError::Load { .. }));
    }
}
