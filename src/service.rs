// Query/Update facade over the three tables
//
// Every read and write from a presentation layer (CLI, dashboard, HTTP) goes
// through `ParkingLot`, so validation happens at this one boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ParkingError, Result};
use crate::layout::{LayoutSnapshot, SlotDrift, SlotRecord, SlotStatus};
use crate::ledger::{VehicleLedger, VehicleRecord};
use crate::rates::RateTable;
use crate::rent::{self, RentQuote};
use crate::timestamp::parse_timestamp;

/// Entry form as submitted by a presentation layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEntry {
    pub token: String,
    pub license: String,
    pub vehicle_type: String,
    /// `YYYY-MM-DD HH:MM`
    pub entry_time: String,
    pub slot: String,
}

impl NewEntry {
    /// Trim every field the way the table loader does
    pub fn trimmed(self) -> Self {
        Self {
            token: self.token.trim().to_string(),
            license: self.license.trim().to_string(),
            vehicle_type: self.vehicle_type.trim().to_string(),
            entry_time: self.entry_time.trim().to_string(),
            slot: self.slot.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExitReceipt {
    pub record: VehicleRecord,
    pub quote: RentQuote,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExitOutcome {
    /// No record holds the token
    NoVehicle { token: String },
    /// The token only appears on records that already exited
    AlreadyExited { record: VehicleRecord },
    Charged(ExitReceipt),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Analytics {
    /// Every record ever added, exited or not
    pub total_vehicles: usize,
    pub parked_vehicles: usize,
    pub occupied_slots: usize,
    pub vacant_slots: usize,
}

pub struct ParkingLot {
    rates: RateTable,
    ledger: VehicleLedger,
    layout: LayoutSnapshot,
}

impl ParkingLot {
    pub fn new(rates: RateTable, ledger: VehicleLedger, layout: LayoutSnapshot) -> Self {
        Self {
            rates,
            ledger,
            layout,
        }
    }

    /// Load all three tables from the configured locations
    pub fn open(config: &Config) -> Result<Self> {
        let rates = RateTable::load(&config.rates_path())?;
        let ledger = VehicleLedger::open(&config.vehicles_path())?;
        let layout = LayoutSnapshot::load(&config.layout_path())?;

        log::info!(
            "Opened lot: {} rates, {} vehicle records, {} slots",
            rates.len(),
            ledger.len(),
            layout.len()
        );

        let lot = Self::new(rates, ledger, layout);
        for record in lot.unrated_vehicles() {
            log::warn!(
                "Vehicle {} is parked with type '{}', which has no rate; its exit will fail",
                record.token,
                record.vehicle_type
            );
        }
        Ok(lot)
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn ledger(&self) -> &VehicleLedger {
        &self.ledger
    }

    pub fn layout(&self) -> &LayoutSnapshot {
        &self.layout
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Exact match on token or license; empty when nothing matches
    pub fn search(&self, token_or_license: &str) -> Vec<VehicleRecord> {
        self.ledger.find_by_token_or_license(token_or_license)
    }

    pub fn find_by_token(&self, token: &str) -> Vec<VehicleRecord> {
        self.ledger.find_by_token(token).into_iter().cloned().collect()
    }

    pub fn vehicle_types(&self) -> Vec<&str> {
        self.rates.vehicle_types()
    }

    pub fn layout_rows(&self) -> &[SlotRecord] {
        self.layout.slots()
    }

    pub fn status_counts(&self) -> BTreeMap<SlotStatus, usize> {
        self.layout.status_counts()
    }

    pub fn layout_drift(&self) -> Vec<SlotDrift> {
        self.layout.drift(&self.ledger)
    }

    /// Parked vehicles whose type is missing from the rate table
    pub fn unrated_vehicles(&self) -> Vec<&VehicleRecord> {
        self.ledger
            .parked()
            .filter(|r| !self.rates.contains(&r.vehicle_type))
            .collect()
    }

    pub fn analytics(&self) -> Analytics {
        Analytics {
            total_vehicles: self.ledger.len(),
            parked_vehicles: self.ledger.parked().count(),
            occupied_slots: self.layout.count_by_status(SlotStatus::Occupied),
            vacant_slots: self.layout.count_by_status(SlotStatus::Vacant),
        }
    }

    // ========================================================================
    // UPDATES
    // ========================================================================

    /// Register a vehicle entering the lot
    ///
    /// Validates everything before touching the ledger; nothing is written on failure.
    pub fn record_entry(&mut self, entry: NewEntry) -> Result<VehicleRecord> {
        // stored values must read back identically after a reload
        let entry = entry.trimmed();
        let result = self.try_record_entry(&entry);
        if let Err(ref e) = result {
            log::warn!("Entry for token '{}' rejected: {}", entry.token, e);
        }
        result
    }

    fn try_record_entry(&mut self, entry: &NewEntry) -> Result<VehicleRecord> {
        require("Token", &entry.token)?;
        require("License", &entry.license)?;
        require("Slot", &entry.slot)?;

        if !self.rates.contains(&entry.vehicle_type) {
            return Err(ParkingError::RateNotFound(entry.vehicle_type.clone()));
        }
        let entry_time = parse_timestamp(&entry.entry_time)?;

        let record = VehicleRecord::new(
            &entry.token,
            &entry.license,
            &entry.vehicle_type,
            entry_time,
            &entry.slot,
        );
        self.ledger.append(record.clone())?;
        Ok(record)
    }

    /// Check a vehicle out and charge it
    ///
    /// An unknown token is a normal outcome (`NoVehicle`), not an error.
    /// The exit time is only parsed once a parked vehicle is found.
    pub fn record_exit(&mut self, token: &str, exit_time: &str) -> Result<ExitOutcome> {
        let token = token.trim();

        let parked = match self.ledger.parked_by_token(token)? {
            Some(record) => record.clone(),
            None => {
                let history = self.ledger.find_by_token(token);
                return Ok(match history.last() {
                    Some(record) => ExitOutcome::AlreadyExited {
                        record: (*record).clone(),
                    },
                    None => ExitOutcome::NoVehicle {
                        token: token.to_string(),
                    },
                });
            }
        };

        let exit = parse_timestamp(exit_time.trim())?;

        // rent first: an unknown type must not leave an exit stamped
        let quote = rent::quote(&self.rates, &parked.vehicle_type, parked.entry_time, exit)?;

        match self.ledger.set_exit_time(token, exit)? {
            Some(record) => Ok(ExitOutcome::Charged(ExitReceipt { record, quote })),
            None => Ok(ExitOutcome::NoVehicle {
                token: token.to_string(),
            }),
        }
    }
}

fn require(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ParkingError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::RateEntry;
    use rust_decimal::Decimal;
    use tempfile::{tempdir, TempDir};

    fn test_lot() -> (TempDir, ParkingLot) {
        let dir = tempdir().unwrap();
        let rates = RateTable::new(vec![
            RateEntry::new("Car", Decimal::from(50)),
            RateEntry::new("Bike", Decimal::from(20)),
        ])
        .unwrap();
        let ledger = VehicleLedger::open(&dir.path().join("vehicles.csv")).unwrap();
        let layout = LayoutSnapshot::new(vec![
            SlotRecord::new("A1", SlotStatus::Occupied),
            SlotRecord::new("A2", SlotStatus::Vacant),
        ]);
        (dir, ParkingLot::new(rates, ledger, layout))
    }

    fn entry(token: &str, vehicle_type: &str, entry_time: &str) -> NewEntry {
        NewEntry {
            token: token.to_string(),
            license: format!("LIC-{}", token),
            vehicle_type: vehicle_type.to_string(),
            entry_time: entry_time.to_string(),
            slot: "A1".to_string(),
        }
    }

    #[test]
    fn test_missing_fields_rejected_before_write() {
        let (_dir, mut lot) = test_lot();

        let mut blank = entry("1", "Car", "2024-01-01 10:00");
        blank.license = "  ".to_string();

        let err = lot.record_entry(blank).unwrap_err();
        assert!(matches!(err, ParkingError::MissingField("License")));
        assert!(lot.ledger().is_empty());
    }

    #[test]
    fn test_bad_entry_time_rejected_before_write() {
        let (_dir, mut lot) = test_lot();

        let err = lot.record_entry(entry("1", "Car", "10am")).unwrap_err();
        assert!(matches!(err, ParkingError::InvalidTimestamp { .. }));
        assert!(!lot.ledger().path().exists());
    }

    #[test]
    fn test_exit_with_bad_time_writes_nothing() {
        let (_dir, mut lot) = test_lot();
        lot.record_entry(entry("1", "Car", "2024-01-01 10:00")).unwrap();

        let err = lot.record_exit("1", "2024/01/01 12:00").unwrap_err();
        assert!(matches!(err, ParkingError::InvalidTimestamp { .. }));
        assert!(lot.search("1")[0].is_parked());
    }

    #[test]
    fn test_padded_token_collides_with_parked_token() {
        let (_dir, mut lot) = test_lot();
        lot.record_entry(entry("7", "Car", "2024-01-01 10:00")).unwrap();

        let mut padded = entry("7 ", "Car", " 2024-01-01 11:00 ");
        padded.slot = " A2".to_string();
        let err = lot.record_entry(padded).unwrap_err();
        assert!(matches!(err, ParkingError::DuplicateActiveToken(ref t) if t == "7"));

        let reloaded = VehicleLedger::open(lot.ledger().path()).unwrap();
        assert_eq!(reloaded.find_by_token("7").len(), 1);
    }

    #[test]
    fn test_entry_fields_stored_trimmed() {
        let (_dir, mut lot) = test_lot();

        let mut padded = entry(" 8 ", " Bike ", "2024-01-01 10:00 ");
        padded.license = "\tKA01AB1234 ".to_string();
        let record = lot.record_entry(padded).unwrap();

        assert_eq!(record.token, "8");
        assert_eq!(record.license, "KA01AB1234");
        assert_eq!(record.vehicle_type, "Bike");

        let reloaded = VehicleLedger::open(lot.ledger().path()).unwrap();
        assert_eq!(reloaded.records(), lot.ledger().records());
    }

    #[test]
    fn test_unknown_token_with_bad_time_is_no_vehicle() {
        let (_dir, mut lot) = test_lot();

        let outcome = lot.record_exit("404", "whenever").unwrap();
        assert_eq!(
            outcome,
            ExitOutcome::NoVehicle {
                token: "404".to_string()
            }
        );
    }

    #[test]
    fn test_failed_exit_write_keeps_vehicle_parked() {
        let (_dir, mut lot) = test_lot();
        lot.record_entry(entry("1", "Car", "2024-01-01 10:00")).unwrap();

        let path = lot.ledger().path().to_path_buf();
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        let err = lot.record_exit("1", "2024-01-01 12:00").unwrap_err();
        assert!(matches!(err, ParkingError::Persistence { .. }));
        assert!(lot.search("1")[0].is_parked());
        assert_eq!(lot.analytics().parked_vehicles, 1);
    }

    #[test]
    fn test_unrated_vehicles_listed() {
        let (dir, _) = test_lot();
        let path = dir.path().join("vehicles.csv");
        std::fs::write(
            &path,
            "Token,License,Type,EntryTime,ExitTime,Slot\n\
             1,AAA,Car,2024-01-01 10:00,,A1\n\
             2,BBB,Bus,2024-01-01 10:00,,A2\n\
             3,CCC,Bus,2024-01-01 09:00,2024-01-01 10:00,A2\n",
        )
        .unwrap();

        let rates = RateTable::new(vec![RateEntry::new("Car", Decimal::from(50))]).unwrap();
        let lot = ParkingLot::new(rates, VehicleLedger::open(&path).unwrap(), LayoutSnapshot::default());

        let unrated = lot.unrated_vehicles();
        assert_eq!(unrated.len(), 1);
        assert_eq!(unrated[0].token, "2");
    }

    #[test]
    fn test_second_exit_reports_already_exited() {
        let (_dir, mut lot) = test_lot();
        lot.record_entry(entry("1", "Bike", "2024-01-01 10:00")).unwrap();

        let first = lot.record_exit("1", "2024-01-01 12:00").unwrap();
        match first {
            ExitOutcome::Charged(receipt) => {
                assert_eq!(receipt.quote.billable_hours, 2);
                assert_eq!(receipt.quote.amount, Decimal::from(40));
            }
            other => panic!("expected charge, got {:?}", other),
        }

        let second = lot.record_exit("1", "2024-01-01 13:00").unwrap();
        assert!(matches!(second, ExitOutcome::AlreadyExited { .. }));
        // first exit time untouched
        assert_eq!(
            lot.search("1")[0].exit_time,
            Some(parse_timestamp("2024-01-01 12:00").unwrap())
        );
    }

    #[test]
    fn test_vehicle_types_follow_rate_table() {
        let (_dir, lot) = test_lot();
        assert_eq!(lot.vehicle_types(), vec!["Car", "Bike"]);
        assert_eq!(lot.layout_rows().len(), 2);
    }

    #[test]
    fn test_analytics_reads_snapshot_not_ledger() {
        let (_dir, mut lot) = test_lot();
        lot.record_entry(entry("1", "Car", "2024-01-01 10:00")).unwrap();
        let mut second = entry("2", "Car", "2024-01-01 10:00");
        second.slot = "A2".to_string();
        lot.record_entry(second).unwrap();

        let analytics = lot.analytics();
        assert_eq!(analytics.total_vehicles, 2);
        assert_eq!(analytics.parked_vehicles, 2);
        // snapshot still says A2 is vacant
        assert_eq!(analytics.occupied_slots, 1);
        assert_eq!(analytics.vacant_slots, 1);
        assert_eq!(lot.layout_drift().len(), 1);
    }
}
