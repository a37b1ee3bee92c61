// End-to-end checks against real CSV tables in a scratch data directory

use std::fs;
use std::path::Path;

use parkwatch::{calculate_rent, Config, ExitOutcome, NewEntry, ParkingError, ParkingLot};
use rust_decimal::Decimal;
use tempfile::{tempdir, TempDir};

fn write_tables(dir: &Path) {
    fs::write(
        dir.join("rent_rates.csv"),
        "Type,RatePerHour\nCar,50\nBike,20\nTruck,100\n",
    )
    .unwrap();
    fs::write(
        dir.join("parking_layout.csv"),
        "SlotId,Status\nA1,Occupied\nA2,Vacant\nA3,Vacant\n",
    )
    .unwrap();
    fs::write(
        dir.join("vehicles.csv"),
        "Token,License,Type,EntryTime,ExitTime,Slot\n\
         100,KA01AB1234,Car,2024-01-01 08:00,2024-01-01 10:30,A1\n",
    )
    .unwrap();
}

fn open_lot() -> (TempDir, Config, ParkingLot) {
    let dir = tempdir().unwrap();
    write_tables(dir.path());
    let config = Config::default().with_data_dir(dir.path().to_path_buf());
    let lot = ParkingLot::open(&config).unwrap();
    (dir, config, lot)
}

fn entry(token: &str, license: &str, vehicle_type: &str, at: &str) -> NewEntry {
    NewEntry {
        token: token.to_string(),
        license: license.to_string(),
        vehicle_type: vehicle_type.to_string(),
        entry_time: at.to_string(),
        slot: "A2".to_string(),
    }
}

#[test]
fn test_day_and_an_hour_bills_one_hour() {
    let (_dir, _config, lot) = open_lot();

    let rent = calculate_rent(lot.rates(), "Bike", "2024-01-01 10:00", "2024-01-02 11:00").unwrap();
    assert_eq!(rent, Decimal::from(20));

    let rent = calculate_rent(lot.rates(), "Car", "2024-01-01 10:00", "2024-01-02 11:00").unwrap();
    assert_eq!(rent, Decimal::from(50));
}

#[test]
fn test_entry_is_searchable_by_token_and_license() {
    let (_dir, _config, mut lot) = open_lot();
    lot.record_entry(entry("201", "MH12XY0001", "Car", "2024-02-01 09:00"))
        .unwrap();

    let by_token = lot.search("201");
    assert_eq!(by_token.len(), 1);
    assert!(by_token[0].exit_time.is_none());
    assert_eq!(by_token[0].slot, "A2");

    let by_license = lot.search("MH12XY0001");
    assert_eq!(by_license, by_token);

    assert!(lot.search("mh12xy0001").is_empty());
}

#[test]
fn test_exit_for_unknown_token_changes_nothing() {
    let (dir, _config, mut lot) = open_lot();
    let before = fs::read_to_string(dir.path().join("vehicles.csv")).unwrap();

    let outcome = lot.record_exit("999", "2024-02-01 12:00").unwrap();
    assert_eq!(
        outcome,
        ExitOutcome::NoVehicle {
            token: "999".to_string()
        }
    );

    let after = fs::read_to_string(dir.path().join("vehicles.csv")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_exit_stamps_record_and_charges() {
    let (_dir, config, mut lot) = open_lot();
    lot.record_entry(entry("202", "DL3CAF0002", "Truck", "2024-02-01 09:00"))
        .unwrap();

    let receipt = match lot.record_exit("202", "2024-02-01 12:30").unwrap() {
        ExitOutcome::Charged(receipt) => receipt,
        other => panic!("expected charge, got {:?}", other),
    };
    assert_eq!(receipt.quote.billable_hours, 3);
    assert_eq!(receipt.quote.amount, Decimal::from(300));
    assert!(receipt.quote.amount >= Decimal::ZERO);
    assert!(receipt.record.exit_time.is_some());

    // persisted
    let reloaded = ParkingLot::open(&config).unwrap();
    let rows = reloaded.search("202");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].exit_time, receipt.record.exit_time);
}

#[test]
fn test_total_vehicles_counts_exited_too() {
    let (_dir, _config, mut lot) = open_lot();
    assert_eq!(lot.analytics().total_vehicles, 1);

    lot.record_entry(entry("203", "TN09ZZ0003", "Car", "2024-02-01 09:00"))
        .unwrap();
    lot.record_exit("203", "2024-02-01 10:00").unwrap();
    lot.record_entry(entry("204", "TN09ZZ0004", "Bike", "2024-02-01 09:30"))
        .unwrap();

    let analytics = lot.analytics();
    assert_eq!(analytics.total_vehicles, 3);
    assert_eq!(analytics.parked_vehicles, 1);
    assert_eq!(analytics.occupied_slots, 1);
    assert_eq!(analytics.vacant_slots, 2);
}

#[test]
fn test_unknown_type_writes_nothing() {
    let (dir, config, mut lot) = open_lot();
    let before = fs::read_to_string(dir.path().join("vehicles.csv")).unwrap();

    let err = lot
        .record_entry(entry("205", "GJ01AA0005", "Bus", "2024-02-01 09:00"))
        .unwrap_err();
    assert!(matches!(err, ParkingError::RateNotFound(ref t) if t == "Bus"));

    let after = fs::read_to_string(dir.path().join("vehicles.csv")).unwrap();
    assert_eq!(before, after);
    assert_eq!(ParkingLot::open(&config).unwrap().ledger().len(), 1);
}

#[test]
fn test_reopen_sees_every_write() {
    let (_dir, config, mut lot) = open_lot();
    lot.record_entry(entry("206", "KL07BB0006", "Car", "2024-02-01 09:00"))
        .unwrap();
    lot.record_entry(entry("207", "KL07BB0007", "Bike", "2024-02-01 09:05"))
        .unwrap();
    lot.record_exit("206", "2024-02-01 11:00").unwrap();

    let reloaded = ParkingLot::open(&config).unwrap();
    assert_eq!(reloaded.ledger().records(), lot.ledger().records());
    assert_eq!(reloaded.ledger().parked().count(), 1);
}

#[test]
fn test_missing_vehicles_table_starts_empty() {
    let dir = tempdir().unwrap();
    write_tables(dir.path());
    fs::remove_file(dir.path().join("vehicles.csv")).unwrap();

    let config = Config::default().with_data_dir(dir.path().to_path_buf());
    let mut lot = ParkingLot::open(&config).unwrap();
    assert!(lot.ledger().is_empty());

    lot.record_entry(entry("208", "AP09CC0008", "Car", "2024-02-01 09:00"))
        .unwrap();
    let written = fs::read_to_string(dir.path().join("vehicles.csv")).unwrap();
    assert!(written.starts_with("Token,License,Type,EntryTime,ExitTime,Slot\n"));
    assert!(written.contains("208,AP09CC0008,Car,2024-02-01 09:00,,A2"));
}

#[test]
fn test_padded_token_rejected_and_reload_stays_consistent() {
    let (_dir, config, mut lot) = open_lot();
    lot.record_entry(entry("7", "KA02AA0007", "Car", "2024-02-01 09:00"))
        .unwrap();

    let err = lot
        .record_entry(entry("7 ", "KA02AA0008", "Car", "2024-02-01 09:30"))
        .unwrap_err();
    assert!(matches!(err, ParkingError::DuplicateActiveToken(ref t) if t == "7"));

    let mut reloaded = ParkingLot::open(&config).unwrap();
    assert_eq!(reloaded.search("7"), lot.search("7"));
    assert_eq!(reloaded.search("7").len(), 1);
    assert!(matches!(
        reloaded.record_exit("7", "2024-02-01 11:00").unwrap(),
        ExitOutcome::Charged(_)
    ));
}
