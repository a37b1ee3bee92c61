// Parkwatch - Parking Lot Occupancy Core Library
// Exposes all modules for use in CLI, dashboard, API server, and tests

pub mod config;
pub mod error;
pub mod layout;
pub mod ledger;
pub mod rates;
pub mod rent;
pub mod service;
pub mod timestamp;

// Re-export commonly used types
pub use config::Config;
pub use error::{ConfigError, ParkingError, Result};
pub use layout::{LayoutSnapshot, SlotDrift, SlotRecord, SlotStatus};
pub use ledger::{VehicleLedger, VehicleRecord, VEHICLE_COLUMNS};
pub use rates::{RateEntry, RateTable};
pub use rent::{billable_hours, calculate_rent, RentQuote};
pub use service::{Analytics, ExitOutcome, ExitReceipt, NewEntry, ParkingLot};
pub use timestamp::{format_timestamp, now_string, now_timestamp, parse_timestamp, TIMESTAMP_FORMAT};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
