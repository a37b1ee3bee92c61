// Rate Table - hourly rent per vehicle type
//
// Loaded once at startup from `rent_rates.csv` (columns: Type, RatePerHour).
// Never mutated afterwards.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ParkingError, Result};

const TABLE: &str = "rate table";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    #[serde(rename = "Type")]
    pub vehicle_type: String,

    #[serde(rename = "RatePerHour", with = "rust_decimal::serde::str")]
    pub rate_per_hour: Decimal,
}

impl RateEntry {
    pub fn new(vehicle_type: &str, rate_per_hour: Decimal) -> Self {
        Self {
            vehicle_type: vehicle_type.to_string(),
            rate_per_hour,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RateTable {
    entries: Vec<RateEntry>,
}

impl RateTable {
    /// Build a table, rejecting empty types, non-positive rates and duplicate types
    pub fn new(entries: Vec<RateEntry>) -> Result<Self> {
        let mut seen = HashSet::new();

        for (idx, entry) in entries.iter().enumerate() {
            // header is line 1
            let row = idx + 2;

            if entry.vehicle_type.is_empty() {
                return Err(invalid(row, "vehicle type is empty".to_string()));
            }
            if entry.rate_per_hour <= Decimal::ZERO {
                return Err(invalid(
                    row,
                    format!(
                        "rate for '{}' must be positive, got {}",
                        entry.vehicle_type, entry.rate_per_hour
                    ),
                ));
            }
            if !seen.insert(entry.vehicle_type.as_str()) {
                return Err(invalid(
                    row,
                    format!("duplicate vehicle type '{}'", entry.vehicle_type),
                ));
            }
        }

        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let load_err = |source| ParkingError::Load {
            path: path.to_path_buf(),
            source,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(load_err)?;

        let entries = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<RateEntry>, _>>()
            .map_err(load_err)?;

        let table = Self::new(entries)?;
        log::debug!("Loaded {} rates from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn rate_for(&self, vehicle_type: &str) -> Result<Decimal> {
        self.entries
            .iter()
            .find(|e| e.vehicle_type == vehicle_type)
            .map(|e| e.rate_per_hour)
            .ok_or_else(|| ParkingError::RateNotFound(vehicle_type.to_string()))
    }

    pub fn contains(&self, vehicle_type: &str) -> bool {
        self.entries.iter().any(|e| e.vehicle_type == vehicle_type)
    }

    /// Vehicle types in file order
    pub fn vehicle_types(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.vehicle_type.as_str()).collect()
    }

    pub fn entries(&self) -> &[RateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn invalid(row: usize, reason: String) -> ParkingError {
    ParkingError::InvalidRow {
        table: TABLE,
        row,
        reason,
    }
}
