// Layout Snapshot - point-in-time slot occupancy listing
//
// Read from `parking_layout.csv` (columns: SlotId, Status). The snapshot is not
// synchronized with the vehicle ledger; `drift()` reports where the two disagree.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ParkingError, Result};
use crate::ledger::VehicleLedger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotStatus {
    Occupied,
    Vacant,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Occupied => "Occupied",
            SlotStatus::Vacant => "Vacant",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    #[serde(rename = "SlotId", alias = "Slot")]
    pub slot_id: String,

    #[serde(rename = "Status")]
    pub status: SlotStatus,
}

impl SlotRecord {
    pub fn new(slot_id: &str, status: SlotStatus) -> Self {
        Self {
            slot_id: slot_id.to_string(),
            status,
        }
    }
}

/// A slot whose snapshot status disagrees with the parked vehicles in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotDrift {
    pub slot_id: String,
    pub snapshot: SlotStatus,
    pub ledger: SlotStatus,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutSnapshot {
    slots: Vec<SlotRecord>,
}

impl LayoutSnapshot {
    pub fn new(slots: Vec<SlotRecord>) -> Self {
        Self { slots }
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

        let slots = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<SlotRecord>, _>>()
            .map_err(load_err)?;

        log::debug!("Loaded {} slots from {}", slots.len(), path.display());
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[SlotRecord] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn count_by_status(&self, status: SlotStatus) -> usize {
        self.slots.iter().filter(|s| s.status == status).count()
    }

    /// Slot count per status, every status present (zero if unused)
    pub fn status_counts(&self) -> BTreeMap<SlotStatus, usize> {
        [SlotStatus::Occupied, SlotStatus::Vacant]
            .into_iter()
            .map(|status| (status, self.count_by_status(status)))
            .collect()
    }

    /// Compare each slot against the ledger's parked vehicles (read-only)
    pub fn drift(&self, ledger: &VehicleLedger) -> Vec<SlotDrift> {
        let taken: HashSet<&str> = ledger.parked().map(|r| r.slot.as_str()).collect();

        self.slots
            .iter()
            .filter_map(|slot| {
                let ledger_status = if taken.contains(slot.slot_id.as_str()) {
                    SlotStatus::Occupied
                } else {
                    SlotStatus::Vacant
                };

                (ledger_status != slot.status).then(|| SlotDrift {
                    slot_id: slot.slot_id.clone(),
                    snapshot: slot.status,
                    ledger: ledger_status,
                })
            })
            .collect()
    }
}
