use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

// ---------------------------------------------------------------------------
// CrashRecord – one row of the collision table
// ---------------------------------------------------------------------------

/// A single normalized collision event (one row of the source table).
///
/// The essential columns are typed fields, validated once at load time;
/// everything else the source carries rides along in `extra` under its
/// lower-cased column name. Serializes so the hosting UI can ship
/// records (e.g. the raw-data view) over a JSON boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrashRecord {
    /// Merged crash date + crash time (the `date/time` column).
    pub timestamp: NaiveDateTime,
    /// Always present: rows missing either coordinate are dropped at load.
    pub latitude: f64,
    pub longitude: f64,
    /// Injury counts. `None` means the raw cell was empty; missing is
    /// distinct from zero and is excluded by count-based filters.
    pub injured_persons: Option<u32>,
    pub injured_pedestrians: Option<u32>,
    pub injured_cyclists: Option<u32>,
    pub injured_motorists: Option<u32>,
    /// Free-text street identifier, may be missing.
    pub on_street_name: Option<String>,
    /// Remaining raw columns: lower-cased column name → raw cell text.
    pub extra: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// CrashDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full loaded table. Immutable after load; row order is source
/// insertion order and only matters for deterministic top-N tie-breaking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrashDataset {
    /// All records (rows), in source order.
    pub records: Vec<CrashRecord>,
    /// Lower-cased column names in source order, with `date/time`
    /// replacing the two raw date/time columns.
    pub columns: Vec<String>,
}

impl CrashDataset {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// InjuryCategory – which injury-count column a ranking runs over
// ---------------------------------------------------------------------------

/// Affected type of people for the "most dangerous streets" ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjuryCategory {
    Pedestrians,
    Cyclists,
    Motorists,
}

impl InjuryCategory {
    /// The injury count this category ranks by, for one record.
    pub fn count(self, record: &CrashRecord) -> Option<u32> {
        match self {
            InjuryCategory::Pedestrians => record.injured_pedestrians,
            InjuryCategory::Cyclists => record.injured_cyclists,
            InjuryCategory::Motorists => record.injured_motorists,
        }
    }
}

impl FromStr for InjuryCategory {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pedestrians" => Ok(InjuryCategory::Pedestrians),
            "cyclists" => Ok(InjuryCategory::Cyclists),
            "motorists" => Ok(InjuryCategory::Motorists),
            other => Err(QueryError::InvalidParameter(format!(
                "unknown injury category '{other}'"
            ))),
        }
    }
}

impl fmt::Display for InjuryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjuryCategory::Pedestrians => write!(f, "pedestrians"),
            InjuryCategory::Cyclists => write!(f, "cyclists"),
            InjuryCategory::Motorists => write!(f, "motorists"),
        }
    }
}
