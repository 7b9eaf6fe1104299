//! Driver record types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Generated driver identifier. Names are display labels and may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(Uuid);

impl DriverId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DriverId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DriverId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A driver offering seats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    /// Fixed at registration
    pub total_seats: u32,
    /// Always `<= total_seats`
    pub remaining_seats: u32,
}

impl Driver {
    pub fn new(name: impl Into<String>, seats: u32) -> Self {
        Self {
            id: DriverId::new(),
            name: name.into(),
            total_seats: seats,
            remaining_seats: seats,
        }
    }

    pub fn has_seats(&self) -> bool {
        self.remaining_seats > 0
    }

    #[allow(dead_code)] // Used in tests
    pub fn claimed_seats(&self) -> u32 {
        self.total_seats - self.remaining_seats
    }
}

/// Entry in a selection listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverListing {
    pub id: DriverId,
    pub name: String,
    pub remaining_seats: u32,
}

impl From<&Driver> for DriverListing {
    fn from(driver: &Driver) -> Self {
        Self {
            id: driver.id,
            name: driver.name.clone(),
            remaining_seats: driver.remaining_seats,
        }
    }
}

/// How a selection event names its driver.
///
/// Listings always hand out ids; `Name` exists for clients that only know
/// the label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum DriverRef {
    Id(DriverId),
    Name(String),
}

impl fmt::Display for DriverRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverRef::Id(id) => write!(f, "{id}"),
            DriverRef::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Outcome of a successful seat claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatClaim {
    pub driver_id: DriverId,
    pub driver_name: String,
    pub remaining_seats: u32,
}
