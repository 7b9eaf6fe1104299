//! Session state types

use crate::registry::{DriverId, GroupKey};
use serde::{Deserialize, Serialize};

/// Conversation identifier assigned by the transport (chat ids may be negative)
pub type ConversationId = i64;

/// Passenger identity as reported by the transport
pub type PassengerId = String;

/// Protocol step of a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionState {
    /// Showing the main menu
    #[default]
    Idle,
    /// Waiting for "name seats" text
    AwaitingDriverInfo,
    /// Waiting for a driver pick from the listing
    AwaitingDriverSelection,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingDriverInfo => "awaiting_driver_info",
            SessionState::AwaitingDriverSelection => "awaiting_driver_selection",
        }
    }
}

/// Passengers one driver took in this session, in claim order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverPassengers {
    pub driver_id: DriverId,
    pub driver_name: String,
    pub passengers: Vec<PassengerId>,
}

/// Driver-to-passengers mapping of a session, drivers in first-claim order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassengerAssignments {
    entries: Vec<DriverPassengers>,
}

impl PassengerAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a passenger to a driver's list
    pub fn assign(&mut self, driver_id: DriverId, driver_name: &str, passenger: PassengerId) {
        match self.entries.iter_mut().find(|e| e.driver_id == driver_id) {
            Some(entry) => entry.passengers.push(passenger),
            None => self.entries.push(DriverPassengers {
                driver_id,
                driver_name: driver_name.to_string(),
                passengers: vec![passenger],
            }),
        }
    }

    pub fn passengers_for(&self, driver_id: &DriverId) -> &[PassengerId] {
        self.entries
            .iter()
            .find(|e| e.driver_id == *driver_id)
            .map(|e| e.passengers.as_slice())
            .unwrap_or_default()
    }

    /// Driver this passenger already rides with, if any
    pub fn driver_of(&self, passenger: &str) -> Option<&DriverPassengers> {
        self.entries
            .iter()
            .find(|e| e.passengers.iter().any(|p| p == passenger))
    }

    /// Seats this session took from each driver
    pub fn claims_per_driver(&self) -> impl Iterator<Item = (DriverId, u32)> + '_ {
        self.entries
            .iter()
            .map(|e| (e.driver_id, u32::try_from(e.passengers.len()).unwrap_or(u32::MAX)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DriverPassengers> {
        self.entries.iter()
    }

    pub fn total_passengers(&self) -> usize {
        self.entries.iter().map(|e| e.passengers.len()).sum()
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-conversation state: protocol step plus claimed seats
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub state: SessionState,
    pub assignments: PassengerAssignments,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_state(&self, state: SessionState) -> Self {
        Self {
            state,
            assignments: self.assignments.clone(),
        }
    }
}

/// Context for a conversation (immutable configuration)
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub conversation_id: ConversationId,
    /// Registry this conversation reads and claims from
    pub group: GroupKey,
    /// Give claimed seats back to drivers on reset
    pub restore_seats_on_reset: bool,
}

impl SessionContext {
    pub fn new(conversation_id: ConversationId, group: GroupKey) -> Self {
        Self {
            conversation_id,
            group,
            restore_seats_on_reset: false,
        }
    }

    pub fn with_seat_restore(mut self, restore: bool) -> Self {
        self.restore_seats_on_reset = restore;
        self
    }
}
