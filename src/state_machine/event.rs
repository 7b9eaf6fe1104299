//! Events that can occur in a conversation

use super::state::PassengerId;
use crate::registry::DriverRef;
use serde::{Deserialize, Serialize};

/// Inbound events; the conversation id travels with the routing envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// First contact or re-entry; shows the main menu
    StartSession,
    RequestAddDriver,
    RequestSelectDriver,
    /// Free-form "name seats" text
    SubmitDriverInfo { raw_text: String },
    SelectDriver {
        driver: DriverRef,
        passenger: PassengerId,
    },
    Cancel,
    Reset,
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::StartSession => "start_session",
            Event::RequestAddDriver => "request_add_driver",
            Event::RequestSelectDriver => "request_select_driver",
            Event::SubmitDriverInfo { .. } => "submit_driver_info",
            Event::SelectDriver { .. } => "select_driver",
            Event::Cancel => "cancel",
            Event::Reset => "reset",
        }
    }
}
