//! Outbound responses rendered by the transport

use crate::registry::{DriverId, DriverListing, RegistryError};
use serde::{Deserialize, Serialize};

/// Something the transport can offer as a button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MenuOption {
    AddDriver,
    SelectDriver,
    Reset,
    Driver {
        id: DriverId,
        name: String,
        remaining_seats: u32,
    },
    Cancel,
}

impl MenuOption {
    /// Fixed actions offered while idle
    pub fn main_menu() -> Vec<MenuOption> {
        vec![MenuOption::AddDriver, MenuOption::SelectDriver, MenuOption::Reset]
    }
}

impl From<DriverListing> for MenuOption {
    fn from(listing: DriverListing) -> Self {
        MenuOption::Driver {
            id: listing.id,
            name: listing.name,
            remaining_seats: listing.remaining_seats,
        }
    }
}

/// Protocol-level failure shown to the user. None of these are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    DriverNotFound,
    SeatsExhausted,
    AlreadyAssigned,
    UnexpectedEvent,
}

impl From<&RegistryError> for ErrorKind {
    fn from(err: &RegistryError) -> Self {
        match err {
            RegistryError::InvalidInput(_) => ErrorKind::InvalidInput,
            RegistryError::DriverNotFound(_) => ErrorKind::DriverNotFound,
            RegistryError::SeatsExhausted(_) => ErrorKind::SeatsExhausted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Prompt {
        text: String,
        options: Vec<MenuOption>,
    },
    Confirmation {
        text: String,
    },
    Error {
        kind: ErrorKind,
        text: String,
    },
}

impl Response {
    pub fn prompt(text: impl Into<String>, options: Vec<MenuOption>) -> Self {
        Response::Prompt {
            text: text.into(),
            options,
        }
    }

    pub fn confirmation(text: impl Into<String>) -> Self {
        Response::Confirmation { text: text.into() }
    }

    pub fn error(kind: ErrorKind, text: impl Into<String>) -> Self {
        Response::Error {
            kind,
            text: text.into(),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn text(&self) -> &str {
        match self {
            Response::Prompt { text, .. }
            | Response::Confirmation { text }
            | Response::Error { text, .. } => text,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Response::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Options offered with a prompt; empty for other responses
    #[allow(dead_code)] // Used in tests
    pub fn options(&self) -> &[MenuOption] {
        match self {
            Response::Prompt { options, .. } => options,
            _ => &[],
        }
    }
}
