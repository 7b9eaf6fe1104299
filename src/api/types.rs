//! API request and response types

use crate::registry::DriverListing;
use crate::runtime::EventOutcome;
use crate::state_machine::{PassengerAssignments, Response, Session, SessionState};
use serde::Serialize;

/// Reply to a delivered event
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub response: Response,
    pub state: SessionState,
}

impl From<EventOutcome> for EventResponse {
    fn from(outcome: EventOutcome) -> Self {
        Self {
            response: outcome.response,
            state: outcome.session.state,
        }
    }
}

/// Snapshot of one conversation's session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub state: SessionState,
    pub passenger_assignments: PassengerAssignments,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            state: session.state,
            passenger_assignments: session.assignments,
        }
    }
}

/// Drivers that still have free seats
#[derive(Debug, Serialize)]
pub struct DriversResponse {
    pub drivers: Vec<DriverListing>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
