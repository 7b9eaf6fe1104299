//! Seat allocation state machine
//!
//! Implements the Elm Architecture pattern: each conversation event goes
//! through [`transition`], which returns the next session, the response to
//! render, and the persistence effects for the runtime to execute.

mod effect;
pub mod event;
mod input;
pub mod render;
mod response;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use response::{ErrorKind, MenuOption, Response};
pub use state::{ConversationId, PassengerAssignments, Session, SessionContext, SessionState};
pub use transition::transition;
