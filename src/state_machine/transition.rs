//! State transition function
//!
//! Given a session, its context and the registry it claims from, maps one
//! event to the next session, a response and the persistence effects. The
//! only mutation outside the returned session is the registry's own seat
//! bookkeeping, which is internally synchronized.

use super::input::parse_driver_info;
use super::render;
use super::{Effect, ErrorKind, Event, MenuOption, Response, Session, SessionContext, SessionState};
use crate::registry::{DriverRef, DriverRegistry, RegistryError};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_session: Session,
    pub response: Response,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(session: Session, response: Response) -> Self {
        Self {
            new_session: session,
            response,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("This action is not available right now ({event} while {state})")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },
}

pub fn transition(
    session: &Session,
    context: &SessionContext,
    registry: &DriverRegistry,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (session.state, event) {
        // ============================================================
        // Available in every state
        // ============================================================
        // Back to the main menu; assignments are kept
        (_, Event::StartSession) => Ok(TransitionResult::new(
            session.with_state(SessionState::Idle),
            Response::prompt(render::GREETING, MenuOption::main_menu()),
        )
        .with_effect(Effect::PersistSession)),

        (_, Event::Cancel) => Ok(TransitionResult::new(
            session.with_state(SessionState::Idle),
            Response::confirmation(render::CANCELLED),
        )
        .with_effect(Effect::PersistSession)),

        (_, Event::Reset) => Ok(reset(session, context, registry)),

        // ============================================================
        // Idle menu
        // ============================================================
        (SessionState::Idle, Event::RequestAddDriver) => Ok(TransitionResult::new(
            session.with_state(SessionState::AwaitingDriverInfo),
            Response::prompt(render::ADD_DRIVER_PROMPT, vec![]),
        )
        .with_effect(Effect::PersistSession)),

        (SessionState::Idle, Event::RequestSelectDriver) => {
            let drivers = registry.list_available_drivers();
            let text = if drivers.is_empty() {
                render::NO_DRIVERS_PROMPT
            } else {
                render::SELECT_DRIVER_PROMPT
            };
            let options = drivers
                .into_iter()
                .map(MenuOption::from)
                .chain(std::iter::once(MenuOption::Cancel))
                .collect();

            Ok(TransitionResult::new(
                session.with_state(SessionState::AwaitingDriverSelection),
                Response::prompt(text, options),
            )
            .with_effect(Effect::PersistSession))
        }

        // ============================================================
        // Driver registration
        // ============================================================
        (SessionState::AwaitingDriverInfo, Event::SubmitDriverInfo { raw_text }) => {
            let registered = parse_driver_info(&raw_text)
                .map_err(|e| e.to_string())
                .and_then(|info| {
                    DriverRegistry::new_driver(&info.name, info.seats).map_err(|e| e.to_string())
                });

            match registered {
                Ok(driver) => {
                    tracing::info!(
                        conversation_id = context.conversation_id,
                        driver_id = %driver.id,
                        seats = driver.total_seats,
                        "Driver accepted"
                    );
                    let text = render::driver_added(&driver.name, driver.total_seats);
                    Ok(TransitionResult::new(
                        session.with_state(SessionState::Idle),
                        Response::confirmation(text),
                    )
                    .with_effect(Effect::register_driver(&context.group, driver))
                    .with_effect(Effect::PersistSession))
                }
                // Re-prompt in place; nothing changed
                Err(message) => Ok(TransitionResult::new(
                    session.clone(),
                    Response::error(ErrorKind::InvalidInput, message),
                )),
            }
        }

        // ============================================================
        // Seat selection
        // ============================================================
        (SessionState::AwaitingDriverSelection, Event::SelectDriver { driver, passenger }) => {
            Ok(select_driver(session, context, registry, &driver, passenger))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition {
            state: state.as_str(),
            event: event.kind(),
        }),
    }
}

fn select_driver(
    session: &Session,
    context: &SessionContext,
    registry: &DriverRegistry,
    driver: &DriverRef,
    passenger: String,
) -> TransitionResult {
    let idle = session.with_state(SessionState::Idle);

    if passenger.trim().is_empty() {
        return TransitionResult::new(
            idle,
            Response::error(ErrorKind::InvalidInput, "Passenger identity is missing."),
        )
        .with_effect(Effect::PersistSession);
    }

    // Checked before claiming so a repeat pick never consumes a seat
    if let Some(existing) = session.assignments.driver_of(&passenger) {
        let text = render::already_assigned(&passenger, &existing.driver_name);
        return TransitionResult::new(idle, Response::error(ErrorKind::AlreadyAssigned, text))
            .with_effect(Effect::PersistSession);
    }

    match registry.claim_seat(driver) {
        Ok(claim) => {
            let mut new_session = idle;
            new_session
                .assignments
                .assign(claim.driver_id, &claim.driver_name, passenger.clone());
            let text = render::seat_claimed(
                &claim,
                new_session.assignments.passengers_for(&claim.driver_id),
            );

            tracing::info!(
                conversation_id = context.conversation_id,
                driver_id = %claim.driver_id,
                passenger = %passenger,
                remaining_seats = claim.remaining_seats,
                "Seat claimed"
            );

            TransitionResult::new(new_session, Response::confirmation(text)).with_effect(
                Effect::PersistClaim {
                    driver_id: claim.driver_id,
                },
            )
        }
        Err(err) => {
            let text = match &err {
                RegistryError::SeatsExhausted(name) => render::seats_full(name),
                RegistryError::DriverNotFound(_) | RegistryError::InvalidInput(_) => {
                    render::INVALID_SELECTION.to_string()
                }
            };
            tracing::debug!(
                conversation_id = context.conversation_id,
                driver = %driver,
                error = %err,
                "Seat claim rejected"
            );
            TransitionResult::new(idle, Response::error(ErrorKind::from(&err), text))
                .with_effect(Effect::PersistSession)
        }
    }
}

fn reset(
    session: &Session,
    context: &SessionContext,
    registry: &DriverRegistry,
) -> TransitionResult {
    let mut releases = Vec::new();

    if context.restore_seats_on_reset {
        for (driver_id, count) in session.assignments.claims_per_driver() {
            match registry.release_seats(&driver_id, count) {
                Ok(_) => releases.push(Effect::PersistSeatRelease { driver_id, count }),
                Err(e) => tracing::warn!(
                    conversation_id = context.conversation_id,
                    driver_id = %driver_id,
                    error = %e,
                    "Cannot restore seats"
                ),
            }
        }
    }

    tracing::info!(
        conversation_id = context.conversation_id,
        passengers = session.assignments.total_passengers(),
        restored = !releases.is_empty(),
        "Session reset"
    );

    TransitionResult::new(Session::new(), Response::confirmation(render::RESET_DONE))
        .with_effects(releases)
        .with_effect(Effect::PersistSession)
}
