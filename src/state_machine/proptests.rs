//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::registry::{DriverRef, DriverRegistry, GroupKey};
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> SessionContext {
    SessionContext::new(1, GroupKey::global())
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_driver_name() -> impl Strategy<Value = String> {
    prop_oneof![Just("Ivan"), Just("Olga"), Just("Petr")].prop_map(String::from)
}

fn arb_passenger() -> impl Strategy<Value = String> {
    prop_oneof![Just("anna"), Just("boris"), Just("clara"), Just("dmitri"), Just("")]
        .prop_map(String::from)
}

fn arb_driver_info_text() -> impl Strategy<Value = String> {
    prop_oneof![
        (arb_driver_name(), 1u32..4).prop_map(|(name, seats)| format!("{name} {seats}")),
        arb_driver_name(),
        arb_driver_name().prop_map(|name| format!("{name} three")),
        arb_driver_name().prop_map(|name| format!("{name} 0")),
        "[a-z ]{0,12}",
    ]
}

fn arb_state() -> impl Strategy<Value = SessionState> {
    prop_oneof![
        Just(SessionState::Idle),
        Just(SessionState::AwaitingDriverInfo),
        Just(SessionState::AwaitingDriverSelection),
    ]
}

fn arb_event_no_reset() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::StartSession),
        Just(Event::RequestAddDriver),
        Just(Event::RequestSelectDriver),
        arb_driver_info_text().prop_map(|raw_text| Event::SubmitDriverInfo { raw_text }),
        (arb_driver_name(), arb_passenger()).prop_map(|(name, passenger)| Event::SelectDriver {
            driver: DriverRef::Name(name),
            passenger,
        }),
        Just(Event::Cancel),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        6 => arb_event_no_reset(),
        1 => Just(Event::Reset),
    ]
}

// ============================================================================
// Invariant Checkers
// ============================================================================

/// Every driver's claimed seats match the passengers this session put there
fn seats_match_assignments(session: &Session, registry: &DriverRegistry) -> bool {
    registry.drivers().iter().all(|driver| {
        let assigned = session.assignments.passengers_for(&driver.id).len();
        usize::try_from(driver.claimed_seats()).is_ok_and(|claimed| claimed == assigned)
    })
}

fn passengers_are_unique(session: &Session) -> bool {
    let mut seen = HashSet::new();
    session
        .assignments
        .iter()
        .flat_map(|e| e.passengers.iter())
        .all(|p| seen.insert(p.clone()))
}

/// Publish registered drivers the way the runtime does after storing them
fn publish_drivers(effects: &[Effect], registry: &DriverRegistry) {
    for effect in effects {
        if let Effect::RegisterDriver { driver, .. } = effect {
            registry.add_driver(driver.clone());
        }
    }
}

fn drive(
    events: Vec<Event>,
    context: &SessionContext,
    registry: &DriverRegistry,
    mut check: impl FnMut(&Session) -> Result<(), TestCaseError>,
) -> Result<Session, TestCaseError> {
    let mut session = Session::new();
    for event in events {
        if let Ok(result) = transition(&session, context, registry, event) {
            publish_drivers(&result.effects, registry);
            session = result.new_session;
        }
        check(&session)?;
    }
    Ok(session)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: without a reset, claimed seats equal assigned passengers
    // and remaining seats stay within bounds
    #[test]
    fn prop_seats_consistent_without_reset(
        events in proptest::collection::vec(arb_event_no_reset(), 0..40)
    ) {
        let registry = DriverRegistry::new();
        drive(events, &test_context(), &registry, |session| {
            prop_assert!(seats_match_assignments(session, &registry));
            for driver in registry.drivers() {
                prop_assert!(driver.remaining_seats <= driver.total_seats);
            }
            Ok(())
        })?;
    }

    // Invariant 2: with seat restoration, the consistency survives resets
    #[test]
    fn prop_seats_consistent_with_restoring_reset(
        events in proptest::collection::vec(arb_event(), 0..40)
    ) {
        let registry = DriverRegistry::new();
        let context = test_context().with_seat_restore(true);
        drive(events, &context, &registry, |session| {
            prop_assert!(seats_match_assignments(session, &registry));
            Ok(())
        })?;
    }

    // Invariant 3: a passenger never holds two seats in one session
    #[test]
    fn prop_passengers_unique(events in proptest::collection::vec(arb_event(), 0..40)) {
        let registry = DriverRegistry::new();
        drive(events, &test_context(), &registry, |session| {
            prop_assert!(passengers_are_unique(session), "Duplicate passenger: {:?}", session);
            Ok(())
        })?;
    }

    // Invariant 4: rejected events leave session and registry untouched
    #[test]
    fn prop_rejected_events_do_not_mutate(
        setup in proptest::collection::vec(arb_event_no_reset(), 0..15),
        state in arb_state(),
        event in arb_event(),
    ) {
        let registry = DriverRegistry::new();
        let session = drive(setup, &test_context(), &registry, |_| Ok(()))?.with_state(state);
        let drivers_before = registry.drivers();

        if transition(&session, &test_context(), &registry, event).is_err() {
            prop_assert_eq!(registry.drivers(), drivers_before);
        }
    }

    // Invariant 5: cancel always lands in Idle and never touches assignments
    #[test]
    fn prop_cancel_is_idempotent(
        setup in proptest::collection::vec(arb_event_no_reset(), 0..15),
        state in arb_state(),
    ) {
        let registry = DriverRegistry::new();
        let session = drive(setup, &test_context(), &registry, |_| Ok(()))?.with_state(state);

        let first = transition(&session, &test_context(), &registry, Event::Cancel);
        prop_assert!(first.is_ok());
        let first = first.unwrap().new_session;
        let second = transition(&first, &test_context(), &registry, Event::Cancel);
        prop_assert!(second.is_ok());
        let second = second.unwrap().new_session;

        prop_assert_eq!(first.state, SessionState::Idle);
        prop_assert_eq!(&second, &first);
        prop_assert_eq!(&second.assignments, &session.assignments);
    }

    // Invariant 6: selection from Idle always opens the listing, even when empty
    #[test]
    fn prop_select_from_idle_always_lists(
        setup in proptest::collection::vec(arb_event_no_reset(), 0..15),
    ) {
        let registry = DriverRegistry::new();
        let session = drive(setup, &test_context(), &registry, |_| Ok(()))?
            .with_state(SessionState::Idle);

        let result = transition(&session, &test_context(), &registry, Event::RequestSelectDriver);
        prop_assert!(result.is_ok());
        let result = result.unwrap();
        prop_assert_eq!(result.new_session.state, SessionState::AwaitingDriverSelection);

        let offered = result.response.options().len() - 1;
        prop_assert_eq!(offered, registry.list_available_drivers().len());
        prop_assert_eq!(result.response.options().last(), Some(&MenuOption::Cancel));
    }

    // Invariant 7: reset always returns a clean Idle session
    #[test]
    fn prop_reset_clears_session(
        setup in proptest::collection::vec(arb_event_no_reset(), 0..15),
        state in arb_state(),
        restore in any::<bool>(),
    ) {
        let registry = DriverRegistry::new();
        let context = test_context().with_seat_restore(restore);
        let session = drive(setup, &context, &registry, |_| Ok(()))?.with_state(state);

        let result = transition(&session, &context, &registry, Event::Reset);
        prop_assert!(result.is_ok());
        prop_assert_eq!(result.unwrap().new_session, Session::new());
    }

    // Invariant 8: the greeting lands in Idle and every menu button it offers is accepted
    #[test]
    fn prop_greeting_options_are_accepted(
        setup in proptest::collection::vec(arb_event_no_reset(), 0..15),
        state in arb_state(),
    ) {
        let registry = DriverRegistry::new();
        let session = drive(setup, &test_context(), &registry, |_| Ok(()))?.with_state(state);

        let greeted = transition(&session, &test_context(), &registry, Event::StartSession);
        prop_assert!(greeted.is_ok());
        let greeted = greeted.unwrap();
        prop_assert_eq!(greeted.new_session.state, SessionState::Idle);
        prop_assert_eq!(&greeted.new_session.assignments, &session.assignments);

        for option in greeted.response.options() {
            let event = match option {
                MenuOption::AddDriver => Event::RequestAddDriver,
                MenuOption::SelectDriver => Event::RequestSelectDriver,
                MenuOption::Reset => Event::Reset,
                MenuOption::Cancel => Event::Cancel,
                MenuOption::Driver { .. } => continue,
            };
            prop_assert!(
                transition(&greeted.new_session, &test_context(), &registry, event).is_ok(),
                "{:?} rejected after greeting from {:?}", option, state
            );
        }
    }
}
