//! Text for prompts and confirmations
//!
//! Display only; nothing here touches stored state.

use super::state::PassengerId;
use crate::registry::SeatClaim;

pub const GREETING: &str =
    "Hi! I help a group of friends split up between cars. Choose one of the options:";
pub const ADD_DRIVER_PROMPT: &str =
    "Enter the driver's name and the number of free seats in the car separated by a space (e.g. 'Ivan 3'):";
pub const SELECT_DRIVER_PROMPT: &str = "Choose a driver:";
pub const NO_DRIVERS_PROMPT: &str = "No available drivers. Please add a driver.";
pub const CANCELLED: &str = "Action cancelled.";
pub const RESET_DONE: &str = "Counters reset.";
pub const INVALID_SELECTION: &str = "Invalid driver selection.";

pub fn driver_added(name: &str, seats: u32) -> String {
    format!("Driver {name} added. The car has {seats} free seats.")
}

pub fn seats_full(driver: &str) -> String {
    format!("Sorry, all seats in {driver}'s car are taken.")
}

pub fn already_assigned(passenger: &str, driver: &str) -> String {
    format!("{passenger} already has a seat with {driver}.")
}

/// Seats that were left right after each passenger's claim, in claim order.
///
/// Passenger `i` of `n` sees `remaining + (n - 1 - i)`: a countdown that ends
/// at the current remaining count for the latest passenger.
pub fn passenger_countdown(passengers: &[PassengerId], remaining_seats: u32) -> Vec<(&str, u32)> {
    let count = passengers.len();
    passengers
        .iter()
        .enumerate()
        .map(|(i, passenger)| {
            let claimed_after = u32::try_from(count - 1 - i).unwrap_or(u32::MAX);
            (passenger.as_str(), remaining_seats.saturating_add(claimed_after))
        })
        .collect()
}

pub fn seat_claimed(claim: &SeatClaim, passengers: &[PassengerId]) -> String {
    let list = passenger_countdown(passengers, claim.remaining_seats)
        .into_iter()
        .map(|(passenger, seats)| format!("- {passenger} ({seats} seats left)"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You chose driver {}. {} seats left.\n\nPassengers:\n{list}",
        claim.driver_name, claim.remaining_seats
    )
}
