//! Driver registry
//!
//! Owns drivers and their remaining seats. The registry knows nothing about
//! conversations; the state machine asks it to register drivers, list the
//! ones with free seats, and claim seats.
//!
//! Every operation takes the registry lock for its whole duration, so a seat
//! claim is a single check-and-decrement: two concurrent claims against the
//! last seat produce exactly one success.

mod driver;
mod scope;

#[cfg(test)]
mod proptests;

pub use driver::{Driver, DriverId, DriverListing, DriverRef, SeatClaim};
pub use scope::{GroupKey, Registries, RegistryScope};

use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
    #[error("No seats left with driver {0}")]
    SeatsExhausted(String),
}

/// Set of drivers for one registry scope, in registration order
#[derive(Debug, Default)]
pub struct DriverRegistry {
    drivers: Mutex<Vec<Driver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from persisted drivers (already in registration order)
    pub fn from_drivers(drivers: impl IntoIterator<Item = Driver>) -> Self {
        Self {
            drivers: Mutex::new(drivers.into_iter().collect()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Driver>> {
        self.drivers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new driver with `seats` free seats.
    ///
    /// Duplicate names are allowed; each registration gets its own id and
    /// seat pool.
    #[allow(dead_code)] // Used in tests
    pub fn register_driver(&self, name: &str, seats: u32) -> Result<Driver, RegistryError> {
        let driver = Self::new_driver(name, seats)?;
        self.add_driver(driver.clone());
        Ok(driver)
    }

    /// Validate a registration and build the driver without publishing it.
    ///
    /// The driver becomes claimable only through [`DriverRegistry::add_driver`],
    /// which the runtime calls after the driver row is stored.
    pub fn new_driver(name: &str, seats: u32) -> Result<Driver, RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::InvalidInput(
                "driver name must not be empty".to_string(),
            ));
        }
        if seats == 0 {
            return Err(RegistryError::InvalidInput(
                "seat count must be a positive integer".to_string(),
            ));
        }

        Ok(Driver::new(name, seats))
    }

    /// Make a driver visible to listings and claims
    pub fn add_driver(&self, driver: Driver) {
        tracing::debug!(
            driver_id = %driver.id,
            name = %driver.name,
            seats = driver.total_seats,
            "Driver published"
        );
        self.lock().push(driver);
    }

    /// Drivers with at least one free seat, in registration order
    pub fn list_available_drivers(&self) -> Vec<DriverListing> {
        self.lock()
            .iter()
            .filter(|d| d.has_seats())
            .map(DriverListing::from)
            .collect()
    }

    /// Atomically take one seat from the referenced driver.
    ///
    /// Name references resolve to the first driver with that name that still
    /// has seats, falling back to the first driver with that name so a full
    /// car reports `SeatsExhausted` rather than `DriverNotFound`.
    pub fn claim_seat(&self, driver: &DriverRef) -> Result<SeatClaim, RegistryError> {
        let mut drivers = self.lock();
        let index = Self::resolve(&drivers, driver)
            .ok_or_else(|| RegistryError::DriverNotFound(driver.to_string()))?;
        let entry = &mut drivers[index];

        if entry.remaining_seats == 0 {
            return Err(RegistryError::SeatsExhausted(entry.name.clone()));
        }
        entry.remaining_seats -= 1;

        Ok(SeatClaim {
            driver_id: entry.id,
            driver_name: entry.name.clone(),
            remaining_seats: entry.remaining_seats,
        })
    }

    /// Give `count` seats back to a driver, never exceeding its total.
    ///
    /// Returns the remaining seats after the release.
    pub fn release_seats(&self, driver_id: &DriverId, count: u32) -> Result<u32, RegistryError> {
        let mut drivers = self.lock();
        let entry = drivers
            .iter_mut()
            .find(|d| d.id == *driver_id)
            .ok_or_else(|| RegistryError::DriverNotFound(driver_id.to_string()))?;

        entry.remaining_seats = entry
            .remaining_seats
            .saturating_add(count)
            .min(entry.total_seats);
        Ok(entry.remaining_seats)
    }

    #[allow(dead_code)] // Used in tests
    pub fn get(&self, driver_id: &DriverId) -> Option<Driver> {
        self.lock().iter().find(|d| d.id == *driver_id).cloned()
    }

    /// Snapshot of every driver, full or not
    #[allow(dead_code)] // Used in tests
    pub fn drivers(&self) -> Vec<Driver> {
        self.lock().clone()
    }

    #[allow(dead_code)] // Used in tests
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[allow(dead_code)] // Used in tests
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn resolve(drivers: &[Driver], driver: &DriverRef) -> Option<usize> {
        match driver {
            DriverRef::Id(id) => drivers.iter().position(|d| d.id == *id),
            DriverRef::Name(name) => drivers
                .iter()
                .position(|d| d.name == *name && d.has_seats())
                .or_else(|| drivers.iter().position(|d| d.name == *name)),
        }
    }
}
