//! Effects produced by state transitions

use crate::registry::{Driver, DriverId, GroupKey};

/// Persistence work to run after a transition, before replying
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Persist the session (state and assignments)
    PersistSession,

    /// Store a new driver, then publish it to the conversation's registry
    RegisterDriver { group: GroupKey, driver: Driver },

    /// Persist the session together with the seat it just took, in one write
    PersistClaim { driver_id: DriverId },

    /// Persist seats handed back to a driver
    PersistSeatRelease { driver_id: DriverId, count: u32 },
}

impl Effect {
    pub fn register_driver(group: &GroupKey, driver: Driver) -> Self {
        Effect::RegisterDriver {
            group: group.clone(),
            driver,
        }
    }
}
