//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the runtime with in-memory implementations.

use crate::db::Database;
use crate::registry::{Driver, DriverId, GroupKey};
use crate::state_machine::{ConversationId, Session};
use async_trait::async_trait;
use std::sync::Arc;

/// Storage for per-conversation sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session, `None` if the conversation was never seen
    async fn load_session(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Session>, String>;

    /// Persist the full session
    async fn save_session(
        &self,
        conversation_id: ConversationId,
        session: &Session,
    ) -> Result<(), String>;

    /// Persist the session and take one seat from `driver_id`, atomically
    async fn save_session_with_claim(
        &self,
        conversation_id: ConversationId,
        session: &Session,
        driver_id: &DriverId,
    ) -> Result<(), String>;
}

/// Storage for drivers and their seat counters
#[async_trait]
pub trait DriverStore: Send + Sync {
    async fn insert_driver(&self, group: &GroupKey, driver: &Driver) -> Result<(), String>;

    /// Give seats back to the stored counter
    async fn release_seats(&self, driver_id: &DriverId, count: u32) -> Result<(), String>;

    /// Every stored driver in registration order
    async fn load_drivers(&self) -> Result<Vec<(GroupKey, Driver)>, String>;
}

/// Combined storage trait for convenience
pub trait Storage: SessionStore + DriverStore {}
impl<T: SessionStore + DriverStore> Storage for T {}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn load_session(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Session>, String> {
        (**self).load_session(conversation_id).await
    }

    async fn save_session(
        &self,
        conversation_id: ConversationId,
        session: &Session,
    ) -> Result<(), String> {
        (**self).save_session(conversation_id, session).await
    }

    async fn save_session_with_claim(
        &self,
        conversation_id: ConversationId,
        session: &Session,
        driver_id: &DriverId,
    ) -> Result<(), String> {
        (**self)
            .save_session_with_claim(conversation_id, session, driver_id)
            .await
    }
}

#[async_trait]
impl<T: DriverStore + ?Sized> DriverStore for Arc<T> {
    async fn insert_driver(&self, group: &GroupKey, driver: &Driver) -> Result<(), String> {
        (**self).insert_driver(group, driver).await
    }

    async fn release_seats(&self, driver_id: &DriverId, count: u32) -> Result<(), String> {
        (**self).release_seats(driver_id, count).await
    }

    async fn load_drivers(&self) -> Result<Vec<(GroupKey, Driver)>, String> {
        (**self).load_drivers().await
    }
}

// ============================================================================
// Production implementation
// ============================================================================

/// Storage backed by the SQLite database
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DatabaseStorage {
    async fn load_session(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Session>, String> {
        self.db.get_session(conversation_id).map_err(|e| e.to_string())
    }

    async fn save_session(
        &self,
        conversation_id: ConversationId,
        session: &Session,
    ) -> Result<(), String> {
        self.db
            .save_session(conversation_id, session)
            .map_err(|e| e.to_string())
    }

    async fn save_session_with_claim(
        &self,
        conversation_id: ConversationId,
        session: &Session,
        driver_id: &DriverId,
    ) -> Result<(), String> {
        self.db
            .save_session_with_claim(conversation_id, session, driver_id)
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl DriverStore for DatabaseStorage {
    async fn insert_driver(&self, group: &GroupKey, driver: &Driver) -> Result<(), String> {
        self.db.insert_driver(group, driver).map_err(|e| e.to_string())
    }

    async fn release_seats(&self, driver_id: &DriverId, count: u32) -> Result<(), String> {
        self.db
            .release_seats(driver_id, count)
            .map_err(|e| e.to_string())
    }

    async fn load_drivers(&self) -> Result<Vec<(GroupKey, Driver)>, String> {
        let records = self.db.list_drivers().map_err(|e| e.to_string())?;
        Ok(records.into_iter().map(|r| (r.group, r.driver)).collect())
    }
}
