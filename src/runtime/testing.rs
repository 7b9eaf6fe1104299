//! In-memory storage for testing
//!
//! Mirrors the database semantics without I/O.

use super::traits::{DriverStore, SessionStore};
use crate::registry::{Driver, DriverId, GroupKey};
use crate::state_machine::{ConversationId, Session};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Inner {
    sessions: HashMap<ConversationId, Session>,
    drivers: Vec<(GroupKey, Driver)>,
    session_writes: usize,
}

/// In-memory storage for testing
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct InMemoryStorage {
    inner: Arc<Mutex<Inner>>,
}

#[allow(dead_code)]
impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a stored driver, as if registered by an earlier process
    pub fn with_driver(self, group: GroupKey, driver: Driver) -> Self {
        self.inner.lock().unwrap().drivers.push((group, driver));
        self
    }

    /// Pre-populate a stored session
    pub fn with_session(self, conversation_id: ConversationId, session: Session) -> Self {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .insert(conversation_id, session);
        self
    }

    pub fn stored_session(&self, conversation_id: ConversationId) -> Option<Session> {
        self.inner.lock().unwrap().sessions.get(&conversation_id).cloned()
    }

    pub fn stored_driver(&self, driver_id: &DriverId) -> Option<Driver> {
        self.inner
            .lock()
            .unwrap()
            .drivers
            .iter()
            .find(|(_, d)| d.id == *driver_id)
            .map(|(_, d)| d.clone())
    }

    pub fn session_writes(&self) -> usize {
        self.inner.lock().unwrap().session_writes
    }
}

#[async_trait]
impl SessionStore for InMemoryStorage {
    async fn load_session(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<Session>, String> {
        Ok(self.stored_session(conversation_id))
    }

    async fn save_session(
        &self,
        conversation_id: ConversationId,
        session: &Session,
    ) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();
        inner.sessions.insert(conversation_id, session.clone());
        inner.session_writes += 1;
        Ok(())
    }

    async fn save_session_with_claim(
        &self,
        conversation_id: ConversationId,
        session: &Session,
        driver_id: &DriverId,
    ) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();
        let (_, driver) = inner
            .drivers
            .iter_mut()
            .find(|(_, d)| d.id == *driver_id)
            .ok_or_else(|| format!("unknown driver {driver_id}"))?;
        if driver.remaining_seats == 0 {
            return Err(format!("stored seat counter for {driver_id} already at zero"));
        }
        driver.remaining_seats -= 1;
        inner.sessions.insert(conversation_id, session.clone());
        inner.session_writes += 1;
        Ok(())
    }
}

#[async_trait]
impl DriverStore for InMemoryStorage {
    async fn insert_driver(&self, group: &GroupKey, driver: &Driver) -> Result<(), String> {
        self.inner
            .lock()
            .unwrap()
            .drivers
            .push((group.clone(), driver.clone()));
        Ok(())
    }

    async fn release_seats(&self, driver_id: &DriverId, count: u32) -> Result<(), String> {
        let mut inner = self.inner.lock().unwrap();
        let (_, driver) = inner
            .drivers
            .iter_mut()
            .find(|(_, d)| d.id == *driver_id)
            .ok_or_else(|| format!("unknown driver {driver_id}"))?;
        driver.remaining_seats = driver
            .remaining_seats
            .saturating_add(count)
            .min(driver.total_seats);
        Ok(())
    }

    async fn load_drivers(&self) -> Result<Vec<(GroupKey, Driver)>, String> {
        Ok(self.inner.lock().unwrap().drivers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_storage() {
        let storage = InMemoryStorage::new();
        let ivan = Driver::new("Ivan", 1);
        let mut session = Session::new();
        session.assignments.assign(ivan.id, "Ivan", "anna".to_string());

        storage.insert_driver(&GroupKey::global(), &ivan).await.unwrap();
        storage
            .save_session_with_claim(7, &session, &ivan.id)
            .await
            .unwrap();
        assert!(storage
            .save_session_with_claim(8, &Session::new(), &ivan.id)
            .await
            .is_err());
        assert!(storage.load_session(8).await.unwrap().is_none());

        storage.release_seats(&ivan.id, 3).await.unwrap();
        assert_eq!(storage.stored_driver(&ivan.id).unwrap().remaining_seats, 1);

        assert_eq!(storage.load_session(7).await.unwrap(), Some(session));
        storage.save_session(7, &Session::new()).await.unwrap();
        assert_eq!(storage.load_session(7).await.unwrap(), Some(Session::new()));
        assert_eq!(storage.session_writes(), 2);
    }
}
