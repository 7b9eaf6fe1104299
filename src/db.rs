//! Database module
//!
//! Durable storage for drivers, seat counters and per-conversation sessions.

mod schema;

pub use schema::*;

use crate::registry::{Driver, DriverId, GroupKey};
use crate::state_machine::{ConversationId, PassengerAssignments, Session, SessionState};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Corrupt state column: {0}")]
    State(#[from] serde_json::Error),
    #[error("Corrupt driver id: {0}")]
    DriverId(String),
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
    #[error("Stored seat counter for {0} is already at zero")]
    SeatsExhausted(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn();
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Driver Operations ====================

    pub fn insert_driver(&self, group: &GroupKey, driver: &Driver) -> DbResult<()> {
        self.conn().execute(
            "INSERT INTO drivers (id, group_key, name, total_seats, remaining_seats, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                driver.id.to_string(),
                group.as_str(),
                driver.name,
                driver.total_seats,
                driver.remaining_seats,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// All drivers in registration order
    pub fn list_drivers(&self) -> DbResult<Vec<DriverRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, group_key, name, total_seats, remaining_seats
             FROM drivers ORDER BY position",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u32>(4)?,
            ))
        })?;

        rows.map(|row| {
            let (id, group, name, total_seats, remaining_seats) = row?;
            Ok(DriverRecord {
                group: GroupKey::from(group),
                driver: Driver {
                    id: parse_driver_id(&id)?,
                    name,
                    total_seats,
                    remaining_seats,
                },
            })
        })
        .collect()
    }

    #[allow(dead_code)] // Used in tests
    pub fn get_driver(&self, driver_id: &DriverId) -> DbResult<Driver> {
        self.conn()
            .query_row(
                "SELECT name, total_seats, remaining_seats FROM drivers WHERE id = ?1",
                params![driver_id.to_string()],
                |row| {
                    Ok(Driver {
                        id: *driver_id,
                        name: row.get(0)?,
                        total_seats: row.get(1)?,
                        remaining_seats: row.get(2)?,
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    DbError::DriverNotFound(driver_id.to_string())
                }
                other => DbError::Sqlite(other),
            })
    }

    /// Hand seats back, clamped to the driver's total
    pub fn release_seats(&self, driver_id: &DriverId, count: u32) -> DbResult<()> {
        let updated = self.conn().execute(
            "UPDATE drivers SET remaining_seats = MIN(total_seats, remaining_seats + ?2)
             WHERE id = ?1",
            params![driver_id.to_string(), count],
        )?;
        if updated == 0 {
            return Err(DbError::DriverNotFound(driver_id.to_string()));
        }
        Ok(())
    }

    // ==================== Session Operations ====================

    pub fn get_session(&self, conversation_id: ConversationId) -> DbResult<Option<Session>> {
        let conn = self.conn();
        let state_json: Option<String> = conn
            .query_row(
                "SELECT state FROM sessions WHERE conversation_id = ?1",
                params![conversation_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(state_json) = state_json else {
            return Ok(None);
        };
        let state: SessionState = serde_json::from_str(&state_json)?;

        let mut stmt = conn.prepare(
            "SELECT driver_id, driver_name, passenger FROM passenger_assignments
             WHERE conversation_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![conversation_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut assignments = PassengerAssignments::new();
        for row in rows {
            let (driver_id, driver_name, passenger) = row?;
            assignments.assign(parse_driver_id(&driver_id)?, &driver_name, passenger);
        }

        Ok(Some(Session { state, assignments }))
    }

    /// Upsert the session and replace its assignments in one transaction
    pub fn save_session(&self, conversation_id: ConversationId, session: &Session) -> DbResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        write_session(&tx, conversation_id, session)?;
        tx.commit()?;
        Ok(())
    }

    /// Take one seat from a driver and save the session that holds it.
    ///
    /// Both writes share a transaction. The seat update is relative, so claims
    /// from other conversations commute; nothing is written when the stored
    /// counter is already zero.
    pub fn save_session_with_claim(
        &self,
        conversation_id: ConversationId,
        session: &Session,
        driver_id: &DriverId,
    ) -> DbResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE drivers SET remaining_seats = remaining_seats - 1
             WHERE id = ?1 AND remaining_seats > 0",
            params![driver_id.to_string()],
        )?;
        if updated == 0 {
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM drivers WHERE id = ?1)",
                params![driver_id.to_string()],
                |row| row.get(0),
            )?;
            return Err(if exists {
                DbError::SeatsExhausted(driver_id.to_string())
            } else {
                DbError::DriverNotFound(driver_id.to_string())
            });
        }

        write_session(&tx, conversation_id, session)?;
        tx.commit()?;
        Ok(())
    }
}

fn write_session(
    tx: &Transaction<'_>,
    conversation_id: ConversationId,
    session: &Session,
) -> DbResult<()> {
    let now = Utc::now().to_rfc3339();
    let state_json = serde_json::to_string(&session.state)?;

    tx.execute(
        "INSERT INTO sessions (conversation_id, state, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)
         ON CONFLICT(conversation_id)
         DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
        params![conversation_id, state_json, now],
    )?;
    tx.execute(
        "DELETE FROM passenger_assignments WHERE conversation_id = ?1",
        params![conversation_id],
    )?;

    let mut insert = tx.prepare(
        "INSERT INTO passenger_assignments
             (conversation_id, position, driver_id, driver_name, passenger)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let rows = session
        .assignments
        .iter()
        .flat_map(|entry| entry.passengers.iter().map(move |p| (entry, p)));
    for (position, (entry, passenger)) in rows.enumerate() {
        insert.execute(params![
            conversation_id,
            i64::try_from(position).unwrap_or(i64::MAX),
            entry.driver_id.to_string(),
            entry.driver_name,
            passenger
        ])?;
    }
    Ok(())
}

fn parse_driver_id(s: &str) -> DbResult<DriverId> {
    s.parse().map_err(|_| DbError::DriverId(s.to_string()))
}
