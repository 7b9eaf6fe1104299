//! Database schema and row types

use crate::registry::{Driver, GroupKey};
use serde::Serialize;

/// SQL schema for initialization
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS drivers (
    position INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    group_key TEXT NOT NULL,
    name TEXT NOT NULL,
    total_seats INTEGER NOT NULL CHECK (total_seats > 0),
    remaining_seats INTEGER NOT NULL
        CHECK (remaining_seats >= 0 AND remaining_seats <= total_seats),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_drivers_group ON drivers(group_key, position);

CREATE TABLE IF NOT EXISTS sessions (
    conversation_id INTEGER PRIMARY KEY,
    state TEXT NOT NULL DEFAULT '{"type":"idle"}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS passenger_assignments (
    conversation_id INTEGER NOT NULL,
    position INTEGER NOT NULL,
    driver_id TEXT NOT NULL,
    driver_name TEXT NOT NULL,
    passenger TEXT NOT NULL,

    PRIMARY KEY (conversation_id, position),
    FOREIGN KEY (conversation_id) REFERENCES sessions(conversation_id) ON DELETE CASCADE
);
"#;

/// Driver row with its registry group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverRecord {
    pub group: GroupKey,
    pub driver: Driver,
}
