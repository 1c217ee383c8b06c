//! Persistence backends for `FrontierState` (§4.H "Persistence contract",
//! Design Note §9 "Global mutable state"). Two shapes are supported: a
//! JSON blob and a `rusqlite`-backed table, selected by configuration.

use std::path::Path;

use rusqlite::Connection;

use crate::error::FrontierError;
use crate::state::FrontierState;

pub trait FrontierPersistence {
    fn load(&self) -> Result<FrontierState, FrontierError>;
    fn save(&self, state: &FrontierState) -> Result<(), FrontierError>;
}

pub struct JsonFrontierPersistence {
    path: std::path::PathBuf,
}

impl JsonFrontierPersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonFrontierPersistence { path: path.as_ref().to_path_buf() }
    }
}

impl FrontierPersistence for JsonFrontierPersistence {
    fn load(&self) -> Result<FrontierState, FrontierError> {
        if !self.path.exists() {
            return Ok(FrontierState::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| FrontierError::Deserialize(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| FrontierError::Deserialize(e.to_string()))
    }

    fn save(&self, state: &FrontierState) -> Result<(), FrontierError> {
        let raw = serde_json::to_string_pretty(state)
            .map_err(|e| FrontierError::Deserialize(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(|e| FrontierError::Deserialize(e.to_string()))
    }
}

/// Stores the full state as one JSON blob in a single-row table, which is
/// enough to satisfy the persistence contract without modeling the state
/// relationally; the SQLite shape exists for write durability under
/// concurrent harvester processes, not for queryability.
pub struct SqliteFrontierPersistence {
    path: std::path::PathBuf,
}

impl SqliteFrontierPersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        SqliteFrontierPersistence { path: path.as_ref().to_path_buf() }
    }

    fn open(&self) -> Result<Connection, FrontierError> {
        let conn = Connection::open(&self.path).map_err(|e| FrontierError::Sqlite(e.to_string()))?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS frontier_state (id INTEGER PRIMARY KEY CHECK (id = 0), payload TEXT NOT NULL)",
            [],
        )
        .map_err(|e| FrontierError::Sqlite(e.to_string()))?;
        Ok(conn)
    }
}

impl FrontierPersistence for SqliteFrontierPersistence {
    fn load(&self) -> Result<FrontierState, FrontierError> {
        let conn = self.open()?;
        let payload: Option<String> = conn
            .query_row("SELECT payload FROM frontier_state WHERE id = 0", [], |row| row.get(0))
            .ok();
        match payload {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| FrontierError::Deserialize(e.to_string())),
            None => Ok(FrontierState::default()),
        }
    }

    fn save(&self, state: &FrontierState) -> Result<(), FrontierError> {
        let conn = self.open()?;
        let raw = serde_json::to_string(state).map_err(|e| FrontierError::Deserialize(e.to_string()))?;
        conn.execute(
            "INSERT INTO frontier_state (id, payload) VALUES (0, ?1)
             ON CONFLICT(id) DO UPDATE SET payload = excluded.payload",
            [raw],
        )
        .map_err(|e| FrontierError::Sqlite(e.to_string()))?;
        Ok(())
    }
}
