//! Sqlite-backed persistence.
//!
//! State records are stored as JSON snapshots under fixed keys. Reads never fail: a missing,
//! unreadable or malformed snapshot falls back to defaults.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

use anyhow::Context as _;
use khatma_core::{Clock, PLAN_STATE_KEY, PlanState, READER_STATE_KEY, ReaderState};
use rusqlite::{Connection, OptionalExtension as _};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Get/set by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );
            "#,
        )?;
        Ok(())
    }
}

impl KeyValueStore for Storage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM state WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("read state {key}"))?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO state (key, value, updated_at) VALUES (?, ?, unixepoch())
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
                (key, value),
            )
            .with_context(|| format!("write state {key}"))?;
        Ok(())
    }
}

/// Volatile store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads the snapshot under `key`, or `None` when it is missing or unusable.
pub fn load<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            tracing::warn!(key, "state unreadable, using defaults: {err:#}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, "state malformed, using defaults: {err}");
            None
        }
    }
}

pub fn save<T: Serialize>(store: &impl KeyValueStore, key: &str, value: &T) -> anyhow::Result<()> {
    let raw = serde_json::to_string(value).with_context(|| format!("serialize state {key}"))?;
    store.set(key, &raw)
}

pub fn load_plan(store: &impl KeyValueStore, clock: &impl Clock) -> PlanState {
    let mut plan = load::<PlanState>(store, PLAN_STATE_KEY)
        .unwrap_or_else(|| PlanState::new(clock.today(), clock.now()));
    plan.normalize();
    plan
}

pub fn save_plan(store: &impl KeyValueStore, plan: &PlanState) -> anyhow::Result<()> {
    save(store, PLAN_STATE_KEY, plan)
}

pub fn load_reader(store: &impl KeyValueStore) -> ReaderState {
    let mut reader = load::<ReaderState>(store, READER_STATE_KEY).unwrap_or_default();
    reader.normalize();
    reader
}

pub fn save_reader(store: &impl KeyValueStore, reader: &ReaderState) -> anyhow::Result<()> {
    save(store, READER_STATE_KEY, reader)
}
