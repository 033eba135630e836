//src/store.rs
use rusqlite::Connection;
use std::cell::{Cell, RefCell};
use thiserror::Error;
use tracing::debug;

use crate::db::{self, DbError};
use crate::schedule::Schedule;

/// Key the schedule list is stored under.
pub const SCHEDULES_KEY: &str = "customSchedules";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Db(#[from] DbError),
    #[error("Stored schedules are not valid JSON: {0}")]
    Corrupt(serde_json::Error),
    #[error("Failed to serialize schedules: {0}")]
    Serialize(serde_json::Error),
    #[error("Storage rejected the write: {0}")]
    WriteRejected(String),
}

/// Whole-list persistence for schedules. There is no per-record API: callers
/// read everything, change one entry and write everything back.
pub trait ScheduleStore {
    fn read_all(&self) -> Result<Vec<Schedule>, StoreError>;
    fn write_all(&self, schedules: &[Schedule]) -> Result<(), StoreError>;
}

fn decode(raw: Option<&str>) -> Result<Vec<Schedule>, StoreError> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) if text.trim().is_empty() => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).map_err(StoreError::Corrupt),
    }
}

fn encode(schedules: &[Schedule]) -> Result<String, StoreError> {
    serde_json::to_string(schedules).map_err(StoreError::Serialize)
}

/// Keeps the schedule list as one JSON array in the SQLite `storage` table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Wraps an already opened connection and makes sure the table exists.
    pub fn new(conn: Connection) -> Result<Self, StoreError> {
        db::init_db(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(DbError::Connection)?;
        Self::new(conn)
    }

    /// Raw stored text, exactly as written.
    pub fn raw(&self) -> Result<Option<String>, StoreError> {
        Ok(db::get_item(&self.conn, SCHEDULES_KEY)?)
    }

    /// Overwrites the stored text without validating it.
    pub fn set_raw(&self, value: &str) -> Result<(), StoreError> {
        Ok(db::set_item(&self.conn, SCHEDULES_KEY, value)?)
    }
}

impl ScheduleStore for SqliteStore {
    fn read_all(&self) -> Result<Vec<Schedule>, StoreError> {
        let raw = db::get_item(&self.conn, SCHEDULES_KEY)?;
        decode(raw.as_deref())
    }

    fn write_all(&self, schedules: &[Schedule]) -> Result<(), StoreError> {
        let encoded = encode(schedules)?;
        db::set_item(&self.conn, SCHEDULES_KEY, &encoded)?;
        debug!(count = schedules.len(), "wrote schedule list");
        Ok(())
    }
}

/// In-memory store for tests. Counts writes and can be told to reject them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    raw: RefCell<Option<String>>,
    writes: Cell<usize>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_raw(raw: &str) -> Self {
        Self {
            raw: RefCell::new(Some(raw.to_string())),
            ..Self::default()
        }
    }

    pub fn with_schedules(schedules: &[Schedule]) -> Result<Self, StoreError> {
        Ok(Self::from_raw(&encode(schedules)?))
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl ScheduleStore for MemoryStore {
    fn read_all(&self) -> Result<Vec<Schedule>, StoreError> {
        decode(self.raw.borrow().as_deref())
    }

    fn write_all(&self, schedules: &[Schedule]) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::WriteRejected("quota exceeded".to_string()));
        }
        let encoded = encode(schedules)?;
        *self.raw.borrow_mut() = Some(encoded);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
