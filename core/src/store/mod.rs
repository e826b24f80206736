//! SQLite persistence layer for the engine's collaborators.
//!
//! RULE: Only the store talks to the database.
//! The engine never touches it; services load inputs from the store,
//! run the engine on plain values, and hand the output back here.

mod report;
mod template;

use crate::error::{DistResult, DistError};
use crate::types::Amount;
use rusqlite::Connection;
use std::str::FromStr;

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &str) -> DistResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DistResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DistResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_templates.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_reports.sql"))?;
        Ok(())
    }
}

/// Parse a decimal stored as TEXT.
fn parse_amount(text: &str) -> DistResult<Amount> {
    Amount::from_str(text)
        .map_err(|e| DistError::Other(anyhow::anyhow!("bad stored amount '{text}': {e}")))
}
