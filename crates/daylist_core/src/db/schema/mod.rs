//! Schema bootstrap for the entry table.
//!
//! # Responsibility
//! - Create the `todos` table when it does not exist yet.
//! - Refuse to touch databases written by a newer schema.
//!
//! # Invariants
//! - Bootstrap is idempotent; running it on every start never drops rows.
//! - Applied schema version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

/// Schema version written by this binary.
pub const SCHEMA_VERSION: u32 = 1;

const INIT_SQL: &str = include_str!("0001_init.sql");

/// Ensures the entry table exists on the provided connection.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file was written by a newer
///   schema.
/// - `DbError::Sqlite` for any store-level failure.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    let started_at = Instant::now();

    match apply_schema(conn) {
        Ok(()) => {
            info!(
                "event=schema_init module=db status=ok version={} duration_ms={}",
                SCHEMA_VERSION,
                started_at.elapsed().as_millis()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=schema_init module=db status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Reads `PRAGMA user_version`.
pub fn current_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn apply_schema(conn: &mut Connection) -> DbResult<()> {
    let version = current_version(conn)?;
    if version > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: version,
            latest_supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    tx.execute_batch(INIT_SQL)?;
    if version < SCHEMA_VERSION {
        tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    }
    tx.commit()?;
    Ok(())
}
