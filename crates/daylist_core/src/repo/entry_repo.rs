//! Entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the only path to the `todos` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Entry::validate()` before any SQL mutation.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Every public operation issues exactly one logical statement.

use crate::db::schema::ensure_schema;
use crate::db::DbError;
use crate::model::entry::{
    format_date, format_time, parse_date, parse_time, Entry, EntryId, EntryKind,
    EntryValidationError,
};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    text,
    kind,
    date,
    time,
    amount
FROM todos";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entry persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntryValidationError),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<EntryValidationError> for RepoError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage adapter for entries.
pub trait EntryRepository {
    /// Ensures the backing table exists. Safe to call on every start.
    fn initialize(&mut self) -> RepoResult<()>;
    fn insert_task(
        &self,
        id: EntryId,
        text: &str,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> RepoResult<()>;
    fn insert_purchase(&self, id: EntryId, text: &str, amount: i64, date: NaiveDate)
        -> RepoResult<()>;
    /// Every row, `date DESC`, then `time ASC` with nulls first, then `id ASC`.
    fn list_all(&self) -> RepoResult<Vec<Entry>>;
    /// Returns whether a row was removed. A missing id is not an error.
    fn delete_by_id(&self, id: EntryId) -> RepoResult<bool>;
}

/// SQLite-backed entry repository holding one long-lived connection.
pub struct SqliteEntryRepository {
    conn: Connection,
}

impl SqliteEntryRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Underlying connection, for diagnostics and tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn insert_entry(&self, entry: &Entry) -> RepoResult<()> {
        entry.validate()?;

        self.conn.execute(
            "INSERT INTO todos (
                id,
                text,
                kind,
                date,
                time,
                amount
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                entry.id,
                entry.text.as_str(),
                entry.kind.as_str(),
                format_date(entry.date),
                entry.time.map(format_time),
                entry.amount,
            ],
        )?;

        Ok(())
    }
}

impl EntryRepository for SqliteEntryRepository {
    fn initialize(&mut self) -> RepoResult<()> {
        ensure_schema(&mut self.conn)?;
        Ok(())
    }

    fn insert_task(
        &self,
        id: EntryId,
        text: &str,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> RepoResult<()> {
        self.insert_entry(&Entry::task(id, text, date, time))
    }

    fn insert_purchase(
        &self,
        id: EntryId,
        text: &str,
        amount: i64,
        date: NaiveDate,
    ) -> RepoResult<()> {
        self.insert_entry(&Entry::purchase(id, text, amount, date))
    }

    fn list_all(&self) -> RepoResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ENTRY_SELECT_SQL}
             ORDER BY date DESC, time ASC NULLS FIRST, id ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        Ok(entries)
    }

    fn delete_by_id(&self, id: EntryId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM todos WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<Entry> {
    let id: EntryId = row.get("id")?;

    let kind_text: String = row.get("kind")?;
    let kind = EntryKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{kind_text}` in todos.kind (id={id})"))
    })?;

    let date_text: String = row.get("date")?;
    let date = parse_date(&date_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid date `{date_text}` in todos.date (id={id})"))
    })?;

    let time = match row.get::<_, Option<String>>("time")? {
        Some(value) => Some(parse_time(&value).map_err(|_| {
            RepoError::InvalidData(format!("invalid time `{value}` in todos.time (id={id})"))
        })?),
        None => None,
    };

    let entry = Entry {
        id,
        text: row.get("text")?,
        kind,
        date,
        time,
        amount: row.get("amount")?,
    };
    entry
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("{err} (id={id})")))?;
    Ok(entry)
}
