//! Host-facing API for the Flutter UI.
//!
//! # Responsibility
//! - Own the single process-wide `AppStore` instance.
//! - Expose the presentation intents (load, add, delete, navigate, read).
//! - Turn store errors into plain response envelopes.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - A failed intent leaves the visible state unchanged; the host only sees
//!   `ok = false` and a message.

use daylist_core::db::open_db;
use daylist_core::{
    core_version as core_version_inner, format_date, format_day_label, format_time,
    init_logging as init_logging_inner, parse_date, ping as ping_inner, AppStore, DayView,
    Entry, SqliteEntryRepository, StoreResult, SystemClock,
};
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

type HostStore = AppStore<SqliteEntryRepository, SystemClock>;

struct OpenStore {
    db_path: PathBuf,
    store: HostStore,
}

static STORE: Mutex<Option<OpenStore>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Core crate version.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory for rolling logs.
///
/// Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One entry as shown by the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryItem {
    pub id: i64,
    pub text: String,
    /// `todo` or `purchase`.
    pub kind: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`, tasks only.
    pub time: Option<String>,
    /// Purchases only.
    pub amount: Option<i64>,
}

/// Render state for the selected day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayViewResponse {
    /// Selected date as `YYYY-MM-DD`; empty when the store is not open.
    pub date: String,
    /// Day selector label, e.g. `1/05 (Fri)`.
    pub label: String,
    pub items: Vec<EntryItem>,
    pub total_expense: i64,
    pub message: String,
}

/// Result envelope for one intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreActionResponse {
    pub ok: bool,
    /// Created entry id for add intents.
    pub entry_id: Option<i64>,
    pub message: String,
}

impl StoreActionResponse {
    fn success(message: impl Into<String>, entry_id: Option<i64>) -> Self {
        Self {
            ok: true,
            entry_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            entry_id: None,
            message: message.into(),
        }
    }
}

/// Opens the entry database at `db_path` and loads every entry.
///
/// Idempotent for the same path; a different path is rejected. When the
/// initial load fails the store still opens with an empty collection.
#[flutter_rust_bridge::frb(sync)]
pub fn open_store(db_path: String) -> StoreActionResponse {
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return StoreActionResponse::failure("open_store failed: db_path cannot be empty");
    }
    let requested = PathBuf::from(trimmed);

    let mut guard = lock_store();

    if let Some(open) = guard.as_ref() {
        if open.db_path == requested {
            return StoreActionResponse::success("Store already open.", None);
        }
        return StoreActionResponse::failure(format!(
            "open_store failed: store already open at `{}`",
            open.db_path.display()
        ));
    }

    let (store, message) = match build_store(&requested) {
        Ok(built) => built,
        Err(err) => return StoreActionResponse::failure(format!("open_store failed: {err}")),
    };
    *guard = Some(OpenStore {
        db_path: requested,
        store,
    });
    StoreActionResponse::success(message, None)
}

/// Reloads every entry from storage.
#[flutter_rust_bridge::frb(sync)]
pub fn load_all() -> StoreActionResponse {
    action("load_all", |store| {
        store.load().map(|count| format!("Loaded {count} entries."))
    })
}

/// Adds a task on the selected date.
#[flutter_rust_bridge::frb(sync)]
pub fn add_task(text: String) -> StoreActionResponse {
    created("add_task", "Task added.", |store| store.add_task(&text))
}

/// Adds a purchase on the selected date.
#[flutter_rust_bridge::frb(sync)]
pub fn add_purchase(text: String, amount: i64) -> StoreActionResponse {
    created("add_purchase", "Purchase added.", |store| {
        store.add_purchase(&text, amount)
    })
}

/// Deletes one entry by id. Unknown ids succeed without changes.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_entry(id: i64) -> StoreActionResponse {
    action("delete_entry", |store| {
        store.delete_entry(id).map(|removed| {
            if removed {
                "Entry deleted.".to_string()
            } else {
                "Entry not found.".to_string()
            }
        })
    })
}

/// Selects a `YYYY-MM-DD` date.
#[flutter_rust_bridge::frb(sync)]
pub fn set_selected_date(date: String) -> StoreActionResponse {
    action("set_selected_date", |store| {
        store
            .set_selected_date_str(&date)
            .map(|selected| format!("Selected {}.", format_date(selected)))
    })
}

/// Moves the selected date by `days` (negative goes back).
#[flutter_rust_bridge::frb(sync)]
pub fn shift_selected_date(days: i64) -> StoreActionResponse {
    action("shift_selected_date", |store| {
        let selected = store.shift_selected_date(days);
        Ok(format!("Selected {}.", format_date(selected)))
    })
}

/// Entries and expense total of the selected date.
#[flutter_rust_bridge::frb(sync)]
pub fn day_view() -> DayViewResponse {
    match with_store(|store| store.day_view()) {
        Ok(view) => to_day_view_response(view),
        Err(message) => DayViewResponse {
            date: String::new(),
            label: String::new(),
            items: Vec::new(),
            total_expense: 0,
            message: format!("day_view failed: {message}"),
        },
    }
}

/// Every entry held in memory, in collection order.
#[flutter_rust_bridge::frb(sync)]
pub fn list_all_entries() -> Vec<EntryItem> {
    with_store(|store| store.entries().iter().map(to_entry_item).collect())
        .unwrap_or_default()
}

/// Day selector label for a `YYYY-MM-DD` date; empty when malformed.
#[flutter_rust_bridge::frb(sync)]
pub fn day_label(date: String) -> String {
    parse_date(&date)
        .map(format_day_label)
        .unwrap_or_default()
}

fn build_store(db_path: &Path) -> Result<(HostStore, String), String> {
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let mut store = AppStore::new(SqliteEntryRepository::new(conn), SystemClock);
    let message = match store.load() {
        Ok(count) => format!("Store opened with {count} entries."),
        Err(err) => {
            warn!("event=store_open module=ffi status=degraded error={err}");
            format!("Store opened without stored entries: {err}")
        }
    };
    Ok((store, message))
}

// A panic while the lock was held cannot have left the store half-written:
// memory only changes after the adapter call returns.
fn lock_store() -> MutexGuard<'static, Option<OpenStore>> {
    STORE.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        warn!("event=store_lock module=ffi status=recovered reason=poisoned");
        STORE.clear_poison();
        poisoned.into_inner()
    })
}

fn with_store<T>(f: impl FnOnce(&mut HostStore) -> T) -> Result<T, String> {
    let mut guard = lock_store();
    match guard.as_mut() {
        Some(open) => Ok(f(&mut open.store)),
        None => Err("store is not open; call open_store first".to_string()),
    }
}

fn action(
    name: &str,
    f: impl FnOnce(&mut HostStore) -> StoreResult<String>,
) -> StoreActionResponse {
    match with_store(f) {
        Ok(Ok(message)) => StoreActionResponse::success(message, None),
        Ok(Err(err)) => StoreActionResponse::failure(format!("{name} failed: {err}")),
        Err(message) => StoreActionResponse::failure(format!("{name} failed: {message}")),
    }
}

fn created(
    name: &str,
    message: &str,
    f: impl FnOnce(&mut HostStore) -> StoreResult<Entry>,
) -> StoreActionResponse {
    match with_store(f) {
        Ok(Ok(entry)) => StoreActionResponse::success(message, Some(entry.id)),
        Ok(Err(err)) => StoreActionResponse::failure(format!("{name} failed: {err}")),
        Err(err) => StoreActionResponse::failure(format!("{name} failed: {err}")),
    }
}

fn to_day_view_response(view: DayView) -> DayViewResponse {
    DayViewResponse {
        date: format_date(view.date),
        label: format_day_label(view.date),
        message: format!("{} entries.", view.entries.len()),
        items: view.entries.iter().map(to_entry_item).collect(),
        total_expense: view.total_expense,
    }
}

fn to_entry_item(entry: &Entry) -> EntryItem {
    EntryItem {
        id: entry.id,
        text: entry.text.clone(),
        kind: entry.kind.as_str().to_string(),
        date: format_date(entry.date),
        time: entry.time.map(format_time),
        amount: entry.amount,
    }
}
