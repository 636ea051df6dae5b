//! Application state store.
//!
//! # Responsibility
//! - Hold the in-memory entry collection and the selected date.
//! - Route every mutation through the storage adapter before mirroring it.
//! - Project the day view (entries of the selected date + expense total).
//!
//! # Invariants
//! - Write-through: memory is only updated after the adapter succeeds.
//! - A failed mutation leaves memory untouched.
//! - Blank input is rejected before any persistence call.
//! - Entry ids are generated here and are never reused within a session.

use crate::model::entry::{
    format_time, parse_date, Entry, EntryId, EntryKind, EntryValidationError,
};
use crate::repo::entry_repo::{EntryRepository, RepoError};
use crate::service::clock::{Clock, SystemClock};
use chrono::{Days, NaiveDate, NaiveTime, Timelike};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by store intents. The store has already logged it.
#[derive(Debug)]
pub enum StoreError {
    /// Input rejected before reaching storage.
    Rejected(EntryValidationError),
    /// Storage adapter failure; memory was left unchanged.
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(err) => write!(f, "rejected: {err}"),
            Self::Repo(err) => write!(f, "persistence failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<EntryValidationError> for StoreError {
    fn from(value: EntryValidationError) -> Self {
        Self::Rejected(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Entries of one day plus the day's purchase total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayView {
    pub date: NaiveDate,
    /// Collection order is preserved.
    pub entries: Vec<Entry>,
    pub total_expense: i64,
}

/// Single in-memory source of truth for the presentation layer.
pub struct AppStore<R: EntryRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    entries: Vec<Entry>,
    selected_date: NaiveDate,
    last_id: EntryId,
}

impl<R: EntryRepository, C: Clock> AppStore<R, C> {
    /// Creates an empty store; the selected date starts at today.
    pub fn new(repo: R, clock: C) -> Self {
        let selected_date = clock.today();
        Self {
            repo,
            clock,
            entries: Vec::new(),
            selected_date,
            last_id: 0,
        }
    }

    /// Initializes storage and replaces memory with every stored entry.
    ///
    /// On failure memory is left as it was and the store stays usable.
    pub fn load(&mut self) -> StoreResult<usize> {
        let loaded = match self
            .repo
            .initialize()
            .and_then(|()| self.repo.list_all())
        {
            Ok(entries) => entries,
            Err(err) => {
                error!("event=store_load module=store status=error error={err}");
                return Err(err.into());
            }
        };

        if let Some(max_id) = loaded.iter().map(|entry| entry.id).max() {
            self.last_id = self.last_id.max(max_id);
        }
        self.entries = loaded;
        info!(
            "event=store_load module=store status=ok count={}",
            self.entries.len()
        );
        Ok(self.entries.len())
    }

    /// Adds a task on the selected date.
    ///
    /// `time` is stamped, to the minute, only when the selected date is today.
    pub fn add_task(&mut self, text: &str) -> StoreResult<Entry> {
        let text = non_blank(text, EntryKind::Task)?;
        let now = self.clock.now();
        let time = if self.selected_date == now.date() {
            NaiveTime::from_hms_opt(now.hour(), now.minute(), 0)
        } else {
            None
        };
        let entry = Entry::task(self.next_id(), text, self.selected_date, time);

        let result = self
            .repo
            .insert_task(entry.id, &entry.text, entry.date, entry.time);
        self.commit_insert(entry, result)
    }

    /// Adds a purchase on the selected date. Purchases never carry a time.
    pub fn add_purchase(&mut self, text: &str, amount: i64) -> StoreResult<Entry> {
        let text = non_blank(text, EntryKind::Purchase)?;
        if amount < 0 {
            debug!("event=entry_add module=store status=rejected kind=purchase reason=negative_amount");
            return Err(EntryValidationError::NegativeAmount(amount).into());
        }
        let entry = Entry::purchase(self.next_id(), text, amount, self.selected_date);

        let result = self
            .repo
            .insert_purchase(entry.id, &entry.text, amount, entry.date);
        self.commit_insert(entry, result)
    }

    /// Deletes an entry by id from storage, then from memory.
    ///
    /// Returns whether storage held the id. Unknown ids are not an error.
    pub fn delete_entry(&mut self, id: EntryId) -> StoreResult<bool> {
        match self.repo.delete_by_id(id) {
            Ok(removed) => {
                self.entries.retain(|entry| entry.id != id);
                info!("event=entry_delete module=store status=ok id={id} removed={removed}");
                Ok(removed)
            }
            Err(err) => {
                error!("event=entry_delete module=store status=error id={id} error={err}");
                Err(err.into())
            }
        }
    }

    pub fn set_selected_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    /// Parses `YYYY-MM-DD` and selects it. Malformed input changes nothing.
    pub fn set_selected_date_str(&mut self, value: &str) -> StoreResult<NaiveDate> {
        let date = parse_date(value)?;
        self.set_selected_date(date);
        Ok(date)
    }

    /// Moves the selected date by `days` (negative goes back).
    ///
    /// Stays put when the result would leave the supported calendar range.
    pub fn shift_selected_date(&mut self, days: i64) -> NaiveDate {
        let step = Days::new(days.unsigned_abs());
        let shifted = if days >= 0 {
            self.selected_date.checked_add_days(step)
        } else {
            self.selected_date.checked_sub_days(step)
        };
        match shifted {
            Some(date) => self.selected_date = date,
            None => warn!("event=date_shift module=store status=out_of_range days={days}"),
        }
        self.selected_date
    }

    pub fn select_previous_day(&mut self) -> NaiveDate {
        self.shift_selected_date(-1)
    }

    pub fn select_next_day(&mut self) -> NaiveDate {
        self.shift_selected_date(1)
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Full in-memory collection.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Day view for the selected date.
    pub fn day_view(&self) -> DayView {
        self.day_view_for(self.selected_date)
    }

    /// Day view for an arbitrary date.
    pub fn day_view_for(&self, date: NaiveDate) -> DayView {
        let entries = self
            .entries
            .iter()
            .filter(|entry| entry.date == date)
            .cloned()
            .collect::<Vec<_>>();
        // Saturates at i64::MAX; amounts are only bounded below.
        let total_expense = entries
            .iter()
            .fold(0i64, |total, entry| total.saturating_add(entry.expense()));
        DayView {
            date,
            entries,
            total_expense,
        }
    }

    fn next_id(&mut self) -> EntryId {
        let id = self
            .clock
            .epoch_millis()
            .max(self.last_id.saturating_add(1));
        self.last_id = id;
        id
    }

    fn commit_insert(
        &mut self,
        entry: Entry,
        result: Result<(), RepoError>,
    ) -> StoreResult<Entry> {
        let kind = entry.kind.as_str();
        match result {
            Ok(()) => {
                info!(
                    "event=entry_add module=store status=ok kind={} id={} date={} time={}",
                    kind,
                    entry.id,
                    entry.date,
                    entry.time.map(format_time).as_deref().unwrap_or("-")
                );
                self.entries.push(entry.clone());
                Ok(entry)
            }
            Err(err) => {
                error!(
                    "event=entry_add module=store status=error kind={} id={} error={}",
                    kind, entry.id, err
                );
                Err(err.into())
            }
        }
    }
}

fn non_blank(text: &str, kind: EntryKind) -> StoreResult<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        debug!(
            "event=entry_add module=store status=rejected kind={} reason=empty_text",
            kind.as_str()
        );
        return Err(EntryValidationError::EmptyText.into());
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{AppStore, StoreError};
    use crate::db::DbError;
    use crate::model::entry::{Entry, EntryId, EntryValidationError};
    use crate::repo::entry_repo::{EntryRepository, RepoError, RepoResult};
    use crate::service::clock::{Clock, FixedClock};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use std::cell::{Cell, RefCell};

    /// In-memory adapter whose writes can be switched to fail.
    #[derive(Default)]
    struct ScriptedRepo {
        rows: RefCell<Vec<Entry>>,
        fail_writes: Cell<bool>,
        fail_init: bool,
        write_calls: Cell<usize>,
    }

    impl ScriptedRepo {
        fn write(&self) -> RepoResult<()> {
            self.write_calls.set(self.write_calls.get() + 1);
            if self.fail_writes.get() {
                return Err(RepoError::Db(DbError::Sqlite(
                    rusqlite::Error::InvalidQuery,
                )));
            }
            Ok(())
        }
    }

    impl EntryRepository for &ScriptedRepo {
        fn initialize(&mut self) -> RepoResult<()> {
            if self.fail_init {
                return Err(RepoError::InvalidData("store unavailable".to_string()));
            }
            Ok(())
        }

        fn insert_task(
            &self,
            id: EntryId,
            text: &str,
            date: NaiveDate,
            time: Option<NaiveTime>,
        ) -> RepoResult<()> {
            self.write()?;
            self.rows.borrow_mut().push(Entry::task(id, text, date, time));
            Ok(())
        }

        fn insert_purchase(
            &self,
            id: EntryId,
            text: &str,
            amount: i64,
            date: NaiveDate,
        ) -> RepoResult<()> {
            self.write()?;
            self.rows
                .borrow_mut()
                .push(Entry::purchase(id, text, amount, date));
            Ok(())
        }

        fn list_all(&self) -> RepoResult<Vec<Entry>> {
            Ok(self.rows.borrow().clone())
        }

        fn delete_by_id(&self, id: EntryId) -> RepoResult<bool> {
            self.write()?;
            let mut rows = self.rows.borrow_mut();
            let before = rows.len();
            rows.retain(|entry| entry.id != id);
            Ok(rows.len() != before)
        }
    }

    fn clock() -> FixedClock {
        FixedClock::new(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(9, 0, 30)
                .unwrap(),
        )
    }

    #[test]
    fn failed_insert_leaves_memory_unchanged() {
        let repo = ScriptedRepo::default();
        let mut store = AppStore::new(&repo, clock());
        store.add_task("kept").unwrap();

        repo.fail_writes.set(true);
        let err = store.add_task("lost").unwrap_err();
        assert!(matches!(err, StoreError::Repo(_)));
        let err = store.add_purchase("lost", 10).unwrap_err();
        assert!(matches!(err, StoreError::Repo(_)));

        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.entries()[0].text, "kept");
    }

    #[test]
    fn failed_delete_keeps_entry_in_memory() {
        let repo = ScriptedRepo::default();
        let mut store = AppStore::new(&repo, clock());
        let entry = store.add_purchase("coffee", 4500).unwrap();

        repo.fail_writes.set(true);
        assert!(store.delete_entry(entry.id).is_err());
        assert_eq!(store.entries(), &[entry]);
    }

    #[test]
    fn blank_text_never_reaches_storage() {
        let repo = ScriptedRepo::default();
        let mut store = AppStore::new(&repo, clock());

        let err = store.add_task("   ").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected(EntryValidationError::EmptyText)
        ));
        assert!(store.add_purchase("", 100).is_err());
        assert!(store.add_purchase("refund", -5).is_err());

        assert_eq!(repo.write_calls.get(), 0);
        assert!(store.entries().is_empty());
    }

    #[test]
    fn load_failure_keeps_store_usable_with_empty_state() {
        let repo = ScriptedRepo {
            fail_init: true,
            ..ScriptedRepo::default()
        };
        let mut store = AppStore::new(&repo, clock());

        assert!(store.load().is_err());
        assert!(store.entries().is_empty());
        assert_eq!(store.selected_date(), clock_today());
    }

    #[test]
    fn ids_stay_unique_when_the_clock_does_not_advance() {
        let repo = ScriptedRepo::default();
        let mut store = AppStore::new(&repo, clock());

        let first = store.add_task("one").unwrap();
        let second = store.add_task("two").unwrap();
        let third = store.add_purchase("three", 1).unwrap();
        assert!(first.id < second.id);
        assert!(second.id < third.id);
    }

    #[test]
    fn task_time_is_stamped_only_for_today() {
        let repo = ScriptedRepo::default();
        let mut store = AppStore::new(&repo, clock());

        let today = store.add_task("today").unwrap();
        assert_eq!(today.time, NaiveTime::from_hms_opt(9, 0, 0));

        store.select_previous_day();
        let yesterday = store.add_task("yesterday").unwrap();
        assert_eq!(yesterday.time, None);
        assert_eq!(yesterday.date, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());

        store.select_next_day();
        let purchase = store.add_purchase("coffee", 4500).unwrap();
        assert_eq!(purchase.time, None);
    }

    #[test]
    fn malformed_date_keeps_selection() {
        let repo = ScriptedRepo::default();
        let mut store = AppStore::new(&repo, clock());

        assert!(store.set_selected_date_str("2024/01/02").is_err());
        assert_eq!(store.selected_date(), clock_today());

        let selected = store.set_selected_date_str("2024-03-01").unwrap();
        assert_eq!(store.selected_date(), selected);
    }

    #[test]
    fn shift_selected_date_is_clamped_at_calendar_bounds() {
        let repo = ScriptedRepo::default();
        let mut store = AppStore::new(&repo, clock());

        store.set_selected_date(NaiveDate::MAX);
        assert_eq!(store.select_next_day(), NaiveDate::MAX);
        assert_eq!(store.shift_selected_date(i64::MIN), NaiveDate::MAX);
        assert_eq!(
            store.shift_selected_date(-2),
            NaiveDate::MAX.pred_opt().unwrap().pred_opt().unwrap()
        );
    }

    fn clock_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    /// Returns the queued instants in order, then repeats the last one.
    struct SteppingClock {
        instants: RefCell<Vec<NaiveDateTime>>,
    }

    impl Clock for SteppingClock {
        fn now(&self) -> NaiveDateTime {
            let mut instants = self.instants.borrow_mut();
            if instants.len() > 1 {
                instants.remove(0)
            } else {
                instants[0]
            }
        }

        fn epoch_millis(&self) -> i64 {
            0
        }
    }

    #[test]
    fn task_added_at_midnight_reads_date_and_time_together() {
        let before = clock_today().and_hms_opt(23, 59, 59).unwrap();
        let after = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let clock = SteppingClock {
            instants: RefCell::new(vec![before, before, after]),
        };
        let repo = ScriptedRepo::default();
        let mut store = AppStore::new(&repo, clock);

        let entry = store.add_task("late").unwrap();
        assert_eq!(entry.date, clock_today());
        assert_eq!(entry.time, NaiveTime::from_hms_opt(23, 59, 0));

        let next = store.add_task("after midnight").unwrap();
        assert_eq!(next.date, clock_today());
        assert_eq!(next.time, None);
    }
}
