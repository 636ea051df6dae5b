//! Entry domain model.
//!
//! # Responsibility
//! - Define the single dated record shared by task and purchase views.
//! - Own the text codecs for `YYYY-MM-DD` dates and `HH:MM` times.
//!
//! # Invariants
//! - `id` is unique across the whole collection, regardless of date.
//! - Task entries never carry `amount`; purchase entries never carry `time`.
//! - Purchase amounts are present and non-negative.
//! - Entries are immutable once created; the only lifecycle step is deletion.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier of an entry, doubling as the storage primary key.
pub type EntryId = i64;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const DATE_TEXT_LEN: usize = 10;
const TIME_TEXT_LEN: usize = 5;

/// Entry category. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Something to do on a given day. Stored as `todo`.
    #[serde(rename = "todo")]
    Task,
    /// Money spent on a given day.
    #[serde(rename = "purchase")]
    Purchase,
}

impl EntryKind {
    /// Storage/wire label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "todo",
            Self::Purchase => "purchase",
        }
    }

    /// Parses a storage label back into a kind.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "todo" => Some(Self::Task),
            "purchase" => Some(Self::Purchase),
            _ => None,
        }
    }
}

/// One persisted task or purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    /// User supplied label. Must not be blank.
    pub text: String,
    pub kind: EntryKind,
    /// Partition key for the day view.
    pub date: NaiveDate,
    /// Clock time, only for tasks created on the current day.
    #[serde(default, with = "optional_clock_time")]
    pub time: Option<NaiveTime>,
    /// Only for purchases.
    #[serde(default)]
    pub amount: Option<i64>,
}

/// Validation errors for entry invariants and text codecs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    EmptyText,
    TaskWithAmount,
    PurchaseWithTime,
    MissingAmount,
    NegativeAmount(i64),
    InvalidDate(String),
    InvalidTime(String),
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "entry text cannot be empty"),
            Self::TaskWithAmount => write!(f, "task entries cannot carry an amount"),
            Self::PurchaseWithTime => write!(f, "purchase entries cannot carry a time"),
            Self::MissingAmount => write!(f, "purchase entries require an amount"),
            Self::NegativeAmount(amount) => {
                write!(f, "purchase amount must be non-negative, got {amount}")
            }
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
            Self::InvalidTime(value) => write!(f, "invalid time `{value}`; expected HH:MM"),
        }
    }
}

impl Error for EntryValidationError {}

impl Entry {
    /// Builds a task entry. `time` is `None` for days other than today.
    pub fn task(
        id: EntryId,
        text: impl Into<String>,
        date: NaiveDate,
        time: Option<NaiveTime>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            kind: EntryKind::Task,
            date,
            time,
            amount: None,
        }
    }

    /// Builds a purchase entry.
    pub fn purchase(id: EntryId, text: impl Into<String>, amount: i64, date: NaiveDate) -> Self {
        Self {
            id,
            text: text.into(),
            kind: EntryKind::Purchase,
            date,
            time: None,
            amount: Some(amount),
        }
    }

    /// Checks the kind-dependent field invariants.
    ///
    /// # Errors
    /// - `EmptyText` when `text` is blank after trimming.
    /// - `TaskWithAmount` / `PurchaseWithTime` on cross-kind fields.
    /// - `MissingAmount` / `NegativeAmount` for malformed purchases.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.text.trim().is_empty() {
            return Err(EntryValidationError::EmptyText);
        }

        match self.kind {
            EntryKind::Task => {
                if self.amount.is_some() {
                    return Err(EntryValidationError::TaskWithAmount);
                }
            }
            EntryKind::Purchase => {
                if self.time.is_some() {
                    return Err(EntryValidationError::PurchaseWithTime);
                }
                match self.amount {
                    None => return Err(EntryValidationError::MissingAmount),
                    Some(amount) if amount < 0 => {
                        return Err(EntryValidationError::NegativeAmount(amount));
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }

    /// Amount counted towards the day's expense total.
    pub fn expense(&self) -> i64 {
        match self.kind {
            EntryKind::Purchase => self.amount.unwrap_or(0),
            EntryKind::Task => 0,
        }
    }
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, EntryValidationError> {
    let trimmed = value.trim();
    if trimmed.len() != DATE_TEXT_LEN {
        return Err(EntryValidationError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| EntryValidationError::InvalidDate(value.to_string()))
}

/// Formats a clock time as `HH:MM`.
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Parses a strict `HH:MM` time.
pub fn parse_time(value: &str) -> Result<NaiveTime, EntryValidationError> {
    let trimmed = value.trim();
    if trimmed.len() != TIME_TEXT_LEN {
        return Err(EntryValidationError::InvalidTime(value.to_string()));
    }
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .map_err(|_| EntryValidationError::InvalidTime(value.to_string()))
}

/// Short day selector label, e.g. `1/05 (Fri)`.
pub fn format_day_label(date: NaiveDate) -> String {
    date.format("%-m/%d (%a)").to_string()
}

mod optional_clock_time {
    use super::{format_time, parse_time};
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_some(&format_time(*time)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|value| parse_time(&value).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        format_day_label, format_time, parse_date, parse_time, Entry, EntryKind,
        EntryValidationError,
    };
    use chrono::{NaiveDate, NaiveTime};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    #[test]
    fn kind_labels_match_storage_values() {
        assert_eq!(EntryKind::Task.as_str(), "todo");
        assert_eq!(EntryKind::Purchase.as_str(), "purchase");
        assert_eq!(EntryKind::parse("todo"), Some(EntryKind::Task));
        assert_eq!(EntryKind::parse("task"), None);
    }

    #[test]
    fn parse_date_rejects_unpadded_and_garbage() {
        assert_eq!(parse_date("2024-01-05").unwrap(), day());
        assert!(matches!(
            parse_date("2024-1-5"),
            Err(EntryValidationError::InvalidDate(_))
        ));
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn time_codec_uses_hours_and_minutes() {
        let time = NaiveTime::from_hms_opt(9, 5, 59).unwrap();
        assert_eq!(format_time(time), "09:05");
        assert_eq!(
            parse_time("09:05").unwrap(),
            NaiveTime::from_hms_opt(9, 5, 0).unwrap()
        );
        assert!(parse_time("9:05:00").is_err());
        assert!(parse_time("24:00").is_err());
    }

    #[test]
    fn validate_enforces_kind_specific_fields() {
        assert!(Entry::task(1, "read", day(), None).validate().is_ok());
        assert!(Entry::purchase(2, "coffee", 0, day()).validate().is_ok());

        let mut task = Entry::task(3, "read", day(), None);
        task.amount = Some(10);
        assert_eq!(task.validate(), Err(EntryValidationError::TaskWithAmount));

        let mut purchase = Entry::purchase(4, "coffee", 10, day());
        purchase.time = NaiveTime::from_hms_opt(8, 0, 0);
        assert_eq!(
            purchase.validate(),
            Err(EntryValidationError::PurchaseWithTime)
        );

        purchase.time = None;
        purchase.amount = None;
        assert_eq!(purchase.validate(), Err(EntryValidationError::MissingAmount));

        assert_eq!(
            Entry::purchase(5, "refund", -1, day()).validate(),
            Err(EntryValidationError::NegativeAmount(-1))
        );
        assert_eq!(
            Entry::task(6, "   ", day(), None).validate(),
            Err(EntryValidationError::EmptyText)
        );
    }

    #[test]
    fn expense_counts_only_purchases() {
        assert_eq!(Entry::purchase(1, "coffee", 4500, day()).expense(), 4500);
        assert_eq!(Entry::task(2, "walk", day(), None).expense(), 0);
    }

    #[test]
    fn day_label_is_short_month_day_weekday() {
        assert_eq!(format_day_label(day()), "1/05 (Fri)");
    }
}
