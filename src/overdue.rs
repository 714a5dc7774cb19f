use crate::models::{text_field, Record, StatusValue};
use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};

/// Upstream marks "no due date" with a far-future year.
pub const SENTINEL_YEAR: i32 = 5000;
/// Due dates before this year are legacy data, not actionable.
pub const ANCIENT_YEAR: i32 = 2018;
/// Orders overdue for longer than this are no longer meaningfully overdue.
pub const STALE_OVERDUE_DAYS: i64 = 730;
const SECONDS_PER_DAY: i64 = 86_400;

const DATE_TIME_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d"];

/// Parses the date shapes the upstream API emits. Returns `None` instead of failing.
pub fn parse_due_date(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_local());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|format| {
                NaiveDate::parse_from_str(trimmed, format)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
        })
}

pub fn is_sentinel(date: &NaiveDateTime) -> bool {
    date.year() >= SENTINEL_YEAR
}

pub fn resolve_as_of(as_of: Option<NaiveDateTime>) -> NaiveDateTime {
    as_of.unwrap_or_else(|| Local::now().naive_local())
}

/// Whole days `due_date` lies in the past relative to `as_of`, floored. Negative when
/// not yet due, so half a day ahead is -1.
pub fn days_overdue(due_date: &str, as_of: Option<NaiveDateTime>) -> Option<i64> {
    let due = parse_due_date(due_date)?;
    if is_sentinel(&due) {
        return None;
    }
    Some(floored_days(resolve_as_of(as_of), due))
}

fn floored_days(as_of: NaiveDateTime, due: NaiveDateTime) -> i64 {
    (as_of - due).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// True when `due_date` is at least `threshold_days` floored days behind `as_of`.
/// Unparsable and sentinel dates fail closed.
pub fn is_overdue(due_date: &str, as_of: Option<NaiveDateTime>, threshold_days: i64) -> bool {
    days_overdue(due_date, as_of).is_some_and(|days| days >= threshold_days)
}

/// Overdue check over a whole record: closed orders, legacy dates and long-stale
/// orders never count.
pub fn is_actionable_overdue(
    record: &Record,
    date_field: &str,
    as_of: Option<NaiveDateTime>,
    threshold_days: i64,
) -> bool {
    if StatusValue::of(record).is_some_and(|status| status.is_closed()) {
        return false;
    }
    let Some(raw) = text_field(record, date_field) else {
        return false;
    };
    let Some(due) = parse_due_date(&raw) else {
        return false;
    };
    if due.year() < ANCIENT_YEAR {
        return false;
    }
    match days_overdue(&raw, as_of) {
        Some(days) => days <= STALE_OVERDUE_DAYS && is_overdue(&raw, as_of, threshold_days),
        None => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Critical,
    Urgent,
    Overdue,
}

impl Urgency {
    pub fn from_days(days: i64) -> Self {
        if days > 7 {
            Self::Critical
        } else if days > 3 {
            Self::Urgent
        } else {
            Self::Overdue
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Urgent => "URGENT",
            Self::Overdue => "OVERDUE",
        }
    }
}
