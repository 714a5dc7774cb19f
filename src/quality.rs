use crate::models::{text_field, Record};
use crate::overdue::{is_sentinel, parse_due_date};
use once_cell::sync::Lazy;
use regex::Regex;

static TEST_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)test|template|demo|sample|example|sandbox").expect("valid test marker regex")
});

const MARKER_FIELDS: &[&str] = &["orderNo", "customerOrderNo", "description", "name"];

const PLACEHOLDER_CUSTOMERS: &[&str] = &["none", "n/a", "test", "template"];

/// Decides whether a record is a real order rather than a template or test artifact.
/// Anything that cannot be evaluated is accepted.
pub fn is_quality(record: &Record) -> bool {
    if has_sentinel_due_date(record) {
        return false;
    }

    if MARKER_FIELDS
        .iter()
        .filter_map(|field| text_field(record, field))
        .any(|value| TEST_MARKERS.is_match(&value))
    {
        return false;
    }

    if let Some(customer) = text_field(record, "customerName") {
        let normalized = customer.trim().to_ascii_lowercase();
        if normalized.is_empty() || PLACEHOLDER_CUSTOMERS.contains(&normalized.as_str()) {
            return false;
        }
    }

    true
}

fn has_sentinel_due_date(record: &Record) -> bool {
    text_field(record, "dueDate")
        .and_then(|raw| parse_due_date(&raw))
        .is_some_and(|due| is_sentinel(&due))
}

pub fn filter_quality(records: Vec<Record>) -> Vec<Record> {
    records.into_iter().filter(is_quality).collect()
}
