//! Search and pagination over a dataset snapshot.
//!
//! Search is a case-insensitive substring match against the text form of every
//! field value; a record matches if any field does. Offset and limit are applied
//! after the search, in that order.

use super::types::DataQuery;
use crate::persistence::Record;

use serde_json::Value;
use std::borrow::Cow;

/// Result of applying a `DataQuery`.
#[derive(Debug)]
pub struct Page<'a> {
    pub records: Vec<&'a Record>,
    /// Number of records that matched the search, before pagination.
    pub filtered: usize,
}

pub fn apply<'a>(records: &'a [Record], query: &DataQuery) -> Page<'a> {
    let needle = query
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let matched: Vec<&Record> = match needle {
        Some(needle) => records
            .iter()
            .filter(|record| matches_search(record, &needle))
            .collect(),
        None => records.iter().collect(),
    };
    let filtered = matched.len();

    let offset = query
        .offset
        .as_deref()
        .and_then(parse_lenient_int)
        .map(|n| usize::try_from(n.max(0)).unwrap_or(usize::MAX))
        .unwrap_or(0);

    let limit = query
        .limit
        .as_deref()
        .and_then(parse_lenient_int)
        .filter(|n| *n >= 0)
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX));

    let page = matched.into_iter().skip(offset);
    let records = match limit {
        Some(limit) => page.take(limit).collect(),
        None => page.collect(),
    };

    Page { records, filtered }
}

/// `needle` must already be lowercase.
pub fn matches_search(record: &Record, needle: &str) -> bool {
    record
        .values()
        .any(|value| field_text(value).to_lowercase().contains(needle))
}

/// Text a field value is searched by.
///
/// Strings match on their content, everything else on its compact JSON text
/// (`42`, `true`, `null`, `["a","b"]`).
pub fn field_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Parses the leading integer of `raw`, the way browsers' `parseInt` does.
///
/// Leading whitespace and one sign are allowed, then digits; anything after the
/// digits is ignored (`"10px"` is 10). Returns `None` when there are no digits.
/// Values beyond `i64` saturate.
pub fn parse_lenient_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return None;
    }

    let magnitude: i64 = digits.parse().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
