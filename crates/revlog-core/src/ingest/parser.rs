//! Single-record parser.
//!
//! Turns one comma-separated revlog line into a [`ReviewEvent`]:
//! `card_id, review_time (epoch ms), review_rating, review_state`.

use crate::error::{ErrorCode, RevlogError, RevlogResult};
use crate::time::DayBoundary;
use crate::types::{Grade, Phase, ReviewEvent};

/// Number of columns a record must provide.
pub const REQUIRED_FIELDS: usize = 4;

/// Split a record into trimmed fields.
///
/// Double-quoted fields may contain commas; `""` inside quotes is a literal
/// quote. Whitespace outside the quotes is dropped.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn parse_integer(line: u64, name: &str, raw: &str) -> RevlogResult<i64> {
    raw.parse::<i64>().map_err(|_| {
        RevlogError::malformed(
            line,
            ErrorCode::RecInvalidNumber,
            format!("{name} is not an integer: '{raw}'"),
        )
    })
}

/// Parse one record. `line` is the 1-based line number used in errors.
pub fn parse_record(line: u64, record: &str, boundary: &DayBoundary) -> RevlogResult<ReviewEvent> {
    let fields = split_fields(record);
    if fields.len() < REQUIRED_FIELDS {
        return Err(RevlogError::malformed(
            line,
            ErrorCode::RecMissingField,
            format!("expected {REQUIRED_FIELDS} fields, found {}", fields.len()),
        ));
    }

    let entity_id = &fields[0];
    if entity_id.is_empty() {
        return Err(RevlogError::malformed(
            line,
            ErrorCode::RecMissingField,
            "card id is empty",
        ));
    }

    let timestamp_ms = parse_integer(line, "review_time", &fields[1])?;
    let rating = parse_integer(line, "review_rating", &fields[2])?;
    let state = parse_integer(line, "review_state", &fields[3])?;

    let grade = Grade::from_rating(rating).ok_or_else(|| {
        RevlogError::malformed(
            line,
            ErrorCode::RecOutOfRange,
            format!("review_rating {rating} is outside 1-4"),
        )
    })?;
    let phase = Phase::from_code(state).ok_or_else(|| {
        RevlogError::malformed(
            line,
            ErrorCode::RecOutOfRange,
            format!("review_state {state} is outside 0-3"),
        )
    })?;

    Ok(ReviewEvent {
        entity_id: entity_id.clone(),
        logical_day: boundary.logical_day(timestamp_ms),
        grade,
        phase,
    })
}
