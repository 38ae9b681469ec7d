// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Free-form shift time range parsing.
//!
//! Staff type ranges such as `10-18`, `930-1730` or `10:00〜18:00`, often
//! several per line. Parsing is lenient about glyphs (full-width digits,
//! alternate colons, dashes and waves) but strict about values.
//!
//! ## Invariants
//!
//! - Every returned span satisfies `start < end` by minute of day
//! - `24:00` is accepted as an end time only
//! - Spans never cross midnight
//! - Returned spans are unique and sorted by `(start, end)`

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Minutes in a day; the value of the `24:00` end sentinel.
const END_OF_DAY_MINUTES: u16 = 1440;

/// A time of day with minute precision, `00:00` through `24:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    minutes: u16,
}

impl TimeOfDay {
    /// Creates a time from an hour and minute.
    ///
    /// Returns `None` unless the value is within `00:00..=23:59` or is
    /// exactly `24:00`.
    #[must_use]
    pub const fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if minute > 59 || hour > 24 || (hour == 24 && minute != 0) {
            return None;
        }
        Some(Self {
            minutes: hour * 60 + minute,
        })
    }

    /// Minutes since midnight (`24:00` is 1440).
    #[must_use]
    pub const fn minutes(&self) -> u16 {
        self.minutes
    }

    /// The hour component.
    #[must_use]
    pub const fn hour(&self) -> u16 {
        self.minutes / 60
    }

    /// The minute component.
    #[must_use]
    pub const fn minute(&self) -> u16 {
        self.minutes % 60
    }

    /// Whether this is the `24:00` end-of-day sentinel.
    #[must_use]
    pub const fn is_end_of_day(&self) -> bool {
        self.minutes == END_OF_DAY_MINUTES
    }

    /// Parses a strict `HH:MM` value as stored on shift entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not two-digit hour, colon, two-digit
    /// minute, or is out of range.
    pub fn parse_hhmm(value: &str) -> Result<Self, DomainError> {
        let bytes: &[u8] = value.as_bytes();
        let well_formed: bool = bytes.len() == 5
            && bytes[2] == b':'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 2 || b.is_ascii_digit());
        if !well_formed {
            return Err(DomainError::InvalidTime(value.to_string()));
        }
        let hour: u16 = value[..2]
            .parse()
            .map_err(|_| DomainError::InvalidTime(value.to_string()))?;
        let minute: u16 = value[3..]
            .parse()
            .map_err(|_| DomainError::InvalidTime(value.to_string()))?;
        Self::from_hm(hour, minute).ok_or_else(|| DomainError::InvalidTime(value.to_string()))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hhmm(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// A same-day span with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSpan {
    /// Inclusive start.
    pub start: TimeOfDay,
    /// Exclusive end.
    pub end: TimeOfDay,
}

impl TimeSpan {
    /// Creates a span, rejecting empty, inverted, or `24:00`-start spans.
    ///
    /// # Errors
    ///
    /// Returns an error if `start >= end` or `start` is `24:00`.
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, DomainError> {
        if start >= end || start.is_end_of_day() {
            return Err(DomainError::InvalidTimeRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Length in minutes.
    #[must_use]
    pub const fn duration_minutes(&self) -> u16 {
        self.end.minutes() - self.start.minutes()
    }
}

impl std::fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// The outcome of parsing free-form span input.
///
/// Any error should block submission; warnings should not.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanParseResult {
    /// Unique spans sorted by `(start, end)`.
    pub spans: Vec<TimeSpan>,
    /// One message per rejected segment.
    pub errors: Vec<String>,
    /// One message per tolerated oddity (duplicates).
    pub warnings: Vec<String>,
    /// The surviving spans formatted as `HH:MM-HH:MM`, comma separated.
    pub normalized_text: String,
}

impl SpanParseResult {
    /// Whether the input contains errors that block submission.
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Parses free-form text into normalized spans.
///
/// Segments are separated by newlines, `,`, `;` and their full-width
/// equivalents. Each segment must be `start-end` where each side is either
/// a compact code (`9`, `930`, `0930`) or `H:MM`.
///
/// # Example
///
/// ```text
/// "10-18, 19:00〜22:30" => 10:00-18:00, 19:00-22:30
/// "10-18, 10-18"        => 10:00-18:00 plus a duplicate warning
/// "18-10"               => error (end before start)
/// ```
#[must_use]
pub fn parse_span_input(text: &str) -> SpanParseResult {
    let mut result: SpanParseResult = SpanParseResult::default();
    let mut seen: HashSet<TimeSpan> = HashSet::new();

    for raw_segment in split_segments(text) {
        let segment: String = normalize_segment(&raw_segment);
        if segment.is_empty() {
            continue;
        }

        match parse_segment(&segment) {
            Ok(span) => {
                if seen.insert(span) {
                    result.spans.push(span);
                } else {
                    result
                        .warnings
                        .push(format!("\"{raw_segment}\": duplicate of {span}, ignored"));
                }
            }
            Err(reason) => result.errors.push(format!("\"{raw_segment}\": {reason}")),
        }
    }

    result.spans.sort_unstable();
    result.normalized_text = result
        .spans
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join(", ");
    result
}

fn is_separator(c: char) -> bool {
    matches!(c, ',' | ';' | '、' | '，' | '；' | '\n' | '\r')
}

fn split_segments(text: &str) -> Vec<String> {
    text.split(is_separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_char(c: char) -> Option<char> {
    match c {
        '：' | '∶' | '﹕' => Some(':'),
        '~' | '〜' | '～' | '－' | '‐' | '‑' | '‒' | '–' | '—' | '−' | 'ー' => Some('-'),
        '０'..='９' => char::from_u32(u32::from(c) - u32::from('０') + u32::from('0')),
        c if c.is_whitespace() => None,
        c => Some(c),
    }
}

fn normalize_segment(segment: &str) -> String {
    let mut out: String = String::with_capacity(segment.len());
    for c in segment.chars().filter_map(normalize_char) {
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out
}

fn parse_segment(segment: &str) -> Result<TimeSpan, String> {
    let tokens: Vec<&str> = segment.split('-').collect();
    if tokens.len() != 2 || tokens.iter().any(|t| t.is_empty()) {
        return Err(String::from("expected a start and an end separated by '-'"));
    }

    let start: TimeOfDay = parse_time_token(tokens[0], false)?;
    let end: TimeOfDay = parse_time_token(tokens[1], true)?;

    if start >= end {
        return Err(format!("end {end} is not after start {start}"));
    }
    Ok(TimeSpan { start, end })
}

/// Parses one side of a range.
///
/// - `H` / `HH`: hour only
/// - `HMM`: one-digit hour, two-digit minute
/// - `HHMM`: two-digit hour, two-digit minute
/// - `H:MM` / `HH:MM`: explicit separator
fn parse_time_token(token: &str, is_end: bool) -> Result<TimeOfDay, String> {
    let (hour_digits, minute_digits): (&str, &str) = match token.split_once(':') {
        Some((h, m)) if (1..=2).contains(&h.len()) && m.len() == 2 => (h, m),
        Some(_) => return Err(format!("'{token}' is not a valid time")),
        None => match token.len() {
            1 | 2 => (token, "00"),
            3 => token.split_at(1),
            4 => token.split_at(2),
            _ => return Err(format!("'{token}' is not a valid time")),
        },
    };

    if !hour_digits.bytes().chain(minute_digits.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(format!("'{token}' is not a valid time"));
    }

    let hour: u16 = hour_digits
        .parse()
        .map_err(|_| format!("'{token}' is not a valid time"))?;
    let minute: u16 = minute_digits
        .parse()
        .map_err(|_| format!("'{token}' is not a valid time"))?;

    if minute > 59 {
        return Err(format!("minute {minute} is out of range (0-59)"));
    }
    if is_end && hour == 24 && minute == 0 {
        return Ok(TimeOfDay {
            minutes: END_OF_DAY_MINUTES,
        });
    }
    if hour > 23 {
        return Err(format!("hour {hour} is out of range (0-23)"));
    }

    TimeOfDay::from_hm(hour, minute).ok_or_else(|| format!("'{token}' is not a valid time"))
}
