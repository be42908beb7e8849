//! Normalisation helpers shared by the lookup, OCR and submission paths.
//!
//! Remote services disagree on key names and value formats. Everything that
//! turns a loosely-shaped value into a canonical one lives here.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `DD/MM/YYYY`, the form shown to and typed by the user.
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// `YYYY-MM-DD`, the form the registration API stores.
pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Remove every character that is not an ASCII digit.
pub fn strip_non_digits(raw: &str) -> String {
  raw.chars().filter(char::is_ascii_digit).collect()
}

/// A 12-digit national identity number, the canonical key of a person.
///
/// Only constructible through [`Identifier::parse`], so holding one means the
/// guard has already passed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
  pub const LEN: usize = 12;

  /// Strip separators and accept the result only if exactly
  /// [`Identifier::LEN`] digits remain.
  pub fn parse(raw: &str) -> Option<Self> {
    let digits = strip_non_digits(raw);
    (digits.len() == Self::LEN).then_some(Self(digits))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Identifier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Text ────────────────────────────────────────────────────────────────────

/// Upper-case the first character and lower-case the rest (`"fEMALE"` →
/// `"Female"`).
pub fn capitalize(raw: &str) -> String {
  let mut chars = raw.trim().chars();
  match chars.next() {
    Some(first) => first
      .to_uppercase()
      .chain(chars.flat_map(char::to_lowercase))
      .collect(),
    None => String::new(),
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Convert a year-month-day date to the day/month/year display form.
/// Anything else is passed through unchanged.
pub fn display_date(raw: &str) -> String {
  let trimmed = raw.trim();
  match NaiveDate::parse_from_str(trimmed, WIRE_DATE_FORMAT) {
    Ok(date) => date.format(DISPLAY_DATE_FORMAT).to_string(),
    Err(_) => trimmed.to_owned(),
  }
}

/// Convert a day/month/year display date to year-month-day for transmission.
/// Empty input yields `None`; unparseable input is passed through.
pub fn wire_date(display: &str) -> Option<String> {
  let trimmed = display.trim();
  if trimmed.is_empty() {
    return None;
  }
  Some(match NaiveDate::parse_from_str(trimmed, DISPLAY_DATE_FORMAT) {
    Ok(date) => date.format(WIRE_DATE_FORMAT).to_string(),
    Err(_) => trimmed.to_owned(),
  })
}

// ─── Key candidates ──────────────────────────────────────────────────────────

/// The value of the first key in `candidates` that holds something usable.
///
/// Strings are trimmed and skipped when blank; numbers and booleans are
/// rendered as text. `null`, arrays and objects are skipped.
pub fn first_present(
  object: &Map<String, Value>,
  candidates: &[&str],
) -> Option<String> {
  candidates.iter().find_map(|key| match object.get(*key)? {
    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  })
}

/// Read a loosely-typed boolean: JSON booleans, non-zero numbers, and the
/// strings `true`/`yes`/`1` (any case).
pub fn first_flag(
  object: &Map<String, Value>,
  candidates: &[&str],
) -> Option<bool> {
  candidates.iter().find_map(|key| match object.get(*key)? {
    Value::Bool(b) => Some(*b),
    Value::Number(n) => Some(n.as_f64().is_some_and(|v| v != 0.0)),
    Value::String(s) if !s.trim().is_empty() => Some(truthy(s)),
    _ => None,
  })
}

pub(crate) fn truthy(raw: &str) -> bool {
  matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
}
