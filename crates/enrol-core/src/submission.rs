//! Pre-submission validation and the flat payload sent to `POST
//! /person/submit`.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
  backend::BackendError,
  document::{DocumentKind, RoleAssets},
  normalize::{Identifier, strip_non_digits, wire_date},
  person::{Membership, PersonRecord, Role},
  session::FormSession,
};

// ─── Validation ──────────────────────────────────────────────────────────────

/// A condition that stops submission before the backend is contacted.
/// Shown to the user as a message; not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationBlock {
  #[error("member Aadhaar number must be 12 digits")]
  MissingIdentifier,

  #[error("this member is already registered")]
  AlreadyRegistered,

  #[error("{0} membership id is required when membership is Yes")]
  MissingMembershipId(Role),
}

/// Check the session in a fixed order and report the first block found.
pub fn validate(session: &FormSession) -> Result<(), ValidationBlock> {
  if Identifier::parse(&session.member.identifier).is_none() {
    return Err(ValidationBlock::MissingIdentifier);
  }
  if session.is_already_registered() {
    return Err(ValidationBlock::AlreadyRegistered);
  }
  for role in Role::ALL {
    let record = session.record(role);
    if record.membership() == Membership::Yes
      && record.membership_id().trim().is_empty()
    {
      return Err(ValidationBlock::MissingMembershipId(role));
    }
  }
  Ok(())
}

// ─── Payload ─────────────────────────────────────────────────────────────────

/// The flat JSON object the registration API expects: member keys bare,
/// nominee keys prefixed with `nominee_`, location keys bare.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubmissionPayload(Map<String, Value>);

impl SubmissionPayload {
  pub fn from_session(session: &FormSession) -> Self {
    let mut map = Map::new();
    for role in Role::ALL {
      let prefix = role.payload_prefix();
      for (key, value) in person_fields(session.record(role), session.assets(role)) {
        map.insert(format!("{prefix}{key}"), value);
      }
    }

    let location = &session.location;
    for (key, value) in [
      ("village", &location.village),
      ("constituency", &location.constituency),
      ("mandal", &location.mandal),
      ("panchayathi", &location.panchayathi),
      ("pincode", &location.pincode),
      ("ward_number", &location.ward),
    ] {
      map.insert(key.to_owned(), Value::String(value.clone()));
    }
    Self(map)
  }

  pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }

  pub fn as_map(&self) -> &Map<String, Value> { &self.0 }
}

fn person_fields(
  record: &PersonRecord,
  assets: &RoleAssets,
) -> [(&'static str, Value); 14] {
  let text = |s: &str| Value::String(s.to_owned());
  let optional = |s: Option<String>| s.map(Value::String).unwrap_or(Value::Null);
  [
    // Separators typed by the user are not part of the identifier.
    ("aadhaar_number", Value::String(strip_non_digits(&record.identifier))),
    ("full_name", text(&record.full_name)),
    ("dob", optional(wire_date(&record.date_of_birth))),
    ("gender", Value::String(record.gender.map(|g| g.to_string()).unwrap_or_default())),
    ("mobile_number", text(&record.mobile_number)),
    ("education", text(&record.education)),
    ("profession", text(&record.profession)),
    ("religion", text(&record.religion)),
    ("reservation", text(record.reservation_category())),
    ("caste", text(record.caste())),
    ("membership", Value::String(record.membership().to_string())),
    ("membership_id", text(record.membership_id())),
    ("aadhaar_image_url", optional(assets.get(DocumentKind::Aadhaar).remote_url.clone())),
    ("photo_url", optional(assets.get(DocumentKind::Photo).remote_url.clone())),
  ]
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What happened when the user pressed submit.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
  /// The backend accepted the registration; its response body is attached.
  Accepted(Value),
  /// Submission never left the client.
  Blocked(ValidationBlock),
}

/// The backend rejected the registration or could not be reached. Form state
/// is kept so the user can retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmissionError {
  pub status:  Option<u16>,
  pub message: String,
}

impl From<BackendError> for SubmissionError {
  fn from(err: BackendError) -> Self {
    match err {
      BackendError::Status { status, detail } => Self {
        status:  Some(status),
        message: detail.unwrap_or_else(|| format!("HTTP {status}")),
      },
      other => Self {
        status:  None,
        message: other.to_string(),
      },
    }
  }
}
