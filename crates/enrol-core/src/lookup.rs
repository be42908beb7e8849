//! Existence-service responses and their normalisation into a
//! [`PersonFragment`].
//!
//! The service has shipped several payload shapes over time. Each canonical
//! field is read from an ordered list of candidate keys (see [`keys`]); the
//! first key holding a usable value wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
  normalize::{display_date, first_flag, first_present, strip_non_digits},
  person::{Gender, Membership, PersonFragment},
};

/// Candidate source keys per canonical field, highest priority first.
pub mod keys {
  pub const IDENTIFIER: &[&str] = &["aadhaar_number", "aadhaar", "adhaarNumber"];
  pub const FULL_NAME: &[&str] = &["full_name", "fullName", "fullname", "name"];
  pub const DATE_OF_BIRTH: &[&str] = &["dob", "date_of_birth", "dateOfBirth"];
  pub const GENDER: &[&str] = &["gender"];
  pub const MOBILE: &[&str] = &["mobile_number", "mobile", "mobileNumber"];
  pub const EDUCATION: &[&str] = &["education"];
  pub const PROFESSION: &[&str] = &["profession"];
  pub const RELIGION: &[&str] = &["religion"];
  pub const RESERVATION: &[&str] = &["reservation", "reservation_category"];
  pub const CASTE: &[&str] = &["caste"];
  pub const MEMBERSHIP: &[&str] = &["membership", "is_member"];
  pub const MEMBERSHIP_ID: &[&str] = &["membership_id", "membershipId"];
  pub const REGISTERED: &[&str] =
    &["is_registered", "already_registered", "registered"];
}

// ─── Wire shape ──────────────────────────────────────────────────────────────

/// Body returned by `GET /person/exists/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExistenceResponse {
  #[serde(default)]
  pub exists: bool,
  #[serde(default, alias = "person", alias = "record")]
  pub member: Option<Value>,
}

// ─── LookupResult ────────────────────────────────────────────────────────────

/// The outcome of one existence query. Folded into the session once, then
/// discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LookupResult {
  pub exists:             bool,
  pub already_registered: bool,
  pub record:             Option<PersonFragment>,
}

impl From<ExistenceResponse> for LookupResult {
  fn from(response: ExistenceResponse) -> Self {
    let record = response
      .exists
      .then_some(response.member)
      .flatten()
      .and_then(|v| v.as_object().map(normalize_person));
    Self {
      exists: response.exists,
      already_registered: record.as_ref().is_some_and(|r| r.registered),
      record,
    }
  }
}

/// Map a raw person payload onto canonical fields.
pub fn normalize_person(object: &Map<String, Value>) -> PersonFragment {
  let text = |candidates: &[&str]| first_present(object, candidates);
  PersonFragment {
    identifier:           text(keys::IDENTIFIER).map(|s| strip_non_digits(&s)),
    full_name:            text(keys::FULL_NAME),
    date_of_birth:        text(keys::DATE_OF_BIRTH).map(|s| display_date(&s)),
    gender:               text(keys::GENDER).and_then(|s| Gender::from_loose(&s)),
    mobile_number:        text(keys::MOBILE),
    education:            text(keys::EDUCATION),
    profession:           text(keys::PROFESSION),
    religion:             text(keys::RELIGION),
    reservation_category: text(keys::RESERVATION),
    caste:                text(keys::CASTE),
    membership:           text(keys::MEMBERSHIP)
      .map(|s| Membership::from_loose(&s))
      .unwrap_or_default(),
    membership_id:        text(keys::MEMBERSHIP_ID),
    registered:           first_flag(object, keys::REGISTERED).unwrap_or(false),
  }
}
