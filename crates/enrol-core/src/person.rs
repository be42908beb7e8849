//! The person record captured for each role on the form.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::normalize::{capitalize, truthy};

// ─── Role ────────────────────────────────────────────────────────────────────

/// Which person on the form a record, document or edit belongs to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
  Member,
  Nominee,
}

impl Role {
  pub const ALL: [Role; 2] = [Role::Member, Role::Nominee];

  /// Key prefix used for this role in the flat submission payload.
  pub fn payload_prefix(self) -> &'static str {
    match self {
      Role::Member => "",
      Role::Nominee => "nominee_",
    }
  }

  /// Stable slot for per-role tables.
  pub fn index(self) -> usize {
    match self {
      Role::Member => 0,
      Role::Nominee => 1,
    }
  }
}

// ─── Enumerated fields ───────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
pub enum Gender {
  Male,
  Female,
  #[strum(to_string = "Others", serialize = "Other")]
  #[serde(alias = "Other")]
  Others,
}

impl Gender {
  /// Capitalise a free-form gender string and map it onto the enum.
  /// Unrecognised values yield `None`.
  pub fn from_loose(raw: &str) -> Option<Self> {
    capitalize(raw).parse().ok()
  }
}

/// Whether the person already holds a party membership.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
pub enum Membership {
  Yes,
  #[default]
  No,
}

impl Membership {
  /// `yes`, `true` and `1` mean [`Membership::Yes`]; everything else is `No`.
  pub fn from_loose(raw: &str) -> Self {
    if truthy(raw) { Self::Yes } else { Self::No }
  }
}

// ─── PersonRecord ────────────────────────────────────────────────────────────

/// One human being registered on the form.
///
/// Empty strings mean "not filled in". The category/caste and
/// membership/membership-id pairs are private so their coupling can only be
/// changed through the setters below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonRecord {
  pub identifier:       String,
  pub full_name:        String,
  /// Day/month/year display form.
  pub date_of_birth:    String,
  pub gender:           Option<Gender>,
  pub mobile_number:    String,
  pub education:        String,
  pub profession:       String,
  pub religion:         String,
  reservation_category: String,
  caste:                String,
  membership:           Membership,
  membership_id:        String,
}

impl PersonRecord {
  pub fn reservation_category(&self) -> &str { &self.reservation_category }

  pub fn caste(&self) -> &str { &self.caste }

  pub fn membership(&self) -> Membership { self.membership }

  pub fn membership_id(&self) -> &str { &self.membership_id }

  /// Caste options depend on the category, so a new category clears caste.
  pub fn set_reservation_category(&mut self, category: impl Into<String>) {
    let category = category.into();
    if category != self.reservation_category {
      self.caste.clear();
    }
    self.reservation_category = category;
  }

  pub fn set_caste(&mut self, caste: impl Into<String>) {
    self.caste = caste.into();
  }

  /// Switching to [`Membership::No`] discards the membership id; switching
  /// back does not bring it back.
  pub fn set_membership(&mut self, membership: Membership) {
    if membership == Membership::No {
      self.membership_id.clear();
    }
    self.membership = membership;
  }

  /// Ignored unless the membership flag is `Yes`.
  pub fn set_membership_id(&mut self, id: impl Into<String>) {
    if self.membership == Membership::Yes {
      self.membership_id = id.into();
    }
  }
}

// ─── PersonFragment ──────────────────────────────────────────────────────────

/// A partial record as reported by the existence service, already normalised
/// to canonical field shapes. `None` means the service did not provide it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFragment {
  pub identifier:           Option<String>,
  pub full_name:            Option<String>,
  pub date_of_birth:        Option<String>,
  pub gender:               Option<Gender>,
  pub mobile_number:        Option<String>,
  pub education:            Option<String>,
  pub profession:           Option<String>,
  pub religion:             Option<String>,
  pub reservation_category: Option<String>,
  pub caste:                Option<String>,
  pub membership:           Membership,
  pub membership_id:        Option<String>,
  /// The record's own "already registered" marker.
  pub registered:           bool,
}
