//! The state of one form session: both people, their documents, the location
//! block and the member's registration status.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  document::{OcrExtraction, RoleAssets},
  geography::Location,
  lookup::LookupResult,
  person::{PersonFragment, PersonRecord, Role},
  reconcile,
};

/// Registration status reported by the existence service. Only the member
/// role carries one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationStatus {
  /// While set, submission is blocked.
  pub already_registered: bool,
  /// The last lookup payload for the member, if any.
  pub cached:             Option<PersonFragment>,
}

impl RegistrationStatus {
  fn clear(&mut self) {
    self.already_registered = false;
    self.cached = None;
  }
}

/// Everything the form holds between initialisation and reset/submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSession {
  pub session_id:      Uuid,
  pub member:          PersonRecord,
  pub nominee:         PersonRecord,
  pub member_assets:   RoleAssets,
  pub nominee_assets:  RoleAssets,
  pub location:        Location,
  pub registration:    RegistrationStatus,
}

impl Default for FormSession {
  fn default() -> Self { Self::new() }
}

impl FormSession {
  pub fn new() -> Self {
    Self {
      session_id:     Uuid::new_v4(),
      member:         PersonRecord::default(),
      nominee:        PersonRecord::default(),
      member_assets:  RoleAssets::default(),
      nominee_assets: RoleAssets::default(),
      location:       Location::default(),
      registration:   RegistrationStatus::default(),
    }
  }

  /// Empty every record and asset and start a fresh session id.
  pub fn reset(&mut self) { *self = Self::new(); }

  pub fn record(&self, role: Role) -> &PersonRecord {
    match role {
      Role::Member => &self.member,
      Role::Nominee => &self.nominee,
    }
  }

  pub fn record_mut(&mut self, role: Role) -> &mut PersonRecord {
    match role {
      Role::Member => &mut self.member,
      Role::Nominee => &mut self.nominee,
    }
  }

  pub fn assets(&self, role: Role) -> &RoleAssets {
    match role {
      Role::Member => &self.member_assets,
      Role::Nominee => &self.nominee_assets,
    }
  }

  pub fn assets_mut(&mut self, role: Role) -> &mut RoleAssets {
    match role {
      Role::Member => &mut self.member_assets,
      Role::Nominee => &mut self.nominee_assets,
    }
  }

  pub fn is_already_registered(&self) -> bool {
    self.registration.already_registered
  }

  /// An identifier failed the 12-digit guard. The member's stale
  /// registration status no longer applies; the nominee has none.
  pub fn clear_registration(&mut self, role: Role) {
    if role == Role::Member {
      self.registration.clear();
    }
  }

  /// Fold a lookup result into `role`'s record.
  pub fn apply_lookup(&mut self, role: Role, result: &LookupResult) {
    match (&result.record, role) {
      (None, Role::Member) => self.registration.clear(),
      (None, Role::Nominee) => {}
      (Some(fragment), Role::Member) => {
        reconcile::apply_lookup(&mut self.member, fragment);
        self.registration.already_registered = fragment.registered;
        self.registration.cached = Some(fragment.clone());
      }
      (Some(fragment), Role::Nominee) => {
        reconcile::apply_lookup(&mut self.nominee, fragment);
      }
    }
  }

  /// Fill empty fields of `role`'s record from OCR. For the member, an
  /// address-embedded postal code also fills an empty location pincode.
  pub fn apply_ocr(&mut self, role: Role, ocr: &OcrExtraction) {
    reconcile::apply_ocr(self.record_mut(role), ocr);
    if role == Role::Member
      && let Some(address) = &ocr.address_text
    {
      reconcile::apply_postal_code(&mut self.location, address);
    }
  }
}
