//! The form's location block and the geography service's answer for a
//! village.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::normalize::first_present;

pub mod keys {
  pub const PANCHAYATHI: &[&str] = &["panchayati_name", "panchayathi_name"];
  pub const MANDAL: &[&str] = &["mandal_name", "mandal"];
  pub const CONSTITUENCY: &[&str] = &["constituency_name", "constituency"];
  pub const PINCODE: &[&str] = &["pincode", "postal_code"];
}

/// Where the member lives. Shared by both roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
  pub village:      String,
  pub constituency: String,
  pub mandal:       String,
  pub panchayathi:  String,
  pub pincode:      String,
  /// Always entered by hand; no service ever fills it.
  pub ward:         String,
}

/// Administrative units returned by `GET /geography/lookup/{village}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeographyRecord {
  pub panchayathi:  Option<String>,
  pub mandal:       Option<String>,
  pub constituency: Option<String>,
  pub pincode:      Option<String>,
}

impl GeographyRecord {
  pub fn from_object(object: &Map<String, Value>) -> Self {
    Self {
      panchayathi:  first_present(object, keys::PANCHAYATHI),
      mandal:       first_present(object, keys::MANDAL),
      constituency: first_present(object, keys::CONSTITUENCY),
      pincode:      first_present(object, keys::PINCODE),
    }
  }
}
