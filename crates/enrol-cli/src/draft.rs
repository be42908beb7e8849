//! Typed form input for `enrol register`, read from a TOML file.
//!
//! ```toml
//! [member]
//! identifier = "1234 5678 9012"
//! full_name = "Jane Doe"
//! reservation_category = "SC"
//! caste = "Yanadhi"
//!
//! [nominee]
//! full_name = "John Doe"
//!
//! [location]
//! village = "Kavali"
//! ward = "4"
//! ```

use std::path::Path;

use anyhow::{Context as _, bail};
use enrol_core::{
  catalog::{Catalog, GENDER_OPTIONS},
  geography::Location,
  person::{Gender, Membership, PersonRecord, Role},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Draft {
  pub member:   DraftPerson,
  pub nominee:  DraftPerson,
  pub location: DraftLocation,
}

impl Draft {
  pub fn read(path: &Path) -> anyhow::Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading draft {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing draft {}", path.display()))
  }

  /// Reject values outside the form's fixed choices.
  pub fn check(&self, catalog: &Catalog) -> anyhow::Result<()> {
    self.member.check(Role::Member, catalog)?;
    self.nominee.check(Role::Nominee, catalog)
  }

  pub fn person(&self, role: Role) -> &DraftPerson {
    match role {
      Role::Member => &self.member,
      Role::Nominee => &self.nominee,
    }
  }
}

/// Fields a user may type for one person. Absent fields are left alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DraftPerson {
  pub identifier:           Option<String>,
  pub full_name:            Option<String>,
  pub date_of_birth:        Option<String>,
  pub gender:               Option<String>,
  pub mobile_number:        Option<String>,
  pub education:            Option<String>,
  pub profession:           Option<String>,
  pub religion:             Option<String>,
  pub reservation_category: Option<String>,
  pub caste:                Option<String>,
  pub membership:           Option<String>,
  pub membership_id:        Option<String>,
}

impl DraftPerson {
  pub fn check(&self, role: Role, catalog: &Catalog) -> anyhow::Result<()> {
    if let Some(gender) = &self.gender
      && Gender::from_loose(gender).is_none()
    {
      bail!("{role} gender {gender:?} is not one of {GENDER_OPTIONS:?}");
    }

    for (field, options) in catalog.field_options() {
      let value = match field {
        "education" => &self.education,
        "profession" => &self.profession,
        "religion" => &self.religion,
        "reservation_category" => &self.reservation_category,
        _ => continue,
      };
      if let Some(value) = value
        && !options.contains(&value.trim())
      {
        bail!("{role} {field} {value:?} is not one of {options:?}");
      }
    }

    if let Some(caste) = &self.caste {
      let category = self.reservation_category.as_deref().unwrap_or_default();
      let castes = catalog.castes_for(category.trim());
      if !castes.contains(&caste.trim()) {
        bail!("{role} caste {caste:?} is not allowed for category {category:?} (expected one of {castes:?})");
      }
    }
    Ok(())
  }

  /// Apply the typed fields through the record's setters, in the order a
  /// user would fill them in.
  pub fn fill(&self, record: &mut PersonRecord) {
    let text = [
      (&self.identifier, &mut record.identifier),
      (&self.full_name, &mut record.full_name),
      (&self.date_of_birth, &mut record.date_of_birth),
      (&self.mobile_number, &mut record.mobile_number),
      (&self.education, &mut record.education),
      (&self.profession, &mut record.profession),
      (&self.religion, &mut record.religion),
    ];
    for (value, field) in text {
      if let Some(value) = value {
        *field = value.trim().to_owned();
      }
    }
    if let Some(gender) = self.gender.as_deref().and_then(Gender::from_loose) {
      record.gender = Some(gender);
    }
    if let Some(category) = &self.reservation_category {
      record.set_reservation_category(category.trim());
    }
    if let Some(caste) = &self.caste {
      record.set_caste(caste.trim());
    }
    if let Some(membership) = self.membership.as_deref() {
      record.set_membership(Membership::from_loose(membership));
    }
    if let Some(id) = &self.membership_id {
      record.set_membership_id(id.trim());
    }
  }
}

/// The location block. `village` goes through village selection so the
/// administrative fields can be looked up; the rest are hand overrides.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DraftLocation {
  pub village:      Option<String>,
  pub constituency: Option<String>,
  pub mandal:       Option<String>,
  pub panchayathi:  Option<String>,
  pub pincode:      Option<String>,
  pub ward:         Option<String>,
}

impl DraftLocation {
  pub fn fill(&self, location: &mut Location) {
    for (value, field) in [
      (&self.constituency, &mut location.constituency),
      (&self.mandal, &mut location.mandal),
      (&self.panchayathi, &mut location.panchayathi),
      (&self.pincode, &mut location.pincode),
      (&self.ward, &mut location.ward),
    ] {
      if let Some(value) = value {
        *field = value.trim().to_owned();
      }
    }
  }
}
