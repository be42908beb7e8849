//! Merge rules for autofill.
//!
//! Within one ingestion cycle the lookup fragment is applied first and
//! overwrites; OCR is applied afterwards and only fills empty fields. Fields
//! neither source provides are left alone.

use crate::{
  document::OcrExtraction,
  geography::{GeographyRecord, Location},
  person::{PersonFragment, PersonRecord},
};

pub const POSTAL_CODE_LEN: usize = 6;

/// Overwrite every field the lookup provides.
pub fn apply_lookup(record: &mut PersonRecord, fragment: &PersonFragment) {
  fn put(field: &mut String, value: &Option<String>) {
    if let Some(v) = value {
      field.clone_from(v);
    }
  }

  put(&mut record.identifier, &fragment.identifier);
  put(&mut record.full_name, &fragment.full_name);
  put(&mut record.date_of_birth, &fragment.date_of_birth);
  if fragment.gender.is_some() {
    record.gender = fragment.gender;
  }
  put(&mut record.mobile_number, &fragment.mobile_number);
  put(&mut record.education, &fragment.education);
  put(&mut record.profession, &fragment.profession);
  put(&mut record.religion, &fragment.religion);

  // Category before caste, flag before id: the setters clear the dependent
  // field, so the lookup's own value must land second.
  if let Some(category) = &fragment.reservation_category {
    record.set_reservation_category(category.as_str());
  }
  if let Some(caste) = &fragment.caste {
    record.set_caste(caste.as_str());
  }
  record.set_membership(fragment.membership);
  if let Some(id) = &fragment.membership_id {
    record.set_membership_id(id.as_str());
  }
}

/// Fill only the fields that are still empty.
pub fn apply_ocr(record: &mut PersonRecord, ocr: &OcrExtraction) {
  fn fill(field: &mut String, value: Option<&str>) {
    if field.is_empty()
      && let Some(v) = value
    {
      *field = v.to_owned();
    }
  }

  let candidate = Some(ocr.identifier_candidate.as_str()).filter(|s| !s.is_empty());
  fill(&mut record.identifier, candidate);
  fill(&mut record.full_name, ocr.name.as_deref());
  fill(&mut record.date_of_birth, ocr.date_of_birth.as_deref());
  if record.gender.is_none() {
    record.gender = ocr.gender;
  }
}

/// The first run of exactly [`POSTAL_CODE_LEN`] ASCII digits in `text`.
pub fn extract_postal_code(text: &str) -> Option<&str> {
  let bytes = text.as_bytes();
  let mut i = 0;
  while i < bytes.len() {
    if !bytes[i].is_ascii_digit() {
      i += 1;
      continue;
    }
    let start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
      i += 1;
    }
    if i - start == POSTAL_CODE_LEN {
      return Some(&text[start..i]);
    }
  }
  None
}

/// Fill an empty postal code from OCR address text. Returns whether anything
/// changed.
pub fn apply_postal_code(location: &mut Location, address: &str) -> bool {
  if !location.pincode.is_empty() {
    return false;
  }
  match extract_postal_code(address) {
    Some(code) => {
      location.pincode = code.to_owned();
      true
    }
    None => false,
  }
}

/// Village selection is authoritative: overwrite the administrative fields
/// wholesale. The ward number is never touched.
pub fn apply_geography(location: &mut Location, geo: &GeographyRecord) {
  location.panchayathi = geo.panchayathi.clone().unwrap_or_default();
  location.mandal = geo.mandal.clone().unwrap_or_default();
  location.constituency = geo.constituency.clone().unwrap_or_default();
  location.pincode = geo.pincode.clone().unwrap_or_default();
}
