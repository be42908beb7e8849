//! Uploaded documents and the OCR data read from them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  normalize::{display_date, strip_non_digits},
  person::Gender,
};

// ─── Assets ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display,
  EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentKind {
  Aadhaar,
  Photo,
}

/// An image attached to a role.
///
/// A preview may exist while `remote_url` is still `None`; only the remote
/// URL is ever sent to the registration API, and the preview is never
/// serialised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAsset {
  pub remote_url:    Option<String>,
  #[serde(skip)]
  pub local_preview: Option<String>,
}

impl DocumentAsset {
  /// Record a successful upload.
  pub fn attach(&mut self, remote_url: String, preview: Option<String>) {
    self.remote_url = Some(remote_url);
    if preview.is_some() {
      self.local_preview = preview;
    }
  }
}

/// Both documents a role can carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssets {
  pub aadhaar: DocumentAsset,
  pub photo:   DocumentAsset,
}

impl RoleAssets {
  pub fn get(&self, kind: DocumentKind) -> &DocumentAsset {
    match kind {
      DocumentKind::Aadhaar => &self.aadhaar,
      DocumentKind::Photo => &self.photo,
    }
  }

  pub fn get_mut(&mut self, kind: DocumentKind) -> &mut DocumentAsset {
    match kind {
      DocumentKind::Aadhaar => &mut self.aadhaar,
      DocumentKind::Photo => &mut self.photo,
    }
  }
}

// ─── Upload input ────────────────────────────────────────────────────────────

/// A captured or selected image on its way to the object store and OCR.
#[derive(Debug, Clone)]
pub struct ImageUpload {
  pub file_name:    String,
  /// MIME type, e.g. `image/png`.
  pub content_type: String,
  pub bytes:        Bytes,
  /// Display-only reference (a file path or blob URL). Never transmitted.
  pub preview:      Option<String>,
}

impl ImageUpload {
  pub fn new(
    file_name: impl Into<String>,
    content_type: impl Into<String>,
    bytes: impl Into<Bytes>,
  ) -> Self {
    Self {
      file_name:    file_name.into(),
      content_type: content_type.into(),
      bytes:        bytes.into(),
      preview:      None,
    }
  }

  pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
    self.preview = Some(preview.into());
    self
  }
}

// ─── OCR ─────────────────────────────────────────────────────────────────────

/// Body returned by `POST /ocr-parse`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrResponse {
  #[serde(default)]
  pub extracted: RawExtraction,
}

/// The `extracted` object exactly as the OCR service reports it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExtraction {
  pub aadhaar: Option<String>,
  pub name:    Option<String>,
  pub gender:  Option<String>,
  pub dob:     Option<String>,
  pub address: Option<String>,
}

/// OCR output in canonical shapes. Consumed once per ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrExtraction {
  /// Digits of the reported identifier; empty if none were read.
  pub identifier_candidate: String,
  pub name:                 Option<String>,
  pub gender:               Option<Gender>,
  /// Day/month/year display form when the service reported year-month-day.
  pub date_of_birth:        Option<String>,
  pub address_text:         Option<String>,
}

impl From<RawExtraction> for OcrExtraction {
  fn from(raw: RawExtraction) -> Self {
    let non_blank = |v: Option<String>| {
      v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
    };
    Self {
      identifier_candidate: raw
        .aadhaar
        .as_deref()
        .map(strip_non_digits)
        .unwrap_or_default(),
      name:                 non_blank(raw.name),
      gender:               raw.gender.as_deref().and_then(Gender::from_loose),
      date_of_birth:        non_blank(raw.dob).map(|d| display_date(&d)),
      address_text:         non_blank(raw.address),
    }
  }
}

impl From<OcrResponse> for OcrExtraction {
  fn from(response: OcrResponse) -> Self { response.extracted.into() }
}
