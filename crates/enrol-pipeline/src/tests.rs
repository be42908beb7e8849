//! Scenario tests for `Pipeline` against an in-memory backend.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use enrol_core::{
  Error,
  backend::{BackendError, RegistryBackend},
  catalog::Catalog,
  document::{ImageUpload, OcrExtraction, OcrResponse},
  geography::GeographyRecord,
  lookup::ExistenceResponse,
  normalize::Identifier,
  person::{Gender, Role},
  submission::{SubmissionPayload, SubmitOutcome, ValidationBlock},
};
use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::{Activity, IngestOutcome, Pipeline};

// ─── Fake backend ────────────────────────────────────────────────────────────

struct FakeBackend {
  /// `None` makes the object store answer without a location.
  upload_url: Option<String>,
  ocr:        Result<Value, BackendError>,
  /// Existence bodies keyed by identifier; absent ids report `exists: false`.
  people:     HashMap<String, Value>,
  lookup_err: Option<BackendError>,
  /// Lookups for these identifiers wait for a notification before answering.
  lookup_gates: HashMap<String, Arc<Notify>>,
  villages:   HashMap<String, GeographyRecord>,
  geography_err: Option<BackendError>,
  submit:     Result<Value, BackendError>,
  /// When set, OCR waits for a notification before answering.
  ocr_gate:   Option<Arc<Notify>>,
  calls:      Mutex<Vec<String>>,
  submitted:  Mutex<Vec<SubmissionPayload>>,
}

impl FakeBackend {
  fn new() -> Self {
    Self {
      upload_url: Some("https://store/img1".into()),
      ocr:        Ok(json!({ "extracted": {} })),
      people:     HashMap::new(),
      lookup_err: None,
      lookup_gates: HashMap::new(),
      villages:   HashMap::new(),
      geography_err: None,
      submit:     Ok(json!({ "status": "ok" })),
      ocr_gate:   None,
      calls:      Mutex::new(Vec::new()),
      submitted:  Mutex::new(Vec::new()),
    }
  }

  fn with_ocr(mut self, extracted: Value) -> Self {
    self.ocr = Ok(json!({ "extracted": extracted }));
    self
  }

  fn with_person(mut self, id: &str, member: Value) -> Self {
    self
      .people
      .insert(id.into(), json!({ "exists": true, "member": member }));
    self
  }

  fn record(&self, call: impl Into<String>) {
    self.calls.lock().unwrap().push(call.into());
  }

  fn called(&self, prefix: &str) -> usize {
    self
      .calls
      .lock()
      .unwrap()
      .iter()
      .filter(|c| c.starts_with(prefix))
      .count()
  }
}

impl RegistryBackend for FakeBackend {
  async fn upload_image<'a>(
    &'a self,
    image: &'a ImageUpload,
  ) -> Result<String, BackendError> {
    self.record(format!("upload {}", image.file_name));
    self.upload_url.clone().ok_or(BackendError::MissingLocation)
  }

  async fn parse_document<'a>(
    &'a self,
    _image: &'a ImageUpload,
  ) -> Result<OcrExtraction, BackendError> {
    self.record("ocr");
    if let Some(gate) = &self.ocr_gate {
      gate.notified().await;
    }
    let body = self.ocr.clone()?;
    let response: OcrResponse =
      serde_json::from_value(body).map_err(|e| BackendError::Decode(e.to_string()))?;
    Ok(response.into())
  }

  async fn check_person<'a>(
    &'a self,
    identifier: &'a Identifier,
  ) -> Result<ExistenceResponse, BackendError> {
    self.record(format!("exists {identifier}"));
    if let Some(gate) = self.lookup_gates.get(identifier.as_str()) {
      gate.notified().await;
    }
    if let Some(err) = &self.lookup_err {
      return Err(err.clone());
    }
    let body = self
      .people
      .get(identifier.as_str())
      .cloned()
      .unwrap_or_else(|| json!({ "exists": false }));
    serde_json::from_value(body).map_err(|e| BackendError::Decode(e.to_string()))
  }

  async fn lookup_geography<'a>(
    &'a self,
    village: &'a str,
  ) -> Result<Option<GeographyRecord>, BackendError> {
    self.record(format!("geography {village}"));
    if let Some(err) = &self.geography_err {
      return Err(err.clone());
    }
    Ok(self.villages.get(village).cloned())
  }

  async fn submit<'a>(
    &'a self,
    payload: &'a SubmissionPayload,
  ) -> Result<Value, BackendError> {
    self.record("submit");
    self.submitted.lock().unwrap().push(payload.clone());
    self.submit.clone()
  }
}

fn pipeline(backend: FakeBackend) -> Pipeline<FakeBackend> {
  Pipeline::new(backend, Catalog::default())
}

fn aadhaar_image() -> ImageUpload {
  ImageUpload::new("member-aadhaar.png", "image/png", &b"\x89PNG"[..])
    .with_preview("blob:member-aadhaar")
}

fn jane_doe_ocr() -> Value {
  json!({
    "aadhaar": "1234 5678 9012",
    "name": "Jane Doe",
    "gender": "female",
    "dob": "1990-05-01",
    "address": "12 Main St, Anytown 500001"
  })
}

async fn wait_for(backend: &FakeBackend, prefix: &str) {
  while backend.called(prefix) == 0 {
    tokio::task::yield_now().await;
  }
}

// ─── Ingestion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn scan_of_unknown_person_autofills_from_ocr() {
  let p = pipeline(FakeBackend::new().with_ocr(jane_doe_ocr()));

  let outcome = p.ingest(Role::Member, aadhaar_image()).await.unwrap();
  let IngestOutcome::Applied(report) = outcome else {
    panic!("expected applied outcome");
  };
  assert_eq!(report.remote_url, "https://store/img1");
  assert_eq!(report.identifier_candidate, "123456789012");
  assert!(!report.lookup.unwrap().exists);

  let session = p.snapshot().await;
  assert_eq!(session.member.identifier, "123456789012");
  assert_eq!(session.member.full_name, "Jane Doe");
  assert_eq!(session.member.gender, Some(Gender::Female));
  assert_eq!(session.member.date_of_birth, "01/05/1990");
  assert_eq!(session.location.pincode, "500001");
  assert_eq!(
    session.member_assets.aadhaar.remote_url.as_deref(),
    Some("https://store/img1")
  );
  assert_eq!(
    session.member_assets.aadhaar.local_preview.as_deref(),
    Some("blob:member-aadhaar")
  );
  assert!(!session.is_already_registered());
  assert_eq!(p.backend().called("exists 123456789012"), 1);
}

#[tokio::test]
async fn lookup_wins_over_ocr_and_blocks_registered_member() {
  let backend = FakeBackend::new().with_ocr(jane_doe_ocr()).with_person(
    "123456789012",
    json!({
      "full_name": "J. Doe",
      "aadhaar_number": "123456789012",
      "is_registered": true
    }),
  );
  let p = pipeline(backend);

  p.ingest(Role::Member, aadhaar_image()).await.unwrap();

  let session = p.snapshot().await;
  assert_eq!(session.member.full_name, "J. Doe");
  // Fields the lookup did not provide still come from OCR.
  assert_eq!(session.member.gender, Some(Gender::Female));
  assert!(session.is_already_registered());

  let outcome = p.submit().await.unwrap();
  assert_eq!(outcome, SubmitOutcome::Blocked(ValidationBlock::AlreadyRegistered));
  assert_eq!(p.backend().called("submit"), 0);
}

#[tokio::test]
async fn user_entered_values_survive_ocr() {
  let p = pipeline(FakeBackend::new().with_ocr(json!({ "name": "Bob" })));
  p.edit(Role::Member, |r| r.full_name = "Alice".into()).await;

  p.ingest(Role::Member, aadhaar_image()).await.unwrap();

  assert_eq!(p.snapshot().await.member.full_name, "Alice");
}

#[tokio::test]
async fn upload_failure_stops_before_ocr() {
  let mut backend = FakeBackend::new().with_ocr(jane_doe_ocr());
  backend.upload_url = None;
  let p = pipeline(backend);

  let err = p.ingest(Role::Member, aadhaar_image()).await.unwrap_err();
  assert!(matches!(err, Error::Upload(BackendError::MissingLocation)));
  assert_eq!(p.backend().called("ocr"), 0);

  let session = p.snapshot().await;
  assert_eq!(session.member_assets.aadhaar.remote_url, None);
  assert_eq!(session.member_assets.aadhaar.local_preview, None);
  assert!(!p.is_busy(Role::Member, Activity::Scanning));
}

#[tokio::test]
async fn ocr_failure_keeps_uploaded_url() {
  let mut backend = FakeBackend::new();
  backend.ocr = Err(BackendError::Status { status: 500, detail: None });
  let p = pipeline(backend);

  let err = p.ingest(Role::Nominee, aadhaar_image()).await.unwrap_err();
  assert!(matches!(err, Error::Ocr(BackendError::Status { status: 500, .. })));

  let session = p.snapshot().await;
  assert_eq!(
    session.nominee_assets.aadhaar.remote_url.as_deref(),
    Some("https://store/img1")
  );
  assert_eq!(session.nominee.full_name, "");
  assert_eq!(p.backend().called("exists"), 0);
}

#[tokio::test]
async fn short_scanned_identifier_skips_lookup() {
  let p = pipeline(
    FakeBackend::new().with_ocr(json!({ "aadhaar": "1234 5678", "name": "Jane" })),
  );

  p.ingest(Role::Member, aadhaar_image()).await.unwrap();

  assert_eq!(p.backend().called("exists"), 0);
  let session = p.snapshot().await;
  assert_eq!(session.member.identifier, "12345678");
  assert_eq!(session.member.full_name, "Jane");
}

#[tokio::test]
async fn second_scan_for_same_role_is_busy() {
  let gate = Arc::new(Notify::new());
  let mut backend = FakeBackend::new().with_ocr(jane_doe_ocr());
  backend.ocr_gate = Some(Arc::clone(&gate));
  let p = pipeline(backend);

  let first = tokio::spawn({
    let p = p.clone();
    async move { p.ingest(Role::Member, aadhaar_image()).await }
  });
  wait_for(p.backend(), "ocr").await;
  assert!(p.is_busy(Role::Member, Activity::Scanning));

  let err = p.ingest(Role::Member, aadhaar_image()).await.unwrap_err();
  assert!(matches!(err, Error::Busy(Role::Member)));

  gate.notify_one();
  let outcome = first.await.unwrap().unwrap();
  assert!(matches!(outcome, IngestOutcome::Applied(_)));
  assert!(!p.is_busy(Role::Member, Activity::Scanning));
  assert_eq!(p.backend().called("upload"), 1);
}

#[tokio::test]
async fn reset_discards_scan_in_flight() {
  let gate = Arc::new(Notify::new());
  let mut backend = FakeBackend::new().with_ocr(jane_doe_ocr());
  backend.ocr_gate = Some(Arc::clone(&gate));
  let p = pipeline(backend);

  let scan = tokio::spawn({
    let p = p.clone();
    async move { p.ingest(Role::Member, aadhaar_image()).await }
  });
  wait_for(p.backend(), "ocr").await;

  p.reset().await;
  gate.notify_one();

  assert_eq!(scan.await.unwrap().unwrap(), IngestOutcome::Superseded);
  let session = p.snapshot().await;
  assert_eq!(session.member.full_name, "");
  assert_eq!(session.member_assets.aadhaar.remote_url, None);
  assert_eq!(p.backend().called("exists"), 0);
}

#[tokio::test]
async fn member_and_nominee_scans_run_together() {
  let backend = FakeBackend::new()
    .with_ocr(jane_doe_ocr())
    .with_person("123456789012", json!({ "full_name": "J. Doe" }));
  let p = pipeline(backend);

  let (member, nominee) = tokio::join!(
    p.ingest(Role::Member, aadhaar_image()),
    p.ingest(Role::Nominee, aadhaar_image()),
  );
  assert!(matches!(member.unwrap(), IngestOutcome::Applied(_)));
  assert!(matches!(nominee.unwrap(), IngestOutcome::Applied(_)));

  let session = p.snapshot().await;
  assert_eq!(session.member.full_name, "J. Doe");
  assert_eq!(session.nominee.full_name, "J. Doe");
  assert!(session.nominee_assets.aadhaar.remote_url.is_some());
}

#[tokio::test]
async fn photo_upload_attaches_to_photo_asset() {
  let p = pipeline(FakeBackend::new());
  let image = ImageUpload::new("nominee-photo.png", "image/png", &b"img"[..]);

  let url = p.upload_photo(Role::Nominee, image).await.unwrap();

  let session = p.snapshot().await;
  assert_eq!(session.nominee_assets.photo.remote_url, Some(url));
  assert_eq!(session.nominee_assets.aadhaar.remote_url, None);
  assert_eq!(p.backend().called("ocr"), 0);
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn lookup_guard_rejects_anything_but_twelve_digits() {
  let p = pipeline(FakeBackend::new());
  for raw in ["", "12345678901", "1234567890123", "abcdefghijkl"] {
    assert!(p.lookup(Role::Member, raw).await.is_none(), "{raw:?}");
  }
  assert_eq!(p.backend().called("exists"), 0);
}

#[tokio::test]
async fn invalid_identifier_clears_member_registration() {
  let backend = FakeBackend::new()
    .with_person("123456789012", json!({ "name": "Ravi", "is_registered": true }));
  let p = pipeline(backend);

  p.lookup(Role::Member, "1234-5678-9012").await.unwrap();
  assert!(p.snapshot().await.is_already_registered());

  assert!(p.lookup(Role::Member, "1234").await.is_none());
  let session = p.snapshot().await;
  assert!(!session.is_already_registered());
  assert_eq!(session.member.full_name, "Ravi");
}

#[tokio::test]
async fn nominee_lookup_merges_without_registration_flag() {
  let backend = FakeBackend::new().with_person(
    "210987654321",
    json!({
      "fullName": "Lakshmi",
      "mobile": "9876543210",
      "gender": "FEMALE",
      "dob": "1970-01-15",
      "is_registered": true
    }),
  );
  let p = pipeline(backend);

  let result = p.lookup(Role::Nominee, "2109 8765 4321").await.unwrap();
  assert!(result.already_registered);

  let session = p.snapshot().await;
  assert_eq!(session.nominee.full_name, "Lakshmi");
  assert_eq!(session.nominee.mobile_number, "9876543210");
  assert_eq!(session.nominee.gender, Some(Gender::Female));
  assert_eq!(session.nominee.date_of_birth, "15/01/1970");
  assert!(!session.is_already_registered());
}

#[tokio::test]
async fn lookup_failure_is_silent() {
  let mut backend = FakeBackend::new();
  backend.lookup_err = Some(BackendError::Transport("connection refused".into()));
  let p = pipeline(backend);
  p.edit(Role::Member, |r| r.full_name = "Typed".into()).await;

  assert!(p.lookup(Role::Member, "123456789012").await.is_none());
  assert_eq!(p.snapshot().await.member.full_name, "Typed");
  assert!(!p.is_busy(Role::Member, Activity::Verifying));
}

#[tokio::test]
async fn unknown_person_clears_member_cache() {
  let backend = FakeBackend::new()
    .with_person("123456789012", json!({ "name": "Ravi", "is_registered": true }));
  let p = pipeline(backend);

  p.lookup(Role::Member, "123456789012").await.unwrap();
  let result = p.lookup(Role::Member, "999999999999").await.unwrap();
  assert!(!result.exists);

  let session = p.snapshot().await;
  assert!(!session.is_already_registered());
  assert!(session.registration.cached.is_none());
}

// ─── Location ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn village_selection_overwrites_location_but_not_ward() {
  let mut backend = FakeBackend::new();
  backend.villages.insert("Kavali".into(), GeographyRecord {
    panchayathi:  Some("Kavali Rural".into()),
    mandal:       Some("Kavali".into()),
    constituency: Some("Kavali".into()),
    pincode:      Some("524201".into()),
  });
  let p = pipeline(backend);
  p.edit_location(|l| {
    l.ward = "12".into();
    l.pincode = "500001".into();
  })
  .await;

  let geo = p.select_village("kavali").await.unwrap();
  assert_eq!(geo.pincode.as_deref(), Some("524201"));

  let location = p.snapshot().await.location;
  assert_eq!(location.village, "Kavali");
  assert_eq!(location.panchayathi, "Kavali Rural");
  assert_eq!(location.constituency, "Kavali");
  assert_eq!(location.pincode, "524201");
  assert_eq!(location.ward, "12");
}

#[tokio::test]
async fn unknown_village_is_recorded_without_lookup() {
  let p = pipeline(FakeBackend::new());

  assert!(p.select_village("Atlantis").await.is_none());
  assert_eq!(p.snapshot().await.location.village, "Atlantis");
  assert_eq!(p.backend().called("geography"), 0);
}

#[tokio::test]
async fn geography_not_found_leaves_location() {
  let p = pipeline(FakeBackend::new());
  p.edit_location(|l| l.mandal = "Typed".into()).await;

  assert!(p.select_village("Nellore").await.is_none());
  let location = p.snapshot().await.location;
  assert_eq!(location.village, "Nellore");
  assert_eq!(location.mandal, "Typed");
  assert_eq!(p.backend().called("geography Nellore"), 1);
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_without_identifier_is_blocked() {
  let p = pipeline(FakeBackend::new());

  let outcome = p.submit().await.unwrap();
  assert_eq!(outcome, SubmitOutcome::Blocked(ValidationBlock::MissingIdentifier));
  assert_eq!(p.backend().called("submit"), 0);
}

#[tokio::test]
async fn accepted_submission_resets_form() {
  let p = pipeline(FakeBackend::new().with_ocr(jane_doe_ocr()));
  p.ingest(Role::Member, aadhaar_image()).await.unwrap();
  let before = p.snapshot().await.session_id;

  let outcome = p.submit().await.unwrap();
  assert_eq!(outcome, SubmitOutcome::Accepted(json!({ "status": "ok" })));

  let payload = p.backend().submitted.lock().unwrap()[0].clone();
  assert_eq!(payload.get("aadhaar_number"), Some(&json!("123456789012")));
  assert_eq!(payload.get("dob"), Some(&json!("1990-05-01")));
  assert_eq!(payload.get("aadhaar_image_url"), Some(&json!("https://store/img1")));
  assert_eq!(payload.get("nominee_aadhaar_image_url"), Some(&Value::Null));

  let session = p.snapshot().await;
  assert_ne!(session.session_id, before);
  assert_eq!(session.member.full_name, "");
}

#[tokio::test]
async fn rejected_submission_keeps_form_and_reports_detail() {
  let mut backend = FakeBackend::new().with_ocr(jane_doe_ocr());
  backend.submit = Err(BackendError::Status {
    status: 422,
    detail: Some("mobile_number is required".into()),
  });
  let p = pipeline(backend);
  p.ingest(Role::Member, aadhaar_image()).await.unwrap();

  let err = match p.submit().await.unwrap_err() {
    Error::Submission(err) => err,
    other => panic!("expected submission error, got {other:?}"),
  };
  assert_eq!(err.status, Some(422));
  assert_eq!(err.to_string(), "mobile_number is required");
  assert_eq!(p.snapshot().await.member.full_name, "Jane Doe");
}

// ─── Stale results ───────────────────────────────────────────────────────────

#[tokio::test]
async fn scan_supersedes_typed_lookup_in_flight() {
  let gate = Arc::new(Notify::new());
  let mut backend = FakeBackend::new()
    .with_ocr(json!({ "aadhaar": "1234 5678 9012", "name": "Scanned Person" }))
    .with_person("111111111111", json!({ "full_name": "Old Typed" }))
    .with_person("123456789012", json!({ "full_name": "Scanned Person" }));
  backend.lookup_gates.insert("111111111111".into(), Arc::clone(&gate));
  let p = pipeline(backend);

  let typed = tokio::spawn({
    let p = p.clone();
    async move { p.lookup(Role::Member, "111111111111").await }
  });
  wait_for(p.backend(), "exists 111111111111").await;

  p.ingest(Role::Member, aadhaar_image()).await.unwrap();
  let session = p.snapshot().await;
  assert_eq!(session.member.identifier, "123456789012");

  gate.notify_one();
  assert!(typed.await.unwrap().is_none());

  let session = p.snapshot().await;
  assert_eq!(session.member.identifier, "123456789012");
  assert_eq!(session.member.full_name, "Scanned Person");
  assert!(!p.is_busy(Role::Member, Activity::Verifying));
}

#[tokio::test]
async fn reset_discards_typed_lookup_in_flight() {
  let gate = Arc::new(Notify::new());
  let mut backend = FakeBackend::new()
    .with_person("123456789012", json!({ "name": "Ravi", "is_registered": true }));
  backend.lookup_gates.insert("123456789012".into(), Arc::clone(&gate));
  let p = pipeline(backend);

  let typed = tokio::spawn({
    let p = p.clone();
    async move { p.lookup(Role::Member, "123456789012").await }
  });
  wait_for(p.backend(), "exists").await;
  assert!(p.is_busy(Role::Member, Activity::Verifying));

  p.reset().await;
  gate.notify_one();

  assert!(typed.await.unwrap().is_none());
  let session = p.snapshot().await;
  assert_eq!(session.member.full_name, "");
  assert!(!session.is_already_registered());
}

// ─── Failure paths ───────────────────────────────────────────────────────────

#[tokio::test]
async fn geography_failure_leaves_location() {
  let mut backend = FakeBackend::new();
  backend.geography_err = Some(BackendError::Status { status: 503, detail: None });
  let p = pipeline(backend);
  p.edit_location(|l| {
    l.mandal = "Typed".into();
    l.pincode = "500001".into();
  })
  .await;

  assert!(p.select_village("Kavali").await.is_none());
  let location = p.snapshot().await.location;
  assert_eq!(location.village, "Kavali");
  assert_eq!(location.mandal, "Typed");
  assert_eq!(location.pincode, "500001");
  assert_eq!(p.backend().called("geography Kavali"), 1);
}

#[tokio::test]
async fn photo_upload_failure_is_surfaced() {
  let mut backend = FakeBackend::new();
  backend.upload_url = None;
  let p = pipeline(backend);
  let image = ImageUpload::new("member-photo.png", "image/png", &b"img"[..])
    .with_preview("blob:member-photo");

  let err = p.upload_photo(Role::Member, image).await.unwrap_err();
  assert!(matches!(err, Error::Upload(BackendError::MissingLocation)));

  let photo = p.snapshot().await.member_assets.photo;
  assert_eq!(photo.remote_url, None);
  assert_eq!(photo.local_preview, None);
}

#[tokio::test]
async fn separated_identifier_is_submitted_as_digits() {
  let p = pipeline(FakeBackend::new());
  p.edit(Role::Member, |r| r.identifier = "1234 5678 9012".into()).await;

  let outcome = p.submit().await.unwrap();
  assert!(matches!(outcome, SubmitOutcome::Accepted(_)));

  let payload = p.backend().submitted.lock().unwrap()[0].clone();
  assert_eq!(payload.get("aadhaar_number"), Some(&json!("123456789012")));
}
