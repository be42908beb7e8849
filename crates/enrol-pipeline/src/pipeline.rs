//! The [`Pipeline`]: ingestion, lookup, village autofill and submission.

use std::sync::Arc;

use enrol_core::{
  Error, Result,
  backend::RegistryBackend,
  catalog::Catalog,
  document::{DocumentKind, ImageUpload},
  geography::{GeographyRecord, Location},
  lookup::LookupResult,
  normalize::Identifier,
  person::{PersonRecord, Role},
  reconcile,
  session::FormSession,
  submission::{self, SubmissionError, SubmissionPayload, SubmitOutcome},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::activity::{Activity, ActivityBoard, Ticket};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What a completed ingestion did.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
  /// Object-store URL now stored on the role's aadhaar asset.
  pub remote_url:           String,
  /// Digits OCR read from the document; empty if none.
  pub identifier_candidate: String,
  /// The lookup triggered by the scanned identifier, if it ran and answered.
  pub lookup:               Option<LookupResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
  Applied(IngestReport),
  /// The form was reset while the scan was in flight; nothing from the
  /// remaining steps was applied.
  Superseded,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Shared handle to one form session and the services behind it.
///
/// Cheap to clone; clones drive the same session, so the member and nominee
/// pipelines can be in flight at once. The session lock is never held across
/// a network call.
pub struct Pipeline<B> {
  backend:  Arc<B>,
  catalog:  Arc<Catalog>,
  session:  Arc<Mutex<FormSession>>,
  activity: Arc<ActivityBoard>,
}

impl<B> Clone for Pipeline<B> {
  fn clone(&self) -> Self {
    Self {
      backend:  Arc::clone(&self.backend),
      catalog:  Arc::clone(&self.catalog),
      session:  Arc::clone(&self.session),
      activity: Arc::clone(&self.activity),
    }
  }
}

impl<B: RegistryBackend> Pipeline<B> {
  /// Start a pipeline with an empty session.
  pub fn new(backend: B, catalog: Catalog) -> Self {
    Self {
      backend:  Arc::new(backend),
      catalog:  Arc::new(catalog),
      session:  Arc::new(Mutex::new(FormSession::new())),
      activity: Arc::new(ActivityBoard::default()),
    }
  }

  pub fn backend(&self) -> &B { &self.backend }

  pub fn catalog(&self) -> &Catalog { &self.catalog }

  /// Whether `role` has `activity` in flight. Callers disable the control
  /// that triggers it while this holds.
  pub fn is_busy(&self, role: Role, activity: Activity) -> bool {
    self.activity.is_busy(role, activity)
  }

  /// A copy of the current session state.
  pub async fn snapshot(&self) -> FormSession { self.session.lock().await.clone() }

  // ── Direct edits ──────────────────────────────────────────────────────────

  /// Apply a user edit to `role`'s record.
  pub async fn edit<R>(&self, role: Role, f: impl FnOnce(&mut PersonRecord) -> R) -> R {
    f(self.session.lock().await.record_mut(role))
  }

  /// Apply a user edit to the location block.
  pub async fn edit_location<R>(&self, f: impl FnOnce(&mut Location) -> R) -> R {
    f(&mut self.session.lock().await.location)
  }

  /// Empty the form. Results of calls still in flight are discarded when they
  /// land.
  pub async fn reset(&self) {
    let mut session = self.session.lock().await;
    session.reset();
    self.activity.invalidate_all();
    info!(session = %session.session_id, "form reset");
  }

  // ── Document ingestion ───────────────────────────────────────────────────

  /// Upload an identity document for `role`, read it with OCR, resolve the
  /// identifier it carries, and autofill the role's record.
  ///
  /// Upload failure stops everything. OCR failure keeps the uploaded URL.
  /// A scanned identifier is looked up before OCR values are applied, so
  /// lookup data wins and OCR only fills what is still empty.
  pub async fn ingest(&self, role: Role, image: ImageUpload) -> Result<IngestOutcome> {
    let _scanning = self
      .activity
      .try_begin(role, Activity::Scanning)
      .ok_or(Error::Busy(role))?;
    let ticket = self.activity.issue(role, Activity::Scanning);

    let remote_url = self.backend.upload_image(&image).await.map_err(|err| {
      warn!(%role, error = %err, "document upload failed");
      Error::Upload(err)
    })?;

    {
      let mut session = self.session.lock().await;
      if !self.activity.is_current(&ticket) {
        return Ok(superseded(role));
      }
      session
        .assets_mut(role)
        .get_mut(DocumentKind::Aadhaar)
        .attach(remote_url.clone(), image.preview.clone());
    }
    info!(%role, kind = %DocumentKind::Aadhaar, url = %remote_url, "document uploaded");

    let ocr = self.backend.parse_document(&image).await.map_err(|err| {
      warn!(%role, error = %err, "OCR parsing failed");
      Error::Ocr(err)
    })?;
    if !self.activity.is_current(&ticket) {
      return Ok(superseded(role));
    }

    let lookup = if ocr.identifier_candidate.is_empty() {
      None
    } else if let Some(identifier) = Identifier::parse(&ocr.identifier_candidate) {
      // A typed lookup may already hold the indicator; the scan proceeds
      // regardless, and its fresh ticket makes that older lookup stale.
      let _verifying = self.activity.try_begin(role, Activity::Verifying);
      let lookup_ticket = self.activity.issue(role, Activity::Verifying);
      self.verify(role, &identifier, &lookup_ticket).await
    } else {
      debug!(%role, "scanned identifier is not 12 digits; skipping lookup");
      let mut session = self.session.lock().await;
      if self.activity.is_current(&ticket) {
        session.clear_registration(role);
      }
      None
    };

    let mut session = self.session.lock().await;
    if !self.activity.is_current(&ticket) {
      return Ok(superseded(role));
    }
    session.apply_ocr(role, &ocr);
    info!(%role, looked_up = lookup.is_some(), "OCR autofill applied");

    Ok(IngestOutcome::Applied(IngestReport {
      remote_url,
      identifier_candidate: ocr.identifier_candidate,
      lookup,
    }))
  }

  /// Upload a portrait photo for `role`. No OCR is involved.
  pub async fn upload_photo(&self, role: Role, image: ImageUpload) -> Result<String> {
    let session_id = self.session.lock().await.session_id;
    let remote_url = self.backend.upload_image(&image).await.map_err(|err| {
      warn!(%role, error = %err, "photo upload failed");
      Error::Upload(err)
    })?;

    let mut session = self.session.lock().await;
    if session.session_id == session_id {
      session
        .assets_mut(role)
        .get_mut(DocumentKind::Photo)
        .attach(remote_url.clone(), image.preview.clone());
      info!(%role, kind = %DocumentKind::Photo, url = %remote_url, "document uploaded");
    } else {
      debug!(%role, "form reset during photo upload; discarding");
    }
    Ok(remote_url)
  }

  // ── Identity lookup ──────────────────────────────────────────────────────

  /// Look up a typed identifier and merge what the service knows into
  /// `role`'s record.
  ///
  /// Returns `None` without contacting the service when the identifier is not
  /// 12 digits (which also clears the member's registration status), when a
  /// lookup for `role` is already in flight, or when the service fails.
  /// Failures never surface; they only leave the record untouched.
  pub async fn lookup(&self, role: Role, raw: &str) -> Option<LookupResult> {
    let Some(identifier) = Identifier::parse(raw) else {
      debug!(%role, "identifier is not 12 digits; skipping lookup");
      self.session.lock().await.clear_registration(role);
      return None;
    };
    let Some(_verifying) = self.activity.try_begin(role, Activity::Verifying) else {
      debug!(%role, "lookup already in flight");
      return None;
    };
    let ticket = self.activity.issue(role, Activity::Verifying);
    self.verify(role, &identifier, &ticket).await
  }

  async fn verify(
    &self,
    role: Role,
    identifier: &Identifier,
    ticket: &Ticket,
  ) -> Option<LookupResult> {
    let response = match self.backend.check_person(identifier).await {
      Ok(response) => response,
      Err(err) => {
        warn!(%role, error = %err, "identity lookup failed; leaving fields untouched");
        return None;
      }
    };
    let result = LookupResult::from(response);

    let mut session = self.session.lock().await;
    if !self.activity.is_current(ticket) {
      debug!(%role, "discarding stale lookup result");
      return None;
    }
    session.apply_lookup(role, &result);
    info!(
      %role,
      exists = result.exists,
      already_registered = result.already_registered,
      "identity lookup applied"
    );
    Some(result)
  }

  // ── Location ─────────────────────────────────────────────────────────────

  /// Record the chosen village and, if it is a known one, overwrite the
  /// administrative fields with the geography service's answer.
  pub async fn select_village(&self, name: &str) -> Option<GeographyRecord> {
    let known = self.catalog.known_village(name).map(str::to_owned);
    let session_id = {
      let mut session = self.session.lock().await;
      session.location.village = known.clone().unwrap_or_else(|| name.trim().to_owned());
      session.session_id
    };
    let Some(village) = known else {
      debug!(village = name, "not a known village; skipping geography lookup");
      return None;
    };

    let geo = match self.backend.lookup_geography(&village).await {
      Ok(Some(geo)) => geo,
      Ok(None) => {
        debug!(%village, "no geography record");
        return None;
      }
      Err(err) => {
        warn!(%village, error = %err, "geography lookup failed");
        return None;
      }
    };

    let mut session = self.session.lock().await;
    if session.session_id != session_id || session.location.village != village {
      debug!(%village, "village changed during lookup; discarding");
      return None;
    }
    reconcile::apply_geography(&mut session.location, &geo);
    info!(%village, "location autofilled");
    Some(geo)
  }

  // ── Submission ───────────────────────────────────────────────────────────

  /// Validate and send the registration.
  ///
  /// A validation block is returned as [`SubmitOutcome::Blocked`] without
  /// contacting the backend. On acceptance the form is reset; on failure it
  /// is left as is so the user can retry.
  pub async fn submit(&self) -> Result<SubmitOutcome> {
    let (payload, session_id) = {
      let session = self.session.lock().await;
      if let Err(block) = submission::validate(&session) {
        info!(%block, "submission blocked");
        return Ok(SubmitOutcome::Blocked(block));
      }
      (SubmissionPayload::from_session(&session), session.session_id)
    };

    let body = self.backend.submit(&payload).await.map_err(|err| {
      let err = SubmissionError::from(err);
      warn!(error = %err, "submission failed");
      err
    })?;

    let mut session = self.session.lock().await;
    if session.session_id == session_id {
      session.reset();
      self.activity.invalidate_all();
    }
    info!(session = %session_id, "registration submitted");
    Ok(SubmitOutcome::Accepted(body))
  }
}

fn superseded(role: Role) -> IngestOutcome {
  debug!(%role, "form reset during scan; discarding result");
  IngestOutcome::Superseded
}
