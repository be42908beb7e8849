//! The `RegistryBackend` trait: every remote collaborator the pipeline talks
//! to.
//!
//! Implemented over HTTP by `enrol-http`. The pipeline depends on this
//! abstraction only, which is also what lets it be exercised against an
//! in-memory fake.

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use crate::{
  document::{ImageUpload, OcrExtraction},
  geography::GeographyRecord,
  lookup::ExistenceResponse,
  normalize::Identifier,
  submission::SubmissionPayload,
};

/// A failed call to a collaborator service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
  /// The request never produced a response (DNS, connect, timeout, ...).
  #[error("request failed: {0}")]
  Transport(String),

  /// The service answered with a non-success status.
  #[error("HTTP {status}")]
  Status {
    status: u16,
    /// The body's `detail` message, when it carried one.
    detail: Option<String>,
  },

  /// The object store answered but gave no usable `secure_url`.
  #[error("object store returned no usable location")]
  MissingLocation,

  #[error("unexpected response body: {0}")]
  Decode(String),
}

/// Remote services consumed by the registration pipeline.
///
/// All methods return `Send` futures so a pipeline can be driven from a
/// multi-threaded tokio runtime.
pub trait RegistryBackend: Send + Sync {
  /// Upload an image to the object store and return its public URL.
  fn upload_image<'a>(
    &'a self,
    image: &'a ImageUpload,
  ) -> impl Future<Output = Result<String, BackendError>> + Send + 'a;

  /// `POST /ocr-parse` with the raw image.
  fn parse_document<'a>(
    &'a self,
    image: &'a ImageUpload,
  ) -> impl Future<Output = Result<OcrExtraction, BackendError>> + Send + 'a;

  /// `GET /person/exists/{id}`.
  fn check_person<'a>(
    &'a self,
    identifier: &'a Identifier,
  ) -> impl Future<Output = Result<ExistenceResponse, BackendError>> + Send + 'a;

  /// `GET /geography/lookup/{village}`. `Ok(None)` when the village is
  /// unknown to the service.
  fn lookup_geography<'a>(
    &'a self,
    village: &'a str,
  ) -> impl Future<Output = Result<Option<GeographyRecord>, BackendError>> + Send + 'a;

  /// `POST /person/submit`. Returns the response body on success.
  fn submit<'a>(
    &'a self,
    payload: &'a SubmissionPayload,
  ) -> impl Future<Output = Result<Value, BackendError>> + Send + 'a;
}
