//! Error types for `enrol-core`.

use thiserror::Error;

use crate::{backend::BackendError, person::Role, submission::SubmissionError};

/// Failures that are surfaced to whoever triggered a pipeline operation.
///
/// Lookup failures are absent on purpose: they are swallowed at their own
/// boundary and show up only as missing autofill.
#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} document scan already in progress")]
  Busy(Role),

  #[error("image upload failed: {0}")]
  Upload(#[source] BackendError),

  #[error("OCR parsing failed: {0}")]
  Ocr(#[source] BackendError),

  #[error("submit failed: {0}")]
  Submission(#[from] SubmissionError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
