//! Errors raised while constructing an [`crate::HttpBackend`].
//!
//! Failures of individual calls are reported as
//! [`enrol_core::backend::BackendError`] instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),

  #[error("invalid API base URL {url:?}: {reason}")]
  InvalidBaseUrl { url: String, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
