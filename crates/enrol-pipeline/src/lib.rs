//! The identity resolution pipeline.
//!
//! Drives document ingestion, identity lookup, village autofill and
//! submission against any [`enrol_core::backend::RegistryBackend`], folding
//! every answer into one shared [`enrol_core::session::FormSession`].

mod activity;
mod pipeline;

pub use activity::Activity;
pub use pipeline::{IngestOutcome, IngestReport, Pipeline};

#[cfg(test)]
mod tests;
