//! Core types and rules for the enrol registration pipeline.
//!
//! This crate is deliberately free of HTTP and runtime dependencies. It holds
//! the form session model, the normalisation and reconciliation rules that
//! decide which data ends up on a person's record, and the
//! [`backend::RegistryBackend`] seam that the pipeline drives.

pub mod backend;
pub mod catalog;
pub mod document;
pub mod error;
pub mod geography;
pub mod lookup;
pub mod normalize;
pub mod person;
pub mod reconcile;
pub mod session;
pub mod submission;

pub use error::{Error, Result};
