//! Layered configuration: defaults, then the TOML file, then `ENROL_*`
//! environment variables. Command-line flags are applied on top by `main`.

use std::{path::Path, time::Duration};

use anyhow::Context as _;
use enrol_core::catalog::Catalog;
use enrol_http::{
  DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT, DEFAULT_UPLOAD_PRESET,
  DEFAULT_UPLOAD_URL, HttpConfig,
};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrolConfig {
  pub api_base_url:  String,
  pub upload_url:    String,
  pub upload_preset: String,
  pub timeout_secs:  u64,
  /// Replaces the built-in village list when set.
  pub villages:      Option<Vec<String>>,
}

impl Default for EnrolConfig {
  fn default() -> Self {
    Self {
      api_base_url:  DEFAULT_API_BASE_URL.to_owned(),
      upload_url:    DEFAULT_UPLOAD_URL.to_owned(),
      upload_preset: DEFAULT_UPLOAD_PRESET.to_owned(),
      timeout_secs:  DEFAULT_TIMEOUT.as_secs(),
      villages:      None,
    }
  }
}

impl EnrolConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ENROL"))
      .build()
      .with_context(|| format!("failed to read config from {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise EnrolConfig")
  }

  pub fn http(&self) -> HttpConfig {
    HttpConfig {
      api_base_url:  self.api_base_url.clone(),
      upload_url:    self.upload_url.clone(),
      upload_preset: self.upload_preset.clone(),
      timeout:       Duration::from_secs(self.timeout_secs),
    }
  }

  pub fn catalog(&self) -> Catalog {
    match &self.villages {
      Some(villages) => Catalog::with_villages(villages.iter().cloned()),
      None => Catalog::default(),
    }
  }
}
