//! Async HTTP implementation of [`RegistryBackend`].
//!
//! Talks to two services: an image object store that accepts a multipart
//! upload with a fixed preset, and the registration REST API.
//!
//! | Call | Method/Path |
//! |------|-------------|
//! | Upload image | `POST <upload_url>` (multipart `file` + `upload_preset`) |
//! | OCR parse | `POST /ocr-parse` (multipart `file`) |
//! | Existence check | `GET /person/exists/{id}` |
//! | Geography lookup | `GET /geography/lookup/{village}` (404 = unknown) |
//! | Submit | `POST /person/submit` (JSON) |

pub mod error;

use std::{fmt::Display, time::Duration};

use enrol_core::{
  backend::{BackendError, RegistryBackend},
  document::{ImageUpload, OcrExtraction, OcrResponse},
  geography::GeographyRecord,
  lookup::ExistenceResponse,
  normalize::Identifier,
  submission::SubmissionPayload,
};
use reqwest::{
  Client, Response, StatusCode, Url,
  multipart::{Form, Part},
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub use error::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://jsp-backend-1.onrender.com";
pub const DEFAULT_UPLOAD_URL: &str =
  "https://api.cloudinary.com/v1_1/ddtewwyny/image/upload";
pub const DEFAULT_UPLOAD_PRESET: &str = "janasena_upload";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for both services.
#[derive(Debug, Clone)]
pub struct HttpConfig {
  pub api_base_url:  String,
  pub upload_url:    String,
  pub upload_preset: String,
  pub timeout:       Duration,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      api_base_url:  DEFAULT_API_BASE_URL.to_owned(),
      upload_url:    DEFAULT_UPLOAD_URL.to_owned(),
      upload_preset: DEFAULT_UPLOAD_PRESET.to_owned(),
      timeout:       DEFAULT_TIMEOUT,
    }
  }
}

/// Object-store upload response.
#[derive(Debug, Deserialize)]
struct UploadResponse {
  secure_url: Option<String>,
}

/// Async HTTP client for the object store and registration API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct HttpBackend {
  client:        Client,
  api_base:      Url,
  upload_url:    String,
  upload_preset: String,
}

impl HttpBackend {
  pub fn new(config: HttpConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    let api_base = Url::parse(&config.api_base_url)
      .ok()
      .filter(|url| !url.cannot_be_a_base())
      .ok_or_else(|| Error::InvalidBaseUrl {
        url:    config.api_base_url.clone(),
        reason: "expected an absolute http(s) URL".into(),
      })?;
    Ok(Self {
      client,
      api_base,
      upload_url: config.upload_url,
      upload_preset: config.upload_preset,
    })
  }

  /// `<api_base>/<segments…>`, each segment percent-encoded.
  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.api_base.clone();
    // Checked in `new`: the base can always carry path segments.
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }
}

// ─── Response helpers ────────────────────────────────────────────────────────

fn transport(err: reqwest::Error) -> BackendError {
  BackendError::Transport(err.to_string())
}

fn decode(err: impl Display) -> BackendError { BackendError::Decode(err.to_string()) }

/// Turn a non-success response into [`BackendError::Status`], keeping the
/// body's `detail` message if it has one.
async fn status_error(resp: Response) -> BackendError {
  let status = resp.status().as_u16();
  let body = resp.text().await.unwrap_or_default();
  BackendError::Status {
    status,
    detail: detail_from_body(&body),
  }
}

/// The `detail` field of a JSON error body. Non-string details (validation
/// error lists) are rendered as JSON text.
pub fn detail_from_body(body: &str) -> Option<String> {
  let value: Value = serde_json::from_str(body).ok()?;
  match value.get("detail")? {
    Value::Null => None,
    Value::String(s) if s.trim().is_empty() => None,
    Value::String(s) => Some(s.clone()),
    other => Some(other.to_string()),
  }
}

async fn json_body<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, BackendError> {
  if !resp.status().is_success() {
    return Err(status_error(resp).await);
  }
  resp.json().await.map_err(decode)
}

fn file_part(image: &ImageUpload) -> Result<Part, BackendError> {
  let part = Part::bytes(image.bytes.to_vec()).file_name(image.file_name.clone());
  if image.content_type.is_empty() {
    return Ok(part);
  }
  part
    .mime_str(&image.content_type)
    .map_err(|e| BackendError::Decode(format!("invalid content type {:?}: {e}", image.content_type)))
}

// ─── RegistryBackend ─────────────────────────────────────────────────────────

impl RegistryBackend for HttpBackend {
  async fn upload_image<'a>(
    &'a self,
    image: &'a ImageUpload,
  ) -> Result<String, BackendError> {
    let form = Form::new()
      .part("file", file_part(image)?)
      .text("upload_preset", self.upload_preset.clone());
    debug!(file = %image.file_name, "POST {}", self.upload_url);
    let resp = self
      .client
      .post(&self.upload_url)
      .multipart(form)
      .send()
      .await
      .map_err(transport)?;

    let body: UploadResponse = json_body(resp).await?;
    body
      .secure_url
      .filter(|url| !url.trim().is_empty())
      .ok_or(BackendError::MissingLocation)
  }

  async fn parse_document<'a>(
    &'a self,
    image: &'a ImageUpload,
  ) -> Result<OcrExtraction, BackendError> {
    let url = self.url(&["ocr-parse"]);
    debug!(file = %image.file_name, "POST {url}");
    let form = Form::new().part("file", file_part(image)?);
    let resp = self
      .client
      .post(url)
      .multipart(form)
      .send()
      .await
      .map_err(transport)?;

    let body: OcrResponse = json_body(resp).await?;
    Ok(body.into())
  }

  async fn check_person<'a>(
    &'a self,
    identifier: &'a Identifier,
  ) -> Result<ExistenceResponse, BackendError> {
    let url = self.url(&["person", "exists", identifier.as_str()]);
    // Identifiers stay out of the logs.
    debug!("GET /person/exists/<id>");
    let resp = self.client.get(url).send().await.map_err(transport)?;
    json_body(resp).await
  }

  async fn lookup_geography<'a>(
    &'a self,
    village: &'a str,
  ) -> Result<Option<GeographyRecord>, BackendError> {
    let url = self.url(&["geography", "lookup", village]);
    debug!("GET {url}");
    let resp = self.client.get(url).send().await.map_err(transport)?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }

    let body: Value = json_body(resp).await?;
    body
      .as_object()
      .map(|object| Some(GeographyRecord::from_object(object)))
      .ok_or_else(|| decode("geography response is not an object"))
  }

  async fn submit<'a>(
    &'a self,
    payload: &'a SubmissionPayload,
  ) -> Result<Value, BackendError> {
    let url = self.url(&["person", "submit"]);
    debug!(fields = payload.as_map().len(), "POST {url}");
    let resp = self
      .client
      .post(url)
      .json(payload)
      .send()
      .await
      .map_err(transport)?;
    if !resp.status().is_success() {
      return Err(status_error(resp).await);
    }

    let text = resp.text().await.map_err(transport)?;
    if text.trim().is_empty() {
      return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(decode)
  }
}
