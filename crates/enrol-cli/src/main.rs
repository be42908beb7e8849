//! `enrol`: drive the registration pipeline from the command line.
//!
//! # Usage
//!
//! ```
//! enrol villages Mu
//! enrol options SC
//! enrol lookup "1234 5678 9012" --role member
//! enrol scan ./aadhaar.jpg --role nominee
//! enrol village Kavali
//! enrol register --draft draft.toml --member-aadhaar ./m.jpg --nominee-aadhaar ./n.jpg
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

mod draft;
mod settings;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use draft::Draft;
use enrol_core::{
  backend::RegistryBackend,
  catalog::Catalog,
  document::ImageUpload,
  person::Role,
  submission::SubmitOutcome,
};
use enrol_http::HttpBackend;
use enrol_pipeline::{IngestOutcome, Pipeline};
use serde_json::{Value, json};
use settings::EnrolConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "enrol", about = "Member and nominee registration client")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "enrol.toml")]
  config: PathBuf,

  /// Base URL of the registration API.
  #[arg(long, env = "ENROL_API_BASE_URL", global = true)]
  api_url: Option<String>,

  /// Object-store upload endpoint.
  #[arg(long, env = "ENROL_UPLOAD_URL", global = true)]
  upload_url: Option<String>,

  /// Object-store upload preset.
  #[arg(long, env = "ENROL_UPLOAD_PRESET", global = true)]
  upload_preset: Option<String>,

  /// Per-request timeout in seconds.
  #[arg(long, value_name = "SECS", global = true)]
  timeout: Option<u64>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List known villages, optionally only those starting with PREFIX.
  Villages { prefix: Option<String> },

  /// List the fixed choices for each form field, or with CATEGORY the castes
  /// that reservation category allows.
  Options { category: Option<String> },

  /// Look up an Aadhaar number and show the resulting record.
  Lookup {
    identifier: String,
    #[arg(long, default_value = "member")]
    role:       Role,
  },

  /// Upload and OCR an Aadhaar card image, then autofill the record.
  Scan {
    image: PathBuf,
    #[arg(long, default_value = "member")]
    role:  Role,
  },

  /// Select a village and show the autofilled location.
  Village { name: String },

  /// Fill the form from a draft, scan documents, and submit.
  ///
  /// Typed identifiers are looked up, and scanned and looked-up data is
  /// applied after the draft, so a lookup overwrites typed fields and OCR
  /// only fills what is still empty.
  Register {
    #[arg(long, value_name = "FILE.toml")]
    draft:           PathBuf,
    #[arg(long, value_name = "IMAGE")]
    member_aadhaar:  Option<PathBuf>,
    #[arg(long, value_name = "IMAGE")]
    nominee_aadhaar: Option<PathBuf>,
    #[arg(long, value_name = "IMAGE")]
    member_photo:    Option<PathBuf>,
    #[arg(long, value_name = "IMAGE")]
    nominee_photo:   Option<PathBuf>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  // CLI flags override the environment, which overrides the config file.
  let mut cfg = EnrolConfig::load(&args.config)?;
  if let Some(url) = args.api_url {
    cfg.api_base_url = url;
  }
  if let Some(url) = args.upload_url {
    cfg.upload_url = url;
  }
  if let Some(preset) = args.upload_preset {
    cfg.upload_preset = preset;
  }
  if let Some(secs) = args.timeout {
    cfg.timeout_secs = secs;
  }

  let backend = HttpBackend::new(cfg.http()).context("building HTTP client")?;
  let pipeline = Pipeline::new(backend, cfg.catalog());

  let output = match args.command {
    Command::Villages { prefix } => {
      let prefix = prefix.unwrap_or_default();
      json!(pipeline.catalog().village_suggestions(&prefix))
    }
    Command::Options { category } => options(pipeline.catalog(), category.as_deref())?,
    Command::Lookup { identifier, role } => lookup(&pipeline, role, &identifier).await,
    Command::Scan { image, role } => scan(&pipeline, role, &image).await?,
    Command::Village { name } => {
      let geography = pipeline.select_village(&name).await;
      json!({
        "geography": geography,
        "location": pipeline.snapshot().await.location,
      })
    }
    Command::Register {
      draft,
      member_aadhaar,
      nominee_aadhaar,
      member_photo,
      nominee_photo,
    } => {
      let draft = Draft::read(&draft)?;
      draft.check(pipeline.catalog())?;
      register(&pipeline, draft, [
        (Role::Member, member_aadhaar, member_photo),
        (Role::Nominee, nominee_aadhaar, nominee_photo),
      ])
      .await?
    }
  };

  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}

// ─── Commands ─────────────────────────────────────────────────────────────────

fn options(catalog: &Catalog, category: Option<&str>) -> Result<Value> {
  let Some(category) = category else {
    return Ok(Value::Object(
      catalog
        .field_options()
        .into_iter()
        .map(|(field, options)| (field.to_owned(), json!(options)))
        .collect(),
    ));
  };
  let castes = catalog.castes_for(category.trim());
  if castes.is_empty() {
    bail!("unknown reservation category {category:?}");
  }
  Ok(json!({ "reservation_category": category.trim(), "castes": castes }))
}

async fn lookup<B: RegistryBackend>(
  pipeline: &Pipeline<B>,
  role: Role,
  identifier: &str,
) -> Value {
  let result = pipeline.lookup(role, identifier).await;
  let session = pipeline.snapshot().await;
  json!({
    "lookup": result,
    "record": session.record(role),
    "already_registered": session.is_already_registered(),
  })
}

async fn scan<B: RegistryBackend>(
  pipeline: &Pipeline<B>,
  role: Role,
  image: &Path,
) -> Result<Value> {
  let report = match pipeline.ingest(role, read_image(image).await?).await? {
    IngestOutcome::Applied(report) => report,
    IngestOutcome::Superseded => bail!("{role} scan was superseded by a form reset"),
  };
  let session = pipeline.snapshot().await;
  Ok(json!({
    "aadhaar_image_url": report.remote_url,
    "identifier_found": !report.identifier_candidate.is_empty(),
    "lookup": report.lookup,
    "record": session.record(role),
    "location": session.location,
  }))
}

/// Documents for one role: (role, aadhaar card, portrait photo).
type RoleDocuments = (Role, Option<PathBuf>, Option<PathBuf>);

async fn register<B: RegistryBackend>(
  pipeline: &Pipeline<B>,
  draft: Draft,
  documents: [RoleDocuments; 2],
) -> Result<Value> {
  for role in Role::ALL {
    let person = draft.person(role);
    pipeline.edit(role, |r| person.fill(r)).await;
    // A typed identifier is checked like one entered on the form, so an
    // already-registered member blocks submission.
    if let Some(identifier) = &person.identifier {
      pipeline.lookup(role, identifier).await;
    }
  }

  // Both roles' documents are processed at once.
  let [member, nominee] = documents;
  tokio::try_join!(
    process_documents(pipeline, member),
    process_documents(pipeline, nominee),
  )?;

  if let Some(village) = &draft.location.village {
    pipeline.select_village(village).await;
  }
  pipeline.edit_location(|l| draft.location.fill(l)).await;

  match pipeline.submit().await? {
    SubmitOutcome::Accepted(body) => Ok(json!({ "status": "accepted", "response": body })),
    SubmitOutcome::Blocked(block) => bail!("registration blocked: {block}"),
  }
}

async fn process_documents<B: RegistryBackend>(
  pipeline: &Pipeline<B>,
  (role, aadhaar, photo): RoleDocuments,
) -> Result<()> {
  if let Some(path) = aadhaar {
    scan(pipeline, role, &path).await?;
  }
  if let Some(path) = photo {
    pipeline.upload_photo(role, read_image(&path).await?).await?;
  }
  Ok(())
}

// ─── Images ───────────────────────────────────────────────────────────────────

async fn read_image(path: &Path) -> Result<ImageUpload> {
  let bytes = tokio::fs::read(path)
    .await
    .with_context(|| format!("reading image {}", path.display()))?;
  let file_name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "image".to_owned());
  Ok(
    ImageUpload::new(file_name, content_type(path), bytes)
      .with_preview(path.display().to_string()),
  )
}

fn content_type(path: &Path) -> &'static str {
  let ext = path
    .extension()
    .map(|e| e.to_string_lossy().to_ascii_lowercase())
    .unwrap_or_default();
  match ext.as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "webp" => "image/webp",
    "heic" => "image/heic",
    _ => "application/octet-stream",
  }
}
