//! Read-only option tables used by the form.
//!
//! Built once per process and shared; nothing here changes after
//! construction.

/// Villages with a known geography record.
pub const VILLAGE_NAMES: &[&str] = &[
  "Muchivolu",
  "Bokkasam Palem",
  "Munipalle",
  "Muthukur",
  "Madanapalle",
  "Chintalapudi",
  "Chandragiri",
  "Kalikiri",
  "Kavali",
  "Kodur",
  "Nellore",
  "Naidupeta",
];

pub const GENDER_OPTIONS: &[&str] = &["Male", "Female", "Others"];

pub const EDUCATION_OPTIONS: &[&str] = &[
  "Illiterate",
  "Below SSC",
  "SSC",
  "Intermediate",
  "Bachelors Degree",
  "Master Degree",
  "PHD",
];

pub const PROFESSION_OPTIONS: &[&str] = &[
  "Government Job",
  "Private Sector",
  "Business / Self Employed",
  "Farmer",
  "Daily Labourer",
  "Electrician",
  "Driver",
  "Doctor",
  "Software Engineer",
];

pub const RELIGION_OPTIONS: &[&str] =
  &["Hindu", "Muslim", "Christian", "Sikh", "Jain", "Buddhism", "Others"];

pub const RESERVATION_OPTIONS: &[&str] = &[
  "ST",
  "SC",
  "OC / GENERAL",
  "BC-A",
  "BC-B",
  "BC-C",
  "BC-D",
  "BC-E",
  "Others",
];

/// Caste options per reservation category.
pub const CASTE_BY_RESERVATION: &[(&str, &[&str])] = &[
  ("ST", &["Mala", "Madiga"]),
  ("SC", &["Yanadhi", "Sugali"]),
  ("OC / GENERAL", &["OC-1", "OC-2"]),
  ("BC-A", &["BC-A-1", "BC-A-2"]),
  ("BC-B", &["BC-B-1", "BC-B-2"]),
  ("BC-C", &["BC-C-1"]),
  ("BC-D", &["BC-D-1"]),
  ("BC-E", &["BC-E-1"]),
  ("Others", &["Other-1", "Other-2"]),
];

/// The village list, sorted once at construction.
#[derive(Debug, Clone)]
pub struct Catalog {
  villages: Vec<String>,
}

impl Default for Catalog {
  fn default() -> Self { Self::with_villages(VILLAGE_NAMES.iter().copied()) }
}

impl Catalog {
  /// Replace the built-in village list, e.g. from configuration.
  pub fn with_villages<I, S>(villages: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut villages: Vec<String> = villages.into_iter().map(Into::into).collect();
    villages.sort();
    villages.dedup();
    Self { villages }
  }

  pub fn villages(&self) -> &[String] { &self.villages }

  /// Villages starting with `prefix`, ignoring case, in sorted order.
  pub fn village_suggestions(&self, prefix: &str) -> Vec<&str> {
    let prefix = prefix.trim().to_lowercase();
    self
      .villages
      .iter()
      .filter(|v| v.to_lowercase().starts_with(&prefix))
      .map(String::as_str)
      .collect()
  }

  /// The canonical spelling of `name` if it is a known village.
  pub fn known_village(&self, name: &str) -> Option<&str> {
    let name = name.trim();
    self
      .villages
      .iter()
      .find(|v| v.eq_ignore_ascii_case(name))
      .map(String::as_str)
  }

  /// The fixed choice lists, keyed by the form field they constrain.
  pub fn field_options(&self) -> [(&'static str, &'static [&'static str]); 5] {
    [
      ("gender", GENDER_OPTIONS),
      ("education", EDUCATION_OPTIONS),
      ("profession", PROFESSION_OPTIONS),
      ("religion", RELIGION_OPTIONS),
      ("reservation_category", RESERVATION_OPTIONS),
    ]
  }

  /// Caste options for `category`; empty for an unknown category.
  pub fn castes_for(&self, category: &str) -> &'static [&'static str] {
    CASTE_BY_RESERVATION
      .iter()
      .find(|(c, _)| *c == category)
      .map(|(_, castes)| *castes)
      .unwrap_or(&[])
  }
}
