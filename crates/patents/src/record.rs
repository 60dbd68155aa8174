//! Patent record model
//!
//! Records arrive as [`RawRecord`]s straight from the static dataset. The
//! normalizer turns each one into a [`Record`], which is either the raw record
//! untouched or the raw record paired with a copy of the [`Enrichment`]
//! payload. Every view reads records through the accessors on [`Record`], so
//! callers never need to know which shape they are holding.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Dimension of every similarity vector in the dataset
pub const VECTOR_DIM: usize = 5;

pub type SimilarityVector = [f64; VECTOR_DIM];

/// Vector used for records that carry no similarity data
pub const ZERO_VECTOR: SimilarityVector = [0.0; VECTOR_DIM];

/// A patent entry exactly as it appears in the static dataset.
///
/// Every field is optional and read leniently: a value of the wrong JSON type
/// is treated as absent rather than failing the whole document, and integral
/// numbers are accepted from strings or whole floats. Whenever the typed field
/// does not reproduce the dataset value exactly, the original value is kept in
/// `extra` under its own key and is what gets serialized. Fields this model
/// does not know about are kept verbatim in `extra` too.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
  pub no: Option<i64>,
  pub title: Option<String>,
  pub applicants: Option<String>,
  pub abstract_text: Option<String>,

  // Partial clustering metadata some records already carry
  pub keywords: Option<Vec<String>>,
  pub cluster: Option<String>,
  pub cluster_id: Option<i64>,
  pub year: Option<i32>,
  pub country: Option<String>,
  pub similarity_vector: Option<SimilarityVector>,

  pub extra: Map<String, Value>,
}

impl RawRecord {
  pub fn new(no: i64, title: &str) -> Self {
    Self { no: Some(no), title: Some(title.to_string()), ..Self::default() }
  }

  /// Numeric value of the identifier, including fractional ones that have no
  /// integral `no`
  pub fn identifier_value(&self) -> Option<f64> {
    self.no.map(|no| no as f64).or_else(|| self.extra.get("No").and_then(read_number))
  }
}

impl<'de> Deserialize<'de> for RawRecord {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    let mut extra = Map::<String, Value>::deserialize(deserializer)?;

    Ok(Self {
      no: take(&mut extra, "No", read_integer),
      title: take(&mut extra, "Title", read_string),
      applicants: take(&mut extra, "Applicants", read_string),
      abstract_text: take(&mut extra, "abstract", read_string),
      keywords: take(&mut extra, "keywords", read_keywords),
      cluster: take(&mut extra, "cluster", read_string),
      cluster_id: take(&mut extra, "cluster_id", read_integer),
      year: take(&mut extra, "year", |v| read_integer(v).and_then(|y| i32::try_from(y).ok())),
      country: take(&mut extra, "country", read_string),
      similarity_vector: take(&mut extra, "similarity_vector", |v| serde_json::from_value(v.clone()).ok()),
      extra,
    })
  }
}

impl Serialize for RawRecord {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    let mut fields = Map::new();
    put(&mut fields, "No", &self.no).map_err(serde::ser::Error::custom)?;
    put(&mut fields, "Title", &self.title).map_err(serde::ser::Error::custom)?;
    put(&mut fields, "Applicants", &self.applicants).map_err(serde::ser::Error::custom)?;
    put(&mut fields, "abstract", &self.abstract_text).map_err(serde::ser::Error::custom)?;
    put(&mut fields, "keywords", &self.keywords).map_err(serde::ser::Error::custom)?;
    put(&mut fields, "cluster", &self.cluster).map_err(serde::ser::Error::custom)?;
    put(&mut fields, "cluster_id", &self.cluster_id).map_err(serde::ser::Error::custom)?;
    put(&mut fields, "year", &self.year).map_err(serde::ser::Error::custom)?;
    put(&mut fields, "country", &self.country).map_err(serde::ser::Error::custom)?;
    put(&mut fields, "similarity_vector", &self.similarity_vector).map_err(serde::ser::Error::custom)?;

    // Verbatim dataset values win over the typed reading
    for (key, value) in &self.extra {
      fields.insert(key.clone(), value.clone());
    }
    fields.serialize(serializer)
  }
}

/// Clustering metadata merged onto qualifying records.
///
/// Each enriched record owns its own copy; nothing is shared between records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
  pub keywords: Vec<String>,
  pub cluster: String,
  pub cluster_id: i64,
  pub year: i32,
  pub country: String,
  pub similarity_vector: SimilarityVector,
}

impl Default for Enrichment {
  fn default() -> Self {
    Self {
      keywords: ["electronic", "device", "method", "controlling", "ambient", "light", "sensor"]
        .iter()
        .map(|k| k.to_string())
        .collect(),
      cluster: "Wearable Technology".to_string(),
      cluster_id: 2,
      year: 2018,
      country: "KR".to_string(),
      similarity_vector: [0.34, 0.78, 0.56, 0.12, 0.45],
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
  pub raw: RawRecord,
  pub enrichment: Enrichment,
}

/// A normalized patent record
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
  Raw(RawRecord),
  Enriched(EnrichedRecord),
}

impl Record {
  pub fn raw(&self) -> &RawRecord {
    match self {
      Record::Raw(raw) => raw,
      Record::Enriched(enriched) => &enriched.raw,
    }
  }

  pub fn is_enriched(&self) -> bool {
    matches!(self, Record::Enriched(_))
  }

  pub fn no(&self) -> Option<i64> {
    self.raw().no
  }

  pub fn title(&self) -> Option<&str> {
    self.raw().title.as_deref()
  }

  /// Title for display, falling back to "Untitled"
  pub fn label(&self) -> &str {
    self.title().filter(|t| !t.trim().is_empty()).unwrap_or("Untitled")
  }

  pub fn applicants(&self) -> Option<&str> {
    self.raw().applicants.as_deref()
  }

  pub fn abstract_text(&self) -> Option<&str> {
    self.raw().abstract_text.as_deref()
  }

  /// Keywords of this record; records without any read as empty
  pub fn keywords(&self) -> &[String] {
    match self {
      Record::Raw(raw) => raw.keywords.as_deref().unwrap_or(&[]),
      Record::Enriched(enriched) => &enriched.enrichment.keywords,
    }
  }

  pub fn cluster(&self) -> Option<&str> {
    match self {
      Record::Raw(raw) => raw.cluster.as_deref(),
      Record::Enriched(enriched) => Some(&enriched.enrichment.cluster),
    }
  }

  pub fn cluster_id(&self) -> Option<i64> {
    match self {
      Record::Raw(raw) => raw.cluster_id,
      Record::Enriched(enriched) => Some(enriched.enrichment.cluster_id),
    }
  }

  pub fn year(&self) -> Option<i32> {
    match self {
      Record::Raw(raw) => raw.year,
      Record::Enriched(enriched) => Some(enriched.enrichment.year),
    }
  }

  pub fn country(&self) -> Option<&str> {
    match self {
      Record::Raw(raw) => raw.country.as_deref(),
      Record::Enriched(enriched) => Some(&enriched.enrichment.country),
    }
  }

  /// Similarity vector, or the zero vector when the record has none
  pub fn similarity_vector(&self) -> SimilarityVector {
    match self {
      Record::Raw(raw) => raw.similarity_vector.unwrap_or(ZERO_VECTOR),
      Record::Enriched(enriched) => enriched.enrichment.similarity_vector,
    }
  }

  /// Flatten into the raw shape with enrichment fields merged over the raw ones
  pub fn to_raw(&self) -> RawRecord {
    match self {
      Record::Raw(raw) => raw.clone(),
      Record::Enriched(EnrichedRecord { raw, enrichment }) => {
        let mut merged = raw.clone();
        // Merged fields must not also linger as unknown extras
        for key in ["keywords", "cluster", "cluster_id", "year", "country", "similarity_vector"] {
          merged.extra.remove(key);
        }
        merged.keywords = Some(enrichment.keywords.clone());
        merged.cluster = Some(enrichment.cluster.clone());
        merged.cluster_id = Some(enrichment.cluster_id);
        merged.year = Some(enrichment.year);
        merged.country = Some(enrichment.country.clone());
        merged.similarity_vector = Some(enrichment.similarity_vector);
        merged
      }
    }
  }

  /// Identity used when excluding a record from its own neighbour list
  pub(crate) fn same_record(&self, other: &Record) -> bool {
    match (self.no(), other.no()) {
      (Some(a), Some(b)) => a == b,
      _ => std::ptr::eq(self, other),
    }
  }
}

impl Serialize for Record {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match self {
      Record::Raw(raw) => raw.serialize(serializer),
      Record::Enriched(_) => self.to_raw().serialize(serializer),
    }
  }
}

/// Read `key` out of `extra` with `read`. The raw value is left in place
/// unless the typed reading serializes back to exactly the same JSON.
fn take<T: Serialize>(extra: &mut Map<String, Value>, key: &str, read: impl Fn(&Value) -> Option<T>) -> Option<T> {
  let raw = extra.get(key)?;
  let value = read(raw);
  let canonical = value.as_ref().and_then(|v| serde_json::to_value(v).ok());
  if canonical.as_ref() == Some(raw) {
    extra.remove(key);
  }
  value
}

fn put<T: Serialize>(fields: &mut Map<String, Value>, key: &str, value: &Option<T>) -> serde_json::Result<()> {
  if let Some(value) = value {
    fields.insert(key.to_string(), serde_json::to_value(value)?);
  }
  Ok(())
}

fn read_string(value: &Value) -> Option<String> {
  value.as_str().map(str::to_string)
}

fn read_number(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
    _ => None,
  }
}

/// Integers, integral strings and whole floats
fn read_integer(value: &Value) -> Option<i64> {
  let exact = match value {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  };
  exact.or_else(|| {
    read_number(value).filter(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64).map(|n| n as i64)
  })
}

/// String entries only; empty strings carry no keyword
fn read_keywords(value: &Value) -> Option<Vec<String>> {
  let items = value.as_array()?;
  Some(items.iter().filter_map(Value::as_str).filter(|s| !s.is_empty()).map(str::to_string).collect())
}
