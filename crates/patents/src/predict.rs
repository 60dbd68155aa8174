//! Mock cluster prediction for a submitted abstract
//!
//! No model runs here. Keywords come from a stop-word filter over the text,
//! and the "feature vector" is drawn at random, independent of the text, then
//! matched against the vectors already present in the dataset. Submitting the
//! same abstract twice can therefore predict different clusters.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PatentError, Result};
use crate::normalize::EnrichmentRule;
use crate::record::{Record, SimilarityVector, VECTOR_DIM};
use crate::similarity::{cosine_similarity, rank_by_similarity};
use crate::source::{load_dataset, PatentSource};

/// Typed abstracts longer than this are rejected; uploads are exempt
pub const DEFAULT_MAX_ABSTRACT_CHARS: usize = 1000;

pub const MAX_EXTRACTED_KEYWORDS: usize = 5;

pub const DEFAULT_SIMILAR_PATENTS: usize = 3;

const STOP_WORDS: &[&str] = &["this", "for", "with", "and", "the", "in", "a"];

/// Candidate keywords of `text`: lowercase word tokens longer than three
/// characters, stop words removed, first occurrence kept, at most five.
/// Word characters are ASCII letters, digits and `_`; anything else splits.
pub fn extract_keywords(text: &str) -> Vec<String> {
  let lowered = text.to_lowercase();
  let mut seen = HashSet::new();

  lowered
    .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
    .filter(|token| token.chars().count() > 3 && !STOP_WORDS.contains(token))
    .filter(|token| seen.insert(*token))
    .take(MAX_EXTRACTED_KEYWORDS)
    .map(str::to_string)
    .collect()
}

/// An abstract as submitted by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbstractInput {
  Typed(String),
  Uploaded { file_name: String, contents: String },
}

impl AbstractInput {
  /// Read an uploaded abstract; only UTF-8 `.txt` files are accepted
  pub fn from_file(path: &Path) -> Result<Self> {
    let file_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

    let is_text = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("txt"));
    if !is_text {
      return Err(PatentError::unsupported_file_type(file_name));
    }

    let bytes = std::fs::read(path).map_err(|e| PatentError::fetch(path.display().to_string(), e.to_string()))?;
    let contents = String::from_utf8(bytes).map_err(|_| PatentError::unsupported_file_type(&file_name))?;

    Ok(Self::Uploaded { file_name, contents })
  }

  pub fn text(&self) -> &str {
    match self {
      AbstractInput::Typed(text) => text,
      AbstractInput::Uploaded { contents, .. } => contents,
    }
  }

  /// Check the input can be submitted, returning the text to predict from
  pub fn validate(&self, max_chars: usize) -> Result<&str> {
    let text = self.text();
    if text.trim().is_empty() {
      return Err(PatentError::EmptyInput);
    }

    if let AbstractInput::Typed(typed) = self {
      let length = typed.chars().count();
      if length > max_chars {
        return Err(PatentError::abstract_too_long(length, max_chars));
      }
    }

    Ok(text)
  }
}

/// A similar patent from the predicted cluster
#[derive(Debug, Clone, Serialize)]
pub struct SimilarPatent {
  pub record: Record,
  pub similarity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
  pub cluster: Option<String>,
  pub cluster_id: Option<i64>,
  pub keywords: Vec<String>,
  pub similar_patents: Vec<SimilarPatent>,
  pub predicted_at: DateTime<Utc>,
}

/// Uniform random stand-in for a real text embedding
pub fn random_vector<R: Rng + ?Sized>(rng: &mut R) -> SimilarityVector {
  let mut vector = [0.0; VECTOR_DIM];
  for value in vector.iter_mut() {
    *value = rng.random::<f64>();
  }
  vector
}

/// Predict a cluster for `text` against `corpus`
pub fn predict_cluster<R: Rng + ?Sized>(text: &str, corpus: &[Record], rng: &mut R) -> Result<PredictionResult> {
  predict_cluster_with(text, corpus, DEFAULT_SIMILAR_PATENTS, rng)
}

pub fn predict_cluster_with<R: Rng + ?Sized>(
  text: &str,
  corpus: &[Record],
  similar_count: usize,
  rng: &mut R,
) -> Result<PredictionResult> {
  if text.trim().is_empty() {
    return Err(PatentError::EmptyInput);
  }

  let keywords = extract_keywords(text);
  let vector = random_vector(rng);
  debug!("Prediction vector drawn - keywords={:?}, vector={:?}", keywords, vector);

  let best = best_match(&vector, corpus).ok_or(PatentError::EmptyDataset)?;
  let cluster_id = best.cluster_id();

  let similar_patents = rank_by_similarity(&vector, corpus.iter().filter(|r| r.cluster_id() == cluster_id))
    .into_iter()
    .take(similar_count)
    .map(|scored| SimilarPatent { record: scored.record.clone(), similarity: scored.similarity })
    .collect();

  Ok(PredictionResult {
    cluster: best.cluster().map(str::to_string),
    cluster_id,
    keywords,
    similar_patents,
    predicted_at: Utc::now(),
  })
}

/// Record most similar to `vector`; the earliest one wins a tie
fn best_match<'a>(vector: &SimilarityVector, corpus: &'a [Record]) -> Option<&'a Record> {
  let mut best: Option<(&Record, f64)> = None;
  for record in corpus {
    let similarity = cosine_similarity(vector, &record.similarity_vector());
    match best {
      Some((_, top)) if similarity <= top => {}
      _ => best = Some((record, similarity)),
    }
  }
  best.map(|(record, _)| record)
}

/// Prediction service backed by its own dataset source.
///
/// Each call loads the dataset afresh; nothing is shared with the other views.
pub struct Predictor {
  source: Box<dyn PatentSource>,
  rule: EnrichmentRule,
  max_chars: usize,
  similar_count: usize,
}

impl Predictor {
  pub fn new(source: Box<dyn PatentSource>, rule: EnrichmentRule) -> Self {
    Self { source, rule, max_chars: DEFAULT_MAX_ABSTRACT_CHARS, similar_count: DEFAULT_SIMILAR_PATENTS }
  }

  pub fn with_limits(mut self, max_chars: usize, similar_count: usize) -> Self {
    self.max_chars = max_chars;
    self.similar_count = similar_count;
    self
  }

  pub async fn predict(&self, input: &AbstractInput) -> Result<PredictionResult> {
    let text = input.validate(self.max_chars)?;
    let corpus = self.load_corpus().await?;
    self.finish(text, &corpus, &mut rand::rng())
  }

  /// Like [`Predictor::predict`], drawing the stand-in vector from `rng`
  pub async fn predict_with_rng<R: Rng + ?Sized>(&self, input: &AbstractInput, rng: &mut R) -> Result<PredictionResult> {
    let text = input.validate(self.max_chars)?;
    let corpus = self.load_corpus().await?;
    self.finish(text, &corpus, rng)
  }

  async fn load_corpus(&self) -> Result<Vec<Record>> {
    load_dataset(self.source.as_ref(), &self.rule).await.map_err(PatentError::data_unavailable)
  }

  fn finish<R: Rng + ?Sized>(&self, text: &str, corpus: &[Record], rng: &mut R) -> Result<PredictionResult> {
    let result = predict_cluster_with(text, corpus, self.similar_count, rng).map_err(|e| match e {
      PatentError::EmptyDataset => PatentError::data_unavailable(e),
      other => other,
    })?;

    info!(
      "Predicted cluster - cluster={}, cluster_id={:?}, similar={}",
      result.cluster.as_deref().unwrap_or("none"),
      result.cluster_id,
      result.similar_patents.len()
    );
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::normalize::normalize;
  use crate::record::RawRecord;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn record(no: i64, cluster_id: i64, vector: SimilarityVector) -> Record {
    let mut raw = RawRecord::new(no, &format!("Patent {no}"));
    raw.cluster_id = Some(cluster_id);
    raw.cluster = Some(format!("Cluster {cluster_id}"));
    raw.similarity_vector = Some(vector);
    Record::Raw(raw)
  }

  #[test]
  fn test_extract_keywords_filters_and_dedupes() {
    let keywords = extract_keywords("This wearable device, with a WEARABLE sensor and the display-panel for data_sync");
    assert_eq!(keywords, vec!["wearable", "device", "sensor", "display", "panel"]);
  }

  #[test]
  fn test_extract_keywords_drops_short_tokens() {
    assert!(extract_keywords("a an the for and of").is_empty());
  }

  #[test]
  fn test_extract_keywords_keeps_underscored_tokens() {
    assert_eq!(extract_keywords("data_sync"), vec!["data_sync"]);
  }

  #[test]
  fn test_extract_keywords_splits_on_non_ascii() {
    assert_eq!(extract_keywords("café résumé naïve systems"), vec!["systems"]);
    assert_eq!(extract_keywords("Ölpumpe"), vec!["lpumpe"]);
  }

  #[test]
  fn test_empty_text_is_rejected() {
    let mut rng = StdRng::seed_from_u64(1);
    let err = predict_cluster("", &[], &mut rng).unwrap_err();
    assert!(matches!(err, PatentError::EmptyInput));

    let err = predict_cluster("   \n", &[], &mut rng).unwrap_err();
    assert!(matches!(err, PatentError::EmptyInput));
  }

  #[test]
  fn test_empty_corpus_is_reported() {
    let mut rng = StdRng::seed_from_u64(1);
    let err = predict_cluster("optical sensor array", &[], &mut rng).unwrap_err();
    assert!(matches!(err, PatentError::EmptyDataset));
  }

  #[test]
  fn test_random_vector_in_unit_interval() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
      assert!(random_vector(&mut rng).iter().all(|v| (0.0..1.0).contains(v)));
    }
  }

  #[test]
  fn test_similar_patents_stay_in_predicted_cluster() {
    let corpus = vec![
      record(1, 1, [1.0, 0.2, 0.1, 0.4, 0.3]),
      record(2, 2, [0.1, 0.9, 0.8, 0.1, 0.2]),
      record(3, 1, [0.9, 0.3, 0.2, 0.5, 0.1]),
      record(4, 2, [0.2, 0.7, 0.9, 0.3, 0.3]),
      record(5, 1, [0.8, 0.1, 0.3, 0.2, 0.6]),
      record(6, 1, [0.7, 0.4, 0.1, 0.1, 0.2]),
    ];
    let mut rng = StdRng::seed_from_u64(42);

    let result = predict_cluster("Flexible battery electrode coating", &corpus, &mut rng).unwrap();

    assert!(result.similar_patents.len() <= 3);
    assert!(result.similar_patents.iter().all(|p| p.record.cluster_id() == result.cluster_id));
    assert!(result.similar_patents.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    assert_eq!(result.keywords, vec!["flexible", "battery", "electrode", "coating"]);
  }

  #[test]
  fn test_best_match_tie_prefers_first() {
    let same = [0.5, 0.5, 0.5, 0.5, 0.5];
    let corpus = vec![record(1, 7, same), record(2, 8, same)];
    let best = best_match(&[0.1, 0.2, 0.3, 0.4, 0.5], &corpus).unwrap();
    assert_eq!(best.no(), Some(1));
  }

  #[test]
  fn test_unenriched_corpus_predicts_no_cluster() {
    let corpus = normalize(vec![RawRecord::new(1, "a"), RawRecord::new(2, "b")], &EnrichmentRule::default());
    let mut rng = StdRng::seed_from_u64(3);

    let result = predict_cluster("wireless charging coil", &corpus, &mut rng).unwrap();
    assert_eq!(result.cluster, None);
    assert_eq!(result.similar_patents.len(), 2);
  }

  #[test]
  fn test_typed_input_length_limit() {
    let long = AbstractInput::Typed("x".repeat(1001));
    assert!(matches!(long.validate(1000), Err(PatentError::AbstractTooLong { length: 1001, limit: 1000 })));

    let uploaded = AbstractInput::Uploaded { file_name: "a.txt".to_string(), contents: "x".repeat(5000) };
    assert!(uploaded.validate(1000).is_ok());
  }

  #[test]
  fn test_blank_upload_is_empty_input() {
    let uploaded = AbstractInput::Uploaded { file_name: "a.txt".to_string(), contents: "  ".to_string() };
    assert!(matches!(uploaded.validate(1000), Err(PatentError::EmptyInput)));
  }

  #[test]
  fn test_non_text_upload_is_rejected() {
    let err = AbstractInput::from_file(Path::new("abstract.pdf")).unwrap_err();
    assert!(matches!(err, PatentError::UnsupportedFileType { .. }));
  }
}
