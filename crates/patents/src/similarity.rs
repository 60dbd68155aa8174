use serde::Serialize;

use crate::record::{Record, SimilarityVector};

/// Calculate cosine similarity between two similarity vectors
pub fn cosine_similarity(a: &SimilarityVector, b: &SimilarityVector) -> f64 {
  let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
  let magnitude_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
  let magnitude_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

  if magnitude_a == 0.0 || magnitude_b == 0.0 {
    0.0
  } else {
    (dot_product / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0)
  }
}

/// A record paired with its similarity to some reference vector
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord<'a> {
  pub record: &'a Record,
  pub similarity: f64,
}

/// Rank `candidates` by similarity to `vector`, highest first.
///
/// Equal scores keep their input order.
pub fn rank_by_similarity<'a, I>(vector: &SimilarityVector, candidates: I) -> Vec<ScoredRecord<'a>>
where
  I: IntoIterator<Item = &'a Record>,
{
  let mut scored: Vec<ScoredRecord<'a>> = candidates
    .into_iter()
    .map(|record| ScoredRecord {
      similarity: cosine_similarity(vector, &record.similarity_vector()),
      record,
    })
    .collect();

  scored.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
  scored
}

/// The `k` records most similar to `target`, never including `target` itself
pub fn nearest_records<'a>(target: &Record, candidates: &'a [Record], k: usize) -> Vec<ScoredRecord<'a>> {
  let vector = target.similarity_vector();
  let mut ranked =
    rank_by_similarity(&vector, candidates.iter().filter(|candidate| !candidate.same_record(target)));
  ranked.truncate(k);
  ranked
}
