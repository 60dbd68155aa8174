//! Record normalization
//!
//! The dataset ships with clustering metadata for only part of its records.
//! Until the upstream pipeline provides a per-record join, every record whose
//! identifier exceeds the rule's threshold receives a copy of one fixed
//! enrichment payload; everything else passes through untouched.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::{EnrichedRecord, Enrichment, RawRecord, Record};

pub const DEFAULT_ENRICHMENT_THRESHOLD: i64 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRule {
  /// Records with an identifier strictly greater than this are enriched
  #[serde(default = "default_threshold")]
  pub threshold: i64,
  #[serde(default)]
  pub payload: Enrichment,
}

fn default_threshold() -> i64 {
  DEFAULT_ENRICHMENT_THRESHOLD
}

impl Default for EnrichmentRule {
  fn default() -> Self {
    Self { threshold: default_threshold(), payload: Enrichment::default() }
  }
}

impl EnrichmentRule {
  /// Records without a numeric identifier never qualify. Fractional
  /// identifiers compare by value, so 20.5 is above a threshold of 20.
  pub fn qualifies(&self, raw: &RawRecord) -> bool {
    raw.identifier_value().is_some_and(|no| no > self.threshold as f64)
  }

  pub fn apply(&self, raw: RawRecord) -> Record {
    if self.qualifies(&raw) {
      Record::Enriched(EnrichedRecord { raw, enrichment: self.payload.clone() })
    } else {
      Record::Raw(raw)
    }
  }
}

/// Normalize raw records, preserving input order
pub fn normalize(records: Vec<RawRecord>, rule: &EnrichmentRule) -> Vec<Record> {
  let normalized: Vec<Record> = records.into_iter().map(|raw| rule.apply(raw)).collect();

  debug!(
    "Normalized records - total={}, enriched={}, threshold={}",
    normalized.len(),
    normalized.iter().filter(|r| r.is_enriched()).count(),
    rule.threshold
  );

  normalized
}
