//! Patent list filtering
//!
//! A [`FilterState`] holds five independent criteria which are ANDed
//! together. An inactive criterion matches every record.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::record::Record;

/// A single filter criterion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Criterion {
  #[default]
  Any,
  Match(String),
  /// A value that could not be read as text; matches nothing
  Malformed,
}

impl Criterion {
  /// Build from user text, where an empty string means "match all"
  pub fn from_text(text: Option<&str>) -> Self {
    match text {
      Some(t) if !t.is_empty() => Criterion::Match(t.to_string()),
      _ => Criterion::Any,
    }
  }

  pub fn is_active(&self) -> bool {
    !matches!(self, Criterion::Any)
  }

  fn test(&self, predicate: impl FnOnce(&str) -> bool) -> bool {
    match self {
      Criterion::Any => true,
      Criterion::Match(value) => predicate(value),
      Criterion::Malformed => false,
    }
  }
}

impl<'de> Deserialize<'de> for Criterion {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
      Value::Null => Criterion::Any,
      Value::String(s) => Criterion::from_text(Some(&s)),
      _ => Criterion::Malformed,
    })
  }
}

impl Serialize for Criterion {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match self {
      Criterion::Match(value) => serializer.serialize_some(value),
      Criterion::Any | Criterion::Malformed => serializer.serialize_none(),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
  /// Exact cluster name
  #[serde(default)]
  pub cluster: Criterion,
  /// Exact year, compared as text
  #[serde(default)]
  pub year: Criterion,
  /// Exact country code
  #[serde(default)]
  pub country: Criterion,
  /// Keyword the record must carry
  #[serde(default)]
  pub keyword: Criterion,
  /// Case-insensitive substring of title or applicants
  #[serde(default)]
  pub search: Criterion,
}

impl FilterState {
  pub fn is_empty(&self) -> bool {
    ![&self.cluster, &self.year, &self.country, &self.keyword, &self.search]
      .iter()
      .any(|c| c.is_active())
  }

  pub fn matches(&self, record: &Record) -> bool {
    self.cluster.test(|cluster| record.cluster() == Some(cluster))
      && self.year.test(|year| record.year().is_some_and(|y| y.to_string() == year))
      && self.country.test(|country| record.country() == Some(country))
      && self.keyword.test(|keyword| record.keywords().iter().any(|k| k == keyword))
      && self.search.test(|needle| matches_search(record, needle))
  }
}

fn matches_search(record: &Record, needle: &str) -> bool {
  let needle = needle.to_lowercase();
  [record.title(), record.applicants()]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Records passing every active criterion, in input order
pub fn apply_filters(records: &[Record], filters: &FilterState) -> Vec<Record> {
  records.iter().filter(|r| filters.matches(r)).cloned().collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::normalize::{normalize, EnrichmentRule};
  use crate::record::RawRecord;
  use serde_json::json;

  fn records() -> Vec<Record> {
    let mut first = RawRecord::new(3, "Foldable display hinge");
    first.applicants = Some("Samsung Display Co".to_string());
    first.year = Some(2020);
    let mut second = RawRecord::new(22, "Ambient light sensing band");
    second.applicants = Some("LG Electronics".to_string());
    normalize(vec![first, second, RawRecord::new(40, "Smart ring")], &EnrichmentRule::default())
  }

  #[test]
  fn test_empty_filters_are_identity() {
    let records = records();
    assert!(FilterState::default().is_empty());
    assert_eq!(apply_filters(&records, &FilterState::default()), records);
  }

  #[test]
  fn test_year_compared_as_text() {
    let filters = FilterState { year: Criterion::from_text(Some("2018")), ..Default::default() };
    let filtered = apply_filters(&records(), &filters);

    assert_eq!(filtered.len(), 2);
    assert!(filtered.iter().all(|r| r.year() == Some(2018)));
  }

  #[test]
  fn test_search_matches_title_or_applicants() {
    let by_applicant = FilterState { search: Criterion::from_text(Some("samsung")), ..Default::default() };
    assert_eq!(apply_filters(&records(), &by_applicant)[0].no(), Some(3));

    let by_title = FilterState { search: Criterion::from_text(Some("RING")), ..Default::default() };
    assert_eq!(apply_filters(&records(), &by_title)[0].no(), Some(40));
  }

  #[test]
  fn test_criteria_are_anded() {
    let filters = FilterState {
      cluster: Criterion::from_text(Some("Wearable Technology")),
      keyword: Criterion::from_text(Some("sensor")),
      search: Criterion::from_text(Some("band")),
      ..Default::default()
    };
    let filtered = apply_filters(&records(), &filters);

    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].no(), Some(22));
  }

  #[test]
  fn test_deserialize_treats_non_strings_as_malformed() {
    let filters: FilterState =
      serde_json::from_value(json!({ "year": 2018, "country": "", "cluster": null })).unwrap();

    assert_eq!(filters.year, Criterion::Malformed);
    assert_eq!(filters.country, Criterion::Any);
    assert_eq!(filters.cluster, Criterion::Any);
    assert!(apply_filters(&records(), &filters).is_empty());
  }

  #[test]
  fn test_filtering_is_idempotent() {
    let filters = FilterState { country: Criterion::from_text(Some("KR")), ..Default::default() };
    let once = apply_filters(&records(), &filters);
    let twice = apply_filters(&once, &filters);
    assert_eq!(once, twice);
  }
}
