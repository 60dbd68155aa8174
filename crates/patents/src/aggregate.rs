//! View projections over normalized records
//!
//! Everything here is recomputed from scratch on every call; record counts are
//! small enough that no incremental bookkeeping is worth having.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use crate::record::Record;

/// Records sharing one `cluster_id`, in first-appearance order
#[derive(Debug, Clone, Serialize)]
pub struct ClusterAggregate<'a> {
  /// `None` groups every record that has no cluster assignment
  pub cluster_id: Option<i64>,
  pub name: Option<String>,
  pub count: usize,
  /// Union of member keywords, first-seen order
  pub keywords: Vec<String>,
  pub members: Vec<&'a Record>,
}

impl ClusterAggregate<'_> {
  pub fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or("Unassigned")
  }
}

pub fn group_by_cluster(records: &[Record]) -> Vec<ClusterAggregate<'_>> {
  let mut index: HashMap<Option<i64>, usize> = HashMap::new();
  let mut clusters: Vec<ClusterAggregate<'_>> = Vec::new();
  let mut seen_keywords: Vec<HashSet<&str>> = Vec::new();

  for record in records {
    let key = record.cluster_id();
    let slot = *index.entry(key).or_insert_with(|| {
      clusters.push(ClusterAggregate {
        cluster_id: key,
        name: None,
        count: 0,
        keywords: Vec::new(),
        members: Vec::new(),
      });
      seen_keywords.push(HashSet::new());
      clusters.len() - 1
    });

    let cluster = &mut clusters[slot];
    if cluster.name.is_none() {
      cluster.name = record.cluster().map(str::to_string);
    }
    cluster.count += 1;
    for keyword in record.keywords() {
      if seen_keywords[slot].insert(keyword.as_str()) {
        cluster.keywords.push(keyword.clone());
      }
    }
    cluster.members.push(record);
  }

  clusters
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
  pub keyword: String,
  pub count: usize,
}

/// Occurrence count of every keyword, in first-encountered order
pub fn keyword_counts<'a, I>(records: I) -> Vec<KeywordCount>
where
  I: IntoIterator<Item = &'a Record>,
{
  let mut index: HashMap<&'a str, usize> = HashMap::new();
  let mut counts: Vec<KeywordCount> = Vec::new();

  for record in records {
    for keyword in record.keywords() {
      match index.get(keyword.as_str()) {
        Some(&slot) => counts[slot].count += 1,
        None => {
          index.insert(keyword.as_str(), counts.len());
          counts.push(KeywordCount { keyword: keyword.clone(), count: 1 });
        }
      }
    }
  }

  counts
}

/// The `n` most frequent keywords; equal counts keep first-encountered order
pub fn top_keywords(records: &[Record], n: usize) -> Vec<KeywordCount> {
  let mut counts = rank_keywords(keyword_counts(records));
  counts.truncate(n);
  counts
}

/// Most frequent first; the sort is stable so ties keep their order
pub fn rank_keywords(mut counts: Vec<KeywordCount>) -> Vec<KeywordCount> {
  counts.sort_by(|a, b| b.count.cmp(&a.count));
  counts
}

/// Keyword counts restricted to one cluster (by display name), or all records
pub fn keyword_counts_in_cluster(records: &[Record], cluster: Option<&str>) -> Vec<KeywordCount> {
  match cluster {
    Some(name) => keyword_counts(records.iter().filter(|r| r.cluster() == Some(name))),
    None => keyword_counts(records),
  }
}

/// Records tagged with `keyword`
pub fn records_with_keyword<'a>(records: &'a [Record], keyword: &str) -> Vec<&'a Record> {
  records.iter().filter(|r| r.keywords().iter().any(|k| k == keyword)).collect()
}

/// Relative weight of a keyword inside a word cloud
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeywordTier {
  High,
  Medium,
  Low,
}

impl KeywordTier {
  pub fn of(count: usize, max_count: usize) -> Self {
    let max = max_count as f64;
    let count = count as f64;
    if count > max * 0.66 {
      KeywordTier::High
    } else if count > max * 0.33 {
      KeywordTier::Medium
    } else {
      KeywordTier::Low
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
  Cluster,
  Year,
  Country,
  Keyword,
}

/// One distinct value of a facet. Years order numerically, text lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum FacetValue {
  Year(i32),
  Text(String),
}

impl fmt::Display for FacetValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FacetValue::Year(year) => write!(f, "{year}"),
      FacetValue::Text(text) => write!(f, "{text}"),
    }
  }
}

/// Distinct non-null values of `facet`, sorted ascending
pub fn distinct_facet_values(records: &[Record], facet: Facet) -> BTreeSet<FacetValue> {
  let mut values = BTreeSet::new();

  for record in records {
    match facet {
      Facet::Cluster => values.extend(record.cluster().map(|c| FacetValue::Text(c.to_string()))),
      Facet::Year => values.extend(record.year().map(FacetValue::Year)),
      Facet::Country => values.extend(record.country().map(|c| FacetValue::Text(c.to_string()))),
      Facet::Keyword => values.extend(record.keywords().iter().map(|k| FacetValue::Text(k.clone()))),
    }
  }

  values
}

/// Every filter dimension's value domain
#[derive(Debug, Clone, Default, Serialize)]
pub struct FacetSets {
  pub clusters: BTreeSet<FacetValue>,
  pub years: BTreeSet<FacetValue>,
  pub countries: BTreeSet<FacetValue>,
  pub keywords: BTreeSet<FacetValue>,
}

impl FacetSets {
  pub fn collect(records: &[Record]) -> Self {
    Self {
      clusters: distinct_facet_values(records, Facet::Cluster),
      years: distinct_facet_values(records, Facet::Year),
      countries: distinct_facet_values(records, Facet::Country),
      keywords: distinct_facet_values(records, Facet::Keyword),
    }
  }
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSummary {
  pub total_patents: usize,
  pub total_clusters: usize,
  pub top_keywords: Vec<KeywordCount>,
}

impl DashboardSummary {
  pub fn compute(records: &[Record], top_n: usize) -> Self {
    Self {
      total_patents: records.len(),
      total_clusters: distinct_facet_values(records, Facet::Cluster).len(),
      top_keywords: top_keywords(records, top_n),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendSeries {
  pub cluster_id: Option<i64>,
  pub name: String,
  /// One count per entry of [`YearTrend::years`]
  pub counts: Vec<usize>,
}

/// Member count per year for every cluster
#[derive(Debug, Clone, Default, Serialize)]
pub struct YearTrend {
  pub years: Vec<i32>,
  pub series: Vec<TrendSeries>,
}

pub fn cluster_year_trend(records: &[Record], clusters: &[ClusterAggregate<'_>]) -> YearTrend {
  let years: Vec<i32> = records.iter().filter_map(Record::year).collect::<BTreeSet<_>>().into_iter().collect();

  let series = clusters
    .iter()
    .map(|cluster| TrendSeries {
      cluster_id: cluster.cluster_id,
      name: cluster.display_name().to_string(),
      counts: years
        .iter()
        .map(|&year| cluster.members.iter().filter(|m| m.year() == Some(year)).count())
        .collect(),
    })
    .collect();

  YearTrend { years, series }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::RawRecord;

  fn record(no: i64, cluster: Option<(i64, &str)>, keywords: &[&str], year: Option<i32>) -> Record {
    let mut raw = RawRecord::new(no, &format!("Patent {no}"));
    if let Some((id, name)) = cluster {
      raw.cluster_id = Some(id);
      raw.cluster = Some(name.to_string());
    }
    raw.keywords = Some(keywords.iter().map(|k| k.to_string()).collect());
    raw.year = year;
    Record::Raw(raw)
  }

  fn sample() -> Vec<Record> {
    vec![
      record(1, Some((3, "Medical Devices")), &["sensor", "implant"], Some(2019)),
      record(2, Some((1, "Batteries")), &["anode", "sensor"], Some(2017)),
      record(3, Some((3, "Medical Devices")), &["sensor", "catheter"], Some(2019)),
      record(4, None, &[], None),
    ]
  }

  #[test]
  fn test_group_by_cluster_first_appearance_order() {
    let records = sample();
    let clusters = group_by_cluster(&records);

    let ids: Vec<_> = clusters.iter().map(|c| c.cluster_id).collect();
    assert_eq!(ids, vec![Some(3), Some(1), None]);
    assert_eq!(clusters[0].count, 2);
    assert_eq!(clusters[0].keywords, vec!["sensor", "implant", "catheter"]);
    assert_eq!(clusters[2].display_name(), "Unassigned");
  }

  #[test]
  fn test_group_by_cluster_counts_sum_to_input() {
    let records = sample();
    let total: usize = group_by_cluster(&records).iter().map(|c| c.count).sum();
    assert_eq!(total, records.len());
  }

  #[test]
  fn test_top_keywords_ties_keep_first_seen_order() {
    let records = sample();
    let top = top_keywords(&records, 3);

    assert_eq!(top[0], KeywordCount { keyword: "sensor".to_string(), count: 3 });
    assert_eq!(top[1].keyword, "implant");
    assert_eq!(top[2].keyword, "anode");
  }

  #[test]
  fn test_ranked_cluster_keywords_put_frequent_first() {
    let records = vec![
      record(1, Some((0, "A")), &["rare", "common"], None),
      record(2, Some((0, "A")), &["common"], None),
      record(3, Some((0, "A")), &["common"], None),
    ];

    let mut ranked = rank_keywords(keyword_counts_in_cluster(&records, Some("A")));
    ranked.truncate(1);
    assert_eq!(ranked, vec![KeywordCount { keyword: "common".to_string(), count: 3 }]);
  }

  #[test]
  fn test_top_keywords_empty_records() {
    assert!(top_keywords(&[], 5).is_empty());
  }

  #[test]
  fn test_distinct_years_sort_numerically() {
    let records = vec![
      record(1, None, &[], Some(2020)),
      record(2, None, &[], Some(999)),
      record(3, None, &[], Some(2020)),
    ];
    let years: Vec<_> = distinct_facet_values(&records, Facet::Year).into_iter().collect();
    assert_eq!(years, vec![FacetValue::Year(999), FacetValue::Year(2020)]);
  }

  #[test]
  fn test_facet_sets_skip_missing_values() {
    let facets = FacetSets::collect(&sample());
    assert_eq!(facets.clusters.len(), 2);
    assert_eq!(facets.years.len(), 2);
    assert!(facets.countries.is_empty());
    assert_eq!(facets.keywords.len(), 4);
  }

  #[test]
  fn test_dashboard_summary() {
    let summary = DashboardSummary::compute(&sample(), 5);
    assert_eq!(summary.total_patents, 4);
    assert_eq!(summary.total_clusters, 2);

    let empty = DashboardSummary::compute(&[], 5);
    assert_eq!((empty.total_patents, empty.total_clusters), (0, 0));
    assert!(empty.top_keywords.is_empty());
  }

  #[test]
  fn test_cluster_year_trend() {
    let records = sample();
    let clusters = group_by_cluster(&records);
    let trend = cluster_year_trend(&records, &clusters);

    assert_eq!(trend.years, vec![2017, 2019]);
    assert_eq!(trend.series[0].counts, vec![0, 2]);
    assert_eq!(trend.series[1].counts, vec![1, 0]);
    assert_eq!(trend.series[2].counts, vec![0, 0]);
  }

  #[test]
  fn test_keyword_drill_down() {
    let records = sample();
    let in_cluster = keyword_counts_in_cluster(&records, Some("Batteries"));
    assert_eq!(in_cluster.len(), 2);

    let tagged = records_with_keyword(&records, "sensor");
    assert_eq!(tagged.len(), 3);
  }

  #[test]
  fn test_keyword_tiers() {
    assert_eq!(KeywordTier::of(10, 10), KeywordTier::High);
    assert_eq!(KeywordTier::of(5, 10), KeywordTier::Medium);
    assert_eq!(KeywordTier::of(1, 10), KeywordTier::Low);
  }
}
