use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::TaggedDocument;
use crate::pipeline::{PipelineStats, SourceRun};

/// Cap on [`EngagementStats::top_documents`].
pub const TOP_DOCUMENTS_LIMIT: usize = 10;

/// A document scoring above the 80th percentile of its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopDocument {
    pub id: String,
    pub title: String,
    pub score: i64,
    pub origin: String,
    pub keywords: Vec<String>,
}

/// Score/engagement profile of one source's relevant documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementStats {
    pub mean_score: f64,
    pub median_score: f64,
    pub min_score: i64,
    pub max_score: i64,
    pub mean_engagement: f64,
    /// Mean over the documents that carry a ratio; `None` when none do.
    pub mean_upvote_ratio: Option<f64>,
    /// Documents scoring strictly above the 80th percentile.
    pub high_engagement_documents: usize,
    /// The best of those, highest score first, ties in input order.
    pub top_documents: Vec<TopDocument>,
}

impl EngagementStats {
    pub fn from_documents(documents: &[TaggedDocument]) -> Self {
        if documents.is_empty() {
            return Self::default();
        }

        let mut scores: Vec<i64> = documents.iter().map(|d| d.document().score).collect();
        scores.sort_unstable();
        let n = scores.len() as f64;

        let engagement: u64 = documents.iter().map(|d| d.document().engagement_count).sum();
        let ratios: Vec<f64> = documents
            .iter()
            .filter_map(|d| d.document().upvote_ratio)
            .collect();
        let mean_upvote_ratio =
            (!ratios.is_empty()).then(|| ratios.iter().sum::<f64>() / ratios.len() as f64);

        let p80 = percentile(&scores, 0.8);
        let mut high: Vec<&TaggedDocument> = documents
            .iter()
            .filter(|d| d.document().score as f64 > p80)
            .collect();
        let high_engagement_documents = high.len();
        // Stable sort keeps input order among equal scores.
        high.sort_by_key(|d| Reverse(d.document().score));
        let top_documents = high
            .into_iter()
            .take(TOP_DOCUMENTS_LIMIT)
            .map(|d| {
                let doc = d.document();
                TopDocument {
                    id: doc.id.clone(),
                    title: doc.title.clone(),
                    score: doc.score,
                    origin: doc.origin.clone(),
                    keywords: d.keywords.iter().cloned().collect(),
                }
            })
            .collect();

        Self {
            mean_score: scores.iter().sum::<i64>() as f64 / n,
            median_score: percentile(&scores, 0.5),
            min_score: scores[0],
            max_score: scores[scores.len() - 1],
            mean_engagement: engagement as f64 / n,
            mean_upvote_ratio,
            high_engagement_documents,
            top_documents,
        }
    }
}

/// Linear-interpolation percentile over sorted, non-empty values.
fn percentile(sorted: &[i64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] as f64 + frac * (sorted[hi] - sorted[lo]) as f64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: String,
    pub latest: String,
}

/// Run-wide statistics embedded in the report next to the aggregations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_documents: usize,
    pub documents_per_source: BTreeMap<String, usize>,
    pub pipeline: BTreeMap<String, PipelineStats>,
    pub origins_covered: usize,
    pub regions_covered: usize,
    pub mean_score: f64,
    /// Sum of per-document keyword set sizes.
    pub total_keywords: usize,
    pub date_range: Option<DateRange>,
}

impl SummaryStats {
    pub fn from_runs(runs: &[SourceRun]) -> Self {
        let documents: Vec<&TaggedDocument> = runs.iter().flat_map(|r| &r.documents).collect();

        let origins: HashSet<(&str, &str)> = documents
            .iter()
            .map(|d| (d.document().source_name.as_str(), d.document().origin.as_str()))
            .filter(|(_, origin)| !origin.is_empty())
            .collect();
        let regions: HashSet<_> = documents.iter().map(|d| d.region).collect();

        let mean_score = if documents.is_empty() {
            0.0
        } else {
            documents.iter().map(|d| d.document().score).sum::<i64>() as f64
                / documents.len() as f64
        };

        let timestamps = documents.iter().filter_map(|d| d.document().created_at);
        let date_range = timestamps
            .clone()
            .min()
            .zip(timestamps.max())
            .and_then(|(lo, hi)| {
                Some(DateRange {
                    earliest: format_day(lo)?,
                    latest: format_day(hi)?,
                })
            });

        Self {
            total_documents: documents.len(),
            documents_per_source: runs
                .iter()
                .map(|r| (r.source.clone(), r.documents.len()))
                .collect(),
            pipeline: runs.iter().map(|r| (r.source.clone(), r.stats)).collect(),
            origins_covered: origins.len(),
            regions_covered: regions.len(),
            mean_score,
            total_keywords: documents.iter().map(|d| d.keywords.len()).sum(),
            date_range,
        }
    }
}

fn format_day(secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::taxonomy::Region;
    use crate::model::{Document, NormalizedDocument};
    use std::collections::BTreeSet;

    fn doc(score: i64, engagement: u64) -> TaggedDocument {
        TaggedDocument {
            normalized: NormalizedDocument {
                document: Document {
                    score,
                    engagement_count: engagement,
                    ..Default::default()
                },
                clean_title: String::new(),
                clean_body: String::new(),
            },
            keywords: BTreeSet::new(),
            region: Region::Unknown,
        }
    }

    #[test]
    fn engagement_empty_is_zeroed() {
        assert_eq!(EngagementStats::from_documents(&[]), EngagementStats::default());
    }

    #[test]
    fn engagement_basic_stats() {
        let docs: Vec<_> = [(10, 2), (1, 0), (4, 4), (5, 2), (100, 12)]
            .iter()
            .map(|&(s, e)| doc(s, e))
            .collect();
        let stats = EngagementStats::from_documents(&docs);
        assert_eq!(stats.min_score, 1);
        assert_eq!(stats.max_score, 100);
        assert!((stats.mean_score - 24.0).abs() < 1e-9);
        assert!((stats.median_score - 5.0).abs() < 1e-9);
        assert!((stats.mean_engagement - 4.0).abs() < 1e-9);
        // sorted [1, 4, 5, 10, 100]; p80 = 10 + 0.2 * 90 = 28
        assert_eq!(stats.high_engagement_documents, 1);
    }

    #[test]
    fn top_documents_are_ranked_and_bounded() {
        let mut docs: Vec<_> = (0..60).map(|i| doc(i, 0)).collect();
        docs[59].normalized.document.title = "Banarasi silk".into();
        docs[59].keywords = ["silk".to_string()].into_iter().collect();
        let stats = EngagementStats::from_documents(&docs);
        // p80 of 0..=59 is 47.2, so 48..=59 qualify.
        assert_eq!(stats.high_engagement_documents, 12);
        assert_eq!(stats.top_documents.len(), TOP_DOCUMENTS_LIMIT);
        assert_eq!(stats.top_documents[0].score, 59);
        assert_eq!(stats.top_documents[0].title, "Banarasi silk");
        assert_eq!(stats.top_documents[0].keywords, vec!["silk"]);
        assert_eq!(stats.top_documents[9].score, 50);
    }

    #[test]
    fn upvote_ratio_mean_skips_missing() {
        let mut docs = vec![doc(1, 0), doc(2, 0), doc(3, 0)];
        docs[0].normalized.document.upvote_ratio = Some(0.9);
        docs[2].normalized.document.upvote_ratio = Some(0.7);
        let stats = EngagementStats::from_documents(&docs);
        assert!((stats.mean_upvote_ratio.unwrap() - 0.8).abs() < 1e-9);
        assert_eq!(EngagementStats::from_documents(&[doc(1, 0)]).mean_upvote_ratio, None);
    }

    #[test]
    fn percentile_even_median() {
        assert!((percentile(&[1, 2, 3, 4], 0.5) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn day_formatting() {
        assert_eq!(format_day(1_704_067_200).as_deref(), Some("2024-01-01"));
    }
}
