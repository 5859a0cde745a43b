use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::algo::aggregate::AggregationResult;
use crate::algo::compare::ComparisonResult;
use crate::error::{TrendError, TrendResult};
use crate::stats::SummaryStats;

/// Ordered pair of source names; `a` is the left side of the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePair {
    pub a: String,
    pub b: String,
}

impl SourcePair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceComparison {
    pub source_a: String,
    pub source_b: String,
    #[serde(flatten)]
    pub result: ComparisonResult,
}

/// Everything the summarizer and dashboard consume from one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub aggregations: BTreeMap<String, AggregationResult>,
    pub comparisons: Vec<SourceComparison>,
    pub summary: SummaryStats,
}

impl ReportPayload {
    /// Copy with every aggregation table cut to `n` entries. Comparisons and
    /// summary are untouched.
    pub fn truncated(&self, n: usize) -> Self {
        Self {
            aggregations: self
                .aggregations
                .iter()
                .map(|(name, agg)| (name.clone(), agg.truncated(n)))
                .collect(),
            comparisons: self.comparisons.clone(),
            summary: self.summary.clone(),
        }
    }

    pub fn comparison(&self, a: &str, b: &str) -> Option<&SourceComparison> {
        self.comparisons
            .iter()
            .find(|c| c.source_a == a && c.source_b == b)
    }
}

/// Merge already-computed parts into a report. Nothing is recomputed; the only
/// failure is a comparison naming a source absent from `aggregations`.
pub fn assemble(
    aggregations: BTreeMap<String, AggregationResult>,
    comparisons: Vec<(SourcePair, ComparisonResult)>,
    summary: SummaryStats,
) -> TrendResult<ReportPayload> {
    let comparisons = comparisons
        .into_iter()
        .map(|(pair, result)| {
            for name in [&pair.a, &pair.b] {
                if !aggregations.contains_key(name) {
                    return Err(TrendError::MissingSource(name.clone()));
                }
            }
            Ok(SourceComparison {
                source_a: pair.a,
                source_b: pair.b,
                result,
            })
        })
        .collect::<TrendResult<Vec<_>>>()?;

    Ok(ReportPayload {
        aggregations,
        comparisons,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::compare::compare;
    use std::collections::BTreeSet;

    fn aggregation(source: &str) -> AggregationResult {
        AggregationResult {
            source: source.into(),
            ..Default::default()
        }
    }

    fn aggregations(names: &[&str]) -> BTreeMap<String, AggregationResult> {
        names
            .iter()
            .map(|n| (n.to_string(), aggregation(n)))
            .collect()
    }

    #[test]
    fn assembles_without_recomputing() {
        let result = compare(
            &BTreeSet::from(["saree".to_string()]),
            &BTreeSet::from(["saree".to_string(), "lehenga".to_string()]),
        );
        let report = assemble(
            aggregations(&["reddit", "web"]),
            vec![(SourcePair::new("reddit", "web"), result.clone())],
            SummaryStats::default(),
        )
        .unwrap();
        assert_eq!(report.comparisons.len(), 1);
        assert_eq!(report.comparison("reddit", "web").unwrap().result, result);
        assert!(report.comparison("web", "reddit").is_none());
    }

    #[test]
    fn missing_source_is_an_error() {
        let err = assemble(
            aggregations(&["reddit"]),
            vec![(SourcePair::new("reddit", "web"), ComparisonResult::default())],
            SummaryStats::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TrendError::MissingSource(s) if s == "web"));
    }

    #[test]
    fn comparison_fields_are_flattened() {
        let report = assemble(
            aggregations(&["a", "b"]),
            vec![(SourcePair::new("a", "b"), ComparisonResult::default())],
            SummaryStats::default(),
        )
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        let first = &json["comparisons"][0];
        assert_eq!(first["source_a"], "a");
        assert!(first["common"].is_array());
        assert_eq!(first["counts"]["common"], 0);
    }
}
