use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::algo::aggregate::AggregationResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonCounts {
    pub a: usize,
    pub b: usize,
    pub common: usize,
}

/// Presence-only comparison of two term sets. A term seen once on one side
/// and a hundred times on the other is still common.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub common: BTreeSet<String>,
    pub source_a_only: BTreeSet<String>,
    pub source_b_only: BTreeSet<String>,
    pub counts: ComparisonCounts,
}

pub fn compare(a: &BTreeSet<String>, b: &BTreeSet<String>) -> ComparisonResult {
    let common: BTreeSet<String> = a.intersection(b).cloned().collect();
    ComparisonResult {
        counts: ComparisonCounts {
            a: a.len(),
            b: b.len(),
            common: common.len(),
        },
        common,
        source_a_only: a.difference(b).cloned().collect(),
        source_b_only: b.difference(a).cloned().collect(),
    }
}

/// Compare the keyword vocabularies of two aggregated sources.
pub fn compare_sources(a: &AggregationResult, b: &AggregationResult) -> ComparisonResult {
    compare(&a.keyword_set(), &b.keyword_set())
}
