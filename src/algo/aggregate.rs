//! Per-source frequency tables.
//!
//! Two counting modes are kept apart on purpose:
//! - **presence**: a term counts once per document (`keywords`, `facets`,
//!   `region_keywords`, `regions`, `origins`, `domains`)
//! - **occurrence**: every raw substring hit counts (`mentions`,
//!   `region_mentions`)
//!
//! Documents are counted on a rayon fold/reduce; partial counts merge by
//! addition, so the result does not depend on how work was split.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algo::domains::source_domain;
use crate::algo::taxonomy::Region;
use crate::config::PipelineConfig;
use crate::error::{TrendError, TrendResult};
use crate::model::TaggedDocument;
use crate::stats::EngagementStats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: u64,
}

/// Term → count, every count ≥ 1, ordered by descending count with ties in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable {
    entries: Vec<TermCount>,
}

impl FrequencyTable {
    /// Build a table from raw counts. `rank` gives the tie-break position of a
    /// term; equal ranks fall back to alphabetical order.
    pub fn from_counts<F>(counts: HashMap<String, u64>, rank: F) -> Self
    where
        F: Fn(&str) -> usize,
    {
        let mut entries: Vec<TermCount> = counts
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(term, count)| TermCount { term, count })
            .collect();
        entries.sort_by(|a, b| {
            (Reverse(a.count), rank(&a.term), &a.term).cmp(&(
                Reverse(b.count),
                rank(&b.term),
                &b.term,
            ))
        });
        Self { entries }
    }

    pub fn entries(&self) -> &[TermCount] {
        &self.entries
    }

    pub fn get(&self, term: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.term == term)
            .map(|e| e.count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn terms(&self) -> BTreeSet<String> {
        self.entries.iter().map(|e| e.term.clone()).collect()
    }

    /// First `n` entries in presentation order.
    pub fn top(&self, n: usize) -> Self {
        Self {
            entries: self.entries.iter().take(n).cloned().collect(),
        }
    }
}

/// Complete breakdown of one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub source: String,
    pub document_count: usize,
    /// Presence counts over all facets.
    pub keywords: FrequencyTable,
    /// Presence counts per facet.
    pub facets: BTreeMap<String, FrequencyTable>,
    /// Occurrence counts per facet.
    pub mentions: BTreeMap<String, FrequencyTable>,
    /// Presence counts of keywords per assigned region, keyed by region name.
    /// Regions without relevant documents are absent.
    pub region_keywords: BTreeMap<String, FrequencyTable>,
    /// Documents per assigned region, `Unknown` included.
    pub regions: FrequencyTable,
    /// Occurrences of places, credited to the region that owns them.
    pub region_mentions: FrequencyTable,
    /// Documents per subreddit or search query.
    pub origins: FrequencyTable,
    /// Documents per link host.
    pub domains: FrequencyTable,
    pub engagement: EngagementStats,
}

impl AggregationResult {
    /// Copy with every table cut to its first `n` entries.
    pub fn truncated(&self, n: usize) -> Self {
        let cut = |tables: &BTreeMap<String, FrequencyTable>| {
            tables
                .iter()
                .map(|(k, t)| (k.clone(), t.top(n)))
                .collect()
        };
        Self {
            source: self.source.clone(),
            document_count: self.document_count,
            keywords: self.keywords.top(n),
            facets: cut(&self.facets),
            mentions: cut(&self.mentions),
            region_keywords: cut(&self.region_keywords),
            regions: self.regions.top(n),
            region_mentions: self.region_mentions.top(n),
            origins: self.origins.top(n),
            domains: self.domains.top(n),
            engagement: self.engagement.clone(),
        }
    }

    /// Keyword terms seen in this source, for cross-source comparison.
    pub fn keyword_set(&self) -> BTreeSet<String> {
        self.keywords.terms()
    }

    /// Reject an empty source. `aggregate` itself treats empty as valid.
    pub fn require_documents(self) -> TrendResult<Self> {
        if self.document_count == 0 {
            Err(TrendError::EmptyCorpus(self.source))
        } else {
            Ok(self)
        }
    }
}

/// Counts accumulated by one rayon worker.
#[derive(Debug, Default)]
struct PartialCounts {
    documents: usize,
    keywords: HashMap<String, u64>,
    facets: HashMap<String, HashMap<String, u64>>,
    mentions: HashMap<String, HashMap<String, u64>>,
    region_keywords: HashMap<Region, HashMap<String, u64>>,
    regions: HashMap<Region, u64>,
    region_mentions: HashMap<Region, u64>,
    /// (count, index of first document seen with this value)
    origins: HashMap<String, (u64, usize)>,
    domains: HashMap<String, (u64, usize)>,
}

impl PartialCounts {
    fn add(&mut self, index: usize, doc: &TaggedDocument, config: &PipelineConfig) {
        self.documents += 1;
        let text = doc.normalized.matching_text();

        let by_region = self.region_keywords.entry(doc.region).or_default();
        for keyword in &doc.keywords {
            *self.keywords.entry(keyword.clone()).or_insert(0) += 1;
            *by_region.entry(keyword.clone()).or_insert(0) += 1;
        }

        for facet in config.taxonomy.facets() {
            for term in &facet.terms {
                if doc.keywords.contains(term) {
                    *self
                        .facets
                        .entry(facet.name.clone())
                        .or_default()
                        .entry(term.clone())
                        .or_insert(0) += 1;
                }
                let hits = text.matches(term.as_str()).count() as u64;
                if hits > 0 {
                    *self
                        .mentions
                        .entry(facet.name.clone())
                        .or_default()
                        .entry(term.clone())
                        .or_insert(0) += hits;
                }
            }
        }

        *self.regions.entry(doc.region).or_insert(0) += 1;

        let mut credited = HashSet::new();
        for entry in config.region_map.entries() {
            for place in &entry.places {
                // A place shadowed by an earlier region is credited there only.
                if !credited.insert(place.as_str()) {
                    continue;
                }
                let hits = text.matches(place.as_str()).count() as u64;
                if hits > 0 {
                    *self.region_mentions.entry(entry.region).or_insert(0) += hits;
                }
            }
        }

        let document = doc.document();
        if !document.origin.is_empty() {
            bump_first_seen(&mut self.origins, &document.origin, index);
        }
        if let Some(domain) = document.url.as_deref().and_then(source_domain) {
            bump_first_seen(&mut self.domains, &domain, index);
        }
    }

    fn merge(mut self, other: PartialCounts) -> PartialCounts {
        self.documents += other.documents;
        merge_counts(&mut self.keywords, other.keywords);
        for (facet, counts) in other.facets {
            merge_counts(self.facets.entry(facet).or_default(), counts);
        }
        for (facet, counts) in other.mentions {
            merge_counts(self.mentions.entry(facet).or_default(), counts);
        }
        for (region, counts) in other.region_keywords {
            merge_counts(self.region_keywords.entry(region).or_default(), counts);
        }
        merge_counts(&mut self.regions, other.regions);
        merge_counts(&mut self.region_mentions, other.region_mentions);
        merge_first_seen(&mut self.origins, other.origins);
        merge_first_seen(&mut self.domains, other.domains);
        self
    }
}

fn bump_first_seen(map: &mut HashMap<String, (u64, usize)>, key: &str, index: usize) {
    let slot = map.entry(key.to_string()).or_insert((0, index));
    slot.0 += 1;
    slot.1 = slot.1.min(index);
}

fn merge_counts<K: std::hash::Hash + Eq>(into: &mut HashMap<K, u64>, from: HashMap<K, u64>) {
    for (key, count) in from {
        *into.entry(key).or_insert(0) += count;
    }
}

fn merge_first_seen(
    into: &mut HashMap<String, (u64, usize)>,
    from: HashMap<String, (u64, usize)>,
) {
    for (key, (count, first)) in from {
        let slot = into.entry(key).or_insert((0, first));
        slot.0 += count;
        slot.1 = slot.1.min(first);
    }
}

fn first_seen_table(map: HashMap<String, (u64, usize)>) -> FrequencyTable {
    let ranks: HashMap<String, usize> = map
        .iter()
        .map(|(k, (_, first))| (k.clone(), *first))
        .collect();
    let counts = map.into_iter().map(|(k, (count, _))| (k, count)).collect();
    FrequencyTable::from_counts(counts, |term| ranks.get(term).copied().unwrap_or(usize::MAX))
}

/// Builds an [`AggregationResult`] for one source.
#[derive(Debug, Clone, Copy)]
pub struct SourceAggregator<'a> {
    config: &'a PipelineConfig,
}

impl<'a> SourceAggregator<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Aggregate the tagged documents of one source. Tables are complete;
    /// top-N cuts belong to the caller. An empty input yields empty tables.
    pub fn aggregate(&self, source: &str, documents: &[TaggedDocument]) -> AggregationResult {
        let config = self.config;
        let counts = documents
            .par_iter()
            .enumerate()
            .fold(PartialCounts::default, |mut acc, (i, doc)| {
                acc.add(i, doc, config);
                acc
            })
            .reduce(PartialCounts::default, PartialCounts::merge);

        let taxonomy = &config.taxonomy;
        let keyword_rank = |term: &str| taxonomy.term_rank(term).unwrap_or(usize::MAX);

        let mut facets = BTreeMap::new();
        let mut mentions = BTreeMap::new();
        let mut facet_presence = counts.facets;
        let mut facet_mentions = counts.mentions;
        for facet in taxonomy.facets() {
            let facet_rank = |term: &str| {
                facet
                    .terms
                    .iter()
                    .position(|t| t == term)
                    .unwrap_or(usize::MAX)
            };
            let presence = facet_presence.remove(&facet.name).unwrap_or_default();
            let occurrences = facet_mentions.remove(&facet.name).unwrap_or_default();
            facets.insert(
                facet.name.clone(),
                FrequencyTable::from_counts(presence, facet_rank),
            );
            mentions.insert(
                facet.name.clone(),
                FrequencyTable::from_counts(occurrences, facet_rank),
            );
        }

        let region_map = &config.region_map;
        let region_table = |counts: HashMap<Region, u64>| {
            let ranks: HashMap<String, usize> = counts
                .keys()
                .map(|r| (r.as_str().to_string(), region_map.region_rank(*r)))
                .collect();
            let by_name = counts
                .into_iter()
                .map(|(r, c)| (r.as_str().to_string(), c))
                .collect();
            FrequencyTable::from_counts(by_name, |name| {
                ranks.get(name).copied().unwrap_or(usize::MAX)
            })
        };

        let region_keywords = counts
            .region_keywords
            .into_iter()
            .filter(|(_, counts)| !counts.is_empty())
            .map(|(region, counts)| {
                (
                    region.as_str().to_string(),
                    FrequencyTable::from_counts(counts, keyword_rank),
                )
            })
            .collect();

        let result = AggregationResult {
            source: source.to_string(),
            document_count: counts.documents,
            keywords: FrequencyTable::from_counts(counts.keywords, keyword_rank),
            facets,
            mentions,
            region_keywords,
            regions: region_table(counts.regions),
            region_mentions: region_table(counts.region_mentions),
            origins: first_seen_table(counts.origins),
            domains: first_seen_table(counts.domains),
            engagement: EngagementStats::from_documents(documents),
        };

        debug!(
            source,
            documents = result.document_count,
            keywords = result.keywords.len(),
            "aggregated source"
        );
        result
    }
}
