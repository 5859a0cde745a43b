//! Drives one source's documents through normalize → classify → tag, and a
//! whole run through aggregation, comparison and report assembly.
//!
//! Per-document stages are pure, so they run on a rayon parallel iterator;
//! indexed collection keeps output in input order.

use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::algo::aggregate::{AggregationResult, SourceAggregator};
use crate::algo::compare::{compare_sources, ComparisonResult};
use crate::algo::normalizer::normalize_document;
use crate::algo::relevance::RelevanceClassifier;
use crate::algo::report::{assemble, ReportPayload, SourcePair};
use crate::algo::tagger::TaxonomyTagger;
use crate::config::PipelineConfig;
use crate::error::{TrendError, TrendResult};
use crate::model::{Document, NormalizedDocument, TaggedDocument};
use crate::stats::SummaryStats;

/// Counts of what happened to one source's documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub processed: usize,
    pub malformed: usize,
    pub irrelevant: usize,
    pub relevant: usize,
}

/// Fate of a single document.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Malformed(Document),
    Irrelevant(NormalizedDocument),
    Relevant(TaggedDocument),
}

/// Relevant, tagged documents of one source plus the pipeline counts.
#[derive(Debug, Clone)]
pub struct SourceRun {
    pub source: String,
    pub documents: Vec<TaggedDocument>,
    pub stats: PipelineStats,
}

#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a PipelineConfig {
        self.config
    }

    pub fn process_document(&self, document: Document) -> Outcome {
        if document.is_malformed() {
            return Outcome::Malformed(document);
        }
        let normalized = normalize_document(document);
        let classifier = RelevanceClassifier::new(self.config);
        if !classifier.is_relevant(&normalized.clean_title, &normalized.clean_body) {
            return Outcome::Irrelevant(normalized);
        }
        Outcome::Relevant(TaxonomyTagger::new(self.config).tag_document(normalized))
    }

    /// Classify every document, keeping input order.
    pub fn process_all(&self, source: &str, documents: Vec<Document>) -> Vec<Outcome> {
        documents
            .into_par_iter()
            .map(|mut doc| {
                if doc.source_name.is_empty() {
                    doc.source_name = source.to_string();
                }
                self.process_document(doc)
            })
            .collect()
    }

    /// Run one source. Malformed documents are dropped and counted, or turned
    /// into an error when the config is strict.
    pub fn run(&self, source: &str, documents: Vec<Document>) -> TrendResult<SourceRun> {
        let outcomes = self.process_all(source, documents);

        let mut stats = PipelineStats {
            processed: outcomes.len(),
            ..Default::default()
        };
        let mut tagged = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Malformed(doc) => {
                    if self.config.strict {
                        return Err(TrendError::MalformedDocument { id: doc.id });
                    }
                    debug!(source, id = %doc.id, "dropping document without title or body");
                    stats.malformed += 1;
                }
                Outcome::Irrelevant(_) => stats.irrelevant += 1,
                Outcome::Relevant(doc) => tagged.push(doc),
            }
        }
        stats.relevant = tagged.len();

        info!(
            source,
            processed = stats.processed,
            relevant = stats.relevant,
            malformed = stats.malformed,
            "source processed"
        );

        Ok(SourceRun {
            source: source.to_string(),
            documents: tagged,
            stats,
        })
    }

    /// Full run: process and aggregate every source, compare the requested
    /// pairs, and assemble the report.
    ///
    /// Sources are processed in the given order. Source names must be
    /// unique ([`TrendError::Config`] otherwise); a pair naming an unknown
    /// source fails with [`TrendError::MissingSource`].
    pub fn report(
        &self,
        sources: Vec<(String, Vec<Document>)>,
        pairs: &[SourcePair],
    ) -> TrendResult<ReportPayload> {
        let mut names = HashSet::new();
        if let Some((name, _)) = sources.iter().find(|(name, _)| !names.insert(name.as_str())) {
            return Err(TrendError::Config(format!(
                "source '{name}' is given more than once"
            )));
        }

        let runs = sources
            .into_iter()
            .map(|(name, docs)| self.run(&name, docs))
            .collect::<TrendResult<Vec<_>>>()?;

        let aggregator = SourceAggregator::new(self.config);
        let aggregations: BTreeMap<String, AggregationResult> = runs
            .iter()
            .map(|run| {
                if run.documents.is_empty() {
                    warn!(source = %run.source, "no relevant documents");
                }
                (
                    run.source.clone(),
                    aggregator.aggregate(&run.source, &run.documents),
                )
            })
            .collect();

        let comparisons = pairs
            .iter()
            .map(|pair| {
                let a = aggregations
                    .get(&pair.a)
                    .ok_or_else(|| TrendError::MissingSource(pair.a.clone()))?;
                let b = aggregations
                    .get(&pair.b)
                    .ok_or_else(|| TrendError::MissingSource(pair.b.clone()))?;
                Ok((pair.clone(), compare_sources(a, b)))
            })
            .collect::<TrendResult<Vec<(SourcePair, ComparisonResult)>>>()?;

        assemble(aggregations, comparisons, SummaryStats::from_runs(&runs))
    }
}
