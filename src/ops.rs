//! Shared operation wrappers for the CLI and tests.
//!
//! Each `op_*` function is a pure, synchronous wrapper around the pipeline
//! modules. Input and output are `serde_json::Value` so callers need no
//! knowledge of the typed model; errors are flattened to `String`.

use serde::Serialize;
use serde_json::Value;

use crate::algo::aggregate::SourceAggregator;
use crate::algo::compare::compare;
use crate::algo::normalizer::normalize_document;
use crate::algo::report::{ReportPayload, SourcePair};
use crate::config::PipelineConfig;
use crate::error::TrendError;
use crate::corpus::{documents_from_array, load_discussion, load_search_results};
use crate::pipeline::{Outcome, Pipeline};
use crate::prompt::build_prompt;

/// Source name given to discussion-feed documents.
pub const DISCUSSION_SOURCE: &str = "reddit";
/// Source name given to web-search documents.
pub const WEB_SOURCE: &str = "web";

// ── Helpers ──────────────────────────────────────────────────────────────────

fn to_value<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

fn with_flags(mut value: Value, relevant: bool, malformed: bool) -> Value {
    if let Some(obj) = value.as_object_mut() {
        obj.insert("relevant".into(), Value::Bool(relevant));
        if malformed {
            obj.insert("malformed".into(), Value::Bool(true));
        }
    }
    value
}

/// Parse a JSON array of term strings into a set, rejecting non-strings.
fn term_set(values: &[Value]) -> Result<std::collections::BTreeSet<String>, String> {
    values
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("expected a string term, got {v}"))
        })
        .collect()
}

// ── Operations ───────────────────────────────────────────────────────────────

pub fn op_clean(rows: &[Value], source: &str) -> Result<Value, String> {
    let corpus = documents_from_array(rows, source);
    let cleaned: Vec<_> = corpus.documents.into_iter().map(normalize_document).collect();
    to_value(&cleaned)
}

/// Tag documents. Irrelevant and malformed documents are dropped unless
/// `keep_all` is set, in which case they come back with `relevant: false`.
/// A strict config fails on the first malformed document either way.
pub fn op_tag(
    rows: &[Value],
    source: &str,
    config: &PipelineConfig,
    keep_all: bool,
) -> Result<Value, String> {
    let corpus = documents_from_array(rows, source);
    let outcomes = Pipeline::new(config).process_all(source, corpus.documents);

    let mut output = Vec::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Relevant(doc) => output.push(with_flags(to_value(&doc)?, true, false)),
            Outcome::Malformed(doc) if config.strict => {
                return Err(TrendError::MalformedDocument { id: doc.id }.to_string())
            }
            Outcome::Irrelevant(doc) if keep_all => {
                output.push(with_flags(to_value(&doc)?, false, false))
            }
            Outcome::Malformed(doc) if keep_all => {
                output.push(with_flags(to_value(&doc)?, false, true))
            }
            _ => {}
        }
    }
    Ok(Value::Array(output))
}

pub fn op_aggregate(
    rows: &[Value],
    source: &str,
    config: &PipelineConfig,
    top: Option<usize>,
) -> Result<Value, String> {
    let corpus = documents_from_array(rows, source);
    let run = Pipeline::new(config)
        .run(source, corpus.documents)
        .map_err(|e| e.to_string())?;
    let agg = SourceAggregator::new(config).aggregate(source, &run.documents);
    match top {
        Some(n) => to_value(&agg.truncated(n)),
        None => to_value(&agg),
    }
}

pub fn op_compare(a: &[Value], b: &[Value]) -> Result<Value, String> {
    let result = compare(&term_set(a)?, &term_set(b)?);
    to_value(&result)
}

/// Full run over a discussion dump and saved web results.
pub fn run_report(
    discussion: &Value,
    web: &Value,
    config: &PipelineConfig,
) -> Result<ReportPayload, String> {
    let discussion = load_discussion(discussion, DISCUSSION_SOURCE).map_err(|e| e.to_string())?;
    let web = load_search_results(web, WEB_SOURCE).map_err(|e| e.to_string())?;
    Pipeline::new(config)
        .report(
            vec![
                (DISCUSSION_SOURCE.to_string(), discussion.documents),
                (WEB_SOURCE.to_string(), web.documents),
            ],
            &[SourcePair::new(DISCUSSION_SOURCE, WEB_SOURCE)],
        )
        .map_err(|e| e.to_string())
}

pub fn op_report(
    discussion: &Value,
    web: &Value,
    config: &PipelineConfig,
    top: Option<usize>,
) -> Result<Value, String> {
    let report = run_report(discussion, web, config)?;
    match top {
        Some(n) => to_value(&report.truncated(n)),
        None => to_value(&report),
    }
}

/// Full run rendered as the summarizer prompt, cut to `top_n_per_facet`.
pub fn op_prompt(
    discussion: &Value,
    web: &Value,
    config: &PipelineConfig,
) -> Result<String, String> {
    let report = run_report(discussion, web, config)?;
    build_prompt(
        &report,
        &SourcePair::new(DISCUSSION_SOURCE, WEB_SOURCE),
        config,
    )
    .map_err(|e| e.to_string())
}
