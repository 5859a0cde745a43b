//! Renders a report into the text prompt handed to the summarizer. The
//! language-model call itself lives outside this crate.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::algo::aggregate::{AggregationResult, FrequencyTable};
use crate::algo::report::{ReportPayload, SourcePair};
use crate::algo::taxonomy::Region;
use crate::config::PipelineConfig;
use crate::error::{TrendError, TrendResult};

const QUESTIONS: &[&str] = &[
    "What are the most trending Indian fashion items and styles?",
    "Which traditional and modern fashion elements are popular?",
    "How do community discussion trends compare to web search trends?",
    "Which regional or cultural patterns stand out?",
    "What should fashion retailers and buyers act on?",
];

/// Build the comparison prompt for `pair`, showing at most `top_n_per_facet`
/// entries per table. Facets and regions are listed in `config` order.
pub fn build_prompt(
    report: &ReportPayload,
    pair: &SourcePair,
    config: &PipelineConfig,
) -> TrendResult<String> {
    let top_n = config.top_n_per_facet;
    let a = source(report, &pair.a)?.truncated(top_n);
    let b = source(report, &pair.b)?.truncated(top_n);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Analyze Indian fashion trends using '{}' ({} documents) and '{}' ({} documents).",
        pair.a, a.document_count, pair.b, b.document_count
    );

    for agg in [&a, &b] {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} DATA:", agg.source.to_uppercase());
        write_table(&mut out, "Top keywords", &agg.keywords);
        write_table(&mut out, "Regions", &agg.regions);
        for facet in config.taxonomy.facets() {
            match agg.facets.get(&facet.name) {
                Some(table) if !table.is_empty() => {
                    write_table(&mut out, &facet.name.replace('_', " "), table)
                }
                _ => {}
            }
        }
        write_region_keywords(&mut out, agg, config);
        write_engagement(&mut out, agg);
    }

    if let Some(cmp) = report.comparison(&pair.a, &pair.b) {
        let join = |set: &BTreeSet<String>| {
            if set.is_empty() {
                "none".to_string()
            } else {
                set.iter().cloned().collect::<Vec<_>>().join(", ")
            }
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "OVERLAP:");
        let _ = writeln!(out, "- Common: {}", join(&cmp.result.common));
        let _ = writeln!(out, "- Only in {}: {}", pair.a, join(&cmp.result.source_a_only));
        let _ = writeln!(out, "- Only in {}: {}", pair.b, join(&cmp.result.source_b_only));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Please provide:");
    for (i, q) in QUESTIONS.iter().enumerate() {
        let _ = writeln!(out, "{}. {q}", i + 1);
    }
    Ok(out)
}

fn source<'r>(report: &'r ReportPayload, name: &str) -> TrendResult<&'r AggregationResult> {
    report
        .aggregations
        .get(name)
        .ok_or_else(|| TrendError::MissingSource(name.to_string()))
}

fn write_region_keywords(out: &mut String, agg: &AggregationResult, config: &PipelineConfig) {
    let regions = config
        .region_map
        .entries()
        .iter()
        .map(|e| e.region)
        .chain([Region::Unknown]);
    let mut header = false;
    for region in regions {
        let Some(table) = agg.region_keywords.get(region.as_str()) else {
            continue;
        };
        if table.is_empty() {
            continue;
        }
        if !header {
            let _ = writeln!(out, "- Regional keywords:");
            header = true;
        }
        let _ = writeln!(out, "  - {region}: {}", render_entries(table));
    }
}

fn write_engagement(out: &mut String, agg: &AggregationResult) {
    let stats = &agg.engagement;
    if agg.document_count == 0 {
        return;
    }
    let _ = write!(
        out,
        "- Engagement: mean score {:.1}, median {:.1}, mean engagement {:.1}",
        stats.mean_score, stats.median_score, stats.mean_engagement
    );
    if let Some(ratio) = stats.mean_upvote_ratio {
        let _ = write!(out, ", mean upvote ratio {ratio:.2}");
    }
    let _ = writeln!(
        out,
        ", {} high-engagement documents",
        stats.high_engagement_documents
    );
    if stats.top_documents.is_empty() {
        return;
    }
    let _ = writeln!(out, "- Top documents:");
    for doc in &stats.top_documents {
        let keywords = if doc.keywords.is_empty() {
            "none".to_string()
        } else {
            doc.keywords.join(", ")
        };
        let origin = if doc.origin.is_empty() {
            String::new()
        } else {
            format!(", {}", doc.origin)
        };
        let _ = writeln!(
            out,
            "  - {} (score {}{origin}; keywords: {keywords})",
            doc.title, doc.score
        );
    }
}

fn render_entries(table: &FrequencyTable) -> String {
    table
        .entries()
        .iter()
        .map(|e| format!("{} ({})", e.term, e.count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_table(out: &mut String, label: &str, table: &FrequencyTable) {
    if table.is_empty() {
        let _ = writeln!(out, "- {label}: no data");
        return;
    }
    let _ = writeln!(out, "- {label}: {}", render_entries(table));
}
