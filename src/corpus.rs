//! Loaders that turn persisted collector output into [`Document`] sequences.
//!
//! Two on-disk shapes are understood:
//! - discussion dumps: `{"<subreddit>": [post, ...], "scrape_info": {...}}`
//! - web-search results: `{"search_results": {"<query>": {"raw_results": [hit, ...]}}}`
//!   or a bare search response `{"searchParameters": {"q": ...}, "organic": [hit, ...]}`
//!
//! A plain JSON array of documents is accepted by both.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{TrendError, TrendResult};
use crate::model::{id_text, Document};

/// Envelope written next to the posts by the discussion collector. Only read
/// for logging; the pipeline needs nothing from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapeInfo {
    #[serde(default)]
    pub total_items: Option<u64>,
    #[serde(default)]
    pub sources_seen: Option<Value>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedCorpus {
    pub documents: Vec<Document>,
    pub scrape_info: Option<ScrapeInfo>,
    /// Records that could not be read as posts or hits.
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct DiscussionPost {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "selftext", alias = "content")]
    body: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    num_comments: Option<f64>,
    #[serde(default, alias = "created_utc")]
    created: Option<f64>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    upvote_ratio: Option<f64>,
    #[serde(default, alias = "link_flair_text")]
    flair: Option<String>,
}

impl DiscussionPost {
    fn into_document(self, source: &str, origin: &str) -> Document {
        Document {
            id: self.id.and_then(id_text).unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            body: self.body.unwrap_or_default(),
            source_name: source.to_string(),
            origin: origin.to_string(),
            score: self.score.unwrap_or(0.0) as i64,
            engagement_count: self.num_comments.unwrap_or(0.0).max(0.0) as u64,
            created_at: self.created.map(|c| c as i64),
            author: self.author.unwrap_or_default(),
            url: self.url.filter(|u| !u.is_empty()),
            upvote_ratio: self.upvote_ratio,
            flair: self.flair.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "description")]
    snippet: Option<String>,
    #[serde(default, alias = "url")]
    link: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

impl SearchHit {
    fn into_document(self, source: &str, query: &str, position: usize) -> Document {
        let id = match &self.link {
            Some(link) if !link.is_empty() => link.clone(),
            _ => format!("{query}#{position}"),
        };
        Document {
            id,
            title: self.title.unwrap_or_default(),
            body: self.snippet.unwrap_or_default(),
            source_name: source.to_string(),
            origin: query.to_string(),
            score: 0,
            engagement_count: 0,
            created_at: self
                .date
                .as_deref()
                .and_then(|d| chrono::DateTime::parse_from_rfc3339(d).ok())
                .map(|dt| dt.timestamp()),
            author: String::new(),
            url: self.link.filter(|l| !l.is_empty()),
            upvote_ratio: None,
            flair: String::new(),
        }
    }
}

/// Read a JSON file.
pub fn read_json(path: &Path) -> TrendResult<Value> {
    let text = std::fs::read_to_string(path).map_err(|source| TrendError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Parse a plain array of documents, stamping `source` on any without one.
pub fn documents_from_array(rows: &[Value], source: &str) -> LoadedCorpus {
    let mut corpus = LoadedCorpus::default();
    for row in rows {
        match serde_json::from_value::<Document>(row.clone()) {
            Ok(mut doc) => {
                if doc.source_name.is_empty() {
                    doc.source_name = source.to_string();
                }
                corpus.documents.push(doc);
            }
            Err(e) => {
                warn!(source, error = %e, "skipping unreadable document");
                corpus.skipped += 1;
            }
        }
    }
    corpus
}

/// Load a discussion dump keyed by origin (subreddit).
///
/// Origins come out in the order the file lists them; posts keep their order
/// within an origin.
pub fn load_discussion(value: &Value, source: &str) -> TrendResult<LoadedCorpus> {
    if let Value::Array(rows) = value {
        return Ok(documents_from_array(rows, source));
    }
    let map = value.as_object().ok_or_else(|| {
        TrendError::Config(format!(
            "discussion dump for '{source}' must be an object or an array"
        ))
    })?;

    let mut corpus = LoadedCorpus::default();
    for (origin, posts) in map {
        if origin == "scrape_info" {
            corpus.scrape_info = serde_json::from_value(posts.clone()).ok();
            continue;
        }
        let Some(posts) = posts.as_array() else {
            warn!(source, origin = %origin, "expected a list of posts, skipping");
            continue;
        };
        debug!(source, origin = %origin, posts = posts.len(), "loading posts");
        for post in posts {
            match serde_json::from_value::<DiscussionPost>(post.clone()) {
                Ok(p) => corpus.documents.push(p.into_document(source, origin)),
                Err(e) => {
                    warn!(source, origin = %origin, error = %e, "skipping unreadable post");
                    corpus.skipped += 1;
                }
            }
        }
    }

    if let Some(info) = &corpus.scrape_info {
        debug!(
            source,
            total_items = ?info.total_items,
            last_updated = ?info.last_updated,
            "scrape envelope"
        );
    }
    Ok(corpus)
}

/// Load saved web-search results, one document per hit.
pub fn load_search_results(value: &Value, source: &str) -> TrendResult<LoadedCorpus> {
    if let Value::Array(rows) = value {
        return Ok(documents_from_array(rows, source));
    }

    let mut corpus = LoadedCorpus::default();
    if let Some(results) = value.get("search_results").and_then(Value::as_object) {
        for (query, entry) in results {
            let hits = entry
                .get("raw_results")
                .or_else(|| entry.get("organic"))
                .and_then(Value::as_array);
            match hits {
                Some(hits) => push_hits(&mut corpus, hits, source, query),
                None => warn!(source, query = %query, "search entry has no results, skipping"),
            }
        }
        return Ok(corpus);
    }

    if let Some(hits) = value.get("organic").and_then(Value::as_array) {
        let query = value
            .get("searchParameters")
            .and_then(|p| p.get("q"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        push_hits(&mut corpus, hits, source, query);
        return Ok(corpus);
    }

    Err(TrendError::Config(format!(
        "web results for '{source}' need 'search_results', 'organic', or a document array"
    )))
}

fn push_hits(corpus: &mut LoadedCorpus, hits: &[Value], source: &str, query: &str) {
    for (position, hit) in hits.iter().enumerate() {
        match serde_json::from_value::<SearchHit>(hit.clone()) {
            Ok(h) => corpus
                .documents
                .push(h.into_document(source, query, position)),
            Err(e) => {
                warn!(source, query, error = %e, "skipping unreadable search hit");
                corpus.skipped += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn discussion_dump_by_subreddit() {
        let dump = json!({
            "IndianFashion": [
                {"id": "a1", "title": "Saree", "body": "silk", "score": 12, "num_comments": 3,
                 "created": 1704067200.0, "author": "u1", "url": "https://i.redd.it/x.jpg",
                 "upvote_ratio": 0.97, "flair": "Haul"},
                {"id": "a2", "title": "Kurta", "selftext": "cotton"}
            ],
            "DesiFashion": [{"id": 7, "title": "Lehenga"}],
            "scrape_info": {"total_items": 3, "sources_seen": ["IndianFashion"],
                            "last_updated": "2024-01-01T00:00:00"}
        });
        let corpus = load_discussion(&dump, "reddit").unwrap();
        assert_eq!(corpus.documents.len(), 3);
        assert_eq!(corpus.skipped, 0);
        assert_eq!(corpus.scrape_info.unwrap().total_items, Some(3));

        let origins: Vec<&str> = corpus.documents.iter().map(|d| d.origin.as_str()).collect();
        assert_eq!(origins, vec!["IndianFashion", "IndianFashion", "DesiFashion"]);
        assert_eq!(corpus.documents[2].id, "7");

        let saree = corpus.documents.iter().find(|d| d.id == "a1").unwrap();
        assert_eq!(saree.source_name, "reddit");
        assert_eq!(saree.score, 12);
        assert_eq!(saree.engagement_count, 3);
        assert_eq!(saree.created_at, Some(1_704_067_200));
        assert_eq!(saree.upvote_ratio, Some(0.97));
        assert_eq!(saree.flair, "Haul");

        let kurta = corpus.documents.iter().find(|d| d.id == "a2").unwrap();
        assert_eq!(kurta.body, "cotton");
    }

    #[test]
    fn subreddits_keep_file_order() {
        let dump: Value = serde_json::from_str(
            r#"{"zFashion": [{"title": "saree"}], "aFashion": [{"title": "kurta"}]}"#,
        )
        .unwrap();
        let corpus = load_discussion(&dump, "reddit").unwrap();
        assert_eq!(corpus.documents[0].origin, "zFashion");
        assert_eq!(corpus.documents[1].origin, "aFashion");
    }

    #[test]
    fn unreadable_posts_are_skipped() {
        let dump = json!({"IndianFashion": [{"title": 42}, {"title": "ok"}], "notes": "hi"});
        let corpus = load_discussion(&dump, "reddit").unwrap();
        assert_eq!(corpus.documents.len(), 1);
        assert_eq!(corpus.skipped, 1);
    }

    #[test]
    fn saved_search_results() {
        let saved = json!({
            "metadata": {"total_queries": 1},
            "search_results": {
                "saree trends 2024": {
                    "keywords": ["saree"],
                    "raw_results": [
                        {"title": "Saree trends", "snippet": "Banarasi silk is back",
                         "link": "https://www.vogue.in/s"},
                        {"title": "No link"}
                    ]
                }
            }
        });
        let corpus = load_search_results(&saved, "web").unwrap();
        assert_eq!(corpus.documents.len(), 2);
        let hit = &corpus.documents[0];
        assert_eq!(hit.origin, "saree trends 2024");
        assert_eq!(hit.body, "Banarasi silk is back");
        assert_eq!(hit.url.as_deref(), Some("https://www.vogue.in/s"));
        assert_eq!(corpus.documents[1].id, "saree trends 2024#1");
    }

    #[test]
    fn bare_search_response() {
        let response = json!({
            "searchParameters": {"q": "lehenga"},
            "organic": [{"title": "Lehenga looks", "snippet": "", "link": "https://femina.in/l"}]
        });
        let corpus = load_search_results(&response, "web").unwrap();
        assert_eq!(corpus.documents[0].origin, "lehenga");
        assert_eq!(corpus.documents[0].id, "https://femina.in/l");
    }

    #[test]
    fn unknown_search_shape_is_an_error() {
        assert!(load_search_results(&json!({"foo": 1}), "web").is_err());
    }

    #[test]
    fn plain_document_array() {
        let rows = json!([{"title": "saree", "source_name": "x"}, {"title": "kurta"}]);
        let corpus = load_search_results(&rows, "web").unwrap();
        assert_eq!(corpus.documents[0].source_name, "x");
        assert_eq!(corpus.documents[1].source_name, "web");
    }
}
