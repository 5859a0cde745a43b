use std::collections::BTreeSet;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::algo::taxonomy::Region;
use crate::error::{TrendError, TrendResult};

/// A raw post or search hit as handed over by a collector.
///
/// Every field is optional on the wire; missing or `null` values become
/// empty strings / zero so that loading never fails on a sparse record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Numeric ids are kept as their decimal text.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_name: String,
    /// Subreddit for discussion posts, search query for web hits.
    #[serde(default, deserialize_with = "null_as_default")]
    pub origin: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub score: i64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub engagement_count: u64,
    /// Unix seconds. Fractional timestamps are truncated.
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub created_at: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Share of upvotes among all votes, discussion posts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upvote_ratio: Option<f64>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub flair: String,
}

impl Document {
    pub fn is_malformed(&self) -> bool {
        self.title.trim().is_empty() && self.body.trim().is_empty()
    }

    /// Strict-mode check; the lenient pipeline just drops malformed documents.
    pub fn validate(&self) -> TrendResult<()> {
        if self.is_malformed() {
            Err(TrendError::MalformedDocument {
                id: self.id.clone(),
            })
        } else {
            Ok(())
        }
    }
}

/// A document with markup-free, whitespace-collapsed text. Display casing is
/// kept; matching lowercases on the fly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    #[serde(flatten)]
    pub document: Document,
    pub clean_title: String,
    pub clean_body: String,
}

impl NormalizedDocument {
    /// Lowercased `title + " " + body`, the text all term matching runs on.
    pub fn matching_text(&self) -> String {
        matching_text(&self.clean_title, &self.clean_body)
    }
}

/// A relevant document with its taxonomy terms and macro-region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedDocument {
    #[serde(flatten)]
    pub normalized: NormalizedDocument,
    pub keywords: BTreeSet<String>,
    pub region: Region,
}

impl TaggedDocument {
    pub fn document(&self) -> &Document {
        &self.normalized.document
    }
}

pub(crate) fn matching_text(title: &str, body: &str) -> String {
    let mut text = String::with_capacity(title.len() + body.len() + 1);
    text.push_str(title);
    text.push(' ');
    text.push_str(body);
    text.to_lowercase()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Text form of an id given as a string or a number.
pub(crate) fn id_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
    id_text(value).ok_or_else(|| de::Error::custom("id must be a string or a number"))
}

fn number<'de, D>(deserializer: D) -> Result<Option<Number>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(Some(n)),
        Some(other) => Err(de::Error::custom(format!("expected a number, got {other}"))),
    }
}

/// Integer value of a JSON number; floats are truncated toward zero.
fn number_to_i64(n: &Number) -> i64 {
    n.as_i64()
        .unwrap_or_else(|| n.as_f64().unwrap_or_default() as i64)
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?.map(|n| number_to_i64(&n)).unwrap_or_default())
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?
        .map(|n| {
            n.as_u64()
                .unwrap_or_else(|| n.as_f64().unwrap_or_default().max(0.0) as u64)
        })
        .unwrap_or_default())
}

fn lenient_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?.map(|n| number_to_i64(&n)))
}
