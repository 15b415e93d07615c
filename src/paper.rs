//! The paper record and the pure functions the collection view is built on.
//!
//! The server is loose about shapes: `authors` may be a list or a single
//! string, optional fields arrive as `""` or `null`, and `date` is usually
//! absent. Deserialisation normalises all of that here so the rest of the
//! crate can work with one strongly-typed [`Paper`].

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A paper record extracted by the service from an uploaded PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Opaque, server-assigned id. Also the recency proxy used for ordering.
    ///
    /// Raw server documents key it `_id`.
    #[serde(default, alias = "_id", deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Authors,

    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub doi: Option<String>,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub summary: Option<String>,
}

/// Author field as sent by the server: an ordered list or one raw string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Authors {
    List(Vec<String>),
    Single(String),
}

impl Default for Authors {
    fn default() -> Self {
        Authors::List(Vec::new())
    }
}

impl Authors {
    /// Display form: list entries joined with `", "`, a single string as-is.
    pub fn joined(&self) -> String {
        match self {
            Authors::List(names) => names.join(", "),
            Authors::Single(raw) => raw.clone(),
        }
    }
}

impl Paper {
    pub fn authors_display(&self) -> String {
        self.authors.joined()
    }

    /// Case-insensitive match of `query` against the title or the authors.
    ///
    /// An empty query matches every paper.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.matches_folded(&needle)
    }

    fn matches_folded(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.title.to_lowercase().contains(needle)
            || self.authors.joined().to_lowercase().contains(needle)
    }

    /// When the paper was created: the explicit `date`, else the timestamp
    /// encoded in the id prefix, else `None`.
    pub fn recency(&self) -> Option<DateTime<Utc>> {
        self.date.or_else(|| decode_id_timestamp(&self.id))
    }

    /// [`Paper::recency`] rendered in local time, or `"N/A"` when unknown.
    pub fn recency_label(&self) -> String {
        match self.recency() {
            Some(ts) => ts
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            None => "N/A".to_string(),
        }
    }
}

/// Decode the first 8 characters of `id` as a big-endian hex Unix timestamp
/// (seconds), the layout of a MongoDB ObjectId.
///
/// Returns `None` when the id is shorter than 8 characters or the prefix is
/// not entirely hex digits; callers must treat that as "unknown".
pub fn decode_id_timestamp(id: &str) -> Option<DateTime<Utc>> {
    let prefix = id.get(..8)?;
    if !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let secs = u32::from_str_radix(prefix, 16).ok()?;
    Utc.timestamp_opt(i64::from(secs), 0).single()
}

/// Sort papers by id, descending, comparing ids as strings.
///
/// The sort is stable: papers with equal ids keep their input order.
pub fn sort_by_id_desc(papers: &mut [Paper]) {
    papers.sort_by(|a, b| b.id.cmp(&a.id));
}

/// The papers matching `query`, in their original order.
pub fn filter_papers<'a>(papers: &'a [Paper], query: &str) -> Vec<&'a Paper> {
    let needle = query.to_lowercase();
    papers.iter().filter(|p| p.matches_folded(&needle)).collect()
}

// ── Serde helpers ────────────────────────────────────────────────────────────

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

/// Accept RFC 3339 or a zone-less ISO timestamp (read as UTC); anything else
/// becomes `None` rather than failing the whole list.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let Some(serde_json::Value::String(s)) = raw else {
        return Ok(None);
    };
    Ok(parse_timestamp(&s))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
