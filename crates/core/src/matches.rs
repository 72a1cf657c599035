//! Matches returned by the similarity index, and the source records surfaced
//! to callers alongside an answer.
//!
//! Index metadata has no fixed schema: it is an open string → JSON mapping.
//! Two fields are load-bearing for the pipeline:
//! - `h`: content hash, the filename stem of the stored passage text
//! - `sid`: logical source (originating thread), used for deduplication
//!
//! `sub`, `t`, and `pid` are descriptive and passed through opaquely.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Metadata field holding the content hash.
pub const FIELD_HASH: &str = "h";
/// Metadata field holding the logical source id.
pub const FIELD_SOURCE: &str = "sid";
/// Metadata field holding the subcommunity.
pub const FIELD_SUB: &str = "sub";
/// Metadata field holding the document type.
pub const FIELD_TYPE: &str = "t";
/// Metadata field holding the parent id.
pub const FIELD_PARENT: &str = "pid";

/// Open metadata record attached to a [`Match`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub Map<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert, mostly for tests and local indexes.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Read a field as text.
    ///
    /// Missing, null, `false`, `0`, and empty strings all read as `""`;
    /// other scalars are rendered with their JSON text.
    pub fn text(&self, key: &str) -> String {
        match self.0.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => {
                if *b {
                    "true".into()
                } else {
                    String::new()
                }
            }
            Some(Value::Number(n)) => {
                if n.as_f64().is_some_and(|f| f == 0.0) {
                    String::new()
                } else {
                    n.to_string()
                }
            }
            Some(other) => other.to_string(),
        }
    }

    pub fn content_hash(&self) -> String {
        self.text(FIELD_HASH)
    }

    pub fn source_id(&self) -> String {
        self.text(FIELD_SOURCE)
    }
}

/// One ranked candidate passage returned by the similarity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Structured identifier `kind:type:sub:docid`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    /// Similarity score, higher is better.
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Metadata,
}

impl Match {
    pub fn new(id: impl Into<String>, score: f64, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            score,
            metadata,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The subset of a match surfaced to the caller for every context block that
/// made it into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    pub score: f64,
    pub sub: String,
    pub t: String,
    pub sid: String,
    pub pid: String,
}

impl From<&Match> for SourceRecord {
    fn from(m: &Match) -> Self {
        Self {
            id: m.id.clone(),
            score: m.score,
            sub: m.metadata.text(FIELD_SUB),
            t: m.metadata.text(FIELD_TYPE),
            sid: m.metadata.source_id(),
            pid: m.metadata.text(FIELD_PARENT),
        }
    }
}
