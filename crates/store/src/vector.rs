//! Vector similarity and metadata filtering for the local indexes.
//!
//! - Cosine similarity
//! - Ranking of stored passages against a query vector
//! - A subset of the Vectorize filter language (`$eq`, `$ne`, `$in`, `$nin`)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use teidaishu_core::index::{QueryOptions, ReturnMetadata};
use teidaishu_core::matches::{Match, Metadata};

/// A pre-embedded passage held by a local index.
///
/// Same shape as a Vectorize NDJSON upload record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedPassage {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1]. Returns 0.0 for mismatched lengths, empty
/// input, or a zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f64, 0.0f64, 0.0f64), |(dot, na, nb), (x, y)| {
            let (x, y) = (f64::from(*x), f64::from(*y));
            (dot + x * y, na + x * x, nb + y * y)
        });

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }
    dot / denom
}

/// Rank passages best-first against `vector`, honouring the filter, top-k,
/// and metadata options. Ties are broken by id so results are stable.
pub fn rank(passages: &[IndexedPassage], vector: &[f32], options: &QueryOptions) -> Vec<Match> {
    let mut scored: Vec<Match> = passages
        .iter()
        .filter(|p| {
            options
                .filter
                .as_ref()
                .is_none_or(|f| matches_filter(&p.metadata, f))
        })
        .map(|p| {
            let metadata = match options.return_metadata {
                ReturnMetadata::None => Metadata::new(),
                ReturnMetadata::Indexed | ReturnMetadata::All => p.metadata.clone(),
            };
            Match::new(p.id.clone(), cosine_similarity(&p.values, vector), metadata)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    scored.truncate(options.top_k as usize);
    scored
}

/// Whether `metadata` satisfies every clause of `filter`.
///
/// A clause is either a bare value (equality) or an operator object. A filter
/// that is not a JSON object matches everything.
pub fn matches_filter(metadata: &Metadata, filter: &Value) -> bool {
    let Some(clauses) = filter.as_object() else {
        return true;
    };

    clauses.iter().all(|(field, clause)| {
        let actual = metadata.get(field);
        match clause.as_object() {
            Some(ops) if ops.keys().all(|k| k.starts_with('$')) => {
                ops.iter().all(|(op, expected)| apply_op(op, actual, expected))
            }
            _ => actual == Some(clause),
        }
    })
}

fn apply_op(op: &str, actual: Option<&Value>, expected: &Value) -> bool {
    let within = |list: &Value| {
        list.as_array()
            .is_some_and(|items| actual.is_some_and(|a| items.contains(a)))
    };
    match op {
        "$eq" => actual == Some(expected),
        "$ne" => actual != Some(expected),
        "$in" => within(expected),
        "$nin" => !within(expected),
        _ => false,
    }
}
