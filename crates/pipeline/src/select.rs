//! Deduplication by logical source and truncation to the document cap.

use std::collections::HashSet;
use teidaishu_core::matches::Match;

/// Select the matches that may contribute context.
///
/// With `dedupe_by_source`, only the first match of each non-empty `sid` is
/// kept and matches without a `sid` are dropped. Truncation to `max_docs`
/// always happens after dedup, so rank order is preserved throughout.
pub fn select_matches(matches: Vec<Match>, max_docs: usize, dedupe_by_source: bool) -> Vec<Match> {
    let deduped: Vec<Match> = if dedupe_by_source {
        let mut seen = HashSet::new();
        matches
            .into_iter()
            .filter(|m| {
                let sid = m.metadata.source_id();
                !sid.is_empty() && seen.insert(sid)
            })
            .collect()
    } else {
        matches
    };

    deduped.into_iter().take(max_docs).collect()
}
