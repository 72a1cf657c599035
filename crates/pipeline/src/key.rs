//! Storage key derivation.
//!
//! A match id has exactly four colon-separated segments,
//! `r:<type>:<sub>:<docid>`, where `r` marks the remote corpus and `<type>` is
//! `s` (submission) or `c` (comment). The passage text lives at
//! `<prefix>/r/<type>/<sub>/<docid>/<h>.txt`.

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "staged";

const SOURCE_KIND: &str = "r";
const DOC_TYPES: [&str; 2] = ["s", "c"];

/// Derive the content-store key for a match.
///
/// Returns `None` for any id or hash that does not meet the contract; the
/// caller skips such matches.
pub fn derive_key(prefix: &str, id: &str, h: &str) -> Option<String> {
    let prefix = if prefix.is_empty() { DEFAULT_PREFIX } else { prefix };
    if id.is_empty() || h.is_empty() {
        return None;
    }

    let parts: Vec<&str> = id.split(':').collect();
    let [kind, doc_type, sub, doc_id] = parts.as_slice() else {
        return None;
    };
    if *kind != SOURCE_KIND || !DOC_TYPES.contains(doc_type) {
        return None;
    }

    Some(format!("{prefix}/{kind}/{doc_type}/{sub}/{doc_id}/{h}.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_submission_key() {
        assert_eq!(
            derive_key("staged", "r:s:sub1:doc1", "abcd").as_deref(),
            Some("staged/r/s/sub1/doc1/abcd.txt")
        );
    }

    #[test]
    fn empty_prefix_defaults_to_staged() {
        assert_eq!(
            derive_key("", "r:c:japan:k1", "ff00").as_deref(),
            Some("staged/r/c/japan/k1/ff00.txt")
        );
    }

    #[test]
    fn custom_prefix_is_used() {
        assert_eq!(
            derive_key("v2", "r:s:rust:x", "h").as_deref(),
            Some("v2/r/s/rust/x/h.txt")
        );
    }

    #[test]
    fn wrong_segment_count_is_none() {
        assert!(derive_key("staged", "r:s:sub1", "abcd").is_none());
        assert!(derive_key("staged", "r:s:sub1:doc1:extra", "abcd").is_none());
        assert!(derive_key("staged", "plain-id", "abcd").is_none());
    }

    #[test]
    fn wrong_kind_or_type_is_none() {
        assert!(derive_key("staged", "x:s:sub1:doc1", "abcd").is_none());
        assert!(derive_key("staged", "r:t:sub1:doc1", "abcd").is_none());
    }

    #[test]
    fn empty_id_or_hash_is_none() {
        assert!(derive_key("staged", "", "abcd").is_none());
        assert!(derive_key("staged", "r:s:sub1:doc1", "").is_none());
    }

    #[test]
    fn empty_inner_segments_are_kept() {
        assert_eq!(
            derive_key("staged", "r:s::doc1", "abcd").as_deref(),
            Some("staged/r/s//doc1/abcd.txt")
        );
    }
}
