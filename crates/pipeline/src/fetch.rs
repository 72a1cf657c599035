//! Budgeted text fetch from the content store.

use teidaishu_core::content::ContentStore;
use teidaishu_core::error::StoreError;

/// Fetch the text stored under `key`, trimmed and cut to `max_chars`
/// characters. A `max_chars` of 0 disables the cut.
///
/// Returns `None` when the blob is absent or blank after trimming. One store
/// read per call.
pub async fn fetch_text(
    store: &dyn ContentStore,
    key: &str,
    max_chars: usize,
) -> Result<Option<String>, StoreError> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    let text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }

    Ok(Some(truncate_chars(text, max_chars).to_string()))
}

/// Hard cut at `max_chars` characters; not word-boundary aware.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return text;
    }
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
