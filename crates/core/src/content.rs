//! ContentStore trait: key/value blob store holding passage text.

use async_trait::async_trait;

use crate::error::StoreError;

/// The content store.
///
/// `get` returns `Ok(None)` when no blob exists for the key; a read that
/// fails for any other reason is an error.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// The backend name (e.g. "fs", "http", "in_memory").
    fn name(&self) -> &str;

    /// Fetch the full text stored under `key`.
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, StoreError>;
}
