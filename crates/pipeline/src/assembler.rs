//! Context assembly under a strict character budget.
//!
//! Walks the selected matches in rank order. For each one:
//!
//! 1. Derive the storage key; skip the match if it has none
//! 2. Fetch its text, cut to the budget; skip the match if it is missing
//! 3. Format a block: header line, newline, text
//! 4. If the block would push the running total past the budget, stop
//!
//! Steps 1 and 2 skip and continue. Step 4 ends the walk: later matches are
//! never looked at, even ones that would fit.
//!
//! Lengths are counted in characters.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use teidaishu_core::content::ContentStore;
use teidaishu_core::error::StoreError;
use teidaishu_core::matches::{FIELD_SUB, FIELD_TYPE, Match, SourceRecord};
use tracing::{debug, trace};

use crate::fetch::fetch_text;
use crate::key::derive_key;

/// The blocks that made it into the context, with one source record each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssembledContext {
    pub blocks: Vec<String>,
    pub sources: Vec<SourceRecord>,
    /// Characters used across all blocks.
    pub used_chars: usize,
    /// Whether the walk ended on a block that did not fit.
    pub stopped_early: bool,
}

impl AssembledContext {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

pub struct ContextAssembler {
    store: Arc<dyn ContentStore>,
    prefix: String,
}

impl ContextAssembler {
    pub fn new(store: Arc<dyn ContentStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn store(&self) -> &dyn ContentStore {
        self.store.as_ref()
    }

    /// Storage key for a match, using this assembler's prefix.
    pub fn key_for(&self, m: &Match) -> Option<String> {
        derive_key(&self.prefix, &m.id, &m.metadata.content_hash())
    }

    pub async fn assemble(
        &self,
        matches: &[Match],
        ctx_max_chars: usize,
    ) -> Result<AssembledContext, StoreError> {
        let mut context = AssembledContext::default();

        for m in matches {
            let Some(key) = self.key_for(m) else {
                trace!(id = %m.id, "No storage key, skipping");
                continue;
            };
            let Some(text) = fetch_text(self.store.as_ref(), &key, ctx_max_chars).await? else {
                trace!(id = %m.id, key = %key, "No text, skipping");
                continue;
            };

            let block = format!("{}\n{}", header_line(m), text);
            let candidate_total = context.used_chars + block.chars().count();
            if candidate_total > ctx_max_chars {
                debug!(
                    id = %m.id,
                    candidate_total,
                    ctx_max_chars,
                    "Context budget reached"
                );
                context.stopped_early = true;
                break;
            }

            context.used_chars = candidate_total;
            context.sources.push(SourceRecord::from(m));
            context.blocks.push(block);
        }

        Ok(context)
    }
}

/// `SOURCE id=<id> sub=<sub> t=<t> sid=<sid> score=<score:.6>`
pub fn header_line(m: &Match) -> String {
    format!(
        "SOURCE id={} sub={} t={} sid={} score={:.6}",
        m.id,
        m.metadata.text(FIELD_SUB),
        m.metadata.text(FIELD_TYPE),
        m.metadata.source_id(),
        m.score
    )
}
