//! Retrieval-to-context pipeline for Teidaishu.
//!
//! Turns a question into an embedding, queries the similarity index,
//! deduplicates the ranked matches by logical source, fetches their text
//! under a strict character budget, and composes the generation prompt.
//!
//! # Flow
//!
//! 1. [`search::SimilaritySearch`]: embed, then nearest-neighbour query
//! 2. [`select::select_matches`]: dedup by `sid`, cap at `max_docs`
//! 3. [`assembler::ContextAssembler`]: derive keys, fetch text, budget walk
//! 4. [`prompt::PromptComposer`]: persona + blocks + question
//! 5. [`answer::AnswerPipeline`]: generate, return answer + sources

pub mod answer;
pub mod assembler;
pub mod fetch;
pub mod key;
pub mod params;
pub mod prompt;
pub mod search;
pub mod select;
pub mod wiring;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use answer::{AnswerOutput, AnswerPipeline, PreparedAnswer, QueryOutput, QueryResult};
pub use assembler::{AssembledContext, ContextAssembler};
pub use params::{AskParams, QueryParams};
pub use prompt::PromptComposer;
pub use search::SimilaritySearch;
pub use wiring::build_from_config;
