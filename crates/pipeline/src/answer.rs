//! The answer pipeline and the raw query operation.
//!
//! `ask`: search → select → assemble → compose → generate.
//! `query`: search, optionally attaching each match's text.
//!
//! Single pass, no retries, no state shared between calls. Text fetches run
//! one at a time in rank order since the budget walk depends on it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use teidaishu_core::generation::{GenerationRequest, Generator};
use teidaishu_core::matches::{Metadata, SourceRecord};
use tracing::{debug, info};

use crate::assembler::{AssembledContext, ContextAssembler};
use crate::fetch::fetch_text;
use crate::params::{AskParams, QueryParams};
use crate::prompt::PromptComposer;
use crate::search::SimilaritySearch;
use crate::select::select_matches;

/// Result of `ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOutput {
    #[serde(rename = "q")]
    pub query: String,
    pub answer: String,
    pub sources: Vec<SourceRecord>,
}

/// Everything `ask` computes before calling the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAnswer {
    pub query: String,
    pub context: AssembledContext,
    pub request: GenerationRequest,
}

impl PreparedAnswer {
    pub fn prompt(&self) -> &str {
        &self.request.prompt
    }

    pub fn sources(&self) -> &[SourceRecord] {
        &self.context.sources
    }
}

/// One match as returned by `query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: String,
    pub score: f64,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Result of `query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutput {
    pub index: String,
    pub topk: u32,
    /// Number of results.
    pub matches: usize,
    pub results: Vec<QueryResult>,
}

pub struct AnswerPipeline {
    search: SimilaritySearch,
    assembler: ContextAssembler,
    composer: PromptComposer,
    generator: Arc<dyn Generator>,
}

impl AnswerPipeline {
    pub fn new(
        search: SimilaritySearch,
        assembler: ContextAssembler,
        composer: PromptComposer,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            search,
            assembler,
            composer,
            generator,
        }
    }

    pub fn index_name(&self) -> &str {
        self.search.index_name()
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Run retrieval and prompt composition without generating.
    pub async fn prepare(&self, params: &AskParams) -> teidaishu_core::Result<PreparedAnswer> {
        let matches = self
            .search
            .search(&params.query, params.top_k, params.filter.clone())
            .await?;
        let retrieved = matches.len();

        let selected = select_matches(matches, params.max_docs, params.dedup_sid);
        info!(
            matches = retrieved,
            selected = selected.len(),
            dedup_sid = params.dedup_sid,
            "Matches selected"
        );

        let context = self
            .assembler
            .assemble(&selected, params.ctx_max_chars)
            .await?;
        info!(
            blocks = context.blocks.len(),
            used_chars = context.used_chars,
            ctx_max_chars = params.ctx_max_chars,
            stopped_early = context.stopped_early,
            "Context assembled"
        );

        let prompt = self.composer.compose(&params.query, &context.blocks);

        Ok(PreparedAnswer {
            query: params.query.clone(),
            context,
            request: GenerationRequest {
                prompt,
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        })
    }

    /// Answer a question grounded in retrieved context.
    ///
    /// An empty context is not an error: the question is still answered.
    pub async fn ask(&self, params: &AskParams) -> teidaishu_core::Result<AnswerOutput> {
        let prepared = self.prepare(params).await?;

        debug!(
            generator = self.generator.name(),
            prompt_chars = prepared.request.prompt.chars().count(),
            "Generating answer"
        );
        let answer = self.generator.generate(&prepared.request).await?;
        info!(
            answer_chars = answer.chars().count(),
            sources = prepared.context.sources.len(),
            "Answer generated"
        );

        Ok(AnswerOutput {
            query: prepared.query,
            answer,
            sources: prepared.context.sources,
        })
    }

    /// Return every match in index order, with text when requested.
    pub async fn query(&self, params: &QueryParams) -> teidaishu_core::Result<QueryOutput> {
        let matches = self
            .search
            .search(&params.query, params.top_k, params.filter.clone())
            .await?;

        let mut results = Vec::with_capacity(matches.len());
        for m in matches {
            let text = match (params.with_text, self.assembler.key_for(&m)) {
                (true, Some(key)) => {
                    fetch_text(self.assembler.store(), &key, params.max_chars).await?
                }
                _ => None,
            };
            results.push(QueryResult {
                id: m.id,
                score: m.score,
                metadata: m.metadata,
                text,
            });
        }

        info!(
            results = results.len(),
            with_text = params.with_text,
            "Query complete"
        );

        Ok(QueryOutput {
            index: self.search.index_name().to_string(),
            topk: params.top_k,
            matches: results.len(),
            results,
        })
    }
}
