//! Builds the pipeline and its collaborators from [`AppConfig`].

use std::sync::Arc;
use std::time::Duration;
use teidaishu_config::{AppConfig, ContentBackend, ContentConfig, IndexBackend, IndexConfig};
use teidaishu_core::content::ContentStore;
use teidaishu_core::embedding::TaskType;
use teidaishu_core::index::VectorIndex;
use teidaishu_core::{Error, Result};
use teidaishu_providers::{GeminiProvider, VectorizeIndex};
use teidaishu_store::{FsContentStore, HttpContentStore, JsonlIndex};
use tracing::info;

use crate::answer::AnswerPipeline;
use crate::assembler::ContextAssembler;
use crate::prompt::PromptComposer;
use crate::search::SimilaritySearch;

/// Build the similarity index selected by `[index].backend`.
pub fn build_index(config: &IndexConfig) -> Result<Arc<dyn VectorIndex>> {
    let index: Arc<dyn VectorIndex> = match config.backend {
        IndexBackend::Vectorize => Arc::new(VectorizeIndex::from_config(config)?),
        IndexBackend::Jsonl => {
            let path = config.path.as_ref().ok_or_else(|| Error::Config {
                message: "index.path is required for the jsonl backend".into(),
            })?;
            Arc::new(JsonlIndex::open(path)?)
        }
    };
    Ok(index)
}

/// Build the content store selected by `[content].backend`.
pub fn build_content_store(config: &ContentConfig) -> Result<Arc<dyn ContentStore>> {
    let store: Arc<dyn ContentStore> = match config.backend {
        ContentBackend::Fs => Arc::new(FsContentStore::new(&config.root)),
        ContentBackend::Http => {
            let base_url = config.base_url.as_ref().ok_or_else(|| Error::Config {
                message: "content.base_url is required for the http backend".into(),
            })?;
            let store = HttpContentStore::new(base_url, Duration::from_secs(config.timeout_secs))
                .map_err(|e| Error::Config {
                    message: format!("failed to build HTTP client: {e}"),
                })?;
            Arc::new(store.with_bearer_token(config.bearer_token.clone()))
        }
    };
    Ok(store)
}

/// Build the full answer pipeline.
pub fn build_from_config(config: &AppConfig) -> Result<AnswerPipeline> {
    let gemini = Arc::new(GeminiProvider::from_config(&config.gemini)?);
    let index = build_index(&config.index)?;
    let store = build_content_store(&config.content)?;

    info!(
        index = index.name(),
        store = store.name(),
        embed_model = %config.gemini.embed_model,
        gen_model = %config.gemini.gen_model,
        embed_dim = config.gemini.embed_dim,
        "Pipeline configured"
    );

    let search = SimilaritySearch::new(gemini.clone(), index, config.gemini.embed_dim)
        .with_task_type(TaskType::from_name(&config.gemini.embed_task_type_query));
    let assembler = ContextAssembler::new(store, config.content.prefix.clone());
    let composer = PromptComposer::with_persona(config.prompt.persona.clone());

    Ok(AnswerPipeline::new(search, assembler, composer, gemini))
}
