//! Startup wiring: providers, corpus index, prompt, humanizer and chat service.

use docchat_chat::{ChatService, ChatSettings, HumanizerPolicy, SessionMemoryStore};
use docchat_core::config::AppConfig;
use docchat_core::AppResult;
use docchat_knowledge::{
    build_index, create_provider, load_documents, ChunkConfig, EmbeddingConfig, Retriever,
    RetrieverOptions, VectorIndex,
};
use docchat_llm::create_client;
use docchat_prompt::{load_or_default, PromptAssembler};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(chat: ChatService) -> Self {
        Self {
            chat: Arc::new(chat),
        }
    }
}

/// Embedding settings derived from the provider section.
pub fn embedding_config(config: &AppConfig) -> EmbeddingConfig {
    let provider = &config.provider;
    EmbeddingConfig {
        provider: provider.name.clone(),
        model: provider.embedding_model.clone(),
        dimensions: provider.embedding_dimensions,
        batch_size: provider.embed_batch_size,
        base_url: provider.base_url.clone(),
        request_timeout_secs: provider.request_timeout_secs,
        max_retries: provider.max_retries,
    }
}

/// Build the chat service: load and index the corpus, then wire the pipeline.
///
/// Any failure here is fatal for startup; the index is complete before the
/// service is returned.
pub async fn build_chat_service(config: &AppConfig) -> AppResult<ChatService> {
    let provider = &config.provider;
    let api_key = provider.api_key.as_deref();
    let timeout = Duration::from_secs(provider.request_timeout_secs);

    let embedder = create_provider(&embedding_config(config), api_key)?;
    let llm = create_client(
        &provider.name,
        provider.base_url.as_deref(),
        api_key,
        timeout,
        provider.max_retries,
    )?;

    let documents = load_documents(&config.corpus.documents_dir, &config.corpus.extensions)?;
    tracing::info!(
        "Loaded {} documents from {:?}",
        documents.len(),
        config.corpus.documents_dir
    );

    let retrieval = &config.retrieval;
    let chunk_config = ChunkConfig::new(retrieval.chunk_size, retrieval.chunk_overlap)?;
    let (index, stats) = build_index(
        &documents,
        &chunk_config,
        embedder.as_ref(),
        provider.embed_batch_size,
    )
    .await?;
    tracing::info!(
        documents = stats.documents_indexed,
        skipped = stats.documents_skipped,
        chunks = stats.chunks_count,
        "Index ready in {:.2}s",
        stats.duration_secs
    );

    let index: Arc<dyn VectorIndex> = Arc::new(index);
    let retriever = Retriever::new(
        embedder,
        index,
        RetrieverOptions {
            top_k: retrieval.top_k,
            min_score: retrieval.min_score,
            timeout,
        },
    );

    let definition = load_or_default(config.prompt.prompt_file.as_deref())?;
    let assembler = PromptAssembler::new(definition)?;

    let humanizer = match &config.humanizer.policy_file {
        Some(path) => HumanizerPolicy::load(path)?,
        None => HumanizerPolicy::default()
            .with_opening_probability(config.humanizer.opening_probability),
    };

    let rng = match config.humanizer.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let settings = ChatSettings {
        model: provider.chat_model.clone(),
        temperature: Some(provider.temperature),
        top_p: Some(provider.top_p),
        max_output_tokens: provider.max_output_tokens,
        generation_timeout: timeout,
        condense_question: retrieval.condense_question,
    };

    Ok(ChatService::new(retriever, llm, assembler, settings)
        .with_memory(SessionMemoryStore::new(config.memory.history_window))
        .with_humanizer(humanizer)?
        .with_rng(rng))
}
