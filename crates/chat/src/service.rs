//! The per-request chat pipeline.
//!
//! retrieve -> assemble prompt -> generate -> remember -> humanize

use crate::humanizer::HumanizerPolicy;
use crate::memory::{SessionMemoryStore, Turn};
use docchat_core::{AppError, AppResult};
use docchat_knowledge::Retriever;
use docchat_llm::{LlmClient, LlmRequest};
use docchat_prompt::PromptAssembler;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Session used when the caller does not name one.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Message that resets the conversation instead of asking a question.
pub const CLEAR_COMMAND: &str = "clear";

/// Reply to [`CLEAR_COMMAND`].
pub const RESET_REPLY: &str = "Percakapan sudah direset!";

/// Generation settings.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: Option<u32>,
    /// Time budget for each generation call
    pub generation_timeout: Duration,
    /// Rewrite follow-ups into standalone questions before retrieval
    pub condense_question: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: Some(0.7),
            top_p: Some(0.9),
            max_output_tokens: None,
            generation_timeout: Duration::from_secs(60),
            condense_question: false,
        }
    }
}

/// Result of one chat exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    pub session_id: String,
}

/// Answers questions against the indexed corpus, remembering each session.
pub struct ChatService {
    retriever: Retriever,
    llm: Arc<dyn LlmClient>,
    assembler: PromptAssembler,
    memory: SessionMemoryStore,
    humanizer: HumanizerPolicy,
    rng: Mutex<StdRng>,
    settings: ChatSettings,
}

impl ChatService {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LlmClient>,
        assembler: PromptAssembler,
        settings: ChatSettings,
    ) -> Self {
        Self {
            retriever,
            llm,
            assembler,
            memory: SessionMemoryStore::default(),
            humanizer: HumanizerPolicy::default(),
            rng: Mutex::new(StdRng::from_entropy()),
            settings,
        }
    }

    pub fn with_memory(mut self, memory: SessionMemoryStore) -> Self {
        self.memory = memory;
        self
    }

    /// Replace the humanizer policy. The policy is validated first.
    pub fn with_humanizer(mut self, humanizer: HumanizerPolicy) -> AppResult<Self> {
        humanizer.validate()?;
        self.humanizer = humanizer;
        Ok(self)
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn memory(&self) -> &SessionMemoryStore {
        &self.memory
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `message` within the given session (default: "default").
    ///
    /// Same-session requests are serialised from retrieval until the turns
    /// are stored. A failed request leaves the session unchanged.
    #[instrument(skip_all, fields(session_id = tracing::field::Empty))]
    pub async fn chat(&self, message: &str, session_id: Option<&str>) -> AppResult<ChatReply> {
        let session_id = resolve_session_id(session_id);
        tracing::Span::current().record("session_id", session_id.as_str());

        if message.to_lowercase() == CLEAR_COMMAND {
            self.clear_session(Some(&session_id));
            return Ok(ChatReply {
                response: RESET_REPLY.to_string(),
                session_id,
            });
        }

        if message.trim().is_empty() {
            return Err(AppError::Validation("Message cannot be empty".to_string()));
        }

        let handle = self.memory.get_or_create(&session_id);
        let mut session = handle.lock().await;
        let transcript = session.render();

        let question = if self.settings.condense_question && !session.is_empty() {
            self.condense(&transcript, message).await?
        } else {
            message.to_string()
        };

        let chunks = self.retriever.retrieve(&question).await?;
        debug!("Retrieved {} chunks", chunks.len());

        let prompt = self.assembler.assemble(&transcript, &chunks, &question)?;
        let answer = self.generate(prompt).await?;

        let response = {
            let mut rng = self.rng.lock();
            self.humanizer.humanize(&answer, &mut *rng)
        };

        session.append(Turn::user(message));
        session.append(Turn::assistant(answer.clone()));
        drop(session);

        info!(
            chunks = chunks.len(),
            answer_len = answer.len(),
            "Answered chat message"
        );

        Ok(ChatReply {
            response,
            session_id,
        })
    }

    /// Forget a session's conversation and return the resolved id. Idempotent.
    ///
    /// Ids are resolved like [`ChatService::chat`], so a blank id clears "default".
    pub fn clear_session(&self, session_id: Option<&str>) -> String {
        let session_id = resolve_session_id(session_id);
        if self.memory.clear(&session_id) {
            info!("Cleared memory for session '{}'", session_id);
        }
        session_id
    }

    async fn condense(&self, transcript: &str, message: &str) -> AppResult<String> {
        let prompt = self.assembler.condense(transcript, message)?;
        let standalone = self.generate(prompt).await?;
        let standalone = standalone.trim();

        if standalone.is_empty() {
            return Ok(message.to_string());
        }
        debug!("Condensed follow-up into '{}'", standalone);
        Ok(standalone.to_string())
    }

    async fn generate(&self, prompt: String) -> AppResult<String> {
        let mut request =
            LlmRequest::new(prompt, self.settings.model.clone()).with_system(self.assembler.persona());
        request.temperature = self.settings.temperature;
        request.top_p = self.settings.top_p;
        request.max_tokens = self.settings.max_output_tokens;

        let timeout = self.settings.generation_timeout;
        let response = tokio::time::timeout(timeout, self.llm.complete(&request))
            .await
            .map_err(|_| AppError::Timeout {
                operation: "Generation".to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })??;

        debug!(
            model = %response.model,
            tokens = response.usage.total_tokens,
            "Generation finished"
        );
        Ok(response.content)
    }
}

fn resolve_session_id(session_id: Option<&str>) -> String {
    match session_id {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => DEFAULT_SESSION_ID.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_knowledge::embeddings::providers::MockProvider;
    use docchat_knowledge::{build_index, ChunkConfig, Document, EmbeddingProvider, RetrieverOptions, VectorIndex};
    use docchat_llm::{LlmResponse, MockLlmClient};
    use docchat_prompt::PromptDefinition;

    async fn retriever() -> Retriever {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(MockProvider::new(256));
        let docs = vec![
            Document::new(
                "jadwal.md",
                "Kantor buka setiap hari kerja, jam 08.00 sampai 16.00.",
            ),
            Document::new(
                "beasiswa.md",
                "Pendaftaran beasiswa memerlukan transkrip nilai dan surat rekomendasi.",
            ),
        ];
        let (index, _) = build_index(&docs, &ChunkConfig::default(), embedder.as_ref(), 8)
            .await
            .unwrap();
        let index: Arc<dyn VectorIndex> = Arc::new(index);
        Retriever::new(embedder, index, RetrieverOptions::default())
    }

    async fn service(llm: Arc<dyn LlmClient>) -> ChatService {
        service_with(llm, ChatSettings::default()).await
    }

    async fn service_with(llm: Arc<dyn LlmClient>, settings: ChatSettings) -> ChatService {
        let assembler = PromptAssembler::new(PromptDefinition::default()).unwrap();
        ChatService::new(retriever().await, llm, assembler, settings)
            .with_humanizer(HumanizerPolicy::default().with_opening_probability(0.0))
            .unwrap()
            .with_rng(StdRng::seed_from_u64(1))
    }

    #[tokio::test]
    async fn test_first_question_grounded_and_remembered() {
        let llm = Arc::new(MockLlmClient::new().with_responses(["Kantor buka pukul 08.00."]));
        let service = service(llm.clone()).await;

        let reply = service.chat("Jam berapa kantor buka?", None).await.unwrap();

        assert_eq!(reply.session_id, DEFAULT_SESSION_ID);
        assert_eq!(reply.response, "Kantor buka pukul 08.00.");
        assert_eq!(service.memory().len(DEFAULT_SESSION_ID).await, 2);

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("Kantor buka setiap hari kerja"));
        assert!(requests[0].prompt.contains("Pertanyaan: Jam berapa kantor buka?"));
        assert!(requests[0].system.is_some());
    }

    #[tokio::test]
    async fn test_follow_up_sees_history() {
        let llm = Arc::new(MockLlmClient::new().with_responses(["Pukul 08.00.", "Pukul 16.00."]));
        let service = service(llm.clone()).await;

        service.chat("Jam berapa kantor buka?", Some("s1")).await.unwrap();
        service.chat("Tutupnya jam berapa?", Some("s1")).await.unwrap();

        let second = &llm.requests()[1].prompt;
        assert!(second.contains("Pengguna: Jam berapa kantor buka?\nAsisten: Pukul 08.00."));
        assert_eq!(service.memory().len("s1").await, 4);
    }

    #[tokio::test]
    async fn test_memory_stores_raw_answer() {
        let llm = Arc::new(MockLlmClient::new().with_responses(["Syarat tersebut adalah wajib."]));
        let service = service(llm).await;

        let reply = service.chat("Apa syaratnya?", Some("s")).await.unwrap();

        assert_eq!(reply.response, "Syarat yang dimaksud merupakan wajib.");
        assert_eq!(
            service.memory().render("s").await,
            "Pengguna: Apa syaratnya?\nAsisten: Syarat tersebut adalah wajib."
        );
    }

    #[tokio::test]
    async fn test_clear_command_resets_without_generation() {
        let llm = Arc::new(MockLlmClient::new());
        let service = service(llm.clone()).await;

        service.chat("Halo", Some("s1")).await.unwrap();
        let reply = service.chat("CLEAR", Some("s1")).await.unwrap();

        assert_eq!(reply.response, RESET_REPLY);
        assert_eq!(reply.session_id, "s1");
        assert_eq!(service.memory().len("s1").await, 0);
        assert_eq!(llm.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let llm = Arc::new(MockLlmClient::new());
        let service = service(llm.clone()).await;

        service.chat("Pertanyaan dari A", Some("A")).await.unwrap();
        service.chat("Pertanyaan dari B", Some("B")).await.unwrap();
        service.clear_session(Some("A"));

        assert_eq!(service.memory().len("A").await, 0);
        assert_eq!(service.memory().len("B").await, 2);

        let b_prompt = &llm.requests()[1].prompt;
        assert!(!b_prompt.contains("Pertanyaan dari A"));
    }

    #[tokio::test]
    async fn test_blank_message_is_validation_error() {
        let llm = Arc::new(MockLlmClient::new());
        let service = service(llm.clone()).await;

        let err = service.chat("   ", Some("s")).await.unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(service.memory().session_count(), 0);
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_blank_session_id_uses_default() {
        let service = service(Arc::new(MockLlmClient::new())).await;
        let reply = service.chat("Halo", Some("  ")).await.unwrap();
        assert_eq!(reply.session_id, DEFAULT_SESSION_ID);
    }

    #[tokio::test]
    async fn test_no_answer_becomes_apology() {
        let llm = Arc::new(MockLlmClient::new().with_responses([
            "Maaf, saya tidak memiliki informasi mengenai hal itu.",
        ]));
        let service = service(llm).await;

        let reply = service.chat("Siapa presiden Mars?", None).await.unwrap();
        assert!(HumanizerPolicy::default().apologies.contains(&reply.response));
    }

    struct FailingLlm;

    #[async_trait::async_trait]
    impl LlmClient for FailingLlm {
        fn provider_name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _request: &LlmRequest) -> AppResult<LlmResponse> {
            Err(AppError::Provider("API error (503): overloaded".to_string()))
        }
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_session_untouched() {
        let service = service(Arc::new(FailingLlm)).await;

        let err = service.chat("Jam berapa kantor buka?", Some("s")).await.unwrap_err();
        assert!(matches!(err, AppError::Provider(_)));
        assert!(!err.is_client_error());
        assert_eq!(service.memory().len("s").await, 0);
    }

    #[tokio::test]
    async fn test_generation_timeout() {
        let llm = Arc::new(MockLlmClient::new().with_delay(Duration::from_secs(5)));
        let settings = ChatSettings {
            generation_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let service = service_with(llm, settings).await;

        let err = service.chat("Halo", Some("s")).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout { .. }));
        assert_eq!(service.memory().len("s").await, 0);
    }

    #[tokio::test]
    async fn test_condense_question_on_follow_up() {
        let llm = Arc::new(MockLlmClient::new().with_responses([
            "Pendaftaran memerlukan transkrip.",
            "Apa syarat pendaftaran beasiswa?",
            "Transkrip nilai dan surat rekomendasi.",
        ]));
        let settings = ChatSettings {
            condense_question: true,
            ..Default::default()
        };
        let service = service_with(llm.clone(), settings).await;

        service.chat("Bagaimana daftar beasiswa?", Some("s")).await.unwrap();
        service.chat("Syaratnya apa?", Some("s")).await.unwrap();

        let requests = llm.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].prompt.contains("Follow Up Input: Syaratnya apa?"));
        assert!(requests[2]
            .prompt
            .contains("Pertanyaan: Apa syarat pendaftaran beasiswa?"));

        // Memory keeps what the user actually typed
        let transcript = service.memory().render("s").await;
        assert!(transcript.contains("Pengguna: Syaratnya apa?"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_session_turns_stay_paired() {
        let llm = Arc::new(MockLlmClient::new().with_delay(Duration::from_millis(5)));
        let service = Arc::new(service(llm).await);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .chat(&format!("Pertanyaan {}", i), Some("shared"))
                        .await
                        .unwrap()
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let handle = service.memory().get_or_create("shared");
        let memory = handle.lock().await;
        let turns: Vec<_> = memory.turns().collect();
        assert_eq!(turns.len(), 16);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, crate::memory::Role::User);
            assert_eq!(pair[1].role, crate::memory::Role::Assistant);
        }
    }

    #[tokio::test]
    async fn test_blank_session_id_clears_default() {
        let service = service(Arc::new(MockLlmClient::new())).await;

        let reply = service.chat("Halo", Some(" ")).await.unwrap();
        assert_eq!(reply.session_id, DEFAULT_SESSION_ID);
        assert_eq!(service.memory().len(DEFAULT_SESSION_ID).await, 2);

        assert_eq!(service.clear_session(Some(" ")), DEFAULT_SESSION_ID);
        assert_eq!(service.memory().len(DEFAULT_SESSION_ID).await, 0);
    }

    #[tokio::test]
    async fn test_invalid_humanizer_rejected() {
        let assembler = PromptAssembler::new(PromptDefinition::default()).unwrap();
        let result = ChatService::new(
            retriever().await,
            Arc::new(MockLlmClient::new()),
            assembler,
            ChatSettings::default(),
        )
        .with_humanizer(HumanizerPolicy::default().with_opening_probability(1.5));

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_other_sessions_do_not_wait_for_a_held_session() {
        let service = service(Arc::new(MockLlmClient::new())).await;

        let held = service.memory().get_or_create("A");
        let _guard = held.lock().await;

        let reply = tokio::time::timeout(Duration::from_secs(2), service.chat("Halo", Some("B")))
            .await
            .expect("session B blocked by session A")
            .unwrap();
        assert_eq!(reply.session_id, "B");
        assert_eq!(service.memory().len("B").await, 2);
    }
}
