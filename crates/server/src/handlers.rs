//! Request handlers for the chat API.

use crate::app::AppState;
use crate::error::ApiError;
use axum::extract::State;
use axum::Json;
use docchat_chat::DEFAULT_SESSION_ID;
use serde::{Deserialize, Serialize};

pub const ROOT_MESSAGE: &str = "Document Chatbot API is running";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearMemoryRequest {
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: ROOT_MESSAGE.to_string(),
    })
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let reply = state
        .chat
        .chat(&request.message, Some(&request.session_id))
        .await?;

    Ok(Json(ChatResponse {
        response: reply.response,
        session_id: reply.session_id,
    }))
}

pub async fn clear_memory(
    State(state): State<AppState>,
    Json(request): Json<ClearMemoryRequest>,
) -> Json<MessageResponse> {
    let session_id = state.chat.clear_session(Some(&request.session_id));
    Json(MessageResponse {
        message: format!("Memori percakapan untuk sesi {} telah dihapus", session_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_chat_service;
    use axum::http::StatusCode;
    use docchat_core::config::AppConfig;
    use tempfile::TempDir;

    async fn state(dir: &TempDir) -> AppState {
        std::fs::write(
            dir.path().join("produk.md"),
            "# Produk X\n\nProduk X merupakan aplikasi pencatat keuangan untuk usaha kecil.",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("jadwal.md"),
            "Layanan pelanggan buka setiap hari kerja pukul 08.00 sampai 16.00.",
        )
        .unwrap();

        let mut config = AppConfig::default();
        config.provider.name = "mock".to_string();
        config.corpus.documents_dir = dir.path().to_path_buf();
        config.humanizer.opening_probability = 0.0;
        AppState::new(build_chat_service(&config).await.unwrap())
    }

    fn chat_request(message: &str, session_id: &str) -> Json<ChatRequest> {
        Json(ChatRequest {
            message: message.to_string(),
            session_id: session_id.to_string(),
        })
    }

    #[tokio::test]
    async fn test_root() {
        let Json(body) = root().await;
        assert_eq!(body.message, ROOT_MESSAGE);
    }

    #[tokio::test]
    async fn test_chat_answers_question() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir).await;

        let Json(reply) = chat(State(state), chat_request("Apa itu produk X?", "a"))
            .await
            .unwrap();

        assert!(!reply.response.is_empty());
        assert_eq!(reply.session_id, "a");
    }

    #[tokio::test]
    async fn test_chat_clear_command() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir).await;

        chat(State(state.clone()), chat_request("Apa itu produk X?", "a"))
            .await
            .unwrap();
        let Json(reply) = chat(State(state.clone()), chat_request("clear", "a"))
            .await
            .unwrap();

        assert_eq!(
            reply,
            ChatResponse {
                response: "Percakapan sudah direset!".to_string(),
                session_id: "a".to_string(),
            }
        );
        assert_eq!(state.chat.memory().len("a").await, 0);
    }

    #[tokio::test]
    async fn test_blank_message_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir).await;

        let err = chat(State(state), chat_request("   ", "default"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.detail(), "Message cannot be empty");
    }

    #[tokio::test]
    async fn test_memory_carries_over_between_calls() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir).await;

        chat(State(state.clone()), chat_request("Apa itu produk X?", "b"))
            .await
            .unwrap();
        chat(State(state.clone()), chat_request("Siapa penggunanya?", "b"))
            .await
            .unwrap();

        let transcript = state.chat.memory().render("b").await;
        assert!(transcript.starts_with("Pengguna: Apa itu produk X?\nAsisten: "));
        assert!(transcript.contains("Pengguna: Siapa penggunanya?"));
        assert_eq!(state.chat.memory().len("b").await, 4);
    }

    #[tokio::test]
    async fn test_clear_memory_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir).await;

        chat(State(state.clone()), chat_request("Halo", "c"))
            .await
            .unwrap();

        for _ in 0..2 {
            let Json(body) = clear_memory(
                State(state.clone()),
                Json(ClearMemoryRequest {
                    session_id: "c".to_string(),
                }),
            )
            .await;
            assert_eq!(body.message, "Memori percakapan untuk sesi c telah dihapus");
        }
        assert_eq!(state.chat.memory().len("c").await, 0);
    }

    #[tokio::test]
    async fn test_blank_session_id_is_default_on_both_endpoints() {
        let dir = TempDir::new().unwrap();
        let state = state(&dir).await;

        let Json(reply) = chat(State(state.clone()), chat_request("Halo", " "))
            .await
            .unwrap();
        assert_eq!(reply.session_id, DEFAULT_SESSION_ID);
        assert_eq!(state.chat.memory().len(DEFAULT_SESSION_ID).await, 2);

        let Json(body) = clear_memory(
            State(state.clone()),
            Json(ClearMemoryRequest {
                session_id: " ".to_string(),
            }),
        )
        .await;
        assert_eq!(body.message, "Memori percakapan untuk sesi default telah dihapus");
        assert_eq!(state.chat.memory().len(DEFAULT_SESSION_ID).await, 0);
    }

    #[test]
    fn test_session_id_defaults() {
        let request: ChatRequest = serde_json::from_str(r#"{"message": "Halo"}"#).unwrap();
        assert_eq!(request.session_id, DEFAULT_SESSION_ID);
    }
}
