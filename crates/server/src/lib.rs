//! HTTP surface for docchat.

pub mod app;
pub mod error;
pub mod handlers;
pub mod routes;

pub use app::{build_chat_service, AppState};
pub use error::ApiError;
pub use routes::{create_router, run_server};
