use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hervival_core::{ChatReply, Priority};
use thiserror::Error;

const APOLOGY: &str = "I'm having a moment of difficulty processing your message, but I want you to know that your \
                       feelings and needs matter. Could you try sharing that with me again? If you need immediate \
                       support, I can provide you with contact information for professional help.";

const TECHNICAL_DIFFICULTIES: &str = "I'm experiencing some technical difficulties, but I want to make sure you \
                                      get the support you need. If you need immediate assistance, please don't \
                                      hesitate to reach out to our emergency support services.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("message must be text, got {0}")]
    InvalidMessage(&'static str),

    #[error("internal error: {0}")]
    Internal(String),

    /// Failure outside the chat handler; answered without failure details.
    #[error("server error: {0}")]
    Server(String),
}

fn apology_reply(error: impl Into<String>) -> ChatReply {
    ChatReply::new(APOLOGY, Priority::Medium).with_error(error)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let reply = match self {
            Self::Server(_) => ChatReply::new(TECHNICAL_DIFFICULTIES, Priority::High),
            other => apology_reply(other.to_string()),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(reply)).into_response()
    }
}
