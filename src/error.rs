use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::store::StoreError;

/// The primary error type returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required or malformed field in the request body.
    #[error("campo inválido ou ausente: {0}")]
    Validation(&'static str),

    /// The requested record does not exist.
    #[error("{0} não encontrado")]
    NotFound(&'static str),

    /// A unique field (email, cpf) already exists.
    #[error("{0} já cadastrado")]
    Conflict(&'static str),

    /// Credential check failed or no usable identity.
    #[error("credenciais inválidas")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("erro interno: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Store(StoreError::UnknownCategory(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Best-effort classification of a duplicate-key message coming from an
/// upstream source we do not control. Matches on substrings because that is
/// all the upstream gives us.
pub fn conflict_field(message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    if lower.contains("email") || lower.contains("e-mail") {
        Some("email")
    } else if lower.contains("cpf") {
        Some("cpf")
    } else {
        None
    }
}
