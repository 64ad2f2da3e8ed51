use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::usuarios::services::UsuarioError;

pub const MSG_INTERNAL: &str = "Error interno del servidor";
pub const MSG_NOT_FOUND: &str = "La ruta definida no existe";

/// JSON envelope shared by every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn bad_request(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message).with_detail(detail)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, MSG_NOT_FOUND)
    }

    /// Logs the cause and answers with a generic 500.
    pub fn internal(cause: &anyhow::Error) -> Self {
        error!(error = %format!("{cause:#}"), "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL)
    }

    /// Maps a store failure onto the envelope used by write endpoints.
    pub fn from_usuario(message: &str, e: UsuarioError) -> Self {
        match e {
            UsuarioError::Validation(_) | UsuarioError::DuplicateEmail => {
                Self::bad_request(message, e.to_string())
            }
            UsuarioError::Internal(cause) => Self::internal(&cause),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: self.status.as_u16(),
            message: self.message,
            error: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}
