use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::DocumentStatus;
use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Response body: `{ "error": { "code", "message" }, "details"? }`, plus
/// `document_id` and `status` when a document render failed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// The LaTeX engine could not produce a PDF. `details` is a bounded log excerpt.
    #[error("Compilation failed: {message}")]
    Compilation { message: String, details: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A document's PDF was produced but could not be stored or linked.
    #[error("Rendering document {document_id} failed: {source}")]
    RenderFailed {
        document_id: Uuid,
        #[source]
        source: StorageError,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut document = None;
        let (status, code, message, details) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None),
            AppError::Compilation { message, details } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "COMPILATION_FAILED",
                message,
                Some(details),
            ),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "STORAGE_ERROR",
                    "The artifact store is unavailable".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::RenderFailed {
                document_id,
                source,
            } => {
                tracing::error!("Storage error while rendering document {document_id}: {source}");
                document = Some(document_id);
                (
                    StatusCode::BAD_GATEWAY,
                    "STORAGE_ERROR",
                    "The artifact store is unavailable".to_string(),
                    Some(source.to_string()),
                )
            }
        };

        let mut body = json!({
            "error": {
                "code": code,
                "message": message
            }
        });
        if let Some(details) = details {
            body["details"] = json!(details);
        }
        if let Some(document_id) = document {
            body["document_id"] = json!(document_id);
            body["status"] = json!(DocumentStatus::Failed);
        }

        (status, Json(body)).into_response()
    }
}
