//! Axum route handlers for the Render API.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::render::compiler::CompilationRequest;
use crate::render::pipeline::{ArtifactLink, RenderedResume};
use crate::render::workspace::sanitize_job_name;
use crate::state::AppState;
use crate::storage::PDF_CONTENT_TYPE;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CompileDocumentRequest {
    pub user_id: Uuid,
    pub document: ResumeDocument,
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/compile
///
/// Compiles raw LaTeX source. Returns the PDF bytes, or a 422 with a bounded
/// log excerpt in `details`. No fallback and nothing is stored.
pub async fn handle_compile(
    State(state): State<AppState>,
    Json(request): Json<CompilationRequest>,
) -> Result<Response, AppError> {
    if request.source.trim().is_empty() {
        return Err(AppError::Validation("source cannot be empty".to_string()));
    }

    let pdf = state
        .renderer
        .compile_source(&request)
        .await
        .map_err(|e| AppError::Compilation {
            message: e.to_string(),
            details: e.details(),
        })?;

    let disposition = format!(
        "inline; filename=\"{}.pdf\"",
        sanitize_job_name(&request.name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

/// POST /api/v1/resumes/:id/compile
///
/// Full pipeline for a structured document: assemble → compile (or fallback)
/// → upload → signed URL. Reports `status` and `storage_key` for the caller to
/// record on the document; a storage failure answers 502 with `status: failed`.
pub async fn handle_compile_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Json(request): Json<CompileDocumentRequest>,
) -> Result<Json<RenderedResume>, AppError> {
    if request.document.id != document_id {
        return Err(AppError::Validation(format!(
            "document id {} does not match path id {document_id}",
            request.document.id
        )));
    }

    let rendered = state
        .renderer
        .render(request.user_id, &request.document)
        .await
        .map_err(|source| AppError::RenderFailed {
            document_id,
            source,
        })?;
    Ok(Json(rendered))
}

/// GET /api/v1/resumes/:id/artifact
///
/// Issues a fresh signed URL for the document's stored PDF.
pub async fn handle_get_artifact(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ArtifactLink>, AppError> {
    let link = state
        .renderer
        .artifact_link(params.user_id, document_id)
        .await?;
    Ok(Json(link))
}

/// DELETE /api/v1/resumes/:id/artifact
///
/// Removes the stored PDF; called when the owning document is deleted.
pub async fn handle_delete_artifact(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    state
        .renderer
        .delete_artifact(params.user_id, document_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
