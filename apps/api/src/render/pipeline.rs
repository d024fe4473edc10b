//! Resume rendering pipeline — orchestrates template → assembly → compile → store.
//!
//! Flow: load template → assemble sections → populate → LaTeX (two passes)
//!       → on failure, plain-text fallback PDF → upload → signed URL.
//!
//! The caller always gets a PDF unless the artifact store itself fails.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::resume::{DocumentStatus, ResumeDocument};
use crate::render::assembler::{assemble, plain_text};
use crate::render::compiler::{CompilationRequest, CompilationWorker, CompileError};
use crate::render::fallback::encode_minimal_pdf;
use crate::render::template::{populate, TemplateEngine};
use crate::storage::{artifact_key, ArtifactStore, StorageError, PDF_CONTENT_TYPE};

/// Outcome reported back for an external layer to persist on the document.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedResume {
    pub document_id: Uuid,
    pub status: DocumentStatus,
    pub storage_key: String,
    pub url: String,
    /// True when the PDF came from the plain-text fallback encoder.
    pub used_fallback: bool,
    /// Bounded engine log excerpt when compilation failed.
    pub compile_details: Option<String>,
    pub size_bytes: usize,
    pub compiled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactLink {
    pub storage_key: String,
    pub url: String,
}

#[derive(Clone)]
pub struct ResumeRenderer {
    templates: TemplateEngine,
    worker: CompilationWorker,
    store: Arc<dyn ArtifactStore>,
    signed_url_ttl: Duration,
}

impl ResumeRenderer {
    pub fn new(
        templates: TemplateEngine,
        worker: CompilationWorker,
        store: Arc<dyn ArtifactStore>,
        signed_url_ttl: Duration,
    ) -> Self {
        Self {
            templates,
            worker,
            store,
            signed_url_ttl,
        }
    }

    /// Builds the LaTeX source for `document` with its chosen template.
    pub async fn source_for(&self, document: &ResumeDocument) -> String {
        let template = self.templates.load(&document.template_id).await;
        populate(&template, &assemble(&document.sections))
    }

    /// Compiles `document` (or falls back to a plain PDF), uploads it under the
    /// document's deterministic key and returns a signed URL for it.
    pub async fn render(
        &self,
        user_id: Uuid,
        document: &ResumeDocument,
    ) -> Result<RenderedResume, StorageError> {
        let request = CompilationRequest {
            source: self.source_for(document).await,
            name: job_name(document),
        };

        let (pdf, used_fallback, compile_details) = match self.worker.compile(&request).await {
            Ok(pdf) => (pdf, false, None),
            Err(e) => {
                warn!(
                    "Document {} did not compile, using plain-text fallback: {e}",
                    document.id
                );
                let pdf = encode_minimal_pdf(&plain_text(&document.sections));
                (pdf, true, Some(e.details()))
            }
        };

        let storage_key = artifact_key(user_id, document.id);
        let size_bytes = pdf.len();
        self.store
            .upload(&storage_key, Bytes::from(pdf), PDF_CONTENT_TYPE)
            .await?;
        let url = self.store.signed_url(&storage_key, self.signed_url_ttl).await?;

        info!(
            "Rendered document {} for user {} ({} bytes, fallback={})",
            document.id, user_id, size_bytes, used_fallback
        );

        Ok(RenderedResume {
            document_id: document.id,
            status: DocumentStatus::Compiled,
            storage_key,
            url,
            used_fallback,
            compile_details,
            size_bytes,
            compiled_at: Utc::now(),
        })
    }

    /// Raw compile boundary: LaTeX source in, PDF bytes or a compile failure out.
    /// No fallback and no storage.
    pub async fn compile_source(&self, request: &CompilationRequest) -> Result<Vec<u8>, CompileError> {
        self.worker.compile(request).await
    }

    /// Fresh signed URL for an already stored artifact.
    pub async fn artifact_link(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<ArtifactLink, StorageError> {
        let storage_key = artifact_key(user_id, document_id);
        let url = self.store.signed_url(&storage_key, self.signed_url_ttl).await?;
        Ok(ArtifactLink { storage_key, url })
    }

    /// Removes the stored artifact when its document is deleted.
    pub async fn delete_artifact(&self, user_id: Uuid, document_id: Uuid) -> Result<(), StorageError> {
        self.store.delete(&artifact_key(user_id, document_id)).await
    }
}

/// Title when there is one, otherwise the document id; sanitized by the workspace.
fn job_name(document: &ResumeDocument) -> String {
    if document.title.trim().is_empty() {
        document.id.to_string()
    } else {
        document.title.clone()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
