pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::render::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Render API
        .route("/api/v1/compile", post(handlers::handle_compile))
        .route(
            "/api/v1/resumes/:id/compile",
            post(handlers::handle_compile_document),
        )
        .route(
            "/api/v1/resumes/:id/artifact",
            get(handlers::handle_get_artifact).delete(handlers::handle_delete_artifact),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::render::compiler::{CompilationWorker, CompilerConfig};
    use crate::render::pipeline::ResumeRenderer;
    use crate::render::template::TemplateEngine;
    use crate::storage::memory::InMemoryArtifactStore;
    use crate::storage::{artifact_key, ArtifactStore};

    /// Router backed by an in-memory store and an engine that does not exist,
    /// so every compile takes the fallback path.
    fn test_app(store: Arc<dyn ArtifactStore>) -> (Router, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let worker = CompilationWorker::new(CompilerConfig {
            engine: dir.path().join("missing-engine").display().to_string(),
            cleanup_delay: Duration::from_millis(10),
            workspace_root: Some(dir.path().join("workspaces")),
            ..CompilerConfig::default()
        });
        let renderer = ResumeRenderer::new(
            TemplateEngine::new(dir.path().join("templates")),
            worker,
            store,
            Duration::from_secs(900),
        );
        (build_router(AppState { renderer }), dir)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn document(id: Uuid) -> Value {
        json!({
            "id": id,
            "title": "Resume",
            "templateId": "default",
            "sections": [
                { "id": "p", "type": "personal-info", "content": {
                    "fullName": "Ada Lovelace", "email": "ada@example.com"
                }},
                { "id": "s", "type": "summary", "content": "Analyst & engineer" }
            ]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = test_app(Arc::new(InMemoryArtifactStore::default()));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "vitae-api");
    }

    #[tokio::test]
    async fn test_compile_document_falls_back_and_stores() {
        let store = Arc::new(InMemoryArtifactStore::default());
        let (app, _dir) = test_app(store.clone());
        let user = Uuid::new_v4();
        let id = Uuid::new_v4();

        let response = app
            .oneshot(json_request(
                Method::POST,
                &format!("/api/v1/resumes/{id}/compile"),
                json!({ "user_id": user, "document": document(id) }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "compiled");
        assert_eq!(body["used_fallback"], true);
        assert_eq!(body["storage_key"], artifact_key(user, id));
        assert!(body["compile_details"].as_str().is_some());

        let (bytes, _) = store.get(&artifact_key(user, id)).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(String::from_utf8_lossy(&bytes).contains("(Analyst & engineer) Tj"));
    }

    #[tokio::test]
    async fn test_compile_document_rejects_mismatched_id() {
        let (app, _dir) = test_app(Arc::new(InMemoryArtifactStore::default()));
        let response = app
            .oneshot(json_request(
                Method::POST,
                &format!("/api/v1/resumes/{}/compile", Uuid::new_v4()),
                json!({ "user_id": Uuid::new_v4(), "document": document(Uuid::new_v4()) }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_compile_document_storage_failure_is_bad_gateway() {
        let (app, _dir) = test_app(Arc::new(InMemoryArtifactStore::failing()));
        let id = Uuid::new_v4();
        let response = app
            .oneshot(json_request(
                Method::POST,
                &format!("/api/v1/resumes/{id}/compile"),
                json!({ "user_id": Uuid::new_v4(), "document": document(id) }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "STORAGE_ERROR");
        assert_eq!(body["status"], "failed");
        assert_eq!(body["document_id"], id.to_string());
    }

    #[tokio::test]
    async fn test_raw_compile_failure_is_unprocessable_with_details() {
        let (app, _dir) = test_app(Arc::new(InMemoryArtifactStore::default()));
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/compile",
                json!({ "source": "\\documentclass{article}\\begin{document}x\\end{document}", "name": "cv" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "COMPILATION_FAILED");
        assert!(!body["details"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_raw_compile_rejects_empty_source() {
        let (app, _dir) = test_app(Arc::new(InMemoryArtifactStore::default()));
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/compile",
                json!({ "source": "   " }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_raw_compile_returns_pdf_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("engine.sh");
        std::fs::write(
            &script,
            "for arg in \"$@\"; do last=\"$arg\"; done\nprintf '%%PDF-1.4 ok' > \"${last%.tex}.pdf\"\n",
        )
        .unwrap();
        let worker = CompilationWorker::new(CompilerConfig {
            engine: "sh".to_string(),
            engine_args: vec![script.display().to_string()],
            cleanup_delay: Duration::from_millis(10),
            workspace_root: Some(dir.path().join("workspaces")),
            ..CompilerConfig::default()
        });
        let renderer = ResumeRenderer::new(
            TemplateEngine::new(dir.path().join("templates")),
            worker,
            Arc::new(InMemoryArtifactStore::default()),
            Duration::from_secs(60),
        );
        let app = build_router(AppState { renderer });

        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/compile",
                json!({ "source": "\\relax", "name": "My CV" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "inline; filename=\"My_CV.pdf\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4 ok");
    }

    #[tokio::test]
    async fn test_artifact_get_and_delete() {
        let store = Arc::new(InMemoryArtifactStore::default());
        let (app, _dir) = test_app(store.clone());
        let user = Uuid::new_v4();
        let id = Uuid::new_v4();
        let uri = format!("/api/v1/resumes/{id}/artifact?user_id={user}");

        app.clone()
            .oneshot(json_request(
                Method::POST,
                &format!("/api/v1/resumes/{id}/compile"),
                json!({ "user_id": user, "document": document(id) }),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["storage_key"], artifact_key(user, id));
        assert!(body["url"].as_str().unwrap().contains("expires_in=900"));

        let response = app
            .oneshot(Request::delete(uri.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(store.len(), 0);
    }
}
