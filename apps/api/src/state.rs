use crate::render::pipeline::ResumeRenderer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Template loading, compilation, fallback and artifact storage, wired
    /// from `Config` at startup.
    pub renderer: ResumeRenderer,
}
