//! Render pipeline: structured resume → LaTeX → PDF → artifact store.

pub mod assembler;
pub mod compiler;
pub mod escape;
pub mod fallback;
pub mod handlers;
pub mod pipeline;
pub mod template;
pub mod workspace;
