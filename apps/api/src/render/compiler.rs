//! Compilation Worker — runs the external LaTeX engine in an isolated workspace.
//!
//! Per request: create workspace → write source → pass 1 → pass 2 → read PDF.
//! Any failing step ends the request with a [`CompileError`] carrying a bounded
//! excerpt of the engine log. The workspace is scheduled for deletion on every
//! path once the result is ready.
//!
//! Two passes are always run so cross-references settle; there is no attempt to
//! detect whether the second one is needed.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::render::workspace::Workspace;

/// Number of engine invocations per compile.
pub const PASSES: u8 = 2;

/// Upper bound on the log text surfaced with a failure.
pub const LOG_EXCERPT_CHARS: usize = 1000;

#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Engine executable, resolved through `PATH` unless absolute.
    pub engine: String,
    /// Arguments placed before the fixed engine flags.
    pub engine_args: Vec<String>,
    /// Hard cap on each pass. Exceeding it kills the engine.
    pub pass_timeout: Duration,
    /// Grace period before a finished workspace is deleted.
    pub cleanup_delay: Duration,
    pub workspace_root: Option<PathBuf>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            engine: "pdflatex".to_string(),
            engine_args: Vec::new(),
            pass_timeout: Duration::from_secs(30),
            cleanup_delay: Duration::from_secs(5),
            workspace_root: None,
        }
    }
}

/// Raw compile input: LaTeX source plus a caller-chosen base name.
#[derive(Debug, Clone, Deserialize)]
pub struct CompilationRequest {
    pub source: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Failed to prepare compilation workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("Could not start LaTeX engine '{engine}': {source}")]
    Spawn {
        engine: String,
        #[source]
        source: std::io::Error,
    },

    #[error("LaTeX pass {pass} timed out after {limit_ms}ms")]
    Timeout { pass: u8, limit_ms: u128, log: String },

    #[error("LaTeX pass {pass} failed ({status})")]
    EngineFailed { pass: u8, status: String, log: String },

    #[error("LaTeX finished without producing a PDF")]
    MissingOutput { log: String },
}

impl CompileError {
    /// Bounded, non-empty description suitable for returning to a caller.
    pub fn details(&self) -> String {
        match self {
            CompileError::Timeout { log, .. }
            | CompileError::EngineFailed { log, .. }
            | CompileError::MissingOutput { log } => excerpt(log, LOG_EXCERPT_CHARS),
            other => excerpt(&other.to_string(), LOG_EXCERPT_CHARS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompilationWorker {
    config: CompilerConfig,
}

impl CompilationWorker {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles `request.source` to PDF bytes.
    ///
    /// Cleanup of the workspace is scheduled before returning, on success and
    /// failure alike, and never blocks the caller.
    pub async fn compile(&self, request: &CompilationRequest) -> Result<Vec<u8>, CompileError> {
        let workspace = Workspace::create(self.config.workspace_root.as_deref(), &request.name)
            .map_err(CompileError::Workspace)?;
        let started = Instant::now();
        info!("Compiling {} in workspace {}", workspace.job_name(), workspace.id());

        let result = self.run(&workspace, &request.source).await;

        match &result {
            Ok(pdf) => info!(
                "Compiled {} ({} bytes) in {}ms",
                workspace.id(),
                pdf.len(),
                started.elapsed().as_millis()
            ),
            Err(e) => warn!("Compilation failed in {}: {e}", workspace.id()),
        }

        workspace.schedule_cleanup(self.config.cleanup_delay);
        result
    }

    async fn run(&self, workspace: &Workspace, source: &str) -> Result<Vec<u8>, CompileError> {
        tokio::fs::write(workspace.source_path(), source)
            .await
            .map_err(CompileError::Workspace)?;

        for pass in 1..=PASSES {
            self.run_pass(workspace, pass).await?;
        }

        // A zero exit status is not trusted on its own.
        match tokio::fs::read(workspace.output_path()).await {
            Ok(pdf) if !pdf.is_empty() => Ok(pdf),
            _ => Err(CompileError::MissingOutput {
                log: read_log_excerpt(workspace, "engine exited successfully").await,
            }),
        }
    }

    async fn run_pass(&self, workspace: &Workspace, pass: u8) -> Result<(), CompileError> {
        let source_file = format!("{}.tex", workspace.job_name());
        debug!("LaTeX pass {pass}/{PASSES} for {}", workspace.id());

        let mut child = Command::new(&self.config.engine)
            .args(&self.config.engine_args)
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg(&source_file)
            .current_dir(workspace.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CompileError::Spawn {
                engine: self.config.engine.clone(),
                source,
            })?;

        match timeout(self.config.pass_timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => {
                let context = format!("pass {pass} exited with {status}");
                Err(CompileError::EngineFailed {
                    pass,
                    status: status.to_string(),
                    log: read_log_excerpt(workspace, &context).await,
                })
            }
            Ok(Err(e)) => {
                let context = format!("pass {pass} could not be awaited: {e}");
                Err(CompileError::EngineFailed {
                    pass,
                    status: e.to_string(),
                    log: read_log_excerpt(workspace, &context).await,
                })
            }
            Err(_) => {
                let limit_ms = self.config.pass_timeout.as_millis();
                warn!("LaTeX pass {pass} for {} timed out, killing engine", workspace.id());
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out engine for {}: {e}", workspace.id());
                }
                let context = format!("pass {pass} exceeded the {limit_ms}ms time limit");
                Err(CompileError::Timeout {
                    pass,
                    limit_ms,
                    log: read_log_excerpt(workspace, &context).await,
                })
            }
        }
    }
}

/// Reads the engine log best-effort and returns a bounded excerpt.
///
/// The excerpt starts at the first `!` error line when there is one, since the
/// head of a LaTeX log is banner and package noise. A missing or empty log
/// yields a message built from `context`, so the result is never empty.
async fn read_log_excerpt(workspace: &Workspace, context: &str) -> String {
    match tokio::fs::read(workspace.log_path()).await {
        Ok(bytes) if !bytes.is_empty() => {
            let log = String::from_utf8_lossy(&bytes);
            let start = log
                .find("\n!")
                .map(|i| i + 1)
                .filter(|_| !log.starts_with('!'))
                .unwrap_or(0);
            excerpt(&log[start..], LOG_EXCERPT_CHARS)
        }
        _ => format!("LaTeX {context}; no log file was produced"),
    }
}

/// First `max` characters of `text`, never splitting a code point.
pub fn excerpt(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
