//! Per-request compilation workspace.
//!
//! A workspace is a uniquely named temporary directory owned by exactly one
//! compile call. It is removed on every exit path: explicitly through
//! [`Workspace::schedule_cleanup`] after the response has been produced, or by
//! `TempDir`'s drop if the owning future is cancelled first.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct Workspace {
    dir: TempDir,
    id: String,
    job_name: String,
}

impl Workspace {
    /// Creates `<root>/<job>-<uuid>XXXXXX`. The random suffix keeps two
    /// requests with the same caller-supplied name apart.
    pub fn create(root: Option<&Path>, name: &str) -> io::Result<Self> {
        let job_name = sanitize_job_name(name);
        let id = format!("{job_name}-{}", Uuid::new_v4().simple());

        let mut builder = tempfile::Builder::new();
        builder.prefix(&id);
        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)?
            }
            None => builder.tempdir()?,
        };

        debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir, id, job_name })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Base name shared by the `.tex`, `.pdf` and `.log` files.
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn source_path(&self) -> PathBuf {
        self.file("tex")
    }

    pub fn output_path(&self) -> PathBuf {
        self.file("pdf")
    }

    pub fn log_path(&self) -> PathBuf {
        self.file("log")
    }

    fn file(&self, extension: &str) -> PathBuf {
        self.dir.path().join(format!("{}.{extension}", self.job_name))
    }

    /// Hands the directory to a detached task that deletes it after `delay`.
    ///
    /// Consumes the workspace, so deletion is scheduled exactly once. Must be
    /// called from within a tokio runtime.
    pub fn schedule_cleanup(self, delay: Duration) {
        let Workspace { dir, id, .. } = self;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let path = dir.path().to_path_buf();
            match tokio::task::spawn_blocking(move || remove_quietly(dir)).await {
                Ok(Ok(())) => debug!("Removed workspace {id}"),
                Ok(Err(e)) => warn!("Failed to remove workspace {}: {e}", path.display()),
                Err(e) => warn!("Workspace cleanup task for {id} panicked: {e}"),
            }
        });
    }
}

/// Deletes the directory; an already-missing directory counts as success.
fn remove_quietly(dir: TempDir) -> io::Result<()> {
    match dir.close() {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Restricts a caller-supplied name to a safe file stem (`resume` if nothing survives).
pub fn sanitize_job_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(48)
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "resume".to_string()
    } else {
        cleaned.to_string()
    }
}
