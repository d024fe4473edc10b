use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::render::compiler::CompilerConfig;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
///
/// This is the only place that reads the environment. Components receive the
/// pieces they need as explicit structs at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Executable name or path of the LaTeX engine (pdflatex, xelatex, ...).
    pub latex_engine: String,
    /// Extra engine arguments placed before the fixed flags, whitespace separated.
    pub latex_engine_args: Vec<String>,
    pub compile_timeout_secs: u64,
    pub workspace_cleanup_delay_secs: u64,
    /// Parent directory for compilation workspaces. `None` means the system temp dir.
    pub workspace_root: Option<PathBuf>,
    pub template_dir: PathBuf,
    pub signed_url_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            port: env_or("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            latex_engine: std::env::var("LATEX_ENGINE").unwrap_or_else(|_| "pdflatex".to_string()),
            latex_engine_args: std::env::var("LATEX_ENGINE_ARGS")
                .map(|raw| raw.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            compile_timeout_secs: env_or("COMPILE_TIMEOUT_SECS", 30)
                .context("COMPILE_TIMEOUT_SECS must be a whole number of seconds")?,
            workspace_cleanup_delay_secs: env_or("WORKSPACE_CLEANUP_DELAY_SECS", 5)
                .context("WORKSPACE_CLEANUP_DELAY_SECS must be a whole number of seconds")?,
            workspace_root: std::env::var("WORKSPACE_ROOT").ok().map(PathBuf::from),
            template_dir: std::env::var("TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("templates")),
            signed_url_ttl_secs: env_or("SIGNED_URL_TTL_SECS", 3600)
                .context("SIGNED_URL_TTL_SECS must be a whole number of seconds")?,
        })
    }

    /// Compilation worker settings derived from this config.
    pub fn compiler(&self) -> CompilerConfig {
        CompilerConfig {
            engine: self.latex_engine.clone(),
            engine_args: self.latex_engine_args.clone(),
            pass_timeout: Duration::from_secs(self.compile_timeout_secs),
            cleanup_delay: Duration::from_secs(self.workspace_cleanup_delay_secs),
            workspace_root: self.workspace_root.clone(),
        }
    }

    pub fn signed_url_ttl(&self) -> Duration {
        Duration::from_secs(self.signed_url_ttl_secs)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Parses an optional variable, falling back to `default` when it is unset.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for '{key}': {raw:?}")),
        Err(_) => Ok(default),
    }
}
