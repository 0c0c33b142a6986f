use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Default upper bound on accepted file size: 50 MiB.
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub storage_url: String,
    pub storage_api_key: String,
    pub storage_api_secret: String,
    pub auth_secret: String,
    pub max_upload_bytes: u64,
    pub cors_origin: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "StudyShare resource-sharing API")]
pub struct Args {
    /// Host to bind to (overrides STUDYSHARE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides STUDYSHARE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides STUDYSHARE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Object-storage provider base URL (overrides STUDYSHARE_STORAGE_URL)
    #[arg(long)]
    pub storage_url: Option<String>,

    /// Object-storage API key (overrides STUDYSHARE_STORAGE_API_KEY)
    #[arg(long)]
    pub storage_api_key: Option<String>,

    /// Object-storage API secret (overrides STUDYSHARE_STORAGE_API_SECRET)
    #[arg(long)]
    pub storage_api_secret: Option<String>,

    /// Token-verification secret (overrides STUDYSHARE_AUTH_SECRET)
    #[arg(long)]
    pub auth_secret: Option<String>,

    /// Maximum accepted file size in bytes (overrides STUDYSHARE_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<u64>,

    /// Allowed CORS origin for the frontend (overrides STUDYSHARE_CORS_ORIGIN)
    #[arg(long)]
    pub cors_origin: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("STUDYSHARE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("STUDYSHARE_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing STUDYSHARE_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3001,
            Err(err) => return Err(err).context("reading STUDYSHARE_PORT"),
        };
        let env_db = env::var("STUDYSHARE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/studyshare.db".into());
        let env_max_bytes = match env::var("STUDYSHARE_MAX_UPLOAD_BYTES") {
            Ok(value) => Some(value.parse::<u64>().with_context(|| {
                format!("parsing STUDYSHARE_MAX_UPLOAD_BYTES value `{}`", value)
            })?),
            Err(_) => None,
        };
        let env_cors = env::var("STUDYSHARE_CORS_ORIGIN").ok();

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            storage_url: required("STUDYSHARE_STORAGE_URL", args.storage_url)?,
            storage_api_key: required("STUDYSHARE_STORAGE_API_KEY", args.storage_api_key)?,
            storage_api_secret: required("STUDYSHARE_STORAGE_API_SECRET", args.storage_api_secret)?,
            auth_secret: required("STUDYSHARE_AUTH_SECRET", args.auth_secret)?,
            max_upload_bytes: args
                .max_upload_bytes
                .or(env_max_bytes)
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            cors_origin: args.cors_origin.or(env_cors),
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A setting with no safe default: CLI value, then environment, then error.
fn required(name: &str, cli_value: Option<String>) -> Result<String> {
    cli_value
        .or_else(|| env::var(name).ok())
        .with_context(|| format!("{name} is not set"))
}
