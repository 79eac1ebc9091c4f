/// Configuration module for the portfolio RAG backend.
///
/// Handles loading, validating, and providing default configuration values.
/// Values come from an optional JSON file, then environment overrides
/// (`GEMINI_API_KEY`, `PORTFOLIO_RAG_*`).
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_content_dir() -> PathBuf {
    PathBuf::from("./rag_content")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/tmp/portfolio_rag.db")
}

fn default_collection() -> String {
    "portfolio_rag".to_string()
}

fn default_search_top_k() -> usize {
    3
}

fn default_chunk_size() -> usize {
    8000
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_embedding_model() -> String {
    "gemini-embedding-001".to_string()
}

fn default_generation_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_dimensions() -> usize {
    768
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_assistant_name() -> String {
    "Issalmou Assistant AI".to_string()
}

fn default_owner_name() -> String {
    "Issalmou Adaaiche".to_string()
}

fn default_pivot_language() -> String {
    "français".to_string()
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Directory holding the `*.txt` portfolio content files.
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Logical collection name; every document row is tagged with it.
    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    /// Maximum passage length in characters before a document is split.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Allowed CORS origins. `"*"` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub persona: PersonaConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeminiConfig {
    /// Never written back to disk.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PersonaConfig {
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    /// Name that must survive translation untouched.
    #[serde(default = "default_owner_name")]
    pub owner_name: String,

    /// Language the content files are written in. Queries are translated
    /// into it before retrieval.
    #[serde(default = "default_pivot_language")]
    pub pivot_language: String,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            db_path: default_db_path(),
            collection: default_collection(),
            search_top_k: default_search_top_k(),
            chunk_size: default_chunk_size(),
            bind_addr: default_bind_addr(),
            cors_origins: default_cors_origins(),
            gemini: GeminiConfig::default(),
            persona: PersonaConfig::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            embedding_model: default_embedding_model(),
            generation_model: default_generation_model(),
            dimensions: default_dimensions(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            assistant_name: default_assistant_name(),
            owner_name: default_owner_name(),
            pivot_language: default_pivot_language(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl GeminiConfig {
    /// Whether a usable API key is present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults. Invalid JSON is reported and also
    /// falls back to the defaults so the server can still start.
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref();

        if !path.exists() {
            info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {}: {e}", path.display());
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` to resolve variable names.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("GEMINI_API_KEY").or_else(|| non_empty("GOOGLE_API_KEY")) {
            self.gemini.api_key = Some(key);
        }
        if let Some(dir) = non_empty("PORTFOLIO_RAG_CONTENT_DIR") {
            self.content_dir = PathBuf::from(dir);
        }
        if let Some(db) = non_empty("PORTFOLIO_RAG_DB_PATH") {
            self.db_path = PathBuf::from(db);
        }
        if let Some(addr) = non_empty("PORTFOLIO_RAG_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(top_k) = non_empty("PORTFOLIO_RAG_TOP_K") {
            match top_k.trim().parse() {
                Ok(n) => self.search_top_k = n,
                Err(e) => warn!("Ignoring PORTFOLIO_RAG_TOP_K={top_k:?}: {e}"),
            }
        }
    }

    /// Save configuration to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.search_top_k > 0, "search_top_k must be positive");
        anyhow::ensure!(self.chunk_size > 0, "chunk_size must be positive");
        anyhow::ensure!(
            self.gemini.dimensions > 0,
            "gemini.dimensions must be positive"
        );
        anyhow::ensure!(
            !self.collection.trim().is_empty(),
            "collection must not be empty"
        );
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
