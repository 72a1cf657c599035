//! Configuration loading, validation, and management for Teidaishu.
//!
//! Loads configuration from `~/.teidaishu/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default output dimensionality for query embeddings.
pub const DEFAULT_EMBED_DIM: u32 = 1536;
const MIN_EMBED_DIM: u32 = 1;
const MAX_EMBED_DIM: u32 = 3072;

/// The root configuration structure.
///
/// Maps directly to `~/.teidaishu/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Embedding + generation service
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Similarity index
    #[serde(default)]
    pub index: IndexConfig,

    /// Passage text store
    #[serde(default)]
    pub content: ContentConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Prompt template overrides
    #[serde(default)]
    pub prompt: PromptConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_url")]
    pub api_url: String,

    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    #[serde(default = "default_embed_dim")]
    pub embed_dim: u32,

    #[serde(default = "default_task_type_query")]
    pub embed_task_type_query: String,

    #[serde(default = "default_gen_model")]
    pub gen_model: String,

    #[serde(default = "default_gemini_timeout")]
    pub timeout_secs: u64,
}

fn default_gemini_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_embed_model() -> String {
    "gemini-embedding-001".into()
}
fn default_embed_dim() -> u32 {
    DEFAULT_EMBED_DIM
}
fn default_task_type_query() -> String {
    "RETRIEVAL_QUERY".into()
}
fn default_gen_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_gemini_timeout() -> u64 {
    60
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_gemini_url(),
            embed_model: default_embed_model(),
            embed_dim: default_embed_dim(),
            embed_task_type_query: default_task_type_query(),
            gen_model: default_gen_model(),
            timeout_secs: default_gemini_timeout(),
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("embed_model", &self.embed_model)
            .field("embed_dim", &self.embed_dim)
            .field("embed_task_type_query", &self.embed_task_type_query)
            .field("gen_model", &self.gen_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Which similarity index implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Cloudflare Vectorize v2 REST API
    #[default]
    Vectorize,
    /// Local JSONL file of pre-embedded passages
    Jsonl,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub backend: IndexBackend,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    #[serde(default = "default_cloudflare_url")]
    pub api_url: String,

    /// JSONL file for the local backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default = "default_index_timeout")]
    pub timeout_secs: u64,
}

fn default_cloudflare_url() -> String {
    "https://api.cloudflare.com/client/v4".into()
}
fn default_index_timeout() -> u64 {
    30
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::default(),
            account_id: None,
            api_token: None,
            index_name: None,
            api_url: default_cloudflare_url(),
            path: None,
            timeout_secs: default_index_timeout(),
        }
    }
}

impl std::fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexConfig")
            .field("backend", &self.backend)
            .field("account_id", &self.account_id)
            .field("api_token", &redact(&self.api_token))
            .field("index_name", &self.index_name)
            .field("api_url", &self.api_url)
            .field("path", &self.path)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Which content store implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentBackend {
    /// Directory tree on local disk
    #[default]
    Fs,
    /// HTTP object store (R2/S3 public bucket or proxy)
    Http,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    #[serde(default)]
    pub backend: ContentBackend,

    #[serde(default = "default_content_root")]
    pub root: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,

    /// Storage key prefix; empty means "staged"
    #[serde(default)]
    pub prefix: String,

    #[serde(default = "default_content_timeout")]
    pub timeout_secs: u64,
}

fn default_content_root() -> PathBuf {
    PathBuf::from("data/reddit")
}
fn default_content_timeout() -> u64 {
    30
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            backend: ContentBackend::default(),
            root: default_content_root(),
            base_url: None,
            bearer_token: None,
            prefix: String::new(),
            timeout_secs: default_content_timeout(),
        }
    }
}

impl std::fmt::Debug for ContentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentConfig")
            .field("backend", &self.backend)
            .field("root", &self.root)
            .field("base_url", &self.base_url)
            .field("bearer_token", &redact(&self.bearer_token))
            .field("prefix", &self.prefix)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Replaces the built-in persona preamble
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.teidaishu/config.toml).
    ///
    /// Environment variables override file values:
    /// - `GEMINI_API_KEY` (then `GOOGLE_API_KEY`)
    /// - `GEMINI_EMBED_MODEL`, `GEMINI_GEN_MODEL`, `GEMINI_EMBED_DIM`,
    ///   `GEMINI_EMBED_TASK_TYPE_QUERY`
    /// - `CF_ACCOUNT_ID`, `CF_API_TOKEN`, `VECTORIZE_INDEX`
    /// - `R2_PREFIX`, `TEIDAISHU_CONTENT_ROOT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, then apply process environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_lookup(path, |key| std::env::var(key).ok())
    }

    /// Load from `path`, apply overrides from `lookup`, then validate once.
    pub fn load_with_lookup<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::load_from(path)?;
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without validating it. A missing file yields
    /// defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Apply overrides from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")) {
            self.gemini.api_key = Some(key);
        }
        if let Some(model) = get("GEMINI_EMBED_MODEL") {
            self.gemini.embed_model = model;
        }
        if let Some(model) = get("GEMINI_GEN_MODEL") {
            self.gemini.gen_model = model;
        }
        if let Some(dim) = get("GEMINI_EMBED_DIM") {
            match dim.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => {
                    self.gemini.embed_dim =
                        (n.trunc() as i64).clamp(MIN_EMBED_DIM as i64, MAX_EMBED_DIM as i64) as u32;
                }
                _ => tracing::warn!(value = %dim, "Ignoring non-numeric GEMINI_EMBED_DIM"),
            }
        }
        if let Some(task) = get("GEMINI_EMBED_TASK_TYPE_QUERY") {
            self.gemini.embed_task_type_query = task;
        }
        if let Some(account) = get("CF_ACCOUNT_ID") {
            self.index.account_id = Some(account);
        }
        if let Some(token) = get("CF_API_TOKEN") {
            self.index.api_token = Some(token);
        }
        if let Some(index) = get("VECTORIZE_INDEX") {
            self.index.index_name = Some(index);
        }
        if let Some(prefix) = get("R2_PREFIX") {
            self.content.prefix = prefix;
        }
        if let Some(root) = get("TEIDAISHU_CONTENT_ROOT") {
            self.content.root = PathBuf::from(root);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".teidaishu")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_EMBED_DIM..=MAX_EMBED_DIM).contains(&self.gemini.embed_dim) {
            return Err(ConfigError::ValidationError(format!(
                "gemini.embed_dim must be between {MIN_EMBED_DIM} and {MAX_EMBED_DIM}"
            )));
        }

        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.port must be non-zero".into(),
            ));
        }

        if self.content.backend == ContentBackend::Http && self.content.base_url.is_none() {
            return Err(ConfigError::ValidationError(
                "content.base_url is required for the http backend".into(),
            ));
        }

        if self.index.backend == IndexBackend::Jsonl && self.index.path.is_none() {
            return Err(ConfigError::ValidationError(
                "index.path is required for the jsonl backend".into(),
            ));
        }

        Ok(())
    }

    /// Check if the embedding/generation key is available.
    pub fn has_api_key(&self) -> bool {
        self.gemini
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gemini.embed_dim, 1536);
        assert_eq!(config.gemini.gen_model, "gemini-2.5-flash");
        assert_eq!(config.gateway.port, 8787);
        assert_eq!(config.index.backend, IndexBackend::Vectorize);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gemini.embed_model, config.gemini.embed_model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn out_of_range_embed_dim_rejected() {
        let mut config = AppConfig::default();
        config.gemini.embed_dim = 4096;
        assert!(config.validate().is_err());
        config.gemini.embed_dim = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_backend_rejected_at_parse() {
        let result: Result<AppConfig, _> = toml::from_str("[index]\nbackend = \"pinecone\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn http_backend_requires_base_url() {
        let mut config = AppConfig::default();
        config.content.backend = ContentBackend::Http;
        assert!(config.validate().is_err());
        config.content.base_url = Some("https://objects.example.com".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.gemini.embed_model, "gemini-embedding-001");
    }

    #[test]
    fn load_from_file_reads_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[gemini]
embed_dim = 768

[index]
backend = "jsonl"
path = "index.jsonl"

[content]
prefix = "v2"

[prompt]
persona = "You are a helpful archivist.\n"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.gemini.embed_dim, 768);
        assert_eq!(config.index.backend, IndexBackend::Jsonl);
        assert_eq!(config.content.prefix, "v2");
        assert!(config.prompt.persona.is_some());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gemini\nembed_dim = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("GOOGLE_API_KEY", "g-key"),
            ("GEMINI_GEN_MODEL", "gemini-2.5-pro"),
            ("CF_ACCOUNT_ID", "acct"),
            ("CF_API_TOKEN", "tok"),
            ("VECTORIZE_INDEX", "reddit-v1"),
            ("R2_PREFIX", "staged2"),
        ]));
        assert_eq!(config.gemini.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.gemini.gen_model, "gemini-2.5-pro");
        assert_eq!(config.index.account_id.as_deref(), Some("acct"));
        assert_eq!(config.index.index_name.as_deref(), Some("reddit-v1"));
        assert_eq!(config.content.prefix, "staged2");
    }

    #[test]
    fn gemini_key_takes_priority_over_google_key() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("GEMINI_API_KEY", "primary"), ("GOOGLE_API_KEY", "fallback")]));
        assert_eq!(config.gemini.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn env_embed_dim_is_clamped_or_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("GEMINI_EMBED_DIM", "9999")]));
        assert_eq!(config.gemini.embed_dim, 3072);

        config.apply_env(env(&[("GEMINI_EMBED_DIM", "768.9")]));
        assert_eq!(config.gemini.embed_dim, 768);

        config.apply_env(env(&[("GEMINI_EMBED_DIM", "wide")]));
        assert_eq!(config.gemini.embed_dim, 768);
    }

    #[test]
    fn env_fixes_file_value_before_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gemini]\nembed_dim = 5000\n").unwrap();

        let config =
            AppConfig::load_with_lookup(&path, env(&[("GEMINI_EMBED_DIM", "1536")])).unwrap();
        assert_eq!(config.gemini.embed_dim, 1536);

        assert!(matches!(
            AppConfig::load_with_lookup(&path, env(&[])),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig::default();
        config.gemini.api_key = Some("super-secret".into());
        config.index.api_token = Some("cf-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("cf-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini-embedding-001"));
        assert!(toml_str.contains("8787"));
    }
}
