pub mod ask;
pub mod doctor;
pub mod init;
pub mod query;
pub mod serve;

use std::io::Read;
use std::path::{Path, PathBuf};
use teidaishu_config::AppConfig;
use tracing::debug;

/// Load config from an explicit path or the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    debug!(path = %config_path(path).display(), "Loading config");
    let config = match path {
        Some(p) => AppConfig::load_with_env(p),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

pub fn config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// The question from the positional argument, or from stdin when absent.
pub fn read_question(arg: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    let question = match arg.filter(|q| !q.trim().is_empty()) {
        Some(q) => q,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let question = question.trim().to_string();
    if question.is_empty() {
        return Err("No question given (pass it as an argument or on stdin)".into());
    }
    Ok(question)
}

/// Parse an optional `--filter-json` argument into a JSON object.
pub fn parse_filter(raw: Option<&str>) -> Result<Option<serde_json::Value>, Box<dyn std::error::Error>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| format!("--filter-json is not valid JSON: {e}"))?;
    if !value.is_object() {
        return Err("--filter-json must be a JSON object".into());
    }
    Ok(Some(value))
}
