//! `teidaishu doctor`: diagnose configuration and collaborators.

use std::path::Path;
use teidaishu_config::{AppConfig, ContentBackend, IndexBackend};
use teidaishu_pipeline::wiring::{build_content_store, build_index};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Teidaishu Doctor");
    println!("===================\n");

    let path = super::config_path(config_path);
    if path.exists() {
        println!("  ✅ Config file found at {}", path.display());
    } else {
        println!("  ⚠️  No config file at {} (defaults + env)", path.display());
    }

    let config = match super::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    let report = diagnose(&config);
    for line in &report.lines {
        println!("  {line}");
    }

    println!();
    if report.issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {} issue(s) found. See above for details.", report.issues);
    }
    Ok(())
}

#[derive(Debug, Default)]
struct Report {
    lines: Vec<String>,
    issues: usize,
}

impl Report {
    fn ok(&mut self, msg: impl std::fmt::Display) {
        self.lines.push(format!("✅ {msg}"));
    }

    fn fail(&mut self, msg: impl std::fmt::Display) {
        self.lines.push(format!("❌ {msg}"));
        self.issues += 1;
    }
}

fn diagnose(config: &AppConfig) -> Report {
    let mut report = Report::default();

    match config.validate() {
        Ok(()) => report.ok("Config valid"),
        Err(e) => report.fail(e),
    }

    if config.has_api_key() {
        report.ok(format!(
            "Gemini key set (embed={} dim={}, gen={})",
            config.gemini.embed_model, config.gemini.embed_dim, config.gemini.gen_model
        ));
    } else {
        report.fail("No Gemini key: set GEMINI_API_KEY or [gemini].api_key");
    }

    let backend = match config.index.backend {
        IndexBackend::Vectorize => "vectorize",
        IndexBackend::Jsonl => "jsonl",
    };
    match build_index(&config.index) {
        Ok(index) => report.ok(format!("Index ready: {} ({backend})", index.name())),
        Err(e) => report.fail(format!("Index ({backend}): {e}")),
    }

    match build_content_store(&config.content) {
        Ok(store) => {
            let location = match config.content.backend {
                ContentBackend::Fs => config.content.root.display().to_string(),
                ContentBackend::Http => config.content.base_url.clone().unwrap_or_default(),
            };
            if config.content.backend == ContentBackend::Fs && !config.content.root.is_dir() {
                report.fail(format!("Content root {location} does not exist"));
            } else {
                report.ok(format!("Content store ready: {} at {location}", store.name()));
            }
        }
        Err(e) => report.fail(format!("Content store: {e}")),
    }

    report
}
