//! `teidaishu init`: write a default config file.

use std::path::Path;
use teidaishu_config::AppConfig;

pub async fn run(config_path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = super::config_path(config_path);
    write_default(&path, force)?;

    println!("✅ Wrote {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set GEMINI_API_KEY (or [gemini].api_key)");
    println!("  2. Set CF_ACCOUNT_ID, CF_API_TOKEN, VECTORIZE_INDEX, or point [index] at a JSONL file");
    println!("  3. Run `teidaishu doctor`");
    Ok(())
}

fn write_default(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )
        .into());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;
    Ok(())
}
