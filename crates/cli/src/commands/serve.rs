use std::path::Path;
use tracing::info;

pub async fn run(
    config_path: Option<&Path>,
    port: Option<u16>,
    host: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(p) = port {
        config.gateway.port = p;
    }
    if let Some(h) = host {
        config.gateway.host = h;
    }
    config.validate()?;
    info!(
        host = %config.gateway.host,
        port = config.gateway.port,
        max_body_bytes = config.gateway.max_body_bytes,
        "Starting gateway"
    );

    println!("🌐 Teidaishu Gateway");
    println!("   Listening on: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Endpoints:");
    println!("     GET  /health");
    println!("     POST /query");
    println!("     POST /ask");
    println!();

    teidaishu_gateway::start(config).await
}
