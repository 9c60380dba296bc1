//! Server command implementation

use std::path::Path;

use anyhow::Result;
use tally_core::Config;
use tally_server::ServerConfig;

use super::load_dataset;

pub async fn cmd_serve(
    data_path: &Path,
    config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut server_config = ServerConfig::from_config(config);
    if let Some(host) = host {
        server_config.host = host;
    }
    if let Some(port) = port {
        server_config.port = port;
    }

    // A missing data file is fine; the dashboard can upload one
    let dataset = if data_path.exists() {
        Some(load_dataset(data_path)?)
    } else {
        None
    };

    println!("🚀 Starting Tally dashboard server...");
    match &dataset {
        Some(data) => println!(
            "   Data: {} ({} transactions)",
            data_path.display(),
            data.len()
        ),
        None => println!("   Data: none loaded ({} not found)", data_path.display()),
    }
    println!(
        "   Listening: http://{}:{}",
        server_config.host, server_config.port
    );

    // Parse allowed CORS origins from environment (comma-separated)
    server_config.allowed_origins = std::env::var("TALLY_CORS_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !server_config.allowed_origins.is_empty() {
        println!(
            "   CORS origins: {}",
            server_config.allowed_origins.join(", ")
        );
    }
    println!();

    tally_server::serve_with_config(dataset, server_config).await
}
