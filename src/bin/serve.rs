//! Development server: serves a directory over HTTP and opens the browser.

use anyhow::{Context, Result};
use log::{error, info};
use std::env;
use wasm_assets::backend::StaticServer;
use wasm_assets::backend::utils::config::ServeConfig;
use wasm_assets::backend::utils::file_utils::absolute_display;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = ServeConfig::from_args(env::args().skip(1))
        .context("Usage: serve [PORT] [ROOT] [--no-browser]")?;

    let server = StaticServer::bind(config.bind_addr(), &config.root)
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    let url = config.browser_url();

    println!(
        r#"
╔══════════════════════════════════════════════╗
║          FRAME MAKER - Local Server          ║
╚══════════════════════════════════════════════╝

Server running at: {url}

Serving from: {}

Press Ctrl+C to stop the server
"#,
        absolute_display(server.root()).display()
    );

    if config.open_browser {
        info!("Opening {url} in the default browser");
        if let Err(e) = webbrowser::open(&url) {
            error!("Failed to open browser: {e}");
        }
    }

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    println!("\n\nServer stopped. Goodbye!");
    Ok(())
}
