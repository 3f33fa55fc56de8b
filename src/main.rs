use anyhow::{Context, Result};
use log::error;
use std::env;
use std::path::PathBuf;
use wasm_assets::backend::AssetFetcher;
use wasm_assets::backend::services::{ConsoleReporter, run_setup};
use wasm_assets::backend::utils::config::FetchConfig;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    if args.len() > 2 || args.iter().skip(1).any(|a| a == "-h" || a == "--help") {
        error!("Usage: {} [config.json]", args[0]);
        std::process::exit(1);
    }

    let config = match args.get(1) {
        Some(path) => {
            let path = PathBuf::from(path);
            FetchConfig::load(&path).with_context(|| format!("Failed to load config {path:?}"))?
        }
        None => FetchConfig::default(),
    };

    println!("\nFetching assets into {}...", config.destination.display());

    let fetcher = AssetFetcher::new(&config.http).context("Failed to build HTTP client")?;
    let mut reporter = ConsoleReporter::stdout();
    let report = run_setup(&config, &fetcher, &mut reporter).await?;
    reporter.summary(&report)?;

    Ok(())
}
