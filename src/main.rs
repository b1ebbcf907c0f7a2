use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use model_route::config::{load_config, Config};
use model_route::proxy::{init_tracing, ProxyServer};

#[derive(Parser)]
#[command(name = "model-route", version, about = "Model-aware routing proxy")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let server = ProxyServer::new(&config)?;
    server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))
}
