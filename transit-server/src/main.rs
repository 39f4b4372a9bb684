use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transit_server::config::ServerConfig;
use transit_server::graph::ingest;
use transit_server::server;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();
    info!(gtfs_dir = %config.gtfs_dir.display(), "loading transit graph");

    let graph = match ingest::load_graph(&config.gtfs_dir) {
        Ok(graph) => Arc::new(graph),
        Err(e) => {
            error!(error = %e, "failed to load the GTFS feed");
            std::process::exit(1);
        }
    };

    if let Err(e) = server::serve(&config, graph).await {
        error!(error = %e, "server terminated");
        std::process::exit(1);
    }
}
