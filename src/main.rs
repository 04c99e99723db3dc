use std::sync::Arc;

use tracing::error;

use rudis::config::Config;
use rudis::server::{self, Server};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match Config::from_args(std::env::args()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid command line arguments");
            std::process::exit(1);
        }
    };

    let server = Arc::new(Server::new(config));

    if let Err(e) = server.load_snapshot_file().await {
        error!(error = %e, "failed to load snapshot file");
        std::process::exit(1);
    }

    if let Err(e) = server::run(server).await {
        error!(error = %e, "server terminated");
        std::process::exit(1);
    }
}
