use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use args::Args;
use state::AppState;

mod args;
mod error;
mod logger;
mod routes;
mod state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = config::Config::load(&args.config)?;

    logger::init(&args, &config)?;
    log::info!("smart proxy gateway starting with {} namespace(s)", config.namespaces.len());

    let state = Arc::new(AppState::build(&config).await?);
    let app = routes::router(state);

    let listener = TcpListener::bind(&config.listen_address)
        .await
        .map_err(|err| anyhow::anyhow!("failed to bind to {}: {err}", config.listen_address))?;

    log::info!("listening on http://{}", config.listen_address);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result.map_err(|err| anyhow::anyhow!("server error: {err}"))?;
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("received ctrl-c, shutting down");
        }
    }

    Ok(())
}
