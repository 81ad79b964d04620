//! # Verification API
//!
//! Serves the demo verification flows over HTTP. Gateway credentials and
//! settings are read from the environment (or a `.env` file).

use anyhow::Result;
use clap::Parser;
use credibil_ciba::{CibaClient, Config};
use demos::AppState;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(version, about = "Serve the verification demo API")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = Config::load()?;
    let state = AppState {
        client: CibaClient::from_config(&config)?,
        pacing: config.bulk_pacing,
    };

    let listener = TcpListener::bind(&args.addr).await?;
    demos::serve(listener, state, shutdown()).await
}

async fn shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutting down");
}
