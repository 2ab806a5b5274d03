//! # Grapnel Entry Point
//!
//! Drives the application lifecycle:
//!
//! 1. **Initialization**: parses flags with `clap`, installs the `tracing` subscriber.
//! 2. **State**: constructs the process-wide reflection cache.
//! 3. **Serving**: binds the listener and hands the router to `axum`.
use clap::Parser;
use grapnel::routes;
use grapnel::state::AppState;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "grapnel", version, about = "gRPC client backend over server reflection")]
struct Args {
    /// Address to bind the HTTP server to
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,

    /// Port to listen on
    #[arg(long, short = 'p', env = "PORT", default_value_t = 50051)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let addr = SocketAddr::from((args.bind, args.port));

    let router = routes::router(AppState::new());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "grapnel listening");
    axum::serve(listener, router).await?;

    Ok(())
}
