//! Binary entry point for the TLS handshake tap server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tls_tap::config::{self, ServerPolicy};
use tls_tap::diag::TracingSink;
use tls_tap::server::Server;

#[derive(Debug, Parser)]
#[command(name = "tls-tap", version, about = "TLS handshake tap server")]
struct Args {
    /// Path to the TOML policy file; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tls_tap=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tls-tap starting");

    let args = Args::parse();
    let policy = match &args.config {
        Some(path) => config::load_policy(path)?,
        None => ServerPolicy::default(),
    };

    tracing::info!(
        bind_address = %policy.bind_address(),
        protocol = %policy.protocol,
        curve = %policy.curve,
        cert_path = %policy.cert_path.display(),
        "Policy loaded"
    );

    // The accept loop has no normal exit; reaching here means startup failed.
    if let Err(e) = Server::start(&policy, Arc::new(TracingSink)).await {
        tracing::error!(error = %e, "server failed to start");
        return Err(e.into());
    }

    Ok(())
}
