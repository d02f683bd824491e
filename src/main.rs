use clap::Parser;
use iq_signup::{Registry, config, net::http};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "iq-signup", version, about = "Account registration gated on a completed IQ test")]
struct Args {
    /// TOML config file (if omitted, use env / .env)
    #[arg(long, env = "IQ_SIGNUP_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let args = Args::parse();
    let cfg = match &args.config {
        Some(path) => config::Config::load(path)?,
        None => config::Config::from_env()?,
    };
    let cfg = Arc::new(cfg);

    let registry = Arc::new(Registry::from_config(cfg.clone()).await?);

    let http_addr: SocketAddr = cfg.http_addr.parse()?;
    tracing::info!(%http_addr, storage = ?cfg.storage, domain = %cfg.public_domain, "iq-signup listening");
    http::serve(http_addr, registry).await?;

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, prelude::*};

    color_eyre::install().map_err(|e| anyhow::anyhow!(e))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();

    Ok(())
}
