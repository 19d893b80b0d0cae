//! `cached-server` — the cache daemon.

use std::path::PathBuf;

use clap::Parser;

use cached::auth::CredentialTable;
use cached::config::{ServerConfig, ServerConfigOverrides};
use cached::server::{listener, tls, ServerContext};

/// In-memory key/value cache server.
#[derive(Debug, Parser)]
#[command(name = "cached-server", about = "Multi-tenant in-memory cache server")]
struct Args {
    /// Port to listen on.
    port: Option<u16>,

    /// Path to the TLS certificate (PEM).
    #[arg(long)]
    cert: Option<PathBuf>,

    /// Path to the TLS private key (PEM).
    #[arg(long)]
    key: Option<PathBuf>,

    /// Path to the credential file.
    #[arg(long)]
    users: Option<PathBuf>,

    /// Interactive-session idle timeout, in seconds.
    #[arg(long)]
    idle_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let _ = tokio_rustls::rustls::crypto::ring::default_provider().install_default();

    let args = Args::parse();
    let config = ServerConfig::resolve(ServerConfigOverrides {
        port: args.port,
        cert_path: args.cert,
        key_path: args.key,
        users_path: args.users,
        idle_timeout_secs: args.idle_timeout,
    })?;

    let credentials = CredentialTable::load(&config.users_path)?;
    let acceptor = tls::load_acceptor(&config.cert_path, &config.key_path)?;
    let ctx = ServerContext::with_idle_timeout(
        credentials,
        std::time::Duration::from_secs(config.idle_timeout_secs),
    );

    let addr = format!("0.0.0.0:{}", config.port).parse()?;
    listener::serve(addr, acceptor, ctx).await?;
    Ok(())
}
