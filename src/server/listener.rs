//! TLS-terminated accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{split, BufReader};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use crate::error::{CacheError, Result};
use crate::session::run_session;

use super::context::ServerContext;

/// Binds `addr`, accepts TLS connections, and spawns one session task per
/// connection until [`ServerContext::request_stop`] fires. Unlike the
/// reference implementation (which only notices the stop flag after its
/// next blocking `accept()` returns), the accept loop here races `accept()`
/// against an async notification so shutdown is immediate.
pub async fn serve(addr: SocketAddr, acceptor: TlsAcceptor, ctx: Arc<ServerContext>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| CacheError::Startup(format!("cannot bind [{addr}]: {e}")))?;
    tracing::info!(%addr, "listening");

    loop {
        tokio::select! {
            _ = ctx.stopped() => {
                tracing::info!("stop-server received, shutting down listener");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                let acceptor = acceptor.clone();
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle(stream, peer, acceptor, ctx).await {
                        tracing::debug!(%peer, error = %e, "session ended with error");
                    }
                });
            }
        }
        if ctx.is_stopped() {
            return Ok(());
        }
    }
}

async fn handle(
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    acceptor: TlsAcceptor,
    ctx: Arc<ServerContext>,
) -> Result<()> {
    tracing::info!(%peer, "connection accepted");
    let tls_stream = acceptor.accept(stream).await?;
    let (read_half, write_half) = split(tls_stream);
    run_session(BufReader::new(read_half), write_half, ctx).await
}
