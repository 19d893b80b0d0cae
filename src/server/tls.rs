//! TLS certificate loading and acceptor construction.

use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use crate::error::CacheError;

/// Loads a PEM certificate chain and private key and builds a
/// [`TlsAcceptor`] presenting them to every accepted connection.
pub fn load_acceptor(cert_path: &Path, key_path: &Path) -> Result<TlsAcceptor, CacheError> {
    let certs = load_certs(cert_path)?;
    let key = load_key(key_path)?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| CacheError::Startup(format!("invalid certificate/key pair: {e}")))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, CacheError> {
    let file = std::fs::File::open(path)
        .map_err(|e| CacheError::Startup(format!("cannot open certificate [{path:?}]: {e}")))?;
    let mut reader = std::io::BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CacheError::Startup(format!("malformed certificate [{path:?}]: {e}")))
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, CacheError> {
    let file = std::fs::File::open(path)
        .map_err(|e| CacheError::Startup(format!("cannot open key [{path:?}]: {e}")))?;
    let mut reader = std::io::BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| CacheError::Startup(format!("malformed key [{path:?}]: {e}")))?
        .ok_or_else(|| CacheError::Startup(format!("no private key found in [{path:?}]")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_certs_rejects_missing_file() {
        let result = load_certs(Path::new("/nonexistent/cert.pem"));
        assert!(result.is_err());
    }

    #[test]
    fn load_key_rejects_missing_file() {
        let result = load_key(Path::new("/nonexistent/key.pem"));
        assert!(result.is_err());
    }
}
