//! `cached-client` — a reference client for the cache protocol.
//!
//! Connects over TLS, sends the credential handshake, then pipes stdin
//! lines to the server and server lines to stdout concurrently, the same
//! shape as the reference telnet test client.

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};
use tokio_rustls::TlsConnector;

use cached::auth::hash_password;
use cached::config::ClientConfig as CacheClientConfig;

#[derive(Debug, Parser)]
#[command(name = "cached-client", about = "Reference client for the cache protocol")]
struct Args {
    user: String,
    password: String,
    host: Option<String>,
    port: Option<u16>,

    /// Send credentials as a non-machine (human) client and print
    /// human-formatted responses instead of raw structured records.
    #[arg(long)]
    interactive: bool,

    /// Skip TLS server certificate verification. Matches the reference
    /// test client's posture; never enable this against an untrusted host.
    #[arg(long)]
    insecure: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tokio_rustls::rustls::crypto::ring::default_provider().install_default();
    let args = Args::parse();
    let defaults = CacheClientConfig::default();
    let host = args.host.unwrap_or(defaults.host);
    let port = args.port.unwrap_or(defaults.port);

    let tcp = TcpStream::connect((host.as_str(), port)).await?;
    let connector = build_connector(args.insecure);
    let server_name = ServerName::try_from(host.clone())?;
    let stream = connector.connect(server_name, tcp).await?;
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut server_lines = BufReader::new(read_half).lines();

    let credentials = serde_json::json!({
        "Name": args.user,
        "Pass": hash_password(&args.password),
        "IsMachine": !args.interactive,
    });
    write_half
        .write_all(format!("{credentials}\n").as_bytes())
        .await?;

    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = server_lines.next_line() => {
                match line? {
                    Some(line) => println!("{line}"),
                    None => return Ok(()),
                }
            }
            line = stdin_lines.next_line() => {
                match line? {
                    Some(line) => {
                        write_half.write_all(format!("{line}\n").as_bytes()).await?;
                    }
                    None => return Ok(()),
                }
            }
        }
    }
}

fn build_connector(insecure: bool) -> TlsConnector {
    let config = if insecure {
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCert))
            .with_no_client_auth()
    } else {
        let mut roots = tokio_rustls::rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth()
    };
    TlsConnector::from(Arc::new(config))
}

/// Accepts any server certificate. Only reachable via `--insecure`, which
/// exists to exercise this protocol against self-signed test deployments.
#[derive(Debug)]
struct AcceptAnyCert;

impl tokio_rustls::rustls::client::danger::ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &tokio_rustls::rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[tokio_rustls::rustls::pki_types::CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: tokio_rustls::rustls::pki_types::UnixTime,
    ) -> Result<
        tokio_rustls::rustls::client::danger::ServerCertVerified,
        tokio_rustls::rustls::Error,
    > {
        Ok(tokio_rustls::rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &tokio_rustls::rustls::pki_types::CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<
        tokio_rustls::rustls::client::danger::HandshakeSignatureValid,
        tokio_rustls::rustls::Error,
    > {
        Ok(tokio_rustls::rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &tokio_rustls::rustls::pki_types::CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<
        tokio_rustls::rustls::client::danger::HandshakeSignatureValid,
        tokio_rustls::rustls::Error,
    > {
        Ok(tokio_rustls::rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
        ]
    }
}
