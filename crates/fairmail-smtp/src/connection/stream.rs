//! Socket setup: plain TCP, implicit TLS and the STARTTLS upgrade.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};
use tracing::debug;

/// Connects to an SMTP server over plain TCP.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(hostname: &str, port: u16) -> Result<TcpStream> {
    debug!("Connecting to {hostname}:{port}");
    let stream = TcpStream::connect((hostname, port)).await?;
    Ok(stream)
}

/// Connects to an SMTP server over TLS (implicit TLS, usually port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<TlsStream<TcpStream>> {
    let tcp_stream = connect(hostname, port).await?;
    upgrade_to_tls(tcp_stream, hostname).await
}

/// Runs the TLS handshake over an already connected socket.
///
/// Used both for implicit TLS and after a successful `STARTTLS`.
///
/// # Errors
///
/// Returns an error if the hostname is not a valid server name or the
/// handshake fails.
pub async fn upgrade_to_tls(
    tcp_stream: TcpStream,
    hostname: &str,
) -> Result<TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::InvalidHostname(hostname.to_string()))?;

    let tls_stream = tls_connector().connect(server_name, tcp_stream).await?;
    debug!("TLS established with {hostname}");
    Ok(tls_stream)
}

/// Creates a TLS connector trusting the webpki root set.
fn tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
