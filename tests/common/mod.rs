//! Shared helpers for the handshake integration tests.

use std::io::Write;
use std::sync::{Arc, Once};

use rustls::pki_types::{CertificateDer, ServerName};
use tempfile::NamedTempFile;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use tls_tap::config::{CurveId, KeyEncoding, PinnedVersion, ServerPolicy};

static INIT_CRYPTO: Once = Once::new();

pub fn init_crypto_provider() {
    INIT_CRYPTO.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .ok();
    });
}

/// Self-signed server identity written out to temp files.
pub struct TestIdentity {
    pub cert_der: CertificateDer<'static>,
    pub cert_file: NamedTempFile,
    pub key_file: NamedTempFile,
    pub key_encoding: KeyEncoding,
}

impl TestIdentity {
    /// PEM certificate + PEM key.
    pub fn pem() -> Self {
        Self::generate(KeyEncoding::Pem)
    }

    /// PEM certificate + DER key (the classic mixed-encoding deployment).
    pub fn der_key() -> Self {
        Self::generate(KeyEncoding::Der)
    }

    fn generate(key_encoding: KeyEncoding) -> Self {
        init_crypto_provider();

        let identity =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();

        let mut cert_file = NamedTempFile::new().unwrap();
        cert_file.write_all(identity.cert.pem().as_bytes()).unwrap();
        cert_file.flush().unwrap();

        let mut key_file = NamedTempFile::new().unwrap();
        match key_encoding {
            KeyEncoding::Pem => key_file
                .write_all(identity.key_pair.serialize_pem().as_bytes())
                .unwrap(),
            KeyEncoding::Der => key_file
                .write_all(&identity.key_pair.serialize_der())
                .unwrap(),
        }
        key_file.flush().unwrap();

        Self {
            cert_der: identity.cert.der().clone(),
            cert_file,
            key_file,
            key_encoding,
        }
    }

    /// Loopback policy on an ephemeral port for this identity.
    pub fn policy(&self, protocol: PinnedVersion, curve: CurveId) -> ServerPolicy {
        ServerPolicy {
            address: "127.0.0.1".to_string(),
            port: 0,
            cert_path: self.cert_file.path().to_path_buf(),
            key_path: self.key_file.path().to_path_buf(),
            key_encoding: self.key_encoding,
            protocol,
            curve,
        }
    }
}

/// Client config trusting `cert` and offering exactly `versions`.
pub fn client_config(
    cert: &CertificateDer<'static>,
    versions: &[&'static rustls::SupportedProtocolVersion],
) -> Arc<rustls::ClientConfig> {
    let mut roots = rustls::RootCertStore::empty();
    roots.add(cert.clone()).unwrap();

    let config = rustls::ClientConfig::builder_with_protocol_versions(versions)
        .with_root_certificates(roots)
        .with_no_client_auth();

    Arc::new(config)
}

/// Run a client handshake against `addr`.
pub async fn connect(
    addr: std::net::SocketAddr,
    config: Arc<rustls::ClientConfig>,
) -> std::io::Result<TlsStream<TcpStream>> {
    let stream = TcpStream::connect(addr).await?;
    let connector = TlsConnector::from(config);
    let server_name = ServerName::try_from("localhost").unwrap();
    connector.connect(server_name, stream).await
}
