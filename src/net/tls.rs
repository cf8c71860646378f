//! TLS context factory.
//!
//! Builds the process-wide, immutable server-side TLS configuration from
//! the server policy: exactly one negotiable protocol version, the loaded
//! certificate chain and private key, and a crypto provider whose
//! key-exchange groups are restricted to the policy's named curve.
//!
//! The certificate is PEM; the private key may be PEM or raw DER (the two
//! files are allowed to use different encodings). Any failure drops every
//! partially built piece before the error is returned.

use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::crypto::{ring, CryptoProvider, SupportedKxGroup};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use thiserror::Error;
use tokio_rustls::TlsAcceptor;
use tracing::debug;

use crate::config::{CurveId, KeyEncoding, PinnedVersion, ServerPolicy};
use crate::net::kx::{self, KxError};

/// Errors from TLS context construction.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to load certificate {path}: {message}")]
    CertificateLoad { path: String, message: String },

    #[error("no certificates found in {0}")]
    NoCertificates(String),

    #[error("failed to load private key {path}: {message}")]
    PrivateKeyLoad { path: String, message: String },

    #[error("no private key found in {0}")]
    NoPrivateKey(String),

    #[error(transparent)]
    KeyExchange(#[from] KxError),

    #[error("TLS configuration rejected: {0}")]
    Config(rustls::Error),
}

/// Immutable server-side TLS configuration, shared by every connection.
#[derive(Clone)]
pub struct TlsContext {
    config: Arc<ServerConfig>,
    kx_group: &'static dyn SupportedKxGroup,
    protocol: PinnedVersion,
    curve: CurveId,
}

impl TlsContext {
    /// Build the context from the server policy.
    pub fn new(policy: &ServerPolicy) -> Result<Self, ContextError> {
        ensure_crypto_provider();

        let kx_group = kx::resolve(policy.curve)?;

        let certs = load_certificates(&policy.cert_path)?;
        debug!(count = certs.len(), path = %policy.cert_path.display(), "loaded server certificate");

        let key = load_private_key(&policy.key_path, policy.key_encoding)?;
        debug!(path = %policy.key_path.display(), "loaded server private key");

        // Single kx group: the handshake can only negotiate the policy curve.
        let provider = CryptoProvider {
            kx_groups: vec![kx_group],
            ..ring::default_provider()
        };

        let config = ServerConfig::builder_with_provider(Arc::new(provider))
            .with_protocol_versions(&[pinned_version(policy.protocol)])
            .map_err(ContextError::Config)?
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(ContextError::Config)?;

        debug!(protocol = %policy.protocol, curve = %policy.curve, "TLS context created");

        Ok(Self {
            config: Arc::new(config),
            kx_group,
            protocol: policy.protocol,
            curve: policy.curve,
        })
    }

    /// Acceptor driving one handshake; cheap to create per connection.
    pub fn acceptor(&self) -> TlsAcceptor {
        TlsAcceptor::from(Arc::clone(&self.config))
    }

    /// The sole key-exchange group the context will negotiate.
    pub fn kx_group(&self) -> &'static dyn SupportedKxGroup {
        self.kx_group
    }

    /// The sole protocol version the context will negotiate.
    pub fn protocol(&self) -> PinnedVersion {
        self.protocol
    }

    /// The named curve behind the key-exchange group.
    pub fn curve(&self) -> CurveId {
        self.curve
    }
}

impl std::fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsContext")
            .field("protocol", &self.protocol)
            .field("kx_group", &self.kx_group.name())
            .finish()
    }
}

/// Map the pinned policy version onto the rustls version table.
fn pinned_version(version: PinnedVersion) -> &'static rustls::SupportedProtocolVersion {
    match version {
        PinnedVersion::Tls12 => &rustls::version::TLS12,
        PinnedVersion::Tls13 => &rustls::version::TLS13,
    }
}

/// Install the ring crypto provider if not already installed.
fn ensure_crypto_provider() {
    let _ = CryptoProvider::install_default(ring::default_provider());
}

/// Load the certificate chain from a PEM file.
fn load_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, ContextError> {
    let file = std::fs::File::open(path).map_err(|e| ContextError::CertificateLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut reader = BufReader::new(file);
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .collect::<Result<_, _>>()
        .map_err(|e| ContextError::CertificateLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    if certs.is_empty() {
        return Err(ContextError::NoCertificates(path.display().to_string()));
    }

    Ok(certs)
}

/// Load the private key, honoring the policy's on-disk encoding.
fn load_private_key(
    path: &Path,
    encoding: KeyEncoding,
) -> Result<PrivateKeyDer<'static>, ContextError> {
    match encoding {
        KeyEncoding::Pem => load_pem_private_key(path),
        KeyEncoding::Der => load_der_private_key(path),
    }
}

/// Read the first private key (PKCS#1, PKCS#8 or SEC1) from a PEM file.
fn load_pem_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, ContextError> {
    let file = std::fs::File::open(path).map_err(|e| ContextError::PrivateKeyLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut reader = BufReader::new(file);
    loop {
        match rustls_pemfile::read_one(&mut reader) {
            Ok(Some(rustls_pemfile::Item::Pkcs1Key(key))) => {
                return Ok(PrivateKeyDer::Pkcs1(key));
            }
            Ok(Some(rustls_pemfile::Item::Pkcs8Key(key))) => {
                return Ok(PrivateKeyDer::Pkcs8(key));
            }
            Ok(Some(rustls_pemfile::Item::Sec1Key(key))) => {
                return Ok(PrivateKeyDer::Sec1(key));
            }
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                return Err(ContextError::PrivateKeyLoad {
                    path: path.display().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    Err(ContextError::NoPrivateKey(path.display().to_string()))
}

/// Read a raw DER-encoded private key.
fn load_der_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, ContextError> {
    let bytes = std::fs::read(path).map_err(|e| ContextError::PrivateKeyLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    PrivateKeyDer::try_from(bytes).map_err(|e| ContextError::PrivateKeyLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn test_policy(cert: &Path, key: &Path, encoding: KeyEncoding) -> ServerPolicy {
        ServerPolicy {
            cert_path: cert.to_path_buf(),
            key_path: key.to_path_buf(),
            key_encoding: encoding,
            ..ServerPolicy::default()
        }
    }

    fn write_temp(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    fn self_signed() -> rcgen::CertifiedKey {
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap()
    }

    #[test]
    fn builds_context_from_pem_cert_and_pem_key() {
        let identity = self_signed();
        let cert = write_temp(identity.cert.pem().as_bytes());
        let key = write_temp(identity.key_pair.serialize_pem().as_bytes());

        let policy = test_policy(cert.path(), key.path(), KeyEncoding::Pem);
        let ctx = TlsContext::new(&policy);
        assert!(ctx.is_ok(), "expected Ok, got: {:?}", ctx.err());
    }

    #[test]
    fn builds_context_with_der_key_and_pem_cert() {
        let identity = self_signed();
        let cert = write_temp(identity.cert.pem().as_bytes());
        let key = write_temp(&identity.key_pair.serialize_der());

        let policy = test_policy(cert.path(), key.path(), KeyEncoding::Der);
        let ctx = TlsContext::new(&policy);
        assert!(ctx.is_ok(), "expected Ok, got: {:?}", ctx.err());
    }

    #[test]
    fn missing_cert_file_fails_cert_load() {
        let identity = self_signed();
        let key = write_temp(identity.key_pair.serialize_pem().as_bytes());

        let policy = test_policy(
            &PathBuf::from("/nonexistent/cert.pem"),
            key.path(),
            KeyEncoding::Pem,
        );
        let err = TlsContext::new(&policy).unwrap_err();
        assert!(matches!(err, ContextError::CertificateLoad { .. }));
    }

    #[test]
    fn pem_file_without_certs_fails() {
        let identity = self_signed();
        // A key where the cert should be: parses as PEM, yields no certs.
        let cert = write_temp(identity.key_pair.serialize_pem().as_bytes());
        let key = write_temp(identity.key_pair.serialize_pem().as_bytes());

        let policy = test_policy(cert.path(), key.path(), KeyEncoding::Pem);
        let err = TlsContext::new(&policy).unwrap_err();
        assert!(matches!(err, ContextError::NoCertificates(_)));
    }

    #[test]
    fn missing_key_file_fails_key_load() {
        let identity = self_signed();
        let cert = write_temp(identity.cert.pem().as_bytes());

        let policy = test_policy(
            cert.path(),
            &PathBuf::from("/nonexistent/key.der"),
            KeyEncoding::Der,
        );
        let err = TlsContext::new(&policy).unwrap_err();
        assert!(matches!(err, ContextError::PrivateKeyLoad { .. }));
    }

    #[test]
    fn pem_file_without_key_fails() {
        let identity = self_signed();
        let cert = write_temp(identity.cert.pem().as_bytes());
        // A cert where the key should be.
        let key = write_temp(identity.cert.pem().as_bytes());

        let policy = test_policy(cert.path(), key.path(), KeyEncoding::Pem);
        let err = TlsContext::new(&policy).unwrap_err();
        assert!(matches!(err, ContextError::NoPrivateKey(_)));
    }

    #[test]
    fn context_reports_pinned_protocol_and_curve() {
        let identity = self_signed();
        let cert = write_temp(identity.cert.pem().as_bytes());
        let key = write_temp(identity.key_pair.serialize_pem().as_bytes());

        let mut policy = test_policy(cert.path(), key.path(), KeyEncoding::Pem);
        policy.protocol = PinnedVersion::Tls13;
        policy.curve = CurveId::X25519;

        let ctx = TlsContext::new(&policy).unwrap();
        assert_eq!(ctx.protocol(), PinnedVersion::Tls13);
        assert_eq!(ctx.kx_group().name(), rustls::NamedGroup::X25519);
    }
}
