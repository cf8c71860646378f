//! Configuration schema definitions.
//!
//! Defines the server policy deserialized from the config file. All fields
//! have defaults so a minimal (or absent) config file is enough to run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Immutable server policy, created once at startup.
///
/// Shared read-only by every connection; nothing mutates it after load.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerPolicy {
    /// Bind address (e.g. "127.0.0.1").
    pub address: String,

    /// Bind port.
    pub port: u16,

    /// Path to the server certificate chain (PEM).
    pub cert_path: PathBuf,

    /// Path to the server private key.
    pub key_path: PathBuf,

    /// On-disk encoding of the private key. The certificate is always PEM;
    /// the key may use a different encoding.
    pub key_encoding: KeyEncoding,

    /// The single TLS protocol version the server will negotiate.
    pub protocol: PinnedVersion,

    /// Named elliptic curve for the ephemeral key exchange.
    pub curve: CurveId,
}

impl Default for ServerPolicy {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 4433,
            cert_path: PathBuf::from("certs/server_cert.pem"),
            key_path: PathBuf::from("certs/server_key.der"),
            key_encoding: KeyEncoding::Der,
            protocol: PinnedVersion::Tls12,
            curve: CurveId::Secp256r1,
        }
    }
}

impl ServerPolicy {
    /// The bind address in "host:port" form.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Private key file encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEncoding {
    /// PEM-armored key (PKCS#1, PKCS#8 or SEC1).
    Pem,
    /// Raw DER-encoded key.
    Der,
}

/// Exactly one protocol version is negotiable; all others are disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum PinnedVersion {
    #[serde(rename = "1.2")]
    Tls12,
    #[serde(rename = "1.3")]
    Tls13,
}

impl std::fmt::Display for PinnedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PinnedVersion::Tls12 => write!(f, "TLSv1.2"),
            PinnedVersion::Tls13 => write!(f, "TLSv1.3"),
        }
    }
}

/// Named curve for the per-connection ephemeral key exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveId {
    Secp256r1,
    Secp384r1,
    X25519,
}

impl std::fmt::Display for CurveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurveId::Secp256r1 => write!(f, "secp256r1"),
            CurveId::Secp384r1 => write!(f, "secp384r1"),
            CurveId::X25519 => write!(f, "x25519"),
        }
    }
}
