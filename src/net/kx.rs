//! Ephemeral key-exchange configuration.
//!
//! Resolves the policy's named curve onto the crypto provider and generates
//! the per-connection ephemeral key pair. The TLS context restricts the
//! provider's key-exchange groups to this single curve, so the handshake can
//! only ever negotiate fresh keys on it; the explicit generation step here
//! runs before the handshake so curve or allocation failures surface as a
//! key-exchange error rather than a generic handshake error.

use rustls::crypto::{ring, ActiveKeyExchange, SupportedKxGroup};
use thiserror::Error;

use crate::config::CurveId;

/// Errors from ephemeral key-exchange setup.
#[derive(Debug, Error)]
pub enum KxError {
    /// The named curve is not available in the crypto provider.
    #[error("curve {0} is not supported by the crypto provider")]
    UnsupportedCurve(CurveId),

    /// Key pair generation failed at runtime.
    #[error("ephemeral key generation on {curve} failed: {source}")]
    GenerationFailed {
        curve: CurveId,
        source: rustls::Error,
    },
}

/// Resolve a named curve to the provider's key-exchange group.
pub fn resolve(curve: CurveId) -> Result<&'static dyn SupportedKxGroup, KxError> {
    let group = match curve {
        CurveId::Secp256r1 => ring::kx_group::SECP256R1,
        CurveId::Secp384r1 => ring::kx_group::SECP384R1,
        CurveId::X25519 => ring::kx_group::X25519,
    };

    // Guard against provider builds that drop a group.
    if !ring::default_provider()
        .kx_groups
        .iter()
        .any(|g| g.name() == group.name())
    {
        return Err(KxError::UnsupportedCurve(curve));
    }

    Ok(group)
}

/// Generate a fresh ephemeral key pair on `group` for one connection.
///
/// The returned pair is dropped by the caller once the session is under
/// way; the handshake derives its own share from the same (sole) group.
pub fn generate(
    group: &'static dyn SupportedKxGroup,
    curve: CurveId,
) -> Result<Box<dyn ActiveKeyExchange>, KxError> {
    let keypair = group
        .start()
        .map_err(|source| KxError::GenerationFailed { curve, source })?;

    tracing::debug!(
        %curve,
        pub_key_len = keypair.pub_key().len(),
        "ephemeral key pair generated"
    );

    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_every_named_curve() {
        for curve in [CurveId::Secp256r1, CurveId::Secp384r1, CurveId::X25519] {
            assert!(resolve(curve).is_ok(), "curve {curve} should resolve");
        }
    }

    #[test]
    fn generates_distinct_key_pairs_per_call() {
        let group = resolve(CurveId::X25519).unwrap();
        let a = generate(group, CurveId::X25519).unwrap();
        let b = generate(group, CurveId::X25519).unwrap();
        // Fresh key material each time, never a cached pair.
        assert_ne!(a.pub_key(), b.pub_key());
    }

    #[test]
    fn secp256r1_public_key_is_uncompressed_point() {
        let group = resolve(CurveId::Secp256r1).unwrap();
        let keypair = generate(group, CurveId::Secp256r1).unwrap();
        // SEC1 uncompressed point: 0x04 || x || y.
        assert_eq!(keypair.pub_key().len(), 65);
        assert_eq!(keypair.pub_key()[0], 0x04);
    }
}
