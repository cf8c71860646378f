//! Connection orchestration and lifecycle tracking.
//!
//! # Responsibilities
//! - Drive one accepted connection through the handshake state machine:
//!   Accepted → Bound → Configured → Established | Failed
//! - Generate unique connection IDs so sequential connections are
//!   distinguishable in logs and capture labels
//!
//! The state machine is linear with no retries; every terminal state drops
//! the TLS session, the transport adapter and the underlying socket.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::diag::DiagnosticsSink;
use crate::net::capture::TapStream;
use crate::net::kx::{self, KxError};
use crate::net::tls::TlsContext;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is sufficient since we only need uniqueness.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Per-connection failure, contained by the accept loop.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    KeyExchange(#[from] KxError),

    #[error("handshake failed: {0}")]
    Handshake(#[source] std::io::Error),
}

/// Outcome of a completed handshake, for logging.
#[derive(Debug)]
pub struct HandshakeSummary {
    pub id: ConnectionId,
    pub peer: SocketAddr,
    pub protocol: String,
    pub cipher_suite: String,
}

/// Handle one accepted connection through to a terminal state.
///
/// Wraps the socket in the intercepting adapter, configures the ephemeral
/// key exchange and drives the server-side handshake. Returns only from
/// the Established state; every failure drops all per-connection resources
/// before the error is surfaced to the caller.
pub async fn handle_connection(
    ctx: &TlsContext,
    stream: TcpStream,
    peer: SocketAddr,
    sink: Arc<dyn DiagnosticsSink>,
) -> Result<HandshakeSummary, ConnectionError> {
    let id = ConnectionId::new();
    let label = format!("{id}/rx");

    // Accepted → Bound: every read the TLS engine performs from here on is
    // mirrored to the sink.
    let tapped = TapStream::new(stream, sink, label);
    tracing::trace!(%id, %peer, "transport bound");

    // Bound → Configured: fresh ephemeral key pair on the policy curve,
    // dropped as soon as it is generated. The context's provider carries
    // only this group, so the handshake negotiates fresh keys on it.
    kx::generate(ctx.kx_group(), ctx.curve())?;
    tracing::trace!(%id, curve = %ctx.curve(), "key exchange configured");

    // Configured → Established | Failed(Handshake).
    let mut session = ctx
        .acceptor()
        .accept(tapped)
        .await
        .map_err(ConnectionError::Handshake)?;

    let summary = {
        let (_, conn) = session.get_ref();
        HandshakeSummary {
            id,
            peer,
            protocol: conn
                .protocol_version()
                .map(|v| format!("{v:?}"))
                .unwrap_or_else(|| "unknown".to_string()),
            cipher_suite: conn
                .negotiated_cipher_suite()
                .map(|s| format!("{:?}", s.suite()))
                .unwrap_or_else(|| "unknown".to_string()),
        }
    };

    tracing::debug!(
        %id,
        protocol = %summary.protocol,
        cipher_suite = %summary.cipher_suite,
        "handshake established"
    );

    // No application data is exchanged; send close_notify and drop the
    // session and socket. Close failures are not connection failures.
    let _ = session.shutdown().await;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn connection_id_display_is_stable() {
        let id = ConnectionId::new();
        assert_eq!(format!("{id}"), format!("conn-{}", id.as_u64()));
    }
}
