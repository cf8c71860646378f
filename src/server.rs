//! Server lifecycle and accept loop.
//!
//! # Responsibilities
//! - Build the TLS context once (fatal on failure)
//! - Bind the listening endpoint (fatal on failure)
//! - Accept clients forever, handling one connection at a time
//!
//! A failed handshake never terminates the server; per-connection errors
//! are logged and the loop moves on to the next accept. The loop has no
//! normal exit.

use std::sync::Arc;

use thiserror::Error;

use crate::config::ServerPolicy;
use crate::diag::DiagnosticsSink;
use crate::net::connection::{self, ConnectionError};
use crate::net::listener::{Listener, ListenerError};
use crate::net::tls::{ContextError, TlsContext};

/// Fatal startup errors; nothing is served once one occurs.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Listen(#[from] ListenerError),
}

/// The handshake tap server: one TLS context, one listening endpoint,
/// sequential connections.
pub struct Server {
    context: TlsContext,
    listener: Listener,
    sink: Arc<dyn DiagnosticsSink>,
}

impl Server {
    /// Build the TLS context and bind the listener.
    ///
    /// Context construction runs first: a bad certificate or key aborts
    /// startup before any socket is created.
    pub async fn bind(
        policy: &ServerPolicy,
        sink: Arc<dyn DiagnosticsSink>,
    ) -> Result<Self, ServerError> {
        let context = TlsContext::new(policy)?;
        let listener = Listener::bind(policy).await?;

        Ok(Self {
            context,
            listener,
            sink,
        })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Accept and handle connections forever.
    ///
    /// Each connection runs to a terminal state before the next accept is
    /// attempted. Accept and per-connection failures are logged and the
    /// loop continues; there is no normal return.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            };

            match connection::handle_connection(
                &self.context,
                stream,
                peer,
                Arc::clone(&self.sink),
            )
            .await
            {
                Ok(summary) => {
                    tracing::info!(
                        id = %summary.id,
                        peer = %summary.peer,
                        protocol = %summary.protocol,
                        cipher_suite = %summary.cipher_suite,
                        "TLS connection succeeded"
                    );
                }
                Err(ConnectionError::KeyExchange(e)) => {
                    tracing::error!(%peer, error = %e, "key exchange setup failed");
                }
                Err(ConnectionError::Handshake(e)) => {
                    tracing::error!(%peer, error = %e, "TLS handshake failed");
                }
            }
        }
    }

    /// Bind and run in one step; used by the binary entry point.
    pub async fn start(
        policy: &ServerPolicy,
        sink: Arc<dyn DiagnosticsSink>,
    ) -> Result<(), ServerError> {
        let server = Self::bind(policy, sink).await?;
        server.run().await
    }
}
