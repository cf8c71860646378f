//! TCP listener implementation.
//!
//! # Responsibilities
//! - Bind to the policy's address/port
//! - Accept incoming TCP connections, one at a time
//!
//! Connections are handled strictly sequentially by the server loop, so no
//! backpressure machinery is needed here; the listener is a thin wrapper
//! around the bound socket.

use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerPolicy;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// Failed to bind to address.
    Bind(std::io::Error),
    /// Failed to accept connection.
    Accept(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
            ListenerError::Accept(e) => write!(f, "Failed to accept: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Bound listening endpoint, alive for the process lifetime.
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind to the policy's address.
    pub async fn bind(policy: &ServerPolicy) -> Result<Self, ListenerError> {
        let addr: SocketAddr = policy
            .bind_address()
            .parse()
            .map_err(|e| ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;

        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner: listener })
    }

    /// Accept the next connection, blocking until a client connects.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(peer_addr = %addr, "Connection accepted");

        Ok((stream, addr))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}
