//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept)
//!     → capture.rs (wrap the socket; mirror every raw read to the sink)
//!     → kx.rs (per-connection ephemeral key pair on the policy curve)
//!     → tls.rs (pinned-version rustls context drives the handshake)
//!     → connection.rs (lifecycle state machine, teardown)
//!
//! Connection States:
//!     Accepted → Bound → Configured → Established | Failed
//! ```
//!
//! # Design Decisions
//! - One connection in flight at a time; the capture stream of a connection
//!   never interleaves with another's
//! - Only the read path is intercepted; writes pass through untouched
//! - Exactly one protocol version and one key-exchange group are negotiable

pub mod capture;
pub mod connection;
pub mod kx;
pub mod listener;
pub mod tls;
