//! TLS handshake tap server.
//!
//! A minimal single-process TLS server that instruments the handshake
//! path: it accepts one client at a time, performs a version-pinned TLS
//! handshake with an ephemeral elliptic-curve key exchange, and mirrors
//! every raw byte the TLS engine reads from the transport into a
//! diagnostics sink before the record layer sees it.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │               TLS HANDSHAKE TAP               │
//!                     │                                               │
//!   Client            │  ┌──────────┐   ┌───────────┐   ┌──────────┐ │
//!   ──────────────────┼─▶│   net    │──▶│    net    │──▶│   net    │ │
//!                     │  │ listener │   │  capture  │   │   tls    │ │
//!                     │  └──────────┘   └─────┬─────┘   └────┬─────┘ │
//!                     │                       │              │       │
//!                     │                       ▼              ▼       │
//!                     │                 ┌───────────┐  ┌──────────┐  │
//!                     │                 │   diag    │  │  net/kx  │  │
//!                     │                 │   sink    │  │ ephemeral│  │
//!                     │                 └───────────┘  └──────────┘  │
//!                     │                                               │
//!                     │  server.rs: accept loop, sequential, forever  │
//!                     │  config/:   immutable ServerPolicy (TOML)     │
//!                     └──────────────────────────────────────────────┘
//! ```
//!
//! No application data is exchanged: a connection is closed as soon as its
//! handshake reaches a terminal state, and the loop accepts the next one.

pub mod config;
pub mod diag;
pub mod net;
pub mod server;

pub use config::ServerPolicy;
pub use diag::{DiagnosticsSink, MemorySink, TracingSink};
pub use server::{Server, ServerError};
