//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → semantic checks (address shape, non-empty paths)
//!     → ServerPolicy (validated, immutable)
//!     → passed by reference to every component constructor
//! ```
//!
//! # Design Decisions
//! - Policy is immutable once loaded; no process-wide mutable state
//! - All fields have defaults mirroring the classic test-server setup
//!   (loopback:4433, TLS 1.2 pinned, secp256r1, PEM cert + DER key)
//! - Certificate/key *content* errors belong to the TLS context factory,
//!   not the loader

pub mod loader;
pub mod schema;

pub use loader::{load_policy, ConfigError};
pub use schema::{CurveId, KeyEncoding, PinnedVersion, ServerPolicy};
