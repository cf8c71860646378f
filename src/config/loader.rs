//! Configuration loading from disk.

use std::fs;
use std::net::IpAddr;
use std::path::Path;

use crate::config::schema::ServerPolicy;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(msg) => write!(f, "Validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate a server policy from a TOML file.
pub fn load_policy(path: &Path) -> Result<ServerPolicy, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let policy: ServerPolicy = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_policy(&policy)?;

    Ok(policy)
}

/// Semantic checks beyond what serde enforces.
///
/// Load-time failures of the certificate and key files belong to the TLS
/// context factory; only the shape of the policy is checked here.
fn validate_policy(policy: &ServerPolicy) -> Result<(), ConfigError> {
    if policy.address.parse::<IpAddr>().is_err() {
        return Err(ConfigError::Validation(format!(
            "address {:?} is not a valid IP address",
            policy.address
        )));
    }
    if policy.cert_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("cert_path is empty".to_string()));
    }
    if policy.key_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("key_path is empty".to_string()));
    }
    Ok(())
}
