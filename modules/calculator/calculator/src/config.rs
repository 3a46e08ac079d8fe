//! Configuration for the calculation service binary.

use std::net::SocketAddr;

use calc_bootstrap::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Default listen address of the calculation service.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:50052";

/// Typed configuration resolved from defaults, YAML and `CALCULATOR__*`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculatorConfig {
    pub listen_addr: String,
    pub logging: LoggingConfig,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_owned(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("listen_addr '{addr}' is not a socket address: {source}")]
    ListenAddr {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

impl CalculatorConfig {
    /// Check values that deserialize fine but cannot be used.
    ///
    /// # Errors
    /// Returns [`ValidationError`] describing the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listen_addr
            .parse::<SocketAddr>()
            .map_err(|source| ValidationError::ListenAddr {
                addr: self.listen_addr.clone(),
                source,
            })?;
        Ok(())
    }
}
