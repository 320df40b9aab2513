//! # Server Configuration
//!
//! Environment-driven configuration. Every knob has a default suited to a
//! single-store deployment:
//!
//! | Variable                   | Default      | Meaning                        |
//! |----------------------------|--------------|--------------------------------|
//! | `BENTA_DB_PATH`            | `benta.db`   | SQLite database file           |
//! | `BENTA_PORT`               | `3000`       | HTTP listen port               |
//! | `BENTA_EXPIRY_HORIZON_DAYS`| `7`          | Near-expiration alert window   |

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub expiry_horizon_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            db_path: PathBuf::from("benta.db"),
            port: 3000,
            expiry_horizon_days: 7,
        }
    }
}

impl ServerConfig {
    /// Builds the configuration from the environment, falling back to
    /// defaults for unset variables. Set-but-unparseable values are errors,
    /// not silent fallbacks.
    pub fn from_env() -> Result<Self> {
        let mut config = ServerConfig::default();

        if let Ok(path) = env::var("BENTA_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Ok(port) = env::var("BENTA_PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("BENTA_PORT is not a valid port: '{port}'"))?;
        }

        if let Ok(days) = env::var("BENTA_EXPIRY_HORIZON_DAYS") {
            config.expiry_horizon_days = days.parse().with_context(|| {
                format!("BENTA_EXPIRY_HORIZON_DAYS is not a number: '{days}'")
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_suit_a_single_store() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.expiry_horizon_days, 7);
        assert_eq!(config.db_path, PathBuf::from("benta.db"));
    }
}
