//! Configuration management for the MCP server.
//!
//! Configuration is read once at startup from the environment (a `.env`
//! file is honored). Unset variables fall back to defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::session::ConnectionContext;
use super::transport::TransportConfig;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Downstream Fluree settings.
    pub fluree: FlureeConfig,

    /// Environment variables that were set but could not be used.
    #[serde(skip)]
    pub rejected: Vec<String>,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Fluree connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlureeConfig {
    /// Process-wide connection defaults, the lowest-precedence source when
    /// resolving a session's context.
    pub defaults: ConnectionContext,

    /// Timeout applied to every downstream request.
    pub request_timeout_secs: u64,
}

impl FlureeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for FlureeConfig {
    fn default() -> Self {
        Self {
            defaults: ConnectionContext::default(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "fluree-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
            fluree: FlureeConfig::default(),
            rejected: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Server settings use the `MCP_` prefix (`MCP_SERVER_NAME`,
    /// `MCP_LOG_LEVEL`, ...). Fluree defaults come from `FLUREE_DB_URL`,
    /// `FLUREE_NETWORK` and `FLUREE_LEDGER`.
    ///
    /// Nothing is logged here; call [`Config::report`] once logging is up.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_env();

        config.fluree.defaults = ConnectionContext::new(
            std::env::var("FLUREE_DB_URL").ok(),
            std::env::var("FLUREE_NETWORK").ok(),
            std::env::var("FLUREE_LEDGER").ok(),
        );
        if let Ok(raw) = std::env::var("MCP_FLUREE_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => config.fluree.request_timeout_secs = secs,
                Err(_) => config
                    .rejected
                    .push(format!("MCP_FLUREE_TIMEOUT_SECS={raw}")),
            }
        }

        config
    }

    /// Log what loading found: rejected variables and gaps in the defaults.
    pub fn report(&self) {
        for entry in &self.rejected {
            warn!("Ignoring invalid setting {}", entry);
        }

        let missing = self.fluree.defaults.missing_fields();
        if missing.is_empty() {
            info!("Default Fluree target configured");
        } else {
            warn!(
                ?missing,
                "No default for some connection fields; clients must supply them"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    const FLUREE_VARS: [&str; 4] = [
        "FLUREE_DB_URL",
        "FLUREE_NETWORK",
        "FLUREE_LEDGER",
        "MCP_FLUREE_TIMEOUT_SECS",
    ];

    fn clear_fluree_env() {
        for var in FLUREE_VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_fluree_defaults_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_fluree_env();
        unsafe {
            std::env::set_var("FLUREE_DB_URL", "http://localhost:8090");
            std::env::set_var("FLUREE_NETWORK", "acme");
            std::env::set_var("FLUREE_LEDGER", "main");
            std::env::set_var("MCP_FLUREE_TIMEOUT_SECS", "5");
        }
        let config = Config::from_env();
        assert_eq!(
            config.fluree.defaults,
            ConnectionContext::new(
                Some("http://localhost:8090"),
                Some("acme"),
                Some("main")
            )
        );
        assert_eq!(config.fluree.request_timeout(), Duration::from_secs(5));
        clear_fluree_env();
    }

    #[test]
    fn test_empty_fluree_vars_count_as_unset() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_fluree_env();
        unsafe {
            std::env::set_var("FLUREE_NETWORK", "");
        }
        let config = Config::from_env();
        assert!(config.fluree.defaults.namespace.is_none());
        clear_fluree_env();
    }

    #[test]
    fn test_invalid_timeout_keeps_default() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_fluree_env();
        unsafe {
            std::env::set_var("MCP_FLUREE_TIMEOUT_SECS", "soon");
        }
        let config = Config::from_env();
        assert_eq!(config.fluree.request_timeout_secs, 30);
        assert_eq!(config.rejected, vec!["MCP_FLUREE_TIMEOUT_SECS=soon".to_string()]);
        clear_fluree_env();
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.name, "fluree-mcp-server");
        assert!(config.fluree.defaults.is_empty());
        assert!(config.rejected.is_empty());
    }
}
