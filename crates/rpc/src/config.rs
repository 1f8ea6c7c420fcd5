//! Server configuration, read from flags or environment variables

use clap::Args;
use dbank_bus::RelayConfig;
use dbank_ledger::RetryPolicy;
use std::time::Duration;

#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0", global = true)]
    pub host: String,

    /// HTTP port
    #[arg(long, env = "HTTP_PORT", default_value_t = 8080, global = true)]
    pub http_port: u16,

    /// SQLite database URL
    #[arg(long, env = "DB_URL", default_value = "sqlite:dbank.db?mode=rwc", global = true)]
    pub db_url: String,

    /// SQLite URL of the ledger store; the relational database when unset
    #[arg(long, env = "LEDGER_DB_URL", global = true)]
    pub ledger_db_url: Option<String>,

    /// Deliveries before a failing event is dead-lettered
    #[arg(long, env = "RELAY_MAX_DELIVERIES", default_value_t = 5, global = true)]
    pub relay_max_deliveries: u32,

    /// Attempts per ledger write
    #[arg(long, env = "LEDGER_MAX_ATTEMPTS", default_value_t = 3, global = true)]
    pub ledger_max_attempts: u32,

    /// First ledger retry delay in milliseconds
    #[arg(long, env = "LEDGER_BACKOFF_MS", default_value_t = 100, global = true)]
    pub ledger_backoff_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            http_port: 8080,
            db_url: "sqlite:dbank.db?mode=rwc".to_string(),
            ledger_db_url: None,
            relay_max_deliveries: 5,
            ledger_max_attempts: 3,
            ledger_backoff_ms: 100,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.ledger_max_attempts,
            base_delay: Duration::from_millis(self.ledger_backoff_ms),
            ..RetryPolicy::default()
        }
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            max_deliveries: self.relay_max_deliveries,
            ..RelayConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ServerConfig,
    }

    #[test]
    fn test_flag_defaults_match_default() {
        let parsed = TestCli::parse_from(["dbank"]).config;
        let default = ServerConfig::default();
        assert_eq!(parsed.http_port, default.http_port);
        assert_eq!(parsed.db_url, default.db_url);
        assert!(parsed.ledger_db_url.is_none());
        assert_eq!(parsed.ledger_max_attempts, 3);
        assert_eq!(parsed.relay_max_deliveries, 5);
    }

    #[test]
    fn test_flags_override() {
        let config = TestCli::parse_from([
            "dbank",
            "--http-port",
            "9090",
            "--ledger-backoff-ms",
            "10",
            "--ledger-db-url",
            "sqlite:ledger.db",
        ])
            .config;
        assert!(config.bind_addr().ends_with(":9090"));
        assert_eq!(config.retry_policy().base_delay, Duration::from_millis(10));
        assert_eq!(config.relay_config().max_deliveries, 5);
        assert_eq!(config.ledger_db_url.as_deref(), Some("sqlite:ledger.db"));
    }
}
