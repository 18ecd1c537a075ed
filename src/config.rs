//! Configuration management

use anyhow::{self, Context, Result};

use crate::defaults::{DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Rows per INSERT statement when replacing the tariff table
    pub batch_size: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set")?;

        let batch_size = parse_batch_size(std::env::var("TARIFF_BATCH_SIZE").ok().as_deref())?;

        Ok(Self {
            nats_url,
            database_url,
            batch_size,
        })
    }
}

/// Parse `TARIFF_BATCH_SIZE`, defaulting when unset
fn parse_batch_size(raw: Option<&str>) -> Result<usize> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_BATCH_SIZE);
    };

    let size: usize = raw
        .parse()
        .with_context(|| format!("TARIFF_BATCH_SIZE must be a positive integer, got '{raw}'"))?;

    if size == 0 || size > MAX_BATCH_SIZE {
        anyhow::bail!("TARIFF_BATCH_SIZE must be between 1 and {MAX_BATCH_SIZE} (got {size})");
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_defaults_when_unset() {
        assert_eq!(parse_batch_size(None).unwrap(), DEFAULT_BATCH_SIZE);
        assert_eq!(parse_batch_size(Some("  ")).unwrap(), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_batch_size_parses() {
        assert_eq!(parse_batch_size(Some("250")).unwrap(), 250);
    }

    #[test]
    fn test_batch_size_rejects_out_of_range() {
        assert!(parse_batch_size(Some("0")).is_err());
        assert!(parse_batch_size(Some("5000")).is_err());
        assert!(parse_batch_size(Some("lots")).is_err());
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_nats_url_defaults_to_localhost() {
        std::env::remove_var("NATS_URL");
        std::env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env().unwrap();
        assert_eq!(config.nats_url, "nats://localhost:4222");
    }
}
