//! CLI configuration loaded from environment variables.

use anyhow::{Context, Result};
use satchel_wallet::{HttpSourceConfig, SelectorConfig};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Esplora-compatible UTXO index.
    pub esplora_url: String,
    /// Counterparty node API for attached balances.
    pub counterparty_url: String,
    pub http_timeout_secs: u64,
    pub max_utxos: usize,
    pub min_utxos: usize,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// library defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let http = HttpSourceConfig::default();
        let selector = SelectorConfig::default();

        let esplora_url = get("SATCHEL_ESPLORA_URL").unwrap_or(http.esplora_url);
        let counterparty_url = get("SATCHEL_COUNTERPARTY_URL").unwrap_or(http.counterparty_url);

        let http_timeout_secs = match get("SATCHEL_HTTP_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .context("SATCHEL_HTTP_TIMEOUT_SECS must be a positive integer")?,
            None => http.timeout_secs,
        };

        let max_utxos = match get("SATCHEL_MAX_UTXOS") {
            Some(v) => v
                .parse()
                .context("SATCHEL_MAX_UTXOS must be a non-negative integer")?,
            None => selector.max_utxos,
        };

        let min_utxos = match get("SATCHEL_MIN_UTXOS") {
            Some(v) => v
                .parse()
                .context("SATCHEL_MIN_UTXOS must be a non-negative integer")?,
            None => selector.min_utxos,
        };

        let config = Self {
            esplora_url,
            counterparty_url,
            http_timeout_secs,
            max_utxos,
            min_utxos,
        };
        config
            .selector(false)
            .validate()
            .context("SATCHEL_MAX_UTXOS and SATCHEL_MIN_UTXOS are inconsistent")?;
        Ok(config)
    }

    pub fn http_source(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            esplora_url: self.esplora_url.clone(),
            counterparty_url: self.counterparty_url.clone(),
            timeout_secs: self.http_timeout_secs,
            ..HttpSourceConfig::default()
        }
    }

    pub fn selector(&self, allow_unconfirmed: bool) -> SelectorConfig {
        SelectorConfig {
            min_utxos: self.min_utxos,
            max_utxos: self.max_utxos,
            allow_unconfirmed,
        }
    }
}
