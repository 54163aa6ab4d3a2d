use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tracing::debug;

use crate::core::currency::Currency;
use crate::core::provider::{ProviderProfile, ProviderTable};
use crate::providers::fixed::FixedRate;
use crate::providers::{frankfurter, open_er_api};

/// Configuration shipped with the binary, also written by `setup`.
pub const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// The dated table under `rates.fixed`.
    #[default]
    Fixed,
    /// ExchangeRate-API open access, daily rates including KES.
    OpenErApi,
    /// ECB reference rates. Needs a server that carries KES.
    Frankfurter,
}

impl RateSource {
    pub fn is_live(&self) -> bool {
        !matches!(self, RateSource::Fixed)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RatesConfig {
    pub source: RateSource,
    /// Overrides the live source's default endpoint.
    pub base_url: Option<String>,
    pub ttl_hours: u64,
    /// Live rates published longer ago are refused.
    pub max_age_days: i64,
    /// Same limit for `fixed` rates. Unset means fixed rates never expire.
    pub fixed_max_age_days: Option<i64>,
    pub retries: usize,
    pub retry_delay_ms: u64,
    /// Keep fetched live rates on disk between runs.
    pub persist: bool,
    pub fixed: Vec<FixedRate>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        RatesConfig {
            source: RateSource::Fixed,
            base_url: None,
            ttl_hours: 6,
            max_age_days: 4,
            fixed_max_age_days: None,
            retries: 2,
            retry_delay_ms: 500,
            persist: true,
            fixed: Vec::new(),
        }
    }
}

impl RatesConfig {
    pub fn base_url(&self) -> &str {
        match (&self.base_url, self.source) {
            (Some(url), _) => url,
            (None, RateSource::Frankfurter) => frankfurter::DEFAULT_BASE_URL,
            (None, _) => open_er_api::DEFAULT_BASE_URL,
        }
    }

    /// Age limit applied to the configured source.
    pub fn age_limit_days(&self) -> Option<i64> {
        if self.source.is_live() {
            Some(self.max_age_days)
        } else {
            self.fixed_max_age_days
        }
    }
}

fn default_source_currency() -> Currency {
    Currency::USD
}

fn default_destination_currency() -> Currency {
    Currency::KES
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_source_currency")]
    pub default_currency: Currency,
    #[serde(default = "default_destination_currency")]
    pub destination_currency: Currency,
    #[serde(default)]
    pub rates: RatesConfig,
    pub providers: Vec<ProviderProfile>,
    pub data_path: Option<String>,
}

impl AppConfig {
    /// Loads `path` if given, else the default location, else the built-in configuration.
    pub fn load_or_builtin(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }
        let default_path = Self::default_config_path()?;
        if default_path.exists() {
            Self::load_from_path(&default_path)
        } else {
            debug!(
                "No config at {}, using built-in configuration",
                default_path.display()
            );
            Self::builtin()
        }
    }

    pub fn builtin() -> Result<Self> {
        Self::from_yaml(EXAMPLE_CONFIG).context("Built-in configuration is invalid")
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "remitlens", "remitlens")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "remitlens", "remitlens")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config = Self::from_yaml(&config_str)
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Parses and validates. A configuration that fails validation is never returned.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.provider_table()?;
        if self.default_currency == self.destination_currency {
            bail!(
                "default_currency and destination_currency are both {}",
                self.destination_currency
            );
        }
        if self.rates.max_age_days < 0 || self.rates.fixed_max_age_days.is_some_and(|d| d < 0) {
            bail!("rates.max_age_days and rates.fixed_max_age_days must not be negative");
        }
        if let Some(rate) = self.rates.fixed.iter().find(|r| r.rate <= Decimal::ZERO) {
            bail!("Fixed rate {} -> {} must be positive", rate.from, rate.to);
        }
        if self.rates.source == RateSource::Fixed && self.rates.fixed.is_empty() {
            bail!("rates.source is fixed but no fixed rates are configured");
        }
        Ok(())
    }

    pub fn provider_table(&self) -> Result<ProviderTable> {
        ProviderTable::new(self.providers.clone()).context("Invalid provider table")
    }
}
