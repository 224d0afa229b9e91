// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::models::CanonicalField;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub pipeline: PipelineConfig,
    pub export: ExportConfig,
    /// Extra header aliases merged on top of the built-in table,
    /// keyed by canonical field name.
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Maximum concurrent fetches (W).
    pub max_workers: usize,
    /// Global minimum spacing between requests (T), shared by all workers.
    pub min_spacing_ms: u64,
    /// Retries after the first attempt (R).
    pub max_retries: u32,
    /// Exponential backoff base delay (d).
    pub backoff_base_ms: u64,
    /// Backoff cap (d_max).
    pub backoff_cap_ms: u64,
    /// Per-fetch timeout.
    pub fetch_timeout_secs: u64,
    /// Global pause after a rate-limited response.
    pub cooldown_secs: u64,
    pub user_agent: String,
}

impl ScraperConfig {
    pub fn min_spacing(&self) -> Duration {
        Duration::from_millis(self.min_spacing_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Buffer size of the worker -> orchestrator result channel.
    pub result_channel_capacity: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub pretty: bool,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("COMPANY_ENRICH")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            scraper: ScraperConfig {
                max_workers: 4,
                min_spacing_ms: 750,
                max_retries: 3,
                backoff_base_ms: 500,
                backoff_cap_ms: 8_000,
                fetch_timeout_secs: 20,
                cooldown_secs: 30,
                user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
                    .to_string(),
            },
            pipeline: PipelineConfig {
                result_channel_capacity: 64,
            },
            export: ExportConfig {
                output_dir: PathBuf::from("./exports"),
                pretty: true,
            },
            aliases: BTreeMap::new(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.scraper.max_workers == 0 {
            return Err(PipelineError::Config(
                "scraper.max_workers must be greater than 0".to_string(),
            ));
        }

        if self.scraper.backoff_cap_ms < self.scraper.backoff_base_ms {
            return Err(PipelineError::Config(
                "scraper.backoff_cap_ms must not be below backoff_base_ms".to_string(),
            ));
        }

        if self.scraper.fetch_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "scraper.fetch_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.result_channel_capacity == 0 {
            return Err(PipelineError::Config(
                "pipeline.result_channel_capacity must be greater than 0".to_string(),
            ));
        }

        for name in self.aliases.keys() {
            if CanonicalField::parse(name).is_none() {
                return Err(PipelineError::Config(format!(
                    "aliases: unknown canonical field '{}'",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = Config::default_config();
        config.scraper.max_workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_cap_below_base_rejected() {
        let mut config = Config::default_config();
        config.scraper.backoff_cap_ms = 100;
        config.scraper.backoff_base_ms = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_alias_field_rejected() {
        let mut config = Config::default_config();
        config
            .aliases
            .insert("ticker_symbol".to_string(), vec!["Ticker".to_string()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_known_alias_field_accepted() {
        let mut config = Config::default_config();
        config
            .aliases
            .insert("company_name".to_string(), vec!["Account Name".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duration_helpers() {
        let config = Config::default_config();
        assert_eq!(config.scraper.min_spacing(), Duration::from_millis(750));
        assert_eq!(config.scraper.cooldown(), Duration::from_secs(30));
    }
}
