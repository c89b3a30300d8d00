use std::env;
use std::time::Duration;

use crate::cli::Cli;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://medicine.db";
pub const DEFAULT_REGIONAL_PROVIDER_URL: &str = "https://api.titck.gov.tr/ilac";
pub const DEFAULT_OPENFDA_URL: &str = "https://api.fda.gov/drug/ndc.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub api_port: u16,
    pub providers: ProviderConfig,
    pub lookup_cache_ttl_seconds: u64,
    /// `0` disables the periodic sweep; sweeps can still be triggered over HTTP.
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub regional_url: String,
    pub regional_country: String,
    pub openfda_url: String,
    pub openfda_api_key: Option<String>,
    pub timeout_seconds: u64,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_or("DATABASE_URL", DEFAULT_DATABASE_URL);

        let api_port = parse_env("API_PORT", 3000u16)?;

        let providers = ProviderConfig {
            regional_url: env_or("REGIONAL_PROVIDER_URL", DEFAULT_REGIONAL_PROVIDER_URL),
            regional_country: env_or("REGIONAL_COUNTRY", "TR"),
            openfda_url: env_or("OPENFDA_URL", DEFAULT_OPENFDA_URL),
            openfda_api_key: env::var("OPENFDA_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout_seconds: parse_env("PROVIDER_TIMEOUT_SECONDS", 10u64)?,
        };

        if providers.timeout_seconds == 0 {
            return Err("PROVIDER_TIMEOUT_SECONDS must be greater than zero".into());
        }

        let lookup_cache_ttl_seconds = parse_env("LOOKUP_CACHE_TTL_SECONDS", 24 * 60 * 60u64)?;
        let sweep_interval_seconds = parse_env("SWEEP_INTERVAL_SECONDS", 3600u64)?;

        Ok(Self {
            database_url,
            api_port,
            providers,
            lookup_cache_ttl_seconds,
            sweep_interval_seconds,
        })
    }

    /// Command-line flags take precedence over the environment.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(url) = &cli.database_url {
            self.database_url = url.clone();
        }
        if let Some(port) = cli.port {
            self.api_port = port;
        }
        if let Some(interval) = cli.sweep_interval {
            self.sweep_interval_seconds = interval;
        }
        self
    }

    pub fn lookup_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.lookup_cache_ttl_seconds)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", key)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_to_default_when_unset() {
        let value = parse_env("MEDICINE_TRACKER_TEST_UNSET_VAR", 42u64).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn parse_env_rejects_non_numeric_values() {
        env::set_var("MEDICINE_TRACKER_TEST_BAD_NUMBER", "ten");
        let err = parse_env("MEDICINE_TRACKER_TEST_BAD_NUMBER", 10u64).unwrap_err();
        assert_eq!(err, "MEDICINE_TRACKER_TEST_BAD_NUMBER must be a valid number");
        env::remove_var("MEDICINE_TRACKER_TEST_BAD_NUMBER");
    }

    #[test]
    fn cli_flags_override_environment_values() {
        let config = Config {
            database_url: DEFAULT_DATABASE_URL.into(),
            api_port: 3000,
            providers: ProviderConfig {
                regional_url: DEFAULT_REGIONAL_PROVIDER_URL.into(),
                regional_country: "TR".into(),
                openfda_url: DEFAULT_OPENFDA_URL.into(),
                openfda_api_key: None,
                timeout_seconds: 10,
            },
            lookup_cache_ttl_seconds: 86_400,
            sweep_interval_seconds: 3600,
        };
        let cli = Cli {
            database_url: Some("sqlite::memory:".into()),
            port: Some(8080),
            sweep_interval: Some(0),
            sweep_once: false,
        };

        let config = config.apply_cli(&cli);

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.sweep_interval_seconds, 0);
        assert_eq!(config.providers.timeout(), Duration::from_secs(10));
    }
}
