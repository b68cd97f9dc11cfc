use log::debug;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::alerts::{AlertPolicy, Thresholds};
use crate::history::DEFAULT_CAPACITY;

/// Where the Nightscout credential is placed on the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialMode {
    /// `api-secret` request header
    #[default]
    Header,
    /// `token=` query parameter
    Query,
}

/// What the display shows once a poll cycle has exhausted its retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExhaustedDisplay {
    /// Keep showing the last good reading, if there is one
    #[default]
    ShowCached,
    ShowError,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a whole number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be true or false, got '{value}'")]
    InvalidBool { key: &'static str, value: String },
    #[error("CREDENTIAL_MODE must be 'header' or 'query', got '{0}'")]
    InvalidCredentialMode(String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error(
        "thresholds must satisfy urgent low < low < high < urgent high, got {urgent_low} < {low} < {high} < {urgent_high}"
    )]
    ThresholdOrder {
        urgent_low: i32,
        low: i32,
        high: i32,
        urgent_high: i32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub credential: String,
    pub credential_mode: CredentialMode,
    pub poll_interval: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub request_timeout: Duration,
    pub tls_bypass: bool,
    pub alerts: AlertPolicy,
    pub thresholds: Thresholds,
    pub notifications_enabled: bool,
    pub exhausted_display: ExhaustedDisplay,
    pub history_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: String::new(),
            credential: String::new(),
            credential_mode: CredentialMode::Header,
            poll_interval: Duration::from_secs(60),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            tls_bypass: false,
            alerts: AlertPolicy::default(),
            thresholds: Thresholds::default(),
            notifications_enabled: true,
            exhausted_display: ExhaustedDisplay::ShowCached,
            history_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from the process environment, falling back to `.env`
    /// for variables that are not set
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = dotenv_file();
        Self::from_lookup(layered(process_env, |key| file.get(key).cloned()))
    }

    /// Re-read `.env` and let it take precedence over the process
    /// environment.
    ///
    /// Neither load writes to the environment, so a key removed from `.env`
    /// falls back to the environment or its default.
    pub fn reload() -> Result<Self, ConfigError> {
        let file = dotenv_file();
        Self::from_lookup(layered(|key| file.get(key).cloned(), process_env))
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Unset keys take their defaults. The URL and token may be empty; the
    /// poller reports that as missing credentials rather than refusing to
    /// start.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string());

        let credential_mode = match get("CREDENTIAL_MODE").as_deref() {
            None | Some("") => defaults.credential_mode,
            Some(mode) if mode.eq_ignore_ascii_case("header") => CredentialMode::Header,
            Some(mode) if mode.eq_ignore_ascii_case("query") => CredentialMode::Query,
            Some(other) => return Err(ConfigError::InvalidCredentialMode(other.to_string())),
        };

        let thresholds = Thresholds {
            urgent_high: number(&get, "URGENT_HIGH_THRESHOLD", defaults.thresholds.urgent_high)?,
            high: number(&get, "HIGH_THRESHOLD", defaults.thresholds.high)?,
            low: number(&get, "LOW_THRESHOLD", defaults.thresholds.low)?,
            urgent_low: number(&get, "URGENT_LOW_THRESHOLD", defaults.thresholds.urgent_low)?,
        };
        if !thresholds.is_ordered() {
            return Err(ConfigError::ThresholdOrder {
                urgent_low: thresholds.urgent_low,
                low: thresholds.low,
                high: thresholds.high,
                urgent_high: thresholds.urgent_high,
            });
        }

        let alerts = AlertPolicy {
            enabled: flag(&get, "ENABLE_ALERTS", defaults.alerts.enabled)?,
            urgent_high: flag(&get, "ALERT_URGENT_HIGH", defaults.alerts.urgent_high)?,
            urgent_low: flag(&get, "ALERT_URGENT_LOW", defaults.alerts.urgent_low)?,
            cooldown: seconds(&get, "ALERT_INTERVAL", defaults.alerts.cooldown)?,
        };

        let exhausted_display = if flag(&get, "SHOW_CACHED_ON_ERROR", true)? {
            ExhaustedDisplay::ShowCached
        } else {
            ExhaustedDisplay::ShowError
        };

        let config = Config {
            base_url: get("NIGHTSCOUT_URL").unwrap_or_default(),
            credential: get("NIGHTSCOUT_TOKEN").unwrap_or_default(),
            credential_mode,
            poll_interval: positive_seconds(&get, "UPDATE_INTERVAL", defaults.poll_interval)?,
            max_retries: number(&get, "MAX_RETRIES", defaults.max_retries)?,
            retry_base_delay: positive_seconds(&get, "RETRY_DELAY", defaults.retry_base_delay)?,
            request_timeout: positive_seconds(&get, "REQUEST_TIMEOUT", defaults.request_timeout)?,
            tls_bypass: flag(&get, "SKIP_TLS_VERIFICATION", defaults.tls_bypass)?,
            alerts,
            thresholds,
            notifications_enabled: flag(&get, "ENABLE_NOTIFICATIONS", defaults.notifications_enabled)?,
            exhausted_display,
            history_capacity: number(&get, "HISTORY_CAPACITY", defaults.history_capacity)?,
        };

        if config.history_capacity == 0 {
            return Err(ConfigError::Zero("HISTORY_CAPACITY"));
        }

        Ok(config)
    }

    pub fn has_credentials(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.credential.trim().is_empty()
    }
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn dotenv_file() -> HashMap<String, String> {
    match dotenvy::dotenv_iter() {
        Ok(vars) => vars.flatten().collect(),
        Err(e) => {
            debug!("No .env file loaded: {}", e);
            HashMap::new()
        }
    }
}

/// Look a key up in `first`, then in `second`
fn layered<A, B>(first: A, second: B) -> impl Fn(&str) -> Option<String>
where
    A: Fn(&str) -> Option<String>,
    B: Fn(&str) -> Option<String>,
{
    move |key| first(key).or_else(|| second(key))
}

fn number<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        None => Ok(default),
        Some(value) if value.is_empty() => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}

fn seconds<G>(get: &G, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    number(get, key, default.as_secs()).map(Duration::from_secs)
}

fn positive_seconds<G>(get: &G, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let duration = seconds(get, key, default)?;
    if duration.is_zero() {
        return Err(ConfigError::Zero(key));
    }
    Ok(duration)
}

fn flag<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(value) = get(key) else {
        return Ok(default);
    };
    match value.to_ascii_lowercase().as_str() {
        "" => Ok(default),
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn unset_keys_take_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.has_credentials());
    }

    #[test]
    fn reads_every_setting() {
        let config = load(&[
            ("NIGHTSCOUT_URL", "https://ns.example.com/"),
            ("NIGHTSCOUT_TOKEN", " reader-abc "),
            ("CREDENTIAL_MODE", "Query"),
            ("UPDATE_INTERVAL", "120"),
            ("MAX_RETRIES", "5"),
            ("RETRY_DELAY", "20"),
            ("REQUEST_TIMEOUT", "8"),
            ("SKIP_TLS_VERIFICATION", "yes"),
            ("ENABLE_ALERTS", "true"),
            ("ALERT_URGENT_LOW", "false"),
            ("ALERT_INTERVAL", "600"),
            ("URGENT_HIGH_THRESHOLD", "260"),
            ("HIGH_THRESHOLD", "170"),
            ("LOW_THRESHOLD", "75"),
            ("URGENT_LOW_THRESHOLD", "54"),
            ("ENABLE_NOTIFICATIONS", "0"),
            ("SHOW_CACHED_ON_ERROR", "off"),
            ("HISTORY_CAPACITY", "12"),
        ])
        .unwrap();

        assert_eq!(config.base_url, "https://ns.example.com/");
        assert_eq!(config.credential, "reader-abc");
        assert_eq!(config.credential_mode, CredentialMode::Query);
        assert_eq!(config.poll_interval, Duration::from_secs(120));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_base_delay, Duration::from_secs(20));
        assert_eq!(config.request_timeout, Duration::from_secs(8));
        assert!(config.tls_bypass);
        assert!(config.alerts.enabled);
        assert!(config.alerts.urgent_high);
        assert!(!config.alerts.urgent_low);
        assert_eq!(config.alerts.cooldown, Duration::from_secs(600));
        assert_eq!(config.thresholds.urgent_high, 260);
        assert_eq!(config.thresholds.urgent_low, 54);
        assert!(!config.notifications_enabled);
        assert_eq!(config.exhausted_display, ExhaustedDisplay::ShowError);
        assert_eq!(config.history_capacity, 12);
        assert!(config.has_credentials());
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            load(&[("UPDATE_INTERVAL", "soon")]),
            Err(ConfigError::InvalidNumber {
                key: "UPDATE_INTERVAL",
                value: "soon".to_string()
            })
        );
        assert_eq!(
            load(&[("UPDATE_INTERVAL", "0")]),
            Err(ConfigError::Zero("UPDATE_INTERVAL"))
        );
        assert_eq!(
            load(&[("ENABLE_ALERTS", "maybe")]),
            Err(ConfigError::InvalidBool {
                key: "ENABLE_ALERTS",
                value: "maybe".to_string()
            })
        );
        assert_eq!(
            load(&[("CREDENTIAL_MODE", "bearer")]),
            Err(ConfigError::InvalidCredentialMode("bearer".to_string()))
        );
        assert!(matches!(
            load(&[("LOW_THRESHOLD", "190")]),
            Err(ConfigError::ThresholdOrder { .. })
        ));
    }

    #[test]
    fn first_layer_wins_and_missing_keys_fall_through() {
        let file: HashMap<&str, &str> =
            [("UPDATE_INTERVAL", "30"), ("NIGHTSCOUT_TOKEN", "from-file")].into();
        let environment: HashMap<&str, &str> =
            [("UPDATE_INTERVAL", "90"), ("NIGHTSCOUT_URL", "https://ns.example.com")].into();
        let from = |vars: &HashMap<&str, &str>, key: &str| vars.get(key).map(|v| v.to_string());

        let reloaded =
            Config::from_lookup(layered(|k| from(&file, k), |k| from(&environment, k))).unwrap();
        assert_eq!(reloaded.poll_interval, Duration::from_secs(30));
        assert_eq!(reloaded.credential, "from-file");
        assert_eq!(reloaded.base_url, "https://ns.example.com");

        let started =
            Config::from_lookup(layered(|k| from(&environment, k), |k| from(&file, k))).unwrap();
        assert_eq!(started.poll_interval, Duration::from_secs(90));

        // Dropping a key from the file falls back to the environment
        let emptied = HashMap::new();
        let reloaded =
            Config::from_lookup(layered(|k| from(&emptied, k), |k| from(&environment, k))).unwrap();
        assert_eq!(reloaded.poll_interval, Duration::from_secs(90));
        assert_eq!(reloaded.credential, "");
    }

    #[test]
    fn zero_retries_is_allowed() {
        assert_eq!(load(&[("MAX_RETRIES", "0")]).unwrap().max_retries, 0);
    }
}
