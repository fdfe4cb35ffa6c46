use crate::error::{LeadsError, Result};
use rand::Rng;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const API_KEY_ENV: &str = "SCRAPEOPS_API_KEY";

/// Inclusive range a randomized pause is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn millis(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    #[cfg(test)]
    pub const fn none() -> Self {
        Self::millis(0, 0)
    }

    pub fn sample(&self) -> Duration {
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        if lo == hi {
            return Duration::from_millis(lo);
        }
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }
}

/// Wait budgets, attempt caps and pacing delays. All tuned against the
/// current site markup; none of them are load-bearing for correctness.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub load_attempts: u32,
    pub load_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    pub step_timeout_ms: u64,
    pub extract_timeout_ms: u64,
    pub next_page_timeout_ms: u64,
    pub staleness_timeout_ms: u64,
    pub owner_check_timeout_ms: u64,
    pub retry_backoff: DelayRange,
    pub control_settle: DelayRange,
    pub input_settle: DelayRange,
    pub apply_settle: DelayRange,
    pub before_extract: DelayRange,
    pub page_turn: DelayRange,
    pub between_listings: DelayRange,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            load_attempts: 3,
            load_timeout_ms: 60_000,
            navigation_timeout_ms: 180_000,
            step_timeout_ms: 15_000,
            extract_timeout_ms: 30_000,
            next_page_timeout_ms: 15_000,
            staleness_timeout_ms: 30_000,
            owner_check_timeout_ms: 15_000,
            retry_backoff: DelayRange::millis(5_000, 10_000),
            control_settle: DelayRange::millis(1_500, 2_500),
            input_settle: DelayRange::millis(500, 1_000),
            apply_settle: DelayRange::millis(4_000, 6_000),
            before_extract: DelayRange::millis(2_000, 2_000),
            page_turn: DelayRange::millis(3_000, 5_000),
            between_listings: DelayRange::millis(2_000, 5_000),
        }
    }
}

impl Timings {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_millis(self.extract_timeout_ms)
    }

    pub fn next_page_timeout(&self) -> Duration {
        Duration::from_millis(self.next_page_timeout_ms)
    }

    pub fn staleness_timeout(&self) -> Duration {
        Duration::from_millis(self.staleness_timeout_ms)
    }

    pub fn owner_check_timeout(&self) -> Duration {
        Duration::from_millis(self.owner_check_timeout_ms)
    }

    /// Same attempt caps, no pauses
    #[cfg(test)]
    pub fn instant() -> Self {
        Self {
            retry_backoff: DelayRange::none(),
            control_settle: DelayRange::none(),
            input_settle: DelayRange::none(),
            apply_settle: DelayRange::none(),
            before_extract: DelayRange::none(),
            page_turn: DelayRange::none(),
            between_listings: DelayRange::none(),
            ..Self::default()
        }
    }
}

/// Fetch proxy request parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub endpoint: String,
    pub country: String,
    pub residential: bool,
    pub render_js: bool,
    pub timeout_ms: u64,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            endpoint: "https://proxy.scrapeops.io/v1/".to_string(),
            country: "us".to_string(),
            residential: true,
            render_js: true,
            timeout_ms: 180_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    pub window_size: (u32, u32),
    pub user_agent: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// Everything a run needs, loaded once at startup and passed down
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub diagnostics_dir: PathBuf,
    pub proxy: ProxySettings,
    pub browser: BrowserSettings,
    pub timings: Timings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://www.zillow.com".to_string(),
            diagnostics_dir: PathBuf::from("debug"),
            proxy: ProxySettings::default(),
            browser: BrowserSettings::default(),
            timings: Timings::default(),
        }
    }
}

impl Config {
    /// Read the config file (defaults when absent) and apply the environment override
    pub fn load(path: &Path) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::from_file(path)?;
        config.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                let config = serde_json::from_str(&raw).map_err(|source| LeadsError::Config {
                    path: path.to_path_buf(),
                    source,
                })?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("{} not found, using default settings", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn apply_api_key_override(&mut self, from_env: Option<String>) {
        if let Some(key) = from_env.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if self.api_key.as_deref().map_or(false, |k| k.trim().is_empty()) {
            self.api_key = None;
        }
    }

    /// Key to route page fetches through the proxy. A run that wants the
    /// proxy cannot start without one.
    pub fn require_api_key(&self, config_path: &Path) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| LeadsError::MissingApiKey(config_path.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_file(&dir.path().join("config.json")).unwrap();

        assert_eq!(config.api_key, None);
        assert_eq!(config.timings.load_attempts, 3);
        assert_eq!(config.timings.step_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "api_key": "abc123", "timings": {{ "load_attempts": 5 }} }}"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.timings.load_attempts, 5);
        assert_eq!(config.timings.load_timeout_ms, 60_000);
        assert_eq!(config.proxy.country, "us");
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, LeadsError::Config { .. }));
    }

    #[test]
    fn environment_key_wins_and_blank_keys_count_as_missing() {
        let mut config = Config {
            api_key: Some("from-file".to_string()),
            ..Config::default()
        };
        config.apply_api_key_override(Some("from-env".to_string()));
        assert_eq!(config.api_key.as_deref(), Some("from-env"));

        let mut blank = Config {
            api_key: Some("   ".to_string()),
            ..Config::default()
        };
        blank.apply_api_key_override(Some(String::new()));
        assert!(blank.require_api_key(Path::new("config.json")).is_err());
    }

    #[test]
    fn delay_range_stays_within_bounds() {
        let range = DelayRange::millis(10, 20);
        for _ in 0..50 {
            let d = range.sample();
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
        }
        assert!(DelayRange::millis(30, 5).sample() >= Duration::from_millis(5));
        assert_eq!(DelayRange::none().sample(), Duration::ZERO);
    }
}
