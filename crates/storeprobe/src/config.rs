//! Run configuration.
//!
//! Sources are layered: built-in defaults, then an optional YAML file, then
//! environment variables. The CLI applies its flags last.
//!
//! ```yaml
//! base_url: https://magento.softwaretestingboard.com/
//! action_timeout_ms: 30000
//! navigation_timeout_ms: 30000
//! retries: 1
//! headless: true
//! ```

use crate::result::{ProbeError, ProbeResult};
use crate::wait::{
    DEFAULT_ACTION_TIMEOUT_MS, DEFAULT_NAVIGATION_TIMEOUT_MS, DEFAULT_POLL_INTERVAL_MS,
    NETWORK_IDLE_THRESHOLD_MS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default storefront under test
pub const DEFAULT_BASE_URL: &str = "https://magento.softwaretestingboard.com/";

/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "STOREPROBE_BASE_URL";
/// Environment variable overriding headless mode
pub const ENV_HEADLESS: &str = "STOREPROBE_HEADLESS";
/// Environment variable overriding the retry count
pub const ENV_RETRIES: &str = "STOREPROBE_RETRIES";
/// Environment variable overriding the action timeout
pub const ENV_ACTION_TIMEOUT: &str = "STOREPROBE_ACTION_TIMEOUT_MS";
/// Environment variable overriding the navigation timeout
pub const ENV_NAVIGATION_TIMEOUT: &str = "STOREPROBE_NAVIGATION_TIMEOUT_MS";
/// Environment variable pointing at a Chromium binary
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";

/// Configuration for a storefront run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Storefront root; relative navigation is joined onto it
    pub base_url: String,
    /// Budget for a single action or element wait
    pub action_timeout_ms: u64,
    /// Budget for navigation and URL waits
    pub navigation_timeout_ms: u64,
    /// Budget for outcome checks: banners, confirmation messages, listings
    pub expect_timeout_ms: u64,
    /// Budget for one journey attempt
    pub test_timeout_ms: u64,
    /// Interval between state polls
    pub poll_interval_ms: u64,
    /// Quiet window for network idle
    pub network_quiet_ms: u64,
    /// Extra attempts for a failed journey
    pub retries: u32,
    /// Journeys run concurrently
    pub workers: usize,
    /// Run the browser without a window
    pub headless: bool,
    /// Where `Page::screenshot` writes PNGs
    pub screenshot_dir: PathBuf,
    /// Capture a screenshot when a journey attempt fails
    pub screenshot_on_failure: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Chromium executable override
    pub chromium_path: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            expect_timeout_ms: 10_000,
            test_timeout_ms: 60_000,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            network_quiet_ms: NETWORK_IDLE_THRESHOLD_MS,
            retries: 1,
            workers: 1,
            headless: true,
            screenshot_dir: PathBuf::from("screenshots"),
            screenshot_on_failure: true,
            viewport_width: 1920,
            viewport_height: 1080,
            chromium_path: None,
        }
    }
}

impl ProbeConfig {
    /// Create config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, then `path` (when given), then the process environment
    pub fn load(path: Option<&Path>) -> ProbeResult<Self> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        base.with_env(|key| std::env::var(key).ok())?.validated()
    }

    /// Read a YAML config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> ProbeResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Parse YAML text
    pub fn from_yaml(raw: &str) -> ProbeResult<Self> {
        Ok(serde_yaml_ng::from_str(raw)?)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// A set `CI` variable forces headless mode and two retries; explicit
    /// `STOREPROBE_*` values still win over it.
    pub fn with_env<F>(mut self, lookup: F) -> ProbeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup("CI").is_some_and(|v| !v.is_empty()) {
            self.headless = true;
            self.retries = 2;
        }
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_HEADLESS) {
            self.headless = parse_bool(ENV_HEADLESS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_RETRIES) {
            self.retries = parse_number(ENV_RETRIES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ACTION_TIMEOUT) {
            self.action_timeout_ms = parse_number(ENV_ACTION_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_NAVIGATION_TIMEOUT) {
            self.navigation_timeout_ms = parse_number(ENV_NAVIGATION_TIMEOUT, &raw)?;
        }
        if let Some(path) = lookup(ENV_CHROMIUM_PATH) {
            self.chromium_path = Some(path);
        }
        Ok(self)
    }

    /// Reject values that would make every run fail
    pub fn validated(self) -> ProbeResult<Self> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProbeError::config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.action_timeout_ms == 0 || self.navigation_timeout_ms == 0 {
            return Err(ProbeError::config("timeouts must be greater than zero"));
        }
        if self.workers == 0 {
            return Err(ProbeError::config("workers must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ProbeError::config("poll_interval_ms must be greater than zero"));
        }
        Ok(self)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the action timeout in milliseconds
    #[must_use]
    pub const fn with_action_timeout(mut self, ms: u64) -> Self {
        self.action_timeout_ms = ms;
        self
    }

    /// Set the navigation timeout in milliseconds
    #[must_use]
    pub const fn with_navigation_timeout(mut self, ms: u64) -> Self {
        self.navigation_timeout_ms = ms;
        self
    }

    /// Set the outcome-check timeout in milliseconds
    #[must_use]
    pub const fn with_expect_timeout(mut self, ms: u64) -> Self {
        self.expect_timeout_ms = ms;
        self
    }

    /// Set the per-attempt journey timeout in milliseconds
    #[must_use]
    pub const fn with_test_timeout(mut self, ms: u64) -> Self {
        self.test_timeout_ms = ms;
        self
    }

    /// Set the polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the network quiet window in milliseconds
    #[must_use]
    pub const fn with_network_quiet(mut self, ms: u64) -> Self {
        self.network_quiet_ms = ms;
        self
    }

    /// Set the retry count
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set the worker count
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the screenshot directory
    #[must_use]
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    /// Toggle failure screenshots
    #[must_use]
    pub const fn with_screenshot_on_failure(mut self, enabled: bool) -> Self {
        self.screenshot_on_failure = enabled;
        self
    }

    /// Action timeout as Duration
    #[must_use]
    pub const fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// Navigation timeout as Duration
    #[must_use]
    pub const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Expectation timeout as Duration
    #[must_use]
    pub const fn expect_timeout(&self) -> Duration {
        Duration::from_millis(self.expect_timeout_ms)
    }

    /// Journey attempt timeout as Duration
    #[must_use]
    pub const fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout_ms)
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Network quiet window as Duration
    #[must_use]
    pub const fn network_quiet(&self) -> Duration {
        Duration::from_millis(self.network_quiet_ms)
    }
}

fn parse_bool(key: &str, raw: &str) -> ProbeResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ProbeError::config(format!("{key}: expected a boolean, got {other:?}"))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> ProbeResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| ProbeError::config(format!("{key}: expected a number, got {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    mod defaults_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = ProbeConfig::default();
            assert_eq!(config.base_url, DEFAULT_BASE_URL);
            assert_eq!(config.action_timeout(), Duration::from_secs(30));
            assert_eq!(config.navigation_timeout(), Duration::from_secs(30));
            assert_eq!(config.expect_timeout(), Duration::from_secs(10));
            assert_eq!(config.test_timeout(), Duration::from_secs(60));
            assert_eq!(config.network_quiet(), Duration::from_millis(500));
            assert_eq!(config.retries, 1);
            assert_eq!(config.workers, 1);
            assert!(config.headless);
            assert_eq!(config.screenshot_dir, PathBuf::from("screenshots"));
        }

        #[test]
        fn test_builder() {
            let config = ProbeConfig::new()
                .with_base_url("http://localhost:8080/")
                .with_action_timeout(500)
                .with_retries(0)
                .with_workers(4)
                .with_headless(false);
            assert_eq!(config.base_url, "http://localhost:8080/");
            assert_eq!(config.action_timeout_ms, 500);
            assert_eq!(config.retries, 0);
            assert_eq!(config.workers, 4);
            assert!(!config.headless);
        }
    }

    mod file_tests {
        use super::*;

        #[test]
        fn test_partial_yaml_keeps_defaults() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "base_url: http://shop.local/\nretries: 3").unwrap();
            let config = ProbeConfig::from_file(file.path()).unwrap();
            assert_eq!(config.base_url, "http://shop.local/");
            assert_eq!(config.retries, 3);
            assert_eq!(config.action_timeout_ms, DEFAULT_ACTION_TIMEOUT_MS);
        }

        #[test]
        fn test_yaml_round_trip() {
            let config = ProbeConfig::default().with_workers(3);
            let yaml = config.to_yaml().unwrap();
            assert_eq!(ProbeConfig::from_yaml(&yaml).unwrap(), config);
        }

        #[test]
        fn test_missing_file_is_io_error() {
            let dir = tempfile::tempdir().unwrap();
            let err = ProbeConfig::from_file(&dir.path().join("absent.yaml")).unwrap_err();
            assert!(matches!(err, ProbeError::Io(_)));
        }

        #[test]
        fn test_malformed_yaml() {
            let err = ProbeConfig::from_yaml("retries: [not a number").unwrap_err();
            assert!(matches!(err, ProbeError::Yaml(_)));
        }
    }

    mod env_tests {
        use super::*;

        #[test]
        fn test_overrides() {
            let config = ProbeConfig::default()
                .with_env(env(&[
                    (ENV_BASE_URL, "http://staging.shop/"),
                    (ENV_HEADLESS, "false"),
                    (ENV_RETRIES, "4"),
                    (ENV_ACTION_TIMEOUT, "1500"),
                    (ENV_NAVIGATION_TIMEOUT, "2500"),
                    (ENV_CHROMIUM_PATH, "/usr/bin/chromium"),
                ]))
                .unwrap();
            assert_eq!(config.base_url, "http://staging.shop/");
            assert!(!config.headless);
            assert_eq!(config.retries, 4);
            assert_eq!(config.action_timeout_ms, 1500);
            assert_eq!(config.navigation_timeout_ms, 2500);
            assert_eq!(config.chromium_path.as_deref(), Some("/usr/bin/chromium"));
        }

        #[test]
        fn test_ci_forces_headless_and_retries() {
            let config = ProbeConfig::default()
                .with_headless(false)
                .with_env(env(&[("CI", "true")]))
                .unwrap();
            assert!(config.headless);
            assert_eq!(config.retries, 2);

            let explicit = ProbeConfig::default()
                .with_env(env(&[("CI", "1"), (ENV_RETRIES, "0")]))
                .unwrap();
            assert_eq!(explicit.retries, 0);
        }

        #[test]
        fn test_bad_values() {
            let err = ProbeConfig::default()
                .with_env(env(&[(ENV_RETRIES, "many")]))
                .unwrap_err();
            assert!(err.to_string().contains(ENV_RETRIES));
            assert!(ProbeConfig::default()
                .with_env(env(&[(ENV_HEADLESS, "maybe")]))
                .is_err());
        }
    }

    mod validation_tests {
        use super::*;

        #[test]
        fn test_validation() {
            assert!(ProbeConfig::default().validated().is_ok());
            assert!(ProbeConfig::default()
                .with_base_url("shop.local")
                .validated()
                .is_err());
            assert!(ProbeConfig::default()
                .with_action_timeout(0)
                .validated()
                .is_err());
            assert!(ProbeConfig::default().with_workers(0).validated().is_err());
        }
    }
}
