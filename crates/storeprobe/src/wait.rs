//! Wait Mechanisms
//!
//! Playwright-compatible wait states plus the async polling loop every wait in
//! the interaction layer is built on. Waiting suspends the calling task with
//! `tokio::time::sleep`; it never blocks the thread.

use crate::driver::ElementSnapshot;
use crate::result::{ProbeError, ProbeResult};
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Default timeout for actions and element waits (30 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 30_000;

/// Default timeout for navigation waits (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Network idle threshold (500ms without requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

/// Target state for element waits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElementState {
    /// Present and rendered
    #[default]
    Visible,
    /// Absent or not rendered
    Hidden,
    /// Present in the document
    Attached,
    /// Absent from the document
    Detached,
}

impl ElementState {
    /// Whether a snapshot satisfies this state
    #[must_use]
    pub const fn is_satisfied_by(&self, snapshot: &ElementSnapshot) -> bool {
        match self {
            Self::Visible => snapshot.found && snapshot.visible,
            Self::Hidden => !snapshot.found || !snapshot.visible,
            Self::Attached => snapshot.found,
            Self::Detached => !snapshot.found,
        }
    }

    /// Get the state name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Attached => "attached",
            Self::Detached => "detached",
        }
    }
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options for a single wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Case-insensitive URL matcher.
///
/// The keyword is regex source, so `"checkout"` matches any URL containing it
/// and `"product_list_order=price$"` can anchor.
#[derive(Debug, Clone)]
pub struct UrlPattern(Regex);

impl UrlPattern {
    /// Compile `keyword`, failing with `Config` on invalid regex source
    pub fn keyword(keyword: &str) -> ProbeResult<Self> {
        RegexBuilder::new(keyword)
            .case_insensitive(true)
            .build()
            .map(Self)
            .map_err(|e| ProbeError::config(format!("invalid URL pattern {keyword:?}: {e}")))
    }

    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        self.0.is_match(url)
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "url ~ /{}/i", self.0.as_str())
    }
}

/// Poll `probe` until it yields `Some`, or fail with `Timeout` once `options`
/// runs out.
///
/// The probe runs at least once even with a zero timeout. A document swapped
/// out mid-query reads as "not yet"; every other error aborts the wait.
pub async fn poll_until<T, F, Fut>(what: &str, options: WaitOptions, mut probe: F) -> ProbeResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<Option<T>>>,
{
    let deadline = Instant::now() + options.timeout();
    loop {
        match probe().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(err) if err.is_transient() => {
                tracing::debug!(what, error = %err, "document changed while polling, retrying");
            }
            Err(other) => return Err(other),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ProbeError::timeout(what, options.timeout_ms));
        }
        let pause = options.poll_interval().min(deadline - now);
        tokio::time::sleep(pause).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mod state_tests {
        use super::*;

        fn snap(found: bool, visible: bool) -> ElementSnapshot {
            ElementSnapshot {
                found,
                visible,
                ..ElementSnapshot::default()
            }
        }

        #[test]
        fn test_element_states() {
            assert!(ElementState::Visible.is_satisfied_by(&snap(true, true)));
            assert!(!ElementState::Visible.is_satisfied_by(&snap(true, false)));
            assert!(ElementState::Hidden.is_satisfied_by(&snap(false, false)));
            assert!(ElementState::Hidden.is_satisfied_by(&snap(true, false)));
            assert!(ElementState::Attached.is_satisfied_by(&snap(true, false)));
            assert!(ElementState::Detached.is_satisfied_by(&snap(false, false)));
            assert!(!ElementState::Detached.is_satisfied_by(&snap(true, true)));
        }
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_wait_options_chained() {
            let opts = WaitOptions::new().with_timeout(10_000).with_poll_interval(200);
            assert_eq!(opts.timeout(), Duration::from_secs(10));
            assert_eq!(opts.poll_interval(), Duration::from_millis(200));
        }

        #[test]
        fn test_wait_options_default() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_ACTION_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }
    }

    mod url_pattern_tests {
        use super::*;

        #[test]
        fn test_keyword_is_case_insensitive() {
            let pattern = UrlPattern::keyword("checkout").unwrap();
            assert!(pattern.matches("https://shop.test/CHECKOUT/success"));
            assert!(pattern.matches("https://shop.test/checkout/"));
            assert!(!pattern.matches("https://shop.test/cart"));
        }

        #[test]
        fn test_keyword_is_regex_source() {
            let pattern = UrlPattern::keyword("product_list_order=price$").unwrap();
            assert!(pattern.matches("https://shop.test/search?q=bag&product_list_order=price"));
            assert!(!pattern.matches("https://shop.test/search?product_list_order=price&p=2"));
        }

        #[test]
        fn test_invalid_keyword() {
            let err = UrlPattern::keyword("checkout(").unwrap_err();
            assert!(matches!(err, ProbeError::Config { .. }));
        }

        #[test]
        fn test_display() {
            let pattern = UrlPattern::keyword("checkout").unwrap();
            assert_eq!(pattern.to_string(), "url ~ /checkout/i");
        }

        proptest! {
            #[test]
            fn prop_keyword_ignores_case(word in "[a-z]{1,12}", prefix in "[a-z/]{0,10}") {
                let pattern = UrlPattern::keyword(&word).unwrap();
                let url = format!("https://shop.test/{}{}", prefix, word.to_uppercase());
                prop_assert!(pattern.matches(&url));
            }
        }
    }

    mod poll_tests {
        use super::*;

        #[tokio::test]
        async fn test_poll_returns_when_ready() {
            let calls = AtomicUsize::new(0);
            let value = poll_until("third call", WaitOptions::new().with_timeout(1000).with_poll_interval(5), || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(if n >= 2 { Some(n) } else { None }) }
            })
            .await
            .unwrap();
            assert_eq!(value, 2);
        }

        #[tokio::test]
        async fn test_poll_times_out_near_budget() {
            let start = std::time::Instant::now();
            let err = poll_until::<(), _, _>(
                "never",
                WaitOptions::new().with_timeout(120).with_poll_interval(10),
                || async { Ok(None) },
            )
            .await
            .unwrap_err();
            let elapsed = start.elapsed();
            assert!(matches!(err, ProbeError::Timeout { ms: 120, .. }));
            assert!(elapsed >= Duration::from_millis(120));
            assert!(elapsed < Duration::from_millis(1000));
        }

        #[tokio::test]
        async fn test_poll_probes_once_with_zero_timeout() {
            let calls = AtomicUsize::new(0);
            let result = poll_until("instant", WaitOptions::new().with_timeout(0), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Some(())) }
            })
            .await;
            assert!(result.is_ok());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_poll_retries_document_changes_but_not_others() {
            let calls = AtomicUsize::new(0);
            let ok = poll_until("recovers", WaitOptions::new().with_timeout(500).with_poll_interval(5), || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(ProbeError::document_changed("execution context destroyed"))
                    } else {
                        Ok(Some(n))
                    }
                }
            })
            .await;
            assert_eq!(ok.unwrap(), 1);

            let err = poll_until::<(), _, _>("aborts", WaitOptions::new().with_timeout(500), || async {
                Err(ProbeError::config("bad pattern"))
            })
            .await
            .unwrap_err();
            assert!(matches!(err, ProbeError::Config { .. }));
        }

        #[tokio::test]
        async fn test_poll_surfaces_closed_session_at_once() {
            let calls = AtomicUsize::new(0);
            let start = std::time::Instant::now();
            let err = poll_until::<(), _, _>(
                "closed",
                WaitOptions::new().with_timeout(2000).with_poll_interval(5),
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(ProbeError::SessionClosed) }
                },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ProbeError::SessionClosed));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert!(start.elapsed() < Duration::from_millis(500));

            let err = poll_until::<(), _, _>("transport", WaitOptions::new().with_timeout(2000), || async {
                Err(ProbeError::driver("websocket closed"))
            })
            .await
            .unwrap_err();
            assert!(matches!(err, ProbeError::Driver { .. }));
        }
    }
}
