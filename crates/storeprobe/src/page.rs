//! Resilient interaction layer.
//!
//! [`Page`] wraps a [`StoreDriver`] with actionability waits and the one
//! recovery rule of the suite: a click that fails is retried exactly once with
//! `force`, which bypasses the visibility, stability and hit-target checks.
//! That covers transient overlays such as the storefront's loading mask.
//!
//! All other failures surface immediately as typed [`ProbeError`]s.

use crate::actionability::{wait_until_actionable, Checks};
use crate::config::ProbeConfig;
use crate::driver::{ReadyState, StoreDriver};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{poll_until, ElementState, UrlPattern, WaitOptions};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Options for [`Page::click_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickOptions {
    /// Skip actionability checks on the first attempt
    pub force: bool,
    /// Override the configured action timeout
    pub timeout: Option<Duration>,
}

impl ClickOptions {
    /// Default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a forced click
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The two click attempts. There is no third.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClickAttempt {
    Normal,
    Forced,
}

impl ClickAttempt {
    const fn checks(self) -> Checks {
        match self {
            Self::Normal => Checks::CLICK,
            Self::Forced => Checks::ATTACHED,
        }
    }

    const fn is_forced(self) -> bool {
        matches!(self, Self::Forced)
    }
}

#[derive(Debug)]
struct Settings {
    base_url: String,
    action_timeout: Duration,
    navigation_timeout: Duration,
    expect_timeout: Duration,
    poll_interval: Duration,
    network_quiet: Duration,
    screenshot_dir: PathBuf,
}

/// Handle to the active document of one session.
///
/// Cheap to clone; every clone drives the same browser tab.
#[derive(Clone)]
pub struct Page {
    driver: Arc<dyn StoreDriver>,
    settings: Arc<Settings>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("driver", &self.driver)
            .field("base_url", &self.settings.base_url)
            .finish()
    }
}

impl Page {
    /// Bind a driver to the timeouts and base URL in `config`
    #[must_use]
    pub fn new(driver: Arc<dyn StoreDriver>, config: &ProbeConfig) -> Self {
        Self {
            driver,
            settings: Arc::new(Settings {
                base_url: config.base_url.clone(),
                action_timeout: config.action_timeout(),
                navigation_timeout: config.navigation_timeout(),
                expect_timeout: config.expect_timeout(),
                poll_interval: config.poll_interval(),
                network_quiet: config.network_quiet(),
                screenshot_dir: config.screenshot_dir.clone(),
            }),
        }
    }

    /// The underlying driver
    #[must_use]
    pub fn driver(&self) -> &dyn StoreDriver {
        self.driver.as_ref()
    }

    /// Configured storefront root
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// Configured action timeout
    #[must_use]
    pub fn action_timeout(&self) -> Duration {
        self.settings.action_timeout
    }

    /// Configured navigation timeout
    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        self.settings.navigation_timeout
    }

    /// Budget for outcome checks (banners, confirmation messages, listings)
    #[must_use]
    pub fn expect_timeout(&self) -> Duration {
        self.settings.expect_timeout
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Click with default options
    pub async fn click(&self, locator: &Locator) -> ProbeResult<()> {
        self.click_with(locator, ClickOptions::default()).await
    }

    /// Click `locator`, retrying once with `force` if the first attempt fails.
    ///
    /// Both attempts get the same budget: `options.timeout` or the configured
    /// action timeout. When the forced attempt also fails its error is
    /// returned; the first error is only logged. Errors that are not about
    /// the element (closed session, transport) skip the forced attempt.
    pub async fn click_with(&self, locator: &Locator, options: ClickOptions) -> ProbeResult<()> {
        let timeout = options.timeout.unwrap_or(self.settings.action_timeout);
        let first = if options.force {
            ClickAttempt::Forced
        } else {
            ClickAttempt::Normal
        };

        match self.attempt_click(locator, first, timeout).await {
            Ok(()) => Ok(()),
            Err(err) if !err.is_interaction_failure() => Err(err),
            Err(err) => {
                warn!(%locator, error = %err, "click failed, retrying with force");
                self.attempt_click(locator, ClickAttempt::Forced, timeout).await
            }
        }
    }

    async fn attempt_click(
        &self,
        locator: &Locator,
        attempt: ClickAttempt,
        timeout: Duration,
    ) -> ProbeResult<()> {
        debug!(%locator, ?attempt, timeout_ms = timeout.as_millis() as u64, "click");
        wait_until_actionable(
            self.driver(),
            locator,
            attempt.checks(),
            timeout,
            self.settings.poll_interval,
        )
        .await?;
        self.driver.dispatch_click(locator, attempt.is_forced()).await
    }

    /// Replace the contents of a text field with `text`
    pub async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        debug!(%locator, chars = text.chars().count(), "fill");
        wait_until_actionable(
            self.driver(),
            locator,
            Checks::FILL,
            self.settings.action_timeout,
            self.settings.poll_interval,
        )
        .await?;
        self.driver.dispatch_fill(locator, text).await
    }

    /// Choose an option of a `<select>` by value or visible label
    pub async fn select_option(&self, locator: &Locator, value: &str) -> ProbeResult<()> {
        debug!(%locator, value, "select option");
        wait_until_actionable(
            self.driver(),
            locator,
            Checks::SELECT,
            self.settings.action_timeout,
            self.settings.poll_interval,
        )
        .await?;
        self.driver.dispatch_select(locator, value).await
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Text content of the target, `""` when it has none.
    ///
    /// Reads the current document without waiting; fails only when nothing
    /// matches.
    pub async fn get_text(&self, locator: &Locator) -> ProbeResult<String> {
        let snapshot = self.driver.snapshot(locator).await?;
        if !snapshot.found {
            return Err(ProbeError::NotFound {
                locator: locator.to_string(),
            });
        }
        Ok(snapshot.text.unwrap_or_default())
    }

    /// Whether the target is currently rendered. Never fails.
    pub async fn is_visible(&self, locator: &Locator) -> bool {
        match self.driver.snapshot(locator).await {
            Ok(snapshot) => snapshot.found && snapshot.visible,
            Err(err) => {
                debug!(%locator, error = %err, "visibility probe failed, reading as hidden");
                false
            }
        }
    }

    /// Number of elements the locator's query matches right now
    pub async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        self.driver.count(&locator.all()).await
    }

    /// Attribute of the target (first match when unindexed)
    pub async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        self.driver.attribute(locator, name).await
    }

    /// Wait up to `timeout` for a first match, then count.
    ///
    /// A timed-out wait reads as zero matches. Any other failure (driver
    /// gone, navigation broken) is returned so that absence and breakage stay
    /// distinguishable.
    pub async fn probe_count(&self, locator: &Locator, timeout: Duration) -> ProbeResult<usize> {
        match self
            .wait_for(&locator.first(), ElementState::Visible, Some(timeout))
            .await
        {
            Ok(()) => self.count(locator).await,
            Err(ProbeError::Timeout { .. }) => Ok(0),
            Err(other) => Err(other),
        }
    }

    /// Document title
    pub async fn title(&self) -> ProbeResult<String> {
        self.driver.title().await
    }

    /// Current URL
    pub async fn current_url(&self) -> ProbeResult<String> {
        self.driver.current_url().await
    }

    // ------------------------------------------------------------------
    // Waits
    // ------------------------------------------------------------------

    /// Suspend until the target reaches `state`.
    ///
    /// `timeout` defaults to the configured action timeout.
    pub async fn wait_for(
        &self,
        locator: &Locator,
        state: ElementState,
        timeout: Option<Duration>,
    ) -> ProbeResult<()> {
        let options = self.wait_options(timeout.unwrap_or(self.settings.action_timeout));
        let what = format!("{locator} to be {state}");
        poll_until(&what, options, || self.reached_state(locator, state)).await
    }

    /// Suspend until the document is loaded and no request has been in flight
    /// for the quiet window
    pub async fn wait_for_navigation_idle(&self) -> ProbeResult<()> {
        let quiet_since = Mutex::new(None);
        poll_until(
            "network idle",
            self.wait_options(self.settings.navigation_timeout),
            || self.network_settled(&quiet_since),
        )
        .await
    }

    /// Suspend until the document has been parsed (no network wait)
    pub async fn wait_for_dom_ready(&self) -> ProbeResult<()> {
        poll_until(
            "DOM content loaded",
            self.wait_options(self.settings.navigation_timeout),
            || self.dom_parsed(),
        )
        .await
    }

    /// Suspend until the URL matches `pattern` (case-insensitive regex source)
    pub async fn wait_for_url_matching(&self, pattern: &str) -> ProbeResult<()> {
        let pattern = UrlPattern::keyword(pattern)?;
        self.wait_for_url(&pattern, self.settings.navigation_timeout)
            .await
            .map(|_| ())
    }

    /// Suspend until the URL satisfies `pattern`, returning the matching URL
    pub async fn wait_for_url(&self, pattern: &UrlPattern, timeout: Duration) -> ProbeResult<String> {
        let what = pattern.to_string();
        poll_until(&what, self.wait_options(timeout), || self.url_matching(pattern)).await
    }

    async fn reached_state(&self, locator: &Locator, state: ElementState) -> ProbeResult<Option<()>> {
        let snapshot = self.driver.snapshot(locator).await?;
        Ok(state.is_satisfied_by(&snapshot).then_some(()))
    }

    async fn dom_parsed(&self) -> ProbeResult<Option<()>> {
        let state = self.driver.ready_state().await?;
        Ok((state >= ReadyState::Interactive).then_some(()))
    }

    async fn url_matching(&self, pattern: &UrlPattern) -> ProbeResult<Option<String>> {
        let url = self.driver.current_url().await?;
        Ok(pattern.matches(&url).then_some(url))
    }

    /// One network-idle sample. `quiet_since` remembers when the current quiet
    /// stretch began and the completed-request counter at that moment.
    async fn network_settled(
        &self,
        quiet_since: &Mutex<Option<(Instant, u64)>>,
    ) -> ProbeResult<Option<()>> {
        let mark = |value: Option<(Instant, u64)>| {
            *quiet_since.lock().unwrap_or_else(PoisonError::into_inner) = value;
        };

        if self.driver.ready_state().await? < ReadyState::Complete {
            mark(None);
            return Ok(None);
        }
        let activity = self.driver.network_activity().await?;
        if !activity.is_quiet() {
            mark(None);
            return Ok(None);
        }

        let started = *quiet_since.lock().unwrap_or_else(PoisonError::into_inner);
        let quiet = self.settings.network_quiet;
        match started {
            Some((since, completed)) if completed == activity.completed => {
                Ok((since.elapsed() >= quiet).then_some(()))
            }
            _ => {
                // First quiet sample, or a request started and finished
                // between polls.
                mark(Some((Instant::now(), activity.completed)));
                Ok(quiet.is_zero().then_some(()))
            }
        }
    }

    // ------------------------------------------------------------------
    // Navigation and session utilities
    // ------------------------------------------------------------------

    /// Navigate to an absolute URL or a path relative to the base URL
    pub async fn navigate(&self, path_or_url: &str) -> ProbeResult<()> {
        let url = join_url(&self.settings.base_url, path_or_url);
        info!(%url, "navigate");
        self.driver.navigate(&url).await
    }

    /// Auto-accept confirm dialogs from now on
    pub async fn accept_dialogs(&self) -> ProbeResult<()> {
        self.driver.accept_dialogs().await
    }

    /// Write a full-page PNG to `<screenshot_dir>/<name>.png`
    pub async fn screenshot(&self, name: &str) -> ProbeResult<PathBuf> {
        let bytes = self.driver.screenshot().await?;
        tokio::fs::create_dir_all(&self.settings.screenshot_dir).await?;
        let path = self.settings.screenshot_dir.join(format!("{name}.png"));
        tokio::fs::write(&path, bytes).await?;
        info!(path = %path.display(), "screenshot saved");
        Ok(path)
    }

    /// Wait options for `timeout` at the configured poll interval
    pub(crate) fn wait_options(&self, timeout: Duration) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(timeout.as_millis() as u64)
            .with_poll_interval(self.settings.poll_interval.as_millis() as u64)
    }
}

/// Join a path onto a base URL; absolute URLs pass through unchanged
#[must_use]
pub fn join_url(base: &str, path_or_url: &str) -> String {
    if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
        return path_or_url.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path_or_url.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    mod join_url_tests {
        use super::*;

        #[test]
        fn test_relative_paths() {
            assert_eq!(
                join_url("https://shop.test/", "/checkout/cart/"),
                "https://shop.test/checkout/cart/"
            );
            assert_eq!(
                join_url("https://shop.test", "customer/account/"),
                "https://shop.test/customer/account/"
            );
            assert_eq!(join_url("https://shop.test/", "/"), "https://shop.test/");
            assert_eq!(join_url("https://shop.test/", ""), "https://shop.test/");
        }

        #[test]
        fn test_absolute_url_passes_through() {
            assert_eq!(
                join_url("https://shop.test/", "http://other.test/x"),
                "http://other.test/x"
            );
        }
    }

    mod click_options_tests {
        use super::*;

        #[test]
        fn test_builder() {
            let opts = ClickOptions::new()
                .force(true)
                .timeout(Duration::from_millis(250));
            assert!(opts.force);
            assert_eq!(opts.timeout, Some(Duration::from_millis(250)));
            assert_eq!(ClickOptions::default().timeout, None);
        }

        #[test]
        fn test_attempt_checks() {
            assert_eq!(ClickAttempt::Normal.checks(), Checks::CLICK);
            assert_eq!(ClickAttempt::Forced.checks(), Checks::ATTACHED);
            assert!(ClickAttempt::Forced.is_forced());
            assert!(!ClickAttempt::Normal.is_forced());
        }
    }
}
