//! One isolated browser session per journey.
//!
//! A [`Session`] owns a driver (its own browser context), the [`Page`] bound
//! to it and the configuration it was opened with. Sessions are never shared:
//! the runner asks a [`SessionFactory`] for a fresh one for every attempt.

use crate::config::ProbeConfig;
use crate::driver::StoreDriver;
use crate::page::Page;
use crate::pages::{
    AccountPage, AuthPage, CartPage, CheckoutPage, HomePage, ProductPage, SearchResultsPage,
};
use crate::result::ProbeResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Driver, page and config for one journey attempt
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    page: Page,
    config: ProbeConfig,
}

impl Session {
    /// Wrap `driver` in a session configured by `config`
    #[must_use]
    pub fn new(driver: Arc<dyn StoreDriver>, config: ProbeConfig) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, base_url = %config.base_url, "session opened");
        Self {
            id,
            page: Page::new(driver, &config),
            config,
        }
    }

    /// Unique session id (appears in logs and screenshot names)
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    #[must_use]
    pub fn home(&self) -> HomePage {
        HomePage::new(self.page.clone())
    }

    #[must_use]
    pub fn auth(&self) -> AuthPage {
        AuthPage::new(self.page.clone())
    }

    #[must_use]
    pub fn account(&self) -> AccountPage {
        AccountPage::new(self.page.clone())
    }

    #[must_use]
    pub fn cart(&self) -> CartPage {
        CartPage::new(self.page.clone())
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutPage {
        CheckoutPage::new(self.page.clone())
    }

    #[must_use]
    pub fn product(&self) -> ProductPage {
        ProductPage::new(self.page.clone())
    }

    #[must_use]
    pub fn search(&self) -> SearchResultsPage {
        SearchResultsPage::new(self.page.clone())
    }

    /// Clear cookies plus local and session storage
    pub async fn cleanup(&self) -> ProbeResult<()> {
        debug!(session = %self.id, "reset storage");
        self.page.driver().reset_storage().await
    }

    /// Close the underlying browser context
    pub async fn close(self) -> ProbeResult<()> {
        debug!(session = %self.id, "session closed");
        self.page.driver().close().await
    }
}

/// Source of fresh sessions
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a new, isolated session
    async fn open(&self, config: &ProbeConfig) -> ProbeResult<Session>;
}

#[async_trait]
impl<F> SessionFactory for F
where
    F: Fn(&ProbeConfig) -> ProbeResult<Session> + Send + Sync,
{
    async fn open(&self, config: &ProbeConfig) -> ProbeResult<Session> {
        self(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeDriver, FakePage};
    use crate::pages::PageObject;

    fn fake_session() -> (Arc<FakeDriver>, Session) {
        let driver = Arc::new(
            FakeDriver::new("https://shop.test")
                .with_page(FakePage::new("/").title("Home Page"))
                .start_at("/"),
        );
        let config = ProbeConfig::default().with_base_url("https://shop.test");
        (driver.clone(), Session::new(driver, config))
    }

    #[tokio::test]
    async fn test_cleanup_resets_storage() {
        let (driver, session) = fake_session();
        driver.set_cookie("customer", "1");
        driver.set_local_storage("mage-cache-storage", "{}");
        session.cleanup().await.unwrap();
        assert!(!driver.has_storage());
    }

    #[tokio::test]
    async fn test_close_closes_driver() {
        let (driver, session) = fake_session();
        session.close().await.unwrap();
        assert!(driver.is_closed());
    }

    #[tokio::test]
    async fn test_closure_factory() {
        let factory = |config: &ProbeConfig| -> ProbeResult<Session> {
            let driver = Arc::new(FakeDriver::new("https://shop.test"));
            Ok(Session::new(driver, config.clone()))
        };
        let config = ProbeConfig::default();
        let a = factory.open(&config).await.unwrap();
        let b = factory.open(&config).await.unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_page_objects_share_page() {
        let (_, session) = fake_session();
        assert_eq!(session.cart().page().base_url(), "https://shop.test");
        assert_eq!(session.home().page().base_url(), session.page().base_url());
    }
}
