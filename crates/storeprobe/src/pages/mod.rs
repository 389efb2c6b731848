//! Page objects for the storefront.
//!
//! Each page object is a set of [`Locator`](crate::Locator) fields plus
//! operations composed from [`Page`] calls. They hold a clone of the session's
//! `Page`, so constructing one is cheap and any number can coexist.
//!
//! ```ignore
//! let home = HomePage::new(session.page().clone());
//! home.open().await?;
//! home.search_product("jacket").await?;
//! ```

mod account;
mod auth;
mod cart;
mod checkout;
mod home;
mod product;
mod search;

pub use account::AccountPage;
pub use auth::AuthPage;
pub use cart::CartPage;
pub use checkout::CheckoutPage;
pub use home::HomePage;
pub use product::{AddToCart, ProductPage};
pub use search::SearchResultsPage;

use crate::page::Page;
use crate::result::ProbeResult;
use async_trait::async_trait;

/// Common behaviour of storefront pages
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Path of this page relative to the base URL (e.g. "/checkout/cart/")
    fn path(&self) -> &str;

    /// Page handle the object drives
    fn page(&self) -> &Page;

    /// Name for logging
    fn page_name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Navigate to [`Self::path`] and wait for the network to settle
    async fn open(&self) -> ProbeResult<()> {
        tracing::info!(page = self.page_name(), "open");
        self.page().navigate(self.path()).await?;
        self.page().wait_for_navigation_idle().await
    }

    /// Whether the current URL is this page
    async fn is_current(&self) -> bool {
        let path = self.path().trim_end_matches('/');
        match self.page().current_url().await {
            Ok(url) => url
                .split(['?', '#'])
                .next()
                .is_some_and(|u| u.trim_end_matches('/').ends_with(path)),
            Err(_) => false,
        }
    }
}
