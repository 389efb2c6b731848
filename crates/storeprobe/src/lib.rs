//! Storeprobe: page-object end-to-end testing for e-commerce storefronts
//!
//! Journeys (search, sign-in, cart, checkout) are written against page
//! objects, page objects against a resilient interaction layer, and the
//! interaction layer against a [`StoreDriver`]: either a headless Chromium
//! over CDP (`browser` feature) or the scripted in-memory [`FakeDriver`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    STOREPROBE Architecture                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Journeys   │    │ Page       │    │ Page       │            │
//! │   │ + Runner   │───►│ Objects    │───►│ (waits,    │            │
//! │   │            │    │            │    │  retries)  │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             ▼                   │
//! │                          ┌──────────────────────────────┐       │
//! │                          │ StoreDriver                  │       │
//! │                          │  ChromiumDriver | FakeDriver │       │
//! │                          └──────────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use storeprobe::{demo, PageObject, ProbeConfig, Session};
//!
//! # async fn run() -> storeprobe::ProbeResult<()> {
//! let config = ProbeConfig::default().with_base_url(demo::DEMO_ORIGIN);
//! let session = Session::new(Arc::new(demo::storefront()), config);
//!
//! let home = session.home();
//! home.open().await?;
//! home.search_product("shirt").await?;
//! assert!(session.search().results_count().await? > 0);
//! # Ok(())
//! # }
//! ```

pub mod actionability;
#[cfg(feature = "browser")]
pub mod chromium;
pub mod config;
pub mod constants;
pub mod demo;
pub mod driver;
pub mod fake;
pub mod helpers;
pub mod journey;
pub mod locator;
pub mod page;
pub mod pages;
mod result;
pub mod session;
pub mod wait;

pub use actionability::{Blocker, Checks};
#[cfg(feature = "browser")]
pub use chromium::{ChromiumDriver, ChromiumSessions};
pub use config::ProbeConfig;
pub use driver::{ElementSnapshot, NetworkActivity, ReadyState, StoreDriver};
pub use fake::{Effect, FakeDriver, FakeElement, FakePage};
pub use journey::{catalog, select, Journey, JourneyReport, JourneyRunner, RunSummary};
pub use locator::{BoundingBox, Locator, Nth, Query};
pub use page::{ClickOptions, Page};
pub use pages::{
    AccountPage, AddToCart, AuthPage, CartPage, CheckoutPage, HomePage, PageObject, ProductPage,
    SearchResultsPage,
};
pub use result::{ProbeError, ProbeResult};
pub use session::{Session, SessionFactory};
pub use wait::{ElementState, UrlPattern, WaitOptions};
