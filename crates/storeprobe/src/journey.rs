//! User journeys and the runner that executes them.
//!
//! A [`Journey`] is a named scenario over a [`Session`]: it composes page
//! object calls and checks outcomes with [`ensure!`](crate::ensure). The
//! built-in [`catalog`] covers search, authentication, cart, account and
//! checkout. [`JourneyRunner`] gives every attempt a fresh session, retries
//! failures, bounds each attempt by the test timeout and resets storage
//! afterwards.

use crate::config::ProbeConfig;
use crate::constants::{
    errors, success, ACCOUNT_URL, DEFAULT_PASSWORD, NO_RESULTS_TERM, REGISTER_URL,
};
use crate::ensure;
use crate::helpers::{assert_element_contains_text, extract_number, Customer, ShippingInfo};
use crate::locator::Locator;
use crate::pages::{AddToCart, PageObject};
use crate::result::{ProbeError, ProbeResult};
use crate::session::{Session, SessionFactory};
use crate::wait::ElementState;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};

/// Boxed journey body borrowing its session
pub type JourneyFuture<'a> = Pin<Box<dyn Future<Output = ProbeResult<()>> + Send + 'a>>;

/// Journey body
pub type JourneyFn = for<'a> fn(&'a Session) -> JourneyFuture<'a>;

/// A named end-to-end scenario
#[derive(Clone, Copy)]
pub struct Journey {
    /// Unique name, `area/what` (e.g. `cart/update-quantity`)
    pub name: &'static str,
    /// One-line summary
    pub description: &'static str,
    /// Tags for selection (`smoke`, `cart`, ...)
    pub tags: &'static [&'static str],
    run: JourneyFn,
}

impl Journey {
    /// Journey running `run`
    #[must_use]
    pub const fn new(
        name: &'static str,
        description: &'static str,
        tags: &'static [&'static str],
        run: JourneyFn,
    ) -> Self {
        Self {
            name,
            description,
            tags,
            run,
        }
    }

    /// Whether the journey carries `tag`
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Run the body once against `session`
    pub fn run<'a>(&self, session: &'a Session) -> JourneyFuture<'a> {
        (self.run)(session)
    }
}

impl fmt::Debug for Journey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Journey")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish_non_exhaustive()
    }
}

/// Every built-in journey, in execution order
#[must_use]
pub fn catalog() -> Vec<Journey> {
    vec![
        Journey::new(
            "search/returns-results",
            "searching a known term lists products under a matching title",
            &["search", "smoke"],
            search_returns_results,
        ),
        Journey::new(
            "search/no-results",
            "an unknown term shows the no-results notice",
            &["search"],
            search_no_results,
        ),
        Journey::new(
            "search/filter-by-price",
            "the price filter narrows the listing to the chosen range",
            &["search"],
            search_filter_by_price,
        ),
        Journey::new(
            "search/sort-by-price",
            "sorting by price orders the listing ascending",
            &["search"],
            search_sort_by_price,
        ),
        Journey::new(
            "search/open-product",
            "a result opens the matching product page",
            &["search", "smoke"],
            search_open_product,
        ),
        Journey::new(
            "auth/register",
            "a new customer can create an account",
            &["auth", "smoke"],
            auth_register,
        ),
        Journey::new(
            "auth/login",
            "a registered customer can sign back in",
            &["auth"],
            auth_login,
        ),
        Journey::new(
            "auth/invalid-login",
            "wrong credentials show the sign-in error",
            &["auth"],
            auth_invalid_login,
        ),
        Journey::new(
            "auth/change-password",
            "a customer can change their password",
            &["auth", "account"],
            auth_change_password,
        ),
        Journey::new(
            "account/dashboard",
            "the dashboard links reach their sections",
            &["account"],
            account_dashboard,
        ),
        Journey::new(
            "account/update-information",
            "a customer can edit their first name",
            &["account"],
            account_update_information,
        ),
        Journey::new(
            "cart/add-product",
            "a guest can add a configured product to the cart",
            &["cart", "smoke"],
            cart_add_product,
        ),
        Journey::new(
            "cart/update-quantity",
            "changing a line quantity sticks after update",
            &["cart"],
            cart_update_quantity,
        ),
        Journey::new(
            "cart/remove-item",
            "removing the only line empties the cart",
            &["cart"],
            cart_remove_item,
        ),
        Journey::new(
            "cart/empty-cart",
            "the clear-cart button empties the cart after confirmation",
            &["cart"],
            cart_empty,
        ),
        Journey::new(
            "cart/subtotal",
            "the subtotal equals the sum of the line prices",
            &["cart"],
            cart_subtotal,
        ),
        Journey::new(
            "checkout/guest-order",
            "a guest can place an order and gets an order number",
            &["checkout", "smoke"],
            checkout_guest_order,
        ),
    ]
}

/// Journeys whose name contains `filter` (case-insensitive) and that carry
/// `tag`, in catalog order
#[must_use]
pub fn select(filter: Option<&str>, tag: Option<&str>) -> Vec<Journey> {
    let filter = filter.map(str::to_lowercase);
    catalog()
        .into_iter()
        .filter(|j| filter.as_deref().map_or(true, |f| j.name.contains(f)))
        .filter(|j| tag.map_or(true, |t| j.has_tag(t)))
        .collect()
}

// ----------------------------------------------------------------------
// Scenarios
// ----------------------------------------------------------------------

const SEARCH_TERM: &str = "shirt";

async fn search_for(session: &Session, term: &str) -> ProbeResult<()> {
    let home = session.home();
    home.open().await?;
    home.search_product(term).await
}

/// Search, open the first result and add it in size M and the first colour.
/// Returns the product name.
async fn add_first_result_to_cart(session: &Session) -> ProbeResult<String> {
    search_for(session, "tee").await?;
    session.search().click_product(0).await?;

    let product = session.product();
    let name = product.title().await?;
    product
        .add_to_cart(&AddToCart::new().size("M").color(0))
        .await?;
    Ok(name)
}

async fn register_customer(session: &Session) -> ProbeResult<Customer> {
    let customer = Customer::generate();
    session.page().navigate(REGISTER_URL).await?;
    session
        .auth()
        .register(
            &customer.first_name,
            &customer.last_name,
            &customer.email,
            &customer.password,
        )
        .await?;
    Ok(customer)
}

fn search_returns_results(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        search_for(session, SEARCH_TERM).await?;
        let results = session.search();
        let count = results.results_count().await?;
        ensure!(count > 0, "expected results for {SEARCH_TERM:?}, got none");

        let title = results.title().await?.to_lowercase();
        let expected = format!("search results for: '{SEARCH_TERM}'");
        ensure!(title.contains(&expected), "title {title:?} lacks {expected:?}");
        Ok(())
    })
}

fn search_no_results(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        search_for(session, NO_RESULTS_TERM).await?;
        let results = session.search();
        results
            .page()
            .wait_for(&results.no_results_message, ElementState::Visible, None)
            .await?;
        ensure!(
            results.page().count(&results.product_items).await? == 0,
            "no-results page still lists products"
        );
        Ok(())
    })
}

fn search_filter_by_price(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        search_for(session, SEARCH_TERM).await?;
        let results = session.search();
        let before = results.results_count().await?;

        results.apply_filter("Price", "$40.00 - $49.99").await?;
        let after = results.results_count().await?;
        ensure!(after <= before, "filter grew the listing from {before} to {after}");

        let page = results.page();
        for i in 0..page.count(&results.product_prices).await? {
            let price = extract_number(&page.get_text(&results.product_prices.nth(i)).await?);
            ensure!(
                (40.0..=49.99).contains(&price),
                "price {price} outside the filtered range"
            );
        }
        Ok(())
    })
}

fn search_sort_by_price(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        search_for(session, "jacket").await?;
        let results = session.search();
        results.results_count().await?;
        results.sort_by("price").await?;

        let page = results.page();
        let mut prices = Vec::new();
        for i in 0..page.count(&results.product_prices).await? {
            prices.push(extract_number(
                &page.get_text(&results.product_prices.nth(i)).await?,
            ));
        }
        ensure!(
            prices.windows(2).all(|w| w[0] <= w[1]),
            "prices not ascending: {prices:?}"
        );
        Ok(())
    })
}

fn search_open_product(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        search_for(session, SEARCH_TERM).await?;
        let results = session.search();
        results.results_count().await?;
        let first = results
            .product_titles()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProbeError::assertion("listing has no titles"))?;
        results.click_product(0).await?;

        let product = session.product();
        let title = product.title().await?;
        ensure!(
            title.trim() == first.trim(),
            "opened {title:?}, expected {first:?}"
        );
        ensure!(product.is_current().await, "add-to-cart button missing");
        ensure!(
            product.page().is_visible(&product.product_price).await,
            "price missing"
        );
        Ok(())
    })
}

fn auth_register(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        register_customer(session).await?;
        assert_element_contains_text(
            session.page(),
            &session.auth().registration_success_message,
            success::REGISTRATION,
        )
        .await?;
        ensure!(
            session.page().current_url().await?.contains(ACCOUNT_URL),
            "registration did not land on the account page"
        );
        Ok(())
    })
}

fn auth_login(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        let customer = register_customer(session).await?;
        // Signing out is clearing the session cookies.
        session.cleanup().await?;

        let auth = session.auth();
        auth.open().await?;
        auth.login(&customer.email, &customer.password).await?;
        session
            .page()
            .wait_for_url_matching(r"customer/account/?$")
            .await?;

        let home = session.home();
        home.open().await?;
        ensure!(home.is_user_logged_in().await, "welcome banner missing after login");
        Ok(())
    })
}

fn auth_invalid_login(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        let auth = session.auth();
        auth.open().await?;
        auth.login(&crate::helpers::unique_email(), "WrongPassword123")
            .await?;
        assert_element_contains_text(
            session.page(),
            &auth.login_error_message,
            errors::LOGIN_FAILED,
        )
        .await?;
        ensure!(
            !session.home().is_user_logged_in().await,
            "customer is signed in after a failed login"
        );
        Ok(())
    })
}

fn auth_change_password(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        register_customer(session).await?;
        let account = session.account();
        account
            .change_password(DEFAULT_PASSWORD, "N3w-Passw0rd!")
            .await?;
        assert_element_contains_text(
            session.page(),
            &account.success_message,
            success::ACCOUNT_SAVED,
        )
        .await?;
        Ok(())
    })
}

fn account_dashboard(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        register_customer(session).await?;
        let account = session.account();
        account.open().await?;

        let title = account.title().await?;
        ensure!(title.contains("My Account"), "dashboard title {title:?}");
        for link in [
            &account.my_orders_link,
            &account.address_book_link,
            &account.account_info_link,
        ] {
            ensure!(account.page().is_visible(link).await, "{link} not shown");
        }

        account.navigate_to_address_book().await?;
        let title = account.title().await?;
        ensure!(title.contains("Add New Address"), "address book title {title:?}");

        account.navigate_to_account_information().await?;
        let title = account.title().await?;
        ensure!(
            title.contains("Edit Account Information"),
            "account information title {title:?}"
        );
        Ok(())
    })
}

fn account_update_information(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        let customer = register_customer(session).await?;
        let account = session.account();
        account.navigate_to_account_information().await?;

        let first_name = format!("Updated{}", customer.first_name);
        account.update_first_name(&first_name).await?;
        assert_element_contains_text(
            session.page(),
            &account.success_message,
            success::ACCOUNT_SAVED,
        )
        .await?;
        Ok(())
    })
}

fn cart_add_product(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        let name = add_first_result_to_cart(session).await?;
        let message = assert_element_contains_text(
            session.page(),
            &session.product().success_message,
            success::ADDED_TO_CART,
        )
        .await?;
        ensure!(message.contains(&name), "add-to-cart message {message:?} lacks {name:?}");

        let counter = Locator::new(".counter-number");
        let page = session.page();
        page.wait_for(&counter, ElementState::Visible, None).await?;
        let items = extract_number(&page.get_text(&counter).await?);
        ensure!(items > 0.0, "cart counter shows {items}");
        Ok(())
    })
}

fn cart_update_quantity(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        add_first_result_to_cart(session).await?;
        let cart = session.cart();
        cart.open().await?;
        let lines = cart.items_count().await?;
        ensure!(lines == 1, "expected one cart line, found {lines}");

        let quantity = cart.update_item_quantity(0, 2).await?;
        ensure!(quantity == "2", "quantity field shows {quantity:?}");
        Ok(())
    })
}

fn cart_remove_item(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        add_first_result_to_cart(session).await?;
        let cart = session.cart();
        cart.open().await?;
        cart.remove_item(0).await?;
        ensure!(cart.is_empty().await, "cart not empty after removing its only line");
        ensure!(cart.items_count().await? == 0, "cart still counts lines");
        Ok(())
    })
}

fn cart_empty(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        add_first_result_to_cart(session).await?;
        let cart = session.cart();
        cart.open().await?;
        cart.empty_cart().await?;
        ensure!(cart.is_empty().await, "cart not empty after clearing");
        Ok(())
    })
}

fn cart_subtotal(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        add_first_result_to_cart(session).await?;
        let price = extract_number(&session.product().price().await?);

        let cart = session.cart();
        cart.open().await?;
        let subtotal = extract_number(&cart.subtotal().await?);
        ensure!(
            (subtotal - price).abs() < 0.005,
            "subtotal {subtotal} differs from line total {price}"
        );
        Ok(())
    })
}

fn checkout_guest_order(session: &Session) -> JourneyFuture<'_> {
    Box::pin(async move {
        add_first_result_to_cart(session).await?;
        let cart = session.cart();
        cart.open().await?;
        cart.proceed_to_checkout().await?;

        let checkout = session.checkout();
        checkout
            .complete_checkout(&ShippingInfo::generate(), 0)
            .await?;
        ensure!(checkout.is_order_confirmed().await, "no order confirmation");
        let order = checkout.order_number().await?;
        ensure!(order.len() > 5, "implausible order number {order:?}");
        Ok(())
    })
}

// ----------------------------------------------------------------------
// Runner
// ----------------------------------------------------------------------

/// Outcome of one journey across all of its attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JourneyReport {
    /// Journey name
    pub name: String,
    /// Whether the last attempt passed
    pub passed: bool,
    /// Attempts made (1 + retries used)
    pub attempts: u32,
    /// Wall time across all attempts
    pub duration: Duration,
    /// Error of the last failed attempt
    pub error: Option<String>,
    /// Screenshot of the last failed attempt
    pub screenshot: Option<String>,
}

impl JourneyReport {
    fn new(name: &str, attempts: u32, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            attempts,
            duration,
            error: None,
            screenshot: None,
        }
    }

    /// Passed on a later attempt
    #[must_use]
    pub const fn is_flaky(&self) -> bool {
        self.passed && self.attempts > 1
    }
}

/// Results of a run, in catalog order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// Per-journey reports
    pub reports: Vec<JourneyReport>,
    /// Wall time of the whole run
    pub duration: Duration,
}

impl RunSummary {
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(|r| r.passed)
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.passed).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.reports.iter().filter(|r| !r.passed).count()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    #[must_use]
    pub fn failures(&self) -> Vec<&JourneyReport> {
        self.reports.iter().filter(|r| !r.passed).collect()
    }
}

/// Failure of one attempt plus the screenshot taken for it
struct AttemptFailure {
    error: ProbeError,
    screenshot: Option<String>,
}

/// Runs journeys in fresh sessions with retries
#[derive(Debug)]
pub struct JourneyRunner<F> {
    factory: F,
    config: ProbeConfig,
}

impl<F: SessionFactory> JourneyRunner<F> {
    /// Runner opening sessions from `factory`
    #[must_use]
    pub const fn new(factory: F, config: ProbeConfig) -> Self {
        Self { factory, config }
    }

    #[must_use]
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Run `journeys`, at most `workers` at a time
    pub async fn run(&self, journeys: &[Journey]) -> RunSummary {
        self.run_with(journeys, |_| {}).await
    }

    /// Like [`Self::run`], handing each report to `on_report` as soon as its
    /// journey finishes (completion order, not catalog order)
    pub async fn run_with<R>(&self, journeys: &[Journey], on_report: R) -> RunSummary
    where
        R: Fn(&JourneyReport) + Sync,
    {
        let started = Instant::now();
        let workers = self.config.workers.max(1);
        info!(journeys = journeys.len(), workers, "run started");

        let on_report = &on_report;
        let mut indexed: Vec<(usize, JourneyReport)> = stream::iter(journeys.iter().enumerate())
            .map(|(i, journey)| async move {
                let report = self.run_journey(journey).await;
                on_report(&report);
                (i, report)
            })
            .buffer_unordered(workers)
            .collect()
            .await;
        indexed.sort_by_key(|(i, _)| *i);

        let summary = RunSummary {
            reports: indexed.into_iter().map(|(_, r)| r).collect(),
            duration: started.elapsed(),
        };
        info!(
            passed = summary.passed_count(),
            failed = summary.failed_count(),
            elapsed_ms = summary.duration.as_millis() as u64,
            "run finished"
        );
        summary
    }

    /// Run one journey, retrying up to the configured count
    pub async fn run_journey(&self, journey: &Journey) -> JourneyReport {
        let span = info_span!("journey", name = journey.name);
        self.retry(journey).instrument(span).await
    }

    async fn retry(&self, journey: &Journey) -> JourneyReport {
        let started = Instant::now();
        let max_attempts = self.config.retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!(attempt, "journey started");
            match self.attempt(journey, attempt).await {
                Ok(()) => {
                    info!(attempt, "journey passed");
                    return JourneyReport::new(journey.name, attempt, started.elapsed());
                }
                Err(failure) if attempt < max_attempts => {
                    warn!(attempt, error = %failure.error, "journey failed, retrying in a fresh session");
                }
                Err(failure) => {
                    warn!(attempt, error = %failure.error, "journey failed");
                    let mut report = JourneyReport::new(journey.name, attempt, started.elapsed());
                    report.passed = false;
                    report.error = Some(failure.error.to_string());
                    report.screenshot = failure.screenshot;
                    return report;
                }
            }
        }
    }

    async fn attempt(&self, journey: &Journey, attempt: u32) -> Result<(), AttemptFailure> {
        let session = self
            .factory
            .open(&self.config)
            .await
            .map_err(|error| AttemptFailure {
                error,
                screenshot: None,
            })?;

        let budget = self.config.test_timeout();
        let outcome = match tokio::time::timeout(budget, journey.run(&session)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeError::timeout(
                format!("journey {}", journey.name),
                budget.as_millis() as u64,
            )),
        };

        let screenshot = match &outcome {
            Err(_) if self.config.screenshot_on_failure => {
                let name = format!("{}-attempt{attempt}", journey.name.replace('/', "-"));
                match session.page().screenshot(&name).await {
                    Ok(path) => Some(path.display().to_string()),
                    Err(err) => {
                        warn!(error = %err, "failure screenshot not captured");
                        None
                    }
                }
            }
            _ => None,
        };

        if let Err(err) = session.cleanup().await {
            warn!(error = %err, "storage reset failed");
        }
        if let Err(err) = session.close().await {
            warn!(error = %err, "session close failed");
        }

        outcome.map_err(|error| AttemptFailure { error, screenshot })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod catalog_tests {
        use super::*;
        use std::collections::HashSet;

        #[test]
        fn test_names_unique_and_namespaced() {
            let journeys = catalog();
            let names: HashSet<_> = journeys.iter().map(|j| j.name).collect();
            assert_eq!(names.len(), journeys.len());
            for journey in &journeys {
                assert!(journey.name.contains('/'), "{}", journey.name);
                assert!(!journey.tags.is_empty(), "{}", journey.name);
            }
        }

        #[test]
        fn test_every_area_covered() {
            for area in ["search", "auth", "account", "cart", "checkout"] {
                assert!(
                    catalog().iter().any(|j| j.has_tag(area)),
                    "no journey tagged {area}"
                );
            }
        }

        #[test]
        fn test_select_by_filter_and_tag() {
            let cart = select(Some("CART/"), None);
            assert!(cart.len() >= 4);
            assert!(cart.iter().all(|j| j.name.starts_with("cart/")));

            let smoke_search = select(Some("search"), Some("smoke"));
            let names: Vec<_> = smoke_search.iter().map(|j| j.name).collect();
            assert_eq!(names, ["search/returns-results", "search/open-product"]);

            assert!(select(Some("nothing-matches"), None).is_empty());
            assert_eq!(select(None, None).len(), catalog().len());
        }
    }

    mod summary_tests {
        use super::*;

        fn report(name: &str, passed: bool, attempts: u32) -> JourneyReport {
            let mut report = JourneyReport::new(name, attempts, Duration::from_millis(5));
            report.passed = passed;
            report
        }

        #[test]
        fn test_counts() {
            let summary = RunSummary {
                reports: vec![
                    report("a", true, 1),
                    report("b", false, 2),
                    report("c", true, 2),
                ],
                duration: Duration::from_millis(20),
            };
            assert!(!summary.all_passed());
            assert_eq!(summary.passed_count(), 2);
            assert_eq!(summary.failed_count(), 1);
            assert_eq!(summary.total(), 3);
            assert_eq!(summary.failures()[0].name, "b");
            assert!(summary.reports[2].is_flaky());
            assert!(!summary.reports[0].is_flaky());
        }

        #[test]
        fn test_empty_run_passes() {
            assert!(RunSummary::default().all_passed());
        }
    }
}
