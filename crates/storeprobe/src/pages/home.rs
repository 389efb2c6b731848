use super::PageObject;
use crate::locator::Locator;
use crate::page::Page;
use crate::result::ProbeResult;

/// Landing page and the header every page shares
#[derive(Debug, Clone)]
pub struct HomePage {
    page: Page,
    /// "Sign In" link in the header
    pub sign_in_link: Locator,
    /// "Create an Account" link in the header
    pub create_account_link: Locator,
    /// Quick search input
    pub search_bar: Locator,
    /// Quick search submit
    pub search_button: Locator,
    /// Customer menu toggle
    pub account_menu_button: Locator,
    /// Minicart toggle
    pub cart_icon: Locator,
    /// "Welcome, ..." greeting shown to signed-in customers
    pub welcome_message: Locator,
}

impl HomePage {
    /// Bind to `page`
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self {
            page,
            sign_in_link: Locator::new(".authorization-link a"),
            create_account_link: Locator::new("a").with_text("Create an Account"),
            search_bar: Locator::new("#search"),
            search_button: Locator::new("button[title=\"Search\"]"),
            account_menu_button: Locator::new(".action.switch"),
            cart_icon: Locator::new(".minicart-wrapper .action.showcart"),
            welcome_message: Locator::new(".greet.welcome"),
        }
    }

    pub async fn click_sign_in(&self) -> ProbeResult<()> {
        self.page.click(&self.sign_in_link).await?;
        self.page.wait_for_navigation_idle().await
    }

    pub async fn click_create_account(&self) -> ProbeResult<()> {
        self.page.click(&self.create_account_link).await?;
        self.page.wait_for_navigation_idle().await
    }

    /// Run a quick search and wait for the results page
    pub async fn search_product(&self, term: &str) -> ProbeResult<()> {
        self.page.fill(&self.search_bar, term).await?;
        self.page.click(&self.search_button).await?;
        self.page.wait_for_navigation_idle().await
    }

    pub async fn is_user_logged_in(&self) -> bool {
        self.page.is_visible(&self.welcome_message).await
    }

    pub async fn open_cart(&self) -> ProbeResult<()> {
        self.page.click(&self.cart_icon).await
    }
}

impl PageObject for HomePage {
    fn path(&self) -> &str {
        "/"
    }

    fn page(&self) -> &Page {
        &self.page
    }
}
