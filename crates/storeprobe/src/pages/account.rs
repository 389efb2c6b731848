use super::PageObject;
use crate::constants::ACCOUNT_URL;
use crate::locator::Locator;
use crate::page::Page;
use crate::result::ProbeResult;
use crate::wait::ElementState;

fn nav_item(label: &str) -> Locator {
    Locator::new(".nav.item").with_text(label)
}

/// Customer account area: dashboard, sidebar navigation, account edit form
#[derive(Debug, Clone)]
pub struct AccountPage {
    page: Page,
    /// Dashboard heading
    pub dashboard_title: Locator,
    /// Contact information box (name + e-mail)
    pub welcome_message: Locator,
    pub my_account_link: Locator,
    pub my_orders_link: Locator,
    pub my_downloadable_products_link: Locator,
    pub my_wishlist_link: Locator,
    pub address_book_link: Locator,
    pub account_info_link: Locator,
    pub payment_methods_link: Locator,
    pub newsletter_subscriptions_link: Locator,
    pub billing_agreements_link: Locator,
    pub my_product_reviews_link: Locator,
    /// Rows of the orders table
    pub order_rows: Locator,
    /// "Change Password" checkbox on the edit form
    pub change_password_checkbox: Locator,
    pub current_password_input: Locator,
    pub new_password_input: Locator,
    pub confirm_new_password_input: Locator,
    pub first_name_input: Locator,
    pub save_button: Locator,
    pub success_message: Locator,
}

impl AccountPage {
    /// Bind to `page`
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self {
            page,
            dashboard_title: Locator::new(".page-title"),
            welcome_message: Locator::new(".box-information .box-content p"),
            my_account_link: nav_item("My Account"),
            my_orders_link: nav_item("My Orders"),
            my_downloadable_products_link: nav_item("My Downloadable Products"),
            my_wishlist_link: nav_item("My Wish List"),
            address_book_link: nav_item("Address Book"),
            account_info_link: nav_item("Account Information"),
            payment_methods_link: nav_item("Stored Payment Methods"),
            newsletter_subscriptions_link: nav_item("Newsletter Subscriptions"),
            billing_agreements_link: nav_item("Billing Agreements"),
            my_product_reviews_link: nav_item("My Product Reviews"),
            order_rows: Locator::new(".table-order-items tr"),
            change_password_checkbox: Locator::new("#change-password"),
            current_password_input: Locator::new("#current-password"),
            new_password_input: Locator::new("#password"),
            confirm_new_password_input: Locator::new("#password-confirmation"),
            first_name_input: Locator::new("#firstname"),
            save_button: Locator::new("button.save"),
            success_message: Locator::new(".message-success"),
        }
    }

    /// Current page heading
    pub async fn title(&self) -> ProbeResult<String> {
        self.page.get_text(&self.dashboard_title).await
    }

    pub async fn welcome_message(&self) -> ProbeResult<String> {
        self.page.get_text(&self.welcome_message).await
    }

    pub async fn navigate_to_my_orders(&self) -> ProbeResult<()> {
        self.follow(&self.my_orders_link).await
    }

    /// Rows in the orders table; zero when none render within the expect timeout
    pub async fn order_count(&self) -> ProbeResult<usize> {
        self.page
            .probe_count(&self.order_rows, self.page.expect_timeout())
            .await
    }

    pub async fn navigate_to_account_information(&self) -> ProbeResult<()> {
        self.follow(&self.account_info_link).await
    }

    /// Change the password through the account edit form and wait for the
    /// confirmation banner
    pub async fn change_password(&self, current: &str, new: &str) -> ProbeResult<()> {
        self.navigate_to_account_information().await?;
        self.page.click(&self.change_password_checkbox).await?;
        self.page.fill(&self.current_password_input, current).await?;
        self.page.fill(&self.new_password_input, new).await?;
        self.page.fill(&self.confirm_new_password_input, new).await?;
        self.page.click(&self.save_button).await?;
        self.page
            .wait_for(&self.success_message, ElementState::Visible, None)
            .await
    }

    /// Replace the first name on the account edit form and save
    pub async fn update_first_name(&self, first_name: &str) -> ProbeResult<()> {
        self.page.fill(&self.first_name_input, first_name).await?;
        self.page.click(&self.save_button).await?;
        self.page.wait_for_navigation_idle().await
    }

    pub async fn success_message(&self) -> ProbeResult<String> {
        self.page.get_text(&self.success_message).await
    }

    pub async fn navigate_to_address_book(&self) -> ProbeResult<()> {
        self.follow(&self.address_book_link).await
    }

    pub async fn navigate_to_my_wishlist(&self) -> ProbeResult<()> {
        self.follow(&self.my_wishlist_link).await
    }

    pub async fn navigate_to_newsletter_subscriptions(&self) -> ProbeResult<()> {
        self.follow(&self.newsletter_subscriptions_link).await
    }

    async fn follow(&self, link: &Locator) -> ProbeResult<()> {
        self.page.click(link).await?;
        self.page.wait_for_navigation_idle().await
    }
}

impl PageObject for AccountPage {
    fn path(&self) -> &str {
        ACCOUNT_URL
    }

    fn page(&self) -> &Page {
        &self.page
    }
}
