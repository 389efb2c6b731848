use super::PageObject;
use crate::constants::CHECKOUT_URL;
use crate::helpers::ShippingInfo;
use crate::locator::Locator;
use crate::page::Page;
use crate::result::ProbeResult;
use crate::wait::ElementState;
use std::time::Duration;

const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);

/// One-page checkout: shipping step, payment step, success page
#[derive(Debug, Clone)]
pub struct CheckoutPage {
    page: Page,
    pub email_input: Locator,
    pub first_name_input: Locator,
    pub last_name_input: Locator,
    pub street_address_input: Locator,
    pub city_input: Locator,
    pub state_select: Locator,
    pub zip_code_input: Locator,
    pub country_select: Locator,
    pub phone_number_input: Locator,
    /// Radio buttons of the shipping-method table
    pub shipping_method_options: Locator,
    /// "Next" on the shipping step
    pub next_button: Locator,
    /// Radio buttons of the payment-method list
    pub payment_methods: Locator,
    pub place_order_button: Locator,
    /// Success page container
    pub order_confirmation: Locator,
    pub order_number: Locator,
    pub continue_shopping_button: Locator,
}

impl CheckoutPage {
    /// Bind to `page`
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self {
            page,
            email_input: Locator::role("textbox", "Email Address * Email Address"),
            first_name_input: Locator::new("input[name=\"firstname\"]"),
            last_name_input: Locator::new("input[name=\"lastname\"]"),
            street_address_input: Locator::new("input[name=\"street[0]\"]"),
            city_input: Locator::new("input[name=\"city\"]"),
            state_select: Locator::new("select[name=\"region_id\"]"),
            zip_code_input: Locator::new("input[name=\"postcode\"]"),
            country_select: Locator::new("select[name=\"country_id\"]"),
            phone_number_input: Locator::new("input[name=\"telephone\"]"),
            shipping_method_options: Locator::new(
                ".table-checkout-shipping-method input[type=\"radio\"]",
            ),
            next_button: Locator::new(".button.action.continue.primary"),
            payment_methods: Locator::new(".payment-method-title input[type=\"radio\"]"),
            place_order_button: Locator::new(".action.primary.checkout"),
            order_confirmation: Locator::new(".checkout-success"),
            order_number: Locator::new(".checkout-success .order-number"),
            continue_shopping_button: Locator::new(".checkout-success .action.primary.continue"),
        }
    }

    /// Fill every field of the shipping address form
    pub async fn fill_shipping_info(&self, info: &ShippingInfo) -> ProbeResult<()> {
        self.page.fill(&self.email_input, &info.email).await?;
        self.page.fill(&self.first_name_input, &info.first_name).await?;
        self.page.fill(&self.last_name_input, &info.last_name).await?;
        self.page.fill(&self.street_address_input, &info.street).await?;
        self.page.fill(&self.city_input, &info.city).await?;
        self.page.select_option(&self.state_select, &info.state_id).await?;
        self.page.fill(&self.zip_code_input, &info.zip_code).await?;
        self.page
            .select_option(&self.country_select, &info.country_id)
            .await?;
        self.page
            .fill(&self.phone_number_input, &info.phone_number)
            .await
    }

    pub async fn select_shipping_method(&self, index: usize) -> ProbeResult<()> {
        self.page.click(&self.shipping_method_options.nth(index)).await
    }

    pub async fn go_to_payment_method(&self) -> ProbeResult<()> {
        self.page.click(&self.next_button).await
    }

    /// Pick payment method `index` once the payment step has rendered
    pub async fn select_payment_method(&self, index: usize) -> ProbeResult<()> {
        self.page
            .wait_for(
                &self.payment_methods.first(),
                ElementState::Visible,
                Some(self.page.expect_timeout()),
            )
            .await?;
        self.page.click(&self.payment_methods.nth(index)).await
    }

    /// Submit the order and wait for the success page
    pub async fn place_order(&self) -> ProbeResult<()> {
        self.page.click(&self.place_order_button).await?;
        self.page
            .wait_for(
                &self.order_confirmation,
                ElementState::Visible,
                Some(CONFIRMATION_TIMEOUT),
            )
            .await
    }

    pub async fn order_number(&self) -> ProbeResult<String> {
        Ok(self.page.get_text(&self.order_number).await?.trim().to_string())
    }

    pub async fn is_order_confirmed(&self) -> bool {
        self.page.is_visible(&self.order_confirmation).await
    }

    /// Shipping form, shipping method, next, place order.
    ///
    /// The demo store preselects its only payment method, so the payment step
    /// is not touched here; call [`Self::select_payment_method`] first on
    /// stores that need it.
    pub async fn complete_checkout(
        &self,
        info: &ShippingInfo,
        shipping_method: usize,
    ) -> ProbeResult<()> {
        self.fill_shipping_info(info).await?;
        self.select_shipping_method(shipping_method).await?;
        self.go_to_payment_method().await?;
        self.place_order().await
    }
}

impl PageObject for CheckoutPage {
    fn path(&self) -> &str {
        CHECKOUT_URL
    }

    fn page(&self) -> &Page {
        &self.page
    }
}
