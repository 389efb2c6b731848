use super::PageObject;
use crate::constants::CART_URL;
use crate::locator::Locator;
use crate::page::Page;
use crate::result::ProbeResult;

/// Shopping cart
#[derive(Debug, Clone)]
pub struct CartPage {
    page: Page,
    pub cart_items: Locator,
    pub cart_item_name: Locator,
    /// Quantity inputs, one per line item
    pub cart_item_qty: Locator,
    pub remove_item_button: Locator,
    pub update_cart_button: Locator,
    pub empty_cart_button: Locator,
    pub cart_subtotal: Locator,
    pub proceed_to_checkout_button: Locator,
    /// "You have no items in your shopping cart."
    pub empty_cart_message: Locator,
    pub continue_shopping: Locator,
    pub discount_code_input: Locator,
    pub apply_discount_code_button: Locator,
}

impl CartPage {
    /// Bind to `page`
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self {
            page,
            cart_items: Locator::new(".cart.item"),
            cart_item_name: Locator::new(".product-item-name"),
            cart_item_qty: Locator::new("[class=\"input-text qty\"]"),
            remove_item_button: Locator::new(".action-delete"),
            update_cart_button: Locator::new(".update"),
            empty_cart_button: Locator::new("#empty_cart_button"),
            cart_subtotal: Locator::new(".subtotal .price"),
            proceed_to_checkout_button: Locator::role("button", "Proceed to Checkout"),
            empty_cart_message: Locator::new(".cart-empty"),
            continue_shopping: Locator::new(".action.continue"),
            discount_code_input: Locator::new("#coupon_code"),
            apply_discount_code_button: Locator::new(".action.apply.primary"),
        }
    }

    /// Line items in the cart, zero when the empty-cart notice shows
    pub async fn items_count(&self) -> ProbeResult<usize> {
        if self.page.is_visible(&self.empty_cart_message).await {
            return Ok(0);
        }
        self.page.count(&self.cart_items).await
    }

    /// Set the quantity of line `index` and press "Update Shopping Cart".
    ///
    /// Returns the quantity the field shows afterwards, `"-1"` when it has no
    /// value.
    pub async fn update_item_quantity(&self, index: usize, quantity: u32) -> ProbeResult<String> {
        let field = self.cart_item_qty.nth(index);
        self.page.fill(&field, &quantity.to_string()).await?;
        self.page.click(&self.update_cart_button).await?;
        self.page.wait_for_navigation_idle().await?;
        let value = self.page.attribute(&field, "value").await?;
        Ok(value.map_or_else(|| "-1".to_string(), |v| v.trim().to_string()))
    }

    pub async fn remove_item(&self, index: usize) -> ProbeResult<()> {
        self.page.click(&self.remove_item_button.nth(index)).await?;
        self.page.wait_for_navigation_idle().await
    }

    /// Clear the cart, confirming the browser dialog. No-op when the button
    /// is not shown.
    pub async fn empty_cart(&self) -> ProbeResult<()> {
        if !self.page.is_visible(&self.empty_cart_button).await {
            return Ok(());
        }
        self.page.accept_dialogs().await?;
        self.page.click(&self.empty_cart_button).await?;
        self.page.wait_for_navigation_idle().await
    }

    pub async fn subtotal(&self) -> ProbeResult<String> {
        self.page.get_text(&self.cart_subtotal).await
    }

    pub async fn proceed_to_checkout(&self) -> ProbeResult<()> {
        self.page.click(&self.proceed_to_checkout_button).await?;
        self.page.wait_for_navigation_idle().await
    }

    pub async fn is_empty(&self) -> bool {
        self.page.is_visible(&self.empty_cart_message).await
    }

    pub async fn apply_discount_code(&self, code: &str) -> ProbeResult<()> {
        self.page.fill(&self.discount_code_input, code).await?;
        self.page.click(&self.apply_discount_code_button).await?;
        self.page.wait_for_navigation_idle().await
    }
}

impl PageObject for CartPage {
    fn path(&self) -> &str {
        CART_URL
    }

    fn page(&self) -> &Page {
        &self.page
    }
}
