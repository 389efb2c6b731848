use super::PageObject;
use async_trait::async_trait;
use crate::locator::Locator;
use crate::page::Page;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::ElementState;

/// Options for [`ProductPage::add_to_cart`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddToCart {
    /// Quantity; only applied when greater than one
    pub quantity: Option<u32>,
    /// Size swatch label (e.g. "M")
    pub size: Option<String>,
    /// Colour swatch index
    pub color: Option<usize>,
}

impl AddToCart {
    /// Defaults: one item, no swatches
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    #[must_use]
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    #[must_use]
    pub const fn color(mut self, index: usize) -> Self {
        self.color = Some(index);
        self
    }
}

/// Product detail page
#[derive(Debug, Clone)]
pub struct ProductPage {
    page: Page,
    pub product_title: Locator,
    pub product_price: Locator,
    pub product_description: Locator,
    pub add_to_cart_button: Locator,
    pub quantity_input: Locator,
    pub size_options: Locator,
    pub color_options: Locator,
    /// "You added ... to your shopping cart."
    pub success_message: Locator,
    pub reviews_tab: Locator,
    pub add_to_wishlist_button: Locator,
    pub add_to_compare_button: Locator,
}

impl ProductPage {
    /// Bind to `page`
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self {
            page,
            product_title: Locator::new(".page-title"),
            product_price: Locator::new(".product-info-price .price"),
            product_description: Locator::new(".product.attribute.description"),
            add_to_cart_button: Locator::new("#product-addtocart-button"),
            quantity_input: Locator::new("#qty"),
            size_options: Locator::new(".swatch-option.text"),
            color_options: Locator::new(".swatch-option.color"),
            success_message: Locator::new("[data-ui-id=\"message-success\"]"),
            reviews_tab: Locator::new("#tab-label-reviews-title"),
            add_to_wishlist_button: Locator::new(".towishlist"),
            add_to_compare_button: Locator::new(".tocompare"),
        }
    }

    pub async fn title(&self) -> ProbeResult<String> {
        self.page.get_text(&self.product_title).await
    }

    pub async fn price(&self) -> ProbeResult<String> {
        self.page.get_text(&self.product_price).await
    }

    pub async fn set_quantity(&self, quantity: u32) -> ProbeResult<()> {
        self.page
            .fill(&self.quantity_input, &quantity.to_string())
            .await
    }

    pub async fn select_size(&self, size: &str) -> ProbeResult<()> {
        self.page
            .click(&Locator::new(".swatch-option.text").with_text(size))
            .await
    }

    pub async fn select_color(&self, index: usize) -> ProbeResult<()> {
        self.page.click(&self.color_options.nth(index)).await
    }

    /// Apply `options`, press "Add to Cart" and wait for the confirmation.
    ///
    /// Swatch choices are skipped on products that have no swatches.
    pub async fn add_to_cart(&self, options: &AddToCart) -> ProbeResult<()> {
        if let Some(quantity) = options.quantity.filter(|q| *q > 1) {
            self.set_quantity(quantity).await?;
        }
        if let Some(size) = &options.size {
            if self.page.count(&self.size_options).await? > 0 {
                self.select_size(size).await?;
            }
        }
        if let Some(index) = options.color {
            if self.page.count(&self.color_options).await? > 0 {
                self.select_color(index).await?;
            }
        }

        self.page.click(&self.add_to_cart_button).await?;
        self.page
            .wait_for(
                &self.success_message,
                ElementState::Visible,
                Some(self.page.expect_timeout()),
            )
            .await
    }

    pub async fn success_message(&self) -> ProbeResult<String> {
        self.page.get_text(&self.success_message).await
    }
}

#[async_trait]
impl PageObject for ProductPage {
    /// Product URLs are slugs; there is no fixed path to open
    fn path(&self) -> &str {
        "/"
    }

    fn page(&self) -> &Page {
        &self.page
    }

    /// Products are reached through search or a listing, never by path
    async fn open(&self) -> ProbeResult<()> {
        Err(ProbeError::config(
            "ProductPage has no fixed URL; open a product from a listing",
        ))
    }

    async fn is_current(&self) -> bool {
        self.page.is_visible(&self.add_to_cart_button).await
    }
}
