use super::PageObject;
use crate::constants::SEARCH_URL;
use crate::locator::Locator;
use crate::page::Page;
use crate::result::ProbeResult;
use crate::wait::ElementState;

/// Quick-search results listing
#[derive(Debug, Clone)]
pub struct SearchResultsPage {
    page: Page,
    pub product_items: Locator,
    pub product_titles: Locator,
    pub product_prices: Locator,
    /// "Sort By" select
    pub sort_by_dropdown: Locator,
    pub filter_sidebar: Locator,
    /// "Your search returned no results."
    pub no_results_message: Locator,
    pub page_title: Locator,
    /// Toolbar item count
    pub items_count: Locator,
}

impl SearchResultsPage {
    /// Bind to `page`
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self {
            page,
            product_items: Locator::new(".product-item"),
            product_titles: Locator::new(".product-item-link"),
            product_prices: Locator::new(".price-wrapper .price"),
            sort_by_dropdown: Locator::label("Sort By"),
            filter_sidebar: Locator::new(".filter-options"),
            no_results_message: Locator::new(".message.notice"),
            page_title: Locator::new(".page-title"),
            items_count: Locator::new(".toolbar-number"),
        }
    }

    /// Wait for the first result, then count them all
    pub async fn results_count(&self) -> ProbeResult<usize> {
        self.page
            .wait_for(&self.product_items.first(), ElementState::Visible, None)
            .await?;
        self.page.count(&self.product_items).await
    }

    pub async fn title(&self) -> ProbeResult<String> {
        self.page.get_text(&self.page_title).await
    }

    pub async fn has_no_results(&self) -> bool {
        self.page.is_visible(&self.no_results_message).await
    }

    /// Titles of every listed product, in order
    pub async fn product_titles(&self) -> ProbeResult<Vec<String>> {
        let count = self.page.count(&self.product_titles).await?;
        let mut titles = Vec::with_capacity(count);
        for i in 0..count {
            titles.push(self.page.get_text(&self.product_titles.nth(i)).await?);
        }
        Ok(titles)
    }

    /// Choose a sort order (option value such as `price`) and wait for the
    /// reloaded listing
    pub async fn sort_by(&self, option: &str) -> ProbeResult<()> {
        self.page.select_option(&self.sort_by_dropdown, option).await?;
        self.page
            .wait_for_url_matching(&format!("product_list_order={}", regex::escape(option)))
            .await
    }

    /// Expand filter `category` when collapsed and pick `value`
    pub async fn apply_filter(&self, category: &str, value: &str) -> ProbeResult<()> {
        let heading = Locator::new(".filter-options-item [data-role=\"title\"]").with_text(category);
        if self.page.is_visible(&heading).await {
            self.page.click(&heading).await?;
        }
        let option = Locator::xpath(format!(
            "//div[contains(@class, \"filter-options-content\")]//a[contains(., \"{value}\")]"
        ));
        self.page.click(&option).await?;
        self.page.wait_for_navigation_idle().await
    }

    pub async fn click_product(&self, index: usize) -> ProbeResult<()> {
        self.page.click(&self.product_titles.nth(index)).await?;
        self.page.wait_for_navigation_idle().await
    }

    pub async fn total_items_count(&self) -> ProbeResult<String> {
        self.page.get_text(&self.items_count).await
    }
}

impl PageObject for SearchResultsPage {
    fn path(&self) -> &str {
        SEARCH_URL
    }

    fn page(&self) -> &Page {
        &self.page
    }
}
