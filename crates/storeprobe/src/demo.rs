//! Scripted demo storefront.
//!
//! A [`FakeDriver`] laid out like the Luma theme the page objects target:
//! home, quick search, product detail, cart, one-page checkout, login,
//! registration and the customer account area. Shopping state lives in
//! cookies (`cart`, `customer`, `results`), so clearing storage empties the
//! cart and logs the customer out, exactly like the real store.
//!
//! Every built-in journey passes against it, which makes it the target for
//! offline runs (`storeprobe run --offline`) and for the integration tests.

use crate::constants::{
    errors, success, ACCOUNT_EDIT_URL, ACCOUNT_URL, CART_URL, CHECKOUT_URL, DEFAULT_COUNTRY,
    DEFAULT_PASSWORD, DEFAULT_STATE_ID, LOGIN_URL, NO_RESULTS_TERM, REGISTER_URL, SEARCH_URL,
};
use crate::fake::{Effect, FakeDriver, FakeElement, FakePage, VALUE_PLACEHOLDER};
use std::time::Duration;

/// Origin the demo storefront answers on
pub const DEMO_ORIGIN: &str = "https://demo.storeprobe.test";

/// Path of the product every result links to
pub const PRODUCT_PATH: &str = "/radiant-tee.html";

/// Name of the demo product
pub const PRODUCT_NAME: &str = "Radiant Tee";

/// Price of the demo product
pub const PRODUCT_PRICE: &str = "$22.00";

/// Order number shown on the success page
pub const ORDER_NUMBER: &str = "000031337";

const SUCCESS_URL: &str = "/checkout/onepage/success/";

/// Cookie holding the cart contents
pub const CART_COOKIE: &str = "cart";
/// Cookie marking a signed-in customer
pub const CUSTOMER_COOKIE: &str = "customer";
const RESULTS_COOKIE: &str = "results";

/// Listing in ascending price order; the first entry is the one outside the
/// price filter
const LISTING: &[(&str, &str)] = &[
    (PRODUCT_NAME, PRODUCT_PRICE),
    ("Proteus Fitness Jackshirt", "$45.00"),
    ("Montana Wind Jacket", "$49.00"),
];

const SIZES: &[&str] = &["XS", "S", "M", "L", "XL"];

/// Filter heading and option the demo listing offers
pub const PRICE_FILTER: (&str, &str) = ("Price", "$40.00 - $49.99");

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// The demo storefront at [`DEMO_ORIGIN`], loaded on the home page
#[must_use]
pub fn storefront() -> FakeDriver {
    storefront_at(DEMO_ORIGIN)
}

/// The demo storefront at `origin`
#[must_use]
pub fn storefront_at(origin: &str) -> FakeDriver {
    FakeDriver::new(origin)
        .with_page(home())
        .with_page(search_results())
        .with_page(product())
        .with_page(cart())
        .with_page(checkout())
        .with_page(checkout_success())
        .with_page(login())
        .with_page(register())
        .with_page(account())
        .with_page(account_edit())
        .with_page(account_section("/sales/order/history/", "My Orders"))
        .with_page(account_section("/customer/address/new/", "Add New Address"))
        .with_page(account_section("/wishlist/", "My Wish List"))
        .with_page(account_section("/newsletter/manage/", "Newsletter Subscription"))
        .start_at("/")
}

fn header(page: FakePage) -> FakePage {
    page.element(
        FakeElement::new("sign-in-link")
            .css(".authorization-link a")
            .text("Sign In")
            .unless_cookie(CUSTOMER_COOKIE)
            .on_click(Effect::navigate(LOGIN_URL)),
    )
    .element(
        FakeElement::new("create-account-link")
            .css("a")
            .text("Create an Account")
            .unless_cookie(CUSTOMER_COOKIE)
            .on_click(Effect::navigate(REGISTER_URL)),
    )
    .element(
        FakeElement::new("welcome")
            .css(".greet.welcome")
            .text("Welcome, Jordan Tester!")
            .requires_cookie(CUSTOMER_COOKIE),
    )
    .element(
        FakeElement::new("account-menu")
            .css(".action.switch")
            .requires_cookie(CUSTOMER_COOKIE),
    )
    .element(FakeElement::input("search").label("Search").on_change(Effect::when_value(
        "search",
        NO_RESULTS_TERM,
        vec![Effect::clear_cookie(RESULTS_COOKIE)],
        vec![Effect::set_cookie(RESULTS_COOKIE, "1")],
    )))
    .element(
        FakeElement::new("search-button")
            .css("button[title=\"Search\"]")
            .on_click(Effect::navigate(format!("{SEARCH_URL}?q={VALUE_PLACEHOLDER}")))
            .on_click(Effect::set_text(
                "results-title",
                format!("Search results for: '{VALUE_PLACEHOLDER}'"),
            )),
    )
    .element(
        FakeElement::new("minicart")
            .css(".minicart-wrapper .action.showcart")
            .on_click(Effect::navigate(CART_URL)),
    )
    .element(
        FakeElement::new("cart-counter")
            .css(".counter-number")
            .text("1")
            .requires_cookie(CART_COOKIE),
    )
}

fn home() -> FakePage {
    header(FakePage::new("/").title("Home Page"))
}

fn search_results() -> FakePage {
    let (filter_heading, filter_value) = PRICE_FILTER;
    let mut page = header(
        FakePage::new(SEARCH_URL)
            .title("Search results")
            .busy_until(ms(60)),
    )
    .element(
        FakeElement::new("results-title")
            .css(".page-title")
            .text("Search results"),
    )
    .element(
        FakeElement::new("no-results")
            .css(".message.notice")
            .text("Your search returned no results.")
            .unless_cookie(RESULTS_COOKIE),
    )
    .element(
        FakeElement::new("toolbar-count")
            .css(".toolbar-number")
            .text(LISTING.len().to_string())
            .requires_cookie(RESULTS_COOKIE),
    )
    .element(
        FakeElement::new("sorter")
            .css("#sorter")
            .label("Sort By")
            .options(["relevance", "name", "price"])
            .value("relevance")
            .requires_cookie(RESULTS_COOKIE)
            .on_change(Effect::navigate(format!(
                "{SEARCH_URL}?product_list_order={VALUE_PLACEHOLDER}"
            ))),
    )
    .element(
        FakeElement::new("price-filter")
            .css(".filter-options-item [data-role=\"title\"]")
            .text(filter_heading)
            .requires_cookie(RESULTS_COOKIE)
            .on_click(Effect::show("price-filter-option")),
    )
    .element(
        FakeElement::new("price-filter-option")
            .css(format!(
                "//div[contains(@class, \"filter-options-content\")]//a[contains(., \"{filter_value}\")]"
            ))
            .text(filter_value)
            .hidden()
            .requires_cookie(RESULTS_COOKIE)
            .on_click(Effect::navigate(format!("{SEARCH_URL}?price=40-50")))
            .on_click(Effect::remove("item-0"))
            .on_click(Effect::remove("item-link-0"))
            .on_click(Effect::remove("item-price-0")),
    );

    for (i, (name, price)) in LISTING.iter().enumerate() {
        page = page
            .element(
                FakeElement::new(format!("item-{i}"))
                    .css(".product-item")
                    .text(*name)
                    .requires_cookie(RESULTS_COOKIE)
                    // Results fade in after the listing request.
                    .appear_after(ms(40)),
            )
            .element(
                FakeElement::new(format!("item-link-{i}"))
                    .css(".product-item-link")
                    .text(*name)
                    .requires_cookie(RESULTS_COOKIE)
                    .appear_after(ms(40))
                    .on_click(Effect::navigate(PRODUCT_PATH)),
            )
            .element(
                FakeElement::new(format!("item-price-{i}"))
                    .css(".price-wrapper .price")
                    .text(*price)
                    .requires_cookie(RESULTS_COOKIE)
                    .appear_after(ms(40)),
            );
    }
    page
}

fn product() -> FakePage {
    let mut page = header(
        FakePage::new(PRODUCT_PATH)
            .title(PRODUCT_NAME)
            .dom_ready_after(ms(20)),
    )
    .element(FakeElement::new("product-title").css(".page-title").text(PRODUCT_NAME))
    .element(
        FakeElement::new("product-price")
            .css(".product-info-price .price")
            .text(PRODUCT_PRICE),
    )
    .element(
        FakeElement::new("description")
            .css(".product.attribute.description")
            .text("So light and comfy, you'll love the Radiant Tee's organic fabric."),
    )
    .element(FakeElement::input("qty").value("1"))
    .element(
        FakeElement::new("product-addtocart-button")
            .role("button", "Add to Cart")
            // Swatch scripts finish initialising before the button is usable.
            .covered_until(ms(80))
            .on_click(Effect::set_cookie(CART_COOKIE, "radiant-tee"))
            .on_click(Effect::Busy(ms(50)))
            .on_click(Effect::show("add-success")),
    )
    .element(
        FakeElement::new("add-success")
            .css("[data-ui-id=\"message-success\"]")
            .text(format!(
                "{} {PRODUCT_NAME} to your shopping cart.",
                success::ADDED_TO_CART
            ))
            .hidden(),
    );

    for size in SIZES {
        page = page.element(
            FakeElement::new(format!("size-{size}"))
                .css(".swatch-option.text")
                .text(*size),
        );
    }
    for (i, colour) in ["Blue", "Orange", "Purple"].iter().enumerate() {
        page = page.element(
            FakeElement::new(format!("colour-{i}"))
                .css(".swatch-option.color")
                .attr("option-label", *colour),
        );
    }
    page
}

fn cart() -> FakePage {
    header(FakePage::new(CART_URL).title("Shopping Cart"))
        .element(
            FakeElement::new("cart-item")
                .css(".cart.item")
                .requires_cookie(CART_COOKIE),
        )
        .element(
            FakeElement::new("cart-item-name")
                .css(".product-item-name")
                .text(PRODUCT_NAME)
                .requires_cookie(CART_COOKIE),
        )
        .element(
            FakeElement::input("cart-qty")
                .css("[class=\"input-text qty\"]")
                .value("1")
                .requires_cookie(CART_COOKIE),
        )
        .element(
            FakeElement::new("update-cart")
                .css(".update")
                .text("Update Shopping Cart")
                .requires_cookie(CART_COOKIE)
                .on_click(Effect::navigate(CART_URL)),
        )
        .element(
            FakeElement::new("remove-item")
                .css(".action-delete")
                .requires_cookie(CART_COOKIE)
                .on_click(Effect::clear_cookie(CART_COOKIE))
                .on_click(Effect::navigate(CART_URL)),
        )
        .element(
            FakeElement::new("empty_cart_button")
                .requires_cookie(CART_COOKIE)
                .on_click(Effect::Confirm(vec![
                    Effect::clear_cookie(CART_COOKIE),
                    Effect::navigate(CART_URL),
                ])),
        )
        .element(
            FakeElement::new("subtotal")
                .css(".subtotal .price")
                .text(PRODUCT_PRICE)
                .requires_cookie(CART_COOKIE),
        )
        .element(
            FakeElement::new("proceed-to-checkout")
                .role("button", "Proceed to Checkout")
                .requires_cookie(CART_COOKIE)
                .on_click(Effect::navigate(CHECKOUT_URL)),
        )
        .element(
            FakeElement::new("coupon_code")
                .editable()
                .requires_cookie(CART_COOKIE),
        )
        .element(
            FakeElement::new("apply-coupon")
                .css(".action.apply.primary")
                .requires_cookie(CART_COOKIE)
                .on_click(Effect::navigate(CART_URL)),
        )
        .element(
            FakeElement::new("cart-empty")
                .css(".cart-empty")
                .text("You have no items in your shopping cart.")
                .unless_cookie(CART_COOKIE),
        )
}

fn checkout() -> FakePage {
    let field = |name: &str| {
        FakeElement::input(format!("shipping-{name}")).css(format!("input[name=\"{name}\"]"))
    };
    FakePage::new(CHECKOUT_URL)
        .title("Checkout")
        .dom_ready_after(ms(30))
        .load_after(ms(60))
        .busy_until(ms(90))
        .element(
            FakeElement::input("customer-email")
                .role("textbox", "Email Address * Email Address"),
        )
        .element(field("firstname"))
        .element(field("lastname"))
        .element(field("street[0]"))
        .element(field("city"))
        .element(
            FakeElement::new("region")
                .css("select[name=\"region_id\"]")
                .options(["1", DEFAULT_STATE_ID, "43"]),
        )
        .element(field("postcode"))
        .element(
            FakeElement::new("country")
                .css("select[name=\"country_id\"]")
                .options([DEFAULT_COUNTRY, "CA", "GB"])
                .value(DEFAULT_COUNTRY),
        )
        .element(field("telephone"))
        .element(
            FakeElement::new("shipping-flat")
                .css(".table-checkout-shipping-method input[type=\"radio\"]"),
        )
        .element(
            FakeElement::new("shipping-best-way")
                .css(".table-checkout-shipping-method input[type=\"radio\"]"),
        )
        .element(
            FakeElement::new("shipping-next")
                .css(".button.action.continue.primary")
                .on_click(Effect::Busy(ms(40)))
                .on_click(Effect::show("payment-checkmo"))
                .on_click(Effect::show("place-order")),
        )
        .element(
            FakeElement::new("payment-checkmo")
                .css(".payment-method-title input[type=\"radio\"]")
                .hidden(),
        )
        .element(
            FakeElement::new("place-order")
                .css(".action.primary.checkout")
                .hidden()
                .on_click(Effect::clear_cookie(CART_COOKIE))
                .on_click(Effect::navigate(SUCCESS_URL)),
        )
}

fn checkout_success() -> FakePage {
    FakePage::new(SUCCESS_URL)
        .title("Success Page")
        .element(
            FakeElement::new("checkout-success")
                .css(".checkout-success")
                .text(format!(
                    "{} Your order # is: {ORDER_NUMBER}.",
                    success::ORDER_PLACED
                )),
        )
        .element(
            FakeElement::new("order-number")
                .css(".checkout-success .order-number")
                .text(format!(" {ORDER_NUMBER} ")),
        )
        .element(
            FakeElement::new("continue-shopping")
                .css(".checkout-success .action.primary.continue")
                .on_click(Effect::navigate("/")),
        )
}

fn login() -> FakePage {
    header(FakePage::new(LOGIN_URL).title("Customer Login"))
        .element(FakeElement::input("email"))
        .element(FakeElement::input("pass").css("[title=\"Password\"]"))
        .element(
            FakeElement::new("send2")
                .role("button", "Sign In")
                .on_click(Effect::when_value(
                    "pass",
                    DEFAULT_PASSWORD,
                    vec![
                        Effect::set_cookie(CUSTOMER_COOKIE, "1"),
                        Effect::navigate(ACCOUNT_URL),
                    ],
                    vec![Effect::show("login-error")],
                )),
        )
        .element(
            FakeElement::new("forgot-password")
                .css("a")
                .text("Forgot Your Password?"),
        )
        .element(
            FakeElement::new("login-error")
                .css(".message-error")
                .text(errors::LOGIN_FAILED)
                .hidden(),
        )
}

fn register() -> FakePage {
    header(FakePage::new(REGISTER_URL).title("Create New Customer Account"))
        .element(FakeElement::input("firstname"))
        .element(FakeElement::input("lastname"))
        .element(FakeElement::input("email_address"))
        .element(FakeElement::input("password"))
        .element(FakeElement::input("password-confirmation"))
        .element(
            FakeElement::new("create-account")
                .css("button[title=\"Create an Account\"]")
                .on_click(Effect::set_cookie(CUSTOMER_COOKIE, "1"))
                .on_click(Effect::navigate(ACCOUNT_URL))
                .on_click(Effect::Busy(ms(40)))
                .on_click(Effect::set_text(
                    "account-message",
                    format!("{} Main Website Store.", success::REGISTRATION),
                ))
                .on_click(Effect::show("account-message")),
        )
}

/// Sidebar shared by every account page
fn account_nav(page: FakePage) -> FakePage {
    const LINKS: &[(&str, &str)] = &[
        ("My Account", ACCOUNT_URL),
        ("My Orders", "/sales/order/history/"),
        ("My Wish List", "/wishlist/"),
        ("Address Book", "/customer/address/new/"),
        ("Account Information", ACCOUNT_EDIT_URL),
        ("Newsletter Subscriptions", "/newsletter/manage/"),
    ];
    LINKS.iter().fold(page, |page, (label, path)| {
        page.element(
            FakeElement::new(format!("nav-{}", label.to_lowercase().replace(' ', "-")))
                .css(".nav.item")
                .text(*label)
                .on_click(Effect::navigate(*path)),
        )
    })
}

fn account() -> FakePage {
    account_nav(header(FakePage::new(ACCOUNT_URL).title("My Account")))
        .element(FakeElement::new("account-title").css(".page-title").text("My Account"))
        .element(
            FakeElement::new("contact-info")
                .css(".box-information .box-content p")
                .text("Jordan Tester"),
        )
        .element(
            FakeElement::new("account-message")
                .css(".message-success")
                .hidden(),
        )
}

fn account_edit() -> FakePage {
    account_nav(header(
        FakePage::new(ACCOUNT_EDIT_URL).title("Edit Account Information"),
    ))
    .element(
        FakeElement::new("edit-title")
            .css(".page-title")
            .text("Edit Account Information"),
    )
    .element(FakeElement::input("firstname").value("Jordan"))
    .element(
        FakeElement::new("change-password")
            .on_click(Effect::show("current-password"))
            .on_click(Effect::show("password"))
            .on_click(Effect::show("password-confirmation")),
    )
    .element(FakeElement::input("current-password").hidden())
    .element(FakeElement::input("password").hidden())
    .element(FakeElement::input("password-confirmation").hidden())
    .element(
        FakeElement::new("save")
            .css("button.save")
            .on_click(Effect::navigate(ACCOUNT_URL))
            .on_click(Effect::set_text("account-message", success::ACCOUNT_SAVED))
            .on_click(Effect::show("account-message")),
    )
}

fn account_section(path: &str, title: &str) -> FakePage {
    account_nav(header(FakePage::new(path).title(title)))
        .element(FakeElement::new("section-title").css(".page-title").text(title))
        .element(FakeElement::new("orders-table").css(".table-order-items"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::StoreDriver;
    use crate::locator::Locator;

    #[tokio::test]
    async fn test_starts_on_home() {
        let driver = storefront();
        assert_eq!(driver.title().await.unwrap(), "Home Page");
        assert_eq!(driver.current_url().await.unwrap(), format!("{DEMO_ORIGIN}/"));
    }

    #[tokio::test]
    async fn test_cart_follows_cookie() {
        let driver = storefront();
        driver.navigate(&format!("{DEMO_ORIGIN}{CART_URL}")).await.unwrap();
        assert_eq!(driver.count(&Locator::new(".cart.item")).await.unwrap(), 0);
        assert_eq!(driver.count(&Locator::new(".cart-empty")).await.unwrap(), 1);

        driver.set_cookie(CART_COOKIE, "radiant-tee");
        assert_eq!(driver.count(&Locator::new(".cart.item")).await.unwrap(), 1);
        assert_eq!(driver.count(&Locator::new(".cart-empty")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_wrong_password_shows_error() {
        let driver = storefront();
        driver.navigate(&format!("{DEMO_ORIGIN}{LOGIN_URL}")).await.unwrap();
        driver
            .dispatch_fill(&Locator::new("[title=\"Password\"]"), "nope")
            .await
            .unwrap();
        driver
            .dispatch_click(&Locator::role("button", "Sign In"), false)
            .await
            .unwrap();
        let error = driver
            .snapshot(&Locator::text("The account sign-in was"))
            .await
            .unwrap();
        assert!(error.visible);
        assert!(driver.cookie(CUSTOMER_COOKIE).is_none());
    }
}
