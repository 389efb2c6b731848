//! Storefront routes, fixture values and the messages journeys assert on.

/// Sign-in form
pub const LOGIN_URL: &str = "/customer/account/login/";
/// Registration form
pub const REGISTER_URL: &str = "/customer/account/create/";
/// Account dashboard
pub const ACCOUNT_URL: &str = "/customer/account/";
/// Account information form
pub const ACCOUNT_EDIT_URL: &str = "/customer/account/edit/";
/// Shopping cart
pub const CART_URL: &str = "/checkout/cart/";
/// Checkout
pub const CHECKOUT_URL: &str = "/checkout/";
/// Quick search results
pub const SEARCH_URL: &str = "/catalogsearch/result/";

/// Pause for CSS transitions (swatches, minicart)
pub const ANIMATION_TIMEOUT_MS: u64 = 500;

/// Password used for generated customers
pub const DEFAULT_PASSWORD: &str = "Test@123456";
/// Country used for shipping
pub const DEFAULT_COUNTRY: &str = "US";
/// Region label used for shipping
pub const DEFAULT_STATE: &str = "California";
/// Region id for California
pub const DEFAULT_STATE_ID: &str = "12";

/// Search term no catalog matches
pub const NO_RESULTS_TERM: &str = "xyznonexistentproduct123";

/// Search terms known to return results
pub const SEARCH_TERMS: &[&str] = &["shirt", "jacket", "pants", "shoes", "bag", "watch", "hoodie"];

/// Top-level catalog categories
pub mod categories {
    /// Men
    pub const MEN: &str = "Men";
    /// Women
    pub const WOMEN: &str = "Women";
    /// Gear
    pub const GEAR: &str = "Gear";
    /// Training
    pub const TRAINING: &str = "Training";
    /// Sale
    pub const SALE: &str = "Sale";
}

/// Validation and failure messages
pub mod errors {
    /// Empty required input
    pub const REQUIRED_FIELD: &str = "This is a required field.";
    /// Malformed e-mail
    pub const INVALID_EMAIL: &str = "Please enter a valid email address.";
    /// Password too short
    pub const INVALID_PASSWORD: &str =
        "Minimum length of this field must be equal or greater than 8 symbols.";
    /// Rejected credentials
    pub const LOGIN_FAILED: &str = "The account sign-in was incorrect or your account is disabled temporarily. Please wait and try again later.";
}

/// Confirmation messages
pub mod success {
    /// Registration finished (prefix of the full message)
    pub const REGISTRATION: &str = "Thank you for registering with";
    /// Product added to the cart (prefix)
    pub const ADDED_TO_CART: &str = "You added";
    /// Order placed
    pub const ORDER_PLACED: &str = "Thank you for your purchase!";
    /// Account information saved
    pub const ACCOUNT_SAVED: &str = "You saved the account information.";
}
