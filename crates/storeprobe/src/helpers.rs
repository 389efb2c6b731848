//! Small utilities shared by journeys: price parsing, date formatting,
//! generated customers and session cleanup.

use crate::constants::{DEFAULT_COUNTRY, DEFAULT_PASSWORD, DEFAULT_STATE_ID};
use crate::locator::Locator;
use crate::page::Page;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::poll_until;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

fn number_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\d+(?:[.,]\d+)?").ok())
        .as_ref()
}

/// First number in `text`, accepting `.` or `,` as the decimal separator.
///
/// `"$45.99"` → `45.99`, `"Qty: 3"` → `3.0`, no digits → `0.0`.
#[must_use]
pub fn extract_number(text: &str) -> f64 {
    number_pattern()
        .and_then(|re| re.find(text))
        .and_then(|m| m.as_str().replace(',', ".").parse().ok())
        .unwrap_or(0.0)
}

/// `MM/DD/YYYY`
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{:04}", date.month(), date.day(), date.year())
}

/// Unique throwaway address so registrations never collide
#[must_use]
pub fn unique_email() -> String {
    format!("user{}@testemail.com", Uuid::new_v4().simple())
}

/// Generated storefront customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Login e-mail
    pub email: String,
    /// Login password
    pub password: String,
    /// Ten-digit phone number
    pub phone_number: String,
}

impl Customer {
    /// Customer with a unique e-mail and the default password
    #[must_use]
    pub fn generate() -> Self {
        let id = Uuid::new_v4();
        let digits = format!("{:010}", id.as_u128() % 10_000_000_000);
        Self {
            first_name: "Jordan".to_string(),
            last_name: "Tester".to_string(),
            email: format!("user{}@testemail.com", id.simple()),
            password: DEFAULT_PASSWORD.to_string(),
            phone_number: digits,
        }
    }

    /// "First Last"
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Shipping form contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    /// Contact e-mail
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Street line 1
    pub street: String,
    /// City
    pub city: String,
    /// Region option value
    pub state_id: String,
    /// Postal code
    pub zip_code: String,
    /// Country option value
    pub country_id: String,
    /// Phone
    pub phone_number: String,
}

impl ShippingInfo {
    /// US address for `customer`
    #[must_use]
    pub fn for_customer(customer: &Customer) -> Self {
        Self {
            email: customer.email.clone(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            street: "742 Evergreen Terrace".to_string(),
            city: "Sacramento".to_string(),
            state_id: DEFAULT_STATE_ID.to_string(),
            zip_code: "95814".to_string(),
            country_id: DEFAULT_COUNTRY.to_string(),
            phone_number: customer.phone_number.clone(),
        }
    }

    /// US address for a freshly generated guest
    #[must_use]
    pub fn generate() -> Self {
        Self::for_customer(&Customer::generate())
    }
}

/// Require the text of `locator` to contain `expected` within the page's
/// expect timeout, returning the text that matched.
///
/// A missing element or other text counts as "not yet". When the budget runs
/// out the failure is an [`ProbeError::Assertion`] quoting the last text seen.
pub async fn assert_element_contains_text(
    page: &Page,
    locator: &Locator,
    expected: &str,
) -> ProbeResult<String> {
    let what = format!("{locator} to contain {expected:?}");
    let outcome = poll_until(&what, page.wait_options(page.expect_timeout()), || async move {
        match page.get_text(locator).await {
            Ok(text) if text.contains(expected) => Ok(Some(text)),
            Ok(_) | Err(ProbeError::NotFound { .. }) => Ok(None),
            Err(other) => Err(other),
        }
    })
    .await;

    match outcome {
        Err(ProbeError::Timeout { .. }) => {
            let text = page.get_text(locator).await.unwrap_or_default();
            Err(ProbeError::assertion(format!(
                "{locator} does not contain {expected:?} (was {text:?})"
            )))
        }
        other => other,
    }
}

/// Drop cookies plus local and session storage
pub async fn cleanup_session(page: &Page) -> ProbeResult<()> {
    page.driver().reset_storage().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod number_tests {
        use super::*;

        #[test]
        fn test_extract_number() {
            assert!((extract_number("$45.99") - 45.99).abs() < f64::EPSILON);
            assert!((extract_number("12,50 €") - 12.5).abs() < f64::EPSILON);
            assert!((extract_number("Qty: 3 items") - 3.0).abs() < f64::EPSILON);
            assert!(extract_number("free").abs() < f64::EPSILON);
            assert!(extract_number("").abs() < f64::EPSILON);
        }

        #[test]
        fn test_extract_first_number_only() {
            assert!((extract_number("Items 1-12 of 48") - 1.0).abs() < f64::EPSILON);
        }

        proptest! {
            #[test]
            fn prop_price_round_trip(dollars in 0u32..100_000, cents in 0u32..100) {
                let text = format!("${dollars}.{cents:02}");
                let expected = f64::from(dollars) + f64::from(cents) / 100.0;
                prop_assert!((extract_number(&text) - expected).abs() < 1e-9);
            }

            #[test]
            fn prop_no_digits_is_zero(text in "[a-zA-Z $€:]{0,24}") {
                prop_assert!(extract_number(&text).abs() < f64::EPSILON);
            }
        }
    }

    mod date_tests {
        use super::*;

        #[test]
        fn test_format_date_pads() {
            let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
            assert_eq!(format_date(date), "03/07/2024");
            let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
            assert_eq!(format_date(date), "12/31/1999");
        }
    }

    mod data_tests {
        use super::*;

        #[test]
        fn test_unique_email() {
            let a = unique_email();
            let b = unique_email();
            assert_ne!(a, b);
            assert!(a.starts_with("user") && a.ends_with("@testemail.com"));
        }

        #[test]
        fn test_generated_customer() {
            let customer = Customer::generate();
            assert_eq!(customer.password, DEFAULT_PASSWORD);
            assert_eq!(customer.phone_number.len(), 10);
            assert!(customer.phone_number.chars().all(|c| c.is_ascii_digit()));
            assert_eq!(customer.full_name(), "Jordan Tester");
            assert_ne!(customer.email, Customer::generate().email);
        }

        #[test]
        fn test_shipping_defaults() {
            let customer = Customer::generate();
            let info = ShippingInfo::for_customer(&customer);
            assert_eq!(info.email, customer.email);
            assert_eq!(info.state_id, DEFAULT_STATE_ID);
            assert_eq!(info.country_id, "US");
        }
    }
}
