//! Locator abstraction for element selection.
//!
//! A [`Locator`] is a plain value: a query descriptor plus an optional index
//! into the matched set. It holds no handle to a DOM node. Every operation on a
//! [`crate::Page`] re-resolves it against the current document, so a locator
//! survives the storefront re-rendering between calls.
//!
//! # Query kinds
//!
//! - **CSS**: `Locator::new("#product-addtocart-button")`
//! - **Role + accessible name**: `Locator::role("button", "Proceed to Checkout")`
//! - **Text**: `Locator::text("The account sign-in was")`
//! - **Label**: `Locator::label("Sort By")`
//! - **XPath**: `Locator::xpath("//div[contains(@class, 'filter-options-content')]//a")`
//! - **CSS filtered by text**: `Locator::new(".nav.item").with_text("My Orders")`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Query expression identifying a set of elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    /// CSS selector (e.g., ".cart.item")
    Css {
        /// Selector text
        selector: String,
    },
    /// ARIA role with accessible name
    Role {
        /// Role name (button, textbox, link, ...)
        role: String,
        /// Accessible name
        name: String,
        /// Require an exact (case-sensitive, whole-string) name match
        exact: bool,
    },
    /// Text content selector
    Text {
        /// Text to find
        text: String,
        /// Require an exact match
        exact: bool,
    },
    /// Form control by its label text
    Label {
        /// Label text
        text: String,
    },
    /// XPath expression
    XPath {
        /// Expression text
        expression: String,
    },
    /// CSS selector filtered by contained text
    CssWithText {
        /// Base CSS selector
        selector: String,
        /// Text the element must contain
        text: String,
    },
}

impl Query {
    /// Create a CSS query
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css {
            selector: selector.into(),
        }
    }

    /// Create a role query with substring name matching
    #[must_use]
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.into(),
            exact: false,
        }
    }

    /// Create a text query with substring matching
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: false,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css { selector } => write!(f, "css={selector}"),
            Self::Role { role, name, exact } => {
                write!(f, "role={role}[name={name:?}")?;
                if *exact {
                    write!(f, " exact")?;
                }
                write!(f, "]")
            }
            Self::Text { text, exact: true } => write!(f, "text={text:?}"),
            Self::Text { text, exact: false } => write!(f, "text={text}"),
            Self::Label { text } => write!(f, "label={text}"),
            Self::XPath { expression } => write!(f, "xpath={expression}"),
            Self::CssWithText { selector, text } => {
                write!(f, "css={selector} >> has-text={text:?}")
            }
        }
    }
}

/// Which element of the matched set a locator targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "pick", content = "at", rename_all = "snake_case")]
pub enum Nth {
    /// The whole matched set; actions use the first match
    #[default]
    All,
    /// First match in document order
    First,
    /// Last match in document order
    Last,
    /// Zero-based index in document order
    Index(usize),
}

impl Nth {
    /// Pick the targeted position out of `len` matches
    #[must_use]
    pub const fn position(self, len: usize) -> Option<usize> {
        match self {
            Self::All | Self::First => {
                if len > 0 {
                    Some(0)
                } else {
                    None
                }
            }
            Self::Last => len.checked_sub(1),
            Self::Index(i) => {
                if i < len {
                    Some(i)
                } else {
                    None
                }
            }
        }
    }
}

/// A deferred, re-resolvable reference to zero or more elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    query: Query,
    nth: Nth,
}

impl Locator {
    /// Create a new locator with a CSS selector
    #[must_use]
    pub fn new(selector: impl Into<String>) -> Self {
        Self::from_query(Query::css(selector))
    }

    /// Create a locator from a query
    #[must_use]
    pub const fn from_query(query: Query) -> Self {
        Self {
            query,
            nth: Nth::All,
        }
    }

    /// Locate by ARIA role and accessible name (case-insensitive substring)
    #[must_use]
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::from_query(Query::role(role, name))
    }

    /// Locate by ARIA role and exact accessible name
    #[must_use]
    pub fn role_exact(role: impl Into<String>, name: impl Into<String>) -> Self {
        Self::from_query(Query::Role {
            role: role.into(),
            name: name.into(),
            exact: true,
        })
    }

    /// Locate by visible text (case-insensitive substring)
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_query(Query::text(text))
    }

    /// Locate by exact visible text
    #[must_use]
    pub fn text_exact(text: impl Into<String>) -> Self {
        Self::from_query(Query::Text {
            text: text.into(),
            exact: true,
        })
    }

    /// Locate a form control by its label
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::from_query(Query::Label { text: text.into() })
    }

    /// Locate by XPath
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::from_query(Query::XPath {
            expression: expression.into(),
        })
    }

    /// Locate by `data-testid` attribute
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::new(format!("[data-testid=\"{}\"]", id.into()))
    }

    /// Filter by text content
    ///
    /// Only CSS locators can be narrowed; other query kinds already carry
    /// their own text matching and are returned unchanged.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        let query = match self.query {
            Query::Css { selector } => Query::CssWithText {
                selector,
                text: text.into(),
            },
            other => other,
        };
        Self {
            query,
            nth: self.nth,
        }
    }

    /// Target the element at `index` (zero-based, document order)
    #[must_use]
    pub fn nth(&self, index: usize) -> Self {
        Self {
            query: self.query.clone(),
            nth: Nth::Index(index),
        }
    }

    /// Target the first match
    #[must_use]
    pub fn first(&self) -> Self {
        Self {
            query: self.query.clone(),
            nth: Nth::First,
        }
    }

    /// Target the last match
    #[must_use]
    pub fn last(&self) -> Self {
        Self {
            query: self.query.clone(),
            nth: Nth::Last,
        }
    }

    /// The unindexed locator (whole matched set)
    #[must_use]
    pub fn all(&self) -> Self {
        Self {
            query: self.query.clone(),
            nth: Nth::All,
        }
    }

    /// Get the query
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Get the index selection
    #[must_use]
    pub const fn index(&self) -> Nth {
        self.nth
    }

    /// JSON descriptor consumed by in-page resolution scripts
    #[must_use]
    pub fn to_descriptor(&self) -> serde_json::Value {
        serde_json::json!({ "query": self.query, "nth": self.nth })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query)?;
        match self.nth {
            Nth::All => Ok(()),
            Nth::First => write!(f, " >> first"),
            Nth::Last => write!(f, " >> last"),
            Nth::Index(i) => write!(f, " >> nth={i}"),
        }
    }
}

impl From<&str> for Locator {
    fn from(selector: &str) -> Self {
        Self::new(selector)
    }
}

/// Bounding box for an element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl BoundingBox {
    /// Create a new bounding box
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the box has no area (rendered elements have a non-empty box)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Whitespace-normalized text match.
///
/// Non-exact matching is a case-insensitive substring test; exact matching
/// compares the normalized strings verbatim.
#[must_use]
pub fn text_matches(haystack: &str, needle: &str, exact: bool) -> bool {
    let hay = normalize_whitespace(haystack);
    let needle = normalize_whitespace(needle);
    if exact {
        hay == needle
    } else {
        hay.to_lowercase().contains(&needle.to_lowercase())
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod query_tests {
        use super::*;

        #[test]
        fn test_display_forms() {
            assert_eq!(Query::css(".cart.item").to_string(), "css=.cart.item");
            assert_eq!(
                Query::role("button", "Sign In").to_string(),
                "role=button[name=\"Sign In\"]"
            );
            assert_eq!(Query::text("You added").to_string(), "text=You added");
            assert_eq!(
                Locator::new(".nav.item").with_text("My Orders").to_string(),
                "css=.nav.item >> has-text=\"My Orders\""
            );
        }

        #[test]
        fn test_descriptor_shape() {
            let desc = Locator::role("button", "Sign In").nth(2).to_descriptor();
            assert_eq!(desc["query"]["kind"], "role");
            assert_eq!(desc["query"]["name"], "Sign In");
            assert_eq!(desc["query"]["exact"], false);
            assert_eq!(desc["nth"]["pick"], "index");
            assert_eq!(desc["nth"]["at"], 2);
        }

        #[test]
        fn test_descriptor_escapes_quotes() {
            let desc = Locator::new(r#"button[title="Create an Account"]"#).to_descriptor();
            let json = desc.to_string();
            assert!(json.contains(r#"button[title=\"Create an Account\"]"#));
            assert_eq!(desc["nth"]["pick"], "all");
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_with_text_narrows_css_only() {
            let narrowed = Locator::new("a").with_text("Reorder");
            assert!(matches!(narrowed.query(), Query::CssWithText { .. }));

            let role = Locator::role("link", "Reorder").with_text("ignored");
            assert!(matches!(role.query(), Query::Role { .. }));
        }

        #[test]
        fn test_indexing_keeps_query() {
            let items = Locator::new(".product-item");
            let third = items.nth(2);
            assert_eq!(third.query(), items.query());
            assert_eq!(third.index(), Nth::Index(2));
            assert_eq!(items.first().index(), Nth::First);
            assert_eq!(third.all().index(), Nth::All);
            assert_eq!(third.to_string(), "css=.product-item >> nth=2");
        }

        #[test]
        fn test_test_id() {
            let loc = Locator::test_id("minicart");
            assert_eq!(loc.query(), &Query::css("[data-testid=\"minicart\"]"));
        }
    }

    mod nth_tests {
        use super::*;

        #[test]
        fn test_positions() {
            assert_eq!(Nth::All.position(3), Some(0));
            assert_eq!(Nth::First.position(0), None);
            assert_eq!(Nth::Last.position(3), Some(2));
            assert_eq!(Nth::Last.position(0), None);
            assert_eq!(Nth::Index(1).position(2), Some(1));
            assert_eq!(Nth::Index(2).position(2), None);
        }
    }

    mod text_match_tests {
        use super::*;

        #[test]
        fn test_substring_is_case_insensitive() {
            assert!(text_matches("  Proceed to\n Checkout ", "proceed to checkout", false));
            assert!(!text_matches("Proceed", "checkout", false));
        }

        #[test]
        fn test_exact_requires_whole_string() {
            assert!(text_matches("Sign  In", "Sign In", true));
            assert!(!text_matches("Sign In Now", "Sign In", true));
            assert!(!text_matches("sign in", "Sign In", true));
        }
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(BoundingBox::new(0.0, 0.0, 0.0, 10.0).is_empty());
        assert!(!BoundingBox::new(5.0, 5.0, 10.0, 10.0).is_empty());
    }
}
