//! StoreDriver - Abstract Browser Capability
//!
//! The interaction layer never talks to a browser directly. Everything it
//! needs from the outside world goes through [`StoreDriver`]:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Page (resilient interaction layer)                           │
//! │    click / fill / get_text / is_visible / wait_for_*          │
//! ├───────────────────────────────────────────────────────────────┤
//! │  actionability (poll snapshots until actionable)              │
//! ├───────────────────────────────────────────────────────────────┤
//! │  StoreDriver (this trait)                                     │
//! │  ┌─────────────────────┐     ┌─────────────────────┐          │
//! │  │  ChromiumDriver     │     │  FakeDriver         │          │
//! │  │  (feature browser)  │     │  (scripted, tests)  │          │
//! │  └─────────────────────┘     └─────────────────────┘          │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Drivers report state; they do not wait. `dispatch_*` methods act once on
//! the element the locator resolves to *right now*.

use crate::locator::{BoundingBox, Locator};
use crate::result::ProbeResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Point-in-time state of the element a locator targets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Size of the whole matched set (ignores the locator's index)
    pub matched: usize,
    /// Whether the targeted element exists
    pub found: bool,
    /// Rendered with a non-empty box and not hidden by style
    pub visible: bool,
    /// Not disabled
    pub enabled: bool,
    /// Accepts typed text (input, textarea, contenteditable) and is not read-only
    pub editable: bool,
    /// The element (or a descendant) is the hit target at its own center point
    pub hit_target: bool,
    /// Bounding box when rendered
    pub bounds: Option<BoundingBox>,
    /// Text content (`None` when the node has no text)
    pub text: Option<String>,
}

impl ElementSnapshot {
    /// Snapshot for a locator that resolved to nothing
    #[must_use]
    pub fn missing(matched: usize) -> Self {
        Self {
            matched,
            ..Self::default()
        }
    }
}

/// Document readiness, ordered from least to most loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    /// Document is still being parsed
    Loading,
    /// Structural parse complete (`DOMContentLoaded` fired)
    Interactive,
    /// All subresources loaded (`load` fired)
    Complete,
}

impl ReadyState {
    /// Parse `document.readyState`
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "complete" => Self::Complete,
            "interactive" => Self::Interactive,
            _ => Self::Loading,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Loading => "loading",
            Self::Interactive => "interactive",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Network activity counters for quiet-window detection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkActivity {
    /// Requests currently in flight
    pub in_flight: usize,
    /// Requests completed since the document was created
    pub completed: u64,
}

impl NetworkActivity {
    /// No request in flight
    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        self.in_flight == 0
    }
}

/// Browser capability surface consumed by the interaction layer.
///
/// One driver instance backs exactly one session; implementations use
/// interior mutability so a [`crate::Page`] can be cloned freely within that
/// session.
#[async_trait]
pub trait StoreDriver: Send + Sync + fmt::Debug {
    /// Navigate to an absolute URL
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Current document URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Document title
    async fn title(&self) -> ProbeResult<String>;

    /// Document readiness
    async fn ready_state(&self) -> ProbeResult<ReadyState>;

    /// Network activity counters
    async fn network_activity(&self) -> ProbeResult<NetworkActivity>;

    /// Number of elements the locator's query matches
    async fn count(&self, locator: &Locator) -> ProbeResult<usize>;

    /// Current state of the targeted element
    async fn snapshot(&self, locator: &Locator) -> ProbeResult<ElementSnapshot>;

    /// Click the targeted element once.
    ///
    /// A normal click is delivered at the element's center point; a forced
    /// click is dispatched on the element itself regardless of what covers it.
    async fn dispatch_click(&self, locator: &Locator, force: bool) -> ProbeResult<()>;

    /// Clear the targeted field and type `text`
    async fn dispatch_fill(&self, locator: &Locator, text: &str) -> ProbeResult<()>;

    /// Select the option with the given value (or label) in a `<select>`
    async fn dispatch_select(&self, locator: &Locator, value: &str) -> ProbeResult<()>;

    /// Read an attribute of the targeted element
    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>>;

    /// Auto-accept confirm/alert dialogs raised by the page from now on
    async fn accept_dialogs(&self) -> ProbeResult<()>;

    /// Full-page PNG screenshot
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Clear cookies plus local and session storage for this session
    async fn reset_storage(&self) -> ProbeResult<()>;

    /// Release the browser resources behind this session
    async fn close(&self) -> ProbeResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state_ordering() {
        assert!(ReadyState::Loading < ReadyState::Interactive);
        assert!(ReadyState::Interactive < ReadyState::Complete);
    }

    #[test]
    fn test_ready_state_parse() {
        assert_eq!(ReadyState::parse("complete"), ReadyState::Complete);
        assert_eq!(ReadyState::parse("interactive"), ReadyState::Interactive);
        assert_eq!(ReadyState::parse("loading"), ReadyState::Loading);
        assert_eq!(ReadyState::parse(""), ReadyState::Loading);
        assert_eq!(ReadyState::Interactive.to_string(), "interactive");
    }

    #[test]
    fn test_missing_snapshot() {
        let snap = ElementSnapshot::missing(0);
        assert!(!snap.found);
        assert!(!snap.visible);
        assert!(snap.text.is_none());
    }

    #[test]
    fn test_network_quiet() {
        assert!(NetworkActivity::default().is_quiet());
        assert!(!NetworkActivity {
            in_flight: 2,
            completed: 7
        }
        .is_quiet());
    }
}
