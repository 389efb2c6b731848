//! Actionability checks.
//!
//! Before an action is dispatched the target is polled until it passes the
//! checks that action requires:
//!
//! | Check      | click | fill | select | get_text | forced click |
//! |------------|-------|------|--------|----------|--------------|
//! | attached   | ✓     | ✓    | ✓      | ✓        | ✓            |
//! | visible    | ✓     | ✓    | ✓      |          |              |
//! | stable     | ✓     |      |        |          |              |
//! | enabled    | ✓     | ✓    | ✓      |          |              |
//! | hit target | ✓     |      |        |          |              |
//! | editable   |       | ✓    |        |          |              |
//!
//! When the budget runs out the *last observed* blocker is reported, so a
//! click on a hidden button fails with `NotVisible` rather than a bare
//! `Timeout`.

use crate::driver::{ElementSnapshot, StoreDriver};
use crate::locator::{BoundingBox, Locator};
use crate::result::{ProbeError, ProbeResult};
use std::time::Duration;
use tokio::time::Instant;

/// Which checks an action requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checks {
    /// Element rendered
    pub visible: bool,
    /// Bounding box unchanged across two consecutive polls
    pub stable: bool,
    /// Not disabled
    pub enabled: bool,
    /// Receives pointer events at its center
    pub hit_target: bool,
    /// Accepts text input
    pub editable: bool,
}

impl Checks {
    /// Presence only
    pub const ATTACHED: Self = Self {
        visible: false,
        stable: false,
        enabled: false,
        hit_target: false,
        editable: false,
    };

    /// Checks for a normal click
    pub const CLICK: Self = Self {
        visible: true,
        stable: true,
        enabled: true,
        hit_target: true,
        editable: false,
    };

    /// Checks for filling a text field
    pub const FILL: Self = Self {
        visible: true,
        stable: false,
        enabled: true,
        hit_target: false,
        editable: true,
    };

    /// Checks for choosing a `<select>` option
    pub const SELECT: Self = Self {
        visible: true,
        stable: false,
        enabled: true,
        hit_target: false,
        editable: false,
    };
}

/// Why an element is not actionable yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    /// Locator resolves to nothing
    Missing,
    /// Present but not rendered
    Hidden,
    /// Bounding box still changing
    Moving,
    /// Disabled control
    Disabled,
    /// Another element receives the pointer at the target's center
    Obscured,
    /// Visible and enabled but not a text field
    NotEditable,
}

impl Blocker {
    /// Blockers that waiting cannot clear
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::NotEditable)
    }

    /// Human-readable reason
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Missing => "no matching element",
            Self::Hidden => "element is not visible",
            Self::Moving => "element is not stable",
            Self::Disabled => "element is disabled",
            Self::Obscured => "another element would receive the click",
            Self::NotEditable => "element is not an editable field",
        }
    }

    /// Convert into the typed error for `locator`
    #[must_use]
    pub fn into_error(self, locator: &Locator) -> ProbeError {
        let locator = locator.to_string();
        match self {
            Self::Missing => ProbeError::NotFound { locator },
            Self::Hidden => ProbeError::NotVisible { locator },
            Self::Moving | Self::Disabled | Self::Obscured | Self::NotEditable => {
                ProbeError::NotInteractable {
                    locator,
                    reason: self.reason().to_string(),
                }
            }
        }
    }
}

/// Evaluate one snapshot against `checks`.
///
/// `previous` is the bounding box seen on the prior poll; stability needs two
/// identical consecutive boxes.
#[must_use]
pub fn evaluate(
    snapshot: &ElementSnapshot,
    previous: Option<&BoundingBox>,
    checks: Checks,
) -> Result<(), Blocker> {
    if !snapshot.found {
        return Err(Blocker::Missing);
    }
    if checks.visible && !snapshot.visible {
        return Err(Blocker::Hidden);
    }
    if checks.stable {
        let settled = matches!(
            (snapshot.bounds.as_ref(), previous),
            (Some(now), Some(before)) if now == before
        );
        if !settled {
            return Err(Blocker::Moving);
        }
    }
    if checks.enabled && !snapshot.enabled {
        return Err(Blocker::Disabled);
    }
    if checks.editable && !snapshot.editable {
        return Err(Blocker::NotEditable);
    }
    if checks.hit_target && !snapshot.hit_target {
        return Err(Blocker::Obscured);
    }
    Ok(())
}

/// Poll the driver until the target passes `checks`, returning the passing
/// snapshot.
pub async fn wait_until_actionable(
    driver: &dyn StoreDriver,
    locator: &Locator,
    checks: Checks,
    timeout: Duration,
    poll_interval: Duration,
) -> ProbeResult<ElementSnapshot> {
    let deadline = Instant::now() + timeout;
    let mut previous: Option<BoundingBox> = None;
    let mut blocker = Blocker::Missing;

    loop {
        match driver.snapshot(locator).await {
            Ok(snapshot) => match evaluate(&snapshot, previous.as_ref(), checks) {
                Ok(()) => return Ok(snapshot),
                Err(b) if b.is_terminal() => return Err(b.into_error(locator)),
                Err(b) => {
                    blocker = b;
                    previous = snapshot.bounds;
                }
            },
            Err(err) if err.is_transient() => {
                tracing::debug!(%locator, error = %err, "document changed, retrying");
                previous = None;
            }
            Err(other) => return Err(other),
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::debug!(%locator, reason = blocker.reason(), "actionability budget exhausted");
            return Err(blocker.into_error(locator));
        }

        // The stability check only needs one more frame, not a full poll.
        let pause = if blocker == Blocker::Moving && previous.is_some() {
            Duration::from_millis(16).min(poll_interval)
        } else {
            poll_interval
        };
        tokio::time::sleep(pause.min(deadline - now)).await;
    }
}
