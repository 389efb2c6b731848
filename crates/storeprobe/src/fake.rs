//! Scripted in-memory storefront.
//!
//! [`FakeDriver`] implements [`StoreDriver`] over a set of [`FakePage`]s whose
//! elements change state on a timeline measured from the moment the page was
//! loaded. Clicks, fills and selects run [`Effect`]s (navigate, show, hide,
//! set cookies...), which is enough to script whole shopping journeys without a
//! browser.
//!
//! ```
//! use std::time::Duration;
//! use storeprobe::fake::{Effect, FakeDriver, FakeElement, FakePage};
//!
//! let driver = FakeDriver::new("https://shop.test")
//!     .with_page(
//!         FakePage::new("/checkout/cart/")
//!             .title("Shopping Cart")
//!             .element(
//!                 FakeElement::new("proceed")
//!                     .role("button", "Proceed to Checkout")
//!                     .covered_until(Duration::from_millis(200))
//!                     .on_click(Effect::navigate("/checkout/")),
//!             ),
//!     )
//!     .with_page(FakePage::new("/checkout/").title("Checkout"))
//!     .start_at("/checkout/cart/");
//! assert_eq!(driver.calls().len(), 0);
//! ```

use crate::driver::{ElementSnapshot, NetworkActivity, ReadyState, StoreDriver};
use crate::locator::{text_matches, BoundingBox, Locator, Query};
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// PNG signature returned as the fake screenshot payload
pub const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Placeholder in navigation targets and texts, replaced by the value that
/// triggered the effect (for clicks: the value most recently typed or selected)
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// State change triggered by an interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Load another page (path relative to the origin, may carry a query)
    Navigate(String),
    /// Make an element visible now
    Show(String),
    /// Hide an element (stays attached)
    Hide(String),
    /// Detach an element
    Remove(String),
    /// Replace an element's text
    SetText(String, String),
    /// Set a cookie
    SetCookie(String, String),
    /// Delete a cookie
    ClearCookie(String),
    /// Keep one request in flight for the given duration
    Busy(Duration),
    /// Raise a confirm dialog; the effects run only if dialogs are accepted
    Confirm(Vec<Effect>),
    /// Branch on the current value of a field
    WhenValue {
        /// Element id of the field
        field: String,
        /// Expected value
        equals: String,
        /// Effects when the value matches
        then: Vec<Effect>,
        /// Effects otherwise
        otherwise: Vec<Effect>,
    },
}

impl Effect {
    /// Navigate to `path`
    pub fn navigate(path: impl Into<String>) -> Self {
        Self::Navigate(path.into())
    }

    /// Show element `id`
    pub fn show(id: impl Into<String>) -> Self {
        Self::Show(id.into())
    }

    /// Hide element `id`
    pub fn hide(id: impl Into<String>) -> Self {
        Self::Hide(id.into())
    }

    /// Remove element `id`
    pub fn remove(id: impl Into<String>) -> Self {
        Self::Remove(id.into())
    }

    /// Set text of element `id`
    pub fn set_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::SetText(id.into(), text.into())
    }

    /// Set cookie `name`
    pub fn set_cookie(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::SetCookie(name.into(), value.into())
    }

    /// Clear cookie `name`
    pub fn clear_cookie(name: impl Into<String>) -> Self {
        Self::ClearCookie(name.into())
    }

    /// Branch on a field value
    pub fn when_value(
        field: impl Into<String>,
        equals: impl Into<String>,
        then: Vec<Self>,
        otherwise: Vec<Self>,
    ) -> Self {
        Self::WhenValue {
            field: field.into(),
            equals: equals.into(),
            then,
            otherwise,
        }
    }
}

/// One scripted element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeElement {
    id: String,
    css: Vec<String>,
    role: Option<(String, String)>,
    label: Option<String>,
    text: Option<String>,
    value: String,
    attributes: BTreeMap<String, String>,
    options: Vec<String>,
    enabled: bool,
    editable: bool,
    hidden: bool,
    removed: bool,
    appear_after: Duration,
    vanish_after: Option<Duration>,
    covered_until: Option<Duration>,
    moving_until: Option<Duration>,
    requires_cookie: Option<String>,
    unless_cookie: Option<String>,
    on_click: Vec<Effect>,
    on_change: Vec<Effect>,
}

impl FakeElement {
    /// New visible, enabled, non-editable element. `id` is also matched as `#id`.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            css: vec![format!("#{id}")],
            id,
            role: None,
            label: None,
            text: None,
            value: String::new(),
            attributes: BTreeMap::new(),
            options: Vec::new(),
            enabled: true,
            editable: false,
            hidden: false,
            removed: false,
            appear_after: Duration::ZERO,
            vanish_after: None,
            covered_until: None,
            moving_until: None,
            requires_cookie: None,
            unless_cookie: None,
            on_click: Vec::new(),
            on_change: Vec::new(),
        }
    }

    /// Text input shorthand
    pub fn input(id: impl Into<String>) -> Self {
        Self::new(id).editable()
    }

    /// Element id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Also match this selector (CSS or XPath text, compared verbatim)
    #[must_use]
    pub fn css(mut self, selector: impl Into<String>) -> Self {
        self.css.push(selector.into());
        self
    }

    /// ARIA role and accessible name
    #[must_use]
    pub fn role(mut self, role: impl Into<String>, name: impl Into<String>) -> Self {
        self.role = Some((role.into(), name.into()));
        self
    }

    /// Associated label text
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Text content
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Initial field value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// `<select>` options
    #[must_use]
    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Accept typed text
    #[must_use]
    pub const fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    /// Disabled control
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Attached but not rendered until shown
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Attach only after `delay`
    #[must_use]
    pub const fn appear_after(mut self, delay: Duration) -> Self {
        self.appear_after = delay;
        self
    }

    /// Detach after `delay`
    #[must_use]
    pub const fn vanish_after(mut self, delay: Duration) -> Self {
        self.vanish_after = Some(delay);
        self
    }

    /// Another element sits on top until `delay`
    #[must_use]
    pub const fn covered_until(mut self, delay: Duration) -> Self {
        self.covered_until = Some(delay);
        self
    }

    /// Bounding box keeps changing until `delay`
    #[must_use]
    pub const fn moving_until(mut self, delay: Duration) -> Self {
        self.moving_until = Some(delay);
        self
    }

    /// Present only while cookie `name` is set
    #[must_use]
    pub fn requires_cookie(mut self, name: impl Into<String>) -> Self {
        self.requires_cookie = Some(name.into());
        self
    }

    /// Present only while cookie `name` is absent
    #[must_use]
    pub fn unless_cookie(mut self, name: impl Into<String>) -> Self {
        self.unless_cookie = Some(name.into());
        self
    }

    /// Effect run on click
    #[must_use]
    pub fn on_click(mut self, effect: Effect) -> Self {
        self.on_click.push(effect);
        self
    }

    /// Effect run after fill or select
    #[must_use]
    pub fn on_change(mut self, effect: Effect) -> Self {
        self.on_change.push(effect);
        self
    }

    fn present(&self, elapsed: Duration, cookies: &HashMap<String, String>) -> bool {
        !self.removed
            && elapsed >= self.appear_after
            && self.vanish_after.map_or(true, |t| elapsed < t)
            && self
                .requires_cookie
                .as_ref()
                .map_or(true, |c| cookies.contains_key(c))
            && self
                .unless_cookie
                .as_ref()
                .map_or(true, |c| !cookies.contains_key(c))
    }

    fn matches(&self, query: &Query) -> bool {
        match query {
            Query::Css { selector } => self.css.iter().any(|c| c == selector),
            Query::XPath { expression } => self.css.iter().any(|c| c == expression),
            Query::Role { role, name, exact } => self.role.as_ref().is_some_and(|(r, n)| {
                r.eq_ignore_ascii_case(role) && (name.is_empty() || text_matches(n, name, *exact))
            }),
            Query::Text { text, exact } => self
                .text
                .as_deref()
                .is_some_and(|t| text_matches(t, text, *exact)),
            Query::Label { text } => self
                .label
                .as_deref()
                .is_some_and(|l| text_matches(l, text, false)),
            Query::CssWithText { selector, text } => {
                self.css.iter().any(|c| c == selector)
                    && self
                        .text
                        .as_deref()
                        .is_some_and(|t| text_matches(t, text, false))
            }
        }
    }
}

/// One scripted document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakePage {
    path: String,
    title: String,
    elements: Vec<FakeElement>,
    dom_ready_after: Duration,
    load_after: Duration,
    busy_until: Duration,
    redirect: Option<(Duration, String)>,
}

impl FakePage {
    /// Page served at `path` (query strings are ignored when routing)
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: String::new(),
            elements: Vec::new(),
            dom_ready_after: Duration::ZERO,
            load_after: Duration::ZERO,
            busy_until: Duration::ZERO,
            redirect: None,
        }
    }

    /// Document title
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Append an element (document order follows insertion order)
    #[must_use]
    pub fn element(mut self, element: FakeElement) -> Self {
        self.elements.push(element);
        self
    }

    /// `DOMContentLoaded` fires after `delay`
    #[must_use]
    pub const fn dom_ready_after(mut self, delay: Duration) -> Self {
        self.dom_ready_after = delay;
        self
    }

    /// `load` fires after `delay`
    #[must_use]
    pub const fn load_after(mut self, delay: Duration) -> Self {
        self.load_after = delay;
        self
    }

    /// One request stays in flight until `delay`
    #[must_use]
    pub const fn busy_until(mut self, delay: Duration) -> Self {
        self.busy_until = delay;
        self
    }

    /// Client-side redirect to `path` after `delay`
    #[must_use]
    pub fn redirect_after(mut self, delay: Duration, path: impl Into<String>) -> Self {
        self.redirect = Some((delay, path.into()));
        self
    }

    fn blank(path: &str) -> Self {
        Self::new(path).title("404 Not Found")
    }

    fn element_mut(&mut self, id: &str) -> Option<&mut FakeElement> {
        self.elements.iter_mut().find(|e| e.id == id)
    }
}

#[derive(Debug)]
struct FakeState {
    origin: String,
    pages: HashMap<String, FakePage>,
    current: FakePage,
    url: String,
    loaded_at: Instant,
    cookies: HashMap<String, String>,
    local_storage: HashMap<String, String>,
    accept_dialogs: bool,
    closed: bool,
    calls: Vec<String>,
    last_input: Option<String>,
}

impl FakeState {
    fn elapsed(&self) -> Duration {
        self.loaded_at.elapsed()
    }

    /// Route `target` (absolute URL or origin-relative path) to a page
    fn load(&mut self, target: &str) {
        // Persist mutations of the page being left.
        let leaving = std::mem::replace(&mut self.current, FakePage::new(""));
        if !leaving.path.is_empty() {
            self.pages.insert(leaving.path.clone(), leaving);
        }

        let path = target.strip_prefix(self.origin.as_str()).unwrap_or(target);
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let route = path.split(['?', '#']).next().unwrap_or("/").to_string();

        self.current = self
            .pages
            .get(&route)
            .or_else(|| self.pages.get(route.trim_end_matches('/')))
            .or_else(|| self.pages.get(&format!("{}/", route.trim_end_matches('/'))))
            .cloned()
            .unwrap_or_else(|| FakePage::blank(&route));
        self.url = format!("{}{}", self.origin, path);
        self.loaded_at = Instant::now();
    }

    /// Apply a pending client-side redirect
    fn settle(&mut self) {
        let due = self
            .current
            .redirect
            .as_ref()
            .filter(|(delay, _)| self.elapsed() >= *delay)
            .map(|(_, path)| path.clone());
        if let Some(path) = due {
            self.current.redirect = None;
            self.load(&path);
        }
    }

    fn ensure_open(&self) -> ProbeResult<()> {
        if self.closed {
            Err(ProbeError::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// Indices of present elements matching the query, in document order
    fn matching(&self, query: &Query) -> Vec<usize> {
        let elapsed = self.elapsed();
        self.current
            .elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.present(elapsed, &self.cookies) && e.matches(query))
            .map(|(i, _)| i)
            .collect()
    }

    fn target(&self, locator: &Locator) -> (usize, Option<usize>) {
        let matched = self.matching(locator.query());
        let index = locator.index().position(matched.len()).map(|p| matched[p]);
        (matched.len(), index)
    }

    fn require(&self, locator: &Locator) -> ProbeResult<usize> {
        self.target(locator).1.ok_or_else(|| ProbeError::NotFound {
            locator: locator.to_string(),
        })
    }

    fn snapshot(&self, locator: &Locator) -> ElementSnapshot {
        let (matched, index) = self.target(locator);
        let Some(index) = index else {
            return ElementSnapshot::missing(matched);
        };
        let element = &self.current.elements[index];
        let elapsed = self.elapsed();
        let visible = !element.hidden;
        let moving = element.moving_until.is_some_and(|t| elapsed < t);
        let bounds = visible.then(|| {
            let x = if moving { elapsed.as_millis() as f32 } else { 0.0 };
            BoundingBox::new(x, 40.0 * index as f32, 200.0, 32.0)
        });
        ElementSnapshot {
            matched,
            found: true,
            visible,
            enabled: element.enabled,
            editable: element.editable && element.enabled,
            hit_target: element.covered_until.map_or(true, |t| elapsed >= t),
            bounds,
            text: element.text.clone(),
        }
    }

    fn apply(&mut self, effects: &[Effect], value: Option<&str>) {
        for effect in effects {
            match effect {
                Effect::Navigate(path) => {
                    let path = match value {
                        Some(v) => path.replace(VALUE_PLACEHOLDER, v),
                        None => path.clone(),
                    };
                    self.load(&path);
                }
                Effect::Show(id) => {
                    let elapsed = self.elapsed();
                    if let Some(e) = self.current.element_mut(id) {
                        e.hidden = false;
                        e.removed = false;
                        e.appear_after = e.appear_after.min(elapsed);
                        e.vanish_after = None;
                    }
                }
                Effect::Hide(id) => {
                    if let Some(e) = self.current.element_mut(id) {
                        e.hidden = true;
                    }
                }
                Effect::Remove(id) => {
                    if let Some(e) = self.current.element_mut(id) {
                        e.removed = true;
                    }
                }
                Effect::SetText(id, text) => {
                    let text = match value {
                        Some(v) => text.replace(VALUE_PLACEHOLDER, v),
                        None => text.clone(),
                    };
                    if let Some(e) = self.current.element_mut(id) {
                        e.text = Some(text);
                    }
                }
                Effect::SetCookie(name, v) => {
                    self.cookies.insert(name.clone(), v.clone());
                }
                Effect::ClearCookie(name) => {
                    self.cookies.remove(name);
                }
                Effect::Busy(duration) => {
                    self.current.busy_until = self.elapsed() + *duration;
                }
                Effect::Confirm(inner) => {
                    self.calls.push("dialog confirm".to_string());
                    if self.accept_dialogs {
                        self.apply(inner, value);
                    }
                }
                Effect::WhenValue {
                    field,
                    equals,
                    then,
                    otherwise,
                } => {
                    let current = self
                        .current
                        .elements
                        .iter()
                        .find(|e| &e.id == field)
                        .map(|e| e.value.clone());
                    if current.as_deref() == Some(equals.as_str()) {
                        self.apply(then, value);
                    } else {
                        self.apply(otherwise, value);
                    }
                }
            }
        }
    }
}

/// In-memory [`StoreDriver`]
#[derive(Debug)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    /// Empty storefront at `origin` (e.g. `https://shop.test`)
    pub fn new(origin: impl Into<String>) -> Self {
        let origin = origin.into().trim_end_matches('/').to_string();
        Self {
            state: Mutex::new(FakeState {
                url: format!("{origin}/"),
                origin,
                pages: HashMap::new(),
                current: FakePage::new(""),
                loaded_at: Instant::now(),
                cookies: HashMap::new(),
                local_storage: HashMap::new(),
                accept_dialogs: false,
                closed: false,
                calls: Vec::new(),
                last_input: None,
            }),
        }
    }

    /// Register a page
    #[must_use]
    pub fn with_page(self, page: FakePage) -> Self {
        self.lock().pages.insert(page.path.clone(), page);
        self
    }

    /// Load `path` as the current document without recording a call
    #[must_use]
    pub fn start_at(self, path: &str) -> Self {
        self.lock().load(path);
        self
    }

    /// Recorded driver calls, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Recorded calls starting with `prefix`
    pub fn calls_matching(&self, prefix: &str) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Number of forced clicks dispatched
    pub fn forced_clicks(&self) -> usize {
        self.calls_matching("click(force)").len()
    }

    /// Current value of field `id` on the current page
    pub fn value_of(&self, id: &str) -> Option<String> {
        self.lock()
            .current
            .elements
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.value.clone())
    }

    /// Cookie value
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.lock().cookies.get(name).cloned()
    }

    /// Seed a cookie
    pub fn set_cookie(&self, name: &str, value: &str) {
        self.lock().cookies.insert(name.to_string(), value.to_string());
    }

    /// Seed a local-storage entry
    pub fn set_local_storage(&self, key: &str, value: &str) {
        self.lock()
            .local_storage
            .insert(key.to_string(), value.to_string());
    }

    /// Whether any cookie or storage entry remains
    pub fn has_storage(&self) -> bool {
        let state = self.lock();
        !state.cookies.is_empty() || !state.local_storage.is_empty()
    }

    /// Whether `close` was called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock, reject closed sessions, apply pending redirects
    fn live(&self) -> ProbeResult<MutexGuard<'_, FakeState>> {
        let mut state = self.lock();
        state.ensure_open()?;
        state.settle();
        Ok(state)
    }
}

#[async_trait]
impl StoreDriver for FakeDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        let mut state = self.live()?;
        state.calls.push(format!("navigate {url}"));
        state.load(url);
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.live()?.url.clone())
    }

    async fn title(&self) -> ProbeResult<String> {
        Ok(self.live()?.current.title.clone())
    }

    async fn ready_state(&self) -> ProbeResult<ReadyState> {
        let state = self.live()?;
        let elapsed = state.elapsed();
        Ok(if elapsed < state.current.dom_ready_after {
            ReadyState::Loading
        } else if elapsed < state.current.load_after {
            ReadyState::Interactive
        } else {
            ReadyState::Complete
        })
    }

    async fn network_activity(&self) -> ProbeResult<NetworkActivity> {
        let state = self.live()?;
        let busy = state.elapsed() < state.current.busy_until;
        Ok(NetworkActivity {
            in_flight: usize::from(busy),
            completed: u64::from(!busy && !state.current.busy_until.is_zero()),
        })
    }

    async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        Ok(self.live()?.matching(locator.query()).len())
    }

    async fn snapshot(&self, locator: &Locator) -> ProbeResult<ElementSnapshot> {
        Ok(self.live()?.snapshot(locator))
    }

    async fn dispatch_click(&self, locator: &Locator, force: bool) -> ProbeResult<()> {
        let mut state = self.live()?;
        let index = state.require(locator)?;
        let kind = if force { "click(force)" } else { "click" };
        state.calls.push(format!("{kind} {locator}"));

        let element = &state.current.elements[index];
        let covered = element
            .covered_until
            .is_some_and(|t| state.elapsed() < t);
        if !element.enabled || (covered && !force) {
            // The event never reaches the element.
            return Ok(());
        }
        let effects = element.on_click.clone();
        let value = state.last_input.clone();
        state.apply(&effects, value.as_deref());
        Ok(())
    }

    async fn dispatch_fill(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        let mut state = self.live()?;
        let index = state.require(locator)?;
        state.calls.push(format!("fill {locator} = {text}"));

        let element = &mut state.current.elements[index];
        if !element.editable {
            return Err(ProbeError::NotInteractable {
                locator: locator.to_string(),
                reason: "element is not an editable field".to_string(),
            });
        }
        element.value = text.to_string();
        let effects = element.on_change.clone();
        state.last_input = Some(text.to_string());
        state.apply(&effects, Some(text));
        Ok(())
    }

    async fn dispatch_select(&self, locator: &Locator, value: &str) -> ProbeResult<()> {
        let mut state = self.live()?;
        let index = state.require(locator)?;
        state.calls.push(format!("select {locator} = {value}"));

        let element = &mut state.current.elements[index];
        if !element.options.is_empty() && !element.options.iter().any(|o| o == value) {
            return Err(ProbeError::NotInteractable {
                locator: locator.to_string(),
                reason: format!("no option {value:?}"),
            });
        }
        element.value = value.to_string();
        let effects = element.on_change.clone();
        state.last_input = Some(value.to_string());
        state.apply(&effects, Some(value));
        Ok(())
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        let state = self.live()?;
        let index = state.require(locator)?;
        let element = &state.current.elements[index];
        if name == "value" {
            return Ok(Some(element.value.clone()));
        }
        Ok(element.attributes.get(name).cloned())
    }

    async fn accept_dialogs(&self) -> ProbeResult<()> {
        let mut state = self.live()?;
        state.calls.push("accept_dialogs".to_string());
        state.accept_dialogs = true;
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        let mut state = self.live()?;
        state.calls.push("screenshot".to_string());
        Ok(FAKE_PNG.to_vec())
    }

    async fn reset_storage(&self) -> ProbeResult<()> {
        let mut state = self.live()?;
        state.calls.push("reset_storage".to_string());
        state.cookies.clear();
        state.local_storage.clear();
        Ok(())
    }

    async fn close(&self) -> ProbeResult<()> {
        let mut state = self.lock();
        state.calls.push("close".to_string());
        state.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> FakeDriver {
        FakeDriver::new("https://shop.test/")
            .with_page(
                FakePage::new("/")
                    .title("Home Page")
                    .element(
                        FakeElement::new("search")
                            .editable()
                            .css("#search")
                            .on_change(Effect::navigate("/catalogsearch/result/?q={value}")),
                    )
                    .element(FakeElement::new("a").css(".product-item").text("Radiant Tee"))
                    .element(FakeElement::new("b").css(".product-item").text("Breathe-Easy Tank"))
                    .element(
                        FakeElement::new("welcome")
                            .css(".greet.welcome")
                            .requires_cookie("customer"),
                    ),
            )
            .with_page(FakePage::new("/catalogsearch/result/").title("Search results"))
            .start_at("/")
    }

    mod routing_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_and_unknown_path() {
            let driver = shop();
            assert_eq!(driver.current_url().await.unwrap(), "https://shop.test/");
            assert_eq!(driver.title().await.unwrap(), "Home Page");

            driver.navigate("https://shop.test/nowhere").await.unwrap();
            assert_eq!(driver.title().await.unwrap(), "404 Not Found");
            assert_eq!(driver.calls(), vec!["navigate https://shop.test/nowhere"]);
        }

        #[tokio::test]
        async fn test_change_effect_substitutes_value() {
            let driver = shop();
            driver
                .dispatch_fill(&Locator::new("#search"), "shirt")
                .await
                .unwrap();
            assert_eq!(
                driver.current_url().await.unwrap(),
                "https://shop.test/catalogsearch/result/?q=shirt"
            );
            assert_eq!(driver.title().await.unwrap(), "Search results");
        }

        #[tokio::test]
        async fn test_redirect_settles_lazily() {
            let driver = FakeDriver::new("https://shop.test")
                .with_page(FakePage::new("/checkout/").redirect_after(Duration::from_millis(30), "/checkout/onepage/success/"))
                .with_page(FakePage::new("/checkout/onepage/success/").title("Success Page"))
                .start_at("/checkout/");
            assert!(driver.current_url().await.unwrap().ends_with("/checkout/"));
            tokio::time::sleep(Duration::from_millis(40)).await;
            assert!(driver
                .current_url()
                .await
                .unwrap()
                .ends_with("/checkout/onepage/success/"));
        }
    }

    mod snapshot_tests {
        use super::*;

        #[tokio::test]
        async fn test_document_order_and_indexing() {
            let driver = shop();
            let items = Locator::new(".product-item");
            assert_eq!(driver.count(&items).await.unwrap(), 2);
            let last = driver.snapshot(&items.last()).await.unwrap();
            assert_eq!(last.text.as_deref(), Some("Breathe-Easy Tank"));
            assert_eq!(last.matched, 2);
            let missing = driver.snapshot(&items.nth(5)).await.unwrap();
            assert!(!missing.found);
        }

        #[tokio::test]
        async fn test_cookie_gated_elements() {
            let driver = shop();
            let welcome = Locator::new(".greet.welcome");
            assert!(!driver.snapshot(&welcome).await.unwrap().found);
            driver.set_cookie("customer", "1");
            assert!(driver.snapshot(&welcome).await.unwrap().found);
            driver.reset_storage().await.unwrap();
            assert!(!driver.snapshot(&welcome).await.unwrap().found);
            assert!(!driver.has_storage());
        }

        #[tokio::test]
        async fn test_text_query_matching() {
            let driver = shop();
            assert_eq!(driver.count(&Locator::text("radiant")).await.unwrap(), 1);
            assert_eq!(driver.count(&Locator::text_exact("radiant")).await.unwrap(), 0);
            assert_eq!(
                driver
                    .count(&Locator::new(".product-item").with_text("tank"))
                    .await
                    .unwrap(),
                1
            );
        }
    }

    mod action_tests {
        use super::*;

        #[tokio::test]
        async fn test_fill_rejects_non_editable() {
            let driver = shop();
            let err = driver
                .dispatch_fill(&Locator::new(".product-item"), "x")
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::NotInteractable { .. }));
        }

        #[tokio::test]
        async fn test_click_missing_is_not_found() {
            let driver = shop();
            let err = driver
                .dispatch_click(&Locator::new("#nope"), false)
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }

        #[tokio::test]
        async fn test_confirm_requires_accepted_dialogs() {
            let driver = FakeDriver::new("https://shop.test")
                .with_page(
                    FakePage::new("/checkout/cart/")
                        .element(FakeElement::new("item").css(".cart.item"))
                        .element(
                            FakeElement::new("empty_cart_button")
                                .on_click(Effect::Confirm(vec![Effect::remove("item")])),
                        ),
                )
                .start_at("/checkout/cart/");
            let button = Locator::new("#empty_cart_button");
            let items = Locator::new(".cart.item");

            driver.dispatch_click(&button, false).await.unwrap();
            assert_eq!(driver.count(&items).await.unwrap(), 1);

            driver.accept_dialogs().await.unwrap();
            driver.dispatch_click(&button, false).await.unwrap();
            assert_eq!(driver.count(&items).await.unwrap(), 0);
        }

        #[tokio::test]
        async fn test_closed_driver_rejects_calls() {
            let driver = shop();
            driver.close().await.unwrap();
            assert!(driver.is_closed());
            let err = driver.title().await.unwrap_err();
            assert!(matches!(err, ProbeError::SessionClosed));
        }
    }
}
