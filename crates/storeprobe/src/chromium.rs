//! Headless Chromium driver over CDP (feature `browser`).
//!
//! Locators are resolved inside the page by a small injected script, so CSS,
//! role, text, label and XPath queries behave identically for counting,
//! snapshots and actions. A second script, installed before any document
//! script runs, wraps `fetch` and `XMLHttpRequest` to count requests in flight
//! for the network-idle wait.
//!
//! One [`ChromiumDriver`] owns one browser process, which gives every session
//! its own cookie jar and storage.

use crate::config::ProbeConfig;
use crate::driver::{ElementSnapshot, NetworkActivity, ReadyState, StoreDriver};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use crate::session::{Session, SessionFactory};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, EventJavascriptDialogOpening,
    HandleJavaScriptDialogParams,
};
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Defines `window.__storeprobe` (idempotent)
const RESOLVER_JS: &str = r#"
(() => {
  if (window.__storeprobe) return;
  const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
  const matches = (hay, needle, exact) => exact
    ? norm(hay) === norm(needle)
    : norm(hay).toLowerCase().includes(norm(needle).toLowerCase());
  const implicitRole = (el) => {
    const tag = el.tagName.toLowerCase();
    const type = (el.getAttribute('type') || '').toLowerCase();
    if (tag === 'button' || (tag === 'input' && ['button', 'submit', 'reset'].includes(type))) return 'button';
    if (tag === 'a' && el.hasAttribute('href')) return 'link';
    if (tag === 'input' && type === 'checkbox') return 'checkbox';
    if (tag === 'input' && type === 'radio') return 'radio';
    if (tag === 'select') return 'combobox';
    if (tag === 'textarea' || (tag === 'input' && ['', 'text', 'email', 'tel', 'search', 'url', 'password', 'number'].includes(type))) return 'textbox';
    if (/^h[1-6]$/.test(tag)) return 'heading';
    return null;
  };
  const labelText = (el) => {
    const parts = [];
    if (el.labels) for (const l of el.labels) parts.push(l.textContent);
    const by = el.getAttribute('aria-labelledby');
    if (by) for (const id of by.split(/\s+/)) {
      const ref = document.getElementById(id);
      if (ref) parts.push(ref.textContent);
    }
    return norm(parts.join(' '));
  };
  const accessibleName = (el) => norm(
    el.getAttribute('aria-label') || labelText(el) || el.getAttribute('title')
      || el.getAttribute('placeholder') || el.value || el.textContent);
  const all = (q) => {
    switch (q.kind) {
      case 'css': return [...document.querySelectorAll(q.selector)];
      case 'css_with_text':
        return [...document.querySelectorAll(q.selector)].filter((el) => matches(el.textContent, q.text, false));
      case 'x_path': {
        const it = document.evaluate(q.expression, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        const out = [];
        for (let i = 0; i < it.snapshotLength; i++) out.push(it.snapshotItem(i));
        return out;
      }
      case 'role':
        return [...document.querySelectorAll('*')].filter((el) =>
          (el.getAttribute('role') || implicitRole(el)) === q.role.toLowerCase()
          && (!q.name || matches(accessibleName(el), q.name, q.exact)));
      case 'text': {
        const hits = [...document.body.querySelectorAll('*')].filter((el) => matches(el.textContent, q.text, q.exact));
        // Innermost elements only.
        return hits.filter((el) => !hits.some((other) => other !== el && el.contains(other)));
      }
      case 'label':
        return [...document.querySelectorAll('input, select, textarea, [aria-labelledby]')]
          .filter((el) => matches(labelText(el), q.text, false));
      default: return [];
    }
  };
  const pick = (els, nth) => {
    switch (nth.pick) {
      case 'last': return els[els.length - 1] || null;
      case 'index': return els[nth.at] || null;
      default: return els[0] || null;
    }
  };
  const target = (d) => pick(all(d.query), d.nth);
  const snapshot = (d) => {
    const els = all(d.query);
    const el = pick(els, d.nth);
    if (!el) return { matched: els.length, found: false, visible: false, enabled: false,
      editable: false, hit_target: false, bounds: null, text: null };
    const r = el.getBoundingClientRect();
    const style = getComputedStyle(el);
    const visible = r.width > 0 && r.height > 0 && style.visibility !== 'hidden' && style.display !== 'none';
    const enabled = !el.disabled && el.getAttribute('aria-disabled') !== 'true';
    const tag = el.tagName.toLowerCase();
    const editable = enabled && !el.readOnly
      && (tag === 'textarea' || tag === 'select' || el.isContentEditable
        || (tag === 'input' && !['checkbox', 'radio', 'button', 'submit', 'reset', 'file', 'hidden'].includes((el.type || '').toLowerCase())));
    let hit = false;
    if (visible) {
      const cx = r.left + r.width / 2, cy = r.top + r.height / 2;
      if (cy < 0 || cy > innerHeight || cx < 0 || cx > innerWidth) el.scrollIntoView({ block: 'center', inline: 'center' });
      const b = el.getBoundingClientRect();
      const top = document.elementFromPoint(b.left + b.width / 2, b.top + b.height / 2);
      hit = !!top && (top === el || el.contains(top));
    }
    const b = el.getBoundingClientRect();
    return { matched: els.length, found: true, visible, enabled, editable, hit_target: hit,
      bounds: visible ? { x: b.x, y: b.y, width: b.width, height: b.height } : null,
      text: el.textContent };
  };
  window.__storeprobe = { all, target, snapshot };
})();
"#;

/// Counts fetch/XHR requests; installed before page scripts run
const NETWORK_JS: &str = r"
(() => {
  if (window.__storeprobeNet) return;
  const net = window.__storeprobeNet = { in_flight: 0, completed: 0 };
  const done = () => { net.in_flight = Math.max(0, net.in_flight - 1); net.completed += 1; };
  const origFetch = window.fetch;
  if (origFetch) window.fetch = function (...args) {
    net.in_flight += 1;
    return origFetch.apply(this, args).finally(done);
  };
  const origSend = XMLHttpRequest.prototype.send;
  XMLHttpRequest.prototype.send = function (...args) {
    net.in_flight += 1;
    this.addEventListener('loadend', done, { once: true });
    return origSend.apply(this, args);
  };
})();
";

/// CDP messages meaning the document went away under a query
const DOCUMENT_CHANGED_MARKERS: &[&str] = &[
    "Execution context was destroyed",
    "Cannot find context with specified id",
    "Inspected target navigated or closed",
    "No node with given id found",
];

fn cdp_error(e: impl std::fmt::Display) -> ProbeError {
    let message = e.to_string();
    if DOCUMENT_CHANGED_MARKERS.iter().any(|m| message.contains(m)) {
        ProbeError::document_changed(message)
    } else {
        ProbeError::driver(message)
    }
}

#[derive(Debug, Deserialize)]
struct ActionOutcome {
    ok: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// [`StoreDriver`] backed by a dedicated headless Chromium
#[derive(Debug)]
pub struct ChromiumDriver {
    browser: Mutex<CdpBrowser>,
    page: CdpPage,
    handler: JoinHandle<()>,
    dialogs: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl ChromiumDriver {
    /// Launch Chromium with the viewport, headless flag and executable from
    /// `config` and open a blank page
    pub async fn launch(config: &ProbeConfig) -> ProbeResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .no_sandbox();
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(ProbeError::driver)?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(cdp_error)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(cdp_error)?;
        page.evaluate_on_new_document(NETWORK_JS)
            .await
            .map_err(cdp_error)?;
        page.evaluate_on_new_document(RESOLVER_JS)
            .await
            .map_err(cdp_error)?;
        debug!(headless = config.headless, "chromium launched");

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            dialogs: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> ProbeResult<()> {
        // The handler task ends when the browser connection drops.
        if self.closed.load(Ordering::Acquire) || self.handler.is_finished() {
            Err(ProbeError::SessionClosed)
        } else {
            Ok(())
        }
    }

    async fn eval<T: DeserializeOwned>(&self, expression: String) -> ProbeResult<T> {
        self.ensure_open()?;
        self.page
            .evaluate(expression)
            .await
            .map_err(cdp_error)?
            .into_value()
            .map_err(cdp_error)
    }

    /// Evaluate `body` with `d` bound to the locator descriptor and the
    /// resolver installed
    async fn eval_on<T: DeserializeOwned>(&self, locator: &Locator, body: &str) -> ProbeResult<T> {
        let descriptor = locator.to_descriptor();
        self.eval(format!(
            "(() => {{ {RESOLVER_JS}; const sp = window.__storeprobe; const d = {descriptor}; {body} }})()"
        ))
        .await
    }

    async fn run_action(&self, locator: &Locator, body: &str) -> ProbeResult<()> {
        let outcome: ActionOutcome = self
            .eval_on(
                locator,
                &format!(
                    "const el = sp.target(d); if (!el) return {{ ok: false, reason: 'missing' }}; {body}"
                ),
            )
            .await?;
        match (outcome.ok, outcome.reason.as_deref()) {
            (true, _) => Ok(()),
            (false, Some("missing")) => Err(ProbeError::NotFound {
                locator: locator.to_string(),
            }),
            (false, reason) => Err(ProbeError::NotInteractable {
                locator: locator.to_string(),
                reason: reason.unwrap_or("rejected by the page").to_string(),
            }),
        }
    }
}

#[async_trait]
impl StoreDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.ensure_open()?;
        self.page
            .goto(url)
            .await
            .map_err(|e| ProbeError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        self.ensure_open()?;
        Ok(self.page.url().await.map_err(cdp_error)?.unwrap_or_default())
    }

    async fn title(&self) -> ProbeResult<String> {
        self.ensure_open()?;
        Ok(self
            .page
            .get_title()
            .await
            .map_err(cdp_error)?
            .unwrap_or_default())
    }

    async fn ready_state(&self) -> ProbeResult<ReadyState> {
        let state: String = self.eval("document.readyState".to_string()).await?;
        Ok(ReadyState::parse(&state))
    }

    async fn network_activity(&self) -> ProbeResult<NetworkActivity> {
        self.eval(
            "window.__storeprobeNet || { in_flight: 0, completed: performance.getEntriesByType('resource').length }"
                .to_string(),
        )
        .await
    }

    async fn count(&self, locator: &Locator) -> ProbeResult<usize> {
        self.eval_on(locator, "return sp.all(d.query).length;").await
    }

    async fn snapshot(&self, locator: &Locator) -> ProbeResult<ElementSnapshot> {
        self.eval_on(locator, "return sp.snapshot(d);").await
    }

    async fn dispatch_click(&self, locator: &Locator, force: bool) -> ProbeResult<()> {
        if force {
            return self
                .run_action(locator, "el.click(); return { ok: true };")
                .await;
        }
        let snapshot = self.snapshot(locator).await?;
        let bounds = snapshot.bounds.ok_or_else(|| ProbeError::NotVisible {
            locator: locator.to_string(),
        })?;
        let center = Point {
            x: f64::from(bounds.x + bounds.width / 2.0),
            y: f64::from(bounds.y + bounds.height / 2.0),
        };
        self.page.click(center).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn dispatch_fill(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        let value = serde_json::to_string(text)?;
        self.run_action(
            locator,
            &format!(
                "if (el.disabled || el.readOnly) return {{ ok: false, reason: 'element is not editable' }};
                 el.focus();
                 const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
                 const setter = Object.getOwnPropertyDescriptor(proto, 'value');
                 if (el.isContentEditable) {{ el.textContent = {value}; }}
                 else if (setter && setter.set) {{ setter.set.call(el, {value}); }}
                 else {{ el.value = {value}; }}
                 el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                 el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                 return {{ ok: true }};"
            ),
        )
        .await
    }

    async fn dispatch_select(&self, locator: &Locator, value: &str) -> ProbeResult<()> {
        let value = serde_json::to_string(value)?;
        self.run_action(
            locator,
            &format!(
                "if (!(el instanceof HTMLSelectElement)) return {{ ok: false, reason: 'element is not a select' }};
                 const want = {value};
                 const opt = [...el.options].find((o) => o.value === want || o.label.trim() === want);
                 if (!opt) return {{ ok: false, reason: 'no option ' + JSON.stringify(want) }};
                 el.value = opt.value;
                 el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                 el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                 return {{ ok: true }};"
            ),
        )
        .await
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> ProbeResult<Option<String>> {
        let name = serde_json::to_string(name)?;
        // `null` means no element; `[null]` means no such attribute
        let found: Option<Vec<Option<String>>> = self
            .eval_on(
                locator,
                &format!(
                    "const el = sp.target(d); if (!el) return null;
                     const n = {name};
                     return [n === 'value' && 'value' in el ? el.value : el.getAttribute(n)];"
                ),
            )
            .await?;
        found
            .map(|mut slot| slot.pop().flatten())
            .ok_or_else(|| ProbeError::NotFound {
                locator: locator.to_string(),
            })
    }

    async fn accept_dialogs(&self) -> ProbeResult<()> {
        self.ensure_open()?;
        let mut slot = self.dialogs.lock().await;
        if slot.is_some() {
            return Ok(());
        }
        let mut events = self
            .page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(cdp_error)?;
        let page = self.page.clone();
        *slot = Some(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                debug!(message = %event.message, "accepting dialog");
                if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                    warn!(error = %e, "dialog not accepted");
                }
            }
        }));
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        self.ensure_open()?;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self.page.execute(params).await.map_err(cdp_error)?;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(cdp_error)
    }

    async fn reset_storage(&self) -> ProbeResult<()> {
        self.ensure_open()?;
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(cdp_error)?;
        let _: bool = self
            .eval(
                "(() => { try { localStorage.clear(); sessionStorage.clear(); } catch (e) {} return true; })()"
                    .to_string(),
            )
            .await?;
        Ok(())
    }

    async fn close(&self) -> ProbeResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(task) = self.dialogs.lock().await.take() {
            task.abort();
        }
        let result = self.browser.lock().await.close().await.map_err(cdp_error);
        self.handler.abort();
        result.map(|_| ())
    }
}

/// Opens each session in a freshly launched Chromium
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumSessions;

#[async_trait]
impl SessionFactory for ChromiumSessions {
    async fn open(&self, config: &ProbeConfig) -> ProbeResult<Session> {
        let driver = ChromiumDriver::launch(config).await?;
        Ok(Session::new(Arc::new(driver), config.clone()))
    }
}
