//! Chromium control through the DevTools protocol.
//!
//! Elements found on the page are kept in a registry stored on `window`. An
//! [`ElementId`] is `<document token>:<registry index>`, so ids of a previous
//! document resolve to [`VeoError::StaleElement`] once the browser navigated
//! away.

#![allow(
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

use crate::driver::{keys, ElementId, Screenshot, ScriptArg, WebDriver};
use crate::locator::{Locator, Point};
use crate::result::{VeoError, VeoResult};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, InsertTextParams,
};
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Chromium launch settings
#[derive(Debug, Clone)]
pub struct ChromiumConfig {
    /// Run without a window
    pub headless: bool,
    /// Window width
    pub width: u32,
    /// Window height
    pub height: u32,
    /// Chromium executable, found on the system when unset
    pub chromium_path: Option<PathBuf>,
    /// Keep the Chromium sandbox (disable in containers)
    pub sandbox: bool,
    /// Budget for AngularJS to become stable, in milliseconds
    pub angular_timeout_ms: u64,
}

impl Default for ChromiumConfig {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1280,
            height: 800,
            chromium_path: None,
            sandbox: true,
            angular_timeout_ms: 11_000,
        }
    }
}

impl ChromiumConfig {
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    #[must_use]
    pub const fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Helpers shared by every page script: the element registry and visibility
const PRELUDE: &str = r"
var doc = window.__veoDocument || (window.__veoDocument = Math.random().toString(36).slice(2));
var registry = window.__veoNodes || (window.__veoNodes = []);
function register(n) {
  var i = registry.indexOf(n);
  if (i < 0) { registry.push(n); i = registry.length - 1; }
  return doc + ':' + i;
}
function node(id) {
  var parts = id.split(':');
  var n = parts[0] === doc ? registry[Number(parts[1])] : undefined;
  if (!n || !n.isConnected) { throw { veoStale: id }; }
  return n;
}
function visible(n) {
  if (!(n.offsetWidth || n.offsetHeight || n.getClientRects().length)) { return false; }
  return window.getComputedStyle(n).visibility !== 'hidden';
}
";

const FIND: &str = r"
var root = args.scope === null ? document : node(args.scope);
var q = args.query;
var found = [];
function keep(list, test) {
  for (var i = 0; i < list.length; i++) { if (!test || test(list[i])) { found.push(list[i]); } }
}
if (q.xpath !== undefined) {
  var snapshot = document.evaluate(
    q.xpath, root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
  for (var i = 0; i < snapshot.snapshotLength; i++) { found.push(snapshot.snapshotItem(i)); }
} else if (q.binding !== undefined) {
  var bound = '.ng-binding, [ng-bind], [data-ng-bind], [ng-bind-html]';
  keep(root.querySelectorAll(bound), function (el) {
    var expressions = [];
    ['ng-bind', 'data-ng-bind', 'ng-bind-html'].forEach(function (a) {
      var v = el.getAttribute(a);
      if (v) { expressions.push(v); }
    });
    var data = window.angular ? window.angular.element(el).data('$binding') : null;
    if (data) {
      (Array.isArray(data) ? data : [data]).forEach(function (b) {
        expressions.push(typeof b === 'string' ? b : (b.exp || (b.expressions || []).join(' ')));
      });
    }
    return expressions.some(function (e) {
      return q.exact ? e.trim() === q.binding : e.indexOf(q.binding) >= 0;
    });
  });
} else if (q.model !== undefined) {
  keep(root.querySelectorAll('[ng-model], [data-ng-model]'), function (el) {
    return (el.getAttribute('ng-model') || el.getAttribute('data-ng-model')) === q.model;
  });
} else if (q.repeater !== undefined) {
  keep(root.querySelectorAll('[ng-repeat], [data-ng-repeat]'), function (el) {
    var r = el.getAttribute('ng-repeat') || el.getAttribute('data-ng-repeat');
    return r.trim().indexOf(q.repeater) === 0;
  });
} else if (q.id !== undefined) {
  keep(root.querySelectorAll('[id]'), function (el) { return el.id === q.id; });
} else if (q.className !== undefined) {
  keep(root.getElementsByClassName(q.className));
} else {
  keep(root.querySelectorAll(q.css), q.text === undefined ? null : function (el) {
    return (el.innerText || el.textContent || '').indexOf(q.text) >= 0;
  });
}
return found.map(register);
";

const TEXT: &str = "var n = node(args.id); return visible(n) ? (n.innerText || '').trim() : '';";

const ATTRIBUTE: &str = r"
var n = node(args.id);
if (['value', 'checked', 'selected', 'disabled'].indexOf(args.name) >= 0 && args.name in n) {
  var p = n[args.name];
  if (typeof p === 'boolean') { return p ? 'true' : null; }
  return p === null || p === undefined ? null : String(p);
}
return n.getAttribute(args.name);
";

const LOCATION: &str = r"
var rect = node(args.id).getBoundingClientRect();
return { x: rect.left + window.scrollX, y: rect.top + window.scrollY };
";

const CLICK: &str =
    "var n = node(args.id); n.scrollIntoView({ block: 'center' }); n.click(); return null;";

const HOVER: &str = r"
var n = node(args.id);
n.scrollIntoView({ block: 'center' });
['mouseover', 'mouseenter', 'mousemove'].forEach(function (type) {
  n.dispatchEvent(new MouseEvent(type, { bubbles: type !== 'mouseenter', view: window }));
});
return null;
";

const FOCUS: &str = "node(args.id).focus(); return null;";

const CLEAR: &str = r"
var n = node(args.id);
n.value = '';
n.dispatchEvent(new Event('input', { bubbles: true }));
n.dispatchEvent(new Event('change', { bubbles: true }));
return null;
";

const EXECUTE: &str = r"
var values = args.items.map(function (item) {
  return item.element !== undefined ? node(item.element) : item.value;
});
var result = (new Function(args.script)).apply(null, values);
return result instanceof Element ? register(result) : result;
";

const WAIT_FOR_ANGULAR: &str = r"
return new Promise(function (resolve) {
  if (!window.angular) { resolve(null); return; }
  var root = document.querySelector('[ng-app], [data-ng-app]') || document.body;
  try {
    window.angular.getTestability(root).whenStable(function () { resolve(null); });
  } catch (e) {
    resolve(null);
  }
});
";

/// Result of a wrapped page script
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Outcome {
    Ok(Value),
    Stale(String),
    Error(String),
}

/// Wrap `body` so that it runs with `args` and reports through an [`Outcome`]
fn wrap(body: &str, args: &Value) -> String {
    format!(
        "(function (args) {{ {PRELUDE}
function settle(r) {{ return {{ ok: r === undefined ? null : r }}; }}
function fail(e) {{
  if (e && e.veoStale) {{ return {{ stale: e.veoStale }}; }}
  return {{ error: String(e && e.message ? e.message : e) }};
}}
try {{
  return Promise.resolve((function () {{ {body} }})()).then(settle, fail);
}} catch (e) {{ return fail(e); }}
}})({args})"
    )
}

/// Query object understood by the element finder script
fn locator_query(locator: &Locator) -> Value {
    match locator {
        Locator::Css(css) => json!({ "css": css }),
        Locator::XPath(xpath) => json!({ "xpath": xpath }),
        Locator::Binding(binding) => json!({ "binding": binding, "exact": false }),
        Locator::ExactBinding(binding) => json!({ "binding": binding, "exact": true }),
        Locator::Model(model) => json!({ "model": model }),
        Locator::Repeater(repeater) => json!({ "repeater": repeater }),
        Locator::CssContainingText { css, text } => json!({ "css": css, "text": text }),
        Locator::Id(id) => json!({ "id": id }),
        Locator::ClassName(class) => json!({ "className": class }),
    }
}

/// DevTools key name, virtual key code and inserted text of a special key
fn special_key(key: char) -> Option<(&'static str, i64, Option<&'static str>)> {
    let key = key.to_string();
    match key.as_str() {
        keys::ENTER => Some(("Enter", 13, Some("\r"))),
        keys::BACK_SPACE => Some(("Backspace", 8, None)),
        keys::TAB => Some(("Tab", 9, None)),
        _ => None,
    }
}

fn driver_error(e: impl std::fmt::Display) -> VeoError {
    VeoError::Driver {
        message: e.to_string(),
    }
}

/// [`WebDriver`] over a Chromium page
#[derive(Debug)]
pub struct ChromiumDriver {
    config: ChromiumConfig,
    browser: Arc<Mutex<CdpBrowser>>,
    page: CdpPage,
    #[allow(dead_code)]
    handle: tokio::task::JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launch Chromium and open a blank page
    pub async fn launch(config: ChromiumConfig) -> VeoResult<Self> {
        let mut builder = CdpConfig::builder().window_size(config.width, config.height);
        if !config.headless {
            builder = builder.with_head();
        }
        if !config.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder.build().map_err(driver_error)?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(driver_error)?;
        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(driver_error)?;
        info!(headless = config.headless, "chromium launched");
        Ok(Self {
            config,
            browser: Arc::new(Mutex::new(browser)),
            page,
            handle,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ChromiumConfig {
        &self.config
    }

    /// Close the browser
    pub async fn close(&self) -> VeoResult<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await.map_err(driver_error)?;
        Ok(())
    }

    /// Run `body` in page context with `args`
    async fn run(&self, body: &str, args: Value) -> VeoResult<Value> {
        let mut params = EvaluateParams::new(wrap(body, &args));
        params.return_by_value = Some(true);
        params.await_promise = Some(true);
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| VeoError::Script {
                message: e.to_string(),
            })?;
        match result.into_value::<Outcome>()? {
            Outcome::Ok(value) => Ok(value),
            Outcome::Stale(id) => Err(VeoError::StaleElement { id }),
            Outcome::Error(message) => Err(VeoError::Script { message }),
        }
    }

    async fn run_on(&self, body: &str, element: &ElementId) -> VeoResult<Value> {
        self.run(body, json!({ "id": element.as_str() })).await
    }

    async fn press(&self, key: &str, code: i64, text: Option<&str>) -> VeoResult<()> {
        for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let mut builder = DispatchKeyEventParams::builder()
                .r#type(kind.clone())
                .key(key)
                .code(key)
                .windows_virtual_key_code(code)
                .native_virtual_key_code(code);
            if let (Some(text), DispatchKeyEventType::KeyDown) = (text, &kind) {
                builder = builder.text(text);
            }
            let params = builder.build().map_err(driver_error)?;
            self.page.execute(params).await.map_err(driver_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl WebDriver for ChromiumDriver {
    async fn get(&self, url: &str) -> VeoResult<()> {
        debug!(url, "navigate");
        self.page.goto(url).await.map_err(driver_error)?;
        Ok(())
    }

    async fn current_url(&self) -> VeoResult<String> {
        Ok(self.page.url().await.map_err(driver_error)?.unwrap_or_default())
    }

    async fn title(&self) -> VeoResult<String> {
        Ok(self.page.get_title().await.map_err(driver_error)?.unwrap_or_default())
    }

    async fn refresh(&self) -> VeoResult<()> {
        self.page.reload().await.map_err(driver_error)?;
        Ok(())
    }

    async fn delete_all_cookies(&self) -> VeoResult<()> {
        self.page
            .execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(driver_error)?;
        Ok(())
    }

    async fn set_window_size(&self, width: u32, height: u32) -> VeoResult<()> {
        let params =
            SetDeviceMetricsOverrideParams::new(i64::from(width), i64::from(height), 1.0, false);
        self.page.execute(params).await.map_err(driver_error)?;
        Ok(())
    }

    async fn screenshot(&self) -> VeoResult<Screenshot> {
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let screenshot = self.page.execute(params).await.map_err(driver_error)?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(&screenshot.data)
            .map_err(driver_error)?;
        Ok(Screenshot::new(data))
    }

    async fn find_elements(
        &self,
        scope: Option<&ElementId>,
        locator: &Locator,
    ) -> VeoResult<Vec<ElementId>> {
        let args = json!({
            "scope": scope.map(ElementId::as_str),
            "query": locator_query(locator),
        });
        let ids: Vec<String> = serde_json::from_value(self.run(FIND, args).await?)?;
        Ok(ids.into_iter().map(ElementId::new).collect())
    }

    async fn text(&self, element: &ElementId) -> VeoResult<String> {
        let value = self.run_on(TEXT, element).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> VeoResult<Option<String>> {
        let value = self
            .run(ATTRIBUTE, json!({ "id": element.as_str(), "name": name }))
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn tag_name(&self, element: &ElementId) -> VeoResult<String> {
        let value = self
            .run_on("return node(args.id).tagName.toLowerCase();", element)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn is_displayed(&self, element: &ElementId) -> VeoResult<bool> {
        let value = self.run_on("return visible(node(args.id));", element).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementId) -> VeoResult<bool> {
        let value = self.run_on("return !node(args.id).disabled;", element).await?;
        Ok(value.as_bool().unwrap_or(true))
    }

    async fn location(&self, element: &ElementId) -> VeoResult<Point> {
        let value = self.run_on(LOCATION, element).await?;
        Ok(Point {
            x: value["x"].as_f64().unwrap_or_default(),
            y: value["y"].as_f64().unwrap_or_default(),
        })
    }

    async fn click(&self, element: &ElementId) -> VeoResult<()> {
        self.run_on(CLICK, element).await.map(|_| ())
    }

    async fn mouse_move(&self, element: &ElementId) -> VeoResult<()> {
        self.run_on(HOVER, element).await.map(|_| ())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> VeoResult<()> {
        self.run_on(FOCUS, element).await?;
        let mut chunk = String::new();
        for c in text.chars() {
            if let Some((key, code, inserted)) = special_key(c) {
                if !chunk.is_empty() {
                    self.page
                        .execute(InsertTextParams::new(std::mem::take(&mut chunk)))
                        .await
                        .map_err(driver_error)?;
                }
                self.press(key, code, inserted).await?;
            } else {
                chunk.push(c);
            }
        }
        if !chunk.is_empty() {
            self.page
                .execute(InsertTextParams::new(chunk))
                .await
                .map_err(driver_error)?;
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> VeoResult<()> {
        self.run_on(CLEAR, element).await.map(|_| ())
    }

    async fn execute_script(&self, script: &str, args: Vec<ScriptArg>) -> VeoResult<Value> {
        let items: Vec<Value> = args
            .into_iter()
            .map(|arg| match arg {
                ScriptArg::Element(id) => json!({ "element": id.as_str() }),
                ScriptArg::Value(value) => json!({ "value": value }),
            })
            .collect();
        self.run(EXECUTE, json!({ "script": script, "items": items }))
            .await
    }

    async fn wait_for_angular(&self) -> VeoResult<()> {
        let ms = self.config.angular_timeout_ms;
        tokio::time::timeout(Duration::from_millis(ms), self.run(WAIT_FOR_ANGULAR, Value::Null))
            .await
            .map_err(|_| VeoError::timeout("Waiting for AngularJS to become stable", ms))??;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod script_tests {
        use super::*;

        #[test]
        fn test_locator_query() {
            assert_eq!(locator_query(&Locator::css("a.add")), json!({ "css": "a.add" }));
            assert_eq!(
                locator_query(&Locator::CssContainingText {
                    css: "label".to_string(),
                    text: "Name".to_string()
                }),
                json!({ "css": "label", "text": "Name" })
            );
            assert_eq!(
                locator_query(&Locator::ExactBinding("alert.msg".to_string())),
                json!({ "binding": "alert.msg", "exact": true })
            );
        }

        #[test]
        fn test_special_keys() {
            let enter = keys::ENTER.chars().next().unwrap();
            assert_eq!(special_key(enter), Some(("Enter", 13, Some("\r"))));
            assert_eq!(special_key('a'), None);
        }

        #[test]
        fn test_outcome_parsing() {
            let outcome: Outcome = serde_json::from_value(json!({ "stale": "x:1" })).unwrap();
            assert!(matches!(outcome, Outcome::Stale(id) if id == "x:1"));
            let outcome: Outcome = serde_json::from_value(json!({ "ok": [1, 2] })).unwrap();
            assert!(matches!(outcome, Outcome::Ok(Value::Array(_))));
        }

        #[test]
        fn test_wrapped_script_embeds_args() {
            let script = wrap("return args.id;", &json!({ "id": "a:0" }));
            assert!(script.ends_with(r#"({"id":"a:0"})"#));
            assert!(script.contains("return args.id;"));
        }
    }
}
