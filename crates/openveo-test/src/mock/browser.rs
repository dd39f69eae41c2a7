//! Mock browser driving a [`MockApp`] through the [`WebDriver`] trait.
//!
//! The browser keeps the document rendered by the app and applies the default
//! behaviours of real browsers (checkbox toggling, label activation, option
//! selection, typing). Every interaction is then reported to the app, which
//! may ask for a re-render. A re-render bumps the document generation: element
//! ids handed out before it fail with [`VeoError::StaleElement`].

use super::dom::{Dom, El, NodeId};
use crate::driver::{keys, ElementId, ScriptArg, Screenshot, WebDriver};
use crate::locator::{Locator, Point};
use crate::result::{VeoError, VeoResult};
use crate::scripts;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Smallest valid PNG (1x1 transparent pixel)
pub const BLANK_PNG: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

/// Snapshot of an element handed to the app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeView {
    /// Lower-case tag name
    pub tag: String,
    /// Attributes, `value` and `checked` reflecting the live state
    pub attrs: BTreeMap<String, String>,
    /// Rendered text
    pub text: String,
}

impl NodeView {
    fn of(dom: &Dom, id: NodeId) -> Self {
        let node = dom.node(id);
        Self {
            tag: node.map(|n| n.tag.clone()).unwrap_or_default(),
            attrs: node.map(|n| n.attrs.clone()).unwrap_or_default(),
            text: dom.text(id),
        }
    }

    /// Attribute value
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Current `value`, empty when unset
    #[must_use]
    pub fn value(&self) -> &str {
        self.attr("value").unwrap_or("")
    }

    /// Whether the element is a checked checkbox
    #[must_use]
    pub fn is_checked(&self) -> bool {
        self.attr("checked").is_some()
    }
}

/// Script argument as seen by the app
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    /// Element argument
    Node(NodeView),
    /// Plain value
    Value(Value),
}

impl ScriptValue {
    /// Element behind the argument
    #[must_use]
    pub const fn node(&self) -> Option<&NodeView> {
        match self {
            Self::Node(view) => Some(view),
            Self::Value(_) => None,
        }
    }

    /// String behind the argument
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(v) => v.as_str(),
            Self::Node(_) => None,
        }
    }
}

/// Interaction reported to the app
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    /// Element clicked (after default behaviour)
    Click(NodeView),
    /// Mouse moved over the element
    Hover(NodeView),
    /// Keys typed into an input; `keys` is the raw sequence, special keys included
    Input {
        /// Input after typing
        node: NodeView,
        /// Typed sequence
        keys: String,
    },
    /// Input cleared
    Clear(NodeView),
    /// Script executed in page context
    Script {
        /// Script source
        script: String,
        /// Arguments
        args: Vec<ScriptValue>,
    },
}

/// Answer of the app to an event
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reaction {
    /// Whether the document must be rendered again
    pub rerender: bool,
    /// Value returned to a script caller
    pub value: Value,
}

impl Reaction {
    /// Nothing changed
    #[must_use]
    pub fn ignored() -> Self {
        Self::default()
    }

    /// State changed, render again
    #[must_use]
    pub fn rerender() -> Self {
        Self {
            rerender: true,
            value: Value::Null,
        }
    }

    /// Script result without state change
    #[must_use]
    pub fn value(value: Value) -> Self {
        Self {
            rerender: false,
            value,
        }
    }
}

/// Application simulated behind the mock browser
pub trait MockApp: Send + 'static {
    /// Render the document for the current state
    fn render(&self) -> El;

    /// Current path, relative to the base URL
    fn path(&self) -> String;

    /// Navigate to `path` (relative to the base URL); redirects are up to the app
    fn navigate(&mut self, path: &str);

    /// Document title
    fn title(&self) -> String {
        String::new()
    }

    /// React to an interaction
    fn handle(&mut self, event: &MockEvent) -> Reaction;

    /// Drop the session cookies
    fn delete_cookies(&mut self) {}
}

struct BrowserState<A> {
    app: A,
    dom: Dom,
    generation: u64,
    history: Vec<String>,
    window: (u32, u32),
}

impl<A: MockApp> BrowserState<A> {
    fn render(&mut self) {
        self.dom = Dom::new(self.app.render());
        self.generation += 1;
    }

    fn element_id(&self, node: NodeId) -> ElementId {
        ElementId::new(format!("{}:{node}", self.generation))
    }

    fn resolve(&self, id: &ElementId) -> VeoResult<NodeId> {
        let stale = || VeoError::StaleElement {
            id: id.to_string(),
        };
        let (generation, node) = id.as_str().split_once(':').ok_or_else(stale)?;
        let generation: u64 = generation.parse().map_err(|_| stale())?;
        let node: NodeId = node.parse().map_err(|_| stale())?;
        if generation != self.generation || self.dom.node(node).is_none() {
            return Err(stale());
        }
        Ok(node)
    }

    fn dispatch(&mut self, event: &MockEvent) -> Value {
        let reaction = self.app.handle(event);
        if reaction.rerender {
            self.render();
        }
        reaction.value
    }

    fn interactable(&self, node: NodeId, id: &ElementId) -> VeoResult<()> {
        if self.dom.is_displayed(node) {
            Ok(())
        } else {
            Err(VeoError::Driver {
                message: format!("element not interactable: {id}"),
            })
        }
    }

    fn checkbox_of_label(&self, label: NodeId) -> Option<NodeId> {
        self.dom.descendants(label).into_iter().find(|&n| {
            self.dom.node(n).is_some_and(|node| {
                node.tag == "input" && node.attr("type") == Some("checkbox")
            })
        })
    }

    fn toggle_checkbox(&mut self, input: NodeId) -> VeoResult<()> {
        if self.dom.attr(input, "checked").is_some() {
            self.dom.remove_attr(input, "checked")
        } else {
            self.dom.set_attr(input, "checked", "true")
        }
    }

    fn select_option(&mut self, option: NodeId) -> VeoResult<()> {
        if let Some(select) = self.dom.parent(option) {
            let siblings = self.dom.node(select).map(|n| n.children.clone()).unwrap_or_default();
            for sibling in siblings {
                self.dom.remove_attr(sibling, "selected")?;
            }
        }
        self.dom.set_attr(option, "selected", "selected")
    }
}

/// In-memory browser over a [`MockApp`]
pub struct MockBrowser<A: MockApp> {
    base_url: String,
    state: Mutex<BrowserState<A>>,
}

impl<A: MockApp> std::fmt::Debug for MockBrowser<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBrowser")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl<A: MockApp> MockBrowser<A> {
    /// Browser showing `app` under `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>, app: A) -> Self {
        let dom = Dom::new(app.render());
        Self {
            base_url: base_url.into(),
            state: Mutex::new(BrowserState {
                app,
                dom,
                generation: 0,
                history: Vec::new(),
                window: (1280, 1024),
            }),
        }
    }

    fn state(&self) -> VeoResult<MutexGuard<'_, BrowserState<A>>> {
        self.state.lock().map_err(|_| VeoError::Driver {
            message: "mock browser state poisoned".to_string(),
        })
    }

    fn record(state: &mut BrowserState<A>, call: String) {
        state.history.push(call);
    }

    /// Calls received so far, oldest first
    pub fn history(&self) -> Vec<String> {
        self.state().map(|s| s.history.clone()).unwrap_or_default()
    }

    /// Whether a call starting with `method` was received
    pub fn was_called(&self, method: &str) -> bool {
        self.state()
            .map(|s| s.history.iter().any(|c| c.starts_with(method)))
            .unwrap_or(false)
    }

    /// Number of calls starting with `method`
    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .map(|s| s.history.iter().filter(|c| c.starts_with(method)).count())
            .unwrap_or(0)
    }

    /// Current document generation
    pub fn generation(&self) -> u64 {
        self.state().map(|s| s.generation).unwrap_or(0)
    }

    /// Current window size
    pub fn window_size(&self) -> (u32, u32) {
        self.state().map(|s| s.window).unwrap_or_default()
    }

    /// Inspect or change the app, then render again
    pub fn with_app<T>(&self, f: impl FnOnce(&mut A) -> T) -> VeoResult<T> {
        let mut state = self.state()?;
        let out = f(&mut state.app);
        state.render();
        Ok(out)
    }

    /// Inspect the current document
    pub fn with_dom<T>(&self, f: impl FnOnce(&Dom) -> T) -> VeoResult<T> {
        let state = self.state()?;
        Ok(f(&state.dom))
    }
}

#[async_trait]
impl<A: MockApp> WebDriver for MockBrowser<A> {
    async fn get(&self, url: &str) -> VeoResult<()> {
        let mut state = self.state()?;
        Self::record(&mut state, format!("get:{url}"));
        let path = url.strip_prefix(self.base_url.as_str()).unwrap_or(url);
        state.app.navigate(path);
        state.render();
        Ok(())
    }

    async fn current_url(&self) -> VeoResult<String> {
        let state = self.state()?;
        Ok(format!("{}{}", self.base_url, state.app.path()))
    }

    async fn title(&self) -> VeoResult<String> {
        Ok(self.state()?.app.title())
    }

    async fn refresh(&self) -> VeoResult<()> {
        let mut state = self.state()?;
        Self::record(&mut state, "refresh".to_string());
        let path = state.app.path();
        state.app.navigate(&path);
        state.render();
        Ok(())
    }

    async fn delete_all_cookies(&self) -> VeoResult<()> {
        let mut state = self.state()?;
        Self::record(&mut state, "delete_all_cookies".to_string());
        state.app.delete_cookies();
        Ok(())
    }

    async fn set_window_size(&self, width: u32, height: u32) -> VeoResult<()> {
        let mut state = self.state()?;
        Self::record(&mut state, format!("set_window_size:{width}x{height}"));
        state.window = (width, height);
        Ok(())
    }

    async fn screenshot(&self) -> VeoResult<Screenshot> {
        let mut state = self.state()?;
        Self::record(&mut state, "screenshot".to_string());
        Ok(Screenshot::new(BLANK_PNG.to_vec()))
    }

    async fn find_elements(
        &self,
        scope: Option<&ElementId>,
        locator: &Locator,
    ) -> VeoResult<Vec<ElementId>> {
        let state = self.state()?;
        let scope = scope.map(|id| state.resolve(id)).transpose()?;
        let nodes = state.dom.query(scope, locator)?;
        Ok(nodes.into_iter().map(|n| state.element_id(n)).collect())
    }

    async fn text(&self, element: &ElementId) -> VeoResult<String> {
        let state = self.state()?;
        let node = state.resolve(element)?;
        Ok(state.dom.text(node))
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> VeoResult<Option<String>> {
        let state = self.state()?;
        let node = state.resolve(element)?;
        Ok(state.dom.attr(node, name).map(str::to_string))
    }

    async fn tag_name(&self, element: &ElementId) -> VeoResult<String> {
        let state = self.state()?;
        let node = state.resolve(element)?;
        Ok(state.dom.node(node).map(|n| n.tag.clone()).unwrap_or_default())
    }

    async fn is_displayed(&self, element: &ElementId) -> VeoResult<bool> {
        let state = self.state()?;
        let node = state.resolve(element)?;
        Ok(state.dom.is_displayed(node))
    }

    async fn is_enabled(&self, element: &ElementId) -> VeoResult<bool> {
        let state = self.state()?;
        let node = state.resolve(element)?;
        Ok(state.dom.is_enabled(node))
    }

    async fn location(&self, element: &ElementId) -> VeoResult<Point> {
        let state = self.state()?;
        let node = state.resolve(element)?;
        Ok(state.dom.location(node))
    }

    async fn click(&self, element: &ElementId) -> VeoResult<()> {
        let mut state = self.state()?;
        let mut node = state.resolve(element)?;
        state.interactable(node, element)?;
        Self::record(&mut state, format!("click:{element}"));
        if !state.dom.is_enabled(node) {
            return Ok(());
        }

        let tag = state.dom.node(node).map(|n| n.tag.clone()).unwrap_or_default();
        match tag.as_str() {
            "input" if state.dom.attr(node, "type") == Some("checkbox") => {
                state.toggle_checkbox(node)?;
            }
            "label" => {
                if let Some(input) = state.checkbox_of_label(node) {
                    state.toggle_checkbox(input)?;
                    node = input;
                }
            }
            "option" => state.select_option(node)?,
            _ => {}
        }

        let view = NodeView::of(&state.dom, node);
        state.dispatch(&MockEvent::Click(view));
        Ok(())
    }

    async fn mouse_move(&self, element: &ElementId) -> VeoResult<()> {
        let mut state = self.state()?;
        let node = state.resolve(element)?;
        Self::record(&mut state, format!("mouse_move:{element}"));
        let view = NodeView::of(&state.dom, node);
        state.dispatch(&MockEvent::Hover(view));
        Ok(())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> VeoResult<()> {
        let mut state = self.state()?;
        let node = state.resolve(element)?;
        state.interactable(node, element)?;
        Self::record(&mut state, format!("send_keys:{element}:{text}"));

        let mut value = state.dom.attr(node, "value").unwrap_or("").to_string();
        let mut rest = text;
        while let Some(c) = rest.chars().next() {
            let special = [keys::ENTER, keys::BACK_SPACE, keys::TAB]
                .into_iter()
                .find(|k| rest.starts_with(k));
            match special {
                Some(k) if k == keys::BACK_SPACE => {
                    value.pop();
                }
                Some(_) => {}
                None => value.push(c),
            }
            rest = &rest[special.map_or(c.len_utf8(), str::len)..];
        }
        state.dom.set_attr(node, "value", value)?;

        let view = NodeView::of(&state.dom, node);
        state.dispatch(&MockEvent::Input {
            node: view,
            keys: text.to_string(),
        });
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> VeoResult<()> {
        let mut state = self.state()?;
        let node = state.resolve(element)?;
        Self::record(&mut state, format!("clear:{element}"));
        state.dom.set_attr(node, "value", "")?;
        let view = NodeView::of(&state.dom, node);
        state.dispatch(&MockEvent::Clear(view));
        Ok(())
    }

    async fn execute_script(&self, script: &str, args: Vec<ScriptArg>) -> VeoResult<Value> {
        let mut state = self.state()?;
        Self::record(&mut state, format!("execute_script:{}", script.len()));

        let mut values = Vec::with_capacity(args.len());
        let mut nodes = Vec::with_capacity(args.len());
        for arg in &args {
            match arg {
                ScriptArg::Element(id) => {
                    let node = state.resolve(id)?;
                    nodes.push(Some(node));
                    values.push(ScriptValue::Node(NodeView::of(&state.dom, node)));
                }
                ScriptArg::Value(v) => {
                    nodes.push(None);
                    values.push(ScriptValue::Value(v.clone()));
                }
            }
        }

        if script == scripts::SCROLL_TOP || script == scripts::DISABLE_ANIMATIONS {
            return Ok(Value::Null);
        }
        if script == scripts::SET_INPUT_VALUE {
            let (Some(Some(node)), Some(value)) = (nodes.first().copied(), values.get(1)) else {
                return Err(VeoError::Script {
                    message: "setInputValue expects an element and a value".to_string(),
                });
            };
            let text = match value {
                ScriptValue::Value(Value::String(s)) => s.clone(),
                ScriptValue::Value(other) => other.to_string(),
                ScriptValue::Node(_) => String::new(),
            };
            state.dom.set_attr(node, "value", text)?;
            let view = NodeView::of(&state.dom, node);
            state.dispatch(&MockEvent::Input {
                node: view,
                keys: String::new(),
            });
            return Ok(Value::Null);
        }

        Ok(state.dispatch(&MockEvent::Script {
            script: script.to_string(),
            args: values,
        }))
    }

    async fn wait_for_angular(&self) -> VeoResult<()> {
        let mut state = self.state()?;
        Self::record(&mut state, "wait_for_angular".to_string());
        Ok(())
    }
}

/// App rendering a fixed document, handy for element level tests
#[derive(Debug, Clone)]
pub struct StaticApp {
    path: String,
    body: El,
}

impl StaticApp {
    /// App showing `body` at `path`
    #[must_use]
    pub fn new(path: impl Into<String>, body: El) -> Self {
        Self {
            path: path.into(),
            body,
        }
    }
}

impl MockApp for StaticApp {
    fn render(&self) -> El {
        self.body.clone()
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn navigate(&mut self, path: &str) {
        self.path = path.to_string();
    }

    fn handle(&mut self, _event: &MockEvent) -> Reaction {
        Reaction::ignored()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn form() -> El {
        El::new("body").child(
            El::new("form").children([
                El::new("input").attr("type", "text").attr("name", "title"),
                El::new("label").child(El::new("input").attr("type", "checkbox")).text("Publish"),
                El::new("select").children([
                    El::new("option").text("a").attr("selected", "selected"),
                    El::new("option").text("b"),
                ]),
                El::new("button").text("hidden").hidden(true),
            ]),
        )
    }

    fn browser() -> MockBrowser<StaticApp> {
        MockBrowser::new("http://localhost/", StaticApp::new("be/", form()))
    }

    async fn first(browser: &MockBrowser<StaticApp>, css: &str) -> ElementId {
        browser
            .find_elements(None, &Locator::css(css))
            .await
            .unwrap()
            .remove(0)
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_get_strips_base_url() {
            let browser = browser();
            browser.get("http://localhost/be/videos").await.unwrap();
            assert_eq!(browser.current_url().await.unwrap(), "http://localhost/be/videos");
            assert!(browser.was_called("get:"));
        }

        #[tokio::test]
        async fn test_navigation_makes_handles_stale() {
            let browser = browser();
            let input = first(&browser, "input").await;
            browser.refresh().await.unwrap();
            let err = browser.text(&input).await.unwrap_err();
            assert!(matches!(err, VeoError::StaleElement { .. }));
        }
    }

    mod default_behaviour_tests {
        use super::*;

        #[tokio::test]
        async fn test_typing_and_special_keys() {
            let browser = browser();
            let input = first(&browser, "input[type=\"text\"]").await;
            browser.send_keys(&input, "abd").await.unwrap();
            browser.send_keys(&input, keys::BACK_SPACE).await.unwrap();
            browser.send_keys(&input, &format!("c{}", keys::ENTER)).await.unwrap();
            assert_eq!(browser.attribute(&input, "value").await.unwrap().as_deref(), Some("abc"));
            browser.clear(&input).await.unwrap();
            assert_eq!(browser.attribute(&input, "value").await.unwrap().as_deref(), Some(""));
        }

        #[tokio::test]
        async fn test_label_click_toggles_its_checkbox() {
            let browser = browser();
            let label = first(&browser, "label").await;
            let checkbox = first(&browser, "input[type=\"checkbox\"]").await;
            browser.click(&label).await.unwrap();
            assert!(browser.attribute(&checkbox, "checked").await.unwrap().is_some());
            browser.click(&checkbox).await.unwrap();
            assert!(browser.attribute(&checkbox, "checked").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_option_click_moves_selection() {
            let browser = browser();
            let options = browser.find_elements(None, &Locator::css("option")).await.unwrap();
            browser.click(&options[1]).await.unwrap();
            assert!(browser.attribute(&options[0], "selected").await.unwrap().is_none());
            assert!(browser.attribute(&options[1], "selected").await.unwrap().is_some());
        }

        #[tokio::test]
        async fn test_hidden_element_not_interactable() {
            let browser = browser();
            let button = first(&browser, "button").await;
            assert!(!browser.is_displayed(&button).await.unwrap());
            assert!(matches!(
                browser.click(&button).await.unwrap_err(),
                VeoError::Driver { .. }
            ));
        }

        #[tokio::test]
        async fn test_set_input_value_script() {
            let browser = browser();
            let input = first(&browser, "input[type=\"text\"]").await;
            browser
                .execute_script(
                    scripts::SET_INPUT_VALUE,
                    vec![input.clone().into(), serde_json::json!(12).into()],
                )
                .await
                .unwrap();
            assert_eq!(browser.attribute(&input, "value").await.unwrap().as_deref(), Some("12"));
        }
    }

    mod bookkeeping_tests {
        use super::*;

        #[tokio::test]
        async fn test_history_and_window() {
            let browser = browser();
            browser.set_window_size(800, 600).await.unwrap();
            browser.wait_for_angular().await.unwrap();
            assert_eq!(browser.window_size(), (800, 600));
            assert_eq!(browser.call_count("wait_for_angular"), 1);
            let shot = browser.screenshot().await.unwrap();
            assert!(shot.is_png());
        }

        #[tokio::test]
        async fn test_with_app_rerenders() {
            let browser = browser();
            let before = browser.generation();
            browser.with_app(|app| app.navigate("be/login")).unwrap();
            assert_eq!(browser.generation(), before + 1);
            assert_eq!(browser.current_url().await.unwrap(), "http://localhost/be/login");
        }
    }
}
