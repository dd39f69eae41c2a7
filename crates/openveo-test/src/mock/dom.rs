//! In-memory document used by the mock browser.
//!
//! Documents are built declaratively with [`El`] and frozen into a [`Dom`]
//! arena. The arena answers the lookups page objects need: a CSS subset
//! (tag, `#id`, `.class`, `[attr]`, `[attr="v"]`, `[attr^="v"]`,
//! `[attr*="v"]`, descendant and child combinators, selector lists), relative
//! XPath steps (`..`, `./tag`, `./*`) and the AngularJS binding, model and
//! repeater strategies.

use crate::locator::{Locator, Point};
use crate::result::{VeoError, VeoResult};
use std::collections::BTreeMap;

/// Index of a node in a [`Dom`]
pub type NodeId = usize;

/// Declarative element used to build documents
#[derive(Debug, Clone, Default)]
pub struct El {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    children: Vec<El>,
    hidden: bool,
}

impl El {
    /// Element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            ..Self::default()
        }
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set an attribute when `condition` holds
    #[must_use]
    pub fn attr_if(
        self,
        condition: bool,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        if condition {
            self.attr(name, value)
        } else {
            self
        }
    }

    /// Append a class
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        let entry = self.attrs.entry("class".to_string()).or_default();
        if !entry.is_empty() {
            entry.push(' ');
        }
        entry.push_str(class);
        self
    }

    /// Append a class when `condition` holds
    #[must_use]
    pub fn class_if(self, condition: bool, class: &str) -> Self {
        if condition {
            self.class(class)
        } else {
            self
        }
    }

    /// Set the id attribute
    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Set the own text of the element
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: El) -> Self {
        self.children.push(child);
        self
    }

    /// Append children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = El>) -> Self {
        self.children.extend(children);
        self
    }

    /// Hide the element (and its subtree) when `hidden` holds
    #[must_use]
    pub const fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

/// A frozen element
#[derive(Debug, Clone)]
pub struct Node {
    /// Lower-case tag name
    pub tag: String,
    /// Attributes
    pub attrs: BTreeMap<String, String>,
    /// Own text
    pub text: String,
    /// Children in document order
    pub children: Vec<NodeId>,
    /// Parent, `None` for the root
    pub parent: Option<NodeId>,
    /// Whether the element itself is hidden
    pub hidden: bool,
}

impl Node {
    /// Attribute value
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Whether the class attribute lists `class`
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

/// Arena of nodes, node 0 being the `html` root
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
}

impl Dom {
    /// Wrap `body` into an `html` root
    #[must_use]
    pub fn new(body: El) -> Self {
        Self::from_root(El::new("html").child(body))
    }

    /// Freeze an element tree whose root becomes node 0
    #[must_use]
    pub fn from_root(root: El) -> Self {
        let mut dom = Self { nodes: Vec::new() };
        dom.push(root, None);
        dom
    }

    fn push(&mut self, el: El, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: el.tag,
            attrs: el.attrs,
            text: el.text,
            children: Vec::new(),
            parent,
            hidden: el.hidden,
        });
        for child in el.children {
            let child_id = self.push(child, Some(id));
            self.nodes[id].children.push(child_id);
        }
        id
    }

    /// Root node
    #[must_use]
    pub const fn root(&self) -> NodeId {
        0
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by id
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn node_ok(&self, id: NodeId) -> VeoResult<&Node> {
        self.nodes.get(id).ok_or_else(|| VeoError::StaleElement {
            id: id.to_string(),
        })
    }

    /// Set an attribute in place
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> VeoResult<()> {
        self.node_ok(id)?;
        self.nodes[id].attrs.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Remove an attribute in place
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> VeoResult<()> {
        self.node_ok(id)?;
        self.nodes[id].attrs.remove(name);
        Ok(())
    }

    /// Attribute value
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).and_then(|n| n.attr(name))
    }

    /// Parent of a node
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Ancestors from the parent up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// Descendants in document order, `id` excluded
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .node(id)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            out.push(next);
            if let Some(node) = self.node(next) {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Whether the node and all its ancestors are rendered
    #[must_use]
    pub fn is_displayed(&self, id: NodeId) -> bool {
        match self.node(id) {
            None => false,
            Some(node) if node.hidden => false,
            Some(_) => self
                .ancestors(id)
                .all(|a| self.node(a).is_some_and(|n| !n.hidden)),
        }
    }

    /// Whether the node accepts interaction
    #[must_use]
    pub fn is_enabled(&self, id: NodeId) -> bool {
        self.node(id).is_some_and(|n| n.attr("disabled").is_none())
    }

    /// Rendered text: empty for hidden nodes, hidden children skipped
    #[must_use]
    pub fn text(&self, id: NodeId) -> String {
        if !self.is_displayed(id) {
            return String::new();
        }
        self.collect_text(id, true)
    }

    /// Raw text content, visibility ignored
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.collect_text(id, false)
    }

    fn collect_text(&self, id: NodeId, visible_only: bool) -> String {
        let Some(node) = self.node(id) else {
            return String::new();
        };
        let mut parts = Vec::new();
        let own = node.text.trim();
        if !own.is_empty() {
            parts.push(own.to_string());
        }
        for &child in &node.children {
            if visible_only && self.node(child).is_some_and(|c| c.hidden) {
                continue;
            }
            let text = self.collect_text(child, visible_only);
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join(" ")
    }

    /// Fake layout position: one line per node in document order
    #[must_use]
    pub fn location(&self, id: NodeId) -> Point {
        let depth = self.ancestors(id).count();
        Point::new(depth as f64 * 10.0, id as f64 * 20.0)
    }

    /// First node carrying `name="value"`
    #[must_use]
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        (0..self.nodes.len()).find(|&id| self.attr(id, name) == Some(value))
    }

    /// Nodes matching `locator`, searching under `scope` (or the whole document)
    pub fn query(&self, scope: Option<NodeId>, locator: &Locator) -> VeoResult<Vec<NodeId>> {
        if let Some(scope) = scope {
            self.node_ok(scope)?;
        }
        let candidates = || match scope {
            Some(scope) => self.descendants(scope),
            None => {
                let mut all = vec![self.root()];
                all.extend(self.descendants(self.root()));
                all
            }
        };
        let attr_filter = |name: &str, test: &dyn Fn(&str) -> bool| -> Vec<NodeId> {
            candidates()
                .into_iter()
                .filter(|&id| self.attr(id, name).is_some_and(test))
                .collect()
        };

        match locator {
            Locator::Css(css) => {
                let selector = CssSelector::parse(css)?;
                Ok(candidates()
                    .into_iter()
                    .filter(|&id| selector.matches(self, id))
                    .collect())
            }
            Locator::CssContainingText { css, text } => {
                let selector = CssSelector::parse(css)?;
                Ok(candidates()
                    .into_iter()
                    .filter(|&id| {
                        selector.matches(self, id) && self.text_content(id).contains(text)
                    })
                    .collect())
            }
            Locator::XPath(expression) => self.xpath(scope.unwrap_or(self.root()), expression),
            Locator::Binding(expr) => Ok(attr_filter("ng-bind", &|v| v.contains(expr.as_str()))),
            Locator::ExactBinding(expr) => Ok(attr_filter("ng-bind", &|v| v.trim() == expr)),
            Locator::Model(expr) => Ok(attr_filter("ng-model", &|v| v == expr)),
            Locator::Repeater(expr) => Ok(attr_filter("ng-repeat", &|v| v.contains(expr.as_str()))),
            Locator::Id(id) => Ok(attr_filter("id", &|v| v == id)),
            Locator::ClassName(class) => Ok(candidates()
                .into_iter()
                .filter(|&id| self.node(id).is_some_and(|n| n.has_class(class)))
                .collect()),
        }
    }

    fn xpath(&self, context: NodeId, expression: &str) -> VeoResult<Vec<NodeId>> {
        let expression = expression.trim();
        if expression == ".." {
            return Ok(self.parent(context).into_iter().collect());
        }
        if expression == "." {
            return Ok(vec![context]);
        }
        if let Some(tag) = expression.strip_prefix("./") {
            let tag = tag.to_lowercase();
            let children = self.node_ok(context)?.children.clone();
            return Ok(children
                .into_iter()
                .filter(|&c| tag == "*" || self.node(c).is_some_and(|n| n.tag == tag))
                .collect());
        }
        Err(VeoError::Driver {
            message: format!("unsupported xpath expression: {expression}"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrTest {
    Exists(String),
    Equals(String, String),
    Prefix(String, String),
    Contains(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, node: &Node) -> bool {
        if self.tag.as_ref().is_some_and(|t| t != "*" && *t != node.tag) {
            return false;
        }
        if self.id.as_ref().is_some_and(|id| node.attr("id") != Some(id.as_str())) {
            return false;
        }
        if !self.classes.iter().all(|c| node.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|test| match test {
            AttrTest::Exists(name) => node.attr(name).is_some(),
            AttrTest::Equals(name, value) => node.attr(name) == Some(value.as_str()),
            AttrTest::Prefix(name, value) => {
                node.attr(name).is_some_and(|v| v.starts_with(value.as_str()))
            }
            AttrTest::Contains(name, value) => {
                node.attr(name).is_some_and(|v| v.contains(value.as_str()))
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One selector of a list: compounds joined by combinators
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

impl Complex {
    fn matches_at(&self, dom: &Dom, id: NodeId, index: usize) -> bool {
        let Some(node) = dom.node(id) else {
            return false;
        };
        if !self.compounds[index].matches(node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => dom
                .parent(id)
                .is_some_and(|p| self.matches_at(dom, p, index - 1)),
            Combinator::Descendant => dom
                .ancestors(id)
                .any(|a| self.matches_at(dom, a, index - 1)),
        }
    }
}

/// Parsed CSS selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssSelector {
    alternatives: Vec<Complex>,
}

impl CssSelector {
    /// Parse the supported CSS subset
    pub fn parse(input: &str) -> VeoResult<Self> {
        let unsupported = |why: &str| VeoError::Driver {
            message: format!("unsupported css selector {input:?}: {why}"),
        };
        let mut alternatives = Vec::new();
        for part in split_outside_brackets(input, ',') {
            let mut compounds = Vec::new();
            let mut combinators = Vec::new();
            let mut current = Compound::default();
            let mut pending: Option<Combinator> = None;
            let chars: Vec<char> = part.trim().chars().collect();
            let mut i = 0;
            while i < chars.len() {
                let c = chars[i];
                match c {
                    ' ' | '>' => {
                        if !current.is_empty() {
                            compounds.push(std::mem::take(&mut current));
                            pending = Some(Combinator::Descendant);
                        }
                        if c == '>' {
                            if compounds.is_empty() {
                                return Err(unsupported("leading combinator"));
                            }
                            pending = Some(Combinator::Child);
                        }
                        i += 1;
                    }
                    '.' | '#' => {
                        if let Some(comb) = pending.take() {
                            combinators.push(comb);
                        }
                        let (name, next) = read_ident(&chars, i + 1);
                        if name.is_empty() {
                            return Err(unsupported("empty name"));
                        }
                        if c == '.' {
                            current.classes.push(name);
                        } else {
                            current.id = Some(name);
                        }
                        i = next;
                    }
                    '[' => {
                        if let Some(comb) = pending.take() {
                            combinators.push(comb);
                        }
                        let end = chars[i..]
                            .iter()
                            .position(|&ch| ch == ']')
                            .map(|p| p + i)
                            .ok_or_else(|| unsupported("unterminated attribute"))?;
                        let body: String = chars[i + 1..end].iter().collect();
                        let test =
                            parse_attr(&body).ok_or_else(|| unsupported("attribute test"))?;
                        current.attrs.push(test);
                        i = end + 1;
                    }
                    ':' => return Err(unsupported("pseudo classes")),
                    _ => {
                        if let Some(comb) = pending.take() {
                            combinators.push(comb);
                        }
                        let (name, next) = read_ident(&chars, i);
                        if name.is_empty() {
                            return Err(unsupported("unexpected character"));
                        }
                        current.tag = Some(name.to_lowercase());
                        i = next;
                    }
                }
            }
            if current.is_empty() {
                return Err(unsupported("dangling combinator or empty selector"));
            }
            compounds.push(current);
            if combinators.len() + 1 != compounds.len() {
                return Err(unsupported("combinator mismatch"));
            }
            alternatives.push(Complex {
                compounds,
                combinators,
            });
        }
        Ok(Self { alternatives })
    }

    /// Whether the node matches one of the alternatives
    #[must_use]
    pub fn matches(&self, dom: &Dom, id: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|c| c.matches_at(dom, id, c.compounds.len() - 1))
    }
}

fn read_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len()
        && (chars[end].is_alphanumeric() || matches!(chars[end], '-' | '_' | '*'))
    {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

fn parse_attr(body: &str) -> Option<AttrTest> {
    let unquote = |v: &str| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
    if let Some((name, value)) = body.split_once("^=") {
        return Some(AttrTest::Prefix(name.trim().to_string(), unquote(value)));
    }
    if let Some((name, value)) = body.split_once("*=") {
        return Some(AttrTest::Contains(name.trim().to_string(), unquote(value)));
    }
    if let Some((name, value)) = body.split_once('=') {
        return Some(AttrTest::Equals(name.trim().to_string(), unquote(value)));
    }
    let name = body.trim();
    (!name.is_empty()).then(|| AttrTest::Exists(name.to_string()))
}

fn split_outside_brackets(input: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in input.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if c == separator && depth == 0 {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample() -> Dom {
        Dom::new(
            El::new("body").child(
                El::new("div").class("datatable").child(
                    El::new("table")
                        .child(El::new("thead").child(El::new("tr").children([
                            El::new("th").text("Name"),
                            El::new("th").text("Actions"),
                        ])))
                        .child(El::new("tbody").children([
                            El::new("tr").child(El::new("td").text("first")),
                            El::new("tr").class("detail").child(El::new("td").text("detail")),
                            El::new("tr").child(El::new("td").text("second").child(
                                El::new("span").class("sr-only").text("hidden").hidden(true),
                            )),
                        ])),
                ),
            ),
        )
    }

    fn css(dom: &Dom, selector: &str) -> Vec<NodeId> {
        dom.query(None, &Locator::css(selector)).unwrap()
    }

    mod css_tests {
        use super::*;

        #[test]
        fn test_descendant_and_child() {
            let dom = sample();
            assert_eq!(css(&dom, ".datatable table").len(), 1);
            assert_eq!(css(&dom, "tbody > tr").len(), 3);
            assert_eq!(css(&dom, "table > tr").len(), 0);
            assert_eq!(css(&dom, ".datatable tr.detail").len(), 1);
            assert_eq!(css(&dom, "thead th").len(), 2);
        }

        #[test]
        fn test_attribute_tests() {
            let dom = Dom::new(El::new("body").children([
                El::new("input").attr("type", "checkbox"),
                El::new("input").attr("type", "text").attr("uib-datepicker-popup", ""),
                El::new("div").attr("ng-repeat", "match in matches"),
            ]));
            assert_eq!(css(&dom, "input[type=\"checkbox\"]").len(), 1);
            assert_eq!(css(&dom, "input[type=checkbox]").len(), 1);
            assert_eq!(css(&dom, "input[uib-datepicker-popup]").len(), 1);
            assert_eq!(css(&dom, "[ng-repeat^=\"match\"]").len(), 1);
            assert_eq!(css(&dom, "[ng-repeat*=\"in match\"]").len(), 1);
        }

        #[test]
        fn test_selector_list() {
            let dom = sample();
            assert_eq!(css(&dom, "th, td").len(), 5);
        }

        #[test]
        fn test_scope_restricts_results() {
            let dom = sample();
            let rows = css(&dom, "tbody > tr");
            let cells = dom.query(Some(rows[0]), &Locator::css("td")).unwrap();
            assert_eq!(cells.len(), 1);
            assert_eq!(dom.text(cells[0]), "first");
        }

        #[test]
        fn test_unsupported_pseudo_class() {
            assert!(CssSelector::parse("li:first-child").is_err());
            assert!(CssSelector::parse("> li").is_err());
            assert!(CssSelector::parse("ul >").is_err());
        }
    }

    mod strategy_tests {
        use super::*;

        #[test]
        fn test_xpath_steps() {
            let dom = sample();
            let th = css(&dom, "th")[0];
            let tr = dom.query(Some(th), &Locator::xpath("..")).unwrap();
            assert_eq!(dom.node(tr[0]).unwrap().tag, "tr");
            let ths = dom.query(Some(tr[0]), &Locator::xpath("./th")).unwrap();
            assert_eq!(ths.len(), 2);
            assert!(dom.query(Some(th), &Locator::xpath("//div")).is_err());
        }

        #[test]
        fn test_angular_strategies() {
            let dom = Dom::new(El::new("body").children([
                El::new("span").attr("ng-bind", "pagination.page").text("1"),
                El::new("span").attr("ng-bind", "pagination.pages").text("3"),
                El::new("input").attr("ng-model", "userEmail"),
                El::new("li").attr("ng-repeat", "numPage in rangePage track by $index"),
            ]));
            let count = |locator: Locator| dom.query(None, &locator).unwrap().len();
            assert_eq!(count(Locator::binding("pagination.page")), 2);
            assert_eq!(count(Locator::exact_binding("pagination.page")), 1);
            assert_eq!(count(Locator::model("userEmail")), 1);
            assert_eq!(count(Locator::repeater("numPage in rangePage")), 1);
        }

        #[test]
        fn test_css_containing_text_ignores_visibility() {
            let dom = sample();
            let found = dom
                .query(None, &Locator::css_containing_text("td", "hidden"))
                .unwrap();
            assert_eq!(found.len(), 1);
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_text_skips_hidden_children() {
            let dom = sample();
            let cells = css(&dom, "td");
            assert_eq!(dom.text(cells[2]), "second");
            assert_eq!(dom.text_content(cells[2]), "second hidden");
        }

        #[test]
        fn test_hidden_ancestor_hides_subtree() {
            let dom = Dom::new(
                El::new("body").child(El::new("ul").hidden(true).child(El::new("li").text("x"))),
            );
            let li = css(&dom, "li")[0];
            assert!(!dom.is_displayed(li));
            assert_eq!(dom.text(li), "");
        }

        #[test]
        fn test_set_and_remove_attr() {
            let mut dom = sample();
            let th = css(&dom, "th")[0];
            dom.set_attr(th, "disabled", "disabled").unwrap();
            assert!(!dom.is_enabled(th));
            dom.remove_attr(th, "disabled").unwrap();
            assert!(dom.is_enabled(th));
            assert!(dom.set_attr(10_000, "x", "y").is_err());
        }
    }
}
