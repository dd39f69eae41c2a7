//! Fake edition form holding one field of every kind.
//!
//! Labels, in document order: Title (text, required), Description (textarea),
//! Author (auto-complete), Body (TinyMCE), Category (select), Publish
//! (checkbox), Platforms (checkboxes), Release (date), Start (date-time),
//! Duration (time, between 00:00:00 and 12:00:00), Keywords (tags), Mappings
//! (match) and Identifier (static text).

use super::browser::{MockApp, MockEvent, NodeView, Reaction, ScriptValue};
use super::dom::El;
use crate::driver::keys;
use crate::scripts;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Authors proposed by the Author field
pub const AUTHORS: [&str; 3] = ["Alice", "Albert", "Bob"];

/// Keywords proposed by the tag inputs
pub const KEYWORDS: [&str; 3] = ["rust", "ruby", "python"];

/// Platforms of the Platforms field; the last one is required
pub const PLATFORMS: [&str; 3] = ["YouTube", "Vimeo", "Local"];

/// Categories of the Category field, after the empty option
pub const CATEGORIES: [&str; 2] = ["News", "Sport"];

/// Static text of the Identifier field
pub const IDENTIFIER: &str = "42";

fn has_class(node: &NodeView, class: &str) -> bool {
    node.attr("class")
        .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

#[derive(Debug, Clone, Default)]
struct MatchRow {
    text: String,
    tags: Vec<String>,
}

/// Form app
#[derive(Debug, Clone)]
pub struct FakeForm {
    path: String,
    values: BTreeMap<String, String>,
    suggesting: BTreeSet<String>,
    category: String,
    publish: bool,
    platforms: BTreeSet<String>,
    keywords: Vec<String>,
    matches: Vec<MatchRow>,
    body: String,
    errors: BTreeSet<String>,
}

impl Default for FakeForm {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeForm {
    #[must_use]
    pub fn new() -> Self {
        let mut values = BTreeMap::new();
        values.insert("duration".to_string(), "00:00:00.000".to_string());
        Self {
            path: "be/form".to_string(),
            values,
            suggesting: BTreeSet::new(),
            category: String::new(),
            publish: false,
            platforms: BTreeSet::new(),
            keywords: Vec::new(),
            matches: Vec::new(),
            body: String::new(),
            errors: BTreeSet::new(),
        }
    }

    /// Show the field labelled `label` on error
    #[must_use]
    pub fn with_error(mut self, label: &str) -> Self {
        self.errors.insert(label.to_string());
        self
    }

    /// Value of the input named `name`
    #[must_use]
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map_or("", String::as_str)
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub const fn is_published(&self) -> bool {
        self.publish
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    fn input(&self, name: &str) -> El {
        El::new("input").attr("name", name).attr("value", self.value(name))
    }

    fn suggestions(&self, name: &str, options: &[&str]) -> El {
        let typed = self.value(name);
        let open = self.suggesting.contains(name);
        El::new("ul").class("dropdown-menu").hidden(!open).children(
            options
                .iter()
                .filter(|option| open && option.starts_with(typed))
                .map(|option| {
                    El::new("li").child(El::new("div").attr("data-suggest", name).text(*option))
                }),
        )
    }

    fn tag_list(field: &str, tags: &[String]) -> El {
        El::new("ul").children(tags.iter().enumerate().map(|(i, tag)| {
            El::new("li").text(tag.as_str()).child(
                El::new("a")
                    .class("remove")
                    .attr("data-field", field)
                    .attr("data-index", i.to_string()),
            )
        }))
    }

    fn group(&self, label: &str, required: bool, content: impl IntoIterator<Item = El>) -> El {
        let on_error = self.errors.contains(label);
        let label_text = if required { format!("{label} *") } else { label.to_string() };
        El::new("div")
            .class("form-group")
            .class_if(on_error, "has-error")
            .child(El::new("label").text(label_text))
            .children(content)
            .child(
                El::new("div").class("has-error").hidden(!on_error).child(
                    El::new("span")
                        .attr("ng-bind", "field.$error.message")
                        .text("Invalid value"),
                ),
            )
            .child(El::new("p").text(format!("Help for {label}")))
    }

    fn match_row(&self, i: usize, row: &MatchRow) -> El {
        let tags_input = format!("match-tags-{i}");
        El::new("div")
            .attr("ng-repeat", "match in matches")
            .children([
                El::new("div").child(
                    El::new("input")
                        .attr("name", format!("match-text-{i}"))
                        .attr("placeholder", "Text")
                        .attr("value", row.text.as_str()),
                ),
                El::new("div").class("ov-field-tags").children([
                    Self::tag_list(&format!("match-{i}"), &row.tags),
                    self.input(&tags_input).attr("placeholder", "Tags"),
                    self.suggestions(&tags_input, &KEYWORDS),
                ]),
                El::new("button")
                    .class("ov-field-match-remove-icon")
                    .attr("data-index", i.to_string()),
            ])
    }

    fn tags_of(&mut self, input: &str) -> Option<&mut Vec<String>> {
        if input == "keywords" {
            return Some(&mut self.keywords);
        }
        let i: usize = input.strip_prefix("match-tags-")?.parse().ok()?;
        self.matches.get_mut(i).map(|row| &mut row.tags)
    }

    fn is_tags_input(name: &str) -> bool {
        name == "keywords" || name.starts_with("match-tags-")
    }

    fn store_value(&mut self, name: &str, value: &str) {
        if let Some(i) = name.strip_prefix("match-text-").and_then(|i| i.parse::<usize>().ok()) {
            if let Some(row) = self.matches.get_mut(i) {
                row.text = value.to_string();
            }
        }
        self.values.insert(name.to_string(), value.to_string());
    }

    fn on_input(&mut self, node: &NodeView, typed: &str) -> Reaction {
        let Some(name) = node.attr("name").map(str::to_string) else {
            return Reaction::ignored();
        };
        let value = node.value().to_string();
        if Self::is_tags_input(&name) && typed.ends_with(keys::ENTER) {
            if !value.is_empty() {
                if let Some(tags) = self.tags_of(&name) {
                    tags.push(value);
                }
            }
            self.store_value(&name, "");
            self.suggesting.remove(&name);
            return Reaction::rerender();
        }
        self.store_value(&name, &value);
        if Self::is_tags_input(&name) || name == "author" {
            if value.is_empty() {
                self.suggesting.remove(&name);
            } else {
                self.suggesting.insert(name);
            }
            return Reaction::rerender();
        }
        Reaction::ignored()
    }

    fn on_click(&mut self, node: &NodeView) -> Reaction {
        if let Some(field) = node.attr("data-suggest").map(str::to_string) {
            self.suggesting.remove(&field);
            if field == "author" {
                self.store_value(&field, &node.text);
            } else {
                self.store_value(&field, "");
                if let Some(tags) = self.tags_of(&field) {
                    tags.push(node.text.clone());
                }
            }
            return Reaction::rerender();
        }
        if has_class(node, "remove") {
            let index: Option<usize> = node.attr("data-index").and_then(|i| i.parse().ok());
            let field = node.attr("data-field").unwrap_or("");
            let input = if field == "keywords" {
                field.to_string()
            } else {
                field.replacen("match-", "match-tags-", 1)
            };
            if let (Some(index), Some(tags)) = (index, self.tags_of(&input)) {
                if index < tags.len() {
                    tags.remove(index);
                }
            }
            return Reaction::rerender();
        }
        if has_class(node, "ov-field-match-add-button") {
            self.matches.push(MatchRow::default());
            return Reaction::rerender();
        }
        if has_class(node, "ov-field-match-remove-icon") {
            if let Some(index) = node.attr("data-index").and_then(|i| i.parse::<usize>().ok()) {
                if index < self.matches.len() {
                    self.matches.remove(index);
                }
            }
            return Reaction::rerender();
        }
        match (node.tag.as_str(), node.attr("name")) {
            ("input", Some("publish")) => self.publish = node.is_checked(),
            ("input", Some("platforms")) => {
                let platform = node.value().to_string();
                if node.is_checked() {
                    self.platforms.insert(platform);
                } else {
                    self.platforms.remove(&platform);
                }
            }
            ("option", _) => self.category = node.text.clone(),
            _ => {}
        }
        Reaction::ignored()
    }

    fn on_script(&mut self, script: &str, args: &[ScriptValue]) -> Reaction {
        let text_arg = |i: usize| {
            args.get(i).and_then(ScriptValue::as_str).unwrap_or("").to_string()
        };
        if script == scripts::TINYMCE_GET_CONTENT {
            return Reaction::value(Value::String(self.body.clone()));
        }
        if script == scripts::TINYMCE_SET_CONTENT {
            self.body = text_arg(0);
        } else if script == scripts::TINYMCE_INSERT_CONTENT {
            self.body.push_str(&text_arg(0));
        } else if script == scripts::SET_TIME {
            let name = args.first().and_then(ScriptValue::node).and_then(|n| n.attr("name"));
            if let Some(name) = name {
                let name = name.to_string();
                self.store_value(&name, &format!("{}.000", text_arg(1)));
                return Reaction::rerender();
            }
        }
        Reaction::ignored()
    }
}

impl MockApp for FakeForm {
    fn render(&self) -> El {
        let category = El::new("select").attr("name", "category").children(
            std::iter::once("").chain(CATEGORIES).map(|option| {
                El::new("option")
                    .text(option)
                    .attr_if(option == self.category, "selected", "selected")
            }),
        );
        let platforms = PLATFORMS.iter().map(|platform| {
            let text = if *platform == "Local" {
                format!("{platform} *")
            } else {
                (*platform).to_string()
            };
            El::new("div").class("checkbox").child(
                El::new("label")
                    .child(
                        El::new("input")
                            .attr("type", "checkbox")
                            .attr("name", "platforms")
                            .attr("value", *platform)
                            .attr_if(self.platforms.contains(*platform), "checked", "true"),
                    )
                    .text(text),
            )
        });

        let form = El::new("form").class("detail").children([
            self.group("Title", true, [
                El::new("div").child(self.input("title").attr("type", "text"))
            ]),
            self.group("Description", false, [El::new("div").child(
                El::new("textarea")
                    .attr("name", "description")
                    .attr("value", self.value("description")),
            )]),
            self.group("Author", false, [
                El::new("div").child(self.input("author")),
                self.suggestions("author", &AUTHORS),
            ]),
            self.group("Body", false, [El::new("div").class("tinymce")]),
            self.group("Category", false, [El::new("div").child(category)]),
            self.group("Publish", false, [El::new("div").class("checkbox").child(
                El::new("label")
                    .child(
                        El::new("input")
                            .attr("type", "checkbox")
                            .attr("name", "publish")
                            .attr_if(self.publish, "checked", "true"),
                    )
                    .text("Published"),
            )]),
            self.group("Platforms", false, platforms),
            self.group("Release", false, [
                El::new("div").child(self.input("release").attr("type", "date"))
            ]),
            self.group("Start", false, [
                El::new("div")
                    .child(self.input("start-date").attr("uib-datepicker-popup", "shortDate")),
                El::new("div").class("hours").child(self.input("start-hours")),
                El::new("div").class("minutes").child(self.input("start-minutes")),
            ]),
            self.group("Duration", false, [El::new("div").child(
                self.input("duration")
                    .attr("type", "time")
                    .attr("min", "00:00:00")
                    .attr("max", "12:00:00"),
            )]),
            self.group("Keywords", false, [El::new("div").class("tags").children([
                Self::tag_list("keywords", &self.keywords),
                self.input("keywords"),
                self.suggestions("keywords", &KEYWORDS),
            ])]),
            self.group(
                "Mappings",
                false,
                self.matches
                    .iter()
                    .enumerate()
                    .map(|(i, row)| self.match_row(i, row))
                    .chain([
                        El::new("span").class("ov-field-match-add-label").text("Add a mapping"),
                        El::new("button").class("ov-field-match-add-button"),
                    ])
                    .collect::<Vec<_>>(),
            ),
            self.group("Identifier", false, [
                El::new("div").child(El::new("div").text(IDENTIFIER))
            ]),
        ]);
        El::new("body").child(form)
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn navigate(&mut self, path: &str) {
        self.path = path.to_string();
    }

    fn title(&self) -> String {
        "Form".to_string()
    }

    fn handle(&mut self, event: &MockEvent) -> Reaction {
        match event {
            MockEvent::Input { node, keys } => self.on_input(node, keys),
            MockEvent::Clear(node) => {
                let name = node.attr("name").unwrap_or("").to_string();
                self.store_value(&name, "");
                if self.suggesting.remove(&name) {
                    return Reaction::rerender();
                }
                Reaction::ignored()
            }
            MockEvent::Click(node) => self.on_click(node),
            MockEvent::Script { script, args } => self.on_script(script, args),
            MockEvent::Hover(_) => Reaction::ignored(),
        }
    }
}
