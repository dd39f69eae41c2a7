//! Fake OpenVeo back office.
//!
//! Serves the login page, the navigation bar, the left menu and a CRUD page
//! listing the entities of a shared [`MemoryStore`] at [`ENTITIES_PATH`]. The
//! entity table is paginated by the "server" (this app) and its page links are
//! shown [`RANGE_SIZE`] at a time.
//!
//! The table starts sorted ascending on its first column. Reloading a page
//! resets the table state (page, sort, search, selection) but keeps the
//! session and the interface language.

use super::browser::{MockApp, MockEvent, NodeView, Reaction};
use super::dom::El;
use crate::config::User;
use crate::fields::{Field, FieldConfig, FieldKind, FieldValue};
use crate::helper::{Entity, MemoryStore};
use crate::i18n::{MemoryTranslations, BACK_OFFICE_DICTIONARY, COMMON_DICTIONARY};
use crate::locator::Finder;
use crate::pages::{Table, TableForms};
use crate::result::VeoResult;
use crate::session::Session;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Login page
pub const LOGIN_PATH: &str = "be/login";

/// Home page of a logged user
pub const HOME_PATH: &str = "be/";

/// CRUD page of the store entities
pub const ENTITIES_PATH: &str = "be/entities";

/// Page links per pagination range
pub const RANGE_SIZE: usize = 3;

/// Items per page proposals, the visible ones depending on the number of lines
pub const ITEMS_PER_PAGE: [usize; 4] = [5, 10, 20, 30];

/// Items per page applied on load
pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

/// Number of items per page buttons shown for a table of `total` lines
#[must_use]
pub fn items_per_page_buttons(total: usize) -> usize {
    if total < 6 {
        0
    } else {
        (total.div_ceil(10) + 1).min(ITEMS_PER_PAGE.len())
    }
}

/// Entry of the left menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    /// Page opened by the item, `None` for items holding a sub menu
    pub path: Option<String>,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    #[must_use]
    pub fn link(label: &str, path: &str) -> Self {
        Self {
            label: label.to_string(),
            path: Some(path.to_string()),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn group(label: &str, children: Vec<Self>) -> Self {
        Self {
            label: label.to_string(),
            path: None,
            children,
        }
    }
}

fn default_menu() -> Vec<MenuItem> {
    vec![
        MenuItem::link("Dashboard", HOME_PATH),
        MenuItem::group(
            "Content",
            vec![
                MenuItem::link("Entities", ENTITIES_PATH),
                MenuItem::link("Categories", "be/categories"),
            ],
        ),
        MenuItem::group(
            "Rights",
            vec![MenuItem::link("Users", "be/users"), MenuItem::link("Roles", "be/roles")],
        ),
    ]
}

/// Dictionaries of the fake, in English and French
#[must_use]
pub fn translations() -> MemoryTranslations {
    MemoryTranslations::new()
        .with(BACK_OFFICE_DICTIONARY, "en", json!({ "UI": { "REMOVE": "Remove" } }))
        .with(BACK_OFFICE_DICTIONARY, "fr", json!({ "UI": { "REMOVE": "Supprimer" } }))
        .with(COMMON_DICTIONARY, "en", json!({ "LOGIN": { "SUBMIT": "Log in" } }))
        .with(COMMON_DICTIONARY, "fr", json!({ "LOGIN": { "SUBMIT": "Connexion" } }))
}

/// Forms of the entity page: a single "Name" field, id `name`
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityForms;

impl EntityForms {
    fn name_field(session: &Session, form: &Finder) -> VeoResult<BTreeMap<String, Field>> {
        let config = FieldConfig::new(FieldKind::Text, "Name").within(form.clone());
        let field = Field::get(session, config)?;
        Ok(BTreeMap::from([("name".to_string(), field)]))
    }
}

#[async_trait]
impl TableForms for EntityForms {
    fn search_fields(
        &self,
        session: &Session,
        form: &Finder,
    ) -> VeoResult<BTreeMap<String, Field>> {
        Self::name_field(session, form)
    }

    fn add_form_fields(
        &self,
        session: &Session,
        form: &Finder,
    ) -> VeoResult<BTreeMap<String, Field>> {
        Self::name_field(session, form)
    }

    fn edit_form_fields(
        &self,
        session: &Session,
        form: &Finder,
    ) -> VeoResult<BTreeMap<String, Field>> {
        Self::name_field(session, form)
    }

    async fn add_line(&self, table: &Table, name: &str, _data: &Value) -> VeoResult<()> {
        table.open_add_form().await?;
        for field in self.add_form_fields(table.session(), &Table::add_form())?.values() {
            field.set_value(&FieldValue::Text(name.to_string())).await?;
        }
        table.submit_add_form().await?;
        table.close_add_form().await
    }
}

fn remove_label(language: &str) -> &'static str {
    if language == "fr" {
        "Supprimer"
    } else {
        "Remove"
    }
}

fn cell_text(entity: &Entity, column: &str) -> String {
    entity
        .get(&column.to_lowercase())
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Table state, reset on every page load
#[derive(Debug, Clone, Default)]
struct TableState {
    page: usize,
    range: usize,
    per_page: usize,
    sort: Option<(String, bool)>,
    search: String,
    search_open: bool,
    add_open: bool,
    add_name: String,
    selected: BTreeSet<String>,
    opened: Option<String>,
    actions_of: Option<String>,
    bulk_open: bool,
    dialog: Option<Vec<String>>,
    popover: bool,
}

impl TableState {
    /// First page, sorted ascending on `column`
    fn sorted_by(column: Option<&String>) -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_ITEMS_PER_PAGE,
            sort: column.map(|c| (c.clone(), true)),
            search_open: true,
            ..Self::default()
        }
    }
}

/// Back office app
#[derive(Debug, Clone)]
pub struct FakeBackOffice {
    store: MemoryStore,
    accounts: Vec<User>,
    columns: Vec<String>,
    menu: Vec<MenuItem>,
    path: String,
    logged: bool,
    email: String,
    password: String,
    language: String,
    language_open: bool,
    menu_open: bool,
    sub_menus: BTreeSet<String>,
    alerts: Vec<String>,
    table: TableState,
}

impl FakeBackOffice {
    /// Back office listing the entities of `store`
    #[must_use]
    pub fn new(store: MemoryStore) -> Self {
        let columns = vec!["Name".to_string(), "Description".to_string()];
        Self {
            store,
            accounts: Vec::new(),
            table: TableState::sorted_by(columns.first()),
            columns,
            menu: default_menu(),
            path: LOGIN_PATH.to_string(),
            logged: false,
            email: String::new(),
            password: String::new(),
            language: "en".to_string(),
            language_open: false,
            menu_open: false,
            sub_menus: BTreeSet::new(),
            alerts: Vec::new(),
        }
    }

    /// Accept logins of `user`
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.accounts.push(user);
        self
    }

    /// Replace the left menu
    #[must_use]
    pub fn with_menu(mut self, menu: Vec<MenuItem>) -> Self {
        self.menu = menu;
        self
    }

    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    #[must_use]
    pub const fn is_logged(&self) -> bool {
        self.logged
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    /// Display an alert
    pub fn push_alert(&mut self, message: impl Into<String>) {
        self.alerts.push(message.into());
    }

    // ------------------------------------------------------------------
    // Table model
    // ------------------------------------------------------------------

    /// Entities matching the search, in display order
    fn listed(&self) -> Vec<Entity> {
        let mut entities: Vec<Entity> = self
            .store
            .entities()
            .unwrap_or_default()
            .into_iter()
            .filter(|e| e.name().contains(self.table.search.as_str()))
            .collect();
        if let Some((column, ascending)) = &self.table.sort {
            entities.sort_by_key(|e| cell_text(e, column));
            if !ascending {
                entities.reverse();
            }
        }
        entities
    }

    fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.table.per_page)
    }

    fn current_page(&self, total_pages: usize) -> usize {
        self.table.page.clamp(1, total_pages.max(1))
    }

    fn page_entities(&self) -> Vec<Entity> {
        let listed = self.listed();
        let page = self.current_page(self.total_pages(listed.len()));
        listed
            .into_iter()
            .skip((page - 1) * self.table.per_page)
            .take(self.table.per_page)
            .collect()
    }

    /// Displayed range, the last one when the pages shrank
    fn current_range(&self, total_pages: usize) -> usize {
        self.table.range.min(total_pages.saturating_sub(1) / RANGE_SIZE)
    }

    fn go_to_page(&mut self, page: usize) {
        self.table.page = page;
        self.table.selected.clear();
        self.table.opened = None;
        self.table.actions_of = None;
    }

    fn remove(&mut self, ids: &[String]) {
        let removed = self.store.delete(ids).unwrap_or(0);
        for id in ids {
            self.table.selected.remove(id);
        }
        if self.table.opened.as_ref().is_some_and(|id| ids.contains(id)) {
            self.table.opened = None;
        }
        self.alerts.push(format!("{removed} element(s) removed"));
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn render_login(&self) -> El {
        El::new("body").child(
            El::new("form").class("login").children([
                El::new("input")
                    .attr("ng-model", "userEmail")
                    .attr("type", "email")
                    .attr("value", self.email.as_str()),
                El::new("input")
                    .attr("ng-model", "password")
                    .attr("type", "password")
                    .attr("value", self.password.as_str()),
                El::new("button")
                    .attr("ng-bind", "'LOGIN.SUBMIT' | translate")
                    .attr("data-role", "login-submit")
                    .text("Log in"),
            ]),
        )
    }

    fn render_navbar(&self) -> El {
        let languages = [("en", "English"), ("fr", "French")].map(|(code, name)| {
            El::new("li").child(
                El::new("a")
                    .class(code)
                    .attr("data-role", "language-option")
                    .attr("data-language", code)
                    .text(name),
            )
        });
        El::new("nav").class("navbar").children([
            El::new("div").class("navbar-header").child(
                El::new("button")
                    .attr("data-role", "toggle-menu")
                    .text("Menu"),
            ),
            El::new("ul").class("nav").children([
                El::new("li").child(El::new("a").attr("href", "profile").text("Profile")),
                El::new("li").class("language").children([
                    El::new("a").attr("data-role", "language").text(self.language.to_uppercase()),
                    El::new("ul").hidden(!self.language_open).children(languages),
                ]),
                El::new("li").child(
                    El::new("a")
                        .attr("href", "logout")
                        .attr("data-role", "logout")
                        .text("Logout"),
                ),
            ]),
        ])
    }

    fn render_menu_item(&self, item: &MenuItem) -> El {
        let link = El::new("a")
            .attr("data-role", "menu")
            .attr("data-label", item.label.as_str())
            .attr_if(item.path.is_some(), "data-path", item.path.clone().unwrap_or_default())
            .text(item.label.as_str());
        let li = El::new("li").child(link);
        if item.children.is_empty() {
            return li;
        }
        li.child(
            El::new("ul")
                .class("sub-menu")
                .hidden(!self.sub_menus.contains(&item.label))
                .children(item.children.iter().map(|c| self.render_menu_item(c))),
        )
    }

    fn render_sidebar(&self) -> El {
        El::new("div")
            .id("sidebar-wrapper")
            .hidden(!self.menu_open)
            .child(El::new("ul").children(self.menu.iter().map(|item| self.render_menu_item(item))))
    }

    fn render_alerts(&self) -> impl Iterator<Item = El> + '_ {
        self.alerts.iter().enumerate().map(|(i, message)| {
            El::new("div").class("alert").children([
                El::new("span").attr("ng-bind", "alert.msg").text(message.as_str()),
                El::new("button")
                    .class("close")
                    .attr("data-role", "alert-close")
                    .attr("data-index", i.to_string())
                    .text("x"),
            ])
        })
    }

    fn name_group(input: El) -> El {
        El::new("div").class("form-group").children([
            El::new("label").text("Name"),
            El::new("div").child(input),
            El::new("div").class("has-error").hidden(true).child(
                El::new("span")
                    .attr("ng-bind", "field.$error.message")
                    .text("Invalid value"),
            ),
        ])
    }

    fn render_add_form(&self) -> El {
        El::new("div").class("add").children([
            El::new("a")
                .class("add-element")
                .attr("data-role", "add-toggle")
                .text("Add"),
            El::new("div")
                .attr("uib-collapse", "isCollapsed")
                .hidden(!self.table.add_open)
                .child(El::new("form").class("add-form").children([
                    Self::name_group(
                        El::new("input")
                            .attr("name", "add-name")
                            .attr("value", self.table.add_name.as_str()),
                    ),
                    El::new("button").attr("data-role", "add-submit").text("Add"),
                ])),
        ])
    }

    fn render_search(&self) -> El {
        El::new("div").class("search").children([
            El::new("a")
                .class("search-title")
                .attr("data-role", "search-toggle")
                .text("Search"),
            El::new("div")
                .class("search-fields")
                .hidden(!self.table.search_open)
                .child(Self::name_group(
                    El::new("input")
                        .attr("name", "search-name")
                        .attr("value", self.table.search.as_str()),
                )),
        ])
    }

    fn render_header(&self, column: &str) -> El {
        let indicator = match &self.table.sort {
            Some((sorted, true)) if sorted == column => Some("glyphicon-triangle-bottom"),
            Some((sorted, false)) if sorted == column => Some("glyphicon-triangle-top"),
            _ => None,
        };
        let th = El::new("th")
            .attr("data-role", "sort")
            .attr("data-column", column)
            .text(column);
        match indicator {
            Some(class) => th.child(El::new("span").class("glyphicon").class(class)),
            None => th,
        }
    }

    fn render_row(&self, entity: &Entity) -> El {
        let id = entity.id.as_str();
        let remove = remove_label(&self.language);
        let mut cells = vec![El::new("td").child(
            El::new("input")
                .attr("type", "checkbox")
                .attr("data-role", "line-select")
                .attr("data-id", id)
                .attr_if(self.table.selected.contains(id), "checked", "true"),
        )];
        cells.extend(self.columns.iter().map(|column| {
            El::new("td")
                .attr("data-role", "line")
                .attr("data-id", id)
                .text(cell_text(entity, column))
        }));
        cells.push(El::new("td").class("actions").children([
            El::new("button")
                .attr("data-role", "line-actions")
                .attr("data-id", id)
                .text("Actions"),
            El::new("ul")
                .hidden(self.table.actions_of.as_deref() != Some(id))
                .child(
                    El::new("li").child(
                        El::new("a")
                            .attr("data-role", "line-remove")
                            .attr("data-id", id)
                            .text(remove),
                    ),
                ),
        ]));
        El::new("tr")
            .attr("data-role", "line")
            .attr("data-id", id)
            .children(cells)
    }

    fn render_detail(&self, entity: &Entity) -> El {
        El::new("tr").class("detail").child(
            El::new("td")
                .attr("colspan", (self.columns.len() + 2).to_string())
                .child(El::new("div").class("detail").child(Self::name_group(
                    El::new("input")
                        .attr("name", "edit-name")
                        .attr("value", entity.name()),
                ))),
        )
    }

    fn render_pagination(&self, total: usize) -> El {
        let total_pages = self.total_pages(total);
        let page = self.current_page(total_pages);
        let range = self.current_range(total_pages);
        let first = range * RANGE_SIZE + 1;
        let last = ((range + 1) * RANGE_SIZE).min(total_pages);
        let has_previous = range > 0;
        let has_next = last < total_pages;

        let links = (first..=last).map(|n| {
            let label = if n == page { format!("{n} (current)") } else { n.to_string() };
            El::new("li")
                .attr("ng-repeat", "numPage in rangePage")
                .class_if(n == page, "active")
                .child(
                    El::new("a")
                        .attr("data-role", "page")
                        .attr("data-page", n.to_string())
                        .child(El::new("span").text(label)),
                )
        });
        let pagination = El::new("ul")
            .class("pagination")
            .child(
                El::new("li")
                    .class_if(!has_previous, "disabled")
                    .attr("data-role", "range-previous")
                    .child(El::new("a").text("<<")),
            )
            .children(links)
            .child(
                El::new("li")
                    .class_if(!has_next, "disabled")
                    .attr("data-role", "range-next")
                    .child(El::new("a").text(">>")),
            );

        let per_page = ITEMS_PER_PAGE
            .iter()
            .take(items_per_page_buttons(total))
            .map(|count| {
                El::new("li")
                    .attr("ng-repeat", "count in listItemsPerPageShow")
                    .attr("data-role", "per-page")
                    .attr("data-count", count.to_string())
                    .class_if(*count == self.table.per_page, "active")
                    .child(El::new("a").text(count.to_string()))
            });

        El::new("div").class("table-footer").children([
            El::new("div").class("pagination-info").children([
                El::new("span")
                    .attr("ng-bind", "pagination.page")
                    .text(page.to_string()),
                El::new("span")
                    .attr("ng-bind", "pagination.pages")
                    .text(total_pages.to_string()),
                El::new("span")
                    .attr("ng-bind", "pagination.size")
                    .text(total.to_string()),
            ]),
            pagination,
            El::new("ul").class("items-per-page").children(per_page),
        ])
    }

    fn render_table(&self) -> Vec<El> {
        let total = self.listed().len();
        let entities = self.page_entities();
        let all_selected = !entities.is_empty()
            && entities.iter().all(|e| self.table.selected.contains(&e.id));
        let remove = remove_label(&self.language);

        let mut rows = Vec::new();
        for entity in &entities {
            rows.push(self.render_row(entity));
            if self.table.opened.as_deref() == Some(entity.id.as_str()) {
                rows.push(self.render_detail(entity));
            }
        }

        let all_actions = El::new("div").class("allactions").children([
            El::new("input")
                .attr("type", "checkbox")
                .attr("data-role", "select-all")
                .attr_if(all_selected, "checked", "true"),
            El::new("button")
                .attr("data-role", "bulk-actions")
                .hidden(self.table.selected.is_empty())
                .text("Actions"),
            El::new("ul").hidden(!self.table.bulk_open).child(
                El::new("li").child(
                    El::new("a")
                        .attr("data-role", "bulk-remove")
                        .text(remove),
                ),
            ),
        ]);

        let mut headers: Vec<El> = self.columns.iter().map(|c| self.render_header(c)).collect();
        headers.push(El::new("th"));

        let mut content = vec![
            self.render_add_form(),
            self.render_search(),
            El::new("div").class("datatable").children([
                all_actions,
                El::new("table").children([
                    El::new("thead").child(El::new("tr").children(headers)),
                    El::new("tbody").children(rows),
                ]),
                self.render_pagination(total),
            ]),
        ];
        if self.table.popover {
            content.push(El::new("div").class("popover").text("Select all lines of the page"));
        }
        if self.table.dialog.is_some() {
            content.push(El::new("div").class("modal-dialog").children([
                El::new("div").class("modal-body").text("Are you sure?"),
                El::new("button")
                    .class("btn-primary")
                    .attr("data-role", "dialog-confirm")
                    .text("OK"),
                El::new("button")
                    .class("btn-warning")
                    .attr("data-role", "dialog-cancel")
                    .text("Cancel"),
            ]));
        }
        content
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    fn on_click(&mut self, node: &NodeView) -> Reaction {
        let id = node.attr("data-id").unwrap_or("").to_string();
        let index: Option<usize> = node.attr("data-index").and_then(|i| i.parse().ok());
        if node.attr("data-role") != Some("select-all") {
            self.table.popover = false;
        }
        match node.attr("data-role").unwrap_or("") {
            "login-submit" => {
                let known = self
                    .accounts
                    .iter()
                    .any(|u| u.email == self.email && u.password == self.password);
                if known {
                    self.logged = true;
                    self.path = HOME_PATH.to_string();
                }
                self.email.clear();
                self.password.clear();
            }
            "logout" => {
                self.logged = false;
                self.path = LOGIN_PATH.to_string();
                self.alerts.clear();
            }
            "toggle-menu" => self.menu_open = !self.menu_open,
            "language" => self.language_open = !self.language_open,
            "language-option" => {
                self.language = node.attr("data-language").unwrap_or("en").to_string();
                self.language_open = false;
            }
            "menu" => match node.attr("data-path") {
                Some(path) => self.navigate(path),
                None => {
                    let label = node.attr("data-label").unwrap_or("").to_string();
                    if !self.sub_menus.remove(&label) {
                        self.sub_menus.insert(label);
                    }
                }
            },
            "alert-close" => {
                if let Some(i) = index.filter(|&i| i < self.alerts.len()) {
                    self.alerts.remove(i);
                }
            }
            "add-toggle" => self.table.add_open = !self.table.add_open,
            "add-submit" => {
                let name = std::mem::take(&mut self.table.add_name);
                if !name.is_empty() && self.store.insert(json!({ "name": name })).is_ok() {
                    self.alerts.push(format!("{name} added"));
                }
            }
            "search-toggle" => self.table.search_open = !self.table.search_open,
            "sort" => {
                let column = node.attr("data-column").unwrap_or("").to_string();
                self.table.sort = match self.table.sort.take() {
                    Some((sorted, ascending)) if sorted == column => Some((sorted, !ascending)),
                    _ => Some((column, true)),
                };
                self.table.range = 0;
                self.go_to_page(1);
            }
            "page" => {
                if let Some(page) = node.attr("data-page").and_then(|p| p.parse().ok()) {
                    self.go_to_page(page);
                }
            }
            "range-previous" | "range-next" => {
                let pages = self.total_pages(self.listed().len());
                let range = self.current_range(pages);
                self.table.range = if node.attr("data-role") == Some("range-next") {
                    if (range + 1) * RANGE_SIZE < pages { range + 1 } else { range }
                } else {
                    range.saturating_sub(1)
                };
            }
            "per-page" => {
                if let Some(count) = node.attr("data-count").and_then(|c| c.parse().ok()) {
                    self.table.per_page = count;
                    self.table.range = 0;
                    self.go_to_page(1);
                }
            }
            "line-select" => {
                if node.is_checked() {
                    self.table.selected.insert(id);
                } else {
                    self.table.selected.remove(&id);
                }
            }
            "select-all" => {
                let ids = self.page_entities().into_iter().map(|e| e.id);
                if node.is_checked() {
                    self.table.selected.extend(ids);
                } else {
                    self.table.selected.clear();
                }
            }
            "line" => {
                self.table.opened = if self.table.opened.as_deref() == Some(id.as_str()) {
                    None
                } else {
                    Some(id)
                };
            }
            "line-actions" => {
                self.table.actions_of = if self.table.actions_of.as_deref() == Some(id.as_str()) {
                    None
                } else {
                    Some(id)
                };
            }
            "line-remove" => {
                self.table.actions_of = None;
                self.table.dialog = Some(vec![id]);
            }
            "bulk-actions" => self.table.bulk_open = !self.table.bulk_open,
            "bulk-remove" => {
                self.table.bulk_open = false;
                self.table.dialog = Some(self.table.selected.iter().cloned().collect());
            }
            "dialog-confirm" => {
                if let Some(ids) = self.table.dialog.take() {
                    self.remove(&ids);
                }
            }
            "dialog-cancel" => self.table.dialog = None,
            _ => return Reaction::ignored(),
        }
        Reaction::rerender()
    }

    fn on_input(&mut self, node: &NodeView) -> Reaction {
        let value = node.value().to_string();
        match (node.attr("ng-model"), node.attr("name")) {
            (Some("userEmail"), _) => self.email = value,
            (Some("password"), _) => self.password = value,
            (_, Some("add-name")) => self.table.add_name = value,
            (_, Some("search-name")) => {
                self.table.search = value;
                self.table.range = 0;
                self.go_to_page(1);
            }
            _ => return Reaction::ignored(),
        }
        Reaction::rerender()
    }
}

impl MockApp for FakeBackOffice {
    fn render(&self) -> El {
        if !self.logged {
            return self.render_login();
        }
        let mut content: Vec<El> = self.render_alerts().collect();
        if self.path == ENTITIES_PATH {
            content.extend(self.render_table());
        } else {
            content.push(El::new("h1").text(self.path.as_str()));
        }
        El::new("body").children([
            self.render_navbar(),
            self.render_sidebar(),
            El::new("div").id("page-content-wrapper").children(content),
        ])
    }

    fn path(&self) -> String {
        self.path.clone()
    }

    fn navigate(&mut self, path: &str) {
        self.path = match (self.logged, path) {
            (false, _) => LOGIN_PATH.to_string(),
            (true, LOGIN_PATH) => HOME_PATH.to_string(),
            (true, path) => path.to_string(),
        };
        self.table = TableState::sorted_by(self.columns.first());
        self.language_open = false;
    }

    fn title(&self) -> String {
        "OpenVeo".to_string()
    }

    fn handle(&mut self, event: &MockEvent) -> Reaction {
        match event {
            MockEvent::Click(node) => self.on_click(node),
            MockEvent::Input { node, .. } | MockEvent::Clear(node) => self.on_input(node),
            MockEvent::Hover(node) if node.attr("data-role") == Some("select-all") => {
                self.table.popover = true;
                Reaction::rerender()
            }
            MockEvent::Hover(_) | MockEvent::Script { .. } => Reaction::ignored(),
        }
    }

    fn delete_cookies(&mut self) {
        self.logged = false;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seeded(total: usize) -> FakeBackOffice {
        let store = MemoryStore::new();
        for i in 0..total {
            store.insert(json!({ "name": format!("line {i}") })).unwrap();
        }
        let mut app = FakeBackOffice::new(store);
        app.logged = true;
        app.navigate(ENTITIES_PATH);
        app
    }

    mod model_tests {
        use super::*;

        #[test]
        fn test_items_per_page_buttons() {
            assert_eq!(items_per_page_buttons(0), 0);
            assert_eq!(items_per_page_buttons(5), 0);
            assert_eq!(items_per_page_buttons(6), 2);
            assert_eq!(items_per_page_buttons(11), 3);
            assert_eq!(items_per_page_buttons(31), 4);
        }

        #[test]
        fn test_pages_and_search() {
            let mut app = seeded(31);
            assert_eq!(app.total_pages(app.listed().len()), 4);
            assert_eq!(app.page_entities().len(), 10);
            app.table.search = "line 1".to_string();
            // line 1, line 10 ... line 19
            assert_eq!(app.listed().len(), 11);
        }

        #[test]
        fn test_sort_toggles() {
            let mut app = seeded(3);
            let click = |app: &mut FakeBackOffice| {
                let mut view = NodeView {
                    tag: "th".to_string(),
                    attrs: Default::default(),
                    text: "Name".to_string(),
                };
                view.attrs.insert("data-role".into(), "sort".into());
                view.attrs.insert("data-column".into(), "Name".into());
                app.on_click(&view);
            };
            assert_eq!(app.listed()[0].name(), "line 0");
            click(&mut app);
            assert_eq!(app.listed()[0].name(), "line 2");
            click(&mut app);
            assert_eq!(app.listed()[0].name(), "line 0");
        }

        #[test]
        fn test_navigation_requires_login() {
            let mut app = FakeBackOffice::new(MemoryStore::new());
            app.navigate(ENTITIES_PATH);
            assert_eq!(app.path(), LOGIN_PATH);
            app.logged = true;
            app.navigate(LOGIN_PATH);
            assert_eq!(app.path(), HOME_PATH);
        }

        proptest! {
            #[test]
            fn prop_button_count_bounded(total in 0usize..1000) {
                let buttons = items_per_page_buttons(total);
                prop_assert!(buttons <= ITEMS_PER_PAGE.len());
                prop_assert_eq!(buttons == 0, total < 6);
            }
        }
    }
}
