//! Table capability: pagination, lines, sort, selection, actions and forms.
//!
//! Tables are paginated by the server and their pagination links are paginated
//! again in ranges: only a few page links are shown at a time, the first and
//! last pagination items moving to the previous and next ranges.
//!
//! Lines are identified by the exact text of one of their cells. Looking a line
//! up walks the table page by page from the first one.

use super::back_end::{BackEnd, Language, LANGUAGES};
use super::page::Page;
use crate::config::User;
use crate::fields::{Field, FieldValue};
use crate::i18n::{TranslationSource, Translations};
use crate::locator::{Finder, Locator};
use crate::result::{VeoError, VeoResult};
use crate::session::Session;
use crate::wait::Expectation;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// Key of the remove action label in the dictionaries
pub const REMOVE_ACTION_KEY: &str = "UI.REMOVE";

#[allow(clippy::expect_used)]
fn current_marker() -> &'static Regex {
    static CURRENT: OnceLock<Regex> = OnceLock::new();
    CURRENT.get_or_init(|| Regex::new(r" ?\(current\)").expect("valid current marker pattern"))
}

/// Page number of a pagination link text (`"3 (current)"` reads 3)
#[must_use]
pub fn page_link_number(text: &str) -> Option<usize> {
    current_marker().replace_all(text, "").trim().parse().ok()
}

/// Number of lines expected on `page` (1-indexed) of a table of `total` lines
#[must_use]
pub fn lines_in_page(total: usize, per_page: usize, page: usize) -> usize {
    if per_page == 0 || page == 0 {
        return 0;
    }
    total.saturating_sub(per_page * (page - 1)).min(per_page)
}

/// A table line resolved on the current page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// The `tr` element
    pub row: Finder,
    /// The cell holding the searched text
    pub cell: Finder,
    /// Position of the line among the lines of the page, detail lines excluded
    pub index: usize,
}

/// Line given by name or already resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineTarget {
    /// Text of one of the line cells
    Name(String),
    /// Line resolved earlier, used as is
    Resolved(Line),
}

impl From<&str> for LineTarget {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for LineTarget {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Line> for LineTarget {
    fn from(line: Line) -> Self {
        Self::Resolved(line)
    }
}

/// Form registries of a concrete table page.
///
/// Pages list their search, add and edit fields here. Every method fails with
/// [`VeoError::NotImplemented`] until the page overrides it.
#[async_trait]
pub trait TableForms: Send + Sync {
    /// Search fields by id, inside the search form
    fn search_fields(
        &self,
        session: &Session,
        form: &Finder,
    ) -> VeoResult<BTreeMap<String, Field>> {
        let _ = (session, form);
        Err(VeoError::not_implemented("getSearchFields"))
    }

    /// Fields of the add form by id
    fn add_form_fields(
        &self,
        session: &Session,
        form: &Finder,
    ) -> VeoResult<BTreeMap<String, Field>> {
        let _ = (session, form);
        Err(VeoError::not_implemented("getAddFormFields"))
    }

    /// Fields of the edition form of an opened line by id
    fn edit_form_fields(
        &self,
        session: &Session,
        form: &Finder,
    ) -> VeoResult<BTreeMap<String, Field>> {
        let _ = (session, form);
        Err(VeoError::not_implemented("getEditFormFields"))
    }

    /// Add a line through the add form
    async fn add_line(&self, table: &Table, name: &str, data: &Value) -> VeoResult<()> {
        let _ = (table, name, data);
        Err(VeoError::not_implemented("addLine"))
    }

    /// Edit a line through its edition form
    async fn edit_line(&self, table: &Table, name: &str, data: &Value) -> VeoResult<()> {
        let _ = (table, name, data);
        Err(VeoError::not_implemented("editLine"))
    }
}

/// Page without forms
#[derive(Debug, Clone, Copy, Default)]
pub struct NoForms;

impl TableForms for NoForms {}

/// Operations on the data table of a back office page
#[derive(Debug, Clone)]
pub struct Table {
    session: Session,
}

impl Table {
    const PAGE_LINKS: &'static str = "numPage in rangePage";
    const ITEMS_PER_PAGE: &'static str = "count in listItemsPerPageShow";

    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    // ------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------

    #[must_use]
    pub fn add_form() -> Finder {
        Finder::css(".add-form")
    }

    #[must_use]
    pub fn add_link() -> Finder {
        Finder::css(".add-element")
    }

    /// Collapsible wrapper of the add form
    #[must_use]
    pub fn add_form_wrapper() -> Finder {
        Self::add_link()
            .parent()
            .find_css("div[uib-collapse=\"isCollapsed\"]")
            .first()
    }

    #[must_use]
    pub fn rows() -> Finder {
        Finder::css(".datatable table").find_css("tbody > tr")
    }

    #[must_use]
    pub fn headers() -> Finder {
        Finder::css(".datatable table").find_css("thead th")
    }

    #[must_use]
    pub fn line_detail() -> Finder {
        Finder::css(".datatable tr.detail")
    }

    #[must_use]
    pub fn select_all() -> Finder {
        Finder::css(".allactions input[type=\"checkbox\"]")
    }

    #[must_use]
    pub fn actions_button() -> Finder {
        Finder::css(".allactions button")
    }

    #[must_use]
    pub fn actions() -> Finder {
        Finder::css(".allactions ul")
    }

    #[must_use]
    pub fn dialog() -> Finder {
        Finder::css(".modal-dialog")
    }

    #[must_use]
    pub fn search_form() -> Finder {
        Finder::css(".search-fields")
    }

    #[must_use]
    pub fn search_link() -> Finder {
        Finder::css(".search-title")
    }

    #[must_use]
    pub fn pagination_links() -> Finder {
        Finder::css(".pagination").find_css("li")
    }

    #[must_use]
    pub fn page_links() -> Finder {
        Finder::css(".pagination")
            .find(Locator::repeater(Self::PAGE_LINKS))
            .find_css("a")
    }

    #[must_use]
    pub fn previous_range_link() -> Finder {
        Self::pagination_links().first()
    }

    #[must_use]
    pub fn next_range_link() -> Finder {
        Self::pagination_links().last()
    }

    #[must_use]
    pub fn items_per_page_links() -> Finder {
        Finder::all(Locator::repeater(Self::ITEMS_PER_PAGE))
    }

    // ------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------

    async fn read_number(&self, binding: &str) -> VeoResult<usize> {
        let text = self
            .session
            .text(&Finder::all(Locator::exact_binding(binding)))
            .await?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(0);
        }
        text.parse().map_err(|_| VeoError::Driver {
            message: format!("{binding} is not a number: \"{text}\""),
        })
    }

    pub async fn get_current_page(&self) -> VeoResult<usize> {
        self.read_number("pagination.page").await
    }

    pub async fn get_total_pages(&self) -> VeoResult<usize> {
        self.read_number("pagination.pages").await
    }

    pub async fn get_total_lines(&self) -> VeoResult<usize> {
        self.read_number("pagination.size").await
    }

    /// Number of page links in the current range
    pub async fn get_total_pagination_links(&self) -> VeoResult<usize> {
        Ok(self
            .session
            .count(&Self::pagination_links())
            .await?
            .saturating_sub(2))
    }

    pub async fn is_previous_range_link_enabled(&self) -> VeoResult<bool> {
        Ok(!self
            .session
            .has_class(&Self::previous_range_link(), "disabled")
            .await?)
    }

    pub async fn is_next_range_link_enabled(&self) -> VeoResult<bool> {
        Ok(!self
            .session
            .has_class(&Self::next_range_link(), "disabled")
            .await?)
    }

    pub async fn select_previous_page_range(&self) -> VeoResult<()> {
        self.session.click(&Self::previous_range_link()).await
    }

    pub async fn select_next_page_range(&self) -> VeoResult<()> {
        self.session.click(&Self::next_range_link()).await
    }

    pub async fn select_first_page_range(&self) -> VeoResult<()> {
        while self.is_previous_range_link_enabled().await? {
            self.select_previous_page_range().await?;
        }
        Ok(())
    }

    pub async fn select_last_page_range(&self) -> VeoResult<()> {
        while self.is_next_range_link_enabled().await? {
            self.select_next_page_range().await?;
        }
        Ok(())
    }

    /// Go to `page` (1-indexed), walking the ranges from the first one
    pub async fn select_page(&self, page: usize) -> VeoResult<()> {
        debug!(page, "select page");
        self.select_first_page_range().await?;
        loop {
            let links = Self::page_links();
            for i in 0..self.session.count(&links).await? {
                let link = links.nth(i as isize);
                let text = self.session.text(&link.find_css("span").first()).await?;
                if page_link_number(&text) == Some(page) {
                    return self.session.click(&link).await;
                }
            }
            if !self.is_next_range_link_enabled().await? {
                return Err(VeoError::PageNotFound { page });
            }
            self.select_next_page_range().await?;
        }
    }

    pub async fn select_first_page(&self) -> VeoResult<()> {
        self.select_page(1).await
    }

    pub async fn select_last_page(&self) -> VeoResult<()> {
        let total = self.get_total_pages().await?;
        self.select_page(total).await
    }

    /// Items per page currently applied
    pub async fn get_lines_number(&self) -> VeoResult<Option<usize>> {
        let links = Self::items_per_page_links();
        for i in 0..self.session.count(&links).await? {
            let link = links.nth(i as isize);
            if self.session.has_class(&link, "active").await? {
                return Ok(self.session.text(&link).await?.trim().parse().ok());
            }
        }
        Ok(None)
    }

    /// Apply `count` items per page, doing nothing when already applied
    pub async fn set_lines_number(&self, count: usize) -> VeoResult<()> {
        let links = Self::items_per_page_links();
        for i in 0..self.session.count(&links).await? {
            let link = links.nth(i as isize);
            if self.session.text(&link).await?.trim() != count.to_string() {
                continue;
            }
            if self.session.has_class(&link, "active").await? {
                return Ok(());
            }
            return self.session.click(&link).await;
        }
        Err(VeoError::ItemsPerPageNotFound { count })
    }

    // ------------------------------------------------------------------
    // Lines
    // ------------------------------------------------------------------

    /// Lines of the current page, the opened line detail excluded
    pub async fn get_lines_in_page(&self) -> VeoResult<Vec<Finder>> {
        let rows = Self::rows();
        let mut lines = Vec::new();
        for i in 0..self.session.count(&rows).await? {
            let row = rows.nth(i as isize);
            if !self.session.has_class(&row, "detail").await? {
                lines.push(row);
            }
        }
        Ok(lines)
    }

    pub async fn get_lines_in_page_number(&self) -> VeoResult<usize> {
        Ok(self.get_lines_in_page().await?.len())
    }

    /// Line of the current page holding a cell reading exactly `name`
    pub async fn get_line_in_page(&self, name: &str) -> VeoResult<Line> {
        for (index, row) in self.get_lines_in_page().await?.into_iter().enumerate() {
            let cells = row.find_css("td");
            let texts = self.session.texts(&cells).await?;
            if let Some(position) = texts.iter().position(|text| text == name) {
                return Ok(Line {
                    cell: cells.nth(position as isize),
                    row,
                    index,
                });
            }
        }
        Err(VeoError::LineNotFound {
            name: name.to_string(),
        })
    }

    /// Resolve a line, scanning the table page by page from the first one
    pub async fn get_line(&self, target: impl Into<LineTarget>) -> VeoResult<Line> {
        let name = match target.into() {
            LineTarget::Resolved(line) => return Ok(line),
            LineTarget::Name(name) => name,
        };
        let total_pages = self.get_total_pages().await?;
        if total_pages == 0 {
            return Err(VeoError::NoLines);
        }
        if self.get_current_page().await? != 1 {
            self.select_page(1).await?;
        }

        loop {
            match self.get_line_in_page(&name).await {
                Err(VeoError::LineNotFound { .. }) => {}
                other => return other,
            }
            let current = self.get_current_page().await?;
            if current + 1 > total_pages {
                return Err(VeoError::LineNotFound { name });
            }
            self.select_page(current + 1).await?;
        }
    }

    /// Whether a column is titled `name`
    pub async fn is_table_header(&self, name: &str) -> VeoResult<bool> {
        Ok(self.session.texts(&Self::headers()).await?.iter().any(|t| t == name))
    }

    /// Position of the column titled `name`
    pub async fn get_header_index(&self, name: &str) -> VeoResult<usize> {
        self.session
            .texts(&Self::headers())
            .await?
            .iter()
            .rposition(|text| text == name)
            .ok_or_else(|| VeoError::HeaderNotFound {
                name: name.to_string(),
            })
    }

    /// Cell texts of column `header_index` for each of `lines`.
    ///
    /// The first cell of a line holds its selection checkbox, hence the shift.
    pub async fn get_line_values_by_index(
        &self,
        lines: &[Finder],
        header_index: usize,
    ) -> VeoResult<Vec<String>> {
        let mut values = Vec::with_capacity(lines.len());
        for line in lines {
            let cell = line.find_css("td").nth(header_index as isize + 1);
            values.push(self.session.text(&cell).await?);
        }
        Ok(values)
    }

    /// Values of column `header` on the current page
    pub async fn get_line_in_page_values(&self, header: &str) -> VeoResult<Vec<String>> {
        let header_index = self.get_header_index(header).await?;
        let lines = self.get_lines_in_page().await?;
        self.get_line_values_by_index(&lines, header_index).await
    }

    /// Values of column `header` on every page, in page order
    pub async fn get_line_values(&self, header: &str) -> VeoResult<Vec<String>> {
        let total_pages = self.get_total_pages().await?;
        if total_pages == 0 {
            return Err(VeoError::NoLines);
        }
        if self.get_current_page().await? != 1 {
            self.select_page(1).await?;
        }
        let header_index = self.get_header_index(header).await?;

        let mut values = Vec::new();
        loop {
            let lines = self.get_lines_in_page().await?;
            if lines.is_empty() {
                return Err(VeoError::NoLines);
            }
            values.extend(self.get_line_values_by_index(&lines, header_index).await?);
            let current = self.get_current_page().await?;
            if current + 1 > total_pages {
                return Ok(values);
            }
            self.select_page(current + 1).await?;
        }
    }

    /// Open the detail of a line
    pub async fn open_line(&self, target: impl Into<LineTarget>) -> VeoResult<()> {
        let line = self.get_line(target).await?;
        self.session.click(&line.cell).await?;
        self.session
            .wait(
                Expectation::Present(Self::line_detail()),
                self.session.long_wait(),
                "Missing opened line",
            )
            .await
    }

    /// Close the opened line, if any
    pub async fn close_line(&self) -> VeoResult<()> {
        let rows = Self::rows();
        for i in 0..self.session.count(&rows).await? {
            if i == 0 || !self.session.has_class(&rows.nth(i as isize), "detail").await? {
                continue;
            }
            // The detail is rendered as the line following the opened one
            self.session.click(&rows.nth(i as isize - 1)).await?;
            return self
                .session
                .wait(
                    Expectation::Absent(Self::line_detail()),
                    self.session.long_wait(),
                    "Line still opened",
                )
                .await;
        }
        Ok(())
    }

    pub async fn is_opened_line(&self) -> VeoResult<bool> {
        Ok(self.get_lines_in_page_number().await? != self.session.count(&Self::rows()).await?)
    }

    /// Errors displayed by the fields of the opened line
    pub async fn get_edition_form_errors<F: TableForms + ?Sized>(
        &self,
        forms: &F,
    ) -> VeoResult<Vec<String>> {
        let form = Self::line_detail().find_css(".detail");
        let mut errors = Vec::new();
        for field in forms.edit_form_fields(&self.session, &form)?.values() {
            let message = field.get_error_message().await?;
            if !message.is_empty() {
                errors.push(message);
            }
        }
        Ok(errors)
    }

    pub async fn is_edition_form_on_error<F: TableForms + ?Sized>(
        &self,
        forms: &F,
    ) -> VeoResult<bool> {
        Ok(!self.get_edition_form_errors(forms).await?.is_empty())
    }

    // ------------------------------------------------------------------
    // Sort and selection
    // ------------------------------------------------------------------

    /// Sort the table by column `name`.
    ///
    /// A click on a header toggles the direction, so nothing is clicked when
    /// the column is already sorted the requested way.
    pub async fn sort_by(&self, name: &str, ascending: bool) -> VeoResult<()> {
        let headers = Self::headers();
        let texts = self.session.texts(&headers).await?;
        let Some(position) = texts.iter().position(|text| text == name) else {
            return Err(VeoError::NoHeader {
                name: name.to_string(),
            });
        };
        let header = headers.nth(position as isize);
        let sorted_ascending = self
            .session
            .is_present(&header.find(Locator::class_name("glyphicon-triangle-bottom")))
            .await?;
        if sorted_ascending == ascending {
            return Ok(());
        }
        debug!(column = name, ascending, "sort");
        self.session.click(&header).await
    }

    fn line_checkbox(line: &Line) -> Finder {
        line.row.find_css("input[type=\"checkbox\"]")
    }

    pub async fn is_selected_line(&self, target: impl Into<LineTarget>) -> VeoResult<bool> {
        let line = self.get_line(target).await?;
        Ok(self
            .session
            .attribute(&Self::line_checkbox(&line), "checked")
            .await?
            .is_some())
    }

    /// Check the line checkbox, unless already checked
    pub async fn select_line(&self, target: impl Into<LineTarget>) -> VeoResult<()> {
        let line = self.get_line(target).await?;
        let checkbox = Self::line_checkbox(&line);
        if self.session.attribute(&checkbox, "checked").await?.is_none() {
            self.session.click(&checkbox).await?;
        }
        Ok(())
    }

    /// Uncheck the line checkbox, unless already unchecked
    pub async fn deselect_line(&self, target: impl Into<LineTarget>) -> VeoResult<()> {
        let line = self.get_line(target).await?;
        let checkbox = Self::line_checkbox(&line);
        if self.session.attribute(&checkbox, "checked").await?.is_some() {
            self.session.click(&checkbox).await?;
        }
        Ok(())
    }

    pub async fn is_all_selected(&self) -> VeoResult<bool> {
        Ok(self
            .session
            .attribute(&Self::select_all(), "checked")
            .await?
            .is_some())
    }

    /// Select every line of the page
    pub async fn select_all_lines(&self) -> VeoResult<()> {
        if !self.is_all_selected().await? {
            self.session.click(&Self::select_all()).await?;
        }
        self.session
            .wait(
                Expectation::Visible(Self::actions_button()),
                self.session.short_wait(),
                "Missing the list of actions",
            )
            .await
    }

    /// Deselect every line of the page
    pub async fn deselect_all_lines(&self) -> VeoResult<()> {
        if self.is_all_selected().await? {
            self.session.click(&Self::select_all()).await?;
        }
        Ok(())
    }

    /// Hover the select all checkbox and wait for its popover
    pub async fn set_select_all_mouse_over(&self) -> VeoResult<()> {
        self.session.mouse_move(&Self::select_all()).await?;
        self.session
            .wait(
                Expectation::Present(Finder::css(".popover")),
                self.session.short_wait(),
                "Missing dialog over select all checkbox",
            )
            .await
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Run `action` from the action menu of a line
    pub async fn perform_action(
        &self,
        target: impl Into<LineTarget>,
        action: &str,
        confirm: bool,
    ) -> VeoResult<()> {
        let line = self.get_line(target).await?;
        info!(action, "line action");
        let cell = line.row.find_css("td").last();
        let action_link = cell.find(Locator::css_containing_text("a", action));
        if !self.session.is_visible(&action_link).await? {
            self.session.click(&cell.find_css("button")).await?;
        }
        self.session.click(&action_link).await?;
        if confirm {
            self.confirm_after_action().await?;
        }
        Ok(())
    }

    /// Run `action` on the selected lines
    pub async fn perform_multiple_action(&self, action: &str, confirm: bool) -> VeoResult<()> {
        info!(action, "multiple action");
        self.session.click(&Self::actions_button()).await?;
        self.session
            .wait(
                Expectation::Visible(Self::actions()),
                self.session.short_wait(),
                "Missing the list of actions",
            )
            .await?;
        self.session
            .click(&Self::actions().find(Locator::css_containing_text("a", action)))
            .await?;
        if confirm {
            self.confirm_after_action().await?;
        }
        Ok(())
    }

    async fn confirm_after_action(&self) -> VeoResult<()> {
        self.session
            .wait(
                Expectation::Visible(Self::dialog()),
                self.session.long_wait(),
                "Missing confirmation dialog",
            )
            .await?;
        self.confirm_action().await
    }

    /// Accept the confirmation dialog
    pub async fn confirm_action(&self) -> VeoResult<()> {
        self.session.click(&Self::dialog().find_css(".btn-primary")).await?;
        self.session
            .wait(
                Expectation::Absent(Self::dialog()),
                self.session.long_wait(),
                "Dialog still visible",
            )
            .await
    }

    /// Dismiss the confirmation dialog
    pub async fn cancel_action(&self) -> VeoResult<()> {
        self.session.click(&Self::dialog().find_css(".btn-warning")).await?;
        self.session
            .wait(
                Expectation::Absent(Self::dialog()),
                self.session.short_wait(),
                "Dialog still visible",
            )
            .await
    }

    /// Remove a line through its action menu
    pub async fn remove_line(
        &self,
        target: impl Into<LineTarget>,
        translations: &Translations,
    ) -> VeoResult<()> {
        self.perform_action(target, &translations.translate(REMOVE_ACTION_KEY), true)
            .await
    }

    /// Remove the selected lines of the page
    pub async fn remove_all_selected_lines(&self, translations: &Translations) -> VeoResult<()> {
        self.perform_multiple_action(&translations.translate(REMOVE_ACTION_KEY), true)
            .await
    }

    /// Select then remove every line of the page
    pub async fn remove_all_lines(&self, translations: &Translations) -> VeoResult<()> {
        self.select_all_lines().await?;
        self.remove_all_selected_lines(translations).await
    }

    // ------------------------------------------------------------------
    // Add form and search engine
    // ------------------------------------------------------------------

    pub async fn open_add_form(&self) -> VeoResult<()> {
        if self.session.is_visible(&Self::add_form_wrapper()).await? {
            return Ok(());
        }
        self.session.click(&Self::add_link()).await?;
        self.session
            .wait(
                Expectation::Visible(Self::add_form_wrapper()),
                self.session.short_wait(),
                "Missing add form",
            )
            .await
    }

    pub async fn close_add_form(&self) -> VeoResult<()> {
        if !self.session.is_visible(&Self::add_form_wrapper()).await? {
            return Ok(());
        }
        self.session.click(&Self::add_link()).await?;
        self.session
            .wait(
                Expectation::Invisible(Self::add_form_wrapper()),
                self.session.short_wait(),
                "Add form still visible",
            )
            .await
    }

    pub async fn submit_add_form(&self) -> VeoResult<()> {
        self.session.click(&Self::add_form().find_css("button")).await
    }

    pub async fn open_search_engine(&self) -> VeoResult<()> {
        if self.session.is_visible(&Self::search_form()).await? {
            return Ok(());
        }
        self.session.click(&Self::search_link()).await?;
        self.session
            .wait(
                Expectation::Visible(Self::search_form()),
                self.session.short_wait(),
                "Missing search form",
            )
            .await
    }

    pub async fn close_search_engine(&self) -> VeoResult<()> {
        if !self.session.is_visible(&Self::search_form()).await? {
            return Ok(());
        }
        self.session.click(&Self::search_link()).await?;
        self.session
            .wait(
                Expectation::Invisible(Self::search_form()),
                self.session.short_wait(),
                "Search engine still visible",
            )
            .await
    }

    /// Fill the search fields of `values`, by field id
    pub async fn search<F: TableForms + ?Sized>(
        &self,
        forms: &F,
        values: &BTreeMap<String, FieldValue>,
    ) -> VeoResult<()> {
        let fields = forms.search_fields(&self.session, &Self::search_form())?;
        for (id, value) in values {
            let field = fields
                .get(id)
                .ok_or_else(|| VeoError::UnknownSearchField { id: id.clone() })?;
            field.set_value(value).await?;
        }
        Ok(())
    }

    /// Empty every search field
    pub async fn clear_search<F: TableForms + ?Sized>(&self, forms: &F) -> VeoResult<()> {
        for field in forms.search_fields(&self.session, &Self::search_form())?.values() {
            field.set_value(&FieldValue::None).await?;
        }
        Ok(())
    }
}

/// Back office page built around a data table
#[derive(Debug, Clone)]
pub struct TablePage<F: TableForms> {
    page: Page,
    back_end: BackEnd,
    table: Table,
    forms: F,
}

impl<F: TableForms> TablePage<F> {
    #[must_use]
    pub fn new(
        session: Session,
        path: impl Into<String>,
        source: Arc<dyn TranslationSource>,
        forms: F,
    ) -> Self {
        Self {
            page: Page::new(session.clone(), path),
            back_end: BackEnd::new(session.clone(), source),
            table: Table::new(session),
            forms,
        }
    }

    #[must_use]
    pub fn with_ready(mut self, ready: Finder) -> Self {
        self.page = self.page.with_ready(ready);
        self
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn back_end(&self) -> &BackEnd {
        &self.back_end
    }

    pub fn back_end_mut(&mut self) -> &mut BackEnd {
        &mut self.back_end
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn forms(&self) -> &F {
        &self.forms
    }

    #[must_use]
    pub fn translations(&self) -> &Translations {
        self.back_end.translations()
    }

    /// Load the page in the default language
    pub async fn load(&mut self) -> VeoResult<()> {
        self.page.load().await?;
        self.back_end.select_language(&self.page, LANGUAGES[0]).await
    }

    pub async fn select_language(&mut self, language: Language) -> VeoResult<()> {
        self.back_end.select_language(&self.page, language).await
    }

    pub async fn refresh(&self) -> VeoResult<()> {
        self.page.refresh().await
    }

    pub async fn log_as(&mut self, user: &User) -> VeoResult<()> {
        self.back_end.log_as(user).await
    }

    pub async fn log_as_admin(&mut self) -> VeoResult<()> {
        self.back_end.log_as_admin().await
    }

    pub async fn logout(&mut self) -> VeoResult<()> {
        self.back_end.logout().await
    }

    pub async fn remove_line(&self, target: impl Into<LineTarget>) -> VeoResult<()> {
        self.table.remove_line(target, self.back_end.translations()).await
    }

    pub async fn remove_all_lines(&self) -> VeoResult<()> {
        self.table.remove_all_lines(self.back_end.translations()).await
    }

    pub async fn remove_all_selected_lines(&self) -> VeoResult<()> {
        self.table
            .remove_all_selected_lines(self.back_end.translations())
            .await
    }

    pub async fn search(&self, values: &BTreeMap<String, FieldValue>) -> VeoResult<()> {
        self.table.search(&self.forms, values).await
    }

    pub async fn clear_search(&self) -> VeoResult<()> {
        self.table.clear_search(&self.forms).await
    }

    pub async fn add_line(&self, name: &str, data: &Value) -> VeoResult<()> {
        self.forms.add_line(&self.table, name, data).await
    }

    pub async fn edit_line(&self, name: &str, data: &Value) -> VeoResult<()> {
        self.forms.edit_line(&self.table, name, data).await
    }

    pub async fn get_edition_form_errors(&self) -> VeoResult<Vec<String>> {
        self.table.get_edition_form_errors(&self.forms).await
    }

    pub async fn is_edition_form_on_error(&self) -> VeoResult<bool> {
        self.table.is_edition_form_on_error(&self.forms).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod pagination_math_tests {
        use super::*;

        #[test]
        fn test_page_link_number() {
            assert_eq!(page_link_number("3"), Some(3));
            assert_eq!(page_link_number("12 (current)"), Some(12));
            assert_eq!(page_link_number("12(current)"), Some(12));
            assert_eq!(page_link_number("»"), None);
        }

        #[test]
        fn test_lines_in_page() {
            assert_eq!(lines_in_page(31, 10, 1), 10);
            assert_eq!(lines_in_page(31, 10, 4), 1);
            assert_eq!(lines_in_page(30, 10, 3), 10);
            assert_eq!(lines_in_page(31, 10, 5), 0);
            assert_eq!(lines_in_page(31, 0, 1), 0);
        }

        proptest! {
            #[test]
            fn prop_pages_hold_every_line(total in 0usize..500, per_page in 1usize..50) {
                let pages = total.div_ceil(per_page);
                let sum: usize = (1..=pages).map(|p| lines_in_page(total, per_page, p)).sum();
                prop_assert_eq!(sum, total);
                for page in 1..pages {
                    prop_assert_eq!(lines_in_page(total, per_page, page), per_page);
                }
            }
        }
    }

    mod target_tests {
        use super::*;

        #[test]
        fn test_line_target_conversions() {
            assert_eq!(LineTarget::from("foo"), LineTarget::Name("foo".to_string()));
            let line = Line {
                row: Table::rows().nth(2),
                cell: Table::rows().nth(2).find_css("td").nth(1),
                index: 2,
            };
            assert_eq!(LineTarget::from(line.clone()), LineTarget::Resolved(line));
        }
    }

    mod fake_back_office_tests {
        use super::*;
        use crate::config::TestConfig;
        use crate::helper::MemoryStore;
        use crate::mock::back_office::{self, ENTITIES_PATH};
        use crate::mock::{EntityForms, FakeBackOffice, MockBrowser};
        use serde_json::json;

        const BASE_URL: &str = "http://localhost/";

        async fn entities_page(total: usize) -> (TablePage<EntityForms>, MemoryStore) {
            let store = MemoryStore::new();
            for i in 0..total {
                store.insert(json!({ "name": format!("Entity {i:02}") })).unwrap();
            }
            let admin = User::new("admin", "admin@example.com", "secret");
            let app = FakeBackOffice::new(store.clone()).with_user(admin.clone());
            let browser = Arc::new(MockBrowser::new(BASE_URL, app));
            let session = Session::new(browser, TestConfig::new(BASE_URL).with_super_admin(admin));
            let mut page = TablePage::new(
                session,
                ENTITIES_PATH,
                Arc::new(back_office::translations()),
                EntityForms,
            );
            page.log_as_admin().await.unwrap();
            page.load().await.unwrap();
            (page, store)
        }

        fn name_search(text: &str) -> BTreeMap<String, FieldValue> {
            BTreeMap::from([("name".to_string(), FieldValue::Text(text.to_string()))])
        }

        #[tokio::test(start_paused = true)]
        async fn test_pagination_state() {
            let (page, _) = entities_page(31).await;
            let table = page.table();
            assert_eq!(table.get_current_page().await.unwrap(), 1);
            assert_eq!(table.get_total_pages().await.unwrap(), 4);
            assert_eq!(table.get_total_lines().await.unwrap(), 31);
            assert_eq!(table.get_total_pagination_links().await.unwrap(), 3);
            assert!(!table.is_previous_range_link_enabled().await.unwrap());
            assert!(table.is_next_range_link_enabled().await.unwrap());
            assert_eq!(table.get_lines_number().await.unwrap(), Some(10));
        }

        #[tokio::test(start_paused = true)]
        async fn test_select_page_walks_ranges() {
            let (page, _) = entities_page(31).await;
            let table = page.table();
            table.select_last_page().await.unwrap();
            assert_eq!(table.get_current_page().await.unwrap(), 4);
            assert_eq!(table.get_lines_in_page_number().await.unwrap(), 1);
            assert!(!table.is_next_range_link_enabled().await.unwrap());

            table.select_page(2).await.unwrap();
            assert_eq!(table.get_current_page().await.unwrap(), 2);

            assert!(matches!(
                table.select_page(9).await,
                Err(VeoError::PageNotFound { page: 9 })
            ));
        }

        #[tokio::test(start_paused = true)]
        async fn test_lines_per_page() {
            let (page, _) = entities_page(31).await;
            let table = page.table();
            table.set_lines_number(30).await.unwrap();
            assert_eq!(table.get_lines_number().await.unwrap(), Some(30));
            assert_eq!(table.get_total_pages().await.unwrap(), 2);
            assert_eq!(table.get_lines_in_page_number().await.unwrap(), 30);
            // Already applied
            table.set_lines_number(30).await.unwrap();
            assert!(matches!(
                table.set_lines_number(50).await,
                Err(VeoError::ItemsPerPageNotFound { count: 50 })
            ));
        }

        #[tokio::test(start_paused = true)]
        async fn test_get_line_searches_every_page() {
            let (page, _) = entities_page(31).await;
            let table = page.table();
            let line = table.get_line("Entity 25").await.unwrap();
            assert_eq!(line.index, 5);
            assert_eq!(table.get_current_page().await.unwrap(), 3);
            assert!(matches!(
                table.get_line("Entity 99").await,
                Err(VeoError::LineNotFound { .. })
            ));
        }

        #[tokio::test(start_paused = true)]
        async fn test_empty_table_has_no_lines() {
            let (page, _) = entities_page(0).await;
            assert!(matches!(page.table().get_line("Entity 00").await, Err(VeoError::NoLines)));
            assert!(matches!(page.table().get_line_values("Name").await, Err(VeoError::NoLines)));
        }

        #[tokio::test(start_paused = true)]
        async fn test_line_values_span_pages() {
            let (page, _) = entities_page(12).await;
            let values = page.table().get_line_values("Name").await.unwrap();
            let expected: Vec<String> = (0..12).map(|i| format!("Entity {i:02}")).collect();
            assert_eq!(values, expected);
            assert!(matches!(
                page.table().get_header_index("Author").await,
                Err(VeoError::HeaderNotFound { .. })
            ));
        }

        #[tokio::test(start_paused = true)]
        async fn test_sort_by() {
            let (page, _) = entities_page(12).await;
            let table = page.table();
            table.sort_by("Name", false).await.unwrap();
            assert_eq!(table.get_line_in_page_values("Name").await.unwrap()[0], "Entity 11");
            table.sort_by("Name", false).await.unwrap();
            assert_eq!(table.get_line_in_page_values("Name").await.unwrap()[0], "Entity 11");
            table.sort_by("Name", true).await.unwrap();
            assert_eq!(table.get_line_in_page_values("Name").await.unwrap()[0], "Entity 00");
            assert!(matches!(table.sort_by("Author", true).await, Err(VeoError::NoHeader { .. })));
        }

        #[tokio::test(start_paused = true)]
        async fn test_selection_is_idempotent() {
            let (page, _) = entities_page(5).await;
            let table = page.table();
            table.select_line("Entity 01").await.unwrap();
            table.select_line("Entity 01").await.unwrap();
            assert!(table.is_selected_line("Entity 01").await.unwrap());
            table.deselect_line("Entity 01").await.unwrap();
            table.deselect_line("Entity 01").await.unwrap();
            assert!(!table.is_selected_line("Entity 01").await.unwrap());

            table.select_all_lines().await.unwrap();
            assert!(table.is_all_selected().await.unwrap());
            table.deselect_all_lines().await.unwrap();
            assert!(!table.is_all_selected().await.unwrap());
            assert!(!table.is_selected_line("Entity 03").await.unwrap());
        }

        #[tokio::test(start_paused = true)]
        async fn test_select_all_popover() {
            let (page, _) = entities_page(3).await;
            page.table().set_select_all_mouse_over().await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_remove_line() {
            let (page, store) = entities_page(31).await;
            page.remove_line("Entity 03").await.unwrap();
            assert_eq!(store.len().unwrap(), 30);
            assert!(!page.table().session().is_present(&Table::dialog()).await.unwrap());
            assert_eq!(
                page.back_end().get_alert_messages().await.unwrap(),
                ["1 element(s) removed"]
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_cancel_remove() {
            let (page, store) = entities_page(5).await;
            let table = page.table();
            table.perform_action("Entity 03", "Remove", false).await.unwrap();
            table.cancel_action().await.unwrap();
            assert_eq!(store.len().unwrap(), 5);
        }

        #[tokio::test(start_paused = true)]
        async fn test_remove_all_lines_of_page() {
            let (page, store) = entities_page(31).await;
            page.remove_all_lines().await.unwrap();
            assert_eq!(store.len().unwrap(), 21);
            assert_eq!(page.table().get_total_lines().await.unwrap(), 21);
        }

        #[tokio::test(start_paused = true)]
        async fn test_remove_in_french() {
            let (mut page, store) = entities_page(3).await;
            page.select_language(LANGUAGES[1]).await.unwrap();
            page.remove_line("Entity 01").await.unwrap();
            assert_eq!(store.len().unwrap(), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_open_and_close_line() {
            let (page, _) = entities_page(5).await;
            let table = page.table();
            table.open_line("Entity 02").await.unwrap();
            assert!(table.is_opened_line().await.unwrap());
            assert!(!page.is_edition_form_on_error().await.unwrap());
            table.close_line().await.unwrap();
            assert!(!table.is_opened_line().await.unwrap());
        }

        #[tokio::test(start_paused = true)]
        async fn test_search_and_clear() {
            let (page, _) = entities_page(31).await;
            page.search(&name_search("Entity 1")).await.unwrap();
            assert_eq!(page.table().get_total_lines().await.unwrap(), 10);
            page.clear_search().await.unwrap();
            assert_eq!(page.table().get_total_lines().await.unwrap(), 31);
            assert!(matches!(
                page.search(&BTreeMap::from([("author".to_string(), FieldValue::None)])).await,
                Err(VeoError::UnknownSearchField { .. })
            ));
        }

        #[tokio::test(start_paused = true)]
        async fn test_search_engine_toggles() {
            let (page, _) = entities_page(1).await;
            let table = page.table();
            table.close_search_engine().await.unwrap();
            assert!(!table.session().is_visible(&Table::search_form()).await.unwrap());
            table.open_search_engine().await.unwrap();
            assert!(table.session().is_visible(&Table::search_form()).await.unwrap());
        }

        #[tokio::test(start_paused = true)]
        async fn test_add_line() {
            let (page, store) = entities_page(2).await;
            page.add_line("Entity new", &json!({})).await.unwrap();
            assert_eq!(store.len().unwrap(), 3);
            page.table().get_line("Entity new").await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_forms_not_implemented() {
            let (page, _) = entities_page(1).await;
            match page.table().search(&NoForms, &BTreeMap::new()).await.unwrap_err() {
                VeoError::NotImplemented { operation } => assert_eq!(operation, "getSearchFields"),
                other => panic!("unexpected error {other}"),
            }
            assert!(matches!(
                page.forms().edit_line(page.table(), "Entity 00", &json!({})).await,
                Err(VeoError::NotImplemented { .. })
            ));
        }
    }
}
