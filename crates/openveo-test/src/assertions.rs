//! Ready-made checks for the tables of CRUD pages.
//!
//! Each check creates its own fixture lines through the [`Helper`], drives the
//! table, then removes the fixtures again whether the check passed or not. A
//! failed expectation is reported as [`VeoError::AssertionFailed`].

use crate::fields::FieldValue;
use crate::helper::{Entity, Helper};
use crate::pages::{lines_in_page, Table, TableForms, TablePage, REMOVE_ACTION_KEY};
use crate::result::{VeoError, VeoResult};
use crate::wait::Expectation;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::info;

/// Items per page proposed by the back office tables
pub const ITEMS_PER_PAGE: [usize; 4] = [5, 10, 20, 30];

/// Number of items per page buttons a table of `total` lines shows
#[must_use]
pub fn expected_items_per_page_buttons(total: usize) -> usize {
    if total < 6 {
        0
    } else {
        (total.div_ceil(10) + 1).min(ITEMS_PER_PAGE.len())
    }
}

fn expect_eq<T: PartialEq + Debug>(actual: T, expected: T, message: &str) -> VeoResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(VeoError::assertion(format!(
            "{message}: expected {expected:?}, got {actual:?}"
        )))
    }
}

fn expect(condition: bool, message: &str) -> VeoResult<()> {
    if condition {
        Ok(())
    } else {
        Err(VeoError::assertion(message))
    }
}

fn name_search(name: &str) -> BTreeMap<String, FieldValue> {
    BTreeMap::from([("name".to_string(), FieldValue::Text(name.to_string()))])
}

/// Table checks of a [`TablePage`]
#[derive(Debug)]
pub struct TableAssert<'a, F: TableForms> {
    page: &'a TablePage<F>,
    helper: &'a Helper,
}

impl<'a, F: TableForms> TableAssert<'a, F> {
    #[must_use]
    pub const fn new(page: &'a TablePage<F>, helper: &'a Helper) -> Self {
        Self { page, helper }
    }

    fn table(&self) -> &Table {
        self.page.table()
    }

    /// Remove the fixture `lines` and reload the page, the check `outcome`
    /// winning over a cleanup failure
    async fn finish(&self, lines: &[Entity], outcome: VeoResult<()>) -> VeoResult<()> {
        let cleanup = async {
            self.helper.remove_entities(lines).await?;
            self.page.refresh().await
        }
        .await;
        outcome.and(cleanup)
    }

    /// Compare the first `in_page` values with the same values sorted
    fn compare_first_page(
        values: &[String],
        in_page: usize,
        descending: bool,
        message: &str,
    ) -> VeoResult<()> {
        let mut sorted = values.to_vec();
        sorted.sort();
        if descending {
            sorted.reverse();
        }
        let n = in_page.min(values.len());
        expect_eq(&values[..n], &sorted[..n], message)
    }

    /// Visit every page of a table of `total` lines shown `per_page` at a time,
    /// checking the pagination state on each
    pub async fn check_navigation(&self, total: usize, per_page: usize) -> VeoResult<()> {
        if per_page == 0 {
            return Err(VeoError::assertion("Number of lines per page must be positive"));
        }
        let table = self.table();
        let total_pages = total.div_ceil(per_page);
        for index in 1..=total_pages {
            table.select_page(index).await?;
            expect_eq(table.get_current_page().await?, index, "Current page incorrect")?;
            expect_eq(table.get_total_pages().await?, total_pages, "Total pages incorrect")?;
            expect_eq(table.get_total_lines().await?, total, "Total lines incorrect")?;
            expect_eq(
                table.get_lines_in_page_number().await?,
                lines_in_page(total, per_page, index),
                "Number of lines in page incorrect",
            )?;
            table.session().wait_for_angular().await?;
        }
        Ok(())
    }

    /// Navigate 31 lines named `name` with every items per page setting
    pub async fn check_pagination(&self, name: &str) -> VeoResult<()> {
        info!(name, "check pagination");
        let lines = self.helper.add_entities_auto(name, 31, 0).await?;
        let outcome = async {
            self.page.refresh().await?;
            self.page.search(&name_search(name)).await?;
            let total = self.table().get_total_lines().await?;
            for (i, per_page) in ITEMS_PER_PAGE.iter().enumerate() {
                if total > ITEMS_PER_PAGE[i.saturating_sub(1)] {
                    self.table().set_lines_number(*per_page).await?;
                    self.check_navigation(total, *per_page).await?;
                }
            }
            self.page.clear_search().await
        }
        .await;
        self.finish(&lines, outcome).await
    }

    /// Sort on `column` both ways and compare the first page against the sorted values
    pub async fn check_sort(&self, column: &str) -> VeoResult<()> {
        info!(column, "check sort");
        let lines = self.helper.add_entities_auto("test sort", 2, 0).await?;
        let outcome = async {
            self.page.refresh().await?;
            let table = self.table();
            table.select_page(1).await?;
            let in_page = table.get_lines_in_page_number().await?;

            table.sort_by(column, true).await?;
            let values = table.get_line_values(column).await?;
            Self::compare_first_page(&values, in_page, false, "Ascending sort incorrect")?;

            table.sort_by(column, false).await?;
            let values = table.get_line_values(column).await?;
            Self::compare_first_page(&values, in_page, true, "Descending sort incorrect")
        }
        .await;
        self.finish(&lines, outcome).await
    }

    /// Compare the items per page buttons with the number of lines
    pub async fn check_items_per_page_buttons(&self) -> VeoResult<()> {
        let total = self.table().get_total_lines().await?;
        let buttons = self.table().session().count(&Table::items_per_page_links()).await?;
        expect_eq(
            buttons,
            expected_items_per_page_buttons(total),
            "Number of items per page buttons incorrect",
        )
    }

    /// Grow a table of lines named `name` up to 31 lines, checking the items
    /// per page buttons at each step
    pub async fn check_items_per_page(&self, name: &str) -> VeoResult<()> {
        info!(name, "check items per page");
        let mut lines = Vec::new();
        let outcome = self.grow_table(name, &mut lines).await;
        self.finish(&lines, outcome).await
    }

    async fn grow_table(&self, name: &str, lines: &mut Vec<Entity>) -> VeoResult<()> {
        let search = name_search(name);
        self.page.search(&search).await?;
        self.check_items_per_page_buttons().await?;
        let mut count = 0;
        for target in [6, 11, 21, 31] {
            lines.extend(self.helper.add_entities_auto(name, target, count).await?);
            count = target;
            self.page.refresh().await?;
            self.page.search(&search).await?;
            self.check_items_per_page_buttons().await?;
        }
        self.page.clear_search().await
    }

    /// Remove lines named `name` through the multiple actions: half of them
    /// selected one by one, then the rest of the page
    pub async fn check_massive_remove(&self, name: &str) -> VeoResult<()> {
        const TOTAL: usize = 4;
        info!(name, "check massive remove");
        let lines = self.helper.add_entities_auto(name, TOTAL, 0).await?;
        let outcome = async {
            self.page.refresh().await?;
            self.page.search(&name_search(name)).await?;
            for i in 0..TOTAL / 2 {
                self.table().select_line(format!("{name} {i}")).await?;
            }
            self.page.remove_all_selected_lines().await?;
            expect_eq(
                self.table().get_total_lines().await?,
                TOTAL - TOTAL / 2,
                "Selected lines not removed",
            )?;
            self.page.remove_all_lines().await?;
            expect_eq(self.table().get_total_lines().await?, 0, "Lines not removed")?;
            self.page.clear_search().await
        }
        .await;
        // Already gone on success
        self.finish(&lines, outcome).await
    }

    /// Search with `search`, expecting exactly the `expected` values in `column`
    pub async fn check_search(
        &self,
        search: &BTreeMap<String, FieldValue>,
        expected: &[String],
        column: &str,
    ) -> VeoResult<()> {
        self.page.search(search).await?;
        let values = match self.table().get_line_values(column).await {
            Err(VeoError::NoLines) => Vec::new(),
            other => other?,
        };
        for value in expected {
            expect(values.contains(value), &format!("\"{value}\" must correspond to the search"))?;
        }
        expect_eq(
            values.len(),
            expected.len(),
            &format!("{} line(s) must correspond to the search", expected.len()),
        )?;
        self.page.clear_search().await
    }

    /// Open the remove dialog of a line named `name 0` and cancel it
    pub async fn check_cancel_remove(&self, name: &str) -> VeoResult<()> {
        info!(name, "check cancel remove");
        let lines = self.helper.add_entities_auto(name, 1, 0).await?;
        let line = format!("{name} 0");
        let outcome = async {
            self.page.refresh().await?;
            let table = self.table();
            let remove = self.page.back_end().translate(REMOVE_ACTION_KEY);
            table.perform_action(line.as_str(), &remove, false).await?;
            table
                .session()
                .wait(
                    Expectation::Visible(Table::dialog()),
                    table.session().short_wait(),
                    "Missing confirmation dialog",
                )
                .await?;
            table.cancel_action().await?;
            table.get_line(line.as_str()).await.map(|_| ())
        }
        .await;
        self.finish(&lines, outcome).await
    }

    /// Select every line of the page one by one, expecting the select all
    /// checkbox to follow
    pub async fn check_lines_selection(&self, column: &str) -> VeoResult<()> {
        info!(column, "check lines selection");
        let lines = self.helper.add_entities_auto("test lines selection", 2, 0).await?;
        let outcome = async {
            self.page.refresh().await?;
            let table = self.table();
            let names = table.get_line_in_page_values(column).await?;
            for name in &names {
                table.select_line(name.as_str()).await?;
            }
            expect(table.is_all_selected().await?, "All lines should be selected")?;
            if let Some(first) = names.first() {
                table.deselect_line(first.as_str()).await?;
            }
            expect(!table.is_all_selected().await?, "Not all lines should be selected")
        }
        .await;
        self.finish(&lines, outcome).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod buttons_tests {
        use super::*;

        #[test]
        fn test_expected_buttons() {
            assert_eq!(expected_items_per_page_buttons(5), 0);
            assert_eq!(expected_items_per_page_buttons(6), 2);
            assert_eq!(expected_items_per_page_buttons(10), 2);
            assert_eq!(expected_items_per_page_buttons(11), 3);
            assert_eq!(expected_items_per_page_buttons(21), 4);
            assert_eq!(expected_items_per_page_buttons(500), 4);
        }

        proptest! {
            #[test]
            fn prop_buttons_never_decrease(total in 0usize..1000) {
                let (before, after) = (
                    expected_items_per_page_buttons(total),
                    expected_items_per_page_buttons(total + 1),
                );
                prop_assert!(before <= after);
            }
        }
    }

    mod expectation_tests {
        use super::*;

        #[test]
        fn test_expect_eq_message() {
            assert!(expect_eq(3, 3, "Current page incorrect").is_ok());
            match expect_eq(2, 3, "Current page incorrect").unwrap_err() {
                VeoError::AssertionFailed { message } => {
                    assert_eq!(message, "Current page incorrect: expected 3, got 2");
                }
                other => panic!("unexpected error {other}"),
            }
        }
    }
}
