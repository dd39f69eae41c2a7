//! Locators and lazy element finders.
//!
//! A [`Locator`] describes one lookup strategy (CSS, XPath, AngularJS binding,
//! model, repeater...). A [`Finder`] chains locators and positional picks and is
//! only resolved against the page when an action needs it, so a finder built
//! before a re-render still targets the fresh element afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locator {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// XPath expression, relative to the scope when one is given
    XPath(String),
    /// AngularJS binding containing the expression
    Binding(String),
    /// AngularJS binding equal to the expression
    ExactBinding(String),
    /// AngularJS `ng-model` expression
    Model(String),
    /// AngularJS `ng-repeat` expression (prefix match)
    Repeater(String),
    /// CSS selector restricted to elements whose text contains `text`
    CssContainingText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
    /// Element id
    Id(String),
    /// Single class name
    ClassName(String),
}

impl Locator {
    /// Create a CSS locator
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath locator
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// Create a binding locator
    #[must_use]
    pub fn binding(expression: impl Into<String>) -> Self {
        Self::Binding(expression.into())
    }

    /// Create an exact binding locator
    #[must_use]
    pub fn exact_binding(expression: impl Into<String>) -> Self {
        Self::ExactBinding(expression.into())
    }

    /// Create a model locator
    #[must_use]
    pub fn model(expression: impl Into<String>) -> Self {
        Self::Model(expression.into())
    }

    /// Create a repeater locator
    #[must_use]
    pub fn repeater(expression: impl Into<String>) -> Self {
        Self::Repeater(expression.into())
    }

    /// Create a CSS locator filtered by text content
    #[must_use]
    pub fn css_containing_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssContainingText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// Create an id locator
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create a class name locator
    #[must_use]
    pub fn class_name(name: impl Into<String>) -> Self {
        Self::ClassName(name.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "by.css(\"{s}\")"),
            Self::XPath(s) => write!(f, "by.xpath(\"{s}\")"),
            Self::Binding(s) => write!(f, "by.binding(\"{s}\")"),
            Self::ExactBinding(s) => write!(f, "by.exactBinding(\"{s}\")"),
            Self::Model(s) => write!(f, "by.model(\"{s}\")"),
            Self::Repeater(s) => write!(f, "by.repeater(\"{s}\")"),
            Self::CssContainingText { css, text } => {
                write!(f, "by.cssContainingText(\"{css}\", \"{text}\")")
            }
            Self::Id(s) => write!(f, "by.id(\"{s}\")"),
            Self::ClassName(s) => write!(f, "by.className(\"{s}\")"),
        }
    }
}

/// One resolution step of a [`Finder`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Every element matching the locator under each current element
    All(Locator),
    /// Keep only the element at this index (negative counts from the end)
    Nth(isize),
}

/// Lazy chain of lookups, resolved when an action runs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Finder {
    steps: Vec<Step>,
}

impl Finder {
    /// Finder matching every element of the document for `locator`
    #[must_use]
    pub fn all(locator: Locator) -> Self {
        Self {
            steps: vec![Step::All(locator)],
        }
    }

    /// Shorthand for `Finder::all(Locator::css(selector))`
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::all(Locator::css(selector))
    }

    /// Descendants of the current elements matching `locator`
    #[must_use]
    pub fn find(&self, locator: Locator) -> Self {
        let mut steps = self.steps.clone();
        steps.push(Step::All(locator));
        Self { steps }
    }

    /// Shorthand for `self.find(Locator::css(selector))`
    #[must_use]
    pub fn find_css(&self, selector: impl Into<String>) -> Self {
        self.find(Locator::css(selector))
    }

    /// Element at `index` (negative counts from the end)
    #[must_use]
    pub fn nth(&self, index: isize) -> Self {
        let mut steps = self.steps.clone();
        steps.push(Step::Nth(index));
        Self { steps }
    }

    /// First element
    #[must_use]
    pub fn first(&self) -> Self {
        self.nth(0)
    }

    /// Last element
    #[must_use]
    pub fn last(&self) -> Self {
        self.nth(-1)
    }

    /// Parent of the current elements
    #[must_use]
    pub fn parent(&self) -> Self {
        self.find(Locator::xpath(".."))
    }

    /// Resolution steps in order
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl fmt::Display for Finder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("element")?;
        for step in &self.steps {
            match step {
                Step::All(locator) => write!(f, ".all({locator})")?,
                Step::Nth(index) => write!(f, ".get({index})")?,
            }
        }
        Ok(())
    }
}

/// Pick the element at `index` from a resolved list (negative counts from the end)
#[must_use]
pub fn pick_index(len: usize, index: isize) -> Option<usize> {
    if index >= 0 {
        let i = index as usize;
        (i < len).then_some(i)
    } else {
        let back = index.unsigned_abs();
        (back <= len).then(|| len - back)
    }
}

/// Position of an element on the page
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod finder_tests {
        use super::*;

        #[test]
        fn test_chain_keeps_order() {
            let rows = Finder::css(".datatable table").find_css("tbody > tr");
            let cell = rows.nth(2).find_css("td").last();
            assert_eq!(
                cell.steps(),
                &[
                    Step::All(Locator::css(".datatable table")),
                    Step::All(Locator::css("tbody > tr")),
                    Step::Nth(2),
                    Step::All(Locator::css("td")),
                    Step::Nth(-1),
                ]
            );
        }

        #[test]
        fn test_parent_is_relative_xpath() {
            let parent = Finder::css("label").first().parent();
            assert_eq!(parent.steps().last(), Some(&Step::All(Locator::xpath(".."))));
        }

        #[test]
        fn test_display() {
            let finder = Finder::all(Locator::exact_binding("pagination.page")).first();
            assert_eq!(
                finder.to_string(),
                "element.all(by.exactBinding(\"pagination.page\")).get(0)"
            );
        }
    }

    mod pick_index_tests {
        use super::*;

        #[test]
        fn test_positive_and_negative() {
            assert_eq!(pick_index(3, 0), Some(0));
            assert_eq!(pick_index(3, 2), Some(2));
            assert_eq!(pick_index(3, 3), None);
            assert_eq!(pick_index(3, -1), Some(2));
            assert_eq!(pick_index(3, -3), Some(0));
            assert_eq!(pick_index(3, -4), None);
            assert_eq!(pick_index(0, 0), None);
            assert_eq!(pick_index(0, -1), None);
        }

        proptest! {
            #[test]
            fn prop_pick_stays_in_bounds(len in 0usize..50, index in -60isize..60) {
                if let Some(i) = pick_index(len, index) {
                    prop_assert!(i < len);
                }
            }
        }
    }
}
