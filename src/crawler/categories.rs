//! Category index enumeration
//!
//! The directory's category index is a list of entries, most of them links
//! into a category, some of them navigation controls. The site re-renders the
//! list after every navigation, so nothing here holds on to elements: every
//! call queries the current page again.

use crate::browser::{Browser, BrowserResult, ElementHandle};
use crate::config::SelectorConfig;
use crate::ConfigError;
use regex::Regex;

/// A resolved index entry, addressed by position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryHandle {
    pub index: usize,

    /// Locator of the entry's link, re-resolved when clicked
    pub link: ElementHandle,

    /// Link text; `None` when the entry has no link
    pub label: Option<String>,
}

/// Classification of an index entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Category,
    Control { reason: String },
}

/// Enumerates the category index of the current page
pub struct CategoryIndex {
    selector: String,
    link: String,
    control_labels: Vec<Regex>,
}

impl CategoryIndex {
    /// Creates an enumerator for the configured index selectors
    ///
    /// # Arguments
    ///
    /// * `selectors` - Site selectors (`category-index`, `category-link`)
    /// * `control_labels` - Patterns marking entries as navigation controls
    pub fn new(selectors: &SelectorConfig, control_labels: &[String]) -> Result<Self, ConfigError> {
        let control_labels = control_labels
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    ConfigError::InvalidPattern(format!(
                        "Invalid control label '{}': {}",
                        pattern, e
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            selector: selectors.category_index.clone(),
            link: selectors.category_link.clone(),
            control_labels,
        })
    }

    /// Number of index entries currently on the page
    pub async fn len<B: Browser + ?Sized>(&self, browser: &mut B) -> BrowserResult<usize> {
        browser.count(&self.selector).await
    }

    /// Resolves entry `index` against the current page
    ///
    /// Performs no navigation. Returns `Ok(None)` if the index no longer has
    /// that many entries.
    pub async fn item_at<B: Browser + ?Sized>(
        &self,
        browser: &mut B,
        index: usize,
    ) -> BrowserResult<Option<CategoryHandle>> {
        if index >= self.len(browser).await? {
            return Ok(None);
        }

        let link = ElementHandle::nth(self.selector.as_str(), index).child(self.link.as_str());
        let label = browser.text_of(&link).await?;

        Ok(Some(CategoryHandle { index, link, label }))
    }

    /// Decides whether an entry leads to a category
    ///
    /// Entries without a link, and entries whose label matches one of the
    /// control patterns, are controls.
    pub fn classify(&self, handle: &CategoryHandle) -> EntryKind {
        let Some(label) = &handle.label else {
            return EntryKind::Control {
                reason: "entry has no link".to_string(),
            };
        };

        match self.control_labels.iter().find(|p| p.is_match(label)) {
            Some(pattern) => EntryKind::Control {
                reason: format!("label '{}' matches '{}'", label, pattern.as_str()),
            },
            None => EntryKind::Category,
        }
    }
}

/// Number of leading index entries the crawl visits
///
/// The last `trailing_controls` entries of the index are pagination controls
/// on the target site, not categories.
pub fn effective_bound(len: usize, trailing_controls: usize) -> usize {
    len.saturating_sub(trailing_controls)
}
