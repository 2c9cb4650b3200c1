//! In-memory directory site used by unit tests
//!
//! Simulates the three page kinds of the exhibitor directory (root with the
//! category index, category pages with "load more", detail pages) and answers
//! the default selectors the way the real site does.

use crate::browser::{Browser, BrowserError, BrowserResult, ElementHandle};
use crate::config::SelectorConfig;
use async_trait::async_trait;
use std::time::Duration;

/// One entry of the category index
#[derive(Debug, Clone)]
pub struct ScriptedCategory {
    pub label: String,
    pub has_link: bool,
    pub companies: Vec<String>,
    /// Listings visible before any "load more" click
    pub initial: usize,
    /// Listings revealed per "load more" click
    pub batch: usize,
    /// Detail pages have no contact list or address block
    pub bare_details: bool,
    /// Positions of listings rendered without a link
    pub linkless: Vec<usize>,
}

impl ScriptedCategory {
    pub fn new(label: &str, companies: usize, initial: usize, batch: usize) -> Self {
        Self {
            label: label.to_string(),
            has_link: true,
            companies: (0..companies)
                .map(|i| format!("{} Company {}", label, i))
                .collect(),
            initial,
            batch,
            bare_details: false,
            linkless: Vec::new(),
        }
    }

    /// A trailing index entry without a category behind it
    pub fn control(label: &str) -> Self {
        Self::new(label, 0, 0, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Blank,
    Root,
    Category(usize),
    Detail(usize, usize),
}

pub struct ScriptedSite {
    pub categories: Vec<ScriptedCategory>,
    pub selectors: SelectorConfig,
    /// Going back to a category page collapses it to its initial listings
    pub reset_on_back: bool,
    /// "Load more" stays visible but never reveals anything
    pub stuck_load_more: bool,
    /// Number of upcoming "load more" clicks that fail
    pub failing_load_more_clicks: usize,
    /// Clicking this category's link fails
    pub failing_category: Option<usize>,
    pub consent_present: bool,

    page: Page,
    history: Vec<Page>,
    revealed: usize,

    pub entered: Vec<usize>,
    pub load_more_clicks: usize,
    pub detail_visits: usize,
    pub consent_clicked: bool,
    pub closed: bool,
}

impl ScriptedSite {
    pub fn new(categories: Vec<ScriptedCategory>) -> Self {
        Self {
            categories,
            selectors: SelectorConfig::default(),
            reset_on_back: false,
            stuck_load_more: false,
            failing_load_more_clicks: 0,
            failing_category: None,
            consent_present: false,
            page: Page::Blank,
            history: Vec::new(),
            revealed: 0,
            entered: Vec::new(),
            load_more_clicks: 0,
            detail_visits: 0,
            consent_clicked: false,
            closed: false,
        }
    }

    /// Places the session directly on a category page
    pub fn open_category(&mut self, index: usize) {
        self.page = Page::Category(index);
        self.revealed = self.categories[index].initial;
    }

    fn visible_listings(&self) -> usize {
        match self.page {
            Page::Category(c) => self.revealed.min(self.categories[c].companies.len()),
            _ => 0,
        }
    }

    fn load_more_present(&self) -> bool {
        match self.page {
            Page::Category(c) => {
                self.stuck_load_more || self.revealed < self.categories[c].companies.len()
            }
            _ => false,
        }
    }

    fn detail(&self) -> Option<(&ScriptedCategory, usize)> {
        match self.page {
            Page::Detail(c, j) => Some((&self.categories[c], j)),
            _ => None,
        }
    }

    fn matches(&self, selector: &str) -> usize {
        let s = &self.selectors;
        let on_index = matches!(self.page, Page::Root | Page::Category(_));
        let full_detail = self.detail().map(|(c, _)| !c.bare_details).unwrap_or(false);

        if selector == s.category_index {
            if on_index {
                self.categories.len()
            } else {
                0
            }
        } else if selector == s.listing {
            self.visible_listings()
        } else if selector == s.listing_container {
            usize::from(matches!(self.page, Page::Category(_)))
        } else if selector == s.load_more {
            usize::from(self.load_more_present())
        } else if selector == s.name {
            usize::from(self.detail().is_some())
        } else if selector == s.contact_container || selector == s.address {
            usize::from(full_detail)
        } else {
            0
        }
    }

    fn detail_html(category: usize, entry: &ScriptedCategory, listing: usize) -> String {
        let name = &entry.companies[listing];
        if entry.bare_details {
            return format!(r#"<div class="info"><h1>{}</h1></div>"#, name);
        }
        format!(
            r#"<html><body>
            <div class="info"><h1>{name}</h1></div>
            <ul class="exhibitordetails-contactinfo-list">
              <li>Phone: +49 {category} {listing}</li>
              <li>Website: c{category}-{listing}.example</li>
            </ul>
            <div class="exhibitordetails-locationinfo">Address Street {listing}</div>
            </body></html>"#
        )
    }

    fn not_found(handle: &ElementHandle) -> BrowserError {
        BrowserError::NotFound(handle.clone())
    }
}

#[async_trait]
impl Browser for ScriptedSite {
    async fn goto(&mut self, _url: &str) -> BrowserResult<()> {
        if self.page != Page::Blank {
            self.history.push(self.page);
        }
        self.page = Page::Root;
        self.revealed = 0;
        Ok(())
    }

    async fn back(&mut self) -> BrowserResult<()> {
        let previous = self.history.pop().ok_or(BrowserError::Command {
            command: "back",
            message: "no history".to_string(),
        })?;
        if let Page::Category(c) = previous {
            if self.reset_on_back {
                self.revealed = self.categories[c].initial;
            }
        }
        self.page = previous;
        Ok(())
    }

    async fn count(&mut self, selector: &str) -> BrowserResult<usize> {
        Ok(self.matches(selector))
    }

    async fn text_of(&mut self, handle: &ElementHandle) -> BrowserResult<Option<String>> {
        if handle.index >= self.matches(&handle.selector) {
            return Ok(None);
        }

        if handle.selector == self.selectors.category_index {
            let category = &self.categories[handle.index];
            if handle.child.is_some() && !category.has_link {
                return Ok(None);
            }
            return Ok(Some(category.label.clone()));
        }

        if handle.selector == self.selectors.listing {
            if let Page::Category(c) = self.page {
                let category = &self.categories[c];
                if handle.child.is_some() && category.linkless.contains(&handle.index) {
                    return Ok(None);
                }
                return Ok(Some(category.companies[handle.index].clone()));
            }
        }
        Ok(None)
    }

    async fn click(&mut self, handle: &ElementHandle) -> BrowserResult<()> {
        if handle.index >= self.matches(&handle.selector) {
            return Err(Self::not_found(handle));
        }

        if handle.selector == self.selectors.category_index {
            if self.failing_category == Some(handle.index) {
                return Err(BrowserError::Command {
                    command: "click",
                    message: "navigation timed out".to_string(),
                });
            }
            if !self.categories[handle.index].has_link {
                return Err(Self::not_found(handle));
            }
            self.history.push(self.page);
            self.open_category(handle.index);
            self.entered.push(handle.index);
        } else if handle.selector == self.selectors.listing {
            let Page::Category(c) = self.page else {
                return Err(Self::not_found(handle));
            };
            if self.categories[c].linkless.contains(&handle.index) {
                return Err(Self::not_found(handle));
            }
            self.history.push(self.page);
            self.page = Page::Detail(c, handle.index);
            self.detail_visits += 1;
        } else if handle.selector == self.selectors.load_more {
            self.load_more_clicks += 1;
            if self.failing_load_more_clicks > 0 {
                self.failing_load_more_clicks -= 1;
                return Err(BrowserError::Command {
                    command: "click",
                    message: "element click intercepted".to_string(),
                });
            }
            if !self.stuck_load_more {
                if let Page::Category(c) = self.page {
                    self.revealed += self.categories[c].batch;
                }
            }
        }
        Ok(())
    }

    async fn scroll_into_view(&mut self, handle: &ElementHandle) -> BrowserResult<()> {
        if handle.index < self.matches(&handle.selector) {
            Ok(())
        } else {
            Err(Self::not_found(handle))
        }
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> BrowserResult<bool> {
        Ok(self.matches(selector) > 0)
    }

    async fn source(&mut self) -> BrowserResult<String> {
        Ok(match self.page {
            Page::Detail(c, j) => Self::detail_html(c, &self.categories[c], j),
            _ => "<html><body></body></html>".to_string(),
        })
    }

    async fn click_in_shadow(&mut self, host: &str, target: &str) -> BrowserResult<bool> {
        let dialog = host == self.selectors.consent_host && target == self.selectors.consent_accept;
        if dialog && self.consent_present && self.page == Page::Root {
            self.consent_present = false;
            self.consent_clicked = true;
            return Ok(true);
        }
        Ok(false)
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.closed = true;
        Ok(())
    }
}
