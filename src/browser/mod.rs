//! Browser automation seam
//!
//! The crawler never talks to a browser directly. It consumes the [`Browser`]
//! trait, which exposes just the capabilities the crawl needs: navigation,
//! selector-based DOM queries, clicks and bounded waits.
//!
//! Elements are addressed through [`ElementHandle`] locators instead of live
//! element references. The target site replaces large parts of its DOM after
//! navigation, so every operation re-resolves its locator against the current
//! page.

mod webdriver;

#[cfg(test)]
pub(crate) mod scripted;

pub use webdriver::{check_webdriver_status, WebDriverBrowser};

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a browser implementation
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to start browser session: {0}")]
    Session(String),

    #[error("WebDriver endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("Browser command '{command}' failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },

    #[error("No element at {0}")]
    NotFound(ElementHandle),
}

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Locator for a single element: the `index`-th match of `selector`,
/// optionally narrowed to the first descendant matching `child`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub selector: String,
    pub index: usize,
    pub child: Option<String>,
}

impl ElementHandle {
    /// Addresses the `index`-th element matching `selector`
    pub fn nth(selector: impl Into<String>, index: usize) -> Self {
        Self {
            selector: selector.into(),
            index,
            child: None,
        }
    }

    /// Narrows the handle to the first descendant matching `child`
    pub fn child(mut self, child: impl Into<String>) -> Self {
        self.child = Some(child.into());
        self
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.selector, self.index)?;
        if let Some(child) = &self.child {
            write!(f, " {}", child)?;
        }
        Ok(())
    }
}

/// Capabilities the crawler needs from a browser session
///
/// Implementations own exactly one page. Every method is a suspension point;
/// callers race them against their cancellation token.
#[async_trait]
pub trait Browser: Send {
    /// Navigates to `url` and waits for the page to load
    async fn goto(&mut self, url: &str) -> BrowserResult<()>;

    /// Navigates one step back in the session history
    async fn back(&mut self) -> BrowserResult<()>;

    /// Counts the elements currently matching `selector`
    async fn count(&mut self, selector: &str) -> BrowserResult<usize>;

    /// Returns true if at least one element matches `selector`
    async fn exists(&mut self, selector: &str) -> BrowserResult<bool> {
        Ok(self.count(selector).await? > 0)
    }

    /// Returns true if the locator resolves to an element on the current page
    async fn resolves(&mut self, handle: &ElementHandle) -> BrowserResult<bool> {
        Ok(self.text_of(handle).await?.is_some())
    }

    /// Returns the trimmed text of the element, or `None` if it cannot be resolved
    async fn text_of(&mut self, handle: &ElementHandle) -> BrowserResult<Option<String>>;

    /// Clicks the element; if the click navigates, waits for the new page
    async fn click(&mut self, handle: &ElementHandle) -> BrowserResult<()>;

    /// Scrolls the element to the middle of the viewport
    async fn scroll_into_view(&mut self, handle: &ElementHandle) -> BrowserResult<()>;

    /// Waits up to `timeout` for `selector` to match; `Ok(false)` on timeout
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> BrowserResult<bool>;

    /// Returns the serialized DOM of the current page
    async fn source(&mut self) -> BrowserResult<String>;

    /// Clicks `target` inside the shadow root of `host`
    ///
    /// Returns `Ok(false)` when the host, its shadow root or the target is absent.
    async fn click_in_shadow(&mut self, host: &str, target: &str) -> BrowserResult<bool>;

    /// Ends the session
    async fn close(&mut self) -> BrowserResult<()>;
}
