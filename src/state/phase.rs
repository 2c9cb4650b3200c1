//! Crawl phase definitions
//!
//! The crawl is a two-level state machine: an outer loop over category index
//! entries and an inner expand → visit → return cycle over the listings of the
//! current category.

use std::fmt;

/// Where the crawl controller currently is
///
/// Every phase except `Finished` carries the category index it belongs to;
/// `VisitingDetail` also carries the listing position within that category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Resolving and opening the category at `index`
    EnteringCategory { index: usize },

    /// Asking the listing expander for the next unvisited listing
    RequestingNext { index: usize },

    /// On a listing's detail page, extracting its record
    VisitingDetail { index: usize, listing: usize },

    /// Back on the category page after a detail visit
    Returned { index: usize },

    /// All listings of the category have been visited (or the category was skipped)
    CategoryDone { index: usize },

    /// The effective category bound was reached
    Finished,
}

impl CrawlPhase {
    /// The initial phase of every crawl
    pub fn start() -> Self {
        Self::EnteringCategory { index: 0 }
    }

    /// The category index this phase belongs to, `None` once finished
    pub fn category(&self) -> Option<usize> {
        match self {
            Self::EnteringCategory { index }
            | Self::RequestingNext { index }
            | Self::VisitingDetail { index, .. }
            | Self::Returned { index }
            | Self::CategoryDone { index } => Some(*index),
            Self::Finished => None,
        }
    }

    /// Returns true while listings of a category are being drained
    pub fn is_draining(&self) -> bool {
        matches!(
            self,
            Self::RequestingNext { .. } | Self::VisitingDetail { .. } | Self::Returned { .. }
        )
    }

    /// Returns true for the terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Short name of the phase without its position
    pub fn name(&self) -> &'static str {
        match self {
            Self::EnteringCategory { .. } => "entering_category",
            Self::RequestingNext { .. } => "requesting_next",
            Self::VisitingDetail { .. } => "visiting_detail",
            Self::Returned { .. } => "returned",
            Self::CategoryDone { .. } => "category_done",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VisitingDetail { index, listing } => {
                write!(f, "{}({}, {})", self.name(), index, listing)
            }
            Self::Finished => write!(f, "{}", self.name()),
            _ => match self.category() {
                Some(index) => write!(f, "{}({})", self.name(), index),
                None => write!(f, "{}", self.name()),
            },
        }
    }
}
