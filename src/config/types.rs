use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Exhibitor-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    pub output: OutputConfig,
}

/// Target directory configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Directory root, the page carrying the category index
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Number of trailing index entries that are navigation controls, not categories
    #[serde(rename = "trailing-controls", default = "default_trailing_controls")]
    pub trailing_controls: usize,

    /// Regular expressions; index entries whose label matches are skipped
    #[serde(rename = "control-labels", default)]
    pub control_labels: Vec<String>,
}

fn default_trailing_controls() -> usize {
    27
}

/// CSS selectors describing the target site's markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectorConfig {
    pub category_index: String,
    pub category_link: String,
    pub listing_container: String,
    pub listing: String,
    pub listing_link: String,
    pub load_more: String,
    pub name: String,
    pub contact_container: String,
    pub contact_line: String,
    pub address: String,
    pub consent_host: String,
    pub consent_accept: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            category_index: ".pagination li".to_string(),
            category_link: "a".to_string(),
            listing_container: ".content_hits".to_string(),
            listing: ".content_hits .content_company".to_string(),
            listing_link: "a".to_string(),
            load_more: ".lazymore".to_string(),
            name: ".info h1".to_string(),
            contact_container: ".exhibitordetails-contactinfo-list".to_string(),
            contact_line: ".exhibitordetails-contactinfo-list li".to_string(),
            address: ".exhibitordetails-locationinfo".to_string(),
            consent_host: "#usercentrics-cmp-ui".to_string(),
            consent_accept: ".accept".to_string(),
        }
    }
}

impl SelectorConfig {
    /// All selectors with their config key, for validation and display
    pub fn entries(&self) -> [(&'static str, &str); 12] {
        [
            ("category-index", self.category_index.as_str()),
            ("category-link", self.category_link.as_str()),
            ("listing-container", self.listing_container.as_str()),
            ("listing", self.listing.as_str()),
            ("listing-link", self.listing_link.as_str()),
            ("load-more", self.load_more.as_str()),
            ("name", self.name.as_str()),
            ("contact-container", self.contact_container.as_str()),
            ("contact-line", self.contact_line.as_str()),
            ("address", self.address.as_str()),
            ("consent-host", self.consent_host.as_str()),
            ("consent-accept", self.consent_accept.as_str()),
        ]
    }
}

/// Delays and timeouts, all in milliseconds unless noted
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TimingConfig {
    /// Pause after scrolling a listing into view, before clicking it
    pub settle_delay: u64,

    /// Pause after navigating back to the category page
    pub return_delay: u64,

    /// Pause after scrolling "load more" into view, before clicking it
    pub load_more_settle: u64,

    /// Upper bound on the wait for listings revealed by "load more"
    pub load_delay: u64,

    /// Cap for exponentially backed-off waits
    pub max_backoff: u64,

    /// Polling interval for condition-based waits
    pub poll_interval: u64,

    /// Bounded wait for page elements (listing container, contact info)
    pub element_timeout: u64,

    /// Bounded wait for the consent dialog
    pub consent_timeout: u64,

    /// Overall crawl budget in seconds, 0 for unbounded
    pub max_duration_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle_delay: 1000,
            return_delay: 2000,
            load_more_settle: 2000,
            load_delay: 7000,
            max_backoff: 30_000,
            poll_interval: 250,
            element_timeout: 5000,
            consent_timeout: 5000,
            max_duration_secs: 0,
        }
    }
}

impl TimingConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_delay)
    }

    pub fn after_return(&self) -> Duration {
        Duration::from_millis(self.return_delay)
    }

    pub fn load_more_pause(&self) -> Duration {
        Duration::from_millis(self.load_more_settle)
    }

    pub fn load(&self) -> Duration {
        Duration::from_millis(self.load_delay)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.max_backoff)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    pub fn element(&self) -> Duration {
        Duration::from_millis(self.element_timeout)
    }

    pub fn consent(&self) -> Duration {
        Duration::from_millis(self.consent_timeout)
    }

    /// Overall crawl budget, `None` when unbounded
    pub fn max_duration(&self) -> Option<Duration> {
        (self.max_duration_secs > 0).then(|| Duration::from_secs(self.max_duration_secs))
    }
}

/// What the crawl does when a category cannot be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop the crawl; records collected so far are still exported
    #[default]
    Abort,

    /// Log the failure, return to the directory root and continue with the next category
    SkipCategory,
}

/// Retry limits and failure policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Consecutive "load more" attempts without new listings before giving up
    pub max_expansion_attempts: u32,

    /// Extra attempts for a failed navigation
    pub navigation_retries: u32,

    pub on_failure: FailurePolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_expansion_attempts: 5,
            navigation_retries: 2,
            on_failure: FailurePolicy::Abort,
        }
    }
}

/// WebDriver connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,

    /// Probe the WebDriver status endpoint before opening a session
    pub check_status: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            headless: false,
            check_status: true,
        }
    }
}

/// Table format of the export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Excel workbook with a single "Companies" sheet
    Xlsx,
    Csv,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the exported table
    pub path: String,

    /// Explicit table format; taken from the path's extension when unset
    #[serde(default)]
    pub format: Option<OutputFormat>,

    /// Path to the SQLite record journal
    #[serde(rename = "journal-path")]
    pub journal_path: String,
}

impl OutputConfig {
    /// Format the export is written in
    ///
    /// A `.csv` path selects CSV, anything else a workbook.
    pub fn format(&self) -> OutputFormat {
        if let Some(format) = self.format {
            return format;
        }
        let is_csv = std::path::Path::new(&self.path)
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv {
            OutputFormat::Csv
        } else {
            OutputFormat::Xlsx
        }
    }
}
