//! Contact record extraction from detail pages
//!
//! This module turns the HTML snapshot of an exhibitor detail page into a
//! [`CompanyRecord`]. Extraction is pure and infallible: whatever the page does
//! not provide ends up as an empty field.

use crate::config::SelectorConfig;
use crate::record::CompanyRecord;
use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Contact fields that are recognized by their label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Phone,
    Fax,
    Email,
    Website,
}

impl ContactField {
    /// Check order; when a line matches several labels the earliest wins
    pub const ORDER: [ContactField; 4] = [Self::Phone, Self::Fax, Self::Email, Self::Website];

    fn label(&self) -> &'static str {
        match self {
            Self::Phone => "(?:tele)?phone",
            Self::Fax => "fax",
            Self::Email => "e-?mail",
            Self::Website => "website",
        }
    }

    fn slot<'a>(&self, record: &'a mut CompanyRecord) -> &'a mut String {
        match self {
            Self::Phone => &mut record.phone,
            Self::Fax => &mut record.fax,
            Self::Email => &mut record.email,
            Self::Website => &mut record.website,
        }
    }
}

struct LabelRule {
    field: ContactField,
    prefix: Regex,
}

/// Extracts company records from detail page HTML
pub struct FieldExtractor {
    name: Selector,
    contact_line: Selector,
    address: Selector,
    rules: Vec<LabelRule>,
    address_label: Regex,
}

impl FieldExtractor {
    /// Builds an extractor from the configured selectors
    ///
    /// # Returns
    ///
    /// * `Ok(FieldExtractor)` - All selectors parsed
    /// * `Err(ConfigError::InvalidPattern)` - A selector is not valid CSS
    pub fn new(selectors: &SelectorConfig) -> Result<Self, ConfigError> {
        let rules = ContactField::ORDER
            .iter()
            .map(|field| {
                let label = field.label();
                Ok(LabelRule {
                    field: *field,
                    // Label word at the start of the line, anything glued to it
                    // ("Phone/Fax"), optional colon
                    prefix: build_regex(&format!(r"(?i)^[^\w]*{}[^\s:]*\s*:?\s*", label))?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            name: parse_selector("name", &selectors.name)?,
            contact_line: parse_selector("contact-line", &selectors.contact_line)?,
            address: parse_selector("address", &selectors.address)?,
            rules,
            address_label: build_regex(r"(?i)^address\s*:?\s*,?\s*")?,
        })
    }

    /// Extracts a record from a detail page
    ///
    /// # Field Rules
    ///
    /// - `name`: text of the first name heading
    /// - `phone`/`fax`/`email`/`website`: contact lines, assigned by label
    /// - `address`: text nodes of the location block joined with `", "`,
    ///   without a leading "Address" label
    ///
    /// # Example
    ///
    /// ```
    /// use exhibitor_harvest::config::SelectorConfig;
    /// use exhibitor_harvest::crawler::FieldExtractor;
    ///
    /// let extractor = FieldExtractor::new(&SelectorConfig::default()).unwrap();
    /// let record = extractor.extract(r#"<div class="info"><h1> Acme GmbH </h1></div>"#);
    /// assert_eq!(record.name, "Acme GmbH");
    /// assert_eq!(record.phone, "");
    /// ```
    pub fn extract(&self, html: &str) -> CompanyRecord {
        let document = Html::parse_document(html);
        let mut record = CompanyRecord::default();

        if let Some(heading) = document.select(&self.name).next() {
            record.name = element_text(heading);
        }

        for item in document.select(&self.contact_line) {
            if let Some((field, value)) = self.classify_line(&element_text(item)) {
                *field.slot(&mut record) = value;
            }
        }

        if let Some(block) = document.select(&self.address).next() {
            record.address = self.address_text(block);
        }

        record
    }

    /// Assigns a contact line to the first field whose label starts the line
    ///
    /// Only the leading label counts, so a value that happens to contain a
    /// label word (`E-Mail: fax@acme.de`) stays with its own field. Returns the
    /// field and the line with its label prefix removed, or `None` when the
    /// line does not start with a label.
    pub fn classify_line(&self, line: &str) -> Option<(ContactField, String)> {
        let line = line.trim();
        self.rules.iter().find_map(|rule| {
            let label = rule.prefix.find(line)?;
            Some((rule.field, line[label.end()..].trim().to_string()))
        })
    }

    fn address_text(&self, block: ElementRef<'_>) -> String {
        let joined = block
            .text()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        self.address_label.replace(&joined, "").trim().to_string()
    }
}

/// Text content of an element with runs of whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_selector(key: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| {
        ConfigError::InvalidPattern(format!(
            "Selector '{}' ({}) is not valid CSS: {:?}",
            key, selector, e
        ))
    })
}

fn build_regex(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern(e.to_string()))
}
