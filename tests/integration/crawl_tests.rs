//! Integration tests for the crawler
//!
//! These tests drive the full crawl cycle against an in-memory directory
//! whose pages are real HTML, queried with CSS selectors the same way a
//! browser would answer them. wiremock stands in for the WebDriver server.

use async_trait::async_trait;
use exhibitor_harvest::browser::{Browser, BrowserError, BrowserResult, ElementHandle};
use exhibitor_harvest::config::{load_config_with_hash, Config};
use exhibitor_harvest::crawler::{crawl, export_journal, Coordinator};
use exhibitor_harvest::output::{export_records, CrawlOutcome, SHEET_NAME};
use exhibitor_harvest::storage::{open_journal, Journal, RunStatus};
use exhibitor_harvest::HarvestError;
use scraper::{Html, Selector};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Company {
    name: &'static str,
    lines: Vec<&'static str>,
    address: Option<&'static str>,
}

struct Category {
    label: &'static str,
    companies: Vec<Company>,
    /// Listings shown initially and per "load more" click
    batch: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Blank,
    Root,
    Category(usize),
    Detail(usize, usize),
}

/// An exhibitor directory rendered as HTML
struct HtmlSite {
    categories: Vec<Category>,
    /// Trailing pagination entries after the categories
    controls: usize,
    broken_category: Option<usize>,
    page: Page,
    history: Vec<Page>,
    revealed: usize,
}

impl HtmlSite {
    fn new(categories: Vec<Category>, controls: usize) -> Self {
        Self {
            categories,
            controls,
            broken_category: None,
            page: Page::Blank,
            history: Vec::new(),
            revealed: 0,
        }
    }

    fn pagination(&self) -> String {
        let mut items: String = self
            .categories
            .iter()
            .map(|c| format!(r##"<li><a href="#">{}</a></li>"##, c.label))
            .collect();
        for i in 0..self.controls {
            items.push_str(&format!(r##"<li><a href="#">{}</a></li>"##, i + 1));
        }
        format!(r#"<ul class="pagination">{}</ul>"#, items)
    }

    fn html(&self) -> String {
        match self.page {
            Page::Blank => "<html><body></body></html>".to_string(),
            Page::Root => format!("<html><body>{}</body></html>", self.pagination()),
            Page::Category(c) => {
                let category = &self.categories[c];
                let visible = self.revealed.min(category.companies.len());
                let hits: String = category.companies[..visible]
                    .iter()
                    .map(|co| {
                        format!(
                            r##"<div class="content_company"><a href="#">{}</a></div>"##,
                            co.name
                        )
                    })
                    .collect();
                let load_more = if visible < category.companies.len() {
                    r#"<div class="lazymore">Load more</div>"#
                } else {
                    ""
                };
                format!(
                    r#"<html><body>{}<div class="content_hits">{}</div>{}</body></html>"#,
                    self.pagination(),
                    hits,
                    load_more
                )
            }
            Page::Detail(c, j) => {
                let company = &self.categories[c].companies[j];
                let lines: String = company
                    .lines
                    .iter()
                    .map(|line| format!("<li>\n  {}\n</li>", line))
                    .collect();
                let contact = if company.lines.is_empty() {
                    String::new()
                } else {
                    format!(
                        r#"<ul class="exhibitordetails-contactinfo-list">{}</ul>"#,
                        lines
                    )
                };
                let address = company
                    .address
                    .map(|a| format!(r#"<div class="exhibitordetails-locationinfo">{}</div>"#, a))
                    .unwrap_or_default();
                format!(
                    r#"<html><body><div class="info"><h1>
                    {}
                    </h1></div>{}{}</body></html>"#,
                    company.name, contact, address
                )
            }
        }
    }

    fn select_count(&self, selector: &str) -> BrowserResult<usize> {
        let selector = parse(selector)?;
        Ok(Html::parse_document(&self.html()).select(&selector).count())
    }

    fn resolve_text(&self, handle: &ElementHandle) -> BrowserResult<Option<String>> {
        let document = Html::parse_document(&self.html());
        let Some(element) = document.select(&parse(&handle.selector)?).nth(handle.index) else {
            return Ok(None);
        };
        let element = match &handle.child {
            Some(child) => match element.select(&parse(child)?).next() {
                Some(element) => element,
                None => return Ok(None),
            },
            None => element,
        };
        Ok(Some(element.text().collect::<String>().trim().to_string()))
    }
}

fn parse(selector: &str) -> BrowserResult<Selector> {
    Selector::parse(selector).map_err(|e| BrowserError::Command {
        command: "find",
        message: format!("{:?}", e),
    })
}

#[async_trait]
impl Browser for HtmlSite {
    async fn goto(&mut self, _url: &str) -> BrowserResult<()> {
        if self.page != Page::Blank {
            self.history.push(self.page);
        }
        self.page = Page::Root;
        Ok(())
    }

    async fn back(&mut self) -> BrowserResult<()> {
        self.page = self.history.pop().ok_or(BrowserError::Command {
            command: "back",
            message: "no history".to_string(),
        })?;
        Ok(())
    }

    async fn count(&mut self, selector: &str) -> BrowserResult<usize> {
        self.select_count(selector)
    }

    async fn text_of(&mut self, handle: &ElementHandle) -> BrowserResult<Option<String>> {
        self.resolve_text(handle)
    }

    async fn click(&mut self, handle: &ElementHandle) -> BrowserResult<()> {
        if self.resolve_text(handle)?.is_none() {
            return Err(BrowserError::NotFound(handle.clone()));
        }

        match handle.selector.as_str() {
            ".pagination li" => {
                if self.broken_category == Some(handle.index) {
                    return Err(BrowserError::Command {
                        command: "click",
                        message: "timeout waiting for navigation".to_string(),
                    });
                }
                self.history.push(self.page);
                self.page = Page::Category(handle.index);
                self.revealed = self.categories[handle.index].batch;
            }
            ".content_hits .content_company" => {
                let Page::Category(c) = self.page else {
                    return Err(BrowserError::NotFound(handle.clone()));
                };
                self.history.push(self.page);
                self.page = Page::Detail(c, handle.index);
            }
            ".lazymore" => {
                if let Page::Category(c) = self.page {
                    self.revealed += self.categories[c].batch;
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn scroll_into_view(&mut self, handle: &ElementHandle) -> BrowserResult<()> {
        match self.resolve_text(handle)? {
            Some(_) => Ok(()),
            None => Err(BrowserError::NotFound(handle.clone())),
        }
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> BrowserResult<bool> {
        Ok(self.select_count(selector)? > 0)
    }

    async fn source(&mut self) -> BrowserResult<String> {
        Ok(self.html())
    }

    async fn click_in_shadow(&mut self, _host: &str, _target: &str) -> BrowserResult<bool> {
        Ok(false)
    }

    async fn close(&mut self) -> BrowserResult<()> {
        Ok(())
    }
}

fn directory() -> Vec<Category> {
    vec![
        Category {
            label: "Logistics",
            companies: vec![
                Company {
                    name: "Acme GmbH",
                    lines: vec!["Phone: +49 1 2 3", "Website: acme.de"],
                    address: None,
                },
                Company {
                    name: "Beta AG",
                    lines: vec![
                        "Phone/Fax: +49 89 1234",
                        "E-Mail: info@beta.example",
                    ],
                    address: Some("<p>Address</p><p>Hauptstraße 1</p><p>80331 München</p>"),
                },
                Company {
                    name: "Gamma Ltd",
                    lines: vec![],
                    address: None,
                },
            ],
            batch: 2,
        },
        Category {
            label: "Telematics",
            companies: vec![Company {
                name: "Delta BV",
                lines: vec!["Fax: +31 20 555", "Website: https://delta.example"],
                address: Some("Address: Kade 5, Rotterdam"),
            }],
            batch: 5,
        },
    ]
}

/// Writes a config file into `dir` and loads it the way the CLI does
fn write_config(dir: &Path, webdriver_url: &str, on_failure: &str) -> (Config, String) {
    let config_path = dir.join("harvest.toml");
    let content = format!(
        r#"
[site]
start-url = "https://directory.example/en/exhibitors"
trailing-controls = 4

[timing]
settle-delay = 0
return-delay = 0
load-more-settle = 0
load-delay = 20
max-backoff = 40
poll-interval = 10
element-timeout = 100
consent-timeout = 0

[retry]
navigation-retries = 1
on-failure = "{on_failure}"

[browser]
webdriver-url = "{webdriver_url}"

[output]
path = "{csv}"
journal-path = "{journal}"
"#,
        csv = dir.join("companies.csv").display(),
        journal = dir.join("journal.db").display(),
    );
    std::fs::write(&config_path, content).expect("Failed to write config");
    load_config_with_hash(&config_path).expect("Failed to load config")
}

/// Runs a crawl against `site` and exports it like `crawl()` does
async fn run(config: Config, hash: &str, site: HtmlSite) -> exhibitor_harvest::output::CrawlReport {
    let mut journal = open_journal(Path::new(&config.output.journal_path)).unwrap();
    let run_id = journal.create_run(hash).unwrap();
    let output_path = config.output.path.clone();
    let output_format = config.output.format();

    let mut coordinator = Coordinator::new(config, site, CancellationToken::new())
        .expect("Failed to create coordinator")
        .with_journal(Box::new(journal), run_id);
    let report = coordinator.run().await;

    export_records(output_format, Path::new(&output_path), &report.records)
        .expect("Failed to write output");
    report
}

#[tokio::test]
async fn test_full_crawl_exports_csv() {
    let dir = tempfile::tempdir().unwrap();
    let (config, hash) = write_config(dir.path(), "http://localhost:4444", "abort");

    let report = run(config.clone(), &hash, HtmlSite::new(directory(), 4)).await;

    assert!(report.is_complete());
    assert_eq!(report.categories_total, 2);
    assert_eq!(report.entered, vec![0, 1]);

    let csv = std::fs::read_to_string(&config.output.path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "name,phone,fax,email,website,address",
            "Acme GmbH,+49 1 2 3,,,acme.de,",
            "Beta AG,+49 89 1234,,info@beta.example,,\"Hauptstraße 1, 80331 München\"",
            "Gamma Ltd,,,,,",
            "Delta BV,,+31 20 555,,https://delta.example,\"Kade 5, Rotterdam\"",
        ]
    );
}

#[tokio::test]
async fn test_full_crawl_exports_workbook() {
    use calamine::{open_workbook, Reader, Xlsx};

    let dir = tempfile::tempdir().unwrap();
    let (mut config, hash) = write_config(dir.path(), "http://localhost:4444", "abort");
    config.output.path = dir.path().join("companies.xlsx").display().to_string();

    let mut categories = directory();
    categories[1].companies.push(Company {
        name: "Faxline GmbH",
        lines: vec!["E-Mail: fax@faxline.example", "Website: www.iphone-logistik.de"],
        address: None,
    });

    let report = run(config.clone(), &hash, HtmlSite::new(categories, 4)).await;
    assert!(report.is_complete());

    let mut workbook: Xlsx<_> = open_workbook(&config.output.path).unwrap();
    assert_eq!(workbook.sheet_names().to_vec(), vec![SHEET_NAME.to_string()]);
    let range = workbook.worksheet_range(SHEET_NAME).unwrap();
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    assert_eq!(rows.len(), 1 + 5);
    assert_eq!(rows[0], vec!["name", "phone", "fax", "email", "website", "address"]);
    assert_eq!(rows[1], vec!["Acme GmbH", "+49 1 2 3", "", "", "acme.de", ""]);
    assert_eq!(
        rows[5],
        vec!["Faxline GmbH", "", "", "fax@faxline.example", "www.iphone-logistik.de", ""]
    );
}

#[tokio::test]
async fn test_journal_matches_export() {
    let dir = tempfile::tempdir().unwrap();
    let (config, hash) = write_config(dir.path(), "http://localhost:4444", "abort");

    let report = run(config.clone(), &hash, HtmlSite::new(directory(), 4)).await;

    let journal = open_journal(Path::new(&config.output.journal_path)).unwrap();
    let latest = journal.latest_run().unwrap().expect("run should exist");
    assert_eq!(latest.status, RunStatus::Completed);
    assert_eq!(latest.config_hash, hash);
    assert_eq!(journal.load_records(latest.id).unwrap(), report.records);

    // Re-exporting from the journal reproduces the crawl's CSV
    let original = std::fs::read_to_string(&config.output.path).unwrap();
    std::fs::remove_file(&config.output.path).unwrap();
    let written = export_journal(&config).unwrap();
    assert_eq!(written, 4);
    assert_eq!(std::fs::read_to_string(&config.output.path).unwrap(), original);
}

#[tokio::test]
async fn test_aborted_crawl_still_exports() {
    let dir = tempfile::tempdir().unwrap();
    let (config, hash) = write_config(dir.path(), "http://localhost:4444", "abort");
    let mut site = HtmlSite::new(directory(), 4);
    site.broken_category = Some(1);

    let report = run(config.clone(), &hash, site).await;

    assert!(matches!(
        report.outcome,
        CrawlOutcome::Aborted(HarvestError::Navigation { .. })
    ));
    let csv = std::fs::read_to_string(&config.output.path).unwrap();
    assert_eq!(csv.lines().count(), 1 + 3);

    let journal = open_journal(Path::new(&config.output.journal_path)).unwrap();
    let latest = journal.latest_run().unwrap().unwrap();
    assert_eq!(latest.status, RunStatus::Failed);
    assert_eq!(journal.count_records(latest.id).unwrap(), 3);
}

#[tokio::test]
async fn test_skip_category_policy_continues() {
    let dir = tempfile::tempdir().unwrap();
    let (config, hash) = write_config(dir.path(), "http://localhost:4444", "skip-category");
    let mut site = HtmlSite::new(directory(), 4);
    site.broken_category = Some(0);

    let report = run(config, &hash, site).await;

    assert!(report.is_complete());
    assert_eq!(report.skipped, vec![0]);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].name, "Delta BV");
}

#[tokio::test]
async fn test_crawl_refuses_unready_webdriver() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": { "ready": false, "message": "no capacity" }
        })))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (config, hash) = write_config(dir.path(), &mock_server.uri(), "abort");
    let csv_path = config.output.path.clone();

    let result = crawl(config, &hash, CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(HarvestError::Browser(BrowserError::Unavailable(_)))
    ));
    assert!(!Path::new(&csv_path).exists());
}

#[test]
fn test_export_journal_without_runs() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = write_config(dir.path(), "http://localhost:4444", "abort");

    let result = export_journal(&config);

    assert!(result.is_err());
    assert!(!Path::new(&config.output.path).exists());
}
