//! WebDriver-backed browser implementation
//!
//! This module implements [`Browser`] on top of a `fantoccini` client, which
//! talks to any W3C WebDriver server (geckodriver, chromedriver).

use crate::browser::{Browser, BrowserError, BrowserResult, ElementHandle};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Value};
use std::time::Duration;

const SCROLL_INTO_VIEW: &str =
    "arguments[0].scrollIntoView({ behavior: 'smooth', block: 'center' });";

const CLICK_IN_SHADOW: &str = r#"
const host = document.querySelector(arguments[0]);
if (!host || !host.shadowRoot) { return false; }
const target = host.shadowRoot.querySelector(arguments[1]);
if (!target) { return false; }
target.click();
return true;
"#;

/// A single WebDriver session
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    /// Opens a new session on the configured WebDriver server
    ///
    /// # Arguments
    ///
    /// * `config` - Browser configuration (endpoint URL, headless flag)
    ///
    /// # Returns
    ///
    /// * `Ok(WebDriverBrowser)` - Session established
    /// * `Err(BrowserError::Session)` - The server refused or could not be reached
    pub async fn connect(config: &BrowserConfig) -> BrowserResult<Self> {
        let mut capabilities = serde_json::Map::new();
        if config.headless {
            capabilities.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
            capabilities.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new"] }),
            );
        }

        let mut builder = ClientBuilder::native();
        builder.capabilities(capabilities);

        tracing::info!("Connecting to WebDriver at {}", config.webdriver_url);
        let client = builder
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| BrowserError::Session(e.to_string()))?;

        Ok(Self { client })
    }

    /// Resolves a locator against the current page
    ///
    /// Returns `Ok(None)` when fewer than `index + 1` elements match or the
    /// child selector finds nothing.
    async fn resolve(&self, handle: &ElementHandle) -> BrowserResult<Option<Element>> {
        let elements = self
            .client
            .find_all(Locator::Css(&handle.selector))
            .await
            .map_err(command_error("find_all"))?;

        let Some(element) = elements.into_iter().nth(handle.index) else {
            return Ok(None);
        };

        match &handle.child {
            None => Ok(Some(element)),
            Some(child) => match element.find(Locator::Css(child)).await {
                Ok(found) => Ok(Some(found)),
                Err(e) if e.is_no_such_element() => Ok(None),
                Err(e) => Err(command_error("find")(e)),
            },
        }
    }

    async fn resolve_required(&self, handle: &ElementHandle) -> BrowserResult<Element> {
        self.resolve(handle)
            .await?
            .ok_or_else(|| BrowserError::NotFound(handle.clone()))
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn goto(&mut self, url: &str) -> BrowserResult<()> {
        self.client.goto(url).await.map_err(command_error("goto"))
    }

    async fn back(&mut self) -> BrowserResult<()> {
        self.client.back().await.map_err(command_error("back"))
    }

    async fn count(&mut self, selector: &str) -> BrowserResult<usize> {
        let elements = self
            .client
            .find_all(Locator::Css(selector))
            .await
            .map_err(command_error("find_all"))?;
        Ok(elements.len())
    }

    async fn resolves(&mut self, handle: &ElementHandle) -> BrowserResult<bool> {
        Ok(self.resolve(handle).await?.is_some())
    }

    async fn text_of(&mut self, handle: &ElementHandle) -> BrowserResult<Option<String>> {
        match self.resolve(handle).await? {
            Some(element) => {
                let text = element.text().await.map_err(command_error("text"))?;
                Ok(Some(text.trim().to_string()))
            }
            None => Ok(None),
        }
    }

    async fn click(&mut self, handle: &ElementHandle) -> BrowserResult<()> {
        let element = self.resolve_required(handle).await?;
        element.click().await.map_err(command_error("click"))
    }

    async fn scroll_into_view(&mut self, handle: &ElementHandle) -> BrowserResult<()> {
        let element = self.resolve_required(handle).await?;
        let argument = serde_json::to_value(&element).map_err(|e| BrowserError::Command {
            command: "execute",
            message: e.to_string(),
        })?;
        self.client
            .execute(SCROLL_INTO_VIEW, vec![argument])
            .await
            .map_err(command_error("execute"))?;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> BrowserResult<bool> {
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(_) => Ok(true),
            Err(CmdError::WaitTimeout) => Ok(false),
            Err(e) if e.is_no_such_element() => Ok(false),
            Err(e) => Err(command_error("wait")(e)),
        }
    }

    async fn source(&mut self) -> BrowserResult<String> {
        self.client.source().await.map_err(command_error("source"))
    }

    async fn click_in_shadow(&mut self, host: &str, target: &str) -> BrowserResult<bool> {
        let result = self
            .client
            .execute(CLICK_IN_SHADOW, vec![json!(host), json!(target)])
            .await
            .map_err(command_error("execute"))?;
        Ok(result.as_bool().unwrap_or(false))
    }

    async fn close(&mut self) -> BrowserResult<()> {
        self.client
            .clone()
            .close()
            .await
            .map_err(command_error("close"))
    }
}

fn command_error(command: &'static str) -> impl Fn(CmdError) -> BrowserError {
    move |e| BrowserError::Command {
        command,
        message: e.to_string(),
    }
}

/// Probes `<webdriver_url>/status` before a session is requested
///
/// A WebDriver server answers with `{"value": {"ready": bool, "message": ...}}`.
/// A missing `ready` flag is treated as ready, since some drivers omit it.
///
/// # Returns
///
/// * `Ok(())` - The server is up and accepts new sessions
/// * `Err(BrowserError::Unavailable)` - Unreachable, erroring or not ready
pub async fn check_webdriver_status(webdriver_url: &str) -> BrowserResult<()> {
    let status_url = format!("{}/status", webdriver_url.trim_end_matches('/'));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| BrowserError::Unavailable(e.to_string()))?;

    let response = client
        .get(&status_url)
        .send()
        .await
        .map_err(|e| BrowserError::Unavailable(format!("{}: {}", status_url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(BrowserError::Unavailable(format!(
            "{} returned HTTP {}",
            status_url, status
        )));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| BrowserError::Unavailable(format!("{}: {}", status_url, e)))?;

    let ready = body
        .pointer("/value/ready")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    if ready {
        Ok(())
    } else {
        let message = body
            .pointer("/value/message")
            .and_then(Value::as_str)
            .unwrap_or("not ready");
        Err(BrowserError::Unavailable(format!(
            "{}: {}",
            status_url, message
        )))
    }
}
