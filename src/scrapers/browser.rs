use crate::config::BrowserSettings;
use crate::scrapers::traits::{ElementMark, Locator, PageSession};
use anyhow::{anyhow, Context, Result};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::util::Wait;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde_json::json;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const HIDE_WEBDRIVER: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Browser page driven through headless Chrome. Dropping the session closes Chrome.
pub struct ChromeSession {
    // Kept alive for the tab; the Chrome process ends when this drops.
    _browser: Browser,
    tab: Arc<Tab>,
    next_mark: AtomicU64,
}

impl ChromeSession {
    /// Launch Chrome and open the working tab
    pub fn launch(settings: &BrowserSettings, navigation_timeout: Duration) -> Result<Self> {
        info!(
            "Launching {} Chrome...",
            if settings.headless { "headless" } else { "visible" }
        );

        let user_agent = format!("--user-agent={}", settings.user_agent);
        let args: Vec<&OsStr> = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new(&user_agent),
        ];

        let options = LaunchOptions::default_builder()
            .headless(settings.headless)
            .window_size(Some(settings.window_size))
            .idle_browser_timeout(navigation_timeout + Duration::from_secs(60))
            .args(args)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_default_timeout(navigation_timeout);

        tab.call_method(Page::AddScriptToEvaluateOnNewDocument {
            source: HIDE_WEBDRIVER.to_string(),
            world_name: None,
            include_command_line_api: None,
            run_immediately: None,
        })
        .context("Failed to install navigator patch")?;

        Ok(Self {
            _browser: browser,
            tab,
            next_mark: AtomicU64::new(1),
        })
    }

    fn find(&self, locator: &Locator, timeout: Duration) -> Result<Element<'_>> {
        let found = match locator {
            Locator::Css(selector) => {
                self.tab.wait_for_element_with_custom_timeout(selector, timeout)
            }
            Locator::XPath(query) => self.tab.wait_for_xpath_with_custom_timeout(query, timeout),
        };
        found.with_context(|| format!("Timed out after {:?} waiting for {}", timeout, locator))
    }

    fn evaluate_bool(&self, expression: &str) -> Result<bool> {
        let result = self.tab.evaluate(expression, false)?;
        Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }
}

impl PageSession for ChromeSession {
    fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Failed to navigate to {}", url))?;
        self.tab
            .wait_until_navigated()
            .context("Navigation did not finish")?;
        Ok(())
    }

    fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        self.find(locator, timeout).map(|_| ())
    }

    fn click(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        self.find(locator, timeout)?
            .click()
            .with_context(|| format!("Failed to click {}", locator))?;
        Ok(())
    }

    fn fill(&self, locator: &Locator, text: &str, timeout: Duration) -> Result<()> {
        let element = self.find(locator, timeout)?;
        element
            .call_js_fn("function() { this.value = ''; }", vec![], false)
            .with_context(|| format!("Failed to clear {}", locator))?;
        element.click()?;
        element
            .type_into(text)
            .with_context(|| format!("Failed to type into {}", locator))?;
        Ok(())
    }

    fn select(&self, locator: &Locator, value: &str, timeout: Duration) -> Result<()> {
        let element = self.find(locator, timeout)?;
        let result = element
            .call_js_fn(
                r#"function(value) {
                    const option = Array.from(this.options).find(o => o.value === value);
                    if (!option) { return false; }
                    this.value = value;
                    this.dispatchEvent(new Event('input', { bubbles: true }));
                    this.dispatchEvent(new Event('change', { bubbles: true }));
                    return true;
                }"#,
                vec![json!(value)],
                false,
            )
            .with_context(|| format!("Failed to select '{}' in {}", value, locator))?;

        if result.value.and_then(|v| v.as_bool()) == Some(true) {
            Ok(())
        } else {
            Err(anyhow!("{} has no option with value '{}'", locator, value))
        }
    }

    fn click_and_mark(&self, locator: &Locator, timeout: Duration) -> Result<ElementMark> {
        let element = self.find(locator, timeout)?;
        let id = format!("m{}", self.next_mark.fetch_add(1, Ordering::Relaxed));

        element
            .call_js_fn(
                "function(id) { window.__leadMarks = window.__leadMarks || {}; window.__leadMarks[id] = this; }",
                vec![json!(id)],
                false,
            )
            .context("Failed to mark element")?;
        element
            .click()
            .with_context(|| format!("Failed to click {}", locator))?;

        Ok(ElementMark(id))
    }

    fn wait_until_stale(&self, mark: &ElementMark, timeout: Duration) -> Result<()> {
        // A full navigation drops the marks table, which also counts as stale.
        let expression = format!(
            "(() => {{ const m = window.__leadMarks; return !m || !m['{0}'] || !m['{0}'].isConnected; }})()",
            mark.0
        );

        Wait::new(timeout, POLL_INTERVAL)
            .until(|| match self.evaluate_bool(&expression) {
                Ok(true) => Some(()),
                _ => None,
            })
            .map_err(|_| anyhow!("Element {} still attached after {:?}", mark.0, timeout))
    }

    fn html(&self) -> Result<String> {
        self.tab.get_content().context("Failed to read page HTML")
    }

    fn screenshot(&self, path: &Path) -> Result<()> {
        let png = self
            .tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
            .context("Failed to capture screenshot")?;
        std::fs::write(path, png)
            .with_context(|| format!("Failed to write screenshot {}", path.display()))?;
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        info!("Closing browser");
    }
}
