//! Scripted in-memory page session for exercising the crawl logic without Chrome.

use crate::scrapers::traits::{ElementMark, Locator, PageSession};
use anyhow::{anyhow, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Navigate(String),
    WaitFor(String),
    Click(String),
    Fill(String, String),
    Select(String, String),
    ClickAndMark(String),
    WaitStale(String),
    Screenshot(PathBuf),
}

#[derive(Debug, Clone)]
struct Record {
    call: Call,
    ok: bool,
}

/// Pages are served in order; clicking a marked "next" control advances to the
/// following page and fails once the last page is showing.
#[derive(Default)]
pub struct ScriptedSession {
    records: RefCell<Vec<Record>>,
    failures: RefCell<HashMap<String, u32>>,
    pages: Vec<String>,
    current: Cell<usize>,
    failed_navigations: Cell<u32>,
    never_stale: bool,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages<I, S>(mut self, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pages = pages.into_iter().map(Into::into).collect();
        self
    }

    /// Every lookup of `selector` fails
    pub fn missing(self, selector: &str) -> Self {
        self.failing(selector, u32::MAX)
    }

    /// The first `times` lookups of `selector` fail
    pub fn failing(self, selector: &str, times: u32) -> Self {
        self.failures.borrow_mut().insert(selector.to_string(), times);
        self
    }

    pub fn failing_navigation(self, times: u32) -> Self {
        self.failed_navigations.set(times);
        self
    }

    pub fn never_stale(mut self) -> Self {
        self.never_stale = true;
        self
    }

    /// All calls, including those that failed
    pub fn calls(&self) -> Vec<Call> {
        self.records.borrow().iter().map(|r| r.call.clone()).collect()
    }

    /// Calls that succeeded
    pub fn performed(&self) -> Vec<Call> {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.ok)
            .map(|r| r.call.clone())
            .collect()
    }

    /// Whether any call of any kind targeted `selector`
    pub fn touched(&self, selector: &str) -> bool {
        self.calls().iter().any(|call| match call {
            Call::WaitFor(s)
            | Call::Click(s)
            | Call::Fill(s, _)
            | Call::Select(s, _)
            | Call::ClickAndMark(s)
            | Call::WaitStale(s) => s == selector,
            Call::Navigate(_) | Call::Screenshot(_) => false,
        })
    }

    pub fn screenshots(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Screenshot(_)))
            .count()
    }

    fn record(&self, call: Call, ok: bool) {
        self.records.borrow_mut().push(Record { call, ok });
    }

    fn lookup(&self, locator: &Locator) -> Result<()> {
        let mut failures = self.failures.borrow_mut();
        match failures.get_mut(locator.as_str()) {
            Some(remaining) if *remaining > 0 => {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                Err(anyhow!("timed out waiting for {}", locator))
            }
            _ => Ok(()),
        }
    }

    fn interact(&self, locator: &Locator, call: Call) -> Result<()> {
        let result = self.lookup(locator);
        self.record(call, result.is_ok());
        result
    }
}

impl PageSession for ScriptedSession {
    fn navigate(&self, url: &str) -> Result<()> {
        let remaining = self.failed_navigations.get();
        let ok = remaining == 0;
        if !ok {
            self.failed_navigations.set(remaining - 1);
        }
        self.record(Call::Navigate(url.to_string()), ok);
        if ok {
            Ok(())
        } else {
            Err(anyhow!("navigation to {} failed", url))
        }
    }

    fn wait_for(&self, locator: &Locator, _timeout: Duration) -> Result<()> {
        self.interact(locator, Call::WaitFor(locator.as_str().to_string()))
    }

    fn click(&self, locator: &Locator, _timeout: Duration) -> Result<()> {
        self.interact(locator, Call::Click(locator.as_str().to_string()))
    }

    fn fill(&self, locator: &Locator, text: &str, _timeout: Duration) -> Result<()> {
        self.interact(
            locator,
            Call::Fill(locator.as_str().to_string(), text.to_string()),
        )
    }

    fn select(&self, locator: &Locator, value: &str, _timeout: Duration) -> Result<()> {
        self.interact(
            locator,
            Call::Select(locator.as_str().to_string(), value.to_string()),
        )
    }

    fn click_and_mark(&self, locator: &Locator, _timeout: Duration) -> Result<ElementMark> {
        let call = Call::ClickAndMark(locator.as_str().to_string());
        if let Err(e) = self.lookup(locator) {
            self.record(call, false);
            return Err(e);
        }

        let next = self.current.get() + 1;
        if next >= self.pages.len() {
            self.record(call, false);
            return Err(anyhow!("no element matches {}", locator));
        }
        self.current.set(next);
        self.record(call, true);
        Ok(ElementMark(locator.as_str().to_string()))
    }

    fn wait_until_stale(&self, mark: &ElementMark, _timeout: Duration) -> Result<()> {
        let ok = !self.never_stale;
        self.record(Call::WaitStale(mark.0.clone()), ok);
        if ok {
            Ok(())
        } else {
            Err(anyhow!("element {} never went stale", mark.0))
        }
    }

    fn html(&self) -> Result<String> {
        Ok(self
            .pages
            .get(self.current.get())
            .cloned()
            .unwrap_or_default())
    }

    fn screenshot(&self, path: &Path) -> Result<()> {
        self.record(Call::Screenshot(path.to_path_buf()), true);
        Ok(())
    }
}
