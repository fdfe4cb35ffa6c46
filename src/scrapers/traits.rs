use anyhow::Result;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// How to find an element on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(query: impl Into<String>) -> Self {
        Locator::XPath(query.into())
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        match self {
            Locator::Css(s) | Locator::XPath(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css `{}`", s),
            Locator::XPath(s) => write!(f, "xpath `{}`", s),
        }
    }
}

/// Handle to an element that was clicked, used to detect it going stale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMark(pub String);

/// One exclusively owned browser page.
///
/// Every wait is bounded by the timeout passed in; an element that does not
/// show up in time is an `Err`, which callers treat as a recoverable failure
/// of their current step.
pub trait PageSession {
    /// Navigate and wait for the navigation to settle
    fn navigate(&self, url: &str) -> Result<()>;

    /// Wait for an element to be present
    fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    fn click(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    /// Clear a text input and type into it
    fn fill(&self, locator: &Locator, text: &str, timeout: Duration) -> Result<()>;

    /// Pick an option of a `<select>` by value
    fn select(&self, locator: &Locator, value: &str, timeout: Duration) -> Result<()>;

    /// Click an element and remember it so its detachment can be awaited
    fn click_and_mark(&self, locator: &Locator, timeout: Duration) -> Result<ElementMark>;

    /// Wait until a marked element is no longer attached to the document
    fn wait_until_stale(&self, mark: &ElementMark, timeout: Duration) -> Result<()>;

    /// Current rendered document
    fn html(&self) -> Result<String>;

    fn screenshot(&self, path: &Path) -> Result<()>;
}
