pub mod browser;
pub mod detail;
pub mod extractor;
pub mod filters;
pub mod loader;
pub mod pacing;
pub mod paginator;
pub mod proxy;
pub mod traits;
pub mod types;
pub mod zillow;

#[cfg(test)]
pub mod testing;

pub use browser::ChromeSession;
pub use proxy::ProxyRoute;
pub use types::{DaysOnSite, SearchQuery};
pub use zillow::SearchCrawler;
