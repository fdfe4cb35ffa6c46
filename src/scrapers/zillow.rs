use crate::config::{Config, Timings};
use crate::models::{ReferenceSet, UiVariant};
use crate::scrapers::detail::{DetailEnricher, DetailParser, DetailSelectors};
use crate::scrapers::extractor::ResultExtractor;
use crate::scrapers::filters::{
    Action, FilterCoordinator, FilterStep, SelectorStrategy, Settle, StepScript,
};
use crate::scrapers::loader::PageLoader;
use crate::scrapers::paginator::Paginator;
use crate::scrapers::proxy::ProxyRoute;
use crate::scrapers::traits::{Locator, PageSession};
use crate::scrapers::types::SearchQuery;
use anyhow::{Context, Result};
use tracing::{info, warn};
use url::Url;

/// Script tag holding the page's JSON state; its presence means results rendered
pub const RESULTS_MARKER: &str = "script#__NEXT_DATA__";
pub const RESULTS_PATH: [&str; 6] = [
    "props",
    "pageProps",
    "searchPageState",
    "cat1",
    "searchResults",
    "listResults",
];
pub const DETAIL_LINK_FIELD: &str = "detailUrl";
pub const NEXT_PAGE: &str = r#"a[rel="next"]"#;

pub const OWNER_MARKER: &str =
    "//div[@class='ds-listing-agent-header' and text()='Listed by property owner']";

pub const DETAIL_SELECTORS: DetailSelectors = DetailSelectors {
    address: r#"div[class^="styles__AddressWrapper-"] h1"#,
    owner_name: "span.ds-listing-agent-display-name",
    phone_number: "li.ds-listing-agent-info-text",
    publication_date: r#"tbody tr:first-child span[data-testid="date-info"]"#,
    price: r#"span[data-testid="price"]"#,
    price_fallback: r#"tbody tr:first-child td[data-testid="price-money-cell"] span[class*="StyledPriceText"]"#,
};

// "More" panel; both layouts share it
fn days_on_site_step() -> StepScript {
    StepScript::new(
        FilterStep::DaysOnSite,
        vec![
            Action::Click(
                Locator::css(r#"button[data-test="more-filters-button"]"#),
                Settle::Control,
            ),
            Action::Select(Locator::css("select#doz"), Settle::Input),
            Action::Click(
                Locator::css(r#"button[data-test="close-filters-button"]"#),
                Settle::Apply,
            ),
        ],
    )
}

/// Selectors of the narrow, mobile-style layout
pub fn compact_filters(timings: &Timings) -> SelectorStrategy {
    SelectorStrategy::new(
        UiVariant::Compact,
        vec![
            StepScript::new(
                FilterStep::Sort,
                vec![
                    Action::Click(
                        Locator::css(r#"button[aria-label="Sort Properties"]"#),
                        Settle::Control,
                    ),
                    Action::Click(Locator::css(r#"button[data-key="days"]"#), Settle::Apply),
                ],
            ),
            StepScript::new(
                FilterStep::MinPrice,
                vec![
                    Action::Click(
                        Locator::xpath("//button[.//span[text()='Price']]"),
                        Settle::Control,
                    ),
                    Action::Fill(Locator::css(r#"input[placeholder="No Min"]"#), Settle::Input),
                    Action::Click(
                        Locator::xpath("//button[contains(text(), 'See') and contains(text(), 'rentals')]"),
                        Settle::Apply,
                    ),
                ],
            ),
            days_on_site_step(),
        ],
        timings.clone(),
    )
}

/// Selectors of the wide desktop layout. Recency goes first; opening the
/// "More" panel before the others is steadier there.
pub fn full_filters(timings: &Timings) -> SelectorStrategy {
    SelectorStrategy::new(
        UiVariant::Full,
        vec![
            days_on_site_step(),
            StepScript::new(
                FilterStep::Sort,
                vec![
                    Action::Click(Locator::css("button#sort-popover"), Settle::Control),
                    Action::Click(Locator::css(r#"button[data-value="days"]"#), Settle::Apply),
                ],
            ),
            StepScript::new(
                FilterStep::MinPrice,
                vec![
                    Action::Click(
                        Locator::css(r#"button[data-test="price-filters-button"]"#),
                        Settle::Control,
                    ),
                    Action::Fill(Locator::css(r#"input[aria-label="Price min"]"#), Settle::Input),
                    Action::Click(
                        Locator::css(r#"button[data-test="close-filters-button"]"#),
                        Settle::Apply,
                    ),
                ],
            ),
        ],
        timings.clone(),
    )
}

/// First pipeline stage: search query to the set of listing links
pub struct SearchCrawler {
    base_url: String,
    loader: PageLoader,
    coordinator: FilterCoordinator,
    paginator: Paginator,
}

impl SearchCrawler {
    pub fn new(config: &Config, proxy: ProxyRoute) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid base URL '{}'", config.base_url))?;
        let extractor =
            ResultExtractor::new(RESULTS_MARKER, &RESULTS_PATH, DETAIL_LINK_FIELD, base)?;

        Ok(Self {
            base_url: config.base_url.clone(),
            loader: PageLoader::new(
                proxy,
                Locator::css(RESULTS_MARKER),
                config.timings.clone(),
                config.diagnostics_dir.clone(),
            ),
            coordinator: FilterCoordinator::new(vec![
                Box::new(compact_filters(&config.timings)),
                Box::new(full_filters(&config.timings)),
            ]),
            paginator: Paginator::new(
                extractor,
                Locator::css(RESULTS_MARKER),
                Locator::css(NEXT_PAGE),
                config.timings.clone(),
                config.diagnostics_dir.clone(),
            ),
        })
    }

    /// Load the search page, apply filters, walk the pages. Any stage that
    /// fails ends the crawl with whatever was collected (possibly nothing).
    pub fn crawl(&self, session: &dyn PageSession, query: &SearchQuery) -> ReferenceSet {
        info!(
            "Searching '{}' ({}), up to {} page(s)",
            query.location,
            query.category,
            query.page_limit()
        );

        let Some(url) = query.search_url(&self.base_url) else {
            warn!("Location '{}' is empty, nothing to search", query.location);
            return ReferenceSet::new();
        };

        if !self.loader.load(session, &url) {
            return ReferenceSet::new();
        }

        info!("Search page loaded, applying filters");
        match self.coordinator.run(session, query) {
            Some(variant) => info!("Filters applied using the {} layout", variant),
            None => {
                warn!("No layout accepted the filters, stopping extraction");
                return ReferenceSet::new();
            }
        }

        self.paginator.collect(session, query)
    }
}

/// Second pipeline stage wired with this site's owner marker and field selectors
pub fn detail_enricher(config: &Config, proxy: ProxyRoute) -> Result<DetailEnricher> {
    Ok(DetailEnricher::new(
        proxy,
        Locator::xpath(OWNER_MARKER),
        DetailParser::new(&DETAIL_SELECTORS)?,
        config.timings.clone(),
    ))
}
