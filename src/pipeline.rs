use crate::config::Config;
use crate::models::ListingReference;
use crate::output::LeadsCsv;
use crate::scrapers::detail::EnrichSummary;
use crate::scrapers::{zillow, ChromeSession, ProxyRoute, SearchCrawler, SearchQuery};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Stage one. Blocking: drives Chrome for the whole search.
pub fn collect_links(
    config: &Config,
    proxy: ProxyRoute,
    query: &SearchQuery,
) -> Result<Vec<ListingReference>> {
    if proxy.is_direct() {
        info!("Fetching search pages directly");
    }
    let crawler = SearchCrawler::new(config, proxy)?;
    let session = ChromeSession::launch(&config.browser, config.timings.navigation_timeout())?;

    let found = crawler.crawl(&session, query);
    if found.is_empty() {
        warn!("Search for {} produced no listing links", query.location);
        return Ok(Vec::new());
    }
    info!(
        "Extracted {} unique links from up to {} page(s)",
        found.len(),
        query.page_limit()
    );
    Ok(found.into_vec())
}

/// Stage two. Blocking: visits every link and appends owner leads to `report`.
pub fn collect_leads(
    config: &Config,
    proxy: ProxyRoute,
    links: &[ListingReference],
    report: &Path,
) -> Result<EnrichSummary> {
    let enricher = zillow::detail_enricher(config, proxy)?;
    let mut csv = LeadsCsv::create(report)
        .with_context(|| format!("Failed to create report {}", report.display()))?;
    let session = ChromeSession::launch(&config.browser, config.timings.navigation_timeout())?;

    let summary = enricher.run(&session, links, |detail| {
        csv.write(detail)
            .with_context(|| format!("Failed to write to {}", report.display()))
    })?;

    info!(
        "Visited {} listings: {} by owner, {} skipped. {} rows in {}",
        summary.visited,
        summary.eligible,
        summary.skipped,
        csv.rows(),
        report.display()
    );
    Ok(summary)
}
