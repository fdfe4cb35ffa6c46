use crate::config::Timings;
use crate::models::ReferenceSet;
use crate::scrapers::extractor::ResultExtractor;
use crate::scrapers::pacing::{capture_diagnostics, pause};
use crate::scrapers::traits::{Locator, PageSession};
use crate::scrapers::types::SearchQuery;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

/// Walks result pages via the "next" control, accumulating unique references
pub struct Paginator {
    extractor: ResultExtractor,
    ready_marker: Locator,
    next_control: Locator,
    timings: Timings,
    diagnostics_dir: PathBuf,
}

impl Paginator {
    pub fn new(
        extractor: ResultExtractor,
        ready_marker: Locator,
        next_control: Locator,
        timings: Timings,
        diagnostics_dir: PathBuf,
    ) -> Self {
        Self {
            extractor,
            ready_marker,
            next_control,
            timings,
            diagnostics_dir,
        }
    }

    /// Collect references from up to `query.page_limit()` pages. Running out
    /// of pages early is normal; whatever was gathered is returned.
    pub fn collect(&self, session: &dyn PageSession, query: &SearchQuery) -> ReferenceSet {
        let limit = query.page_limit();
        let mut found = ReferenceSet::new();
        let mut page = 1;

        loop {
            info!("Processing results page {}/{}", page, limit);
            self.harvest(session, page, &mut found);

            if page >= limit {
                info!("Reached the limit of {} page(s)", limit);
                break;
            }

            if let Err(e) = self.advance(session) {
                info!("Stopping at page {}: {:#}", page, e);
                break;
            }
            page += 1;
            info!("Moved to page {}", page);
            pause(&self.timings.page_turn, "page turn");
        }

        info!("Collected {} unique listing links", found.len());
        found
    }

    fn harvest(&self, session: &dyn PageSession, page: u32, found: &mut ReferenceSet) {
        pause(&self.timings.before_extract, "before extract");

        let refs = session
            .wait_for(&self.ready_marker, self.timings.extract_timeout())
            .and_then(|()| session.html())
            .and_then(|html| self.extractor.extract(&html).map_err(anyhow::Error::from));

        match refs {
            Ok(refs) => {
                let seen = refs.len();
                let added = found.merge(refs);
                info!("Page {}: {} links, {} new", page, seen, added);
            }
            Err(e) => {
                warn!("Could not extract listings from page {}: {:#}", page, e);
                let reason = format!("extract_failed_page{}", page);
                capture_diagnostics(session, &self.diagnostics_dir, &reason);
            }
        }
    }

    fn advance(&self, session: &dyn PageSession) -> Result<()> {
        let mark = session
            .click_and_mark(&self.next_control, self.timings.next_page_timeout())
            .context("no next page control")?;
        session
            .wait_until_stale(&mark, self.timings.staleness_timeout())
            .context("page did not change after clicking next")
    }
}
