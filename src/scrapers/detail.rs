use crate::config::Timings;
use crate::models::{Enrichment, ListingDetail, ListingReference, SkipReason};
use crate::scrapers::pacing::pause;
use crate::scrapers::proxy::ProxyRoute;
use crate::scrapers::traits::{Locator, PageSession};
use anyhow::{anyhow, Result};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

/// CSS selectors for the fields of a listing detail page
#[derive(Debug, Clone)]
pub struct DetailSelectors {
    pub address: &'static str,
    pub owner_name: &'static str,
    pub phone_number: &'static str,
    pub publication_date: &'static str,
    pub price: &'static str,
    pub price_fallback: &'static str,
}

struct CompiledSelectors {
    address: Selector,
    owner_name: Selector,
    phone_number: Selector,
    publication_date: Selector,
    price: Selector,
    price_fallback: Selector,
}

fn compile(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector '{}': {}", css, e))
}

/// Reads each detail field on its own so one changed selector only blanks that field
pub struct DetailParser {
    selectors: CompiledSelectors,
}

impl DetailParser {
    pub fn new(selectors: &DetailSelectors) -> Result<Self> {
        Ok(Self {
            selectors: CompiledSelectors {
                address: compile(selectors.address)?,
                owner_name: compile(selectors.owner_name)?,
                phone_number: compile(selectors.phone_number)?,
                publication_date: compile(selectors.publication_date)?,
                price: compile(selectors.price)?,
                price_fallback: compile(selectors.price_fallback)?,
            },
        })
    }

    pub fn parse(&self, html: &str, source_url: &str) -> ListingDetail {
        let document = Html::parse_document(html);
        let s = &self.selectors;

        let price = match first_text(&document, &s.price) {
            Some(text) => Some(strip_monthly_suffix(&text)),
            None => {
                debug!("Price not found with primary selector, trying price history table");
                first_text(&document, &s.price_fallback)
            }
        };

        let detail = ListingDetail {
            address: first_text(&document, &s.address),
            source_url: Some(source_url.to_string()),
            phone_number: first_text(&document, &s.phone_number),
            owner_name: first_text(&document, &s.owner_name),
            publication_date: first_text(&document, &s.publication_date),
            price,
        };

        for (name, value) in [
            ("address", &detail.address),
            ("owner name", &detail.owner_name),
            ("phone number", &detail.phone_number),
            ("publication date", &detail.publication_date),
            ("price", &detail.price),
        ] {
            if value.is_none() {
                debug!("  - {} not found", name);
            }
        }

        detail
    }
}

/// Text of the first match, whitespace-collapsed; `None` when absent or blank
fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    let element = document.select(selector).next()?;
    let text = element.text().collect::<String>();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// "$3,399/mo" -> "$3,399"
pub fn strip_monthly_suffix(text: &str) -> String {
    match text.find("/mo") {
        Some(idx) => text[..idx].trim().to_string(),
        None => text.trim().to_string(),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichSummary {
    pub visited: usize,
    pub eligible: usize,
    pub skipped: usize,
}

/// Visits listing pages and keeps the ones posted by the owner
pub struct DetailEnricher {
    proxy: ProxyRoute,
    owner_marker: Locator,
    parser: DetailParser,
    timings: Timings,
}

impl DetailEnricher {
    pub fn new(
        proxy: ProxyRoute,
        owner_marker: Locator,
        parser: DetailParser,
        timings: Timings,
    ) -> Self {
        Self {
            proxy,
            owner_marker,
            parser,
            timings,
        }
    }

    pub fn enrich(&self, session: &dyn PageSession, reference: &ListingReference) -> Enrichment {
        if let Err(e) = session.navigate(&self.proxy.wrap(reference.as_str())) {
            warn!("  Could not load listing: {:#}", e);
            return Enrichment::Skipped(SkipReason::LoadFailed);
        }

        debug!("  Checking for owner marker {}", self.owner_marker);
        if session
            .wait_for(&self.owner_marker, self.timings.owner_check_timeout())
            .is_err()
        {
            return Enrichment::Skipped(SkipReason::NotByOwner);
        }
        info!("  Confirmed: listed by property owner");

        let html = session.html().unwrap_or_else(|e| {
            warn!("  Could not read page content: {:#}", e);
            String::new()
        });
        Enrichment::Eligible(self.parser.parse(&html, reference.as_str()))
    }

    /// Enrich every reference in order, handing eligible records to `sink`
    /// as soon as they are read. Only a `sink` error stops the run.
    pub fn run<F>(
        &self,
        session: &dyn PageSession,
        references: &[ListingReference],
        mut sink: F,
    ) -> Result<EnrichSummary>
    where
        F: FnMut(&ListingDetail) -> Result<()>,
    {
        let mut summary = EnrichSummary::default();
        let total = references.len();

        for (idx, reference) in references.iter().enumerate() {
            info!("[{}/{}] Processing {}", idx + 1, total, reference);
            summary.visited += 1;

            match self.enrich(session, reference) {
                Enrichment::Eligible(detail) => {
                    sink(&detail)?;
                    summary.eligible += 1;
                    info!(
                        "  Saved lead for '{}'",
                        detail.owner_name.as_deref().unwrap_or("unknown owner")
                    );
                }
                Enrichment::Skipped(reason) => {
                    summary.skipped += 1;
                    info!("  Skipping: {}", reason);
                }
            }

            if idx + 1 < total {
                pause(&self.timings.between_listings, "between listings");
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::testing::ScriptedSession;

    use crate::scrapers::zillow::{DETAIL_SELECTORS, OWNER_MARKER};

    fn parser() -> DetailParser {
        DetailParser::new(&DETAIL_SELECTORS).unwrap()
    }

    fn enricher() -> DetailEnricher {
        DetailEnricher::new(
            ProxyRoute::direct(),
            Locator::xpath(OWNER_MARKER),
            parser(),
            Timings::instant(),
        )
    }

    const OWNER_PAGE: &str = r#"<html><body>
        <div class="styles__AddressWrapper-abc12"><h1>12 Elm St,
            Stamford, CT 06902</h1></div>
        <span data-testid="price"><span>$3,399</span>/mo</span>
        <div class="ds-listing-agent-header">Listed by property owner</div>
        <span class="ds-listing-agent-display-name">Pat Owner</span>
        <ul><li class="ds-listing-agent-info-text">(203) 555-0101</li></ul>
        <table><tbody>
            <tr><td><span data-testid="date-info">5/2/2025</span></td></tr>
            <tr><td><span data-testid="date-info">1/1/2020</span></td></tr>
        </tbody></table>
    </body></html>"#;

    #[test]
    fn price_suffix_is_stripped() {
        assert_eq!(strip_monthly_suffix("$3,399/mo"), "$3,399");
        assert_eq!(strip_monthly_suffix("$3,399"), "$3,399");
        assert_eq!(strip_monthly_suffix(" $2,100 /mo "), "$2,100");
    }

    #[test]
    fn parses_every_field_of_an_owner_page() {
        let detail = parser().parse(OWNER_PAGE, "https://www.zillow.com/homedetails/1_zpid/");

        assert_eq!(detail.address.as_deref(), Some("12 Elm St, Stamford, CT 06902"));
        assert_eq!(
            detail.source_url.as_deref(),
            Some("https://www.zillow.com/homedetails/1_zpid/")
        );
        assert_eq!(detail.owner_name.as_deref(), Some("Pat Owner"));
        assert_eq!(detail.phone_number.as_deref(), Some("(203) 555-0101"));
        assert_eq!(detail.publication_date.as_deref(), Some("5/2/2025"));
        assert_eq!(detail.price.as_deref(), Some("$3,399"));
    }

    #[test]
    fn price_falls_back_to_history_table() {
        let html = r#"<html><body><table><tbody>
            <tr><td data-testid="price-money-cell"><span class="Text-c11n StyledPriceText-abc">$2,950</span></td></tr>
            <tr><td data-testid="price-money-cell"><span class="StyledPriceText-abc">$2,800</span></td></tr>
        </tbody></table></body></html>"#;

        let detail = parser().parse(html, "https://www.zillow.com/x/");
        assert_eq!(detail.price.as_deref(), Some("$2,950"));
    }

    #[test]
    fn missing_fields_stay_empty_without_failing_the_record() {
        let html = r#"<html><body><span class="ds-listing-agent-display-name">Sam</span></body></html>"#;

        let detail = parser().parse(html, "https://www.zillow.com/y/");
        assert_eq!(detail.owner_name.as_deref(), Some("Sam"));
        assert_eq!(detail.address, None);
        assert_eq!(detail.phone_number, None);
        assert_eq!(detail.publication_date, None);
        assert_eq!(detail.price, None);
    }

    #[test]
    fn listing_without_owner_marker_is_skipped() {
        let session = ScriptedSession::new().with_pages([OWNER_PAGE]).missing(OWNER_MARKER);
        let reference = ListingReference::new("https://www.zillow.com/homedetails/2_zpid/");

        assert_eq!(
            enricher().enrich(&session, &reference),
            Enrichment::Skipped(SkipReason::NotByOwner)
        );
    }

    #[test]
    fn failed_navigation_is_skipped() {
        let session = ScriptedSession::new().failing_navigation(1);
        let reference = ListingReference::new("https://www.zillow.com/homedetails/2_zpid/");

        assert_eq!(
            enricher().enrich(&session, &reference),
            Enrichment::Skipped(SkipReason::LoadFailed)
        );
    }

    #[test]
    fn run_hands_only_owner_listings_to_the_sink() {
        let session = ScriptedSession::new().with_pages([OWNER_PAGE]).failing(OWNER_MARKER, 1);
        let references = vec![
            ListingReference::new("https://www.zillow.com/homedetails/agent_zpid/"),
            ListingReference::new("https://www.zillow.com/homedetails/owner_zpid/"),
        ];

        let mut rows = Vec::new();
        let summary = enricher()
            .run(&session, &references, |detail| {
                rows.push(detail.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(summary, EnrichSummary { visited: 2, eligible: 1, skipped: 1 });
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].source_url.as_deref(),
            Some("https://www.zillow.com/homedetails/owner_zpid/")
        );
    }

    #[test]
    fn sink_errors_stop_the_run() {
        let session = ScriptedSession::new().with_pages([OWNER_PAGE]);
        let references = vec![
            ListingReference::new("https://www.zillow.com/a/"),
            ListingReference::new("https://www.zillow.com/b/"),
        ];

        let result = enricher().run(&session, &references, |_| Err(anyhow!("disk full")));
        assert!(result.is_err());
    }
}
