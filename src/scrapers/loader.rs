use crate::config::Timings;
use crate::scrapers::pacing::{capture_diagnostics, pause};
use crate::scrapers::proxy::ProxyRoute;
use crate::scrapers::traits::{Locator, PageSession};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};

/// Loads a page with a bounded number of attempts, treating each failure as
/// transient until the attempts run out.
pub struct PageLoader {
    proxy: ProxyRoute,
    ready_marker: Locator,
    timings: Timings,
    diagnostics_dir: PathBuf,
}

impl PageLoader {
    pub fn new(
        proxy: ProxyRoute,
        ready_marker: Locator,
        timings: Timings,
        diagnostics_dir: PathBuf,
    ) -> Self {
        Self {
            proxy,
            ready_marker,
            timings,
            diagnostics_dir,
        }
    }

    /// Navigate to `url` until the readiness marker appears. Returns false
    /// once every attempt has failed, after saving a screenshot.
    pub fn load(&self, session: &dyn PageSession, url: &str) -> bool {
        let attempts = self.timings.load_attempts.max(1);
        let fetch_url = self.proxy.wrap(url);

        for attempt in 1..=attempts {
            info!("Page load attempt {}/{}: {}", attempt, attempts, url);

            match self.attempt(session, &fetch_url) {
                Ok(()) => {
                    info!("Page loaded, found {}", self.ready_marker);
                    return true;
                }
                Err(e) => {
                    warn!("Attempt {} failed: {:#}", attempt, e);
                    if attempt < attempts {
                        pause(&self.timings.retry_backoff, "retry backoff");
                    }
                }
            }
        }

        warn!("Giving up on {} after {} attempts", url, attempts);
        capture_diagnostics(session, &self.diagnostics_dir, "initial_load_failed");
        false
    }

    fn attempt(&self, session: &dyn PageSession, fetch_url: &str) -> Result<()> {
        session.navigate(fetch_url)?;
        session.wait_for(&self.ready_marker, self.timings.load_timeout())
    }
}
