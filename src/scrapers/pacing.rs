use crate::config::DelayRange;
use crate::scrapers::traits::PageSession;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, info, warn};

/// Sleep for a random duration drawn from `range`
pub fn pause(range: &DelayRange, reason: &str) {
    let delay = range.sample();
    if delay.is_zero() {
        return;
    }
    debug!("Waiting {:.1}s ({})", delay.as_secs_f32(), reason);
    thread::sleep(delay);
}

/// Save a screenshot of the current page for postmortem inspection.
/// Failures are logged and swallowed; the run carries on either way.
pub fn capture_diagnostics(session: &dyn PageSession, dir: &Path, reason: &str) -> Option<PathBuf> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!("Could not create diagnostics directory {}: {}", dir.display(), e);
        return None;
    }

    let path = dir.join(format!("{}_{}.png", reason, Utc::now().format("%Y%m%dT%H%M%S")));
    match session.screenshot(&path) {
        Ok(()) => {
            info!("Saved screenshot to {}", path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Could not capture screenshot for {}: {:#}", reason, e);
            None
        }
    }
}
