use crate::config::{DelayRange, Timings};
use crate::models::UiVariant;
use crate::scrapers::pacing::pause;
use crate::scrapers::traits::{Locator, PageSession};
use crate::scrapers::types::SearchQuery;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStep {
    Sort,
    MinPrice,
    DaysOnSite,
}

impl fmt::Display for FilterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStep::Sort => f.write_str("sort newest"),
            FilterStep::MinPrice => f.write_str("minimum price"),
            FilterStep::DaysOnSite => f.write_str("days on site"),
        }
    }
}

#[derive(Debug, Error)]
#[error("{variant} layout: could not apply {step} filter: {cause}")]
pub struct StepFailure {
    pub variant: UiVariant,
    pub step: FilterStep,
    pub cause: String,
}

pub type FilterOutcome = Result<(), StepFailure>;

/// One layout's way of applying the query's filters to the search page
pub trait FilterStrategy {
    fn variant(&self) -> UiVariant;

    /// Run every step whose query field is set, stopping at the first failure
    fn apply(&self, session: &dyn PageSession, query: &SearchQuery) -> FilterOutcome;
}

/// Which pacing delay follows an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Opening a menu or popover
    Control,
    /// Typing or picking a value
    Input,
    /// Applying a filter and letting results refresh
    Apply,
}

#[derive(Debug, Clone)]
pub enum Action {
    Click(Locator, Settle),
    /// Type the step's value into a text input
    Fill(Locator, Settle),
    /// Choose the step's value in a dropdown
    Select(Locator, Settle),
}

/// The controls one filter step drives, in order
#[derive(Debug, Clone)]
pub struct StepScript {
    pub step: FilterStep,
    pub actions: Vec<Action>,
}

impl StepScript {
    pub fn new(step: FilterStep, actions: Vec<Action>) -> Self {
        Self { step, actions }
    }
}

/// Filter strategy driven by a fixed selector set
pub struct SelectorStrategy {
    variant: UiVariant,
    steps: Vec<StepScript>,
    timings: Timings,
}

impl SelectorStrategy {
    pub fn new(variant: UiVariant, steps: Vec<StepScript>, timings: Timings) -> Self {
        Self {
            variant,
            steps,
            timings,
        }
    }

    fn settle(&self, settle: Settle) -> &DelayRange {
        match settle {
            Settle::Control => &self.timings.control_settle,
            Settle::Input => &self.timings.input_settle,
            Settle::Apply => &self.timings.apply_settle,
        }
    }

    fn run_step(
        &self,
        session: &dyn PageSession,
        script: &StepScript,
        value: &str,
    ) -> anyhow::Result<()> {
        let timeout = self.timings.step_timeout();
        for action in &script.actions {
            let settle = match action {
                Action::Click(locator, settle) => {
                    session.click(locator, timeout)?;
                    settle
                }
                Action::Fill(locator, settle) => {
                    session.fill(locator, value, timeout)?;
                    settle
                }
                Action::Select(locator, settle) => {
                    session.select(locator, value, timeout)?;
                    settle
                }
            };
            pause(self.settle(*settle), "filter settle");
        }
        Ok(())
    }
}

/// Value a step needs from the query, or `None` when the step is not requested
fn step_value(step: FilterStep, query: &SearchQuery) -> Option<String> {
    match step {
        FilterStep::Sort => query.sort_newest.then(String::new),
        FilterStep::MinPrice => query.min_price.map(|p| p.to_string()),
        FilterStep::DaysOnSite => query.days_on_site.map(|d| d.to_string()),
    }
}

impl FilterStrategy for SelectorStrategy {
    fn variant(&self) -> UiVariant {
        self.variant
    }

    fn apply(&self, session: &dyn PageSession, query: &SearchQuery) -> FilterOutcome {
        for script in &self.steps {
            let Some(value) = step_value(script.step, query) else {
                continue;
            };

            info!("[{}] Applying {} filter", self.variant, script.step);
            self.run_step(session, script, &value).map_err(|e| StepFailure {
                variant: self.variant,
                step: script.step,
                cause: format!("{:#}", e),
            })?;
            info!("[{}] {} filter applied", self.variant, script.step);
        }
        Ok(())
    }
}

/// Tries each layout's strategy in priority order until one applies cleanly
pub struct FilterCoordinator {
    strategies: Vec<Box<dyn FilterStrategy>>,
}

impl FilterCoordinator {
    pub fn new(strategies: Vec<Box<dyn FilterStrategy>>) -> Self {
        Self { strategies }
    }

    /// Layout whose filters were applied, or `None` when every strategy failed
    pub fn run(&self, session: &dyn PageSession, query: &SearchQuery) -> Option<UiVariant> {
        for (idx, strategy) in self.strategies.iter().enumerate() {
            info!(
                "Filter attempt {}/{} with {} layout selectors",
                idx + 1,
                self.strategies.len(),
                strategy.variant()
            );
            match strategy.apply(session, query) {
                Ok(()) => {
                    info!("All requested filters applied with {} layout", strategy.variant());
                    return Some(strategy.variant());
                }
                Err(failure) => warn!("{}", failure),
            }
        }
        None
    }
}
