//! Drives half-life searches across a sequence of baselines.
//!
//! The baseline sequence is the starting revision followed by every revision
//! in its window up to, but not including, the end revision.
//!
//! - [`RunMode::Single`]: one search from the start.
//! - [`RunMode::Linear`]: an independent search from every baseline.
//! - [`RunMode::Logarithmic`]: a chain. Only the current baseline is
//!   searched, and each half-point found becomes the next baseline, so the
//!   run jumps from half-point to half-point instead of probing every
//!   revision.

use halflife_core::{
    HalfLifeResult, HalfPoint, Logger, PathSelector, Result, Revision, RunMode, SearchMode,
};

use crate::query::RepositoryQuery;
use crate::search::HalfLifeSearch;
use crate::sink::ResultSink;

/// Runs searches for one selector and one candidate scan mode.
///
/// # Examples
///
/// ```
/// use halflife_core::{Logger, PathSelector, RunMode, SearchMode};
/// use halflife_history::memory::MemoryHistory;
/// use halflife_history::orchestrate::Orchestrator;
///
/// let mut history = MemoryHistory::new();
/// let start = history.commit("start", |tree| {
///     tree.write_numbered("a.rs", "a", 4);
/// });
/// let end = history.commit("end", |tree| {
///     tree.rewrite_lines("a.rs", 0..3, "x");
/// });
///
/// let orchestrator =
///     Orchestrator::new(&history, PathSelector::new("."), SearchMode::Linear, Logger::silent());
/// let results = orchestrator.run(RunMode::Single, &start, &end, None).unwrap();
/// assert_eq!(results[0].half_point_revision(), Some(&end));
/// ```
pub struct Orchestrator<'a, Q: ?Sized> {
    query: &'a Q,
    search: HalfLifeSearch<'a, Q>,
    search_mode: SearchMode,
    logger: Logger,
}

impl<'a, Q: RepositoryQuery + ?Sized> Orchestrator<'a, Q> {
    /// Orchestrate searches over `query`'s history within `selector`.
    pub fn new(
        query: &'a Q,
        selector: PathSelector,
        search_mode: SearchMode,
        logger: Logger,
    ) -> Self {
        Self {
            query,
            search: HalfLifeSearch::new(query, selector, logger.clone()),
            search_mode,
            logger,
        }
    }

    /// Baselines eligible for a run from `start` to `end`, in order.
    ///
    /// # Errors
    ///
    /// Propagates any history query failure.
    pub fn baselines(
        &self,
        mode: RunMode,
        start: &Revision,
        end: &Revision,
    ) -> Result<Vec<Revision>> {
        let mut baselines = vec![start.clone()];
        if mode == RunMode::Single {
            return Ok(baselines);
        }
        let window = self
            .query
            .revisions_between(start, end, self.search.selector())?;
        baselines.extend(window.into_iter().filter(|rev| rev != end));
        Ok(baselines)
    }

    /// Run every search `mode` calls for and report each outcome.
    ///
    /// Each half-point found is logged and, when a sink is given, appended
    /// to it. A sink that fails to write is dropped with a warning and the
    /// run continues without it. The sink is flushed before returning, on
    /// success and on failure alike.
    ///
    /// # Errors
    ///
    /// The first history query failure aborts the run and is returned as is;
    /// it is never reported as a missing half-point.
    pub fn run(
        &self,
        mode: RunMode,
        start: &Revision,
        end: &Revision,
        sink: Option<&mut dyn ResultSink>,
    ) -> Result<Vec<HalfLifeResult>> {
        let mut sink = sink;
        let outcome = self.run_searches(mode, start, end, &mut sink);

        if let Some(sink) = sink {
            if let Err(e) = sink.flush() {
                self.logger
                    .warn(format_args!("failed to flush result file: {e}"));
            }
        }
        outcome
    }

    fn run_searches(
        &self,
        mode: RunMode,
        start: &Revision,
        end: &Revision,
        sink: &mut Option<&mut dyn ResultSink>,
    ) -> Result<Vec<HalfLifeResult>> {
        self.logger.detail(format_args!("{mode} mode"));
        let baselines = self.baselines(mode, start, end)?;
        self.logger.trace(format_args!(
            "{} baselines between {start} and {end}",
            baselines.len()
        ));

        let mut results = Vec::new();
        let mut next_baseline = start.clone();

        for baseline in &baselines {
            if mode == RunMode::Logarithmic && *baseline != next_baseline {
                continue;
            }

            let result = self.search.find(baseline, end, self.search_mode)?;
            if let Some(half_point) = &result.half_point {
                self.report(sink, baseline, half_point);
                next_baseline = half_point.revision.clone();
            }
            results.push(result);
        }

        Ok(results)
    }

    fn report(
        &self,
        sink: &mut Option<&mut dyn ResultSink>,
        baseline: &Revision,
        half_point: &HalfPoint,
    ) {
        let failed = match sink.as_deref_mut() {
            Some(sink) => sink.record(baseline, half_point).err(),
            None => None,
        };
        if let Some(e) = failed {
            self.logger.warn(format_args!(
                "failed to write result row, continuing without result file: {e}"
            ));
            *sink = None;
        }
    }
}
