//! Closed-form half-life estimate from an exponential-decay model.
//!
//! Unchanged lines are treated as decaying geometrically with every commit,
//! like a radioactive sample: after `n` commits a fraction
//! `remaining / total` survives, so the half-life in commits is
//! `n * ln 2 / (ln total - ln remaining)`.

use std::f64::consts::LN_2;

use halflife_core::{Logger, PathSelector, Result, Revision};

use crate::query::RepositoryQuery;
use crate::snapshot::BaselineSnapshot;
use crate::tally::tally;

/// Estimated number of commits for half the lines to change.
///
/// - every line changed (nothing remains): `0.0`, already fully decayed
/// - no measurable decay (denominator exactly `0.0`): `f64::INFINITY`
///
/// `total_lines` must be non-zero; the model is undefined for an empty
/// baseline and callers are expected not to ask.
///
/// # Examples
///
/// ```
/// use halflife_history::estimate::estimate;
///
/// // A quarter of the lines survive after 20 commits: two half-lives.
/// assert!((estimate(20, 100, 75) - 10.0).abs() < 1e-9);
/// assert_eq!(estimate(10, 100, 100), 0.0);
/// assert_eq!(estimate(10, 100, 0), f64::INFINITY);
/// ```
pub fn estimate(commits_elapsed: u64, total_lines: u64, changed_lines: u64) -> f64 {
    let remaining = total_lines.saturating_sub(changed_lines);
    if remaining == 0 {
        return 0.0;
    }
    let denominator = (total_lines as f64).ln() - (remaining as f64).ln();
    if denominator == 0.0 {
        return f64::INFINITY;
    }
    commits_elapsed as f64 * LN_2 / denominator
}

/// An estimate over one `[start, end]` range, with the inputs it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeEstimate {
    /// Baseline of the range.
    pub start: Revision,
    /// Last revision of the range.
    pub end: Revision,
    /// Revisions after `start` up to and including `end`, within the selector.
    pub commits_elapsed: u64,
    /// Baseline line total.
    pub total_lines: u64,
    /// Baseline lines changed by `end`.
    pub changed_lines: u64,
    /// Estimated half-life in commits; may be infinite.
    pub half_life: f64,
}

/// Estimates half-lives without searching for an actual half-point.
pub struct HalfLifeEstimator<'a, Q: ?Sized> {
    query: &'a Q,
    selector: PathSelector,
    logger: Logger,
}

impl<'a, Q: RepositoryQuery + ?Sized> HalfLifeEstimator<'a, Q> {
    /// Estimate from `query`'s history, restricted to `selector`.
    pub fn new(query: &'a Q, selector: PathSelector, logger: Logger) -> Self {
        Self {
            query,
            selector,
            logger,
        }
    }

    /// Estimate the half-life of `start`'s lines from the decay observed at
    /// `end`. Needs one snapshot, one window count, and one tally.
    ///
    /// Returns `None` when the baseline holds no lines.
    ///
    /// # Errors
    ///
    /// Propagates any history query failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use halflife_core::{Logger, PathSelector};
    /// use halflife_history::estimate::HalfLifeEstimator;
    /// use halflife_history::memory::MemoryHistory;
    ///
    /// let mut history = MemoryHistory::new();
    /// let start = history.commit("start", |tree| {
    ///     tree.write_numbered("a.rs", "a", 100);
    /// });
    /// let end = history.commit("end", |tree| {
    ///     tree.rewrite_lines("a.rs", 0..50, "x");
    /// });
    ///
    /// let estimator = HalfLifeEstimator::new(&history, PathSelector::new("."), Logger::silent());
    /// let estimate = estimator.estimate_range(&start, &end).unwrap().unwrap();
    /// assert!((estimate.half_life - 1.0).abs() < 1e-9);
    /// ```
    pub fn estimate_range(
        &self,
        start: &Revision,
        end: &Revision,
    ) -> Result<Option<RangeEstimate>> {
        let snapshot = BaselineSnapshot::capture(self.query, start, &self.selector, &self.logger)?;
        if snapshot.total_lines == 0 {
            self.logger.detail(format_args!(
                "cannot estimate half-life for {start}: no lines under {}",
                self.selector
            ));
            return Ok(None);
        }

        let commits_elapsed = self
            .query
            .revisions_between(start, end, &self.selector)?
            .len() as u64;
        let changed_lines = tally(self.query, &snapshot, end)?;
        let half_life = estimate(commits_elapsed, snapshot.total_lines, changed_lines);

        self.logger.detail(format_args!(
            "{changed_lines} of {} lines changed over {commits_elapsed} commits",
            snapshot.total_lines
        ));
        self.logger.trace(format_args!(
            "estimated half-life for {start}: {half_life:.2} commits"
        ));

        Ok(Some(RangeEstimate {
            start: start.clone(),
            end: end.clone(),
            commits_elapsed,
            total_lines: snapshot.total_lines,
            changed_lines,
            half_life,
        }))
    }
}
