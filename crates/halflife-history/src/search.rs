//! Half-point search: the first revision at which more than half of a
//! baseline's lines have changed.
//!
//! Both scan modes first check the newest candidate. If the threshold is not
//! crossed by the end of the window it is crossed nowhere in it, and the
//! search stops without probing anything else.
//!
//! [`SearchMode::Logarithmic`] binary-searches the window and is only exact
//! when the predicate is monotonic across it (false..false, true..true).
//! Every probe diffs the baseline against the candidate directly, so a
//! history that reverts earlier churn can break monotonicity and make the
//! binary search settle on a different revision than the linear scan.

use halflife_core::{HalfLifeResult, HalfPoint, Logger, PathSelector, Result, Revision, SearchMode};

use crate::query::RepositoryQuery;
use crate::snapshot::BaselineSnapshot;
use crate::tally::tally;

/// Index of the first item for which `reached` holds, or `None`.
///
/// The last item is probed first; when it does not satisfy `reached` no
/// other item is probed. Otherwise the remaining items are scanned oldest
/// first ([`SearchMode::Linear`]) or binary-searched
/// ([`SearchMode::Logarithmic`]). The probe sequence is deterministic.
///
/// # Errors
///
/// Returns the first error produced by `reached`.
///
/// # Examples
///
/// ```
/// use halflife_core::SearchMode;
/// use halflife_history::search::first_reaching;
///
/// let tallies = [10, 20, 55, 60, 70];
/// let hit = |t: &u64| Ok::<_, ()>(*t > 50);
/// assert_eq!(first_reaching(&tallies, SearchMode::Linear, hit), Ok(Some(2)));
/// assert_eq!(first_reaching(&tallies, SearchMode::Logarithmic, hit), Ok(Some(2)));
/// ```
pub fn first_reaching<T, E>(
    items: &[T],
    mode: SearchMode,
    mut reached: impl FnMut(&T) -> std::result::Result<bool, E>,
) -> std::result::Result<Option<usize>, E> {
    let Some((last, rest)) = items.split_last() else {
        return Ok(None);
    };
    if !reached(last)? {
        return Ok(None);
    }
    let idx = match mode {
        SearchMode::Linear => linear_scan(rest, &mut reached)?,
        SearchMode::Logarithmic => lower_bound(rest, &mut reached)?,
    };
    Ok(Some(idx))
}

/// First index satisfying `reached`, or `items.len()`.
fn linear_scan<T, E>(
    items: &[T],
    reached: &mut impl FnMut(&T) -> std::result::Result<bool, E>,
) -> std::result::Result<usize, E> {
    for (idx, item) in items.iter().enumerate() {
        if reached(item)? {
            return Ok(idx);
        }
    }
    Ok(items.len())
}

/// Lower bound of a monotonic predicate over `items`, or `items.len()`.
fn lower_bound<T, E>(
    items: &[T],
    reached: &mut impl FnMut(&T) -> std::result::Result<bool, E>,
) -> std::result::Result<usize, E> {
    let mut low = 0;
    let mut high = items.len();
    while low < high {
        let mid = low + (high - low) / 2;
        if reached(&items[mid])? {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    Ok(low)
}

/// Finds half-points for baselines within one path selector.
///
/// # Examples
///
/// ```
/// use halflife_core::{Logger, PathSelector, SearchMode};
/// use halflife_history::memory::MemoryHistory;
/// use halflife_history::search::HalfLifeSearch;
///
/// let mut history = MemoryHistory::new();
/// let base = history.commit("base", |tree| {
///     tree.write_numbered("a.rs", "a", 10);
/// });
/// history.commit("small", |tree| {
///     tree.rewrite_lines("a.rs", 0..3, "x");
/// });
/// let big = history.commit("big", |tree| {
///     tree.rewrite_lines("a.rs", 3..9, "y");
/// });
///
/// let search = HalfLifeSearch::new(&history, PathSelector::new("."), Logger::silent());
/// let result = search.find(&base, &big, SearchMode::Linear).unwrap();
/// assert_eq!(result.half_point_revision(), Some(&big));
/// assert_eq!(result.half_point.unwrap().commits_elapsed, 2);
/// ```
pub struct HalfLifeSearch<'a, Q: ?Sized> {
    query: &'a Q,
    selector: PathSelector,
    logger: Logger,
}

impl<'a, Q: RepositoryQuery + ?Sized> HalfLifeSearch<'a, Q> {
    /// Search `query`'s history, restricted to `selector`.
    pub fn new(query: &'a Q, selector: PathSelector, logger: Logger) -> Self {
        Self {
            query,
            selector,
            logger,
        }
    }

    /// The selector every search is restricted to.
    pub fn selector(&self) -> &PathSelector {
        &self.selector
    }

    /// Find the first revision after `baseline`, up to and including `end`,
    /// at which more than half of the baseline's lines have changed.
    ///
    /// A baseline without lines never reaches its half-point.
    ///
    /// # Errors
    ///
    /// Propagates any history query failure. A missing half-point is
    /// reported as `Ok` with `half_point: None`.
    pub fn find(
        &self,
        baseline: &Revision,
        end: &Revision,
        mode: SearchMode,
    ) -> Result<HalfLifeResult> {
        let snapshot =
            BaselineSnapshot::capture(self.query, baseline, &self.selector, &self.logger)?;
        let window = self.query.revisions_between(baseline, end, &self.selector)?;
        self.logger.trace(format_args!(
            "{} candidate revisions between {baseline} and {end}",
            window.len()
        ));

        let Some(idx) = self.locate(&snapshot, &window, mode)? else {
            self.logger.outcome(format_args!("no half point found for {baseline}"));
            return Ok(HalfLifeResult::not_found(baseline.clone()));
        };

        let half_point = self.describe(baseline, &window[idx])?;
        self.logger.outcome(format_args!(
            "reached half point for {baseline} from {} at {} ({} commits)",
            halflife_core::format_commit_date(&half_point.baseline_date),
            halflife_core::format_commit_date(&half_point.half_point_date),
            half_point.commits_elapsed
        ));

        Ok(HalfLifeResult {
            baseline: baseline.clone(),
            half_point: Some(half_point),
        })
    }

    /// Index of the half-point within `window`, if any.
    fn locate(
        &self,
        snapshot: &BaselineSnapshot,
        window: &[Revision],
        mode: SearchMode,
    ) -> Result<Option<usize>> {
        if snapshot.total_lines == 0 {
            self.logger.trace(format_args!(
                "baseline {} has no lines under {}",
                snapshot.revision, self.selector
            ));
            return Ok(None);
        }

        first_reaching(window, mode, |candidate| {
            let changed = tally(self.query, snapshot, candidate)?;
            self.logger.trace(format_args!("probing {candidate}"));
            self.logger.detail(format_args!(
                "changed lines / all lines: {changed} / {}",
                snapshot.total_lines
            ));
            Ok(snapshot.is_half_changed(changed))
        })
    }

    fn describe(&self, baseline: &Revision, half_point: &Revision) -> Result<HalfPoint> {
        let commits_elapsed = self
            .query
            .revisions_between(baseline, half_point, &self.selector)?
            .len();
        Ok(HalfPoint {
            revision: half_point.clone(),
            commits_elapsed,
            baseline_date: self.query.commit_date(baseline)?,
            half_point_date: self.query.commit_date(half_point)?,
        })
    }
}


#[cfg(test)]
mod properties {
    use halflife_core::SearchMode;
    use proptest::prelude::*;

    use super::first_reaching;

    proptest! {
        #[test]
        fn modes_agree_on_monotonic_tallies(
            steps in proptest::collection::vec(0u64..40, 0..64),
            total in 0u64..2000,
        ) {
            // Non-decreasing tallies model a monotonic history.
            let tallies: Vec<u64> = steps
                .iter()
                .scan(0u64, |acc, step| {
                    *acc += step;
                    Some(*acc)
                })
                .collect();
            let reached = |t: &u64| Ok::<_, ()>(*t > total / 2);

            let linear = first_reaching(&tallies, SearchMode::Linear, reached).unwrap();
            let binary = first_reaching(&tallies, SearchMode::Logarithmic, reached).unwrap();
            let expected = tallies.iter().position(|t| *t > total / 2);

            prop_assert_eq!(linear, expected);
            prop_assert_eq!(binary, expected);
        }
    }
}
