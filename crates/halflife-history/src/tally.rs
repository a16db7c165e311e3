//! Changed-line accumulation between a baseline and one candidate.

use std::collections::BTreeSet;

use halflife_core::{Result, Revision};

use crate::query::RepositoryQuery;
use crate::snapshot::BaselineSnapshot;

/// Count lines of the baseline that have been removed or changed at `target`.
///
/// Only files present in the baseline's file set count: files created after
/// the baseline, or outside its selector, never contribute. Binary files
/// contribute zero. The tally is computed fresh from the two endpoints; it is
/// not a running total over intermediate revisions.
///
/// # Errors
///
/// Propagates any history query failure.
///
/// # Examples
///
/// ```
/// use halflife_core::{Logger, PathSelector};
/// use halflife_history::memory::MemoryHistory;
/// use halflife_history::snapshot::BaselineSnapshot;
/// use halflife_history::tally::tally;
///
/// let mut history = MemoryHistory::new();
/// let base = history.commit("base", |tree| {
///     tree.write_numbered("a.rs", "a", 10);
/// });
/// let next = history.commit("next", |tree| {
///     tree.rewrite_lines("a.rs", 0..4, "edit")
///         .write_numbered("new.rs", "n", 50);
/// });
///
/// let (everything, logger) = (PathSelector::new("."), Logger::silent());
/// let snapshot = BaselineSnapshot::capture(&history, &base, &everything, &logger).unwrap();
/// assert_eq!(tally(&history, &snapshot, &next).unwrap(), 4);
/// ```
pub fn tally<Q: RepositoryQuery + ?Sized>(
    query: &Q,
    baseline: &BaselineSnapshot,
    target: &Revision,
) -> Result<u64> {
    let interesting: Vec<String> = query
        .changed_files(&baseline.revision, target)?
        .into_iter()
        .filter(|path| baseline.files.contains(path))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if interesting.is_empty() {
        return Ok(0);
    }

    let stats = query.line_diff_stat(&baseline.revision, target, &interesting)?;
    Ok(stats.iter().map(|stat| stat.removed.count()).sum())
}
