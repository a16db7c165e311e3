//! Baseline capture: which files a baseline holds and how many lines.

use std::collections::BTreeSet;

use halflife_core::{Logger, PathSelector, Result, Revision};

use crate::query::RepositoryQuery;

/// The file set and line total of one baseline revision.
///
/// Captured once per baseline and shared by every comparison against it.
/// A new baseline means a new snapshot; snapshots are never updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineSnapshot {
    /// The baseline revision.
    pub revision: Revision,
    /// Paths matching the selector that exist at `revision`.
    pub files: BTreeSet<String>,
    /// Sum of the line counts of `files` at `revision`.
    pub total_lines: u64,
}

impl BaselineSnapshot {
    /// List the files under `selector` at `revision` and count their lines.
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
    ///
    /// let mut history = MemoryHistory::new();
    /// let base = history.commit("base", |tree| {
    ///     tree.write_numbered("src/a.rs", "a", 30)
    ///         .write_numbered("README.md", "r", 5);
    /// });
    ///
    /// let snapshot =
    ///     BaselineSnapshot::capture(&history, &base, &PathSelector::new("src"), &Logger::silent())
    ///         .unwrap();
    /// assert_eq!(snapshot.total_lines, 30);
    /// assert_eq!(snapshot.files.len(), 1);
    /// ```
    pub fn capture<Q: RepositoryQuery + ?Sized>(
        query: &Q,
        revision: &Revision,
        selector: &PathSelector,
        logger: &Logger,
    ) -> Result<Self> {
        let files: BTreeSet<String> = query.list_files(revision, selector)?.into_iter().collect();

        let mut total_lines = 0;
        for path in &files {
            total_lines += query.file_line_count(revision, path)?;
        }

        logger.detail(format_args!("number of lines in all files: {total_lines}"));
        logger.trace(format_args!(
            "baseline {revision} holds {} files under {selector}",
            files.len()
        ));

        Ok(Self {
            revision: revision.clone(),
            files,
            total_lines,
        })
    }

    /// Whether more than half of the baseline lines have changed.
    pub fn is_half_changed(&self, changed_lines: u64) -> bool {
        reaches_half(changed_lines, self.total_lines)
    }
}

/// `changed_lines > total_lines / 2`, with integer division.
///
/// A baseline of 5 lines needs at least 3 changed lines, and exactly half
/// never counts.
///
/// # Examples
///
/// ```
/// use halflife_history::snapshot::reaches_half;
///
/// assert!(!reaches_half(2, 5));
/// assert!(reaches_half(3, 5));
/// assert!(!reaches_half(50, 100));
/// assert!(!reaches_half(0, 0));
/// ```
pub fn reaches_half(changed_lines: u64, total_lines: u64) -> bool {
    changed_lines > total_lines / 2
}
