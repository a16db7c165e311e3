//! The history queries the half-life search is built on.
//!
//! [`RepositoryQuery`] is the only way the algorithms see a repository, so a
//! synthetic history ([`crate::memory::MemoryHistory`]) can stand in for git
//! in tests.

use chrono::{DateTime, FixedOffset};
use halflife_core::{PathSelector, Result, Revision};

/// A line count from a numstat-style diff, or the marker git prints for
/// content it cannot count (binary files).
///
/// # Examples
///
/// ```
/// use halflife_history::query::LineCount;
///
/// assert_eq!(LineCount::Lines(12).count(), 12);
/// assert_eq!(LineCount::Binary.count(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCount {
    /// A countable number of lines.
    Lines(u64),
    /// Non-numeric marker: the file is not line-countable.
    Binary,
}

impl LineCount {
    /// Contribution to a tally. Binary markers contribute nothing.
    pub fn count(self) -> u64 {
        match self {
            LineCount::Lines(n) => n,
            LineCount::Binary => 0,
        }
    }
}

/// Per-file line statistics between two revisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumStat {
    /// File path relative to the repository root.
    pub path: String,
    /// Lines added.
    pub added: LineCount,
    /// Lines removed or changed.
    pub removed: LineCount,
}

/// Read-only access to a version-control history.
///
/// Every method fails with [`halflife_core::HalfLifeError`] when the
/// underlying history cannot answer (unknown revision, unreadable tree).
/// Callers propagate such failures; they are never treated as "no change".
pub trait RepositoryQuery {
    /// Resolve a treeish to the canonical identifier of its commit.
    fn resolve(&self, treeish: &str) -> Result<Revision>;

    /// Files present at `revision` that match `selector`.
    fn list_files(&self, revision: &Revision, selector: &PathSelector) -> Result<Vec<String>>;

    /// Paths that differ between two revisions, whatever the change status.
    fn changed_files(&self, from: &Revision, to: &Revision) -> Result<Vec<String>>;

    /// Added/removed line counts between two revisions for `files` only.
    /// Files without changes are omitted.
    fn line_diff_stat(&self, from: &Revision, to: &Revision, files: &[String])
        -> Result<Vec<NumStat>>;

    /// Revisions reachable from `to` but not from `from`, oldest first,
    /// restricted to those touching `selector`. Excludes `from`; includes
    /// `to` when it touches the selector.
    fn revisions_between(
        &self,
        from: &Revision,
        to: &Revision,
        selector: &PathSelector,
    ) -> Result<Vec<Revision>>;

    /// Commit date of `revision`, in the committer's own UTC offset.
    fn commit_date(&self, revision: &Revision) -> Result<DateTime<FixedOffset>>;

    /// Number of lines in `path` as of `revision`.
    fn file_line_count(&self, revision: &Revision, path: &str) -> Result<u64>;
}

impl<Q: RepositoryQuery + ?Sized> RepositoryQuery for &Q {
    fn resolve(&self, treeish: &str) -> Result<Revision> {
        (**self).resolve(treeish)
    }

    fn list_files(&self, revision: &Revision, selector: &PathSelector) -> Result<Vec<String>> {
        (**self).list_files(revision, selector)
    }

    fn changed_files(&self, from: &Revision, to: &Revision) -> Result<Vec<String>> {
        (**self).changed_files(from, to)
    }

    fn line_diff_stat(
        &self,
        from: &Revision,
        to: &Revision,
        files: &[String],
    ) -> Result<Vec<NumStat>> {
        (**self).line_diff_stat(from, to, files)
    }

    fn revisions_between(
        &self,
        from: &Revision,
        to: &Revision,
        selector: &PathSelector,
    ) -> Result<Vec<Revision>> {
        (**self).revisions_between(from, to, selector)
    }

    fn commit_date(&self, revision: &Revision) -> Result<DateTime<FixedOffset>> {
        (**self).commit_date(revision)
    }

    fn file_line_count(&self, revision: &Revision, path: &str) -> Result<u64> {
        (**self).file_line_count(revision, path)
    }
}

/// Count lines the way `splitlines` does for `\n`-separated content: every
/// newline ends a line, and trailing bytes without one form a final line.
///
/// # Examples
///
/// ```
/// use halflife_history::query::count_lines;
///
/// assert_eq!(count_lines(b""), 0);
/// assert_eq!(count_lines(b"one\ntwo\n"), 2);
/// assert_eq!(count_lines(b"one\ntwo"), 2);
/// ```
pub fn count_lines(content: &[u8]) -> u64 {
    let newlines = content.iter().filter(|&&b| b == b'\n').count() as u64;
    match content.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_lines_handles_blank_lines() {
        assert_eq!(count_lines(b"\n\n\n"), 3);
        assert_eq!(count_lines(b"x"), 1);
    }

    #[test]
    fn binary_marker_counts_as_zero() {
        let stat = NumStat {
            path: "logo.png".into(),
            added: LineCount::Binary,
            removed: LineCount::Binary,
        };
        assert_eq!(stat.removed.count(), 0);
        assert_eq!(stat.added.count(), 0);
    }
}
