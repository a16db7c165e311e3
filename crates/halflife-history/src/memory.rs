//! A synthetic, linear, in-memory history.
//!
//! [`MemoryHistory`] implements [`RepositoryQuery`] without git, and records
//! every query it answers so callers can check which baselines were captured
//! and in which order candidates were probed. Line statistics use a multiset
//! comparison of line texts, which matches a real diff whenever changed lines
//! carry distinct text.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Range;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use halflife_core::{HalfLifeError, PathSelector, Result, Revision};

use crate::query::{count_lines, LineCount, NumStat, RepositoryQuery};

/// Seconds between consecutive synthetic commits.
const COMMIT_SPACING_SECS: i64 = 86_400;

/// 2020-01-01T00:00:00Z, the date of the first synthetic commit.
const FIRST_COMMIT_EPOCH: i64 = 1_577_836_800;

/// Contents of one synthetic file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Line-oriented text.
    Text(Vec<String>),
    /// Content that is not line-countable.
    Binary(Vec<u8>),
}

/// The file tree of one synthetic commit, edited while building history.
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    files: BTreeMap<String, FileContent>,
}

impl MemoryTree {
    /// Create or overwrite a text file.
    pub fn write_lines<I, S>(&mut self, path: &str, lines: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines = lines.into_iter().map(Into::into).collect();
        self.files.insert(path.to_string(), FileContent::Text(lines));
        self
    }

    /// Create or overwrite a text file of `count` distinct lines, each
    /// prefixed with `tag`.
    pub fn write_numbered(&mut self, path: &str, tag: &str, count: usize) -> &mut Self {
        self.write_lines(path, (0..count).map(|i| format!("{tag}-{i}")))
    }

    /// Rewrite the lines at `range` of an existing text file with fresh
    /// text tagged `tag`. Lines outside the file are ignored.
    pub fn rewrite_lines(&mut self, path: &str, range: Range<usize>, tag: &str) -> &mut Self {
        if let Some(FileContent::Text(lines)) = self.files.get_mut(path) {
            let end = range.end.min(lines.len());
            for i in range.start.min(end)..end {
                lines[i] = format!("{tag}-{i}");
            }
        }
        self
    }

    /// Create or overwrite a binary file.
    pub fn write_binary(&mut self, path: &str, bytes: &[u8]) -> &mut Self {
        self.files
            .insert(path.to_string(), FileContent::Binary(bytes.to_vec()));
        self
    }

    /// Delete a file.
    pub fn remove(&mut self, path: &str) -> &mut Self {
        self.files.remove(path);
        self
    }
}

#[derive(Debug, Clone)]
struct MemoryCommit {
    id: Revision,
    timestamp: i64,
    tree: MemoryTree,
}

/// One query answered by a [`MemoryHistory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryCall {
    /// `resolve(treeish)`
    Resolve(String),
    /// `list_files(revision, _)`
    ListFiles(Revision),
    /// `changed_files(from, to)`
    ChangedFiles(Revision, Revision),
    /// `line_diff_stat(from, to, _)`
    LineDiffStat(Revision, Revision),
    /// `revisions_between(from, to, _)`
    RevisionsBetween(Revision, Revision),
    /// `commit_date(revision)`
    CommitDate(Revision),
    /// `file_line_count(revision, path)`
    FileLineCount(Revision, String),
}

/// A linear history held in memory.
///
/// # Examples
///
/// ```
/// use halflife_core::PathSelector;
/// use halflife_history::memory::MemoryHistory;
/// use halflife_history::query::RepositoryQuery;
///
/// let mut history = MemoryHistory::new();
/// let base = history.commit("base", |tree| {
///     tree.write_numbered("src/lib.rs", "orig", 10);
/// });
/// let next = history.commit("next", |tree| {
///     tree.rewrite_lines("src/lib.rs", 0..6, "new");
/// });
///
/// let window = history
///     .revisions_between(&base, &next, &PathSelector::new("src"))
///     .unwrap();
/// assert_eq!(window, vec![next]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryHistory {
    commits: Vec<MemoryCommit>,
    index: HashMap<Revision, usize>,
    failing: BTreeSet<Revision>,
    calls: RefCell<Vec<QueryCall>>,
}

impl MemoryHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a commit whose tree is the previous tree edited by `edit`.
    ///
    /// Commits are spaced one day apart starting 2020-01-01 UTC.
    pub fn commit(&mut self, id: &str, edit: impl FnOnce(&mut MemoryTree)) -> Revision {
        let mut tree = self
            .commits
            .last()
            .map(|c| c.tree.clone())
            .unwrap_or_default();
        edit(&mut tree);

        let revision = Revision::from(id);
        let timestamp = FIRST_COMMIT_EPOCH + self.commits.len() as i64 * COMMIT_SPACING_SECS;
        self.index.insert(revision.clone(), self.commits.len());
        self.commits.push(MemoryCommit {
            id: revision.clone(),
            timestamp,
            tree,
        });
        revision
    }

    /// Make every query that names `revision` fail with a git error.
    pub fn fail_on(&mut self, revision: &Revision) {
        self.failing.insert(revision.clone());
    }

    /// Queries answered so far, in order.
    pub fn calls(&self) -> Vec<QueryCall> {
        self.calls.borrow().clone()
    }

    /// Revisions captured as baselines so far, in order.
    pub fn listed_baselines(&self) -> Vec<Revision> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                QueryCall::ListFiles(rev) => Some(rev.clone()),
                _ => None,
            })
            .collect()
    }

    /// Candidate revisions diffed so far, in order.
    pub fn probed_targets(&self) -> Vec<Revision> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                QueryCall::ChangedFiles(_, to) => Some(to.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: QueryCall) {
        self.calls.borrow_mut().push(call);
    }

    fn position(&self, revision: &Revision) -> Result<usize> {
        if self.failing.contains(revision) {
            return Err(HalfLifeError::Git(format!(
                "failed to read object for '{revision}'"
            )));
        }
        self.index
            .get(revision)
            .copied()
            .ok_or_else(|| HalfLifeError::RevisionNotFound {
                revision: revision.to_string(),
            })
    }

    fn tree(&self, revision: &Revision) -> Result<&MemoryTree> {
        let idx = self.position(revision)?;
        Ok(&self.commits[idx].tree)
    }

    fn touches(&self, idx: usize, selector: &PathSelector) -> bool {
        let empty = MemoryTree::default();
        let before = if idx == 0 {
            &empty
        } else {
            &self.commits[idx - 1].tree
        };
        let after = &self.commits[idx].tree;
        differing_paths(before, after)
            .iter()
            .any(|path| selector.matches(path))
    }
}

fn differing_paths(old: &MemoryTree, new: &MemoryTree) -> Vec<String> {
    let paths: BTreeSet<&String> = old.files.keys().chain(new.files.keys()).collect();
    paths
        .into_iter()
        .filter(|path| old.files.get(*path) != new.files.get(*path))
        .cloned()
        .collect()
}

/// Lines of `a` with no counterpart in `b`, treating both as multisets.
fn unmatched_lines(a: &[String], b: &[String]) -> u64 {
    let mut available: HashMap<&str, usize> = HashMap::new();
    for line in b {
        *available.entry(line.as_str()).or_default() += 1;
    }
    let mut unmatched = 0;
    for line in a {
        match available.get_mut(line.as_str()) {
            Some(n) if *n > 0 => *n -= 1,
            _ => unmatched += 1,
        }
    }
    unmatched
}

impl RepositoryQuery for MemoryHistory {
    fn resolve(&self, treeish: &str) -> Result<Revision> {
        self.record(QueryCall::Resolve(treeish.to_string()));
        let revision = Revision::from(treeish);
        self.position(&revision)?;
        Ok(revision)
    }

    fn list_files(&self, revision: &Revision, selector: &PathSelector) -> Result<Vec<String>> {
        self.record(QueryCall::ListFiles(revision.clone()));
        let tree = self.tree(revision)?;
        Ok(tree
            .files
            .keys()
            .filter(|path| selector.matches(path))
            .cloned()
            .collect())
    }

    fn changed_files(&self, from: &Revision, to: &Revision) -> Result<Vec<String>> {
        self.record(QueryCall::ChangedFiles(from.clone(), to.clone()));
        Ok(differing_paths(self.tree(from)?, self.tree(to)?))
    }

    fn line_diff_stat(
        &self,
        from: &Revision,
        to: &Revision,
        files: &[String],
    ) -> Result<Vec<NumStat>> {
        self.record(QueryCall::LineDiffStat(from.clone(), to.clone()));
        let old = self.tree(from)?;
        let new = self.tree(to)?;
        let no_lines: Vec<String> = Vec::new();

        let mut stats = Vec::new();
        for path in files {
            let before = old.files.get(path);
            let after = new.files.get(path);
            if before == after {
                continue;
            }
            let stat = match (before, after) {
                (Some(FileContent::Binary(_)), _) | (_, Some(FileContent::Binary(_))) => NumStat {
                    path: path.clone(),
                    added: LineCount::Binary,
                    removed: LineCount::Binary,
                },
                _ => {
                    let old_lines = match before {
                        Some(FileContent::Text(lines)) => lines,
                        _ => &no_lines,
                    };
                    let new_lines = match after {
                        Some(FileContent::Text(lines)) => lines,
                        _ => &no_lines,
                    };
                    NumStat {
                        path: path.clone(),
                        added: LineCount::Lines(unmatched_lines(new_lines, old_lines)),
                        removed: LineCount::Lines(unmatched_lines(old_lines, new_lines)),
                    }
                }
            };
            stats.push(stat);
        }
        Ok(stats)
    }

    fn revisions_between(
        &self,
        from: &Revision,
        to: &Revision,
        selector: &PathSelector,
    ) -> Result<Vec<Revision>> {
        self.record(QueryCall::RevisionsBetween(from.clone(), to.clone()));
        let start = self.position(from)?;
        let end = self.position(to)?;
        if start >= end {
            return Ok(Vec::new());
        }
        Ok((start + 1..=end)
            .filter(|&idx| self.touches(idx, selector))
            .map(|idx| self.commits[idx].id.clone())
            .collect())
    }

    fn commit_date(&self, revision: &Revision) -> Result<DateTime<FixedOffset>> {
        self.record(QueryCall::CommitDate(revision.clone()));
        let idx = self.position(revision)?;
        let timestamp = self.commits[idx].timestamp;
        Utc.timestamp_opt(timestamp, 0)
            .single()
            .map(|date| date.fixed_offset())
            .ok_or_else(|| HalfLifeError::Git(format!("invalid timestamp for '{revision}'")))
    }

    fn file_line_count(&self, revision: &Revision, path: &str) -> Result<u64> {
        self.record(QueryCall::FileLineCount(revision.clone(), path.to_string()));
        match self.tree(revision)?.files.get(path) {
            Some(FileContent::Text(lines)) => Ok(lines.len() as u64),
            Some(FileContent::Binary(bytes)) => Ok(count_lines(bytes)),
            None => Err(HalfLifeError::Git(format!(
                "failed to find '{path}' in '{revision}'"
            ))),
        }
    }
}
