//! [`RepositoryQuery`] over a real git repository via git2.

use std::path::Path;

use chrono::{DateTime, FixedOffset, TimeZone};
use git2::{
    Commit, Diff, DiffOptions, ObjectType, Patch, Repository, Sort, Tree, TreeWalkMode,
    TreeWalkResult,
};
use halflife_core::{HalfLifeError, PathSelector, Result, Revision};

use crate::query::{count_lines, LineCount, NumStat, RepositoryQuery};

/// A git repository opened for history queries.
///
/// Every query resolves its revisions afresh, so any treeish git accepts
/// (hash, branch, tag, `HEAD~3`) works wherever a [`Revision`] is expected.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use halflife_core::{PathSelector, Revision};
/// use halflife_history::git::GitHistory;
/// use halflife_history::query::RepositoryQuery;
///
/// let history = GitHistory::open(Path::new(".")).unwrap();
/// let head = history.resolve("HEAD").unwrap();
/// let files = history.list_files(&head, &PathSelector::new("src")).unwrap();
/// println!("{} files under src at {head}", files.len());
/// ```
pub struct GitHistory {
    repo: Repository,
}

impl GitHistory {
    /// Open the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HalfLifeError::Git`] if no repository is found.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|e| {
            HalfLifeError::Git(format!(
                "failed to open repository at {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self { repo })
    }

    fn commit(&self, revision: &Revision) -> Result<Commit<'_>> {
        let object = self
            .repo
            .revparse_single(revision.as_str())
            .map_err(|_| HalfLifeError::RevisionNotFound {
                revision: revision.to_string(),
            })?;
        object.peel_to_commit().map_err(|e| {
            HalfLifeError::Git(format!("failed to peel '{revision}' to a commit: {e}"))
        })
    }

    fn tree(&self, revision: &Revision) -> Result<Tree<'_>> {
        self.commit(revision)?
            .tree()
            .map_err(|e| HalfLifeError::Git(format!("failed to get tree of '{revision}': {e}")))
    }

    fn diff(&self, from: &Revision, to: &Revision, paths: Option<&[String]>) -> Result<Diff<'_>> {
        let old_tree = self.tree(from)?;
        let new_tree = self.tree(to)?;

        let mut diff_opts = DiffOptions::new();
        if let Some(paths) = paths {
            diff_opts.disable_pathspec_match(true);
            for path in paths {
                diff_opts.pathspec(path);
            }
        }

        self.repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), Some(&mut diff_opts))
            .map_err(|e| {
                HalfLifeError::Git(format!("failed to diff '{from}' against '{to}': {e}"))
            })
    }

    /// Whether `commit` changes anything under `selector` relative to its
    /// first parent. Root commits are compared against the empty tree.
    fn touches(&self, commit: &Commit<'_>, selector: &PathSelector) -> Result<bool> {
        let tree = commit
            .tree()
            .map_err(|e| HalfLifeError::Git(format!("failed to get commit tree: {e}")))?;
        let parent_tree = if commit.parent_count() > 0 {
            let parent = commit
                .parent(0)
                .map_err(|e| HalfLifeError::Git(format!("failed to get parent: {e}")))?;
            Some(
                parent
                    .tree()
                    .map_err(|e| HalfLifeError::Git(format!("failed to get parent tree: {e}")))?,
            )
        } else {
            None
        };

        let mut diff_opts = DiffOptions::new();
        diff_opts.disable_pathspec_match(true);
        diff_opts.pathspec(selector.as_str());
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))
            .map_err(|e| HalfLifeError::Git(format!("failed to compute diff: {e}")))?;

        Ok(diff.deltas().any(|delta| {
            [delta.old_file().path(), delta.new_file().path()]
                .into_iter()
                .flatten()
                .any(|p| selector.matches(&p.to_string_lossy()))
        }))
    }
}

impl RepositoryQuery for GitHistory {
    fn resolve(&self, treeish: &str) -> Result<Revision> {
        let commit = self.commit(&Revision::from(treeish))?;
        Ok(Revision::new(commit.id().to_string()))
    }

    fn list_files(&self, revision: &Revision, selector: &PathSelector) -> Result<Vec<String>> {
        let tree = self.tree(revision)?;
        let mut files = Vec::new();

        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            let Some(name) = entry.name() else {
                return TreeWalkResult::Ok;
            };
            let path = format!("{root}{name}");
            match entry.kind() {
                Some(ObjectType::Tree) => {
                    // Skip directories that neither lie inside the selector
                    // nor lead towards it.
                    let leads_to_selector = selector
                        .as_str()
                        .strip_prefix(path.as_str())
                        .is_some_and(|rest| rest.starts_with('/'));
                    if selector.matches(&path) || leads_to_selector {
                        TreeWalkResult::Ok
                    } else {
                        TreeWalkResult::Skip
                    }
                }
                Some(ObjectType::Blob) => {
                    if selector.matches(&path) {
                        files.push(path);
                    }
                    TreeWalkResult::Ok
                }
                _ => TreeWalkResult::Ok,
            }
        })
        .map_err(|e| HalfLifeError::Git(format!("failed to walk tree of '{revision}': {e}")))?;

        Ok(files)
    }

    fn changed_files(&self, from: &Revision, to: &Revision) -> Result<Vec<String>> {
        let diff = self.diff(from, to, None)?;
        Ok(diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(|p| p.to_string_lossy().to_string())
            .collect())
    }

    fn line_diff_stat(
        &self,
        from: &Revision,
        to: &Revision,
        files: &[String],
    ) -> Result<Vec<NumStat>> {
        // An empty pathspec would diff the whole tree.
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let diff = self.diff(from, to, Some(files))?;
        let mut stats = Vec::new();

        for idx in 0..diff.deltas().len() {
            let Some(delta) = diff.get_delta(idx) else {
                continue;
            };
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .unwrap_or(Path::new(""))
                .to_string_lossy()
                .to_string();

            let patch = Patch::from_diff(&diff, idx)
                .map_err(|e| HalfLifeError::Git(format!("failed to load patch for {path}: {e}")))?;

            let stat = match patch {
                Some(patch) if !patch.delta().flags().is_binary() => {
                    let (_, added, removed) = patch.line_stats().map_err(|e| {
                        HalfLifeError::Git(format!("failed to count lines for {path}: {e}"))
                    })?;
                    NumStat {
                        path,
                        added: LineCount::Lines(added as u64),
                        removed: LineCount::Lines(removed as u64),
                    }
                }
                _ => NumStat {
                    path,
                    added: LineCount::Binary,
                    removed: LineCount::Binary,
                },
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
        let from_oid = self.commit(from)?.id();
        let to_oid = self.commit(to)?.id();

        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| HalfLifeError::Git(format!("failed to create revwalk: {e}")))?;
        revwalk
            .set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)
            .map_err(|e| HalfLifeError::Git(format!("failed to sort revwalk: {e}")))?;
        revwalk
            .push(to_oid)
            .map_err(|e| HalfLifeError::Git(format!("failed to push '{to}': {e}")))?;
        revwalk
            .hide(from_oid)
            .map_err(|e| HalfLifeError::Git(format!("failed to hide '{from}': {e}")))?;

        let mut revisions = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result.map_err(|e| HalfLifeError::Git(format!("revwalk error: {e}")))?;
            if !selector.is_everything() {
                let commit = self
                    .repo
                    .find_commit(oid)
                    .map_err(|e| HalfLifeError::Git(format!("failed to find commit: {e}")))?;
                if !self.touches(&commit, selector)? {
                    continue;
                }
            }
            revisions.push(Revision::new(oid.to_string()));
        }

        Ok(revisions)
    }

    fn commit_date(&self, revision: &Revision) -> Result<DateTime<FixedOffset>> {
        let time = self.commit(revision)?.committer().when();
        let offset = FixedOffset::east_opt(time.offset_minutes() * 60).ok_or_else(|| {
            HalfLifeError::Git(format!(
                "commit '{revision}' has an invalid UTC offset of {} minutes",
                time.offset_minutes()
            ))
        })?;
        offset
            .timestamp_opt(time.seconds(), 0)
            .single()
            .ok_or_else(|| {
                HalfLifeError::Git(format!("commit '{revision}' has an invalid timestamp"))
            })
    }

    fn file_line_count(&self, revision: &Revision, path: &str) -> Result<u64> {
        let tree = self.tree(revision)?;
        let entry = tree.get_path(Path::new(path)).map_err(|e| {
            HalfLifeError::Git(format!("failed to find '{path}' in '{revision}': {e}"))
        })?;
        let blob = self.repo.find_blob(entry.id()).map_err(|e| {
            HalfLifeError::Git(format!("failed to read blob for '{path}': {e}"))
        })?;
        Ok(count_lines(blob.content()))
    }
}
