use std::fs;
use std::path::Path;

use git2::{Commit, Oid, Repository, Signature, Time};
use halflife_core::{
    format_commit_date, HalfLifeError, Logger, PathSelector, Revision, RunMode, SearchMode,
};
use halflife_history::git::GitHistory;
use halflife_history::orchestrate::Orchestrator;
use halflife_history::query::{LineCount, RepositoryQuery};
use halflife_history::search::HalfLifeSearch;
use halflife_history::sink::CsvSink;

/// 2021-06-01T00:00:00Z
const EPOCH: i64 = 1_622_505_600;

fn numbered(tag: &str, range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("{tag} line {i}")).collect()
}

fn text(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

struct TestRepo {
    dir: tempfile::TempDir,
    repo: Repository,
    commits: usize,
}

impl TestRepo {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self {
            dir,
            repo,
            commits: 0,
        }
    }

    fn write(&self, path: &str, content: &[u8]) {
        let full = self.dir.path().join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }

    /// Stage everything in the work tree and commit it one hour after the
    /// previous commit, in a +01:00 timezone.
    fn commit(&mut self, message: &str) -> Revision {
        let mut index = self.repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.update_all(["*"].iter(), None).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let time = Time::new(EPOCH + self.commits as i64 * 3600, 60);
        let sig = Signature::new("Test", "test@example.com", &time).unwrap();
        let parents: Vec<Commit<'_>> = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();
        let oid: Oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap();
        self.commits += 1;
        Revision::new(oid.to_string())
    }

    fn history(&self) -> GitHistory {
        GitHistory::open(self.dir.path()).unwrap()
    }
}

/// Three files totalling 100 lines, then three commits bringing the tally
/// against the baseline to 40, 55 and 70 changed lines.
fn three_step_repo() -> (TestRepo, Vec<Revision>) {
    let mut repo = TestRepo::new();
    let a = numbered("a", 0..50);
    let b = numbered("b", 0..30);
    let c = numbered("c", 0..20);
    repo.write("src/a.rs", text(&a).as_bytes());
    repo.write("src/b.rs", text(&b).as_bytes());
    repo.write("src/c.rs", text(&c).as_bytes());
    repo.write("README.md", b"readme\n");
    let base = repo.commit("base");

    let mut a1 = numbered("a-r1", 0..40);
    a1.extend_from_slice(&a[40..]);
    repo.write("src/a.rs", text(&a1).as_bytes());
    let r1 = repo.commit("r1");

    let mut b2 = numbered("b-r2", 0..15);
    b2.extend_from_slice(&b[15..]);
    repo.write("src/b.rs", text(&b2).as_bytes());
    let r2 = repo.commit("r2");

    let mut c3 = numbered("c-r3", 0..15);
    c3.extend_from_slice(&c[15..]);
    repo.write("src/c.rs", text(&c3).as_bytes());
    let r3 = repo.commit("r3");

    (repo, vec![base, r1, r2, r3])
}

#[test]
fn finds_half_point_in_both_modes() {
    let (repo, revs) = three_step_repo();
    let history = repo.history();
    let search = HalfLifeSearch::new(&history, PathSelector::new("src"), Logger::silent());

    for mode in [SearchMode::Linear, SearchMode::Logarithmic] {
        let result = search.find(&revs[0], &revs[3], mode).unwrap();
        let half_point = result.half_point.expect("half point");
        assert_eq!(half_point.revision, revs[2]);
        assert_eq!(half_point.commits_elapsed, 2);
        assert_eq!(
            format_commit_date(&half_point.half_point_date),
            "2021-06-01 03:00:00 +0100"
        );
    }
}

#[test]
fn lists_files_and_counts_lines_within_selector() {
    let (repo, revs) = three_step_repo();
    let history = repo.history();

    let files = history.list_files(&revs[0], &PathSelector::new("src/")).unwrap();
    assert_eq!(files, vec!["src/a.rs", "src/b.rs", "src/c.rs"]);

    let everything = history.list_files(&revs[0], &PathSelector::new(".")).unwrap();
    assert_eq!(everything.len(), 4);

    assert_eq!(history.file_line_count(&revs[0], "src/a.rs").unwrap(), 50);
}

#[test]
fn numstat_reports_removed_lines() {
    let (repo, revs) = three_step_repo();
    let history = repo.history();
    let stats = history
        .line_diff_stat(
            &revs[0],
            &revs[2],
            &["src/a.rs".to_string(), "src/c.rs".to_string()],
        )
        .unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].path, "src/a.rs");
    assert_eq!(stats[0].removed, LineCount::Lines(40));
    assert_eq!(stats[0].added, LineCount::Lines(40));
}

#[test]
fn binary_files_yield_marker() {
    let mut repo = TestRepo::new();
    repo.write("img/logo.bin", &[0, 159, 146, 150, 0, 1]);
    let base = repo.commit("add logo");
    repo.write("img/logo.bin", &[0, 1, 2, 3, 0, 9, 9]);
    let next = repo.commit("new logo");

    let history = repo.history();
    let stats = history
        .line_diff_stat(&base, &next, &["img/logo.bin".to_string()])
        .unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].removed, LineCount::Binary);
    assert_eq!(stats[0].removed.count(), 0);
}

#[test]
fn window_skips_commits_outside_selector() {
    let (mut repo, revs) = three_step_repo();
    repo.write("README.md", b"readme\nmore\n");
    let docs = repo.commit("docs only");

    let history = repo.history();
    let window = history
        .revisions_between(&revs[0], &docs, &PathSelector::new("src"))
        .unwrap();
    assert_eq!(window, revs[1..].to_vec());

    let everything = history
        .revisions_between(&revs[0], &docs, &PathSelector::new(""))
        .unwrap();
    assert_eq!(everything.len(), 4);
    assert_eq!(everything.last(), Some(&docs));
}

#[test]
fn glob_characters_in_selector_match_literally() {
    let mut repo = TestRepo::new();
    let original = numbered("x", 0..10);
    repo.write("app/[slug]/page.tsx", text(&original).as_bytes());
    repo.write("app/s/page.tsx", b"sibling\n");
    let base = repo.commit("add route");

    repo.write("app/s/page.tsx", b"sibling\nchanged\n");
    let sibling = repo.commit("touch sibling only");

    repo.write("app/[slug]/page.tsx", text(&numbered("y", 0..10)).as_bytes());
    let rewrite = repo.commit("rewrite route");

    let history = repo.history();
    let selector = PathSelector::new("app/[slug]");
    assert_eq!(
        history.list_files(&base, &selector).unwrap(),
        vec!["app/[slug]/page.tsx"]
    );
    assert_eq!(
        history.revisions_between(&base, &rewrite, &selector).unwrap(),
        vec![rewrite.clone()]
    );
    assert!(history
        .revisions_between(&base, &sibling, &selector)
        .unwrap()
        .is_empty());

    let search = HalfLifeSearch::new(&history, selector, Logger::silent());
    for mode in [SearchMode::Linear, SearchMode::Logarithmic] {
        let result = search.find(&base, &rewrite, mode).unwrap();
        let half_point = result.half_point.expect("half point");
        assert_eq!(half_point.revision, rewrite);
        assert_eq!(half_point.commits_elapsed, 1);
    }
}

#[test]
fn treeish_names_resolve_to_full_ids() {
    let (repo, revs) = three_step_repo();
    let history = repo.history();
    assert_eq!(history.resolve("HEAD").unwrap(), revs[3]);
    assert_eq!(history.resolve("HEAD~3").unwrap(), revs[0]);
}

#[test]
fn unknown_revision_is_an_error_not_a_miss() {
    let (repo, revs) = three_step_repo();
    let history = repo.history();
    let search = HalfLifeSearch::new(&history, PathSelector::new("src"), Logger::silent());
    let err = search
        .find(&Revision::from("no-such-branch"), &revs[3], SearchMode::Linear)
        .unwrap_err();
    assert!(matches!(err, HalfLifeError::RevisionNotFound { .. }));
}

#[test]
fn logarithmic_run_writes_csv() {
    let (repo, revs) = three_step_repo();
    let history = repo.history();
    let out = repo.dir.path().join("out.csv");

    let mut sink = CsvSink::create(&out).unwrap();
    let orchestrator = Orchestrator::new(
        &history,
        PathSelector::new("src"),
        SearchMode::Logarithmic,
        Logger::silent(),
    );
    let results = orchestrator
        .run(RunMode::Logarithmic, &revs[0], &revs[3], Some(&mut sink))
        .unwrap();
    drop(sink);

    assert_eq!(results.len(), 2);
    let csv = fs::read_to_string(Path::new(&out)).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows[0], "startRevision,dateOfStart,dateOfHalfPoint,commitsElapsed");
    assert_eq!(
        rows[1],
        format!("{},2021-06-01 01:00:00 +0100,2021-06-01 03:00:00 +0100,2", revs[0])
    );
    assert_eq!(rows.len(), 2);
}
