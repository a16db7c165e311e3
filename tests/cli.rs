use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use git2::{Commit, Repository, Signature, Time};

fn lines(tag: &str, count: usize) -> String {
    (0..count).map(|i| format!("{tag} {i}\n")).collect()
}

/// Commit the current work tree of `repo`, `hour` hours after a fixed epoch.
fn commit_all(repo: &Repository, message: &str, hour: i64) -> String {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let time = Time::new(1_600_000_000 + hour * 3600, 0);
    let sig = Signature::new("Test", "test@example.com", &time).unwrap();
    let parents: Vec<Commit<'_>> = repo
        .head()
        .ok()
        .and_then(|head| head.peel_to_commit().ok())
        .into_iter()
        .collect();
    let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
        .to_string()
}

/// A repository where `lib/core.c` (20 lines) is rewritten 6 lines at a
/// time: the half-point of the first commit is the second rewrite.
fn churned_repo(dir: &Path) -> Vec<String> {
    let repo = Repository::init(dir).unwrap();
    fs::create_dir_all(dir.join("lib")).unwrap();
    let mut content: Vec<String> = lines("orig", 20).lines().map(String::from).collect();
    fs::write(dir.join("lib/core.c"), content.join("\n") + "\n").unwrap();
    let mut revs = vec![commit_all(&repo, "initial", 0)];

    for step in 0..3 {
        for i in step * 6..step * 6 + 6 {
            content[i] = format!("step{step} {i}");
        }
        fs::write(dir.join("lib/core.c"), content.join("\n") + "\n").unwrap();
        revs.push(commit_all(&repo, &format!("rewrite {step}"), step as i64 + 1));
    }
    revs
}

fn halflife(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_halflife"))
        .args(args)
        .arg("--repo")
        .arg(dir)
        .current_dir(dir)
        .output()
        .unwrap()
}

#[test]
fn single_commit_reports_half_point() {
    let dir = tempfile::tempdir().unwrap();
    let revs = churned_repo(dir.path());

    let output = halflife(dir.path(), &["-s", "lib", &revs[0], "HEAD"]);
    assert!(
        output.status.success(),
        "halflife failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("reached half point for {}", revs[0])));
    assert!(stdout.contains("(2 commits)"));
}

#[test]
fn missing_half_point_still_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let revs = churned_repo(dir.path());

    let output = halflife(dir.path(), &["--single-commit", "lib", &revs[0], &revs[1]]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("no half point found for {}", revs[0])));
}

#[test]
fn logarithmic_mode_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    let revs = churned_repo(dir.path());
    let out = dir.path().join("results.csv");

    let output = halflife(
        dir.path(),
        &["--ll", "--fast", "lib", &revs[0], "HEAD", "-o", out.to_str().unwrap()],
    );
    assert!(output.status.success());

    let csv = fs::read_to_string(&out).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows[0], "startRevision,dateOfStart,dateOfHalfPoint,commitsElapsed");
    assert!(rows[1].starts_with(&revs[0]));
    assert!(rows[1].ends_with(",2"));
}

#[test]
fn unwritable_output_does_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let revs = churned_repo(dir.path());

    let output = halflife(
        dir.path(),
        &["-l", "lib", &revs[0], "HEAD", "-o", "/nonexistent/dir/out.csv"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("continuing without a result file"));
}

#[test]
fn unknown_revision_fails() {
    let dir = tempfile::tempdir().unwrap();
    churned_repo(dir.path());

    let output = halflife(dir.path(), &["-s", "lib", "no-such-tag", "HEAD"]);
    assert!(!output.status.success());
}

#[test]
fn a_mode_is_required() {
    let dir = tempfile::tempdir().unwrap();
    churned_repo(dir.path());

    let output = halflife(dir.path(), &["lib", "HEAD~1", "HEAD"]);
    assert!(!output.status.success());

    let output = halflife(dir.path(), &["-s", "-l", "lib", "HEAD~1", "HEAD"]);
    assert!(!output.status.success());
}

#[test]
fn estimate_is_printed_on_request() {
    let dir = tempfile::tempdir().unwrap();
    let revs = churned_repo(dir.path());

    let output = halflife(dir.path(), &["-s", "--estimate", "lib", &revs[0], &revs[2]]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("estimated half-life:"));
    assert!(stdout.contains("12 of 20 lines changed over 2 commits"));
}

#[test]
fn config_file_sets_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let revs = churned_repo(dir.path());
    fs::write(dir.path().join(".halflife.toml"), "[report]\nverbosity = 1\n").unwrap();

    let output = halflife(dir.path(), &["-s", "lib", &revs[0], "HEAD"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("number of lines in all files: 20"));
}
