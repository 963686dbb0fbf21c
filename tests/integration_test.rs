// tests/integration_test.rs
use git2::{Oid, Repository, Signature};
use git_release::domain::{ReleasePolicy, VersionToken};
use git_release::git::{Git2Repository, Repository as _};
use git_release::workflow::{publish, ReleaseWorkflow, WorkflowStep};
use git_release::ReleaseError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A working clone with `develop` pushed to a bare `origin`
struct Fixture {
    _temp: TempDir,
    remote_path: PathBuf,
    work_path: PathBuf,
}

impl Fixture {
    fn work(&self) -> Repository {
        Repository::open(&self.work_path).expect("Could not open work repo")
    }

    fn remote(&self) -> Repository {
        Repository::open_bare(&self.remote_path).expect("Could not open remote repo")
    }

    fn adapter(&self) -> Git2Repository {
        Git2Repository::open(&self.work_path).expect("Could not open adapter")
    }
}

fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> Oid {
    let workdir = repo.workdir().expect("work repo has a workdir");
    fs::write(workdir.join(name), content).expect("Could not write file");

    let mut index = repo.index().expect("Could not get index");
    index.add_path(Path::new(name)).expect("Could not add file to index");
    index.write().expect("Could not write index");

    let tree_id = index.write_tree().expect("Could not write tree");
    let tree = repo.find_tree(tree_id).expect("Could not find tree");
    let sig = Signature::now("Test User", "test@example.com").expect("Could not create sig");

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Could not create commit")
}

fn push_refspec(repo: &Repository, refspec: &str) {
    let mut remote = repo.find_remote("origin").expect("origin exists");
    remote.push(&[refspec], None).expect("Could not push");
}

fn ref_target(repo: &Repository, name: &str) -> Option<Oid> {
    repo.find_reference(name).ok().and_then(|r| r.target())
}

fn setup() -> (Fixture, Oid) {
    let temp = TempDir::new().expect("Could not create temp dir");
    let remote_path = temp.path().join("origin.git");
    let work_path = temp.path().join("work");

    Repository::init_bare(&remote_path).expect("Could not init bare remote");
    let work = Repository::init(&work_path).expect("Could not init work repo");
    work.set_head("refs/heads/develop").expect("Could not point HEAD at develop");

    let commit = commit_file(&work, "README.md", "Initial content\n", "Initial commit");

    work.remote("origin", remote_path.to_str().expect("utf-8 temp path"))
        .expect("Could not add origin");
    push_refspec(&work, "refs/heads/develop:refs/heads/develop");

    let fixture = Fixture {
        _temp: temp,
        remote_path,
        work_path,
    };
    (fixture, commit)
}

#[test]
fn test_major_release_publishes_branch_and_tag() {
    let (fixture, c) = setup();
    let repo = fixture.adapter();

    let outcome = publish(&repo, ReleasePolicy::default(), "2").expect("major release");
    assert_eq!(outcome.tag, "v2.0");
    assert_eq!(outcome.branch, "release/v2");

    let work = fixture.work();
    assert_eq!(ref_target(&work, "refs/heads/release/v2"), Some(c));
    assert_eq!(ref_target(&work, "refs/tags/v2.0"), Some(c));

    let remote = fixture.remote();
    assert_eq!(ref_target(&remote, "refs/heads/release/v2"), Some(c));
    assert_eq!(ref_target(&remote, "refs/tags/v2.0"), Some(c));
    assert_eq!(ref_target(&remote, "refs/heads/develop"), Some(c));
}

#[test]
fn test_minor_release_fast_forwards_release_branch() {
    let (fixture, c) = setup();
    publish(&fixture.adapter(), ReleasePolicy::default(), "2").expect("major release");

    // Someone else lands a fix on release/v2 upstream
    let work = fixture.work();
    work.set_head("refs/heads/release/v2").unwrap();
    let d = commit_file(&work, "FIX.md", "fix\n", "fix: patch release branch");
    push_refspec(&work, "refs/heads/release/v2:refs/heads/release/v2");

    // Our clone has not seen it yet
    work.reference("refs/heads/release/v2", c, true, "rewind for test")
        .unwrap();
    work.set_head("refs/heads/develop").unwrap();
    work.checkout_head(Some(git2::build::CheckoutBuilder::new().force()))
        .unwrap();

    let outcome = publish(&fixture.adapter(), ReleasePolicy::default(), "2.1").expect("minor release");
    assert_eq!(outcome.tag, "v2.1");

    let work = fixture.work();
    assert_eq!(ref_target(&work, "refs/heads/release/v2"), Some(d));
    assert_eq!(ref_target(&work, "refs/tags/v2.1"), Some(d));
    assert_eq!(ref_target(&work, "refs/heads/develop"), Some(c));
    assert!(fixture.work_path.join("FIX.md").exists());

    let remote = fixture.remote();
    assert_eq!(ref_target(&remote, "refs/tags/v2.1"), Some(d));
    assert_eq!(ref_target(&remote, "refs/tags/v2.0"), Some(c));
    assert_eq!(ref_target(&remote, "refs/heads/develop"), Some(c));
}

#[test]
fn test_republishing_a_major_release_is_refused() {
    let (fixture, _c) = setup();
    let repo = fixture.adapter();
    publish(&repo, ReleasePolicy::default(), "v3").expect("first release");

    let err = publish(&repo, ReleasePolicy::default(), "3.0").unwrap_err();
    assert!(err.is_duplicate_tag());
    assert_eq!(
        err.failed_step(),
        Some(&WorkflowStep::CheckTag("v3.0".to_string()))
    );
}

#[test]
fn test_minor_release_without_release_branch_fails_at_checkout() {
    let (fixture, _c) = setup();
    let repo = fixture.adapter();

    let mut workflow = ReleaseWorkflow::new(&repo, ReleasePolicy::default());
    let err = workflow.run(VersionToken::new(4, 2)).unwrap_err();

    assert!(matches!(err.root(), ReleaseError::Checkout { .. }));
    assert!(!repo.tag_exists("v4.2").unwrap());
    assert!(ref_target(&fixture.remote(), "refs/tags/v4.2").is_none());
}

#[test]
fn test_pull_fails_when_branch_was_deleted_upstream() {
    let (fixture, c) = setup();
    let repo = fixture.adapter();
    repo.checkout_to("develop").unwrap();
    repo.pull().unwrap();

    // The remote-tracking ref from the pull above is now stale
    fixture
        .remote()
        .find_reference("refs/heads/develop")
        .unwrap()
        .delete()
        .unwrap();

    let err = repo.pull().unwrap_err();
    assert!(matches!(err, ReleaseError::Pull(_)));
    assert!(err.to_string().contains("does not exist on remote"));

    let err = publish(&repo, ReleasePolicy::default(), "2").unwrap_err();
    assert_eq!(err.failed_step(), Some(&WorkflowStep::Pull));
    assert!(ref_target(&fixture.work(), "refs/heads/release/v2").is_none());
    assert_eq!(ref_target(&fixture.work(), "refs/heads/develop"), Some(c));
}

#[test]
fn test_pull_refuses_diverged_branch() {
    let (fixture, c) = setup();

    // Upstream develop moves to X, local develop moves to Y, both from C
    let work = fixture.work();
    commit_file(&work, "UPSTREAM.md", "upstream\n", "upstream change");
    push_refspec(&work, "refs/heads/develop:refs/heads/develop");
    work.reference("refs/heads/develop", c, true, "rewind for test")
        .unwrap();
    work.checkout_head(Some(git2::build::CheckoutBuilder::new().force()))
        .unwrap();
    let y = commit_file(&work, "LOCAL.md", "local\n", "local change");

    let repo = fixture.adapter();
    let err = publish(&repo, ReleasePolicy::default(), "3").unwrap_err();

    assert_eq!(err.failed_step(), Some(&WorkflowStep::Pull));
    assert!(matches!(err.root(), ReleaseError::Pull(_)));
    assert!(err.root().to_string().contains("diverged"));
    assert_eq!(ref_target(&fixture.work(), "refs/heads/develop"), Some(y));
    assert!(ref_target(&fixture.work(), "refs/heads/release/v3").is_none());
}

#[test]
fn test_push_rejects_moved_tag() {
    let (fixture, c) = setup();
    let repo = fixture.adapter();
    publish(&repo, ReleasePolicy::default(), "2").expect("major release");

    // Re-point v2.0 locally at a commit unrelated to the published one
    let work = fixture.work();
    let head = work.head().unwrap().peel_to_commit().unwrap();
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let unrelated = work
        .commit(None, &sig, &sig, "rewritten history", &head.tree().unwrap(), &[])
        .unwrap();
    let unrelated = work.find_object(unrelated, None).unwrap();
    work.tag_lightweight("v2.0", &unrelated, true).unwrap();

    let err = repo.push_branches_and_tags().unwrap_err();
    assert!(matches!(err, ReleaseError::Push(_)));
    assert_eq!(ref_target(&fixture.remote(), "refs/tags/v2.0"), Some(c));
}

#[test]
fn test_latest_version_from_real_tags() {
    let (fixture, _c) = setup();
    let repo = fixture.adapter();
    for tag in ["v9.0", "v10.0", "v9.3", "not-a-version"] {
        repo.create_tag(tag).unwrap();
    }

    let latest = git_release::domain::latest_version(&repo).unwrap();
    assert_eq!(latest, VersionToken::new(10, 0));
}

#[test]
fn test_git_release_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_git-release"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("git-release"));
    assert!(stdout.contains("publish"));
}

#[test]
fn test_dry_run_leaves_repository_untouched() {
    let (fixture, _c) = setup();

    let output = Command::new(env!("CARGO_BIN_EXE_git-release"))
        .args(["publish", "--dry-run", "--path"])
        .arg(&fixture.work_path)
        .arg("5")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Dry run"));
    assert!(stdout.contains("release/v5"));

    let work = fixture.work();
    assert!(ref_target(&work, "refs/heads/release/v5").is_none());
    assert!(ref_target(&work, "refs/tags/v5.0").is_none());
}

#[test]
fn test_failures_exit_non_zero() {
    let (fixture, _c) = setup();

    let bad_version = Command::new(env!("CARGO_BIN_EXE_git-release"))
        .args(["publish", "--dry-run", "--path"])
        .arg(&fixture.work_path)
        .arg("1.2.3")
        .output()
        .expect("Failed to execute command");
    assert_eq!(bad_version.status.code(), Some(1));
    let stderr = String::from_utf8(bad_version.stderr).unwrap();
    assert!(stderr.contains("Version parsing error"));

    let missing_key = Command::new(env!("CARGO_BIN_EXE_git-release"))
        .args(["publish", "-f", "/nonexistent/id_rsa", "--path"])
        .arg(&fixture.work_path)
        .arg("2")
        .output()
        .expect("Failed to execute command");
    assert_eq!(missing_key.status.code(), Some(1));
    assert!(ref_target(&fixture.work(), "refs/heads/release/v2").is_none());
}
