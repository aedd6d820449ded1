use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn caf() -> Command {
    Command::cargo_bin("caf").unwrap()
}

#[test]
fn init_creates_repository_layout() {
    let dir = TempDir::new().unwrap();

    caf()
        .arg("init")
        .current_dir(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(dir.path().join(".caf/objects").is_dir());
    assert!(dir.path().join(".caf/refs/heads").is_dir());
    assert!(dir.path().join(".caf/HEAD").is_file());
}

#[test]
fn commit_then_status_reports_clean_tree() {
    let dir = TempDir::new().unwrap();
    caf().arg("init").current_dir(&dir).assert().success();

    std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
    caf()
        .args(["commit", "-m", "first", "-a", "Ada <ada@example.com>"])
        .current_dir(&dir)
        .assert()
        .success();

    caf()
        .arg("status")
        .current_dir(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("clean"));
}

#[test]
fn status_reports_added_file() {
    let dir = TempDir::new().unwrap();
    caf().arg("init").current_dir(&dir).assert().success();

    std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
    caf()
        .args(["commit", "-m", "first", "-a", "Ada <ada@example.com>"])
        .current_dir(&dir)
        .assert()
        .success();

    std::fs::write(dir.path().join("b.txt"), b"new file").unwrap();

    caf()
        .arg("status")
        .current_dir(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("b.txt"));
}

#[test]
fn checkout_restores_prior_commit() {
    let dir = TempDir::new().unwrap();
    caf().arg("init").current_dir(&dir).assert().success();

    std::fs::write(dir.path().join("a.txt"), b"v1").unwrap();
    caf()
        .args(["commit", "-m", "first", "-a", "Ada <ada@example.com>"])
        .current_dir(&dir)
        .assert()
        .success();
    let c1 = std::fs::read_to_string(dir.path().join(".caf/refs/heads/main"))
        .unwrap()
        .trim()
        .to_string();

    std::fs::write(dir.path().join("a.txt"), b"v2").unwrap();
    caf()
        .args(["commit", "-m", "second", "-a", "Ada <ada@example.com>"])
        .current_dir(&dir)
        .assert()
        .success();

    caf().args(["checkout", &c1]).current_dir(&dir).assert().success();

    assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "v1");
}

#[test]
fn checkout_rejects_abbreviated_hash() {
    let dir = TempDir::new().unwrap();
    caf().arg("init").current_dir(&dir).assert().success();

    std::fs::write(dir.path().join("a.txt"), b"v1").unwrap();
    caf()
        .args(["commit", "-m", "first", "-a", "Ada <ada@example.com>"])
        .current_dir(&dir)
        .assert()
        .success();
    let c1 = std::fs::read_to_string(dir.path().join(".caf/refs/heads/main"))
        .unwrap()
        .trim()
        .to_string();

    caf()
        .args(["checkout", &c1[..7]])
        .current_dir(&dir)
        .assert()
        .failure();
}

#[test]
fn checkout_refuses_dirty_working_directory() {
    let dir = TempDir::new().unwrap();
    caf().arg("init").current_dir(&dir).assert().success();

    std::fs::write(dir.path().join("a.txt"), b"v1").unwrap();
    caf()
        .args(["commit", "-m", "first", "-a", "Ada <ada@example.com>"])
        .current_dir(&dir)
        .assert()
        .success();
    let c1 = std::fs::read_to_string(dir.path().join(".caf/refs/heads/main"))
        .unwrap()
        .trim()
        .to_string();

    std::fs::write(dir.path().join("a.txt"), b"uncommitted").unwrap();

    caf()
        .args(["checkout", &c1])
        .current_dir(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("uncommitted changes"));
}

#[test]
fn branch_takes_precedence_over_same_named_tag() {
    let dir = TempDir::new().unwrap();
    caf().arg("init").current_dir(&dir).assert().success();

    std::fs::write(dir.path().join("a.txt"), b"v1").unwrap();
    caf()
        .args(["commit", "-m", "first", "-a", "Ada <ada@example.com>"])
        .current_dir(&dir)
        .assert()
        .success();
    let c1 = std::fs::read_to_string(dir.path().join(".caf/refs/heads/main"))
        .unwrap()
        .trim()
        .to_string();

    std::fs::write(dir.path().join("a.txt"), b"v2").unwrap();
    caf()
        .args(["commit", "-m", "second", "-a", "Ada <ada@example.com>"])
        .current_dir(&dir)
        .assert()
        .success();

    caf()
        .args(["branch", "release", "--at", &c1])
        .current_dir(&dir)
        .assert()
        .success();
    caf()
        .args(["tag", "release", "-m", "tag release"])
        .current_dir(&dir)
        .assert()
        .success();

    caf().args(["checkout", "release"]).current_dir(&dir).assert().success();

    assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "v1");
}
