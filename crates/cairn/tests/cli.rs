//! End-to-end CLI tests against a real repository on disk.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cairn(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cairn").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    cairn(&dir).arg("init").assert().success();
    dir
}

fn configure_user(dir: &TempDir) {
    let config = dir.path().join(".cairn/config.toml");
    let mut content = std::fs::read_to_string(&config).unwrap();
    content.push_str("\n[user]\nname = \"Test\"\nemail = \"test@example.com\"\n");
    std::fs::write(config, content).unwrap();
}

#[test]
fn init_scaffolds_control_directory() {
    let dir = init_repo();
    assert_eq!(
        std::fs::read_to_string(dir.path().join(".cairn/HEAD")).unwrap(),
        "ref: refs/heads/master\n"
    );
    assert!(dir.path().join(".cairn/objects").is_dir());

    // A second init in the same place refuses.
    cairn(&dir).arg("init").assert().failure();
}

#[test]
fn hash_object_and_cat_file_roundtrip() {
    let dir = init_repo();
    std::fs::write(dir.path().join("hello.txt"), b"hello\n").unwrap();

    // Pure hashing, no store write.
    cairn(&dir)
        .args(["hash-object", "hello.txt"])
        .assert()
        .success()
        .stdout("ce013625030ba8dba906f756967f9e9ca394464a\n");
    cairn(&dir)
        .args(["cat-file", "blob", "ce0136"])
        .assert()
        .failure();

    cairn(&dir)
        .args(["hash-object", "-w", "hello.txt"])
        .assert()
        .success();

    // Short-hash lookup returns the raw payload.
    cairn(&dir)
        .args(["cat-file", "blob", "ce0136"])
        .assert()
        .success()
        .stdout("hello\n");
}

#[test]
fn add_commit_log_cycle() {
    let dir = init_repo();
    configure_user(&dir);
    std::fs::write(dir.path().join("a.txt"), b"alpha\n").unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs/guide.md"), b"# guide\n").unwrap();

    cairn(&dir)
        .args(["add", "a.txt", "docs/guide.md"])
        .assert()
        .success();
    cairn(&dir)
        .args(["ls-files"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt").and(predicate::str::contains("docs/guide.md")));

    cairn(&dir)
        .args(["commit", "-m", "initial import"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[master"));

    cairn(&dir)
        .args(["rev-parse", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[0-9a-f]{40}\n$").unwrap());

    cairn(&dir)
        .args(["log"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Test <test@example.com>")
                .and(predicate::str::contains("initial import")),
        );

    // A second commit links to the first.
    std::fs::write(dir.path().join("a.txt"), b"beta\n").unwrap();
    cairn(&dir).args(["add", "a.txt"]).assert().success();
    cairn(&dir)
        .args(["commit", "-m", "update"])
        .assert()
        .success();
    cairn(&dir)
        .args(["log"])
        .assert()
        .success()
        .stdout(predicate::str::contains("update").and(predicate::str::contains("initial import")));
}

#[test]
fn tag_show_ref_and_checkout() {
    let dir = init_repo();
    configure_user(&dir);
    std::fs::write(dir.path().join("f.txt"), b"data\n").unwrap();
    cairn(&dir).args(["add", "f.txt"]).assert().success();
    cairn(&dir)
        .args(["commit", "-m", "base"])
        .assert()
        .success();

    cairn(&dir).args(["tag", "v1"]).assert().success();
    cairn(&dir)
        .args(["tag"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v1"));
    cairn(&dir)
        .args(["show-ref"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("refs/tags/v1")
                .and(predicate::str::contains("refs/heads/master")),
        );

    // ls-tree over HEAD shows the staged file.
    cairn(&dir)
        .args(["ls-tree", "HEAD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("100644 blob").and(predicate::str::contains("f.txt")));

    cairn(&dir)
        .args(["checkout", "v1", "export"])
        .assert()
        .success();
    assert_eq!(
        std::fs::read(dir.path().join("export/f.txt")).unwrap(),
        b"data\n"
    );

    // Checking out again into the now-occupied directory fails.
    cairn(&dir)
        .args(["checkout", "v1", "export"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not empty"));
}

#[test]
fn status_reports_sections() {
    let dir = init_repo();
    configure_user(&dir);
    std::fs::write(dir.path().join("tracked.txt"), b"one\n").unwrap();
    std::fs::write(dir.path().join("loose.txt"), b"two\n").unwrap();
    cairn(&dir).args(["add", "tracked.txt"]).assert().success();
    cairn(&dir)
        .args(["commit", "-m", "track"])
        .assert()
        .success();

    std::fs::write(dir.path().join("tracked.txt"), b"changed\n").unwrap();

    cairn(&dir)
        .args(["status"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("On branch master")
                .and(predicate::str::contains("modified: tracked.txt"))
                .and(predicate::str::contains("loose.txt")),
        );
}

#[test]
fn check_ignore_matches_staged_rules() {
    let dir = init_repo();
    std::fs::write(dir.path().join(".cairnignore"), b"*.log\n").unwrap();
    cairn(&dir)
        .args(["add", ".cairnignore"])
        .assert()
        .success();

    cairn(&dir)
        .args(["check-ignore", "debug.log", "src/main.rs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("debug.log").and(predicate::str::contains("src").not()));
}

#[test]
fn rm_unstages_and_deletes() {
    let dir = init_repo();
    std::fs::write(dir.path().join("gone.txt"), b"x\n").unwrap();
    cairn(&dir).args(["add", "gone.txt"]).assert().success();
    cairn(&dir).args(["rm", "gone.txt"]).assert().success();

    assert!(!dir.path().join("gone.txt").exists());
    cairn(&dir)
        .args(["ls-files"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gone.txt").not());

    // Removing an unstaged path is an error.
    std::fs::write(dir.path().join("other.txt"), b"y\n").unwrap();
    cairn(&dir).args(["rm", "other.txt"]).assert().failure();
}
