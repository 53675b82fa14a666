//! End-to-end CLI scenarios, driving the built `minigit` binary directly
//! (spec.md §8 "End-to-end scenarios" 1-4).

use std::fs;

use assert_cmd::Command;

fn minigit() -> Command {
    Command::cargo_bin("minigit").unwrap()
}

#[test]
fn init_creates_expected_skeleton() {
    let dir = tempfile::tempdir().unwrap();

    minigit().arg("init").current_dir(dir.path()).assert().success();

    let head = fs::read_to_string(dir.path().join(".git/HEAD")).unwrap();
    assert_eq!(head, "ref: refs/heads/main\n");
    assert!(dir.path().join(".git/objects").is_dir());
    assert!(dir.path().join(".git/refs/heads").is_dir());
}

#[test]
fn hash_object_write_then_cat_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    minigit().arg("init").current_dir(dir.path()).assert().success();

    fs::write(dir.path().join("hello.txt"), b"hello\n").unwrap();

    let hash_output = minigit()
        .args(["hash-object", "-w", "hello.txt"])
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let blob_id = String::from_utf8(hash_output).unwrap().trim().to_string();
    assert_eq!(blob_id, "ce013625030ba8dba906f756967f9e9ca394464a");
    assert!(dir
        .path()
        .join(".git/objects/ce/013625030ba8dba906f756967f9e9ca394464a")
        .is_file());

    let cat_output = minigit()
        .args(["cat-file", "-p", &blob_id])
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(cat_output, b"hello\n");
}

#[test]
fn write_tree_snapshots_single_file_directory() {
    let dir = tempfile::tempdir().unwrap();
    minigit().arg("init").current_dir(dir.path()).assert().success();
    fs::write(dir.path().join("hello.txt"), b"hello\n").unwrap();

    let blob_output = minigit()
        .args(["hash-object", "-w", "hello.txt"])
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let blob_id = String::from_utf8(blob_output).unwrap().trim().to_string();

    let tree_output = minigit()
        .arg("write-tree")
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let tree_id = String::from_utf8(tree_output).unwrap().trim().to_string();

    let ls_output = minigit()
        .args(["ls-tree", "--name-only", &tree_id])
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(String::from_utf8(ls_output).unwrap(), "hello.txt\n");

    let full_output = minigit()
        .args(["ls-tree", &tree_id])
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let full = String::from_utf8(full_output).unwrap();
    assert_eq!(full.trim_end(), format!("100644 blob {blob_id}\thello.txt"));
}

#[test]
fn commit_tree_produces_a_commit_whose_tree_checks_out() {
    let dir = tempfile::tempdir().unwrap();
    minigit().arg("init").current_dir(dir.path()).assert().success();
    fs::write(dir.path().join("hello.txt"), b"hello\n").unwrap();
    minigit()
        .args(["hash-object", "-w", "hello.txt"])
        .current_dir(dir.path())
        .assert()
        .success();

    let tree_output = minigit()
        .arg("write-tree")
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let tree_id = String::from_utf8(tree_output).unwrap().trim().to_string();

    let commit_output = minigit()
        .args(["commit-tree", &tree_id, "-m", "initial commit"])
        .current_dir(dir.path())
        .env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_AUTHOR_EMAIL", "author@example.com")
        .env("GIT_COMMITTER_NAME", "Test Author")
        .env("GIT_COMMITTER_EMAIL", "author@example.com")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let commit_id = String::from_utf8(commit_output).unwrap().trim().to_string();

    let cat_output = minigit()
        .args(["cat-file", "-p", &commit_id])
        .current_dir(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let body = String::from_utf8(cat_output).unwrap();
    assert!(body.starts_with(&format!("tree {tree_id}\n")));
    assert!(body.contains("author Test Author <author@example.com>"));
    assert!(body.ends_with("initial commit"));
}
