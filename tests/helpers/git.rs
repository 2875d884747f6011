use std::{path::Path, process::Command};

/// Run `git` in `path` and return its stdout, failing the test if it fails.
pub fn git(path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

/// Create a bare Git repo in `path` whose default branch is `main`.
pub fn init_remote(path: &Path) {
    git(path, &["init", "--bare"]);
    git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
}

/// Configure a fake Git user for the repo in `path`.
pub fn configure_user(path: &Path) {
    git(path, &["config", "user.email", "fake@example.com"]);
    git(path, &["config", "user.name", "Fake Maintainer"]);
}

/// Push a first commit containing `CHANGELOG.md` with `changelog` to the `main` branch of `remote`.
pub fn seed(remote: &Path, changelog: &str) {
    let seed = tempfile::tempdir().unwrap();
    let path = seed.path();
    git(path, &["init"]);
    configure_user(path);
    git(path, &["checkout", "-b", "main"]);
    std::fs::write(path.join("CHANGELOG.md"), changelog).unwrap();
    git(path, &["add", "CHANGELOG.md"]);
    git(path, &["commit", "-m", "Initial commit"]);
    git(path, &["remote", "add", "origin", remote.to_str().unwrap()]);
    git(path, &["push", "origin", "main"]);
}

/// Clone `remote` into `target`.
pub fn clone(remote: &Path, target: &Path) {
    git(
        target,
        &["clone", "--branch", "main", remote.to_str().unwrap(), "."],
    );
    configure_user(target);
}

/// Create a commit with `message` in the Git repo which exists in `path`.
pub fn commit(path: &Path, message: &str) {
    git(path, &["commit", "--allow-empty", "-m", message]);
}

/// The number of commits on `main` in the bare repo at `remote`.
pub fn commit_count(remote: &Path) -> usize {
    git(remote, &["rev-list", "--count", "main"])
        .trim()
        .parse()
        .unwrap()
}

/// The full message of the last commit on `main` in `repo`.
pub fn last_commit_message(repo: &Path) -> String {
    git(repo, &["log", "-1", "--format=%B", "main"])
        .trim()
        .to_string()
}

/// Every file changed by the last commit on `main` in `repo`.
pub fn files_in_last_commit(repo: &Path) -> Vec<String> {
    git(
        repo,
        &["diff-tree", "--no-commit-id", "--name-only", "-r", "main"],
    )
    .lines()
    .map(String::from)
    .collect()
}

/// The content of `file` at the tip of `main` in `repo`.
pub fn file_on_main(repo: &Path, file: &str) -> String {
    git(repo, &["show", &format!("main:{file}")])
}
