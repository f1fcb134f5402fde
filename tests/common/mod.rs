/// Common test utilities for repomirror tests
use std::path::{Path, PathBuf};
use std::process::Command;

/// Run a git command inside `dir`, panicking on failure
pub fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "repomirror-test")
        .env("GIT_AUTHOR_EMAIL", "test@example.invalid")
        .env("GIT_COMMITTER_NAME", "repomirror-test")
        .env("GIT_COMMITTER_EMAIL", "test@example.invalid")
        .output()
        .expect("Failed to execute git");

    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Create an upstream repository with one commit on `main`
pub fn init_upstream(root: &Path, name: &str) -> PathBuf {
    let path = root.join(name);
    std::fs::create_dir_all(&path).expect("Failed to create upstream dir");

    git(&path, &["init", "-b", "main"]);
    commit_file(&path, "README.md", "upstream fixture", "initial commit");

    path
}

/// Write a file and commit it
pub fn commit_file(repo: &Path, file: &str, content: &str, message: &str) {
    std::fs::write(repo.join(file), content).expect("Failed to write fixture file");
    git(repo, &["add", "."]);
    git(repo, &["commit", "-m", message]);
}
