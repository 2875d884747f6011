#![allow(dead_code)]

use std::path::Path;

pub use git::*;
use snapbox::cmd::{cargo_bin, Command};

mod git;

/// The binary under test, isolated from any CI environment the tests themselves run in.
pub fn changelog_updater(working_dir: &Path) -> Command {
    Command::new(cargo_bin!("changelog-updater"))
        .current_dir(working_dir)
        .env_remove("GITHUB_EVENT_PATH")
        .env_remove("GITHUB_TOKEN")
        .env_remove("GITHUB_REPOSITORY")
        .env("RUST_LOG", "info")
}

/// A bare "remote" with one commit on `main` containing `CHANGELOG.md`, plus a clone of it.
pub struct Fixture {
    pub remote: tempfile::TempDir,
    pub working: tempfile::TempDir,
}

impl Fixture {
    pub fn new(changelog: &str) -> Self {
        let remote = tempfile::tempdir().unwrap();
        init_remote(remote.path());
        seed(remote.path(), changelog);
        let working = tempfile::tempdir().unwrap();
        clone(remote.path(), working.path());
        Self { remote, working }
    }

    pub fn remote_path(&self) -> &Path {
        self.remote.path()
    }

    pub fn working_path(&self) -> &Path {
        self.working.path()
    }
}
