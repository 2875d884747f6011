use std::{fs::read_to_string, path::Path};

use helpers::*;
use pretty_assertions::assert_eq;

mod helpers;

const CHANGELOG: &str = "# Changelog\n";

fn payload(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/event_payload")
        .join(name)
        .to_str()
        .unwrap()
        .to_string()
}

/// A `release.published` payload, read from `GITHUB_EVENT_PATH` like it would be in CI.
///
/// # Expected
///
/// The release name is the section title, the body is written as-is, the date is the publish date.
/// The tag shows up in the log.
#[test]
fn published_from_env() {
    // Arrange.
    let fixture = Fixture::new(CHANGELOG);

    // Act.
    let assert = changelog_updater(fixture.working_path())
        .env("GITHUB_EVENT_PATH", payload("published.json"))
        .assert()
        .success();

    // Assert.
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(
        stderr.contains("Writing release 1.2.0 (tag v1.2.0) into CHANGELOG.md"),
        "{stderr}"
    );
    let remote = fixture.remote_path();
    assert_eq!(commit_count(remote), 2);
    assert_eq!(last_commit_message(remote), "Update CHANGELOG [skip ci]");
    assert_eq!(
        file_on_main(remote, "CHANGELOG.md"),
        "# Changelog\n\n## 1.2.0 (2024-03-05)\n\n## What's Changed\n* Fixed crash on startup.\n"
    );
}

/// A release without a name falls back to its tag.
#[test]
fn unnamed_release_uses_tag() {
    // Arrange.
    let fixture = Fixture::new(CHANGELOG);

    // Act.
    changelog_updater(fixture.working_path())
        .args(["--event", payload("unnamed.json").as_str()])
        .assert()
        .success();

    // Assert.
    let changelog = read_to_string(fixture.working_path().join("CHANGELOG.md")).unwrap();
    assert!(changelog.contains("## v0.3.0 (2024-03-06)"), "{changelog}");
}

/// Only `published` matters; an edited release must not produce a second entry.
#[test]
fn other_actions_are_ignored() {
    // Arrange.
    let fixture = Fixture::new(CHANGELOG);

    // Act.
    changelog_updater(fixture.working_path())
        .args(["--event", payload("edited.json").as_str()])
        .assert()
        .success();

    // Assert.
    assert_eq!(commit_count(fixture.remote_path()), 1);
    assert_eq!(
        read_to_string(fixture.working_path().join("CHANGELOG.md")).unwrap(),
        CHANGELOG
    );
}

/// Explicit values take priority over the event in the environment.
#[test]
fn explicit_values_win() {
    // Arrange.
    let fixture = Fixture::new(CHANGELOG);

    // Act.
    changelog_updater(fixture.working_path())
        .env("GITHUB_EVENT_PATH", payload("published.json"))
        .args(["--version-label", "9.9.9", "--notes", "Manual entry."])
        .assert()
        .success();

    // Assert.
    let changelog = file_on_main(fixture.remote_path(), "CHANGELOG.md");
    assert!(changelog.contains("Manual entry."), "{changelog}");
    assert!(!changelog.contains("1.2.0"), "{changelog}");
}

/// A payload that isn't a release event at all.
#[test]
fn not_a_release_event() {
    // Arrange.
    let fixture = Fixture::new(CHANGELOG);

    // Act.
    let assert = changelog_updater(fixture.working_path())
        .args(["--event", payload("push.json").as_str()])
        .assert()
        .failure();

    // Assert.
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("does not describe a release"), "{stderr}");
    assert_eq!(commit_count(fixture.remote_path()), 1);
}
