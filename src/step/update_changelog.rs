use log::{debug, info};
use miette::Diagnostic;
use thiserror::Error;
use time::OffsetDateTime;

use crate::{
    changelog::{self, release_titles, Changelog},
    fs::{self, WriteType},
    state::{self, Checkout, RunType},
    State,
};

pub(crate) fn run(state: RunType<State>) -> Result<RunType<State>, Error> {
    let (run_type, mut state) = state.take();
    if state.checkout != Checkout::Ready {
        return Err(Error::NotCheckedOut);
    }

    let mut changelog = Changelog::load(state.directory.join(&state.config.changelog.path))?;
    let previous = release_titles(&changelog).into_iter().next();
    let date = state
        .release
        .published_at
        .unwrap_or_else(|| OffsetDateTime::now_utc().date());

    let Some(new_section) = changelog.with_release(&state.release, date)? else {
        info!(
            "Release {} has no notes, leaving {} alone",
            state.release.version_label,
            changelog.path.display()
        );
        state.changelog = state::Changelog::Unchanged;
        return Ok(run_type.of(state));
    };
    match previous {
        Some(previous) => debug!("Adding {} above {previous}", state.release.version_label),
        None => debug!("Adding the first release, {}", state.release.version_label),
    }

    if let Some(parent) = changelog.path.parent().filter(|parent| !parent.exists()) {
        fs::create_dir(run_type.of(parent))?;
    }
    let to_write = match run_type {
        RunType::DryRun(()) => WriteType::DryRun(new_section.as_str()),
        RunType::Real(()) => WriteType::Real(changelog.content.as_str()),
    };
    fs::write(to_write, &changelog.path)?;
    state.changelog = state::Changelog::Updated(new_section);
    Ok(run_type.of(state))
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("The repository has not been checked out")]
    #[diagnostic(
        code(update_changelog::not_checked_out),
        help("The Checkout step must run before UpdateChangelog.")
    )]
    NotCheckedOut,
    #[error(transparent)]
    #[diagnostic(transparent)]
    Changelog(#[from] changelog::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fs(#[from] fs::Error),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_run {
    use std::path::{Path, PathBuf};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{config::Config, event::Release};

    fn checked_out(directory: &Path, changelog_path: &str) -> State {
        let mut config = Config::default();
        config.changelog.path = PathBuf::from(changelog_path);
        let mut state = State::new(
            directory.to_path_buf(),
            None,
            None,
            config,
            Release::new(String::from("1.0.0"), String::from("First!")),
        );
        state.checkout = Checkout::Ready;
        state
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();

        let state = run(RunType::Real(checked_out(dir.path(), "docs/release/CHANGES.md"))).unwrap();

        let (_, state) = state.take();
        assert!(matches!(state.changelog, state::Changelog::Updated(_)));
        let written = std::fs::read_to_string(dir.path().join("docs/release/CHANGES.md")).unwrap();
        assert!(written.starts_with("## 1.0.0 ("), "{written}");
        assert!(written.ends_with(")\n\nFirst!\n"), "{written}");
    }

    #[test]
    fn dry_run_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();

        run(RunType::DryRun(checked_out(dir.path(), "docs/CHANGES.md"))).unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn requires_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = checked_out(dir.path(), "CHANGELOG.md");
        state.checkout = Checkout::Pending;

        let result = run(RunType::Real(state));

        assert!(matches!(result, Err(Error::NotCheckedOut)));
    }
}
