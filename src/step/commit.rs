use log::info;
use miette::Diagnostic;
use thiserror::Error;

use crate::{
    config::GitConfig,
    integrations::git,
    state::{self, RunType},
    State,
};

pub(crate) fn run(state: RunType<State>) -> Result<RunType<State>, Error> {
    let (run_type, state) = state.take();
    match &state.changelog {
        state::Changelog::Untouched => return Err(Error::ChangelogNotUpdated),
        state::Changelog::Unchanged => {
            info!("Changelog is unchanged, nothing to commit");
            return Ok(run_type.of(state));
        }
        state::Changelog::Updated(_) => {}
    }

    let GitConfig {
        remote,
        branch,
        push,
        author,
        ..
    } = &state.config.git;
    let path = &state.config.changelog.path;
    let message = state.config.git.commit_message();

    if run_type.is_dry_run() {
        info!("Would commit {} with message {message:?}", path.display());
        if *push {
            info!("Would push {branch} to {remote}");
        }
        return Ok(run_type.of(state));
    }

    if git::commit_file(&state.directory, path, &message, author.as_ref())?.is_none() {
        info!("{} is the same as on {branch}, nothing to commit", path.display());
        return Ok(run_type.of(state));
    }
    if *push {
        git::push(&state.directory, remote, branch, state.token.as_ref())?;
    } else {
        info!("Not pushing to {remote}, `git.push` is disabled");
    }
    Ok(run_type.of(state))
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("The changelog has not been updated")]
    #[diagnostic(
        code(commit::changelog_not_updated),
        help("The UpdateChangelog step must run before Commit.")
    )]
    ChangelogNotUpdated,
    #[error(transparent)]
    #[diagnostic(transparent)]
    Git(#[from] git::Error),
}
