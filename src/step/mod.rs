use std::fmt::Display;

use miette::Diagnostic;
use thiserror::Error;

use crate::{integrations::git, state::RunType, State};

pub(crate) mod checkout;
pub(crate) mod commit;
pub(crate) mod update_changelog;

/// Each variant is one stage of writing a release into the changelog. They run in declaration
/// order, each depending on the state the previous one left behind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Step {
    /// Get a working tree at the tip of the configured branch, cloning or fetching as needed.
    Checkout,
    /// Add a section for the release to the changelog file. If the release has no notes, the file
    /// is left alone.
    UpdateChangelog,
    /// Commit the changelog file (and only that file) and push it, if the previous step changed it.
    Commit,
}

impl Step {
    pub(crate) fn run(self, state: RunType<State>) -> Result<RunType<State>, Error> {
        Ok(match self {
            Step::Checkout => checkout::run(state)?,
            Step::UpdateChangelog => update_changelog::run(state)?,
            Step::Commit => commit::run(state)?,
        })
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Checkout => f.write_str("Checkout"),
            Step::UpdateChangelog => f.write_str("UpdateChangelog"),
            Step::Commit => f.write_str("Commit"),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub(crate) enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Git(#[from] git::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    UpdateChangelog(#[from] update_changelog::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Commit(#[from] commit::Error),
}
