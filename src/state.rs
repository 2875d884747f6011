use std::path::PathBuf;

use crate::{config::Config, event::Release, integrations::Token};

/// The current state of the workflow. Every [`crate::step::Step`] has a chance to transform it.
#[derive(Debug)]
pub(crate) struct State {
    /// The root of the working tree that the release is written into.
    pub(crate) directory: PathBuf,
    /// Where to clone from if `directory` is not already a repository.
    pub(crate) clone_url: Option<String>,
    pub(crate) token: Option<Token>,
    pub(crate) config: Config,
    pub(crate) release: Release,
    pub(crate) checkout: Checkout,
    pub(crate) changelog: Changelog,
}

impl State {
    #[must_use]
    pub(crate) fn new(
        directory: PathBuf,
        clone_url: Option<String>,
        token: Option<Token>,
        config: Config,
        release: Release,
    ) -> Self {
        Self {
            directory,
            clone_url,
            token,
            config,
            release,
            checkout: Checkout::Pending,
            changelog: Changelog::Untouched,
        }
    }
}

/// Whether [`crate::step::Step::Checkout`] has produced a working tree yet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Checkout {
    Pending,
    /// The working tree is at the tip of the configured branch.
    Ready,
}

/// What [`crate::step::Step::UpdateChangelog`] did to the changelog file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Changelog {
    /// The update step hasn't run.
    Untouched,
    /// The update step ran but there was nothing to add, so there is nothing to commit.
    Unchanged,
    /// A new section was written; contains the section that was added.
    Updated(String),
}

/// The type of state, an outer enum to make sure that dry-runs are handled appropriately.
#[derive(Clone, Copy, Debug)]
pub(crate) enum RunType<T> {
    /// Signifies that this is a dry run of a workflow. No I/O should happen, just pretend to run the
    /// workflow and output the results.
    DryRun(T),
    /// This is a real run of a workflow, actually do the thing.
    Real(T),
}

impl<T> RunType<T> {
    #[must_use]
    pub(crate) fn of<R>(&self, new_value: R) -> RunType<R> {
        match self {
            RunType::DryRun(_) => RunType::DryRun(new_value),
            RunType::Real(_) => RunType::Real(new_value),
        }
    }

    pub(crate) fn take(self) -> (RunType<()>, T) {
        match self {
            RunType::DryRun(inner) => (RunType::DryRun(()), inner),
            RunType::Real(inner) => (RunType::Real(()), inner),
        }
    }

    pub(crate) const fn is_dry_run(&self) -> bool {
        matches!(self, RunType::DryRun(_))
    }
}
