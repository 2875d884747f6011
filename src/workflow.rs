use log::debug;
use miette::Diagnostic;

use crate::{state::RunType, step, step::Step, State};

/// A workflow is the fixed sequence of [`Step`]s to run for a single release.
#[derive(Debug)]
pub(crate) struct Workflow {
    /// Shown when any step fails.
    pub(crate) name: String,
    /// A list of [`Step`]s to execute in order, stopping if any step fails.
    pub(crate) steps: Vec<Step>,
}

impl Workflow {
    /// Check out, write the release into the changelog, commit and push.
    pub(crate) fn release_published() -> Self {
        Self {
            name: String::from("release published"),
            steps: vec![Step::Checkout, Step::UpdateChangelog, Step::Commit],
        }
    }
}

/// An error from running a single workflow.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("Problem with workflow {name}")]
pub struct Error {
    name: String,
    #[related]
    inner: Box<[step::Error; 1]>,
}

/// Run a series of [`Step`], each of which updates `state`.
pub(crate) fn run(workflow: Workflow, mut state: RunType<State>) -> Result<RunType<State>, Error> {
    for step in workflow.steps {
        debug!("Running step {step}");
        state = match step.run(state) {
            Ok(state) => state,
            Err(err) => {
                return Err(Error {
                    name: workflow.name,
                    inner: Box::new([err]),
                });
            }
        };
    }
    Ok(state)
}
