use log::info;

use crate::{
    config::GitConfig,
    integrations::git,
    state::{Checkout, RunType},
    State,
};

pub(crate) fn run(state: RunType<State>) -> Result<RunType<State>, git::Error> {
    let (run_type, mut state) = state.take();
    let GitConfig { remote, branch, .. } = &state.config.git;
    if run_type.is_dry_run() {
        info!(
            "Would check out the tip of {remote}/{branch} in {}",
            state.directory.display()
        );
    } else {
        git::checkout(
            &state.directory,
            state.clone_url.as_deref(),
            remote,
            branch,
            state.token.as_ref(),
        )?;
    }
    state.checkout = Checkout::Ready;
    Ok(run_type.of(state))
}
