#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::path::{Path, PathBuf};

use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};
use log::info;
use miette::{Diagnostic, Result};

use crate::{
    config::Config,
    event::{Event, Release},
    integrations::{github, Token},
    state::{RunType, State},
    workflow::Workflow,
};

mod changelog;
mod config;
mod event;
mod fs;
mod integrations;
mod state;
mod step;
mod workflow;

/// Parse the command line, find the release, and write it into the changelog.
///
/// ## Errors
/// Anything that stops the changelog from being committed and pushed, except a release with no
/// notes, which is not an error.
pub async fn run() -> Result<()> {
    let matches = build_cli().get_matches();

    let directory = matches
        .get_one::<PathBuf>("directory")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::load(path, true)?,
        None => Config::load(&directory.join(Config::CONFIG_PATH), false)?,
    };
    let token = matches.get_one::<String>("token").cloned().and_then(Token::new);

    let Some(release) = find_release(&matches, token.as_ref()).await? else {
        return Ok(());
    };
    match &release.tag_name {
        Some(tag) => info!(
            "Writing release {} (tag {tag}) into {}",
            release.version_label,
            config.changelog.path.display()
        ),
        None => info!(
            "Writing release {} into {}",
            release.version_label,
            config.changelog.path.display()
        ),
    }

    let state = State::new(
        directory,
        matches.get_one::<String>("repository").cloned(),
        token,
        config,
        release,
    );
    let state = if matches.get_flag("dry-run") {
        RunType::DryRun(state)
    } else {
        RunType::Real(state)
    };
    workflow::run(Workflow::release_published(), state)?;
    Ok(())
}

/// Explicit values win over a tag to look up, which wins over an event payload.
///
/// `None` means the event is not one we act on.
async fn find_release(
    matches: &ArgMatches,
    token: Option<&Token>,
) -> Result<Option<Release>, Error> {
    if let (Some(version_label), Some(notes)) = (
        matches.get_one::<String>("version-label"),
        matches.get_one::<String>("notes"),
    ) {
        return Ok(Some(Release::new(version_label.clone(), notes.clone())));
    }
    if let Some(tag) = matches.get_one::<String>("release-tag") {
        let repository: github::Repository = matches
            .get_one::<String>("github-repository")
            .ok_or(Error::MissingGitHubRepository)?
            .parse()?;
        return Ok(Some(github::fetch_release(&repository, tag, token).await?));
    }
    if let Some(path) = matches.get_one::<PathBuf>("event") {
        return from_event_payload(path);
    }
    Err(Error::NoRelease)
}

fn from_event_payload(path: &Path) -> Result<Option<Release>, Error> {
    match event::load_payload(path)? {
        Event::Published(release) => Ok(Some(release)),
        Event::Ignored { action } => {
            info!("Ignoring release event with action {action}, only published releases count");
            Ok(None)
        }
    }
}

fn build_cli() -> Command {
    command!()
        .arg(
            Arg::new("event")
                .long("event")
                .env("GITHUB_EVENT_PATH")
                .value_parser(value_parser!(PathBuf))
                .help("Path to the JSON payload of the release event"),
        )
        .arg(
            Arg::new("version-label")
                .long("version-label")
                .requires("notes")
                .help("The name of the release, used as the title of its changelog section"),
        )
        .arg(
            Arg::new("notes")
                .long("notes")
                .requires("version-label")
                .allow_hyphen_values(true)
                .help("The release notes to write into the changelog"),
        )
        .arg(
            Arg::new("release-tag")
                .long("release-tag")
                .help("Fetch the release with this tag from GitHub instead of reading an event"),
        )
        .arg(
            Arg::new("github-repository")
                .long("github-repository")
                .env("GITHUB_REPOSITORY")
                .help("The OWNER/REPO to fetch --release-tag from"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .env("GITHUB_TOKEN")
                .hide_env_values(true)
                .help("Access token used to fetch, push, and call the GitHub API"),
        )
        .arg(
            Arg::new("repository")
                .long("repository")
                .help("URL to clone if --directory is not already a Git repository"),
        )
        .arg(
            Arg::new("directory")
                .long("directory")
                .value_parser(value_parser!(PathBuf))
                .default_value(".")
                .help("The working tree to check out and update"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help(format!(
                    "Config file to use instead of {} in --directory. The default file is read \
                     before --repository is cloned, so a config committed to the cloned \
                     repository is never used; pass it here instead",
                    Config::CONFIG_PATH
                )),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Pretend to run, logging what would change without writing anything")
                .action(ArgAction::SetTrue),
        )
}

#[derive(Debug, Diagnostic, thiserror::Error)]
enum Error {
    #[error("No release to write")]
    #[diagnostic(
        code(release::missing),
        help("Pass --event (or set GITHUB_EVENT_PATH), --release-tag, or --version-label and --notes.")
    )]
    NoRelease,
    #[error("--release-tag needs a GitHub repository")]
    #[diagnostic(
        code(release::missing_repository),
        help("Pass --github-repository OWNER/REPO or set GITHUB_REPOSITORY.")
    )]
    MissingGitHubRepository,
    #[error(transparent)]
    #[diagnostic(transparent)]
    Event(#[from] event::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    GitHub(#[from] github::Error),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_cli {
    use super::*;

    #[test]
    fn cli_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn config_help_explains_clone_mode() {
        let cli = build_cli();
        let help = cli
            .get_arguments()
            .find(|arg| arg.get_id() == "config")
            .and_then(Arg::get_help)
            .unwrap()
            .to_string();

        assert!(help.contains("before --repository is cloned"), "{help}");
    }

    #[test]
    fn label_requires_notes() {
        let result =
            build_cli().try_get_matches_from(["changelog-updater", "--version-label", "1.0.0"]);

        assert!(result.is_err());
    }

    #[test]
    fn empty_notes_are_allowed() {
        let result = build_cli().try_get_matches_from([
            "changelog-updater",
            "--version-label",
            "1.0.0",
            "--notes",
            "",
        ]);

        assert!(result.is_ok());
    }
}
