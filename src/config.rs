use std::path::{Path, PathBuf};

use log::debug;
use miette::{Diagnostic, SourceSpan};
use serde::Deserialize;
use thiserror::Error;

use crate::fs;

/// The marker that stops CI from running again on the commit this tool makes.
pub(crate) const SKIP_CI_MARKER: &str = "[skip ci]";

/// A valid config, loaded from `changelog-updater.toml` or entirely defaulted.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) changelog: ChangelogConfig,
    #[serde(default)]
    pub(crate) git: GitConfig,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ChangelogConfig {
    /// Relative to the root of the repository.
    #[serde(default = "default_changelog_path")]
    pub(crate) path: PathBuf,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            path: default_changelog_path(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct GitConfig {
    #[serde(default = "default_remote")]
    pub(crate) remote: String,
    /// The branch which is checked out, committed to, and pushed.
    #[serde(default = "default_branch")]
    pub(crate) branch: String,
    #[serde(default = "default_commit_message")]
    commit_message: String,
    /// Set to `false` to only commit locally.
    #[serde(default = "default_push")]
    pub(crate) push: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) author: Option<Author>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            branch: default_branch(),
            commit_message: default_commit_message(),
            push: default_push(),
            author: None,
        }
    }
}

impl GitConfig {
    /// The message to commit with, always carrying [`SKIP_CI_MARKER`].
    pub(crate) fn commit_message(&self) -> String {
        let message = self.commit_message.trim();
        if message.contains(SKIP_CI_MARKER) {
            message.to_string()
        } else if message.is_empty() {
            default_commit_message()
        } else {
            format!("{message} {SKIP_CI_MARKER}")
        }
    }
}

/// Who to commit as, overriding whatever Git config is available.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct Author {
    pub(crate) name: String,
    pub(crate) email: String,
}

fn default_changelog_path() -> PathBuf {
    PathBuf::from("CHANGELOG.md")
}

fn default_remote() -> String {
    String::from("origin")
}

fn default_branch() -> String {
    String::from("main")
}

fn default_commit_message() -> String {
    format!("Update CHANGELOG {SKIP_CI_MARKER}")
}

const fn default_push() -> bool {
    true
}

impl Config {
    pub(crate) const CONFIG_PATH: &'static str = "changelog-updater.toml";

    /// Load the config file at `path`.
    ///
    /// If `explicit` is false, a missing file is not an error and every value is defaulted instead.
    ///
    /// ## Errors
    /// 1. `path` can't be read (or is missing when `explicit`)
    /// 2. The contents are not a valid config
    pub(crate) fn load(path: &Path, explicit: bool) -> Result<Self, Error> {
        if !explicit && !path.exists() {
            debug!("No {} found, using default config", path.display());
            return Ok(Self::default());
        }
        let source_code = fs::read_to_string(path)?;
        Self::parse(source_code)
    }

    fn parse(source_code: String) -> Result<Self, Error> {
        toml::from_str(&source_code).map_err(|err| Error::Parse {
            message: err.message().to_string(),
            span: err.span().map(SourceSpan::from),
            source_code,
        })
    }
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("Invalid config: {message}")]
    #[diagnostic(
        code(config::toml),
        help("Check the TOML is valid and only uses the `[changelog]` and `[git]` tables.")
    )]
    Parse {
        message: String,
        #[source_code]
        source_code: String,
        #[label("here")]
        span: Option<SourceSpan>,
    },
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fs(#[from] fs::Error),
}


#[cfg(test)]
mod test_commit_message {
    use super::*;

    fn with_message(message: &str) -> GitConfig {
        GitConfig {
            commit_message: message.to_string(),
            ..GitConfig::default()
        }
    }

    #[test]
    fn keeps_existing_marker() {
        assert_eq!(
            with_message("docs: changelog for release [skip ci]").commit_message(),
            "docs: changelog for release [skip ci]"
        );
    }

    #[test]
    fn appends_missing_marker() {
        assert_eq!(
            with_message("docs: changelog for release").commit_message(),
            "docs: changelog for release [skip ci]"
        );
    }

    #[test]
    fn blank_message_is_default() {
        assert_eq!(with_message("  ").commit_message(), "Update CHANGELOG [skip ci]");
    }
}
