use std::path::{Path, PathBuf};

use git2::{
    build::{CheckoutBuilder, RepoBuilder},
    Cred, CredentialType, ErrorCode, FetchOptions, Oid, PushOptions, RemoteCallbacks, Repository,
    Signature, StatusOptions,
};
use log::{debug, info, trace};
use miette::Diagnostic;

use super::Token;
use crate::config::Author;

/// Who commits when neither the config nor Git config say otherwise.
const FALLBACK_AUTHOR_NAME: &str = "github-actions[bot]";
const FALLBACK_AUTHOR_EMAIL: &str = "41898282+github-actions[bot]@users.noreply.github.com";

/// Make `directory` a working tree at the tip of `branch` on `remote`.
///
/// An existing repository is fetched and force-moved to the remote tip. If `directory` is not a
/// repository, `clone_url` (if any) is cloned into it.
pub(crate) fn checkout(
    directory: &Path,
    clone_url: Option<&str>,
    remote: &str,
    branch: &str,
    token: Option<&Token>,
) -> Result<(), Error> {
    match Repository::open(directory) {
        Ok(repo) => update_existing(&repo, remote, branch, token),
        Err(err) if err.code() == ErrorCode::NotFound => {
            let Some(url) = clone_url else {
                return Err(ErrorKind::NotARepository(directory.into()).into());
            };
            clone(url, directory, remote, branch, token)
        }
        Err(err) => Err(ErrorKind::OpenRepo(err).into()),
    }
}

fn clone(
    url: &str,
    directory: &Path,
    remote: &str,
    branch: &str,
    token: Option<&Token>,
) -> Result<(), Error> {
    info!("Cloning {branch} into {}", directory.display());
    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(remote_callbacks(token));
    let mut builder = RepoBuilder::new();
    builder.branch(branch).fetch_options(fetch_options);
    if remote != "origin" {
        builder.remote_create(|repo, _, url| repo.remote(remote, url));
    }
    builder
        .clone(url, directory)
        .map_err(|err| network_error(err, branch))?;
    Ok(())
}

fn update_existing(
    repo: &Repository,
    remote_name: &str,
    branch: &str,
    token: Option<&Token>,
) -> Result<(), Error> {
    if has_uncommitted_changes(repo)? {
        return Err(ErrorKind::UncommittedChanges.into());
    }
    let mut remote = repo
        .find_remote(remote_name)
        .map_err(|_| ErrorKind::MissingRemote(remote_name.to_string()))?;
    let tracking_ref = format!("refs/remotes/{remote_name}/{branch}");
    let refspec = format!("+refs/heads/{branch}:{tracking_ref}");
    info!("Fetching {branch} from {remote_name}");
    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(remote_callbacks(token));
    remote
        .fetch(&[&refspec], Some(&mut fetch_options), None)
        .map_err(|err| network_error(err, branch))?;

    let tip = repo
        .find_reference(&tracking_ref)
        .map_err(|_| ErrorKind::MissingBranch(branch.to_string()))?
        .peel_to_commit()?;
    debug!("Tip of {remote_name}/{branch} is {}", tip.id());

    repo.checkout_tree(tip.as_object(), Some(CheckoutBuilder::new().force()))
        .map_err(ErrorKind::IncompleteCheckout)?;
    let local_ref = format!("refs/heads/{branch}");
    repo.reference(
        &local_ref,
        tip.id(),
        true,
        &format!("changelog-updater: reset to {remote_name}/{branch}"),
    )?;
    repo.set_head(&local_ref)?;
    Ok(())
}

/// Changes to tracked files would be lost by the forced checkout. Untracked files are left alone.
fn has_uncommitted_changes(repo: &Repository) -> Result<bool, Error> {
    if repo.is_bare() {
        return Err(ErrorKind::BareRepository.into());
    }
    let statuses = repo.statuses(Some(
        StatusOptions::new()
            .include_untracked(false)
            .include_ignored(false),
    ))?;
    Ok(!statuses.is_empty())
}

/// Commit `path` (relative to the root of the repo in `directory`) on the current branch.
///
/// Only `path` is staged; anything else that was in the index is unstaged first. Returns `None`
/// without committing if `path` is the same as in `HEAD`.
pub(crate) fn commit_file(
    directory: &Path,
    path: &Path,
    message: &str,
    author: Option<&Author>,
) -> Result<Option<Oid>, Error> {
    let repo = Repository::open(directory).map_err(ErrorKind::OpenRepo)?;
    let status = repo.status_file(path)?;
    if status.is_empty() {
        debug!("{} matches HEAD", path.display());
        return Ok(None);
    }
    trace!("{} has status {status:?}", path.display());

    let head = repo.head()?;
    if !head.is_branch() {
        return Err(ErrorKind::NotOnAGitBranch.into());
    }
    let parent = head.peel_to_commit()?;
    let mut index = repo.index()?;
    index.read_tree(&parent.tree()?)?;
    index.add_path(path)?;
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;

    let signature = signature(&repo, author)?;
    let oid = repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &[&parent],
    )?;
    info!("Committed {} as {oid}", path.display());
    Ok(Some(oid))
}

fn signature(repo: &Repository, author: Option<&Author>) -> Result<Signature<'static>, Error> {
    if let Some(Author { name, email }) = author {
        return Signature::now(name, email).map_err(|_| ErrorKind::NoCommitter.into());
    }
    repo.signature().or_else(|_| {
        debug!("No Git identity configured, committing as {FALLBACK_AUTHOR_NAME}");
        Signature::now(FALLBACK_AUTHOR_NAME, FALLBACK_AUTHOR_EMAIL)
            .map_err(|_| ErrorKind::NoCommitter.into())
    })
}

/// Push `branch` to the branch of the same name on `remote`. Never forced.
pub(crate) fn push(
    directory: &Path,
    remote_name: &str,
    branch: &str,
    token: Option<&Token>,
) -> Result<(), Error> {
    let repo = Repository::open(directory).map_err(ErrorKind::OpenRepo)?;
    let mut remote = repo
        .find_remote(remote_name)
        .map_err(|_| ErrorKind::MissingRemote(remote_name.to_string()))?;
    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
    info!("Pushing {branch} to {remote_name}");

    let mut rejection = None;
    {
        let mut callbacks = remote_callbacks(token);
        callbacks.push_update_reference(|reference, status| {
            if let Some(status) = status {
                rejection = Some(format!("{reference}: {status}"));
            }
            Ok(())
        });
        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);
        remote
            .push(&[&refspec], Some(&mut push_options))
            .map_err(|err| match err.code() {
                ErrorCode::NotFastForward => ErrorKind::PushRejected {
                    branch: branch.to_string(),
                    reason: err.message().to_string(),
                },
                ErrorCode::Auth => ErrorKind::Authentication(err),
                _ => ErrorKind::Push(err),
            })?;
    }
    if let Some(reason) = rejection {
        return Err(ErrorKind::PushRejected {
            branch: branch.to_string(),
            reason,
        }
        .into());
    }
    Ok(())
}

/// Answers credential requests with `token` exactly once, so a rejected token fails fast.
fn remote_callbacks(token: Option<&Token>) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    if let Some(token) = token {
        let mut asked = false;
        callbacks.credentials(move |_url, username, allowed| {
            if asked {
                return Err(git2::Error::new(
                    ErrorCode::Auth,
                    git2::ErrorClass::Http,
                    "the access token was rejected",
                ));
            }
            asked = true;
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                Cred::userpass_plaintext(username.unwrap_or("x-access-token"), token.expose())
            } else {
                Err(git2::Error::new(
                    ErrorCode::Auth,
                    git2::ErrorClass::Http,
                    "only token authentication over HTTPS is supported",
                ))
            }
        });
    }
    callbacks
}

fn network_error(err: git2::Error, branch: &str) -> ErrorKind {
    match err.code() {
        ErrorCode::Auth => ErrorKind::Authentication(err),
        ErrorCode::NotFound if err.class() == git2::ErrorClass::Reference => {
            ErrorKind::MissingBranch(branch.to_string())
        }
        _ => ErrorKind::Fetch(err),
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
#[error(transparent)]
#[diagnostic(transparent)]
pub(crate) struct Error(Box<ErrorKind>);

impl<T: Into<ErrorKind>> From<T> for Error {
    fn from(kind: T) -> Self {
        Self(Box::new(kind.into()))
    }
}

#[derive(Debug, Diagnostic, thiserror::Error)]
enum ErrorKind {
    #[error("Could not open Git repository: {0}")]
    #[diagnostic(
        code(git::open_repo),
        help("Make sure the directory is a Git repository and that you have permission to access it.")
    )]
    OpenRepo(#[source] git2::Error),
    #[error("{} is not a Git repository", .0.display())]
    #[diagnostic(
        code(git::not_a_repository),
        help("Run from a checkout of the repository, or pass --repository to clone one.")
    )]
    NotARepository(PathBuf),
    #[error("The repository is bare")]
    #[diagnostic(
        code(git::bare_repository),
        help("The changelog has to be written to a working tree, use a non-bare checkout.")
    )]
    BareRepository,
    #[error("No remote named {0}")]
    #[diagnostic(
        code(git::missing_remote),
        help("Set `git.remote` in the config to the name of the remote to fetch from and push to.")
    )]
    MissingRemote(String),
    #[error("The remote has no branch named {0}")]
    #[diagnostic(
        code(git::missing_branch),
        help("Set `git.branch` in the config to the branch the changelog lives on.")
    )]
    MissingBranch(String),
    #[error("Authentication with the remote failed: {0}")]
    #[diagnostic(
        code(git::authentication),
        help("Check that the token (--token or GITHUB_TOKEN) is valid and can write to the repository.")
    )]
    Authentication(#[source] git2::Error),
    #[error("Could not fetch from the remote: {0}")]
    #[diagnostic(
        code(git::fetch),
        help("Check the remote URL and your network connection.")
    )]
    Fetch(#[source] git2::Error),
    #[error("Uncommitted changes")]
    #[diagnostic(
        code(git::uncommitted_changes),
        help("Checking out the branch would discard changes to tracked files. Commit or stash them first.")
    )]
    UncommittedChanges,
    #[error("Could not complete checkout")]
    #[diagnostic(
        code(git::incomplete_checkout),
        help("The working tree could not be updated to the tip of the branch, HEAD was not moved.")
    )]
    IncompleteCheckout(#[source] git2::Error),
    #[error("Not on the tip of a Git branch.")]
    #[diagnostic(
        code(git::not_a_branch),
        help("The changelog can only be committed on top of a branch.")
    )]
    NotOnAGitBranch,
    #[error("Could not determine Git committer to commit changes")]
    #[diagnostic(
        code(git::no_committer),
        help("Set `name` and `email` under `[git.author]` in the config.")
    )]
    NoCommitter,
    #[error("The remote rejected the push to {branch}: {reason}")]
    #[diagnostic(
        code(git::push_rejected),
        help("Someone else updated the branch first. Nothing was changed on the remote, run this again.")
    )]
    PushRejected { branch: String, reason: String },
    #[error("Could not push to the remote: {0}")]
    #[diagnostic(
        code(git::push),
        help("Check that the token has permission to push to the branch.")
    )]
    Push(#[source] git2::Error),
    #[error("Unknown Git error: {0}")]
    #[diagnostic(
        code(git::libgit2),
        help(
        "Something went wrong when interacting with Git that we don't have an explanation for. \
                    Maybe try performing the operation manually?"
        )
    )]
    Git(#[from] git2::Error),
}
