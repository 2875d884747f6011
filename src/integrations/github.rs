use log::debug;
use miette::Diagnostic;
use reqwest::{Client, Response};

use super::Token;
use crate::event::{Release, ReleasePayload};

const API_URL: &str = "https://api.github.com";

/// `owner/repo`, as in `GITHUB_REPOSITORY`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Repository {
    owner: String,
    repo: String,
}

impl std::str::FromStr for Repository {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(Error::InvalidRepository(s.to_string())),
        }
    }
}

/// Look up the published release for `tag`.
pub(crate) async fn fetch_release(
    repository: &Repository,
    tag: &str,
    token: Option<&Token>,
) -> Result<Release, Error> {
    fetch_release_from(API_URL, repository, tag, token).await
}

async fn fetch_release_from(
    api_url: &str,
    repository: &Repository,
    tag: &str,
    token: Option<&Token>,
) -> Result<Release, Error> {
    let Repository { owner, repo } = repository;
    let url = format!("{api_url}/repos/{owner}/{repo}/releases/tags/{tag}");
    debug!("Fetching release {tag} from {url}");

    let client = Client::new();
    let mut request = client
        .get(&url)
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", "changelog-updater");
    if let Some(token) = token {
        request = request.header("Authorization", format!("Bearer {}", token.expose()));
    }
    let payload: ReleasePayload = request
        .send()
        .await
        .and_then(Response::error_for_status)
        .map_err(|err| Error::ApiRequest {
            err: err.to_string(),
            activity: format!("fetching release {tag}"),
        })?
        .json()
        .await
        .map_err(|source| Error::ApiResponse {
            source,
            activity: "fetching release",
        })?;
    Ok(payload.into())
}

#[derive(Debug, Diagnostic, thiserror::Error)]
pub(crate) enum Error {
    #[error("Trouble communicating with GitHub while {activity}: {err}")]
    #[diagnostic(
        code(github::api_request_error),
        help(
            "There was a problem communicating with GitHub, this may be a network issue or a permissions issue."
        )
    )]
    ApiRequest { err: String, activity: String },
    #[error("Trouble decoding the response from GitHub while {activity}: {source}")]
    #[diagnostic(
        code(github::api_response_error),
        help("The response did not look like a GitHub release.")
    )]
    ApiResponse {
        source: reqwest::Error,
        activity: &'static str,
    },
    #[error("{0} is not a GitHub repository")]
    #[diagnostic(
        code(github::invalid_repository),
        help("Pass the repository as OWNER/REPO, the same format as GITHUB_REPOSITORY.")
    )]
    InvalidRepository(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test_repository {
    use rstest::rstest;

    use super::*;

    #[test]
    fn owner_and_repo() {
        let repository: Repository = "example/project".parse().unwrap();

        assert_eq!(
            repository,
            Repository {
                owner: String::from("example"),
                repo: String::from("project"),
            }
        );
    }

    #[rstest]
    #[case::no_slash("changelog")]
    #[case::no_owner("/changelog")]
    #[case::no_repo("owner/")]
    #[case::too_deep("owner/repo/extra")]
    fn invalid(#[case] input: &str) {
        let result = input.parse::<Repository>();

        assert!(matches!(result, Err(Error::InvalidRepository(_))));
    }

    #[tokio::test]
    async fn unreachable_api_is_a_request_error() {
        let repository: Repository = "owner/repo".parse().unwrap();

        let result = fetch_release_from("http://127.0.0.1:9", &repository, "v1.0.0", None).await;

        assert!(matches!(result, Err(Error::ApiRequest { .. })));
    }
}
