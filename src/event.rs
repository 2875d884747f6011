//! The release that triggered this run, and the ways of finding out about it.

use std::path::Path;

use log::{debug, warn};
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, Date, OffsetDateTime};

use crate::fs;

/// A published release: the two things that end up in the changelog, plus some context.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Release {
    /// The name of the release, used as the title of its changelog section.
    pub(crate) version_label: String,
    /// The free-text description of the release, written to the changelog as-is.
    pub(crate) notes: String,
    pub(crate) tag_name: Option<String>,
    pub(crate) published_at: Option<Date>,
}

impl Release {
    pub(crate) fn new(version_label: String, notes: String) -> Self {
        Self {
            version_label,
            notes,
            tag_name: None,
            published_at: None,
        }
    }
}

/// The `release` object shared by webhook payloads and the REST API.
#[derive(Debug, Deserialize)]
pub(crate) struct ReleasePayload {
    name: Option<String>,
    tag_name: Option<String>,
    body: Option<String>,
    published_at: Option<String>,
}

impl From<ReleasePayload> for Release {
    fn from(payload: ReleasePayload) -> Self {
        let ReleasePayload {
            name,
            tag_name,
            body,
            published_at,
        } = payload;
        let version_label = name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| tag_name.clone())
            .map(|label| label.trim().to_string())
            .unwrap_or_default();
        let published_at = published_at.and_then(|timestamp| {
            OffsetDateTime::parse(&timestamp, &Rfc3339)
                .map(OffsetDateTime::date)
                .map_err(|err| warn!("Ignoring unparseable release date {timestamp}: {err}"))
                .ok()
        });
        Self {
            version_label,
            notes: body.unwrap_or_default(),
            tag_name,
            published_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Payload {
    action: Option<String>,
    release: Option<ReleasePayload>,
}

/// What a webhook payload asks of us.
#[derive(Debug, Eq, PartialEq)]
pub(crate) enum Event {
    Published(Release),
    /// Any release action other than `published` (e.g. `edited`, `deleted`) is not our business.
    Ignored { action: String },
}

/// Read a webhook payload, like the one at `GITHUB_EVENT_PATH`.
pub(crate) fn load_payload(path: &Path) -> Result<Event, Error> {
    debug!("Reading release event from {}", path.display());
    let source = fs::read_to_string(path)?;
    parse_payload(&source)
}

fn parse_payload(source: &str) -> Result<Event, Error> {
    let Payload { action, release } = serde_json::from_str(source).map_err(Error::Json)?;
    match action {
        Some(action) if action != "published" => Ok(Event::Ignored { action }),
        _ => release
            .map(|release| Event::Published(release.into()))
            .ok_or(Error::MissingRelease),
    }
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("Could not parse release event: {0}")]
    #[diagnostic(
        code(event::json),
        help("The event payload must be the JSON document the platform sent for the release.")
    )]
    Json(#[source] serde_json::Error),
    #[error("The event payload does not describe a release")]
    #[diagnostic(
        code(event::missing_release),
        help("Make sure this only runs on `release` events, or pass --version-label and --notes.")
    )]
    MissingRelease,
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fs(#[from] fs::Error),
}
