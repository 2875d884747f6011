use std::{fmt::Display, path::PathBuf};

use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;
use time::{macros::format_description, Date};

use crate::{event::Release, fs};

/// A Markdown changelog, newest release first.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Changelog {
    /// The path to the CHANGELOG file
    pub(crate) path: PathBuf,
    /// The content that's been written to `path`
    pub(crate) content: String,
    /// The header level of the title of each release (the version + date)
    release_header_level: HeaderLevel,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum HeaderLevel {
    H1,
    H2,
}

impl HeaderLevel {
    const fn as_str(self) -> &'static str {
        match self {
            Self::H1 => "#",
            Self::H2 => "##",
        }
    }
}

impl Display for HeaderLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Changelog {
    /// Read the changelog at `path`. A file that doesn't exist yet is an empty changelog.
    pub(crate) fn load(path: PathBuf) -> Result<Self, fs::Error> {
        let content = fs::read_to_string_or_default(&path)?;
        Ok(Self::new(path, content))
    }

    #[must_use]
    pub(crate) fn new(path: PathBuf, content: String) -> Self {
        // Usually the first heading is the title of the document and the second is the latest
        // release. A changelog that started out empty has no title.
        let release_header_level = {
            let mut headings = scan(&content).filter_map(|(_, heading)| heading);
            match headings.next() {
                Some(first) if looks_like_release(first.title) => first.level,
                Some(_) => headings
                    .next()
                    .map_or(HeaderLevel::H2, |second| second.level),
                None => HeaderLevel::H2,
            }
        };
        Self {
            path,
            content,
            release_header_level,
        }
    }

    /// Update `self.content` with a new section for `release`, return the section being added.
    ///
    /// The new section goes right before the most recent release already in the changelog (after
    /// the title and any "Unreleased" section), or at the end if there are no releases yet.
    /// Existing lines are kept byte for byte, and the section uses the file's line endings.
    ///
    /// Returns `None` without touching `self.content` if the release has no notes.
    ///
    /// ## Errors
    /// 1. There are notes, but no version label to put them under
    /// 2. `date` can't be formatted
    pub(crate) fn with_release(
        &mut self,
        release: &Release,
        date: Date,
    ) -> Result<Option<String>, Error> {
        let notes = release.notes.trim_end().trim_start_matches(['\r', '\n']);
        if notes.is_empty() {
            return Ok(None);
        }
        let version_label = release.version_label.trim();
        if version_label.is_empty() {
            return Err(Error::MissingVersionLabel);
        }
        let date = date
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(Error::TimeFormat)?;
        let eol = line_ending(&self.content);
        let new_changes = format!(
            "{header_level} {version_label} ({date}){eol}{eol}{notes}",
            header_level = self.release_header_level,
        );

        let mut not_written = true;
        let mut new_content = String::with_capacity(self.content.len() + new_changes.len() + 4);
        let mut first_header = true;
        for (line, heading) in scan(&self.content) {
            if let Some(heading) = heading {
                if not_written && self.is_release_title(&heading, first_header) {
                    // Insert new changes before the next release in the changelog
                    new_content.push_str(&new_changes);
                    new_content.push_str(eol);
                    new_content.push_str(eol);
                    not_written = false;
                }
                first_header = false;
            }
            new_content.push_str(line);
        }

        if not_written {
            if !new_content.is_empty() {
                if !new_content.ends_with('\n') {
                    new_content.push_str(eol);
                }
                if !new_content.ends_with(&format!("{eol}{eol}")) {
                    new_content.push_str(eol);
                }
            }
            new_content.push_str(&new_changes);
        }

        let ends_with_newline = self.content.ends_with('\n') || self.content.is_empty();
        if ends_with_newline && !new_content.ends_with('\n') {
            new_content.push_str(eol);
        }

        self.content = new_content;
        Ok(Some(new_changes))
    }

    /// Whether `heading` is the title of a release already in the changelog.
    fn is_release_title(&self, heading: &Heading, first_header: bool) -> bool {
        if heading.level != self.release_header_level {
            return false;
        }
        if first_header && !looks_like_release(heading.title) {
            // Something like `# Changelog`, the title of the whole document
            return false;
        }
        !is_unreleased(heading.title)
    }
}

/// A Markdown heading at a level release titles can have.
struct Heading<'a> {
    level: HeaderLevel,
    title: &'a str,
}

impl<'a> Heading<'a> {
    /// `# title` or `## title`. `#123` and deeper levels are not release headings.
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let (level, title) = if let Some(title) = line.strip_prefix("## ") {
            (HeaderLevel::H2, title)
        } else if let Some(title) = line.strip_prefix("# ") {
            (HeaderLevel::H1, title)
        } else {
            return None;
        };
        let title = title.trim();
        (!title.is_empty()).then_some(Self { level, title })
    }
}

/// Every line of `content` with its line ending, paired with the heading it is, if any.
///
/// Lines in fenced code blocks are never headings.
fn scan(content: &str) -> impl Iterator<Item = (&str, Option<Heading<'_>>)> {
    let mut fence: Option<&'static str> = None;
    content.split_inclusive('\n').map(move |line| {
        let trimmed = line.trim_start();
        let marker = ["```", "~~~"]
            .into_iter()
            .find(|marker| trimmed.starts_with(marker));
        if let Some(marker) = marker {
            match fence {
                None => fence = Some(marker),
                Some(open) if open == marker => fence = None,
                Some(_) => {}
            }
            return (line, None);
        }
        if fence.is_some() {
            (line, None)
        } else {
            (line, Heading::parse(line))
        }
    })
}

/// The line ending of the first line, so new lines match the rest of the file.
fn line_ending(content: &str) -> &'static str {
    match content.find('\n') {
        Some(end) if content[..end].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// A version number or an "Unreleased" placeholder, as opposed to the title of the document.
fn looks_like_release(title: &str) -> bool {
    title.contains(|c: char| c.is_ascii_digit()) || is_unreleased(title)
}

fn is_unreleased(title: &str) -> bool {
    title
        .trim_start_matches('[')
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .is_some_and(|word| word.eq_ignore_ascii_case("unreleased"))
}

/// The release titles currently in `content`, newest first. Only used to describe what happened.
pub(crate) fn release_titles(changelog: &Changelog) -> Vec<String> {
    let mut first_header = true;
    scan(&changelog.content)
        .filter_map(|(_, heading)| heading)
        .filter(|heading| {
            let is_title = changelog.is_release_title(heading, first_header);
            first_header = false;
            is_title
        })
        .map(|heading| heading.title.to_string())
        .collect_vec()
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("The release has notes but no version label")]
    #[diagnostic(
        code(changelog::missing_version_label),
        help("Give the release a name (or a tag), it is used as the title of the changelog section.")
    )]
    MissingVersionLabel,
    #[error("Could not format the release date: {0}")]
    #[diagnostic(code(changelog::date))]
    TimeFormat(#[source] time::error::Format),
}
