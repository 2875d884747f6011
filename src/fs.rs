//! Proxies to FS utils that _either_ actually write to files or log what would happen (for dry runs).

use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};

use log::{info, trace};
use miette::Diagnostic;
use thiserror::Error;

use crate::state::RunType;

/// Writes to a file if this is not a dry run, or logs just the diff if it is.
pub(crate) fn write<C: AsRef<[u8]> + Display, Diff: Display>(
    to_write: WriteType<C, Diff>,
    path: &Path,
) -> Result<(), Error> {
    match to_write {
        WriteType::DryRun(diff) => {
            info!("Would add the following to {}: {diff}", path.display());
            Ok(())
        }
        WriteType::Real(contents) => {
            trace!("Writing {} to {}", contents, path.display());
            std::fs::write(path, contents).map_err(|source| Error::Write {
                path: path.into(),
                source,
            })
        }
    }
}

pub(crate) enum WriteType<Real, DryRun> {
    Real(Real),
    DryRun(DryRun),
}

pub(crate) fn create_dir(path: RunType<&Path>) -> Result<(), Error> {
    match path {
        RunType::DryRun(path) => {
            info!("Would create directory {}", path.display());
            Ok(())
        }
        RunType::Real(path) => {
            trace!("Creating directory {}", path.display());
            std::fs::create_dir_all(path).map_err(|source| Error::Write {
                path: path.into(),
                source,
            })
        }
    }
}

pub(crate) fn read_to_string<P: AsRef<Path> + Into<PathBuf>>(path: P) -> Result<String, Error> {
    std::fs::read_to_string(path.as_ref()).map_err(|source| Error::Read {
        path: path.into(),
        source,
    })
}

/// Like [`read_to_string`], but a missing file reads as empty.
pub(crate) fn read_to_string_or_default(path: &Path) -> Result<String, Error> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            trace!("{} does not exist yet", path.display());
            Ok(String::new())
        }
        Err(source) => Err(Error::Read {
            path: path.into(),
            source,
        }),
    }
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("Error writing to {path}: {source}")]
    #[diagnostic(
        code(fs::write),
        help("Make sure you have permission to write to this file.")
    )]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Error reading from {path}: {source}")]
    #[diagnostic(
        code(fs::read),
        help("Make sure you have permission to read this file.")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
