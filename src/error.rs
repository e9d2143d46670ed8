//! Error taxonomy for the analysis core
//!
//! Every failure the pipeline can produce is a deterministic input problem,
//! not a transient fault, so nothing here is retried. The caller (the CLI,
//! or whatever embeds the library) decides how to present them.
//!
//! | Variant      | Raised when |
//! |--------------|-------------|
//! | `Parse`      | the CSV file is missing, unreadable, malformed, or empty |
//! | `Validation` | channel count / time range / config conflict with the recording |
//! | `Range`      | a requested row window is empty or exceeds the table |
//! | `Analysis`   | a segment is too short for the FFT or one spectrogram window |
//! | `Write`      | a report or image artifact could not be written |

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// File missing, unreadable, or not a rectangular numeric table.
    #[error("cannot parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Parameters inconsistent with the loaded recording.
    #[error("invalid parameters: {0}")]
    Validation(String),

    /// Row-window computation produced an empty or out-of-bounds window.
    #[error("invalid sample range: {0}")]
    Range(String),

    /// Input segment too short for a meaningful spectrum.
    #[error("analysis failed: {0}")]
    Analysis(String),

    /// A report or artifact file could not be written.
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}
