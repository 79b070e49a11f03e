//! Top-level error type of report compilation and export.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::charts::ChartError;
use crate::survey::InputError;

/// Errors that abort a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The survey result is missing or malformed.
    #[error("invalid survey result")]
    Input(#[from] InputError),
    /// The backend HTTP client could not be created.
    #[error("failed to set up the backend client")]
    Backend(#[from] reqwest::Error),
    /// A chart could not be rasterised.
    #[error("failed to draw chart")]
    Chart(#[from] ChartError),
    /// The PDF could not be laid out or rendered.
    #[error("failed to render PDF")]
    Pdf(#[from] genpdf::error::Error),
    /// The PDF could not be written to disk.
    #[error("failed to write report to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Outline bookmarks could not be added to the rendered PDF.
    #[cfg(feature = "bookmarks")]
    #[error("failed to add bookmarks")]
    Bookmarks(#[from] crate::bookmarks::BookmarkError),
}
