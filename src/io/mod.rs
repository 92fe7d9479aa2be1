//! Text input and output.
//!
//! Readers for gSpan graph files and tab separated activity files, and
//! the result report renderer.

pub mod activity;
pub mod gsp;
pub mod report;

/// Error type for reading input files.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// A line could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// Reading failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

pub use activity::read_activities;
pub use gsp::read_gsp;
pub use report::{smarts, ActivityMap, ReportFormat, ReportWriter};
