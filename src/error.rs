//! Error types for the interpreter

use crate::command::ExitCode;
use std::io;
use thiserror::Error;

/// Result type alias for interpreter operations
pub type ShellResult<T> = Result<T, ShellError>;

/// Everything that can go wrong while reading, launching or reaping a line.
///
/// Only [`ShellError::PipeCreation`] stops the processing of a line. The stage-level
/// variants are reported as diagnostics and processing carries on.
///
/// The OS error is part of each message and is not exposed again as `source()`.
#[derive(Error, Debug)]
pub enum ShellError {
    /// The OS refused to create an inter-stage pipe
    #[error("creating pipe for `{program}` failed: {cause}")]
    PipeCreation {
        program: String,
        cause: io::Error,
    },

    /// Spawning a stage failed (not found, permission denied, ...)
    #[error("starting process `{program}` failed: {cause}")]
    Launch {
        program: String,
        cause: io::Error,
    },

    /// Waiting for a launched stage failed
    #[error("waiting for `{program}` failed: {cause}")]
    Wait {
        program: String,
        cause: io::Error,
    },

    /// A stage ran and exited unsuccessfully
    #[error("command `{program}` exited with status {code}")]
    Status { program: String, code: ExitCode },

    /// The line source failed
    #[error("input error: {0}")]
    Input(String),

    /// IO error (prompt writing, etc.)
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// True for errors that abort the current line.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::PipeCreation { .. })
    }
}
