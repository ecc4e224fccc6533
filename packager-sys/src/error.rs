// SPDX-License-Identifier: GPL-3.0-only

use std::time::Duration;

use packager_contracts::{PackagerError, PackagerErrorKind};
use thiserror::Error;

/// Error types for system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command failed: {command}; stderr: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Command timed out after {timeout:?}: {command}")]
    Timeout { command: String, timeout: Duration },

    #[error("Invalid mount table line: {0}")]
    InvalidMountLine(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;

impl From<SysError> for PackagerError {
    fn from(error: SysError) -> Self {
        let kind = match &error {
            SysError::Io(io) if io.kind() == std::io::ErrorKind::PermissionDenied => {
                PackagerErrorKind::PermissionDenied
            }
            SysError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                PackagerErrorKind::NotFound
            }
            SysError::Io(_) => PackagerErrorKind::ProbeFailed,
            SysError::CommandNotFound(_) => PackagerErrorKind::ToolMissing,
            SysError::CommandFailed { .. } => PackagerErrorKind::ProbeFailed,
            SysError::Timeout { .. } => PackagerErrorKind::Timeout,
            SysError::InvalidMountLine(_) | SysError::InvalidSize(_) => {
                PackagerErrorKind::InvalidInput
            }
        };

        PackagerError::new(kind, error.to_string())
    }
}
