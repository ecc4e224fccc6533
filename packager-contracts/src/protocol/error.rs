// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What went wrong while talking to the package engine or the filesystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackagerErrorKind {
    /// The package engine is not initialized or refused the query
    EngineUnavailable,
    /// Mounting, unmounting or measuring a filesystem failed
    ProbeFailed,
    /// A helper tool such as `mount` or `btrfs` is not installed
    ToolMissing,
    Timeout,
    NotFound,
    PermissionDenied,
    InvalidInput,
}

impl PackagerErrorKind {
    pub fn describe(self) -> &'static str {
        match self {
            Self::EngineUnavailable => "package engine unavailable",
            Self::ProbeFailed => "filesystem probe failed",
            Self::ToolMissing => "helper tool missing",
            Self::Timeout => "timed out",
            Self::NotFound => "not found",
            Self::PermissionDenied => "permission denied",
            Self::InvalidInput => "invalid input",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}: {}", .kind.describe(), .message)]
pub struct PackagerError {
    pub kind: PackagerErrorKind,
    pub message: String,
}

impl PackagerError {
    pub fn new(kind: PackagerErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn engine_unavailable(message: impl Into<String>) -> Self {
        Self::new(PackagerErrorKind::EngineUnavailable, message)
    }

    pub fn probe_failed(message: impl Into<String>) -> Self {
        Self::new(PackagerErrorKind::ProbeFailed, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(PackagerErrorKind::NotFound, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_the_failing_side() {
        let error = PackagerError::probe_failed("mount: /dev/sdb1: can't read superblock");
        assert_eq!(
            error.to_string(),
            "filesystem probe failed: mount: /dev/sdb1: can't read superblock"
        );

        let error = PackagerError::engine_unavailable("not initialized");
        assert_eq!(error.to_string(), "package engine unavailable: not initialized");
    }

    #[test]
    fn packager_error_roundtrips() {
        let error = PackagerError::new(PackagerErrorKind::Timeout, "mount did not finish");
        let json = serde_json::to_string(&error).expect("serialize error");
        assert!(json.contains("\"timeout\""));
        let parsed: PackagerError = serde_json::from_str(&json).expect("deserialize error");
        assert_eq!(parsed, error);
    }
}
