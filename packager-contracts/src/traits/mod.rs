// SPDX-License-Identifier: GPL-3.0-only

pub mod engine;
pub mod probe;

pub use engine::PackageEngine;
pub use probe::{DfUsage, FilesystemProbe, MountGuard, MountedFilesystem};
