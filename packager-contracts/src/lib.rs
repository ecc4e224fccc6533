// SPDX-License-Identifier: GPL-3.0-only

pub mod protocol;
pub mod traits;

pub use protocol::{PackagerError, PackagerErrorKind};
pub use traits::{DfUsage, FilesystemProbe, MountGuard, MountedFilesystem, PackageEngine};
