// SPDX-License-Identifier: GPL-3.0-only

use packager_types::{DiskUsageTable, PackageDependencies, ProductRef};

use crate::PackagerError;

/// Queries the packager needs from the external package engine.
///
/// Every call reflects the engine's current state, including the staged
/// package selection; implementations must not cache between calls.
pub trait PackageEngine {
    /// Per-directory `(total, used now, used future)` in KiB
    fn disk_usage_table(&self) -> Result<DiskUsageTable, PackagerError>;

    /// Properties of every product resolvable, with its pending status
    fn products(&self) -> Result<Vec<ProductRef>, PackagerError>;

    /// Dependency relations of every known package with the given name
    fn package_dependencies(&self, package: &str)
    -> Result<Vec<PackageDependencies>, PackagerError>;
}
