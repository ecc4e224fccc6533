// SPDX-License-Identifier: GPL-3.0-only

use std::cell::Cell;
use std::collections::BTreeMap;

use packager_contracts::{PackageEngine, PackagerError};
use packager_types::{DiskUsage, DiskUsageTable, PackageDependencies, ProductRef};

/// Package engine answering from canned data
///
/// Counts product queries so tests can check that derived data is
/// recomputed rather than cached.
#[derive(Debug, Default)]
pub struct FakeEngine {
    products: Vec<ProductRef>,
    dependencies: BTreeMap<String, Vec<PackageDependencies>>,
    disk_usage: DiskUsageTable,
    unavailable: bool,
    product_queries: Cell<usize>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, product: ProductRef) -> Self {
        self.products.push(product);
        self
    }

    /// Register one dependency record for `package`
    pub fn with_dependencies(mut self, package: &str, dependencies: PackageDependencies) -> Self {
        self.dependencies
            .entry(package.to_string())
            .or_default()
            .push(dependencies);
        self
    }

    /// Shorthand for a product package obsoleting and providing the given strings
    pub fn with_product_package(
        self,
        package: &str,
        obsoletes: &[&str],
        provides: &[&str],
    ) -> Self {
        self.with_dependencies(
            package,
            PackageDependencies {
                obsoletes: obsoletes.iter().map(|dep| dep.to_string()).collect(),
                provides: provides.iter().map(|dep| dep.to_string()).collect(),
                ..PackageDependencies::default()
            },
        )
    }

    pub fn with_disk_usage(
        mut self,
        dir: &str,
        total_kib: u64,
        used_now_kib: u64,
        used_future_kib: u64,
    ) -> Self {
        self.disk_usage.insert(
            dir.to_string(),
            DiskUsage::new(total_kib, used_now_kib, used_future_kib),
        );
        self
    }

    /// Every query fails as if the engine was not initialized
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Replace the products, as a selection change in the engine would
    pub fn set_products(&mut self, products: Vec<ProductRef>) {
        self.products = products;
    }

    pub fn product_queries(&self) -> usize {
        self.product_queries.get()
    }

    fn check_available(&self) -> Result<(), PackagerError> {
        if self.unavailable {
            return Err(PackagerError::engine_unavailable("package engine not initialized"));
        }
        Ok(())
    }
}

impl PackageEngine for FakeEngine {
    fn disk_usage_table(&self) -> Result<DiskUsageTable, PackagerError> {
        self.check_available()?;
        Ok(self.disk_usage.clone())
    }

    fn products(&self) -> Result<Vec<ProductRef>, PackagerError> {
        self.product_queries.set(self.product_queries.get() + 1);
        self.check_available()?;
        Ok(self.products.clone())
    }

    fn package_dependencies(
        &self,
        package: &str,
    ) -> Result<Vec<PackageDependencies>, PackagerError> {
        self.check_available()?;
        Ok(self.dependencies.get(package).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use packager_types::ProductStatus;

    use super::*;

    #[test]
    fn counts_product_queries() {
        let engine = FakeEngine::new().with_product(ProductRef::new(
            "SLES",
            "15",
            ProductStatus::Installed,
        ));

        assert_eq!(engine.products().unwrap().len(), 1);
        assert_eq!(engine.products().unwrap().len(), 1);
        assert_eq!(engine.product_queries(), 2);
    }

    #[test]
    fn unavailable_engine_fails_every_query() {
        let engine = FakeEngine::new().with_disk_usage("/", 10, 1, 2).unavailable();
        assert!(engine.disk_usage_table().is_err());
        assert!(engine.package_dependencies("sles-release").is_err());
    }
}
