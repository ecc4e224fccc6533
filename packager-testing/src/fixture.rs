// SPDX-License-Identifier: GPL-3.0-only

//! Engine states described in TOML
//!
//! ```toml
//! [[products]]
//! name = "SLES"
//! version = "15"
//! status = "installed"
//! product_package = "sles-release"
//!
//! [packages.sles-release]
//! obsoletes = ["product:SUSE_SLES"]
//!
//! [disk_usage."/"]
//! total_kib = 10000000
//! used_now_kib = 4000000
//! used_future_kib = 4500000
//! ```

use std::collections::BTreeMap;

use packager_types::{DiskUsageTable, PackageDependencies, ProductRef};
use serde::{Deserialize, Serialize};

use crate::engine::FakeEngine;
use crate::errors::{Result, TestingError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineFixture {
    pub products: Vec<ProductRef>,
    /// Dependencies of product packages, keyed by package name
    pub packages: BTreeMap<String, PackageDependencies>,
    pub disk_usage: DiskUsageTable,
}

impl EngineFixture {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let fixture: Self = toml::from_str(raw)?;
        fixture.validate()?;
        Ok(fixture)
    }

    /// Every product package must have a dependency record
    pub fn validate(&self) -> Result<()> {
        for product in &self.products {
            if let Some(package) = &product.product_package
                && !self.packages.contains_key(package)
            {
                return Err(TestingError::UnknownPackage {
                    product: product.name.clone(),
                    package: package.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn into_engine(self) -> FakeEngine {
        let mut engine = FakeEngine::new();

        for product in self.products {
            engine = engine.with_product(product);
        }
        for (package, dependencies) in self.packages {
            engine = engine.with_dependencies(&package, dependencies);
        }
        for (dir, usage) in self.disk_usage {
            engine = engine.with_disk_usage(
                &dir,
                usage.total_kib,
                usage.used_now_kib,
                usage.used_future_kib,
            );
        }

        engine
    }
}
