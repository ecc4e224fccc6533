// SPDX-License-Identifier: GPL-3.0-only

//! Product rename lookup
//!
//! Three tables answer whether `old -> new` is a known rename, checked in
//! this order:
//!
//! 1. renames registered at runtime through [`ProductRenameResolver::add_rename`]
//! 2. renames the product packages declare in their obsoletes/provides,
//!    derived from the engine on every lookup
//! 3. the built-in table of historical renames

use packager_contracts::{PackageEngine, PackagerError};
use packager_types::{ProductRef, RenameEntry};
use tracing::{debug, info, warn};

use crate::renames::{DEFAULT_RENAMES, extract_product_name_from_dependency_string};

pub struct ProductRenameResolver<E: PackageEngine> {
    engine: E,
    external: RenameEntry,
}

impl<E: PackageEngine> ProductRenameResolver<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            external: RenameEntry::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Has product `old_name` been renamed to `new_name`?
    pub fn renamed(&self, old_name: &str, new_name: &str) -> bool {
        let found = self.renamed_externally(old_name, new_name)
            || self.renamed_by_engine(old_name, new_name)
            || self.renamed_by_default(old_name, new_name);
        debug!("Product renamed '{}' -> '{}': {}", old_name, new_name, found);
        found
    }

    pub fn renamed_externally(&self, old_name: &str, new_name: &str) -> bool {
        self.external.contains(old_name, new_name)
    }

    /// Looks the rename up in a table derived from the engine right now.
    /// Engine failures count as "not renamed".
    pub fn renamed_by_engine(&self, old_name: &str, new_name: &str) -> bool {
        match self.engine_renames() {
            Ok(renames) => renames.contains(old_name, new_name),
            Err(err) => {
                warn!("Cannot derive product renames from the package engine: {}", err);
                false
            }
        }
    }

    pub fn renamed_by_default(&self, old_name: &str, new_name: &str) -> bool {
        DEFAULT_RENAMES.contains(old_name, new_name)
    }

    /// Register a rename; known pairs are left alone
    pub fn add_rename(&mut self, old_name: &str, new_name: &str) {
        if self.renamed_externally(old_name, new_name) {
            return;
        }

        info!("Adding product rename: '{}' => '{}'", old_name, new_name);
        self.external.insert(old_name, new_name);
    }

    pub fn external_renames(&self) -> &RenameEntry {
        &self.external
    }

    /// Renames declared by the product packages the engine currently knows
    ///
    /// Every product's release package is asked for its obsoletes and
    /// provides; each product dependency naming another product maps that
    /// name to the product.
    pub fn engine_renames(&self) -> Result<RenameEntry, PackagerError> {
        let mut renames = RenameEntry::new();

        for product in self.engine.products()? {
            let Some(package) = product.product_package.as_deref() else {
                continue;
            };

            for dependencies in self.engine.package_dependencies(package)? {
                let declared = dependencies
                    .obsoletes
                    .iter()
                    .chain(&dependencies.provides)
                    .filter_map(|dep| extract_product_name_from_dependency_string(dep));

                for old_name in declared {
                    if old_name != product.name && renames.insert(old_name, &product.name) {
                        debug!(
                            "Package {} renames product '{}' => '{}'",
                            package, old_name, product.name
                        );
                    }
                }
            }
        }

        Ok(renames)
    }

    /// Every known successor of `old_name`, highest priority table first
    pub fn renames_for(&self, old_name: &str) -> Vec<String> {
        let engine = self.engine_renames().unwrap_or_else(|err| {
            warn!("Cannot derive product renames from the package engine: {}", err);
            RenameEntry::new()
        });

        let mut successors: Vec<String> = Vec::new();
        for name in self
            .external
            .successors(old_name)
            .iter()
            .chain(engine.successors(old_name))
            .chain(DEFAULT_RENAMES.successors(old_name))
        {
            if !successors.contains(name) {
                successors.push(name.clone());
            }
        }

        successors
    }

    /// Is `new` the same product as `old`, or its renamed successor?
    pub fn replaces(&self, old: &ProductRef, new: &ProductRef) -> bool {
        old.name == new.name || self.renamed(&old.name, &new.name)
    }
}
