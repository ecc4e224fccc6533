// SPDX-License-Identifier: GPL-3.0-only

//! Product and package records as returned by the package engine

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Install status of a resolvable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Installed,
    Selected,
    Removed,
    #[default]
    Available,
}

/// Who decided the pending transaction of a resolvable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactBy {
    /// Explicit user decision
    #[default]
    User,
    /// Decided by the dependency solver
    Solver,
    /// Requested by the installer itself
    Application,
}

/// Product identity as consumed from the engine's resolvable query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRef {
    pub name: String,
    pub version: String,
    pub arch: String,
    pub source_id: Option<i64>,
    pub status: ProductStatus,
    pub transact_by: TransactBy,
    /// The package backing this product (the product's release package)
    pub product_package: Option<String>,
}

impl ProductRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>, status: ProductStatus) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            status,
            ..Self::default()
        }
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.product_package = Some(package.into());
        self
    }

    pub fn with_transact_by(mut self, transact_by: TransactBy) -> Self {
        self.transact_by = transact_by;
        self
    }

    pub fn label(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.version)
        }
    }
}

/// Dependency relations of one package
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageDependencies {
    pub provides: Vec<String>,
    pub obsoletes: Vec<String>,
}

/// Rename facts: old product name mapped to every known successor
///
/// Successor lists keep insertion order and never contain duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenameEntry {
    renames: BTreeMap<String, Vec<String>>,
}

impl RenameEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `old_name -> new_name`, returns false if it was already known
    pub fn insert(&mut self, old_name: &str, new_name: &str) -> bool {
        let successors = self.renames.entry(old_name.to_string()).or_default();
        if successors.iter().any(|known| known == new_name) {
            return false;
        }

        successors.push(new_name.to_string());
        true
    }

    pub fn contains(&self, old_name: &str, new_name: &str) -> bool {
        self.renames
            .get(old_name)
            .is_some_and(|successors| successors.iter().any(|known| known == new_name))
    }

    pub fn successors(&self, old_name: &str) -> &[String] {
        self.renames.get(old_name).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames.iter().flat_map(|(old, successors)| {
            successors
                .iter()
                .map(move |new| (old.as_str(), new.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.renames.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for RenameEntry {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (old_name, new_name) in iter {
            table.insert(old_name, new_name);
        }
        table
    }
}
