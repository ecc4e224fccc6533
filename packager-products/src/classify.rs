// SPDX-License-Identifier: GPL-3.0-only

//! Update vs. new install classification of pending product changes
//!
//! A product selected for installation while another is marked for removal
//! is an update when both carry the same name or the removed one was renamed
//! to the selected one.

use packager_contracts::{PackageEngine, PackagerError};
use packager_types::{ProductRef, ProductStatus, TransactBy};
use serde::Serialize;
use tracing::{info, warn};

use crate::resolver::ProductRenameResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalSeverity {
    /// Removal the user asked for
    Info,
    /// Removal decided by the solver, usually a missing update path
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductUpdate {
    pub old: ProductRef,
    pub new: ProductRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removal {
    pub product: ProductRef,
    pub severity: RemovalSeverity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductChanges {
    pub updates: Vec<ProductUpdate>,
    pub new_installs: Vec<ProductRef>,
    pub removals: Vec<Removal>,
}

impl ProductChanges {
    /// Solver removals without a replacement
    pub fn unexpected_removals(&self) -> impl Iterator<Item = &Removal> {
        self.removals
            .iter()
            .filter(|removal| removal.severity == RemovalSeverity::Warning)
    }
}

/// Pair selected and removed products into updates
pub fn classify_product_changes<E: PackageEngine>(
    resolver: &ProductRenameResolver<E>,
    products: &[ProductRef],
) -> ProductChanges {
    let selected: Vec<&ProductRef> = products
        .iter()
        .filter(|product| product.status == ProductStatus::Selected)
        .collect();
    let removed: Vec<&ProductRef> = products
        .iter()
        .filter(|product| product.status == ProductStatus::Removed)
        .collect();

    let mut changes = ProductChanges::default();
    let mut replaced = vec![false; removed.len()];

    for new in selected {
        let mut updates_any = false;
        for (index, old) in removed.iter().enumerate() {
            if resolver.replaces(old, new) {
                info!("Product {} updates {}", new.label(), old.label());
                changes.updates.push(ProductUpdate {
                    old: (*old).clone(),
                    new: new.clone(),
                });
                replaced[index] = true;
                updates_any = true;
            }
        }

        if !updates_any {
            info!("New product installation: {}", new.label());
            changes.new_installs.push(new.clone());
        }
    }

    for (old, was_replaced) in removed.into_iter().zip(replaced) {
        if was_replaced {
            continue;
        }

        let severity = match old.transact_by {
            TransactBy::Solver => {
                warn!("Product {} will be removed by the solver", old.label());
                RemovalSeverity::Warning
            }
            TransactBy::User | TransactBy::Application => {
                info!("Product {} will be removed", old.label());
                RemovalSeverity::Info
            }
        };

        changes.removals.push(Removal {
            product: old.clone(),
            severity,
        });
    }

    changes
}

impl<E: PackageEngine> ProductRenameResolver<E> {
    /// Classify the products the engine currently has pending
    pub fn product_changes(&self) -> Result<ProductChanges, PackagerError> {
        let products = self.engine().products()?;
        Ok(classify_product_changes(self, &products))
    }
}
