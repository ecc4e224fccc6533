// SPDX-License-Identifier: GPL-3.0-only

//! Product renames and add-on update detection
//!
//! Products get renamed or split between releases. When an add-on replaces
//! an installed product, [`ProductRenameResolver`] tells whether the new
//! product is a successor of the old one, so the pair is handled as an update
//! instead of an unrelated removal plus installation.

pub mod classify;
pub mod renames;
pub mod resolver;

pub use classify::{
    ProductChanges, ProductUpdate, Removal, RemovalSeverity, classify_product_changes,
};
pub use renames::{DEFAULT_RENAMES, extract_product_name_from_dependency_string};
pub use resolver::ProductRenameResolver;
