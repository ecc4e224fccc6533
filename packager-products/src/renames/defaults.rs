// SPDX-License-Identifier: GPL-3.0-only

use packager_types::RenameEntry;
use serde::Deserialize;
use tracing::error;

// Load TOML data at compile time from the workspace resources
const PRODUCT_RENAMES_TOML: &str = include_str!("../../../resources/product_renames.toml");

#[derive(Deserialize)]
struct RenameCatalog {
    renames: RenameEntry,
}

/// Product renames shipped with the packager, lowest lookup priority
pub static DEFAULT_RENAMES: std::sync::LazyLock<RenameEntry> = std::sync::LazyLock::new(|| {
    match toml::from_str::<RenameCatalog>(PRODUCT_RENAMES_TOML) {
        Ok(catalog) => catalog.renames,
        Err(err) => {
            error!("Invalid built-in product rename table: {}", err);
            RenameEntry::new()
        }
    }
});
