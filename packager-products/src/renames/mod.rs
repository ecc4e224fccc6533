// SPDX-License-Identifier: GPL-3.0-only

pub mod defaults;
pub mod dependency;

pub use defaults::DEFAULT_RENAMES;
pub use dependency::extract_product_name_from_dependency_string;
