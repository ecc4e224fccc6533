// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for installer package management
//!
//! This crate defines the value types shared by every layer of the packager:
//!
//! - **packager-contracts**: the engine and probe traits exchange these types
//! - **packager-space**: builds `PartitionUsage` rows and emits space warnings
//! - **packager-products**: reads `ProductRef` records and keeps `RenameEntry` tables
//!
//! ## Units
//!
//! Partition records are kept in bytes. The package engine's disk-usage table
//! is keyed in KiB (that is what the engine reports), so `DiskUsage` and the
//! warnings derived from it are in KiB as well.

pub mod common;
pub mod partition;
pub mod product;
pub mod usage;

pub use common::{GIB, KIB, MIB, bytes_to_pretty, format_size, kib_to_bytes, size_from_string};
pub use partition::{FilesystemKind, PartitionUsage};
pub use product::{PackageDependencies, ProductRef, ProductStatus, RenameEntry, TransactBy};
pub use usage::{DiskUsage, DiskUsageTable, FailedMount, FreeSpaceWarning, SpaceWarning};
