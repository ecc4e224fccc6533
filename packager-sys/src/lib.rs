// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system operations for disk space probing
//!
//! This crate provides the production `FilesystemProbe`:
//! - Read-only probe mounts through mount/umount with a bounded timeout
//! - `statvfs` based df figures
//! - Mount table parsing
//! - Btrfs usage and snapshot detection via the btrfs CLI
//!
//! Mounting requires elevated privileges, the installer runs as root.

pub mod btrfs;
pub mod cmd;
pub mod error;
pub mod mounts;
pub mod probe;

pub use error::{Result, SysError};
pub use mounts::{parse_mount_table, statvfs_usage, MountEntry};
pub use probe::SystemProbe;
