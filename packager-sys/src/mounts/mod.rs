// SPDX-License-Identifier: GPL-3.0-only

pub mod statvfs;
pub mod table;

pub use statvfs::statvfs_usage;
pub use table::{is_pseudo_fs_type, parse_mount_table, read_mount_table, MountEntry};
