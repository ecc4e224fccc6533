// SPDX-License-Identifier: GPL-3.0-only

//! Partition records used for disk space accounting

use serde::{Deserialize, Serialize};

use crate::common::KIB;

/// Filesystem types the space estimator knows how to model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilesystemKind {
    Ext2,
    Ext3,
    Ext4,
    Xfs,
    Reiser,
    Jfs,
    Btrfs,
    Vfat,
    Ntfs,
    Nfs,
    #[default]
    Unknown,
}

impl FilesystemKind {
    /// Parse from a filesystem type string as found in mount tables
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ext2" => Self::Ext2,
            "ext3" => Self::Ext3,
            "ext4" => Self::Ext4,
            "xfs" => Self::Xfs,
            "reiserfs" | "reiser" => Self::Reiser,
            "jfs" => Self::Jfs,
            "btrfs" => Self::Btrfs,
            "vfat" | "fat" | "fat32" => Self::Vfat,
            "ntfs" | "ntfs3" | "ntfs-3g" => Self::Ntfs,
            "nfs" | "nfs4" => Self::Nfs,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ext2 => "ext2",
            Self::Ext3 => "ext3",
            Self::Ext4 => "ext4",
            Self::Xfs => "xfs",
            Self::Reiser => "reiserfs",
            Self::Jfs => "jfs",
            Self::Btrfs => "btrfs",
            Self::Vfat => "vfat",
            Self::Ntfs => "ntfs",
            Self::Nfs => "nfs",
            Self::Unknown => "unknown",
        }
    }

    /// Is this one of ext2/3/4?
    pub fn is_ext(self) -> bool {
        matches!(self, Self::Ext2 | Self::Ext3 | Self::Ext4)
    }

    /// Foreign filesystems whose free space estimates are unreliable.
    ///
    /// These are left out of the space accounting entirely.
    pub fn is_ignored_for_accounting(self) -> bool {
        matches!(self, Self::Vfat | Self::Ntfs)
    }
}

impl std::fmt::Display for FilesystemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mounted (or planned) filesystem relevant to the install target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionUsage {
    // === Identity ===
    /// Mount path as the engine's disk-usage table keys it ("/", "boot", "usr", ...)
    pub mount_path: String,

    /// Block device backing the filesystem (e.g. "/dev/sda2")
    pub device: String,

    /// Filesystem type, drives the overhead formulas
    pub filesystem_kind: FilesystemKind,

    // === Accounting (bytes) ===
    /// Current filesystem size
    pub total_bytes: u64,

    /// Space used before the proposed transaction
    pub used_now_bytes: u64,

    /// Space used after the proposed transaction
    pub used_future_bytes: u64,

    /// Usable free space after overhead and spare subtraction, never negative
    pub free_bytes: u64,

    // === Geometry and tuning ===
    /// Partition size in KiB
    pub size_kb: u64,

    /// Filesystem block size
    pub block_size_bytes: u32,

    /// Percentage of blocks reserved for root (ext `-m`), 0 when unset
    pub reserved_percent: f64,

    /// Whether an ext3/4 filesystem carries a journal
    pub has_journal: bool,

    /// Explicit JFS log size in MiB, if one was requested
    pub jfs_log_size_mb: Option<u64>,

    /// Mount options planned for this filesystem
    pub mount_options: Vec<String>,

    // === State ===
    pub read_only: bool,

    /// The filesystem will be created or formatted by the installer
    pub is_create_or_format: bool,

    /// Persistent mounts end up in the target's fstab
    pub persistent: bool,

    /// Btrfs with snapshots: deleted files keep occupying space
    pub growonly: bool,
}

impl Default for PartitionUsage {
    fn default() -> Self {
        Self {
            mount_path: String::new(),
            device: String::new(),
            filesystem_kind: FilesystemKind::Unknown,
            total_bytes: 0,
            used_now_bytes: 0,
            used_future_bytes: 0,
            free_bytes: 0,
            size_kb: 0,
            block_size_bytes: Self::DEFAULT_BLOCK_SIZE,
            reserved_percent: 0.0,
            has_journal: true,
            jfs_log_size_mb: None,
            mount_options: Vec::new(),
            read_only: false,
            is_create_or_format: false,
            persistent: true,
            growonly: false,
        }
    }
}

impl PartitionUsage {
    pub const DEFAULT_BLOCK_SIZE: u32 = 4096;

    /// A planned filesystem of the given kind and size
    pub fn new(mount_path: impl Into<String>, kind: FilesystemKind, size_kb: u64) -> Self {
        Self {
            mount_path: mount_path.into(),
            filesystem_kind: kind,
            size_kb,
            total_bytes: size_kb.saturating_mul(KIB),
            ..Self::default()
        }
    }

    /// Partition size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.size_kb.saturating_mul(KIB)
    }

    /// Block size, falling back to the default for a zero value
    pub fn block_size(&self) -> u64 {
        if self.block_size_bytes == 0 {
            u64::from(Self::DEFAULT_BLOCK_SIZE)
        } else {
            u64::from(self.block_size_bytes)
        }
    }

    /// Free space in KiB, as the engine's disk-usage table expects it
    pub fn free_kib(&self) -> u64 {
        self.free_bytes / KIB
    }

    /// Used space in KiB
    pub fn used_kib(&self) -> u64 {
        self.used_now_bytes / KIB
    }

    /// Mount path with exactly one leading slash
    pub fn absolute_mount_path(&self) -> String {
        if self.mount_path.starts_with('/') {
            self.mount_path.clone()
        } else {
            format!("/{}", self.mount_path)
        }
    }
}
