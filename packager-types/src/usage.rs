// SPDX-License-Identifier: GPL-3.0-only

//! Disk usage table and the warnings derived from it

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::kib_to_bytes;
use crate::partition::FilesystemKind;

/// Per-directory usage as reported by the package engine (KiB)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskUsage {
    pub total_kib: u64,
    pub used_now_kib: u64,
    pub used_future_kib: u64,
}

impl DiskUsage {
    pub fn new(total_kib: u64, used_now_kib: u64, used_future_kib: u64) -> Self {
        Self {
            total_kib,
            used_now_kib,
            used_future_kib,
        }
    }

    /// Space missing after the transaction, 0 when it fits
    pub fn shortage_kib(&self) -> u64 {
        self.used_future_kib.saturating_sub(self.total_kib)
    }

    /// Space left after the transaction, 0 when over-committed
    pub fn future_free_kib(&self) -> u64 {
        self.total_kib.saturating_sub(self.used_future_kib)
    }

    /// Something is actually being installed on this directory
    pub fn grows(&self) -> bool {
        self.used_future_kib > self.used_now_kib
    }
}

/// Engine disk-usage table keyed by mount path
pub type DiskUsageTable = BTreeMap<String, DiskUsage>;

/// A directory that does not fit the proposed selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceWarning {
    pub mount_path: String,
    pub shortage_kib: u64,
}

impl SpaceWarning {
    pub fn shortage_bytes(&self) -> u64 {
        kib_to_bytes(self.shortage_kib)
    }
}

/// A directory left with too little free space after installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeSpaceWarning {
    pub mount_path: String,
    /// Integer percentage of the directory's total size still free
    pub free_percent: u64,
    pub free_kib: u64,
}

impl FreeSpaceWarning {
    pub fn free_bytes(&self) -> u64 {
        kib_to_bytes(self.free_kib)
    }
}

/// An existing filesystem that could not be mounted for probing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedMount {
    pub device: String,
    pub mount_path: String,
    pub filesystem_kind: FilesystemKind,
    pub reason: String,
    /// The mount path hosts a core OS directory, installation cannot proceed
    pub blocker: bool,
}
