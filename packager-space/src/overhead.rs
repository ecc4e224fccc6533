// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem overhead the package engine does not account for
//!
//! A freshly created filesystem cannot hand its whole partition to files:
//! journals, reserved blocks and metadata take their share first.

use packager_types::{FilesystemKind, MIB, PartitionUsage};
use tracing::{debug, info, warn};

use crate::config::SpaceConfig;

/// Reiser default journal: 8193 blocks of 4 KiB
pub const REISER_JOURNAL_BYTES: u64 = 8193 * 4096;

const XFS_MIN_LOG_BYTES: u64 = 10 * MIB;
const XFS_MAX_LOG_BYTES: u64 = 2048 * MIB;
const JFS_MAX_LOG_BYTES: u64 = 128 * MIB;

/// Estimated bytes lost to journal, reserved blocks and metadata
pub fn estimate_overhead(config: &SpaceConfig, partition: &PartitionUsage) -> u64 {
    let size = partition.size_bytes();

    let overhead = match partition.filesystem_kind {
        FilesystemKind::Ext2 => {
            debug!("No journal on ext2 ({})", partition.mount_path);
            0
        }
        FilesystemKind::Ext3 | FilesystemKind::Ext4 => ext_journal_size(partition)
            .saturating_add(reserved_space(partition))
            .saturating_add(per_mille(size, config.ext_overhead_per_mille)),
        FilesystemKind::Xfs => {
            xfs_journal_size(size).saturating_add(per_mille(size, config.xfs_overhead_per_mille))
        }
        FilesystemKind::Reiser => REISER_JOURNAL_BYTES,
        FilesystemKind::Jfs => jfs_journal_size(size, partition.jfs_log_size_mb)
            .saturating_add(per_mille(size, config.jfs_overhead_per_mille)),
        // no fixed journal, log trees are allocated on demand
        FilesystemKind::Btrfs => 0,
        FilesystemKind::Nfs => 0,
        FilesystemKind::Vfat | FilesystemKind::Ntfs => {
            debug!(
                "{} on {} is excluded from space accounting",
                partition.filesystem_kind, partition.mount_path
            );
            0
        }
        FilesystemKind::Unknown => {
            warn!(
                "Unknown journal size for filesystem on {}, assuming no overhead",
                partition.mount_path
            );
            0
        }
    };

    info!(
        "{}: assuming {} overhead: {}KiB",
        partition.mount_path,
        partition.filesystem_kind,
        overhead / 1024
    );

    overhead
}

/// ext3/ext4 journal size in bytes, 0 when the journal is disabled
pub fn ext_journal_size(partition: &PartitionUsage) -> u64 {
    if partition.filesystem_kind == FilesystemKind::Ext2 || !partition.has_journal {
        debug!("Partition {} has no journal", partition.mount_path);
        return 0;
    }

    let block_size = partition.block_size();
    let blocks = partition.size_bytes() / block_size;
    debug!(
        "Partition {}: {} blocks (block size: {})",
        partition.mount_path, blocks, block_size
    );

    default_ext_journal_blocks(blocks) * block_size
}

/// Default journal size in blocks, as mke2fs picks it for a filesystem of `blocks` blocks
pub fn default_ext_journal_blocks(blocks: u64) -> u64 {
    match blocks {
        0..2048 => 0,
        2048..32768 => 1024,
        32768..262_144 => 4096,
        262_144..524_288 => 8192,
        524_288..1_048_576 => 16384,
        _ => 32768,
    }
}

/// Space reserved for root, `size_kb / 100 * percent` KiB
pub fn reserved_space(partition: &PartitionUsage) -> u64 {
    if partition.reserved_percent <= 0.0 {
        return 0;
    }

    let reserved_kib = ((partition.size_kb / 100) as f64 * partition.reserved_percent).floor();
    let reserved = (reserved_kib as u64).saturating_mul(1024);
    debug!(
        "Partition {}: reserved space: {}% ({}KiB)",
        partition.mount_path, partition.reserved_percent, reserved_kib
    );

    reserved
}

/// XFS log: 1/2048 of the filesystem, within [10 MiB, 2 GiB]
pub fn xfs_journal_size(size_bytes: u64) -> u64 {
    (size_bytes / 2048).clamp(XFS_MIN_LOG_BYTES, XFS_MAX_LOG_BYTES)
}

/// JFS log: the requested size, or ~0.4% rounded up to whole MiB capped at 128 MiB
pub fn jfs_journal_size(size_bytes: u64, log_size_mb: Option<u64>) -> u64 {
    if let Some(mb) = log_size_mb.filter(|mb| *mb > 0) {
        return mb.saturating_mul(MIB);
    }

    let log = size_bytes >> 8;
    let rounded = log.div_ceil(MIB) * MIB;
    rounded.min(JFS_MAX_LOG_BYTES)
}

fn per_mille(size: u64, ratio: u64) -> u64 {
    ((u128::from(size) * u128::from(ratio)) / 1000) as u64
}
