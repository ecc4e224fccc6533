// SPDX-License-Identifier: GPL-3.0-only

//! Space taken by files the installer itself writes to the target
//!
//! The package engine only sees package payloads. The package database, logs
//! and repository caches grow during installation as well.

use std::collections::BTreeMap;

use packager_types::{KIB, PartitionUsage};
use tracing::{debug, info};

use crate::config::normalize_dir;

/// Longest mount point in `mount_points` that contains `dir`
///
/// Both sides must be absolute paths. Matching is component-wise, "/usrlocal"
/// does not belong to "/usr".
pub fn find_mount_point<'a>(dir: &str, mount_points: &'a [String]) -> Option<&'a str> {
    mount_points
        .iter()
        .filter(|mount| contains_dir(mount, dir))
        .max_by_key(|mount| mount.len())
        .map(String::as_str)
}

fn contains_dir(mount: &str, dir: &str) -> bool {
    if mount == "/" {
        return dir.starts_with('/');
    }

    match dir.strip_prefix(mount) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Charge every configured path's estimated size to the partition hosting it
pub fn estimate_target_usage(
    partitions: &mut [PartitionUsage],
    target_usage_kib: &BTreeMap<String, u64>,
) {
    let mount_points: Vec<String> = partitions
        .iter()
        .map(|part| normalize_dir(&part.mount_path))
        .collect();
    debug!("Mount points: {:?}", mount_points);

    let mut used_kib: BTreeMap<&str, u64> = BTreeMap::new();
    for (dir, size_kib) in target_usage_kib {
        match find_mount_point(dir, &mount_points) {
            Some(mount) => {
                debug!("Usage of {} is charged to {}", dir, mount);
                *used_kib.entry(mount).or_default() += size_kib;
            }
            None => debug!("No mount point found for {}", dir),
        }
    }

    info!("Adding target size: {:?}", used_kib);

    for (part, mount) in partitions.iter_mut().zip(&mount_points) {
        let Some(size_kib) = used_kib.get(mount.as_str()) else {
            continue;
        };

        let bytes = size_kib.saturating_mul(KIB);
        part.used_now_bytes = part.used_now_bytes.saturating_add(bytes);
        part.used_future_bytes = part.used_future_bytes.saturating_add(bytes);
        part.free_bytes = part.free_bytes.saturating_sub(bytes);
    }
}
