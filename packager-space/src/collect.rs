// SPDX-License-Identifier: GPL-3.0-only

//! Building the partition table the package engine accounts against
//!
//! On a running system (or a target already mounted below a root directory)
//! the live mounts are read. During an initial installation nothing is
//! mounted yet: planned filesystems are estimated from their geometry and
//! reused ones are mounted read-only for a moment to read their usage.

use std::path::{Path, PathBuf};

use packager_contracts::{FilesystemProbe, MountGuard, MountedFilesystem};
use packager_types::{FailedMount, FilesystemKind, KIB, PartitionUsage};
use tracing::{debug, error, info, warn};

use crate::config::SpaceConfig;
use crate::overhead::estimate_overhead;
use crate::target_usage::estimate_target_usage;

/// Where the partition table comes from
#[derive(Debug, Clone, Copy)]
pub enum CollectMode<'a> {
    /// Initial installation, the filesystems of the partitioning plan
    FreshTarget(&'a [PartitionUsage]),
    /// Second stage of an installation, the target is mounted
    Continue,
    /// Upgrade of the system mounted at the target root
    Update,
    /// Package installation on a running system
    Normal,
}

impl CollectMode<'_> {
    /// Spare space percentage applied to live free space
    pub fn spare_percent(&self, config: &SpaceConfig) -> u64 {
        match self {
            Self::FreshTarget(_) | Self::Continue => config.spare_percent.continue_install,
            Self::Update => config.spare_percent.update,
            Self::Normal => config.spare_percent.normal,
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Self::Update)
    }
}

/// Result of one collection run
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub partitions: Vec<PartitionUsage>,
    pub failed_mounts: Vec<FailedMount>,
}

/// Live free space minus the spare share, clamped to [min, max] spare
pub fn spare_adjusted_free_kib(config: &SpaceConfig, free_kib: u64, spare_percent: u64) -> u64 {
    let spare = (free_kib.saturating_mul(spare_percent) / 100)
        .clamp(config.min_spare_kib, config.max_spare_kib);
    free_kib.saturating_sub(spare)
}

/// Read the live mounts below `target_root`
pub fn collect_live<P: FilesystemProbe + ?Sized>(
    config: &SpaceConfig,
    probe: &P,
    target_root: &Path,
    source_dir: Option<&Path>,
    spare_percent: u64,
) -> Vec<PartitionUsage> {
    let mounts = match probe.list_mounts() {
        Ok(mounts) => mounts,
        Err(error) => {
            error!("Cannot read mounted filesystems: {}", error);
            return Vec::new();
        }
    };

    let mut partitions = Vec::new();
    for mount in mounts {
        let Some(name) = live_mount_name(config, &mount, target_root, source_dir) else {
            continue;
        };

        let kind = FilesystemKind::parse(&mount.fs_type);
        if kind.is_ignored_for_accounting() {
            debug!("Ignoring {} filesystem at {}", kind, mount.mount_path);
            continue;
        }

        if mount.usage.total_kib == 0 {
            debug!("Ignoring {}, no capacity", mount.mount_path);
            continue;
        }

        let mut used_kib = mount.usage.used_kib;
        let mut free_kib = mount.usage.free_kib;
        let mut growonly = false;

        if kind == FilesystemKind::Btrfs {
            info!("Btrfs file system detected at {}", mount.mount_path);
            let path = Path::new(&mount.mount_path);

            match probe.btrfs_used_bytes(path) {
                Ok(used) => {
                    let new_used = used / KIB;
                    info!(
                        "Updated the used size by btrfs from {} to {} KiB",
                        used_kib, new_used
                    );
                    used_kib = new_used;
                    free_kib = mount.usage.total_kib.saturating_sub(new_used);
                }
                Err(error) => warn!(
                    "Cannot read btrfs usage of {}, using df figures: {}",
                    mount.mount_path, error
                ),
            }

            growonly = probe.btrfs_has_snapshots(path).unwrap_or_else(|error| {
                warn!("Cannot list btrfs snapshots of {}: {}", mount.mount_path, error);
                false
            });
            info!("Snapshots detected: {}", growonly);
        }

        let adjusted_kib = spare_adjusted_free_kib(config, free_kib, spare_percent);
        debug!(
            "{}: free {} KiB, {} KiB after {}% spare",
            name, free_kib, adjusted_kib, spare_percent
        );

        partitions.push(PartitionUsage {
            mount_path: name,
            device: mount.spec,
            filesystem_kind: kind,
            total_bytes: mount.usage.total_kib.saturating_mul(KIB),
            used_now_bytes: used_kib.saturating_mul(KIB),
            used_future_bytes: used_kib.saturating_mul(KIB),
            free_bytes: adjusted_kib.saturating_mul(KIB),
            size_kb: mount.usage.total_kib,
            read_only: mount.read_only,
            growonly,
            ..PartitionUsage::default()
        });
    }

    info!("Live partitions: {:?}", partitions);
    partitions
}

/// Name a live mount relative to the target root, None when it is not a candidate
fn live_mount_name(
    config: &SpaceConfig,
    mount: &MountedFilesystem,
    target_root: &Path,
    source_dir: Option<&Path>,
) -> Option<String> {
    let path = mount.mount_path.as_str();
    if !path.starts_with('/') || path.starts_with("/dev/") || mount.fs_type == "rootfs" {
        return None;
    }

    if target_root != Path::new("/") {
        let relative = Path::new(path).strip_prefix(target_root).ok()?;
        let relative = relative.to_str()?;
        return Some(format!("/{relative}"));
    }

    let ignored = config.ignored_mount_points.iter().any(|point| point == path)
        || config
            .ignored_mount_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        || config.ignored_mount_specs.iter().any(|spec| *spec == mount.spec)
        || source_dir.is_some_and(|dir| Path::new(path) == dir);

    if ignored {
        debug!("Ignoring mount {} ({})", path, mount.spec);
        return None;
    }

    Some(path.to_string())
}

/// Estimate the filesystems of a partitioning plan
pub fn collect_fresh_target<P: FilesystemProbe + ?Sized>(
    config: &SpaceConfig,
    probe: &P,
    planned: &[PartitionUsage],
) -> Collected {
    let mut collected = Collected::default();
    let scratch = probe.scratch_mount_point();

    for filesystem in planned {
        if !filesystem.mount_path.starts_with('/') || !filesystem.persistent {
            debug!(
                "Skipping {} ({}), not a persistent mount",
                filesystem.device, filesystem.mount_path
            );
            continue;
        }

        if filesystem.filesystem_kind.is_ignored_for_accounting() {
            debug!(
                "Skipping {} filesystem at {}",
                filesystem.filesystem_kind, filesystem.mount_path
            );
            continue;
        }

        let mut free = filesystem
            .size_bytes()
            .saturating_sub(config.fresh_target_min_spare_bytes);
        let used;
        let mut growonly = false;

        if filesystem.is_create_or_format {
            used = estimate_overhead(config, filesystem);
            free = free.saturating_sub(used);
        } else {
            match probe_existing(probe, filesystem, &scratch) {
                Ok(probed) => {
                    used = probed.used;
                    growonly = probed.growonly;
                    free = match probed.free {
                        Some(df_free) => df_free,
                        None => free.saturating_sub(probed.used),
                    };
                }
                Err(reason) => {
                    error!(
                        "Mount failed, ignoring partition {}: {}",
                        filesystem.device, reason
                    );
                    collected.failed_mounts.push(FailedMount {
                        device: filesystem.device.clone(),
                        mount_path: filesystem.mount_path.clone(),
                        filesystem_kind: filesystem.filesystem_kind,
                        reason,
                        blocker: config.is_critical_dir(&filesystem.mount_path),
                    });
                    continue;
                }
            }
        }

        info!(
            "partition: mount: {}, free: {}KiB, used: {}KiB",
            filesystem.mount_path,
            free / KIB,
            used / KIB
        );

        collected.partitions.push(PartitionUsage {
            mount_path: engine_mount_name(&filesystem.mount_path),
            total_bytes: filesystem.size_bytes(),
            used_now_bytes: used,
            used_future_bytes: used,
            free_bytes: free,
            growonly,
            ..filesystem.clone()
        });
    }

    estimate_target_usage(&mut collected.partitions, &config.target_usage_kib);
    collected
}

struct Probed {
    used: u64,
    /// df free space, None when btrfs usage was read and free follows from the size
    free: Option<u64>,
    growonly: bool,
}

fn probe_existing<P: FilesystemProbe + ?Sized>(
    probe: &P,
    filesystem: &PartitionUsage,
    scratch: &Path,
) -> Result<Probed, String> {
    let options = probe_mount_options(filesystem);
    let guard = MountGuard::mount(probe, &filesystem.device, scratch, &options)
        .map_err(|error| error.to_string())?;

    let is_btrfs = filesystem.filesystem_kind == FilesystemKind::Btrfs;
    let btrfs_used = if is_btrfs {
        match probe.btrfs_used_bytes(guard.path()) {
            Ok(used) => Some(used),
            Err(error) => {
                warn!(
                    "Cannot read btrfs usage of {}, using df figures: {}",
                    filesystem.device, error
                );
                None
            }
        }
    } else {
        None
    };
    let growonly = is_btrfs
        && probe.btrfs_has_snapshots(guard.path()).unwrap_or_else(|error| {
            warn!("Cannot list btrfs snapshots of {}: {}", filesystem.device, error);
            false
        });

    let probed = match btrfs_used {
        Some(used) => Probed {
            used,
            free: None,
            growonly,
        },
        None => {
            let df = probe.read_df(guard.path()).map_err(|error| error.to_string())?;
            debug!("Partition {}: {:?}", filesystem.device, df);

            Probed {
                used: df.used_kib.saturating_mul(KIB),
                free: Some(df.free_kib.saturating_mul(KIB)),
                growonly,
            }
        }
    };

    Ok(probed)
}

/// Planned mount options plus `ro`, and `nolock` for NFS, without duplicates
pub fn probe_mount_options(filesystem: &PartitionUsage) -> Vec<String> {
    let mut options: Vec<String> = Vec::with_capacity(filesystem.mount_options.len() + 2);
    let extra = match filesystem.filesystem_kind {
        FilesystemKind::Nfs => &["ro", "nolock"][..],
        _ => &["ro"][..],
    };

    for option in filesystem
        .mount_options
        .iter()
        .map(String::as_str)
        .chain(extra.iter().copied())
    {
        if !option.is_empty() && !options.iter().any(|known| known == option) {
            options.push(option.to_string());
        }
    }

    options
}

/// Mount path as the engine keys its disk usage table ("/", "boot", "usr")
pub fn engine_mount_name(mount_path: &str) -> String {
    if mount_path == "/" {
        return mount_path.to_string();
    }
    mount_path.strip_prefix('/').unwrap_or(mount_path).to_string()
}

/// Default scratch directory below the system temp dir
pub fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("packager")
}
