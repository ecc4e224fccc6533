// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use packager_contracts::{FilesystemProbe, PackageEngine, PackagerError};
use packager_types::{DiskUsageTable, FailedMount, FreeSpaceWarning, PartitionUsage, SpaceWarning};
use tracing::{info, warn};

use crate::check;
use crate::collect::{self, CollectMode, Collected};
use crate::config::SpaceConfig;
use crate::overhead;

/// Disk space accounting for one installation target
///
/// Owns the last collected partition table; the feasibility checks run on the
/// disk usage table the package engine computes from it.
pub struct SpaceEstimator<P: FilesystemProbe> {
    config: SpaceConfig,
    probe: P,
    target_root: PathBuf,
    /// Installation source mounted on the running system, never a target
    source_dir: Option<PathBuf>,
    partitions: Vec<PartitionUsage>,
    failed_mounts: Vec<FailedMount>,
    collected: bool,
}

impl<P: FilesystemProbe> SpaceEstimator<P> {
    pub fn new(config: SpaceConfig, probe: P) -> Self {
        Self {
            config,
            probe,
            target_root: PathBuf::from("/"),
            source_dir: None,
            partitions: Vec::new(),
            failed_mounts: Vec::new(),
            collected: false,
        }
    }

    pub fn with_target_root(mut self, target_root: impl Into<PathBuf>) -> Self {
        self.target_root = target_root.into();
        self
    }

    pub fn with_source_dir(mut self, source_dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(source_dir.into());
        self
    }

    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// Bytes a freshly created filesystem loses to journal and metadata
    pub fn estimate_overhead(&self, partition: &PartitionUsage) -> u64 {
        overhead::estimate_overhead(&self.config, partition)
    }

    /// Rebuild the partition table and remember it
    ///
    /// Mount failures never abort the collection, they end up in the returned
    /// failed mount list.
    pub fn collect_partition_table(
        &mut self,
        mode: CollectMode<'_>,
    ) -> (Vec<PartitionUsage>, Vec<FailedMount>) {
        let collected = match mode {
            CollectMode::FreshTarget(planned) => {
                collect::collect_fresh_target(&self.config, &self.probe, planned)
            }
            CollectMode::Continue | CollectMode::Update | CollectMode::Normal => {
                let spare_percent = mode.spare_percent(&self.config);
                Collected {
                    partitions: collect::collect_live(
                        &self.config,
                        &self.probe,
                        &self.target_root,
                        self.source_dir.as_deref(),
                        spare_percent,
                    ),
                    failed_mounts: Vec::new(),
                }
            }
        };

        for failed in &collected.failed_mounts {
            if failed.blocker {
                warn!(
                    "Cannot probe {} ({}), installation is blocked",
                    failed.mount_path, failed.device
                );
            } else {
                warn!("Cannot probe {} ({})", failed.mount_path, failed.device);
            }
        }

        self.partitions = collected.partitions;
        self.failed_mounts = collected.failed_mounts;
        self.collected = true;

        (self.partitions.clone(), self.failed_mounts.clone())
    }

    /// Collect once, later calls return the cached table
    pub fn ensure_collected(&mut self, mode: CollectMode<'_>) -> &[PartitionUsage] {
        if !self.collected {
            info!("No partition table collected yet");
            self.collect_partition_table(mode);
        }
        &self.partitions
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    pub fn partitions(&self) -> &[PartitionUsage] {
        &self.partitions
    }

    /// Existing filesystems the last collection failed to mount
    pub fn failed_mounts(&self) -> &[FailedMount] {
        &self.failed_mounts
    }

    /// Failed mounts hosting a core OS directory
    pub fn blocking_failed_mounts(&self) -> impl Iterator<Item = &FailedMount> {
        self.failed_mounts.iter().filter(|failed| failed.blocker)
    }

    pub fn check_fits(&self, table: &DiskUsageTable) -> (bool, Vec<SpaceWarning>) {
        check::check_fits(table)
    }

    pub fn check_free_percentage(
        &self,
        table: &DiskUsageTable,
        min_percent: u64,
        max_unsatisfied_kib: u64,
    ) -> Vec<FreeSpaceWarning> {
        check::check_free_percentage(table, min_percent, max_unsatisfied_kib)
    }

    pub fn partition_warnings(
        &self,
        table: &DiskUsageTable,
        user_selectable: bool,
        update_mode: bool,
    ) -> Vec<String> {
        check::partition_warnings(table, user_selectable, update_mode)
    }

    pub fn required_space(&self, table: &DiskUsageTable) -> String {
        check::required_space(table)
    }

    /// `check_fits` against the engine's current disk usage table
    pub fn engine_fits<E: PackageEngine + ?Sized>(
        &self,
        engine: &E,
    ) -> Result<(bool, Vec<SpaceWarning>), PackagerError> {
        let table = engine.disk_usage_table()?;
        Ok(check::check_fits(&table))
    }
}
