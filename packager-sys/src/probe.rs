// SPDX-License-Identifier: GPL-3.0-only

//! Production filesystem probe
//!
//! Mounts existing filesystems read-only under a scratch directory, reads
//! their usage and unmounts them again. Every external command is bounded by
//! a timeout.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use packager_contracts::{DfUsage, FilesystemProbe, MountedFilesystem, PackagerError};
use tracing::{debug, info, warn};
use which::which;

use crate::error::{Result, SysError};
use crate::mounts::{read_mount_table, statvfs_usage};
use crate::{btrfs, cmd};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const PROC_MOUNTS: &str = "/proc/self/mounts";
const SCRATCH_MOUNT_DIR: &str = "diskspace_mount";

pub struct SystemProbe {
    mount_bin: PathBuf,
    umount_bin: PathBuf,
    /// btrfs-progs may be missing on systems without btrfs
    btrfs_bin: Option<PathBuf>,
    scratch_dir: PathBuf,
    mount_table: PathBuf,
    timeout: Duration,
}

impl SystemProbe {
    /// Locate the required binaries in PATH
    ///
    /// Returns an error if mount or umount is not installed
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Result<Self> {
        let mount_bin = which("mount").map_err(|_| SysError::CommandNotFound("mount".into()))?;
        let umount_bin =
            which("umount").map_err(|_| SysError::CommandNotFound("umount".into()))?;
        let btrfs_bin = which("btrfs").ok();
        if btrfs_bin.is_none() {
            debug!("btrfs binary not found, btrfs probing disabled");
        }

        info!("Using mount binary at {:?}", mount_bin);
        Ok(Self {
            mount_bin,
            umount_bin,
            btrfs_bin,
            scratch_dir: scratch_dir.into(),
            mount_table: PathBuf::from(PROC_MOUNTS),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_mount_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.mount_table = path.into();
        self
    }

    fn btrfs(&self) -> Result<&Path> {
        self.btrfs_bin
            .as_deref()
            .ok_or_else(|| SysError::CommandNotFound("btrfs".into()))
    }
}

impl FilesystemProbe for SystemProbe {
    fn mount_readonly(
        &self,
        device: &str,
        mount_point: &Path,
        options: &[String],
    ) -> std::result::Result<(), PackagerError> {
        fs::create_dir_all(mount_point).map_err(SysError::from)?;

        let mut options = options.to_vec();
        if !options.iter().any(|option| option == "ro") {
            options.push("ro".to_string());
        }

        let args = vec![
            "-o".to_string(),
            options.join(","),
            device.to_string(),
            mount_point.display().to_string(),
        ];

        info!("Mounting {} at {:?} ({})", device, mount_point, args[1]);
        cmd::run(&self.mount_bin, &args, self.timeout).map_err(|error| {
            warn!("Mount of {} failed: {}", device, error);
            PackagerError::from(error)
        })?;

        Ok(())
    }

    fn unmount(&self, mount_point: &Path) -> std::result::Result<(), PackagerError> {
        let args = vec![mount_point.display().to_string()];
        cmd::run(&self.umount_bin, &args, self.timeout).map_err(|error| {
            warn!("Unmount of {:?} failed: {}", mount_point, error);
            PackagerError::from(error)
        })?;

        debug!("Unmounted {:?}", mount_point);
        Ok(())
    }

    fn read_df(&self, path: &Path) -> std::result::Result<DfUsage, PackagerError> {
        Ok(statvfs_usage(path)?)
    }

    fn list_mounts(&self) -> std::result::Result<Vec<MountedFilesystem>, PackagerError> {
        let entries = read_mount_table(&self.mount_table)?;
        let mut mounted = Vec::with_capacity(entries.len());

        for entry in entries {
            let usage = match statvfs_usage(Path::new(&entry.mount_point)) {
                Ok(usage) => usage,
                Err(error) => {
                    warn!("Cannot read usage of {}, skipping it: {}", entry.mount_point, error);
                    continue;
                }
            };

            mounted.push(MountedFilesystem {
                read_only: entry.is_read_only(),
                spec: entry.spec,
                mount_path: entry.mount_point,
                fs_type: entry.fs_type,
                usage,
            });
        }

        Ok(mounted)
    }

    fn btrfs_used_bytes(&self, path: &Path) -> std::result::Result<u64, PackagerError> {
        Ok(btrfs::used_bytes(self.btrfs()?, path, self.timeout)?)
    }

    fn btrfs_has_snapshots(&self, path: &Path) -> std::result::Result<bool, PackagerError> {
        Ok(btrfs::has_snapshots(self.btrfs()?, path, self.timeout)?)
    }

    fn scratch_mount_point(&self) -> PathBuf {
        self.scratch_dir.join(SCRATCH_MOUNT_DIR)
    }
}
