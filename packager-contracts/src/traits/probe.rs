// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::PackagerError;

/// `df` style figures for one mounted path (KiB)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DfUsage {
    pub total_kib: u64,
    pub used_kib: u64,
    pub free_kib: u64,
}

/// A filesystem currently mounted on the running system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountedFilesystem {
    /// Mount source as listed in the mount table (device, "udev", server:/share, ...)
    pub spec: String,
    pub mount_path: String,
    pub fs_type: String,
    pub read_only: bool,
    pub usage: DfUsage,
}

/// Live filesystem probing used while collecting free space.
///
/// The production implementation shells out to mount/umount and btrfs with a
/// bounded timeout; tests substitute an in-memory fake.
pub trait FilesystemProbe {
    /// Mount `device` at `mount_point` with exactly the given options
    fn mount_readonly(
        &self,
        device: &str,
        mount_point: &Path,
        options: &[String],
    ) -> Result<(), PackagerError>;

    fn unmount(&self, mount_point: &Path) -> Result<(), PackagerError>;

    fn read_df(&self, path: &Path) -> Result<DfUsage, PackagerError>;

    /// Every mounted filesystem with its df figures
    fn list_mounts(&self) -> Result<Vec<MountedFilesystem>, PackagerError>;

    /// Sum of the `used` figures reported by `btrfs filesystem df`, in bytes
    fn btrfs_used_bytes(&self, path: &Path) -> Result<u64, PackagerError>;

    /// Whether any snapshot subvolume exists on the btrfs at `path`
    fn btrfs_has_snapshots(&self, path: &Path) -> Result<bool, PackagerError>;

    /// Directory used as temporary mount point for probing
    fn scratch_mount_point(&self) -> PathBuf;
}

/// Scoped probe mount, unmounted when dropped
pub struct MountGuard<'a, P: FilesystemProbe + ?Sized> {
    probe: &'a P,
    mount_point: PathBuf,
}

impl<'a, P: FilesystemProbe + ?Sized> MountGuard<'a, P> {
    pub fn mount(
        probe: &'a P,
        device: &str,
        mount_point: &Path,
        options: &[String],
    ) -> Result<Self, PackagerError> {
        probe.mount_readonly(device, mount_point, options)?;
        Ok(Self {
            probe,
            mount_point: mount_point.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.mount_point
    }
}

impl<P: FilesystemProbe + ?Sized> Drop for MountGuard<'_, P> {
    fn drop(&mut self) {
        if let Err(error) = self.probe.unmount(&self.mount_point) {
            warn!(
                "Read-only probe mount at {} is left behind: {}",
                self.mount_point.display(),
                error
            );
        }
    }
}
