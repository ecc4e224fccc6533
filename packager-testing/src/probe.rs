// SPDX-License-Identifier: GPL-3.0-only

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use packager_contracts::{DfUsage, FilesystemProbe, MountedFilesystem, PackagerError};

/// A block device the fake can mount
#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    pub df: DfUsage,
    pub btrfs_used_bytes: Option<u64>,
    pub snapshots: bool,
}

/// One mount or unmount request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeCall {
    Mount {
        device: String,
        mount_point: PathBuf,
        options: Vec<String>,
    },
    Unmount {
        mount_point: PathBuf,
    },
}

/// In-memory filesystem probe
///
/// Live mounts are answered from the configured mount list. Devices mounted
/// through `mount_readonly` answer df and btrfs queries at their mount point
/// until they are unmounted.
#[derive(Debug)]
pub struct FakeProbe {
    scratch: PathBuf,
    mounts: Vec<MountedFilesystem>,
    mounts_unreadable: bool,
    devices: BTreeMap<String, FakeDevice>,
    failing_devices: BTreeSet<String>,
    unmount_fails: bool,
    /// btrfs figures of live mount paths
    live_btrfs: BTreeMap<String, (Option<u64>, bool)>,
    mounted: RefCell<BTreeMap<PathBuf, String>>,
    calls: RefCell<Vec<ProbeCall>>,
}

impl Default for FakeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProbe {
    pub fn new() -> Self {
        Self {
            scratch: PathBuf::from("/tmp/packager-test/diskspace_mount"),
            mounts: Vec::new(),
            mounts_unreadable: false,
            devices: BTreeMap::new(),
            failing_devices: BTreeSet::new(),
            unmount_fails: false,
            live_btrfs: BTreeMap::new(),
            mounted: RefCell::new(BTreeMap::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// A live mount with df figures in KiB
    pub fn with_mount(
        mut self,
        spec: &str,
        mount_path: &str,
        fs_type: &str,
        total_kib: u64,
        used_kib: u64,
        free_kib: u64,
    ) -> Self {
        self.mounts.push(MountedFilesystem {
            spec: spec.to_string(),
            mount_path: mount_path.to_string(),
            fs_type: fs_type.to_string(),
            read_only: false,
            usage: DfUsage {
                total_kib,
                used_kib,
                free_kib,
            },
        });
        self
    }

    /// btrfs answers for a live mount path; None makes the usage query fail
    pub fn with_live_btrfs(
        mut self,
        mount_path: &str,
        used_bytes: Option<u64>,
        snapshots: bool,
    ) -> Self {
        self.live_btrfs
            .insert(mount_path.to_string(), (used_bytes, snapshots));
        self
    }

    pub fn with_unreadable_mounts(mut self) -> Self {
        self.mounts_unreadable = true;
        self
    }

    pub fn with_device(mut self, device: &str, fake: FakeDevice) -> Self {
        self.devices.insert(device.to_string(), fake);
        self
    }

    /// Mounting `device` fails
    pub fn with_failing_device(mut self, device: &str) -> Self {
        self.failing_devices.insert(device.to_string());
        self
    }

    /// Every unmount fails and leaves the device mounted
    pub fn with_failing_unmount(mut self) -> Self {
        self.unmount_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<ProbeCall> {
        self.calls.borrow().clone()
    }

    /// Mount points still mounted
    pub fn active_mounts(&self) -> Vec<PathBuf> {
        self.mounted.borrow().keys().cloned().collect()
    }

    fn mounted_device(&self, path: &Path) -> Option<FakeDevice> {
        let mounted = self.mounted.borrow();
        let device = mounted.get(path)?;
        self.devices.get(device).cloned()
    }

    fn live_btrfs_figures(&self, path: &Path) -> Option<(Option<u64>, bool)> {
        let key = path.to_str()?;
        self.live_btrfs.get(key).copied()
    }
}

impl FilesystemProbe for FakeProbe {
    fn mount_readonly(
        &self,
        device: &str,
        mount_point: &Path,
        options: &[String],
    ) -> Result<(), PackagerError> {
        self.calls.borrow_mut().push(ProbeCall::Mount {
            device: device.to_string(),
            mount_point: mount_point.to_path_buf(),
            options: options.to_vec(),
        });

        if self.failing_devices.contains(device) || !self.devices.contains_key(device) {
            return Err(PackagerError::probe_failed(format!(
                "mount: {device}: can't read superblock"
            )));
        }

        self.mounted
            .borrow_mut()
            .insert(mount_point.to_path_buf(), device.to_string());
        Ok(())
    }

    fn unmount(&self, mount_point: &Path) -> Result<(), PackagerError> {
        self.calls.borrow_mut().push(ProbeCall::Unmount {
            mount_point: mount_point.to_path_buf(),
        });

        if self.unmount_fails {
            return Err(PackagerError::probe_failed(format!(
                "umount: {}: target is busy",
                mount_point.display()
            )));
        }

        match self.mounted.borrow_mut().remove(mount_point) {
            Some(_) => Ok(()),
            None => Err(PackagerError::not_found(format!(
                "umount: {}: not mounted",
                mount_point.display()
            ))),
        }
    }

    fn read_df(&self, path: &Path) -> Result<DfUsage, PackagerError> {
        if let Some(device) = self.mounted_device(path) {
            return Ok(device.df);
        }

        self.mounts
            .iter()
            .find(|mount| Path::new(&mount.mount_path) == path)
            .map(|mount| mount.usage)
            .ok_or_else(|| PackagerError::not_found(format!("{} is not mounted", path.display())))
    }

    fn list_mounts(&self) -> Result<Vec<MountedFilesystem>, PackagerError> {
        if self.mounts_unreadable {
            return Err(PackagerError::probe_failed("/proc/self/mounts unreadable"));
        }
        Ok(self.mounts.clone())
    }

    fn btrfs_used_bytes(&self, path: &Path) -> Result<u64, PackagerError> {
        let used = match self.mounted_device(path) {
            Some(device) => device.btrfs_used_bytes,
            None => self.live_btrfs_figures(path).and_then(|(used, _)| used),
        };
        used.ok_or_else(|| PackagerError::probe_failed("btrfs filesystem df failed"))
    }

    fn btrfs_has_snapshots(&self, path: &Path) -> Result<bool, PackagerError> {
        match self.mounted_device(path) {
            Some(device) => Ok(device.snapshots),
            None => Ok(self.live_btrfs_figures(path).is_some_and(|(_, snapshots)| snapshots)),
        }
    }

    fn scratch_mount_point(&self) -> PathBuf {
        self.scratch.clone()
    }
}
