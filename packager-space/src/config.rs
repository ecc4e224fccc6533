// SPDX-License-Identifier: GPL-3.0-only

//! Tunables of the space estimator
//!
//! The generic overhead ratios were measured on specific filesystem versions;
//! they live here so they can be recalibrated from a TOML file without a rebuild.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use packager_types::{GIB, KIB, MIB};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read space configuration {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid space configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid space configuration: {0}")]
    Invalid(String),
}

/// Spare percentage applied to live free space, per install phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparePercent {
    /// Second stage of an installation, spare space was checked in the first one
    pub continue_install: u64,
    pub update: u64,
    /// Package installation on a running system
    pub normal: u64,
}

impl Default for SparePercent {
    fn default() -> Self {
        Self {
            continue_install: 0,
            update: 15,
            normal: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// ext2/3/4 metadata overhead (16 = 1.6%)
    pub ext_overhead_per_mille: u64,
    /// XFS overhead (1 = 0.1%)
    pub xfs_overhead_per_mille: u64,
    /// JFS overhead (3 = 0.3%)
    pub jfs_overhead_per_mille: u64,

    /// Lower bound of the spare space kept free on live filesystems
    pub min_spare_kib: u64,
    /// Upper bound of the spare space kept free on live filesystems
    pub max_spare_kib: u64,
    pub spare_percent: SparePercent,

    /// Subtracted from every planned filesystem before any overhead
    pub fresh_target_min_spare_bytes: u64,

    /// Space taken by files the installer writes outside of packages, per path
    pub target_usage_kib: BTreeMap<String, u64>,

    /// Directories whose filesystem must be probed successfully
    pub critical_dirs: Vec<String>,

    /// Live mounts never considered as install targets
    pub ignored_mount_points: Vec<String>,
    pub ignored_mount_prefixes: Vec<String>,
    /// Mount sources never considered as install targets
    pub ignored_mount_specs: Vec<String>,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        let mib_in_kib = MIB / KIB;

        Self {
            ext_overhead_per_mille: 16,
            xfs_overhead_per_mille: 1,
            jfs_overhead_per_mille: 3,
            min_spare_kib: 10 * mib_in_kib,
            max_spare_kib: GIB / KIB,
            spare_percent: SparePercent::default(),
            fresh_target_min_spare_bytes: 20 * MIB,
            // measured on a default desktop installation
            target_usage_kib: BTreeMap::from([
                ("/var/lib/rpm".to_string(), 42 * mib_in_kib),
                ("/var/log".to_string(), 14 * mib_in_kib),
                ("/var/adm/backup".to_string(), 10 * mib_in_kib),
                ("/var/cache/zypp".to_string(), 38 * mib_in_kib),
                ("/etc".to_string(), 2 * mib_in_kib),
                ("/usr/share".to_string(), mib_in_kib),
                ("/boot/initrd".to_string(), 11 * mib_in_kib),
            ]),
            critical_dirs: [
                "/", "/bin", "/boot", "/etc", "/lib", "/lib64", "/opt", "/sbin", "/usr", "/var",
            ]
            .iter()
            .map(|dir| dir.to_string())
            .collect(),
            ignored_mount_points: vec!["/cdrom".to_string(), "/dev/shm".to_string()],
            ignored_mount_prefixes: vec![
                "/media/".to_string(),
                "/run/media/".to_string(),
                "/var/adm/mount/".to_string(),
            ],
            ignored_mount_specs: vec!["udev".to_string()],
        }
    }
}

impl SpaceConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_spare_kib > self.max_spare_kib {
            return Err(ConfigError::Invalid(format!(
                "min_spare_kib ({}) exceeds max_spare_kib ({})",
                self.min_spare_kib, self.max_spare_kib
            )));
        }

        if let Some(dir) = self
            .target_usage_kib
            .keys()
            .chain(&self.critical_dirs)
            .find(|dir| !dir.starts_with('/'))
        {
            return Err(ConfigError::Invalid(format!(
                "directory {dir:?} must be absolute"
            )));
        }

        Ok(())
    }

    /// Is `mount_path` one of the core OS directories?
    pub fn is_critical_dir(&self, mount_path: &str) -> bool {
        let normalized = normalize_dir(mount_path);
        self.critical_dirs
            .iter()
            .any(|dir| normalize_dir(dir) == normalized)
    }
}

/// Absolute form of a mount path without trailing slash ("usr/" -> "/usr")
pub(crate) fn normalize_dir(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}
