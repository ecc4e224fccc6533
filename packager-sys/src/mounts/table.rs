// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::Path;

use crate::error::{Result, SysError};

/// Kernel and virtual filesystems that never hold installed packages
const PSEUDO_FS_TYPES: &[&str] = &[
    "autofs",
    "binfmt_misc",
    "bpf",
    "cgroup",
    "cgroup2",
    "configfs",
    "debugfs",
    "devpts",
    "devtmpfs",
    "efivarfs",
    "fusectl",
    "hugetlbfs",
    "mqueue",
    "nsfs",
    "overlay",
    "proc",
    "pstore",
    "ramfs",
    "rootfs",
    "rpc_pipefs",
    "securityfs",
    "selinuxfs",
    "squashfs",
    "sysfs",
    "tmpfs",
    "tracefs",
];

/// One line of `/proc/self/mounts`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub spec: String,
    pub mount_point: String,
    pub fs_type: String,
    pub options: Vec<String>,
}

impl MountEntry {
    pub fn is_read_only(&self) -> bool {
        self.options.iter().any(|option| option == "ro")
    }
}

pub fn read_mount_table(path: &Path) -> Result<Vec<MountEntry>> {
    let content = fs::read_to_string(path)?;
    parse_mount_table(&content)
}

/// Parse the fstab-like format of `/proc/self/mounts`, skipping pseudo filesystems
pub fn parse_mount_table(input: &str) -> Result<Vec<MountEntry>> {
    let mut entries = Vec::new();

    for line in input.lines().filter(|line| !line.trim().is_empty()) {
        let mut fields = line.split_whitespace();
        let (Some(spec), Some(mount_point), Some(fs_type)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(SysError::InvalidMountLine(line.to_string()));
        };

        if is_pseudo_fs_type(fs_type) {
            continue;
        }

        let options = fields
            .next()
            .map(|options| options.split(',').map(str::to_string).collect())
            .unwrap_or_default();

        entries.push(MountEntry {
            spec: unescape_mount_field(spec),
            mount_point: unescape_mount_field(mount_point),
            fs_type: fs_type.to_string(),
            options,
        });
    }

    Ok(entries)
}

pub fn is_pseudo_fs_type(fs_type: &str) -> bool {
    PSEUDO_FS_TYPES.contains(&fs_type) || fs_type.starts_with("fuse.gvfs")
}

/// Undo the kernel's octal escapes; escaped bytes may form UTF-8 sequences
fn unescape_mount_field(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut output: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] == b'\\'
            && index + 3 < bytes.len()
            && bytes[index + 1..index + 4].iter().all(u8::is_ascii_digit)
        {
            let octal = &value[index + 1..index + 4];
            if let Ok(num) = u8::from_str_radix(octal, 8) {
                output.push(num);
                index += 4;
                continue;
            }
        }

        output.push(bytes[index]);
        index += 1;
    }

    String::from_utf8_lossy(&output).into_owned()
}
