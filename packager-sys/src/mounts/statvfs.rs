// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::CString;
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use packager_contracts::DfUsage;

use crate::error::{Result, SysError};

/// `df` figures for the filesystem containing `path`
pub fn statvfs_usage(path: &Path) -> Result<DfUsage> {
    let path_c = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| {
            SysError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("path contains NUL byte: {path:?}"),
            ))
        })?;

    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    let rc = unsafe { libc::statvfs(path_c.as_ptr(), stat.as_mut_ptr()) };
    if rc != 0 {
        return Err(SysError::Io(std::io::Error::last_os_error()));
    }

    let stat = unsafe { stat.assume_init() };
    let frsize = if stat.f_frsize > 0 {
        stat.f_frsize as u64
    } else {
        stat.f_bsize as u64
    };

    let total = (stat.f_blocks as u64).saturating_mul(frsize);
    let free = (stat.f_bfree as u64).saturating_mul(frsize);
    let available = (stat.f_bavail as u64).saturating_mul(frsize);

    // df reports "used" against all free blocks and "available" without the root reserve
    Ok(DfUsage {
        total_kib: total / 1024,
        used_kib: total.saturating_sub(free) / 1024,
        free_kib: available / 1024,
    })
}
