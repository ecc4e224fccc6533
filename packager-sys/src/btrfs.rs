// SPDX-License-Identifier: GPL-3.0-only

//! Btrfs usage probing through the btrfs CLI
//!
//! `df` on btrfs does not reflect what is allocated to data and metadata,
//! so the space estimator asks btrfs itself.

use std::path::Path;
use std::time::Duration;

use packager_types::size_from_string;
use tracing::{debug, info};

use crate::cmd;
use crate::error::{Result, SysError};

/// Sum the `used=` figures of `btrfs filesystem df` output, in bytes
pub fn parse_filesystem_df(output: &str) -> Result<u64> {
    let mut used = 0u64;

    for line in output.lines() {
        let Some(start) = line.find("used=") else {
            continue;
        };

        let value = line[start + "used=".len()..]
            .split(|c: char| c.is_whitespace() || c == ',')
            .next()
            .unwrap_or_default();

        let bytes = size_from_string(value)
            .map_err(|error| SysError::InvalidSize(format!("{value}: {error}")))?;
        used = used.saturating_add(bytes);
    }

    Ok(used)
}

pub fn used_bytes(btrfs: &Path, directory: &Path, timeout: Duration) -> Result<u64> {
    let args = vec![
        "filesystem".to_string(),
        "df".to_string(),
        directory.display().to_string(),
    ];
    let outcome = cmd::run(btrfs, &args, timeout)?;
    debug!("Usage reported by btrfs: {}", outcome.stdout.trim());

    let used = parse_filesystem_df(&outcome.stdout)?;
    info!(
        "Detected total btrfs used size at {:?}: {} ({}MiB)",
        directory,
        used,
        used / 1024 / 1024
    );
    Ok(used)
}

pub fn has_snapshots(btrfs: &Path, directory: &Path, timeout: Duration) -> Result<bool> {
    let args = vec![
        "subvolume".to_string(),
        "list".to_string(),
        "-s".to_string(),
        directory.display().to_string(),
    ];
    let outcome = cmd::run(btrfs, &args, timeout)?;

    let snapshots = outcome
        .stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count();
    info!("Found {} btrfs snapshots at {:?}", snapshots, directory);

    Ok(snapshots > 0)
}

#[cfg(test)]
mod tests {
    use super::parse_filesystem_df;

    #[test]
    fn sums_used_sizes_of_all_block_groups() {
        let output = "Data, single: total=8.00GiB, used=6.00GiB\n\
                      System, DUP: total=32.00MiB, used=16.00KiB\n\
                      Metadata, DUP: total=1.00GiB, used=512.00MiB\n\
                      GlobalReserve, single: total=28.84MiB, used=0.00B\n";

        let expected: u64 = 6 * 1024 * 1024 * 1024 + 16 * 1024 + 512 * 1024 * 1024;
        assert_eq!(parse_filesystem_df(output).unwrap(), expected);
    }

    #[test]
    fn ignores_lines_without_usage() {
        assert_eq!(parse_filesystem_df("WARNING: unknown\n").unwrap(), 0);
        assert!(parse_filesystem_df("Data, single: total=1GiB, used=lots\n").is_err());
    }
}
