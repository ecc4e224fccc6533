// SPDX-License-Identifier: GPL-3.0-only

//! Feasibility checks over the engine's disk usage table

use packager_types::{DiskUsageTable, FreeSpaceWarning, SpaceWarning, format_size, kib_to_bytes};
use tracing::{debug, info, warn};

pub const DESELECT_HINT: &str = "Deselect some packages.";
pub const UPDATE_HINT: &str =
    "Deselect packages or delete data or temporary files\nbefore updating the system.\n";

/// Does the staged selection fit? Lists every directory that overflows.
pub fn check_fits(table: &DiskUsageTable) -> (bool, Vec<SpaceWarning>) {
    let mut shortages = Vec::new();
    let mut used_kib = 0u64;

    for (dir, usage) in table {
        debug!("{}: {:?}", dir, usage);

        let needed = usage.shortage_kib();
        if needed > 0 {
            warn!(
                "Partition \"{}\" needs {} more disk space.",
                dir,
                format_size(kib_to_bytes(needed))
            );
            shortages.push(SpaceWarning {
                mount_path: dir.clone(),
                shortage_kib: needed,
            });
        }
        used_kib = used_kib.saturating_add(usage.used_future_kib);
    }

    let fits = shortages.is_empty();
    info!("Total used space (KiB): {}, fits: {}", used_kib, fits);
    (fits, shortages)
}

/// Directories left with less than `min_percent` free AND less than `max_unsatisfied_kib` free
///
/// Directories nothing is installed to, or which are already full, never warn.
pub fn check_free_percentage(
    table: &DiskUsageTable,
    min_percent: u64,
    max_unsatisfied_kib: u64,
) -> Vec<FreeSpaceWarning> {
    info!(
        "min. free space: {}%, max. insufficient free space: {} KiB",
        min_percent, max_unsatisfied_kib
    );

    if min_percent == 0 {
        return Vec::new();
    }

    let mut warnings = Vec::new();
    for (dir, usage) in table {
        let free_kib = usage.future_free_kib();
        if !usage.grows() || free_kib == 0 {
            continue;
        }

        // total > used_future here, the division is safe
        let free_percent = free_kib.saturating_mul(100) / usage.total_kib;
        if free_percent < min_percent && free_kib < max_unsatisfied_kib {
            warn!(
                "Partition {}: less than {}% free space ({}%, {} KiB)",
                dir, min_percent, free_percent, free_kib
            );
            warnings.push(FreeSpaceWarning {
                mount_path: dir.clone(),
                free_percent,
                free_kib,
            });
        }
    }

    info!("Free space warnings: {:?}", warnings);
    warnings
}

/// Human readable shortage messages, with a hint when the user picks packages
pub fn partition_warnings(
    table: &DiskUsageTable,
    user_selectable: bool,
    update_mode: bool,
) -> Vec<String> {
    let (_, shortages) = check_fits(table);
    let mut messages: Vec<String> = shortages
        .iter()
        .map(|shortage| {
            format!(
                "Partition \"{}\" needs {} more disk space.",
                shortage.mount_path,
                format_size(shortage.shortage_bytes())
            )
        })
        .collect();

    if !messages.is_empty() && user_selectable {
        let hint = if update_mode { UPDATE_HINT } else { DESELECT_HINT };
        messages.push(format!("\n{hint}"));
    }

    messages
}

/// Total space used after the transaction, human readable
pub fn required_space(table: &DiskUsageTable) -> String {
    let used_kib = table
        .values()
        .fold(0u64, |sum, usage| sum.saturating_add(usage.used_future_kib));
    format_size(kib_to_bytes(used_kib))
}
