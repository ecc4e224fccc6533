// SPDX-License-Identifier: GPL-3.0-only

//! Common size units and formatting helpers

use anyhow::Result;
use num_format::{Locale, ToFormattedString};

/// 1 KiB in bytes
pub const KIB: u64 = 1024;

/// 1 MiB in bytes
pub const MIB: u64 = 1024 * KIB;

/// 1 GiB in bytes
pub const GIB: u64 = 1024 * MIB;

/// Convert a KiB figure from the engine's disk-usage table into bytes
pub fn kib_to_bytes(kib: u64) -> u64 {
    kib.saturating_mul(KIB)
}

/// Convert bytes to human-readable format (e.g., "1.50 GiB")
pub fn bytes_to_pretty(bytes: &u64, add_bytes: bool) -> String {
    let mut steps = 0;
    let mut val: f64 = *bytes as f64;

    while val >= 1024. && steps < 6 {
        val /= 1024.;
        steps += 1;
    }

    let unit = match steps {
        0 => "B",
        1 => "KiB",
        2 => "MiB",
        3 => "GiB",
        4 => "TiB",
        5 => "PiB",
        _ => "EiB",
    };

    if add_bytes {
        let bytes_str = bytes.to_formatted_string(&Locale::en);
        format!("{:.2} {} ({} bytes)", val, unit, bytes_str)
    } else {
        format!("{:.2} {}", val, unit)
    }
}

/// Format a byte count for user-facing messages
pub fn format_size(bytes: u64) -> String {
    if bytes < KIB {
        return format!("{} B", bytes);
    }

    bytes_to_pretty(&bytes, false)
}

/// Parse a size with an optional unit suffix glued to the number
///
/// This is the format `btrfs filesystem df` prints, e.g. "2.45MiB" or "16.00KiB".
/// A bare number is taken as bytes.
pub fn size_from_string(size: &str) -> Result<u64> {
    let size = size.trim();
    let split_at = size
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(size.len());
    let (number, unit) = size.split_at(split_at);

    let val: f64 = number
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size: {}", size))?;
    if val < 0.0 {
        return Err(anyhow::anyhow!("Negative size: {}", size));
    }

    let unit = if unit.is_empty() { "B" } else { unit.trim() };
    Ok((val * unit_multiplier(unit)? as f64).round() as u64)
}

fn unit_multiplier(unit: &str) -> Result<u64> {
    let multiplier = match unit {
        "B" => 1,
        "KiB" | "KB" | "K" => KIB,
        "MiB" | "MB" | "M" => MIB,
        "GiB" | "GB" | "G" => GIB,
        "TiB" | "TB" | "T" => GIB * 1024,
        "PiB" | "PB" | "P" => GIB * 1024 * 1024,
        _ => return Err(anyhow::anyhow!("Invalid unit: {}", unit)),
    };

    Ok(multiplier)
}
