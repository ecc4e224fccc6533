// SPDX-License-Identifier: GPL-3.0-only

//! Disk space accounting for proposed package selections
//!
//! [`SpaceEstimator`] builds the partition table the package engine accounts
//! package sizes against, subtracting what journals, reserved blocks and
//! installer-written files will take. The checks then answer whether the
//! staged selection fits and which directories end up nearly full.

pub mod check;
pub mod collect;
pub mod config;
pub mod estimator;
pub mod overhead;
pub mod target_usage;

pub use check::{check_fits, check_free_percentage, partition_warnings, required_space};
pub use collect::{CollectMode, Collected};
pub use config::{ConfigError, SpaceConfig, SparePercent};
pub use estimator::SpaceEstimator;
pub use overhead::estimate_overhead;
pub use target_usage::{estimate_target_usage, find_mount_point};
