// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use packager_space::{CollectMode, SpaceConfig, SpaceEstimator};
use packager_sys::SystemProbe;
use packager_types::{bytes_to_pretty, format_size};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Phase {
    Continue,
    Update,
    Normal,
}

impl Phase {
    fn mode(self) -> CollectMode<'static> {
        match self {
            Self::Continue => CollectMode::Continue,
            Self::Update => CollectMode::Update,
            Self::Normal => CollectMode::Normal,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "space-report")]
#[command(about = "Show the free space the installer would account packages against")]
struct Args {
    /// Root of the target system
    #[arg(long, default_value = "/")]
    root: PathBuf,

    #[arg(long, value_enum, default_value = "normal")]
    phase: Phase,

    /// TOML file overriding the built-in estimator settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Installation source directory to leave out
    #[arg(long)]
    source_dir: Option<PathBuf>,

    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("packager_space=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SpaceConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SpaceConfig::default(),
    };

    let probe = SystemProbe::new(packager_space::collect::default_scratch_dir())?;
    let mut estimator = SpaceEstimator::new(config, probe).with_target_root(&args.root);
    if let Some(source_dir) = &args.source_dir {
        estimator = estimator.with_source_dir(source_dir);
    }

    let (partitions, _) = estimator.collect_partition_table(args.phase.mode());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&partitions)?);
        return Ok(());
    }

    println!("MOUNT                FS        TOTAL         USED          FREE");
    println!("------------------------------------------------------------------");

    for part in &partitions {
        println!(
            "{:<20} {:<9} {:>13} {:>13} {:>13}{}",
            part.mount_path,
            part.filesystem_kind.as_str(),
            format_size(part.total_bytes),
            format_size(part.used_now_bytes),
            format_size(part.free_bytes),
            if part.growonly { " (snapshots)" } else { "" }
        );
    }

    let free: u64 = partitions.iter().map(|part| part.free_bytes).sum();
    println!();
    println!(
        "partitions={} free={}",
        partitions.len(),
        bytes_to_pretty(&free, true)
    );

    Ok(())
}
