// SPDX-License-Identifier: GPL-3.0-only

use packager_contracts::{DfUsage, FilesystemProbe};
use packager_space::{CollectMode, SpaceConfig, SpaceEstimator, estimate_overhead};
use packager_testing::{FakeDevice, FakeEngine, FakeProbe, ProbeCall};
use packager_types::{FilesystemKind, GIB, KIB, MIB, PartitionUsage};

const TARGET_USAGE_BYTES: u64 = (42 + 14 + 10 + 38 + 2 + 1 + 11) * MIB;

fn estimator(probe: FakeProbe) -> SpaceEstimator<FakeProbe> {
    SpaceEstimator::new(SpaceConfig::default(), probe)
}

fn planned(mount_path: &str, device: &str, kind: FilesystemKind, size_kb: u64) -> PartitionUsage {
    let mut part = PartitionUsage::new(mount_path, kind, size_kb);
    part.device = device.to_string();
    part
}

fn formatted(mount_path: &str, device: &str, kind: FilesystemKind, size_kb: u64) -> PartitionUsage {
    let mut part = planned(mount_path, device, kind, size_kb);
    part.is_create_or_format = true;
    part
}

mod fits {
    use super::*;

    #[test]
    fn shortage_is_future_minus_total() {
        let engine = FakeEngine::new()
            .with_disk_usage("/", 10_000_000, 4_000_000, 9_000_000)
            .with_disk_usage("usr", 2_000_000, 1_500_000, 2_300_000);
        let estimator = estimator(FakeProbe::new());

        let (fits, shortages) = estimator.engine_fits(&engine).unwrap();
        assert!(!fits);
        assert_eq!(shortages.len(), 1);
        assert_eq!(shortages[0].mount_path, "usr");
        assert_eq!(shortages[0].shortage_kib, 300_000);
    }

    #[test]
    fn exactly_full_still_fits() {
        let engine = FakeEngine::new().with_disk_usage("/", 1000, 10, 1000);
        let (fits, shortages) = estimator(FakeProbe::new()).engine_fits(&engine).unwrap();
        assert!(fits);
        assert!(shortages.is_empty());
    }

    #[test]
    fn engine_errors_propagate() {
        let engine = FakeEngine::new().unavailable();
        assert!(estimator(FakeProbe::new()).engine_fits(&engine).is_err());
    }
}

mod free_percentage {
    use packager_contracts::PackageEngine;

    use super::*;

    const MAX_UNSATISFIED_KIB: u64 = 750 * 1024;

    #[test]
    fn comfortable_root_has_no_warning() {
        let engine = FakeEngine::new().with_disk_usage("/", 10_000_000, 4_000_000, 4_500_000);
        let table = engine.disk_usage_table().unwrap();

        let warnings =
            estimator(FakeProbe::new()).check_free_percentage(&table, 25, MAX_UNSATISFIED_KIB);
        assert!(warnings.is_empty());
    }

    #[test]
    fn nearly_full_root_warns_once() {
        let engine = FakeEngine::new().with_disk_usage("/", 10_000_000, 4_000_000, 9_900_000);
        let table = engine.disk_usage_table().unwrap();

        let warnings =
            estimator(FakeProbe::new()).check_free_percentage(&table, 25, MAX_UNSATISFIED_KIB);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].mount_path, "/");
        assert_eq!(warnings[0].free_percent, 1);
        assert_eq!(warnings[0].free_kib, 100_000);
    }

    #[test]
    fn untouched_directories_are_ignored() {
        let engine = FakeEngine::new()
            .with_disk_usage("/", 10_000_000, 9_900_000, 9_900_000)
            .with_disk_usage("var", 10_000_000, 9_950_000, 9_900_000);
        let table = engine.disk_usage_table().unwrap();

        let warnings =
            estimator(FakeProbe::new()).check_free_percentage(&table, 25, MAX_UNSATISFIED_KIB);
        assert!(warnings.is_empty());
    }
}

mod fresh_target {
    use super::*;

    #[test]
    fn formatted_filesystem_loses_spare_overhead_and_target_usage() {
        let root = formatted("/", "/dev/sda2", FilesystemKind::Ext4, 20 * 1024 * 1024);
        let overhead = estimate_overhead(&SpaceConfig::default(), &root);
        let size = 20 * GIB;

        let mut estimator = estimator(FakeProbe::new());
        let (partitions, failed) =
            estimator.collect_partition_table(CollectMode::FreshTarget(&[root]));

        assert!(failed.is_empty());
        assert_eq!(partitions.len(), 1);
        let root = &partitions[0];
        assert_eq!(root.mount_path, "/");
        assert_eq!(root.total_bytes, size);
        assert_eq!(root.used_now_bytes, overhead + TARGET_USAGE_BYTES);
        assert_eq!(root.free_bytes, size - 20 * MIB - overhead - TARGET_USAGE_BYTES);
        // nothing was mounted for a filesystem that does not exist yet
        assert!(estimator.probe().calls().is_empty());
    }

    #[test]
    fn target_usage_goes_to_the_hosting_partition() {
        let plan = [
            formatted("/", "/dev/sda2", FilesystemKind::Xfs, 20 * 1024 * 1024),
            formatted("/var", "/dev/sda3", FilesystemKind::Xfs, 20 * 1024 * 1024),
        ];
        let config = SpaceConfig::default();
        let overhead = estimate_overhead(&config, &plan[0]);

        let mut estimator = estimator(FakeProbe::new());
        let (partitions, _) = estimator.collect_partition_table(CollectMode::FreshTarget(&plan));

        assert_eq!(partitions[1].mount_path, "var");
        // /etc, /usr/share and /boot/initrd stay on the root filesystem
        assert_eq!(partitions[0].used_now_bytes, overhead + 14 * MIB);
        assert_eq!(partitions[1].used_now_bytes, overhead + 104 * MIB);
    }

    #[test]
    fn reused_filesystem_is_probed_read_only_and_unmounted() {
        let mut home = planned("/home", "/dev/sda3", FilesystemKind::Ext4, 1_000_000);
        home.mount_options = vec!["noatime".to_string(), "ro".to_string()];

        let probe = FakeProbe::new().with_device(
            "/dev/sda3",
            FakeDevice {
                df: DfUsage {
                    total_kib: 1_000_000,
                    used_kib: 400_000,
                    free_kib: 600_000,
                },
                ..FakeDevice::default()
            },
        );
        let scratch = probe.scratch_mount_point();

        let mut estimator = estimator(probe);
        let (partitions, failed) =
            estimator.collect_partition_table(CollectMode::FreshTarget(&[home]));

        assert!(failed.is_empty());
        assert_eq!(partitions[0].mount_path, "home");
        assert_eq!(partitions[0].used_now_bytes, 400_000 * KIB);
        assert_eq!(partitions[0].free_bytes, 600_000 * KIB);

        assert_eq!(
            estimator.probe().calls(),
            vec![
                ProbeCall::Mount {
                    device: "/dev/sda3".to_string(),
                    mount_point: scratch.clone(),
                    options: vec!["noatime".to_string(), "ro".to_string()],
                },
                ProbeCall::Unmount {
                    mount_point: scratch,
                },
            ]
        );
        assert!(estimator.probe().active_mounts().is_empty());
    }

    #[test]
    fn busy_unmount_keeps_the_measurement_and_shows_the_mount() {
        let home = planned("/home", "/dev/sda3", FilesystemKind::Ext4, 1_000_000);
        let probe = FakeProbe::new()
            .with_device(
                "/dev/sda3",
                FakeDevice {
                    df: DfUsage {
                        total_kib: 1_000_000,
                        used_kib: 250_000,
                        free_kib: 750_000,
                    },
                    ..FakeDevice::default()
                },
            )
            .with_failing_unmount();
        let scratch = probe.scratch_mount_point();

        let mut estimator = estimator(probe);
        let (partitions, failed) =
            estimator.collect_partition_table(CollectMode::FreshTarget(&[home]));

        assert!(failed.is_empty());
        assert_eq!(partitions[0].free_bytes, 750_000 * KIB);
        assert_eq!(estimator.probe().active_mounts(), vec![scratch]);
    }

    #[test]
    fn nfs_is_probed_without_locking() {
        let share = planned("/srv", "server:/export", FilesystemKind::Nfs, 1_000_000);
        let probe = FakeProbe::new().with_device("server:/export", FakeDevice::default());

        let mut estimator = estimator(probe);
        estimator.collect_partition_table(CollectMode::FreshTarget(&[share]));

        let calls = estimator.probe().calls();
        let ProbeCall::Mount { options, .. } = &calls[0] else {
            panic!("expected a mount call, got {calls:?}");
        };
        assert_eq!(options, &vec!["ro".to_string(), "nolock".to_string()]);
    }

    #[test]
    fn reused_btrfs_reports_btrfs_usage_and_snapshots() {
        let srv = planned("/srv", "/dev/sdb1", FilesystemKind::Btrfs, 10 * 1024 * 1024);
        let probe = FakeProbe::new().with_device(
            "/dev/sdb1",
            FakeDevice {
                btrfs_used_bytes: Some(2 * GIB),
                snapshots: true,
                ..FakeDevice::default()
            },
        );

        let mut estimator = estimator(probe);
        let (partitions, _) = estimator.collect_partition_table(CollectMode::FreshTarget(&[srv]));

        assert_eq!(partitions[0].used_now_bytes, 2 * GIB);
        assert_eq!(partitions[0].free_bytes, 10 * GIB - 20 * MIB - 2 * GIB);
        assert!(partitions[0].growonly);
    }

    #[test]
    fn unreadable_btrfs_usage_falls_back_to_df() {
        let srv = planned("/srv", "/dev/sdb1", FilesystemKind::Btrfs, 10 * 1024 * 1024);
        let probe = FakeProbe::new().with_device(
            "/dev/sdb1",
            FakeDevice {
                df: DfUsage {
                    total_kib: 10 * 1024 * 1024,
                    used_kib: 9 * 1024 * 1024,
                    free_kib: 1024 * 1024,
                },
                btrfs_used_bytes: None,
                snapshots: true,
            },
        );

        let mut estimator = estimator(probe);
        let (partitions, failed) =
            estimator.collect_partition_table(CollectMode::FreshTarget(&[srv]));

        assert!(failed.is_empty());
        assert_eq!(partitions[0].used_now_bytes, 9 * GIB);
        assert_eq!(partitions[0].free_bytes, GIB);
        assert!(partitions[0].growonly);
        assert!(estimator.probe().active_mounts().is_empty());
    }

    #[test]
    fn failed_mounts_are_recorded_not_raised() {
        let plan = [
            formatted("/", "/dev/sda2", FilesystemKind::Ext4, 20 * 1024 * 1024),
            planned("/var", "/dev/sdc1", FilesystemKind::Xfs, 1_000_000),
            planned("/data", "/dev/sdd1", FilesystemKind::Ext4, 1_000_000),
        ];
        let probe = FakeProbe::new()
            .with_failing_device("/dev/sdc1")
            .with_failing_device("/dev/sdd1");

        let mut estimator = estimator(probe);
        let (partitions, failed) =
            estimator.collect_partition_table(CollectMode::FreshTarget(&plan));

        assert_eq!(partitions.len(), 1);
        assert_eq!(failed.len(), 2);
        assert_eq!(estimator.failed_mounts().len(), 2);

        let blockers: Vec<_> = estimator.blocking_failed_mounts().collect();
        assert_eq!(blockers.len(), 1);
        assert_eq!(blockers[0].mount_path, "/var");
        assert_eq!(blockers[0].device, "/dev/sdc1");
        assert!(!failed[1].blocker);
    }

    #[test]
    fn swap_volatile_and_foreign_filesystems_are_skipped() {
        let mut tmp = formatted("/tmp", "/dev/sda5", FilesystemKind::Ext4, 1_000_000);
        tmp.persistent = false;
        let plan = [
            formatted("swap", "/dev/sda1", FilesystemKind::Unknown, 1_000_000),
            formatted("/boot/efi", "/dev/sda4", FilesystemKind::Vfat, 500_000),
            tmp,
            formatted("/", "/dev/sda2", FilesystemKind::Ext4, 20 * 1024 * 1024),
        ];

        let mut estimator = estimator(FakeProbe::new());
        let (partitions, _) = estimator.collect_partition_table(CollectMode::FreshTarget(&plan));

        let names: Vec<_> = partitions.iter().map(|part| part.mount_path.as_str()).collect();
        assert_eq!(names, vec!["/"]);
    }

    #[test]
    fn tiny_partitions_never_go_negative() {
        let plan = [
            formatted("/", "/dev/sda2", FilesystemKind::Ext4, 1024),
            formatted("/boot", "/dev/sda1", FilesystemKind::Reiser, 30 * 1024),
            formatted("/opt", "/dev/sda3", FilesystemKind::Xfs, 0),
        ];

        let mut estimator = estimator(FakeProbe::new());
        let (partitions, _) = estimator.collect_partition_table(CollectMode::FreshTarget(&plan));

        assert_eq!(partitions.len(), 3);
        for part in &partitions {
            assert_eq!(part.free_bytes, 0, "{}", part.mount_path);
        }
    }
}

mod live {
    use super::*;

    fn running_system() -> FakeProbe {
        FakeProbe::new()
            .with_mount("/dev/sda2", "/", "ext4", 10_000_000, 4_000_000, 6_000_000)
            .with_mount("udev", "/dev", "devtmpfs", 4_000_000, 0, 4_000_000)
            .with_mount("/dev/sr0", "/run/media/user/DVD", "iso9660", 4_000_000, 4_000_000, 0)
            .with_mount("/dev/sda1", "/boot/efi", "vfat", 500_000, 10_000, 490_000)
            .with_mount("/dev/sda3", "/home", "btrfs", 50_000_000, 10_000_000, 40_000_000)
            .with_mount("/dev/sdb1", "/srv/install", "ext4", 8_000_000, 7_000_000, 1_000_000)
            .with_live_btrfs("/home", Some(12_000_000 * KIB), true)
    }

    #[test]
    fn normal_mode_applies_spare_and_ignore_lists() {
        let mut estimator = estimator(running_system()).with_source_dir("/srv/install");
        let (partitions, failed) = estimator.collect_partition_table(CollectMode::Normal);

        assert!(failed.is_empty());
        let names: Vec<_> = partitions.iter().map(|part| part.mount_path.as_str()).collect();
        assert_eq!(names, vec!["/", "/home"]);

        // 5% of 6_000_000 KiB
        assert_eq!(partitions[0].free_bytes, 5_700_000 * KIB);
        assert_eq!(partitions[0].used_now_bytes, 4_000_000 * KIB);

        // btrfs usage replaces df, spare capped at 1 GiB
        assert_eq!(partitions[1].used_now_bytes, 12_000_000 * KIB);
        assert_eq!(partitions[1].free_bytes, (38_000_000 - 1_048_576) * KIB);
        assert!(partitions[1].growonly);
    }

    #[test]
    fn continue_mode_keeps_only_the_minimum_spare() {
        let mut estimator = estimator(running_system());
        let (partitions, _) = estimator.collect_partition_table(CollectMode::Continue);

        assert_eq!(partitions[0].free_bytes, (6_000_000 - 10 * 1024) * KIB);
    }

    #[test]
    fn btrfs_probe_failure_falls_back_to_df() {
        let probe = FakeProbe::new()
            .with_mount("/dev/sda3", "/", "btrfs", 50_000_000, 10_000_000, 40_000_000)
            .with_live_btrfs("/", None, false);

        let mut estimator = estimator(probe);
        let (partitions, _) = estimator.collect_partition_table(CollectMode::Continue);

        assert_eq!(partitions[0].used_now_bytes, 10_000_000 * KIB);
        assert_eq!(partitions[0].free_bytes, (40_000_000 - 10 * 1024) * KIB);
        assert!(!partitions[0].growonly);
    }

    #[test]
    fn mounts_are_named_relative_to_target_root() {
        let probe = FakeProbe::new()
            .with_mount("/dev/sda2", "/", "ext4", 10_000_000, 4_000_000, 6_000_000)
            .with_mount("/dev/sdb2", "/mnt", "xfs", 20_000_000, 5_000_000, 15_000_000)
            .with_mount("/dev/sdb1", "/mnt/boot", "ext2", 500_000, 100_000, 400_000)
            .with_mount("/dev/sdc1", "/mnt2", "ext4", 500_000, 100_000, 400_000);

        let mut estimator = estimator(probe).with_target_root("/mnt");
        let (partitions, _) = estimator.collect_partition_table(CollectMode::Update);

        let names: Vec<_> = partitions.iter().map(|part| part.mount_path.as_str()).collect();
        assert_eq!(names, vec!["/", "/boot"]);
        // 15% of 15_000_000 KiB is above the 1 GiB cap
        assert_eq!(partitions[0].free_bytes, (15_000_000 - 1_048_576) * KIB);
        // 15% of 400_000 KiB
        assert_eq!(partitions[1].free_bytes, 340_000 * KIB);
    }

    #[test]
    fn unreadable_mount_table_gives_empty_table() {
        let mut estimator = estimator(FakeProbe::new().with_unreadable_mounts());
        let (partitions, failed) = estimator.collect_partition_table(CollectMode::Normal);
        assert!(partitions.is_empty());
        assert!(failed.is_empty());
        assert!(estimator.is_collected());
    }

    #[test]
    fn nearly_full_filesystems_report_zero_free() {
        let probe =
            FakeProbe::new().with_mount("/dev/sda2", "/", "ext4", 10_000_000, 9_995_000, 5_000);

        let mut estimator = estimator(probe);
        let (partitions, _) = estimator.collect_partition_table(CollectMode::Update);
        assert_eq!(partitions[0].free_bytes, 0);
    }

    #[test]
    fn ensure_collected_reuses_the_cached_table() {
        let mut estimator = estimator(running_system());
        assert!(estimator.partitions().is_empty());

        let first = estimator.ensure_collected(CollectMode::Normal).to_vec();
        assert_eq!(first.len(), 3);

        // a different mode does not trigger a new collection
        let second = estimator.ensure_collected(CollectMode::Continue).to_vec();
        assert_eq!(first, second);
    }
}
