//! Property tests for the backup store.

use std::fs;
use std::path::PathBuf;

use proptest::prelude::*;
use tempfile::TempDir;

use confpack::BackupStore;

fn open_store(tmp: &TempDir) -> BackupStore {
    BackupStore::open(tmp.path().join("backups"), tmp.path().join("backups.json")).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// After n backups and a cleanup keeping k, exactly min(n, k) remain,
    /// and they are the newest ones.
    #[test]
    fn cleanup_keeps_the_newest_min_n_k(n in 0usize..8, k in 0usize..8) {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("a.conf"), "content").unwrap();

        let mut store = open_store(&tmp);
        let mut ids = Vec::new();
        for _ in 0..n {
            let record = store
                .create_backup("pkg", &target, &[PathBuf::from("a.conf")])
                .unwrap();
            ids.push(record.id);
        }

        store.cleanup_old_backups("pkg", k).unwrap();

        let remaining = store.backups_for("pkg").unwrap();
        prop_assert_eq!(remaining.len(), n.min(k));

        // The survivors are exactly the most recently created ids.
        let expected: Vec<_> = ids.iter().rev().take(k).cloned().collect();
        let actual: Vec<_> = remaining.iter().map(|r| r.id.clone()).collect();
        prop_assert_eq!(actual, expected);
    }

    /// Restoring a backup reproduces the captured bytes exactly,
    /// regardless of content or how the target changed since.
    #[test]
    fn restore_reproduces_captured_content(
        original in "[ -~]{0,64}",
        replacement in "[ -~]{0,64}",
    ) {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("mpv.conf"), &original).unwrap();

        let mut store = open_store(&tmp);
        let record = store
            .create_backup("pkg", &target, &[PathBuf::from("mpv.conf")])
            .unwrap();

        fs::write(target.join("mpv.conf"), &replacement).unwrap();
        store.restore_backup(&record.id).unwrap();

        prop_assert_eq!(
            fs::read_to_string(target.join("mpv.conf")).unwrap(),
            original
        );
    }

    /// Backup ids are unique and strictly increasing in creation order,
    /// even when many are taken within the same second.
    #[test]
    fn ids_are_unique_and_ordered(n in 1usize..10) {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("a.conf"), "x").unwrap();

        let mut store = open_store(&tmp);
        let ids: Vec<String> = (0..n)
            .map(|_| {
                store
                    .create_backup("pkg", &target, &[PathBuf::from("a.conf")])
                    .unwrap()
                    .id
            })
            .collect();

        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), ids.len());
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
