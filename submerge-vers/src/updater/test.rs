use test_log::test;

use super::*;

fn updater(dir: &std::path::Path) -> BinaryUpdater {
    let local_datastore = dir.join("inspector-tuf");
    std::fs::create_dir_all(&local_datastore).unwrap();
    BinaryUpdater::new(
        "inspector",
        dir.join("inspector-current"),
        local_datastore,
        dir.join("inspector-staging"),
        crate::PINNED_ROOT,
        UpdaterConfig::new("stable", "linux-x86_64", "https://example.invalid/metadata/", "https://example.invalid/targets/"),
        Box::new(|| {}),
    )
}

#[test]
fn config_defaults_match_the_documented_interval_and_timeout() {
    let config = UpdaterConfig::new("stable", "linux-x86_64", "https://example.invalid/metadata/", "https://example.invalid/targets/");
    assert_eq!(config.interval, Duration::from_secs(3600));
    assert_eq!(config.refresh_timeout, Duration::from_secs(30));
}

#[test]
fn target_name_follows_platform_binary_channel_shape() {
    let dir = tempfile::tempdir().unwrap();
    let updater = updater(dir.path());
    assert_eq!(updater.target_name(), "linux-x86_64/inspector-stable.tar.gz");
}

#[test]
fn applied_hash_round_trips_through_the_local_datastore() {
    let dir = tempfile::tempdir().unwrap();
    let updater = updater(dir.path());

    assert_eq!(updater.load_applied_hash().unwrap(), None);

    updater.store_applied_hash(&[1, 2, 3, 4]).unwrap();
    assert_eq!(updater.load_applied_hash().unwrap(), Some(vec![1, 2, 3, 4]));

    updater.store_applied_hash(&[9, 9]).unwrap();
    assert_eq!(updater.load_applied_hash().unwrap(), Some(vec![9, 9]));
}
