use std::fs;
use std::time::Duration;

use smartcity_dash::core::derived::{format_thousands, AirQualityCategory};
use smartcity_dash::core::feed::{reference_snapshot, FileFeed};
use smartcity_dash::core::{open_source, DashboardSummary, FeedError, FeedKind, FeedOptions, RefreshLoop};
use tempfile::TempDir;

fn write_snapshot(dir: &TempDir, aqi: u32) -> std::path::PathBuf {
    let mut snapshot = reference_snapshot();
    snapshot.air_quality_index = aqi;

    let path = dir.path().join("city.json");
    fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    path
}

#[tokio::test(start_paused = true)]
async fn file_feed_changes_show_up_on_next_refresh() {
    let dir = TempDir::new().unwrap();
    let path = write_snapshot(&dir, 40);

    let mut refresh = RefreshLoop::new(Duration::from_secs(5));
    let mut updates = refresh.subscribe();
    let first = refresh.activate(FileFeed::new(&path)).unwrap();
    assert_eq!(
        DashboardSummary::from_snapshot(&first).air_quality_category,
        AirQualityCategory::VeryGood
    );

    write_snapshot(&dir, 230);
    updates.borrow_and_update();
    tokio::time::sleep(Duration::from_secs(6)).await;
    updates.changed().await.unwrap();

    let current = refresh.current().unwrap();
    let summary = DashboardSummary::from_snapshot(&current);
    assert_eq!(summary.air_quality_index, 230);
    assert_eq!(summary.air_quality_category, AirQualityCategory::VeryPoor);
    assert_eq!(format_thousands(summary.total_transit_riders as i64), "53.000");
}

#[tokio::test(start_paused = true)]
async fn broken_file_keeps_last_good_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = write_snapshot(&dir, 65);

    let mut refresh = RefreshLoop::new(Duration::from_secs(5));
    refresh.activate(FileFeed::new(&path)).unwrap();

    fs::write(&path, r#"{"mobility_network": {"stations": [{"status": "Reserved"}]}}"#).unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;

    assert!(refresh.is_active());
    assert_eq!(refresh.current().unwrap().air_quality_index, 65);

    refresh.deactivate();
    assert!(refresh.current().is_some());
    refresh.clear();
    assert!(refresh.current().is_none());
}

#[tokio::test]
async fn open_source_builds_each_feed() {
    let reference = open_source(FeedKind::Reference, &FeedOptions::default())
        .unwrap()
        .generate()
        .unwrap();
    let summary = DashboardSummary::from_snapshot(&reference);
    assert_eq!(summary.renewable_share_percent, Some(90));
    assert_eq!(summary.total_transit_riders, 53_000);

    let options = FeedOptions {
        seed: Some(11),
        jitter: 0.2,
        ..FeedOptions::default()
    };
    let jittered = open_source(FeedKind::Jitter, &options).unwrap().generate().unwrap();
    assert_eq!(jittered.energy_mix.len(), reference.energy_mix.len());
    assert!(jittered.mobility_network.counters_consistent());

    assert!(matches!(
        open_source(FeedKind::File, &FeedOptions::default()),
        Err(FeedError::MissingPath)
    ));
}
