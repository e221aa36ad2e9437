//! Integration tests for the crawl scheduler against an in-memory archive

use crate::support::{seed_store, unit, units, FakeArchive};
use news_archive_harvester::crawler::{CrawlConfig, CrawlError, CrawlScheduler};
use news_archive_harvester::fetcher::FetcherError;
use news_archive_harvester::store::CheckpointStore;
use std::time::Duration;
use tempfile::TempDir;

fn scheduler(dir: &TempDir, floor: &str, archive: &FakeArchive) -> CrawlScheduler {
    let config = CrawlConfig::new("test-key", dir.path())
        .with_historical_floor(unit(floor))
        .with_rate_limit(Duration::ZERO);
    CrawlScheduler::new(config, Box::new(archive.clone())).unwrap()
}

#[tokio::test]
async fn test_fresh_store_walks_back_from_current_month() {
    let dir = TempDir::new().unwrap();
    let archive = FakeArchive::new();
    let scheduler = scheduler(&dir, "2023-11", &archive);

    let report = scheduler.run(unit("2024-03")).await.unwrap();

    assert!(report.forward.units.is_empty());
    assert_eq!(
        archive.fetched(),
        units(&["2024-03", "2024-02", "2024-01", "2023-12", "2023-11"])
    );
    assert_eq!(report.backward.records, 15);
}

#[tokio::test]
async fn test_single_checkpoint_fills_forward_then_backward() {
    let dir = TempDir::new().unwrap();
    seed_store(dir.path(), &["2020-01"]);
    let archive = FakeArchive::new();
    let scheduler = scheduler(&dir, "2019-10", &archive);

    let report = scheduler.run(unit("2020-03")).await.unwrap();

    assert_eq!(report.forward.units, units(&["2020-01", "2020-02", "2020-03"]));
    assert_eq!(
        report.backward.units,
        units(&["2020-01", "2019-12", "2019-11", "2019-10"])
    );
    assert_eq!(
        scheduler.store().list_units().unwrap(),
        units(&["2019-10", "2019-11", "2019-12", "2020-01", "2020-02", "2020-03"])
    );
}

#[tokio::test]
async fn test_forward_progress_is_monotonic_and_contiguous() {
    let dir = TempDir::new().unwrap();
    seed_store(dir.path(), &["2021-10"]);
    let archive = FakeArchive::new();
    let scheduler = scheduler(&dir, "2021-10", &archive);

    let before = scheduler.store().newest_unit().unwrap();
    scheduler.forward_fill(unit("2022-02")).await.unwrap();
    let after = scheduler.store().newest_unit().unwrap();

    assert!(after >= before);
    for u in news_archive_harvester::MonthUnit::range_inclusive(before, after) {
        assert!(scheduler.store().has(u), "missing checkpoint for {u}");
    }
}

#[tokio::test]
async fn test_second_run_refetches_only_current_month() {
    let dir = TempDir::new().unwrap();
    seed_store(dir.path(), &["2020-01"]);
    let archive = FakeArchive::new();
    let scheduler = scheduler(&dir, "2020-01", &archive);

    scheduler.run(unit("2020-04")).await.unwrap();
    archive.clear();

    scheduler.run(unit("2020-04")).await.unwrap();
    assert_eq!(archive.fetched(), units(&["2020-04"]));
}

#[tokio::test]
async fn test_new_month_extends_forward() {
    let dir = TempDir::new().unwrap();
    seed_store(dir.path(), &["2020-01", "2020-02"]);
    let archive = FakeArchive::new();
    let scheduler = scheduler(&dir, "2020-01", &archive);

    scheduler.run(unit("2020-02")).await.unwrap();
    archive.clear();

    // A calendar month later
    scheduler.run(unit("2020-03")).await.unwrap();
    assert_eq!(archive.fetched(), units(&["2020-02", "2020-03"]));
}

#[tokio::test]
async fn test_backward_never_passes_floor() {
    let dir = TempDir::new().unwrap();
    seed_store(dir.path(), &["1990-04"]);
    let archive = FakeArchive::new();
    let scheduler = scheduler(&dir, "1990-01", &archive);

    scheduler.backward_fill(unit("1990-04")).await.unwrap();

    assert_eq!(
        archive.fetched(),
        units(&["1990-04", "1990-03", "1990-02", "1990-01"])
    );
    assert!(archive.fetched().iter().all(|u| *u >= unit("1990-01")));
    assert!(!scheduler.store().has(unit("1989-12")));
}

#[tokio::test]
async fn test_failure_keeps_completed_months_and_resumes() {
    let dir = TempDir::new().unwrap();
    seed_store(dir.path(), &["2020-01"]);
    let archive = FakeArchive::new();
    archive.fail_with(unit("2020-03"), 503);
    let scheduler = scheduler(&dir, "2019-12", &archive);

    let result = scheduler.run(unit("2020-04")).await;
    assert!(matches!(
        result,
        Err(CrawlError::Fetch(FetcherError::HttpStatus { status: 503, .. }))
    ));
    // Forward failed, so backward never started
    assert_eq!(archive.fetched(), units(&["2020-01", "2020-02", "2020-03"]));
    assert_eq!(
        scheduler.store().list_units().unwrap(),
        units(&["2020-01", "2020-02"])
    );

    archive.heal();
    archive.clear();
    scheduler.run(unit("2020-04")).await.unwrap();

    assert_eq!(
        archive.fetched(),
        units(&["2020-02", "2020-03", "2020-04", "2020-01", "2019-12"])
    );
}

#[tokio::test]
async fn test_malformed_month_leaves_store_untouched() {
    let dir = TempDir::new().unwrap();
    let store = seed_store(dir.path(), &["2020-01"]);
    let before = std::fs::read_to_string(store.path_for(unit("2020-01"))).unwrap();

    let archive = FakeArchive::new();
    archive.malformed(unit("2020-01"));
    let scheduler = scheduler(&dir, "2020-01", &archive);

    let result = scheduler.forward_fill(unit("2020-02")).await;
    assert!(matches!(
        result,
        Err(CrawlError::Fetch(FetcherError::MissingField { field: "pub_date", .. }))
    ));

    let after = std::fs::read_to_string(store.path_for(unit("2020-01"))).unwrap();
    assert_eq!(before, after);
    assert_eq!(store.list_units().unwrap(), units(&["2020-01"]));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn test_gap_fill_repairs_deleted_middle_month() {
    let dir = TempDir::new().unwrap();
    let store = seed_store(dir.path(), &["2020-01", "2020-02", "2020-03"]);
    std::fs::remove_file(store.path_for(unit("2020-02"))).unwrap();

    let archive = FakeArchive::new();
    let scheduler = scheduler(&dir, "2020-01", &archive);
    let report = scheduler.run(unit("2020-03")).await.unwrap();

    assert_eq!(report.gaps.units, units(&["2020-02"]));
    assert!(CheckpointStore::open(dir.path())
        .unwrap()
        .missing_units()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_written_boundaries_fall_inside_their_month() {
    let dir = TempDir::new().unwrap();
    let archive = FakeArchive::new();
    let scheduler = scheduler(&dir, "2019-11", &archive);

    scheduler.run(unit("2020-01")).await.unwrap();

    let store = scheduler.store();
    for u in store.list_units().unwrap() {
        let records = store.read_records(u).unwrap();
        assert_eq!(records.first().unwrap().unit().unwrap(), u);
        assert_eq!(records.last().unwrap().unit().unwrap(), u);
    }
}
