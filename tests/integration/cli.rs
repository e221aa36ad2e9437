//! End-to-end tests driving the binary

use crate::support::{archive_path, ok_routes, seed_store, unit, units, ArchiveServer};
use assert_cmd::Command;
use news_archive_harvester::store::CheckpointStore;
use tempfile::TempDir;

fn harvester() -> Command {
    let mut cmd = Command::cargo_bin("news-archive-harvester").unwrap();
    cmd.env_remove("NYT_API_KEY")
        .env_remove("ARCHIVE_STORE_DIR")
        .env_remove("ARCHIVE_FLOOR")
        .env_remove("ARCHIVE_RATE_LIMIT_SECS")
        .env_remove("ARCHIVE_BASE_URL")
        .env("RUST_LOG", "news_archive_harvester=warn");
    cmd
}

#[test]
fn test_status_reports_frontier_and_gaps() {
    let dir = TempDir::new().unwrap();
    seed_store(dir.path(), &["2020-01", "2020-02", "2020-05"]);

    let output = harvester()
        .args(["--store-dir"])
        .arg(dir.path())
        .args(["--output-format", "json", "status", "--all"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["count"], 3);
    assert_eq!(status["first"], "2020-01");
    assert_eq!(status["last"], "2020-05");
    assert_eq!(status["newest"], "2020-05");
    assert_eq!(status["oldest"], "2020-01");
    assert_eq!(status["missing"], serde_json::json!(["2020-03", "2020-04"]));
    assert_eq!(status["units"].as_array().unwrap().len(), 3);
}

#[test]
fn test_status_human_on_empty_store() {
    let dir = TempDir::new().unwrap();

    let output = harvester()
        .arg("--store-dir")
        .arg(dir.path().join("missing"))
        .arg("status")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Checkpoints: 0"));
    assert!(stdout.contains("Newest month: unknown"));
    assert!(!dir.path().join("missing").exists());
}

#[test]
fn test_combine_writes_single_header() {
    let dir = TempDir::new().unwrap();
    let store_dir = dir.path().join("nyt");
    seed_store(&store_dir, &["2020-01", "2020-02"]);
    let combined = dir.path().join("nyt_combined.csv");

    harvester()
        .arg("--store-dir")
        .arg(&store_dir)
        .arg("combine")
        .arg("--output")
        .arg(&combined)
        .assert()
        .success();

    let contents = std::fs::read_to_string(&combined).unwrap();
    assert!(contents.starts_with("date,headline,lead_paragraph\n"));
    assert_eq!(contents.matches("date,headline,lead_paragraph").count(), 1);
    assert_eq!(contents.lines().count(), 5);
}

#[test]
fn test_combine_missing_store_fails() {
    let dir = TempDir::new().unwrap();

    harvester()
        .arg("--store-dir")
        .arg(dir.path().join("nope"))
        .arg("combine")
        .arg("--output")
        .arg(dir.path().join("out.csv"))
        .assert()
        .failure();
}

#[test]
fn test_crawl_requires_api_key() {
    let dir = TempDir::new().unwrap();

    harvester()
        .arg("--store-dir")
        .arg(dir.path())
        .arg("crawl")
        .assert()
        .failure();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_crawl_against_archive_server() {
    let server = ArchiveServer::start(ok_routes(&["2020-01", "2020-02", "2020-03"])).await;
    let dir = TempDir::new().unwrap();
    seed_store(dir.path(), &["2020-02"]);
    // Leftover from a killed write
    std::fs::write(dir.path().join(".tmpK1lled"), "date,headline,lead_paragraph\n").unwrap();
    let store_dir = dir.path().to_path_buf();
    let base_url = server.base_url();

    let output = tokio::task::spawn_blocking(move || {
        harvester()
            .arg("--store-dir")
            .arg(&store_dir)
            .args(["--output-format", "json", "crawl"])
            .args(["--api-key", "secret-key", "--floor", "2020-01", "--now", "2020-03"])
            .args(["--rate-limit-secs", "0", "--base-url"])
            .arg(&base_url)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["forward"]["units"], serde_json::json!(["2020-02", "2020-03"]));
    assert_eq!(report["backward"]["units"], serde_json::json!(["2020-02", "2020-01"]));
    assert_eq!(report["total_records"], 12);

    let store = CheckpointStore::open(dir.path()).unwrap();
    assert_eq!(
        store.list_units().unwrap(),
        units(&["2020-01", "2020-02", "2020-03"])
    );
    assert!(!dir.path().join(".tmpK1lled").exists());

    let requests = server.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests[0].starts_with(&archive_path(unit("2020-02"))));
    assert!(requests.iter().all(|r| r.contains("api-key=secret-key")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_crawl_stops_on_http_error() {
    let mut routes = ok_routes(&["2020-01"]);
    routes.insert(
        archive_path(unit("2020-02")),
        (429, r#"{"fault":"rate limit"}"#.to_string()),
    );
    let server = ArchiveServer::start(routes).await;
    let dir = TempDir::new().unwrap();
    seed_store(dir.path(), &["2020-01"]);
    let store_dir = dir.path().to_path_buf();
    let base_url = server.base_url();

    let output = tokio::task::spawn_blocking(move || {
        harvester()
            .arg("--store-dir")
            .arg(&store_dir)
            .args(["crawl", "--api-key", "k", "--floor", "2019-01", "--now", "2020-03"])
            .args(["--rate-limit-secs", "0", "--base-url"])
            .arg(&base_url)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("429"));

    let store = CheckpointStore::open(dir.path()).unwrap();
    assert_eq!(store.list_units().unwrap(), units(&["2020-01"]));
    // Backward fill never ran
    assert_eq!(server.requests().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_crawl_reads_dotenv_file() {
    let server = ArchiveServer::start(ok_routes(&["2020-01", "2020-02"])).await;
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        format!(
            "NYT_API_KEY=from-dotenv\nARCHIVE_BASE_URL={}\nARCHIVE_STORE_DIR=store\n",
            server.base_url()
        ),
    )
    .unwrap();
    let work_dir = dir.path().to_path_buf();

    let output = tokio::task::spawn_blocking(move || {
        harvester()
            .current_dir(&work_dir)
            .args(["crawl", "--floor", "2020-01", "--now", "2020-02", "--rate-limit-secs", "0"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let requests = server.requests();
    assert_eq!(
        requests,
        vec![
            format!("{}?api-key=from-dotenv", archive_path(unit("2020-02"))),
            format!("{}?api-key=from-dotenv", archive_path(unit("2020-01"))),
        ]
    );

    let store = CheckpointStore::open(dir.path().join("store")).unwrap();
    assert_eq!(store.list_units().unwrap(), units(&["2020-01", "2020-02"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_crawl_flag_overrides_dotenv_file() {
    let server = ArchiveServer::start(ok_routes(&["2020-01", "2020-02"])).await;
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        format!("NYT_API_KEY=from-dotenv\nARCHIVE_BASE_URL={}\n", server.base_url()),
    )
    .unwrap();
    let work_dir = dir.path().to_path_buf();

    let output = tokio::task::spawn_blocking(move || {
        harvester()
            .current_dir(&work_dir)
            .args(["--store-dir", "store", "crawl", "--api-key", "from-flag"])
            .args(["--floor", "2020-01", "--now", "2020-02", "--rate-limit-secs", "0"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.ends_with("api-key=from-flag")));
}
