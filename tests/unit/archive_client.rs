//! Unit tests for the archive HTTP client

use crate::support::{archive_path, ok_routes, unit, ArchiveServer};
use news_archive_harvester::fetcher::archive::ArchiveClient;
use news_archive_harvester::fetcher::{normalize, ArchiveSource, FetcherError, FetcherResult};
use news_archive_harvester::Record;
use std::collections::HashMap;

#[tokio::test]
async fn test_fetch_success_and_normalize() {
    let server = ArchiveServer::start(ok_routes(&["2020-01"])).await;
    let client = ArchiveClient::new_with_base_url("key-123", server.base_url()).unwrap();

    let response = client.fetch(unit("2020-01")).await.unwrap();
    assert_eq!(response.unit(), unit("2020-01"));
    assert_eq!(response.body()["status"], "OK");
    assert_eq!(response.body()["response"]["meta"]["hits"], 3);

    let records: Vec<Record> = normalize(&response).collect::<FetcherResult<_>>().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].date, "2020-01-01T12:00:00+0000");
    assert_eq!(records[0].headline, "Headline 2020-01 #1");
    assert_eq!(records[2].lead_paragraph, "Lead paragraph 3, with a comma");

    let requests = server.requests();
    assert_eq!(requests, vec![format!("{}?api-key=key-123", archive_path(unit("2020-01")))]);
}

#[tokio::test]
async fn test_month_path_is_not_zero_padded() {
    let server = ArchiveServer::start(ok_routes(&["1995-07"])).await;
    let client = ArchiveClient::new_with_base_url("k", server.base_url()).unwrap();

    client.fetch(unit("1995-07")).await.unwrap();
    assert!(server.requests()[0].starts_with("/svc/archive/v1/1995/7.json"));
}

#[tokio::test]
async fn test_non_success_status_is_error() {
    for status in [401u16, 429, 500] {
        let routes = HashMap::from([(
            archive_path(unit("2021-03")),
            (status, r#"{"fault":"nope"}"#.to_string()),
        )]);
        let server = ArchiveServer::start(routes).await;
        let client = ArchiveClient::new_with_base_url("k", server.base_url()).unwrap();

        let err = client.fetch(unit("2021-03")).await.unwrap_err();
        match err {
            FetcherError::HttpStatus { unit: u, status: s } => {
                assert_eq!(u, unit("2021-03"));
                assert_eq!(s, status);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

#[tokio::test]
async fn test_unknown_month_is_404() {
    let server = ArchiveServer::start(HashMap::new()).await;
    let client = ArchiveClient::new_with_base_url("k", server.base_url()).unwrap();

    assert!(matches!(
        client.fetch(unit("2030-01")).await,
        Err(FetcherError::HttpStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let routes = HashMap::from([(
        archive_path(unit("2020-01")),
        (200, "<html>maintenance</html>".to_string()),
    )]);
    let server = ArchiveServer::start(routes).await;
    let client = ArchiveClient::new_with_base_url("k", server.base_url()).unwrap();

    assert!(matches!(
        client.fetch(unit("2020-01")).await,
        Err(FetcherError::ParseError(_))
    ));
}

#[tokio::test]
async fn test_missing_article_list_surfaces_on_normalize() {
    let routes = HashMap::from([(
        archive_path(unit("2020-01")),
        (200, r#"{"status":"OK","response":{}}"#.to_string()),
    )]);
    let server = ArchiveServer::start(routes).await;
    let client = ArchiveClient::new_with_base_url("k", server.base_url()).unwrap();

    let response = client.fetch(unit("2020-01")).await.unwrap();
    let mut records = normalize(&response);
    assert!(matches!(records.next(), Some(Err(FetcherError::InvalidResponse(_)))));
    assert!(records.next().is_none());
}
