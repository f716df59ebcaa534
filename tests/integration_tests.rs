//! Integration tests for Study Search
//!
//! These tests run the HTTP index client and a full session against a local
//! mock server.

use mockito::{Matcher, Server};
use std::sync::Arc;
use study_search::catalog::CatalogState;
use study_search::index::IndexError;
use study_search::query::Operator;
use study_search::studies::{FetchOutcome, FetchStatus};
use study_search::{HttpStudyIndex, Session, StudyIndex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn studies_body(count: usize) -> String {
    let results: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "study_id": format!("{}", 1000 + i),
                "title": format!("Memory study {}", i),
                "authors": "Doe J",
                "year": 2019,
                "journal": "Neuron",
            })
        })
        .collect();
    serde_json::json!({ "results": results }).to_string()
}

#[tokio::test]
async fn test_fetch_terms() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/terms")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"terms": ["pain", "fear", "memory"]}"#)
        .create_async()
        .await;

    let index = HttpStudyIndex::new(&server.url()).unwrap();
    let terms = index.fetch_terms().await.unwrap();

    assert_eq!(terms, vec!["pain", "fear", "memory"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_terms_missing_field_is_empty() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/terms")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let index = HttpStudyIndex::new(&server.url()).unwrap();
    assert!(index.fetch_terms().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_studies_encodes_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock(
            "GET",
            Matcher::Regex(r"^/query/memory%20AND%20%28recall%20OR%20fear%29/studies$".to_string()),
        )
        .with_status(200)
        .with_body(studies_body(2))
        .create_async()
        .await;

    let index = HttpStudyIndex::new(&server.url()).unwrap();
    let records = index
        .fetch_studies("memory AND (recall OR fear)")
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title(), "Memory study 0");
    assert_eq!(records[0].study_id.as_deref(), Some("1000"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_studies_partial_records() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex(r"^/query/.+/studies$".to_string()))
        .with_status(200)
        .with_body(r#"{"results": [{"title": "Recall under stress", "study_id": 123, "year": "2020"}, {}]}"#)
        .create_async()
        .await;

    let index = HttpStudyIndex::new(&server.url()).unwrap();
    let records = index.fetch_studies("recall").await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].study_id.as_deref(), Some("123"));
    assert_eq!(
        records[0].record_url().as_deref(),
        Some("https://pubmed.ncbi.nlm.nih.gov/123")
    );
    assert_eq!(records[1].title(), "");
    assert!(records[1].record_url().is_none());
}

#[tokio::test]
async fn test_fetch_studies_absent_results_is_empty() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex(r"^/query/.+/studies$".to_string()))
        .with_status(200)
        .with_body(r#"{"results": null}"#)
        .create_async()
        .await;

    let index = HttpStudyIndex::new(&server.url()).unwrap();
    assert!(index.fetch_studies("fear").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_error_body_is_surfaced_verbatim() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex(r"^/query/.+/studies$".to_string()))
        .with_status(400)
        .with_body(r#"{"error": "Unbalanced parenthesis"}"#)
        .create_async()
        .await;

    let index = HttpStudyIndex::new(&server.url()).unwrap();
    let err = index.fetch_studies("(memory").await.unwrap_err();

    assert_eq!(
        err,
        IndexError::Status {
            status: 400,
            message: "Unbalanced parenthesis".to_string()
        }
    );
    assert_eq!(err.to_string(), "Unbalanced parenthesis");
}

#[tokio::test]
async fn test_error_without_body_uses_status() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/terms")
        .with_status(500)
        .create_async()
        .await;

    let index = HttpStudyIndex::new(&server.url()).unwrap();
    let err = index.fetch_terms().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500");
}

/// Serve a single response whose body is cut short of its declared length
async fn truncated_body_server(status_line: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 2048];
        let _ = socket.read(&mut request).await;

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{{\"error\": \"Unbal",
            status_line
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_unreadable_error_body_falls_back_to_status() {
    let base = truncated_body_server("500 Internal Server Error").await;
    let index = HttpStudyIndex::new(&base).unwrap();

    let err = index.fetch_studies("memory").await.unwrap_err();
    assert_eq!(err, IndexError::status(500, None));
    assert_eq!(err.to_string(), "HTTP 500");
}

#[tokio::test]
async fn test_malformed_success_body_is_parse_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/terms")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let index = HttpStudyIndex::new(&server.url()).unwrap();
    assert!(matches!(
        index.fetch_terms().await,
        Err(IndexError::Parse(_))
    ));
}

#[tokio::test]
async fn test_session_end_to_end() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/terms")
        .with_status(200)
        .with_body(r#"{"terms": ["memory", "recall", "memory"]}"#)
        .create_async()
        .await;
    server
        .mock("GET", Matcher::Regex(r"^/query/.+/studies$".to_string()))
        .with_status(200)
        .with_body(studies_body(45))
        .create_async()
        .await;

    let index = Arc::new(HttpStudyIndex::new(&server.url()).unwrap());
    let mut session = Session::new(index);

    assert_eq!(session.mount().await.unwrap(), CatalogState::Ready);
    assert_eq!(session.catalog().terms(), vec!["memory", "recall"]);

    session.pick_term("memory").unwrap().outcome().await;
    session.append(Operator::And).unwrap().outcome().await;
    let outcome = session.pick_term("recall").unwrap().outcome().await;

    assert_eq!(outcome, FetchOutcome::Committed { count: 45 });
    assert_eq!(session.query(), "memory AND recall");

    let view = session.studies();
    assert_eq!(view.status, FetchStatus::Loaded);
    assert_eq!(view.total, 45);
    assert_eq!(view.total_pages, 3);
    assert_eq!(view.records.len(), 20);

    assert_eq!(session.set_page(3), 3);
    assert_eq!(session.studies().records.len(), 5);
    assert_eq!(session.next_page(), 3);
    assert_eq!(session.set_page(0), 1);
}

#[tokio::test]
async fn test_session_surfaces_fetch_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Regex(r"^/query/.+/studies$".to_string()))
        .with_status(503)
        .create_async()
        .await;

    let index = Arc::new(HttpStudyIndex::new(&server.url()).unwrap());
    let mut session = Session::new(index);

    let outcome = session.set_full_text("fear").unwrap().outcome().await;
    assert_eq!(outcome, FetchOutcome::Failed);

    let view = session.studies();
    assert_eq!(view.error(), Some("Failed to fetch studies: HTTP 503"));
    assert!(view.records.is_empty());
}

#[tokio::test]
async fn test_session_catalog_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/terms")
        .with_status(404)
        .with_body(r#"{"error": "no vocabulary"}"#)
        .create_async()
        .await;

    let index = Arc::new(HttpStudyIndex::new(&server.url()).unwrap());
    let session = Session::new(index);

    assert_eq!(
        session.mount().await.unwrap(),
        CatalogState::Errored("Failed to fetch terms: no vocabulary".to_string())
    );
    assert!(session.catalog().is_empty());
}
