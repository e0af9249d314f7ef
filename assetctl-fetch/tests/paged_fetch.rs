//! End-to-end paged fetches against a mock platform.

use std::time::Duration;

use assetctl_core::{ApiError, ProgressEvent, StreamItem};
use assetctl_fetch::operations::{self, SearchRequest};
use assetctl_fetch::queue::channel;
use assetctl_fetch::{FetchContext, PagedFetch, PlatformClient, RetryExecutor, RetryPolicy};
use futures::StreamExt;
use serde_json::{Value, json};
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

const GENEROUS: Duration = Duration::from_secs(10);

fn hits(page: u32, next: Option<&str>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "result": {
            "hits": [{"page": page, "n": 1}, {"page": page, "n": 2}],
            "next_page_token": next
        }
    }))
}

/// Three search pages chained by `p2` and `p3` tokens.
async fn three_page_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(matchers::method("POST"))
        .and(matchers::body_partial_json(json!({"page_token": "p2"})))
        .respond_with(hits(2, Some("p3")))
        .with_priority(2)
        .mount(&server)
        .await;

    Mock::given(matchers::method("POST"))
        .and(matchers::body_partial_json(json!({"page_token": "p3"})))
        .respond_with(hits(3, None))
        .with_priority(2)
        .mount(&server)
        .await;

    Mock::given(matchers::method("POST"))
        .respond_with(hits(1, Some("p2")))
        .mount(&server)
        .await;

    server
}

fn client(server: &MockServer) -> PlatformClient {
    PlatformClient::new(&server.uri(), None, Duration::from_secs(5)).unwrap()
}

fn fast_retries(max_attempts: u32) -> RetryExecutor {
    RetryExecutor::new(
        RetryPolicy::new(max_attempts)
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5)),
    )
}

#[tokio::test]
async fn test_search_with_retry_and_progress() {
    let server = three_page_server().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::body_partial_json(json!({"page_token": "p2"})))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let ctx = FetchContext::new();
    let executor = fast_retries(3);
    let (progress, rx) = channel::<ProgressEvent>(1);
    let consumer = tokio::spawn(rx.drain());

    let fetch = PagedFetch::new(&ctx, &executor)
        .with_progress(Some(&progress))
        .with_label("search page");
    let result = tokio::time::timeout(
        GENEROUS,
        operations::search(&fetch, &client, &SearchRequest::new("services.port: 22")),
    )
    .await
    .expect("fetch should finish")
    .unwrap();
    progress.close(result.partial_error.clone());

    assert_eq!(result.len(), 6);
    assert_eq!(result.items[5]["page"], 3);
    assert_eq!(result.meta.page_count, 3);
    assert_eq!(result.meta.attempts, 5);
    assert!(!result.is_partial());

    let events = consumer.await.unwrap();
    let fetching: Vec<_> = events
        .iter()
        .filter(|event| event.message.starts_with("Fetching"))
        .collect();
    assert_eq!(fetching.len(), 3);
    assert!(events.last().unwrap().done);
}

#[tokio::test]
async fn test_later_failure_keeps_first_page() {
    let server = three_page_server().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::body_partial_json(json!({"page_token": "p2"})))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad cursor"))
        .with_priority(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let ctx = FetchContext::new();
    let executor = fast_retries(3);
    let fetch = PagedFetch::new(&ctx, &executor);

    let result = operations::search(&fetch, &client, &SearchRequest::new("x"))
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.meta.page_count, 1);
    // One attempt per page: 400 is not retried.
    assert_eq!(result.meta.attempts, 2);
    let err = result.partial_error.unwrap();
    assert_eq!(err.status_code(), Some(400));
    assert!(matches!(err, ApiError::Generic { .. }));
}

#[tokio::test]
async fn test_first_page_failure_is_hard_error() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    let ctx = FetchContext::new();
    let executor = fast_retries(2);
    let fetch = PagedFetch::new(&ctx, &executor);

    let err = operations::search(&fetch, &client, &SearchRequest::new("x"))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(500));
}

#[tokio::test]
async fn test_streamed_search_delivers_every_hit() {
    let server = three_page_server().await;
    let client = client(&server);
    let ctx = FetchContext::new();
    let executor = RetryExecutor::default();
    let (stream, rx) = channel::<StreamItem<Value>>(1);
    let consumer = tokio::spawn(rx.into_stream().collect::<Vec<_>>());

    let fetch = PagedFetch::new(&ctx, &executor).with_stream(Some(&stream));
    let result = operations::search(&fetch, &client, &SearchRequest::new("x"))
        .await
        .unwrap();
    stream.close(result.partial_error.clone());

    assert!(result.items.is_empty());
    let streamed = tokio::time::timeout(GENEROUS, consumer)
        .await
        .unwrap()
        .unwrap();
    let data: Vec<_> = streamed.iter().filter_map(|item| item.data.clone()).collect();
    assert_eq!(data.len(), 6);
}
