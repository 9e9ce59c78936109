//! HTTP bundle source tests against a local mock server

use std::time::Duration;

use stevedore_repo::{BundleSource, HttpBundleSource, RepoError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUNDLE: &str = "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n";

#[tokio::test]
async fn test_fetch_returns_full_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/install.yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BUNDLE))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpBundleSource::new(Duration::from_secs(15)).unwrap();
    let body = source
        .fetch(&format!("{}/install.yaml", server.uri()))
        .await
        .unwrap();

    assert_eq!(body, BUNDLE.as_bytes());
}

#[tokio::test]
async fn test_fetch_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.yaml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let source = HttpBundleSource::new(Duration::from_secs(15)).unwrap();
    let err = source
        .fetch(&format!("{}/missing.yaml", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, RepoError::HttpError { status: 404, .. }));
}

#[tokio::test]
async fn test_fetch_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = HttpBundleSource::new(Duration::from_secs(15)).unwrap();
    let err = source.fetch(&server.uri()).await.unwrap_err();

    assert!(matches!(err, RepoError::HttpError { status: 503, .. }));
}

#[tokio::test]
async fn test_fetch_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(BUNDLE)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let source = HttpBundleSource::new(Duration::from_millis(200)).unwrap();
    let err = source
        .fetch(&format!("{}/slow.yaml", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Timeout { timeout, .. } if timeout == Duration::from_millis(200)
    ));
    assert!(err.to_string().ends_with("timed out after 200ms"));
}

#[tokio::test]
async fn test_fetch_empty_url_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let source = HttpBundleSource::new(Duration::from_secs(15)).unwrap();
    let err = source.fetch("").await.unwrap_err();

    assert!(matches!(err, RepoError::EmptyUrl));
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    // Port 9 (discard) is not expected to be listening on test hosts
    let source = HttpBundleSource::new(Duration::from_secs(2)).unwrap();
    let err = source
        .fetch("http://127.0.0.1:9/install.yaml")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::NetworkError { .. } | RepoError::Timeout { .. }
    ));
}
