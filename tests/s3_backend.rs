//! S3-compatible backend against a mock HTTP server.

use std::sync::Arc;

use wikidocs::core::object_store::{ObjectStore, RemoteObjectStore};
use wikidocs::{KeyLayout, S3Client, StoreError, WikiStore};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing(keys: &[(&str, &str)], next: Option<&str>) -> String {
    let contents: String = keys
        .iter()
        .map(|(key, modified)| {
            format!(
                "<Contents><Key>{key}</Key><LastModified>{modified}</LastModified><Size>10</Size></Contents>"
            )
        })
        .collect();
    let truncation = match next {
        Some(token) => format!(
            "<IsTruncated>true</IsTruncated><NextContinuationToken>{token}</NextContinuationToken>"
        ),
        None => "<IsTruncated>false</IsTruncated>".to_string(),
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><ListBucketResult><Name>docs</Name>{contents}{truncation}</ListBucketResult>"#
    )
}

fn store(server: &MockServer) -> RemoteObjectStore {
    let client = S3Client::new(&server.uri(), "docs", None, 5).unwrap();
    RemoteObjectStore::new(client)
}

#[tokio::test]
async fn test_list_follows_continuation_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .and(query_param("list-type", "2"))
        .and(query_param("prefix", "base/kb/docs/"))
        .and(query_param_is_missing("continuation-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(
            &[
                ("base/kb/docs/s1/a.md", "2024-01-01T00:00:00.000Z"),
                ("base/kb/docs/s1/b.md", "2024-01-01T00:00:00.000Z"),
            ],
            Some("page-2"),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .and(query_param("continuation-token", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(
            &[("base/kb/docs/s2/a.md", "2024-02-01T00:00:00.000Z")],
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let objects = store(&server).list_all("base/kb/docs/").await.unwrap();
    let keys: Vec<_> = objects.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(
        keys,
        vec!["base/kb/docs/s1/a.md", "base/kb/docs/s1/b.md", "base/kb/docs/s2/a.md"]
    );
    assert!(objects[2].last_modified.is_some());
}

#[tokio::test]
async fn test_truncated_listing_without_token_is_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<ListBucketResult><IsTruncated>true</IsTruncated></ListBucketResult>",
        ))
        .mount(&server)
        .await;

    let err = store(&server).list_all("base/").await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidListing(_)));
}

#[tokio::test]
async fn test_listing_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = store(&server).list_all("base/").await.unwrap_err();
    assert!(matches!(err, StoreError::Http { status: 500, .. }));
}

#[tokio::test]
async fn test_get_object_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs/base/kb/docs/s1/index.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Home"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/base/kb/docs/s1/private.md"))
        .respond_with(ResponseTemplate::new(403).set_body_string(
            "<Error><Code>NoSuchKey</Code><Message>gone</Message></Error>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/base/kb/docs/s1/denied.md"))
        .respond_with(ResponseTemplate::new(403).set_body_string(
            "<Error><Code>AccessDenied</Code></Error>",
        ))
        .mount(&server)
        .await;

    let store = store(&server);
    assert_eq!(store.get("base/kb/docs/s1/index.md").await.unwrap(), b"# Home");
    assert!(store.get("base/kb/docs/s1/missing.md").await.unwrap_err().is_not_found());
    assert!(store.get("base/kb/docs/s1/private.md").await.unwrap_err().is_not_found());
    assert!(matches!(
        store.get("base/kb/docs/s1/denied.md").await.unwrap_err(),
        StoreError::Http { status: 403, .. }
    ));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs/k.md"))
        .and(wiremock::matchers::header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = S3Client::new(&server.uri(), "docs", Some("secret".into()), 5).unwrap();
    let store = RemoteObjectStore::new(client);
    assert_eq!(store.get("k.md").await.unwrap(), b"ok");
}

#[tokio::test]
async fn test_wiki_store_over_s3() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .and(query_param("prefix", "base/kb/docs/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(
            &[
                ("base/kb/docs/s2/index.md", "2024-02-01T00:00:00Z"),
                ("base/kb/docs/s1/index.md", "2024-01-01T00:00:00Z"),
            ],
            None,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs"))
        .and(query_param("prefix", "base/kb/docs/s2/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(
            &[
                ("base/kb/docs/s2/index.md", "2024-02-01T00:00:00Z"),
                ("base/kb/docs/s2/repo-docs/README.md", "2024-02-01T00:00:00Z"),
            ],
            None,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/base/kb/docs/s2/repo-docs/README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Readme\nretry timeout"))
        .mount(&server)
        .await;

    let wiki = WikiStore::new(Arc::new(store(&server)), KeyLayout::default());

    assert_eq!(wiki.list_versions("kb").await.unwrap(), vec!["s1", "s2"]);
    assert_eq!(wiki.resolve_version("kb", None).await.unwrap().as_deref(), Some("s2"));

    let listing = wiki.list_documents_ordered("kb", "s2").await.unwrap();
    assert_eq!(listing.paths, vec!["index.md", "README.md"]);
    assert!(listing.manifest.is_none());
    assert!(listing.metadata.is_empty());

    let readme = wiki.get_document("kb", "s2", "README.md").await;
    assert_eq!(readme.as_deref(), Some("# Readme\nretry timeout"));

    let hits = wiki.search("kb", "s2", "TIMEOUT").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "README.md");
    assert_eq!(hits[0].line, 2);
}
