//! Integration tests for cached reads and coalesced definition fetches.

mod common;

use std::time::Duration;

use common::Harness;
use fabric_test::{
    MockArtifactManager, semantic_model_definition, test_artifact, test_artifact_with,
    test_definition,
};
use fabric_vfs::{FileSystemProvider, FileType};
use futures::future::join_all;

#[tokio::test]
async fn test_concurrent_reads_share_one_fetch() {
    let files: Vec<(String, String)> = (0..5)
        .map(|i| (format!("part-{i}.json"), format!("{{\"i\": {i}}}")))
        .collect();
    let pairs: Vec<(&str, &str)> = files.iter().map(|(p, t)| (p.as_str(), t.as_str())).collect();

    let api = MockArtifactManager::new()
        .with_definition(&test_artifact(), test_definition(&pairs))
        .with_latency(Duration::from_millis(50));
    let h = Harness::new(api);

    let uris: Vec<_> = files
        .iter()
        .map(|(p, _)| h.uri(p))
        .chain(std::iter::once(h.uri("absent.json")))
        .collect();
    let results = join_all(uris.iter().map(|uri| h.fs.read_file(uri))).await;

    assert_eq!(h.api.get_calls(), 1);
    for ((_, text), result) in files.iter().zip(&results) {
        assert_eq!(result.as_ref().unwrap(), text.as_bytes());
    }
    assert!(results.last().unwrap().as_ref().unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_existing_and_missing_file_on_uncached_artifact() {
    let api = MockArtifactManager::new()
        .with_definition(&test_artifact(), test_definition(&[("file1.json", "{}")]))
        .with_latency(Duration::from_millis(20));
    let h = Harness::new(api);

    let file1 = h.uri("file1.json");
    let missing = h.uri("missing.json");
    let (found, absent) = tokio::join!(h.fs.read_file(&file1), h.fs.read_file(&missing));

    assert_eq!(found.unwrap(), b"{}");
    assert!(absent.unwrap_err().is_not_found());
    assert_eq!(h.api.get_calls(), 1);
}

#[tokio::test]
async fn test_registered_item_served_without_fetch() {
    let h = Harness::new(MockArtifactManager::new());
    h.fs.register_item(
        &test_artifact(),
        test_definition(&[("model.tmdl", "model"), ("tables/Sales.tmdl", "table Sales")]),
    );

    let root = h.fs.read_directory(&h.uri("")).await.unwrap();
    assert_eq!(
        root,
        vec![
            ("model.tmdl".to_owned(), FileType::File),
            ("tables".to_owned(), FileType::Directory),
        ]
    );

    let tables = h.fs.stat(&h.uri("tables")).await.unwrap();
    assert!(tables.is_directory());
    assert_eq!(tables.size, 0);

    let sales = h.fs.read_file(&h.uri("tables/Sales.tmdl")).await.unwrap();
    assert_eq!(sales, b"table Sales");
    assert_eq!(h.api.get_calls(), 0);
}

#[tokio::test]
async fn test_stat_fetches_uncached_file() {
    let api = MockArtifactManager::new()
        .with_definition(&test_artifact(), test_definition(&[("a.json", "12345")]));
    let h = Harness::new(api);

    let stat = h.fs.stat(&h.uri("a.json")).await.unwrap();
    assert!(stat.is_file());
    assert_eq!(stat.size, 5);
    assert!(stat.mtime > 0);

    // Now cached: no second fetch.
    h.fs.stat(&h.uri("a.json")).await.unwrap();
    h.fs.read_file(&h.uri("a.json")).await.unwrap();
    assert_eq!(h.api.get_calls(), 1);
}

#[tokio::test]
async fn test_stat_uncached_root_is_not_found() {
    let api = MockArtifactManager::new()
        .with_definition(&test_artifact(), test_definition(&[("a.json", "{}")]));
    let h = Harness::new(api);

    assert!(h.fs.stat(&h.uri("")).await.unwrap_err().is_not_found());
    assert_eq!(h.api.get_calls(), 0);
}

#[tokio::test]
async fn test_fetch_failure_is_not_found_and_retryable() {
    let api = MockArtifactManager::new()
        .with_definition(&test_artifact(), test_definition(&[("a.json", "{}")]))
        .failing_gets();
    let h = Harness::new(api);

    let err = h.fs.read_file(&h.uri("a.json")).await.unwrap_err();
    assert!(err.is_not_found());

    h.api.set_fail_get(false);
    assert_eq!(h.fs.read_file(&h.uri("a.json")).await.unwrap(), b"{}");
    assert_eq!(h.api.get_calls(), 2);
}

#[tokio::test]
async fn test_missing_response_body_is_not_found() {
    let h = Harness::new(MockArtifactManager::new());
    assert!(h.fs.read_file(&h.uri("a.json")).await.unwrap_err().is_not_found());
    assert_eq!(h.api.get_calls(), 1);
}

#[tokio::test]
async fn test_read_directory_never_fetches() {
    let api = MockArtifactManager::new()
        .with_definition(&test_artifact(), semantic_model_definition());
    let h = Harness::new(api);

    assert!(h.fs.read_directory(&h.uri("")).await.unwrap_err().is_not_found());
    assert_eq!(h.api.get_calls(), 0);

    // A file read loads the whole definition, after which listing works.
    h.fs.read_file(&h.uri("model.tmdl")).await.unwrap();
    let root = h.fs.read_directory(&h.uri("")).await.unwrap();
    let names: Vec<&str> = root.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["model.tmdl", "tables", "definition.pbism", ".platform"]);
}

#[tokio::test]
async fn test_distinct_artifacts_fetch_independently() {
    let other = test_artifact_with("ws-1", "artifact-2");
    let api = MockArtifactManager::new()
        .with_definition(&test_artifact(), test_definition(&[("a.json", "1")]))
        .with_definition(&other, test_definition(&[("b.json", "2")]))
        .with_latency(Duration::from_millis(10));
    let h = Harness::new(api);

    let a = h.uri("a.json");
    let b = h.fs.uri(&other, "b.json").unwrap();
    let (ra, rb) = tokio::join!(h.fs.read_file(&a), h.fs.read_file(&b));

    assert_eq!(ra.unwrap(), b"1");
    assert_eq!(rb.unwrap(), b"2");
    assert_eq!(h.api.get_calls(), 2);
}

#[tokio::test]
async fn test_unparseable_uri_is_not_found() {
    let h = Harness::new(MockArtifactManager::new());
    let uri = url::Url::parse("fabric-definition:///only-workspace").unwrap();
    assert!(h.fs.read_file(&uri).await.unwrap_err().is_not_found());
    assert!(h.fs.stat(&uri).await.unwrap_err().is_not_found());
    assert_eq!(h.api.get_calls(), 0);
}
