//! Integration tests for writes, deletes and the edit permission gate.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{Harness, drain};
use fabric_core::{Base64Encoder, StandardBase64Encoder};
use fabric_test::{
    MockArtifactManager, MockFeatureFlags, semantic_model_definition, test_artifact,
    test_definition,
};
use fabric_vfs::{
    DefinitionFileSystem, DefinitionFsOptions, DeleteOptions, FileChangeType, FileSystemProvider,
    FsError, SettingsFeatureFlags, WriteOptions,
};
use url::Url;

fn decoded(payload: &str) -> String {
    StandardBase64Encoder.decode_text(payload).unwrap()
}

fn overwrite_only() -> WriteOptions {
    WriteOptions {
        create: false,
        overwrite: true,
    }
}

fn loaded(api: MockArtifactManager) -> Harness {
    let h = Harness::new(api);
    h.fs.register_item(&test_artifact(), semantic_model_definition());
    h
}

#[tokio::test]
async fn test_identical_writes_each_push_and_notify() {
    let h = loaded(MockArtifactManager::new());
    let mut rx = h.fs.subscribe();
    let uri = h.uri("model.tmdl");

    h.fs.write_file(&uri, b"model Same", overwrite_only()).await.unwrap();
    h.fs.write_file(&uri, b"model Same", overwrite_only()).await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.change_type == FileChangeType::Changed && e.uri == uri));
    assert_eq!(h.api.update_calls(), 2);

    let update = h.api.last_update().unwrap();
    assert_eq!(update.folder, Path::new(""));
    assert_eq!(update.artifact, test_artifact());
    let part = update.definition.part("model.tmdl").unwrap();
    assert_eq!(decoded(&part.payload), "model Same");
    // Replaced in place, platform metadata still pushed.
    assert_eq!(update.definition.parts.first().unwrap().path, "model.tmdl");
    assert!(update.definition.part(".platform").is_some());
}

#[tokio::test]
async fn test_create_appends_part_and_notifies() {
    let h = loaded(MockArtifactManager::new());
    let mut rx = h.fs.subscribe();
    let uri = h.uri("tables/Costs.tmdl");

    h.fs.write_file(&uri, b"table Costs", WriteOptions::upsert()).await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].change_type, FileChangeType::Created);
    assert_eq!(h.fs.read_cached(&uri), Some(b"table Costs".to_vec()));

    let cached = h
        .fs
        .get_cached_item_definition(&test_artifact().workspace_id, &test_artifact().id)
        .unwrap();
    assert_eq!(cached.parts.last().unwrap().path, "tables/Costs.tmdl");
    assert_eq!(cached.parts.len(), 5);
    assert_eq!(h.api.stored_definition(&test_artifact().key()), Some(cached));
}

#[tokio::test]
async fn test_existence_checks_precede_permission_gate() {
    let flags = MockFeatureFlags::disabled();
    let h = Harness::with_flags(MockArtifactManager::new(), flags);
    h.fs.register_item(&test_artifact(), semantic_model_definition());
    let existing = h.uri("model.tmdl");

    let no_overwrite = WriteOptions {
        create: true,
        overwrite: false,
    };
    let err = h.fs.write_file(&existing, b"x", no_overwrite).await.unwrap_err();
    assert!(err.is_file_exists());

    let err = h.fs.write_file(&existing, b"x", WriteOptions::upsert()).await.unwrap_err();
    assert!(err.is_no_permissions());
    assert!(err.to_string().contains("definitions.edit_enabled"));

    let err = h
        .fs
        .write_file(&h.uri("new.json"), b"x", overwrite_only())
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(h.api.update_calls(), 0);
    assert_eq!(h.api.get_calls(), 0);
}

#[tokio::test]
async fn test_flag_polled_on_every_mutation() {
    let flags = MockFeatureFlags::disabled();
    let h = Harness::with_flags(MockArtifactManager::new(), flags.clone());
    h.fs.register_item(&test_artifact(), semantic_model_definition());
    let uri = h.uri("model.tmdl");

    assert!(h.fs.write_file(&uri, b"a", overwrite_only()).await.is_err());
    flags.set_enabled(true);
    assert!(h.fs.write_file(&uri, b"b", overwrite_only()).await.is_ok());
    flags.set_enabled(false);
    assert!(h.fs.delete(&uri, DeleteOptions::default()).await.unwrap_err().is_no_permissions());

    assert_eq!(flags.polls(), 3);
    assert_eq!(h.api.update_calls(), 1);
}

#[tokio::test]
async fn test_settings_flags_toggle_at_runtime() {
    let api = MockArtifactManager::new();
    let flags = SettingsFeatureFlags::new(false);
    let fs = DefinitionFileSystem::new(
        Arc::new(api.clone()),
        Arc::new(StandardBase64Encoder),
        Arc::new(flags.clone()),
    );
    fs.register_item(&test_artifact(), semantic_model_definition());
    let uri = fs.uri(&test_artifact(), "model.tmdl").unwrap();

    assert!(fs.write_file(&uri, b"m", overwrite_only()).await.unwrap_err().is_no_permissions());
    flags.set_edit_item_definitions(true);
    fs.write_file(&uri, b"m", overwrite_only()).await.unwrap();
    assert_eq!(api.update_calls(), 1);
}

#[tokio::test]
async fn test_write_without_owner_is_not_found() {
    let api = MockArtifactManager::new()
        .with_definition(&test_artifact(), semantic_model_definition());
    let h = Harness::new(api);

    let err = h
        .fs
        .write_file(&h.uri("new.json"), b"{}", WriteOptions::upsert())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(h.api.get_calls(), 0);
}

#[tokio::test]
async fn test_write_fetches_definition_when_only_file_registered() {
    let api = MockArtifactManager::new()
        .with_definition(&test_artifact(), semantic_model_definition());
    let h = Harness::new(api);
    h.fs.register_file(&test_artifact(), "model.tmdl", b"model Model".to_vec());

    h.fs.write_file(&h.uri("model.tmdl"), b"model Edited", overwrite_only())
        .await
        .unwrap();

    assert_eq!(h.api.get_calls(), 1);
    let update = h.api.last_update().unwrap();
    assert_eq!(update.definition.parts.len(), 4);
    assert_eq!(decoded(&update.definition.part("model.tmdl").unwrap().payload), "model Edited");
    // Sibling parts from the fetched definition are now readable from cache.
    assert!(h.fs.read_cached(&h.uri("tables/Sales.tmdl")).is_some());
}

#[tokio::test]
async fn test_write_surfaces_remote_fetch_error() {
    let api = MockArtifactManager::new().failing_gets();
    let h = Harness::new(api);
    h.fs.register_file(&test_artifact(), "model.tmdl", b"model".to_vec());

    let err = h
        .fs
        .write_file(&h.uri("model.tmdl"), b"x", overwrite_only())
        .await
        .unwrap_err();
    assert!(matches!(err, FsError::Remote(_)));
}

#[tokio::test]
async fn test_recursive_delete_removes_every_part_under_directory() {
    let definition = test_definition(&[
        ("model.tmdl", "m"),
        ("tables/a.tmdl", "a"),
        ("tables/b.tmdl", "b"),
        ("tables/nested/c.tmdl", "c"),
        ("tablesque.tmdl", "not under tables/"),
    ]);
    let h = Harness::new(MockArtifactManager::new());
    h.fs.register_item(&test_artifact(), definition);
    let mut rx = h.fs.subscribe();

    h.fs.delete(&h.uri("tables"), DeleteOptions { recursive: true })
        .await
        .unwrap();

    let events = drain(&mut rx);
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.change_type == FileChangeType::Deleted));
    assert!(events.iter().any(|e| e.uri == h.uri("tables/nested/c.tmdl")));

    let remaining = h.api.last_update().unwrap().definition;
    let paths: Vec<&str> = remaining.paths().collect();
    assert_eq!(paths, vec!["model.tmdl", "tablesque.tmdl"]);
    assert!(h.fs.read_cached(&h.uri("tables/a.tmdl")).is_none());
    assert!(!h.fs.stat_cached(&h.uri("tables")).is_some_and(|s| s.is_directory()));
}

#[tokio::test]
async fn test_delete_single_file() {
    let h = loaded(MockArtifactManager::new());
    let mut rx = h.fs.subscribe();
    let uri = h.uri("definition.pbism");

    h.fs.delete(&uri, DeleteOptions::default()).await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].uri, uri);
    assert!(h.fs.read_cached(&uri).is_none());
    assert!(h.api.last_update().unwrap().definition.part("definition.pbism").is_none());
}

#[tokio::test]
async fn test_directory_delete_rules() {
    let h = loaded(MockArtifactManager::new());

    let err = h
        .fs
        .delete(&h.uri("tables"), DeleteOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_no_permissions());

    let err = h
        .fs
        .delete(&h.uri("missing"), DeleteOptions { recursive: true })
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = h.fs.delete(&h.uri(""), DeleteOptions { recursive: true }).await.unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(h.api.update_calls(), 0);
}

#[tokio::test]
async fn test_failed_update_keeps_cache_by_default() {
    let h = loaded(MockArtifactManager::new().failing_updates());
    let mut rx = h.fs.subscribe();
    let uri = h.uri("model.tmdl");

    let err = h.fs.write_file(&uri, b"model Unsaved", overwrite_only()).await.unwrap_err();
    assert!(matches!(err, FsError::Remote(_)));

    assert_eq!(h.fs.read_cached(&uri), Some(b"model Unsaved".to_vec()));
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_rollback_mode_restores_cache_after_failed_write() {
    let options = DefinitionFsOptions {
        rollback_on_failure: true,
        ..DefinitionFsOptions::default()
    };
    let h = Harness::with_options(
        MockArtifactManager::new().failing_updates(),
        MockFeatureFlags::enabled(),
        options,
    );
    h.fs.register_item(&test_artifact(), semantic_model_definition());
    let before = h
        .fs
        .get_cached_item_definition(&test_artifact().workspace_id, &test_artifact().id)
        .unwrap();

    let existing = h.uri("model.tmdl");
    let created = h.uri("new.json");
    assert!(h.fs.write_file(&existing, b"edited", overwrite_only()).await.is_err());
    assert!(h.fs.write_file(&created, b"{}", WriteOptions::upsert()).await.is_err());

    let after = h
        .fs
        .get_cached_item_definition(&test_artifact().workspace_id, &test_artifact().id)
        .unwrap();
    assert_eq!(after, before);
    assert_eq!(
        h.fs.read_cached(&existing),
        Some(b"model Model\n\tculture: en-US\n".to_vec())
    );
    assert!(h.fs.read_cached(&created).is_none());
}

#[tokio::test]
async fn test_rollback_mode_restores_cache_after_failed_delete() {
    let options = DefinitionFsOptions {
        rollback_on_failure: true,
        ..DefinitionFsOptions::default()
    };
    let h = Harness::with_options(
        MockArtifactManager::new().failing_updates(),
        MockFeatureFlags::enabled(),
        options,
    );
    h.fs.register_item(&test_artifact(), semantic_model_definition());

    let err = h
        .fs
        .delete(&h.uri("tables"), DeleteOptions { recursive: true })
        .await
        .unwrap_err();
    assert!(matches!(err, FsError::Remote(_)));

    assert!(h.fs.read_cached(&h.uri("tables/Sales.tmdl")).is_some());
    assert!(h.fs.stat_cached(&h.uri("tables")).unwrap().is_directory());
}

#[tokio::test]
async fn test_concurrent_writes_to_one_artifact_both_land_in_cache() {
    let h = loaded(MockArtifactManager::new());
    let a = h.uri("a.json");
    let b = h.uri("b.json");

    let (ra, rb) = tokio::join!(
        h.fs.write_file(&a, b"{\"a\": 1}", WriteOptions::upsert()),
        h.fs.write_file(&b, b"{\"b\": 1}", WriteOptions::upsert()),
    );
    ra.unwrap();
    rb.unwrap();

    let cached = h
        .fs
        .get_cached_item_definition(&test_artifact().workspace_id, &test_artifact().id)
        .unwrap();
    assert!(cached.part("a.json").is_some());
    assert!(cached.part("b.json").is_some());
    assert_eq!(h.api.update_calls(), 2);
}

#[tokio::test]
async fn test_encoded_traversal_never_becomes_a_part() {
    let h = loaded(MockArtifactManager::new());
    let mut rx = h.fs.subscribe();

    for raw in [
        "fabric-definition:///ws-1/artifact-1/%2E%2E%2Fescape.json",
        "fabric-definition:///ws-1/artifact-1/%2Fabs.json",
        "fabric-definition:///ws-1/artifact-1/tables%2F..%2F..%2Fx.json",
    ] {
        let uri = Url::parse(raw).unwrap();
        let err = h
            .fs
            .write_file(&uri, b"{}", WriteOptions::upsert())
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::InvalidPartPath(_)), "{raw}: {err}");
        assert!(h.fs.create_directory(&uri).await.is_err());
    }

    assert_eq!(h.api.update_calls(), 0);
    assert!(drain(&mut rx).is_empty());
    let cached = h
        .fs
        .get_cached_item_definition(&test_artifact().workspace_id, &test_artifact().id)
        .unwrap();
    assert_eq!(cached, semantic_model_definition());
}

#[tokio::test]
async fn test_single_file_delete_echoes_caller_uri() {
    let h = loaded(MockArtifactManager::new());
    let mut rx = h.fs.subscribe();
    let uri = Url::parse("fabric-definition:///ws-1/artifact-1/definition%2Epbism").unwrap();

    h.fs.delete(&uri, DeleteOptions::default()).await.unwrap();

    let events = drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].uri, uri);
    assert!(h.fs.read_cached(&h.uri("definition.pbism")).is_none());
}

#[test]
fn test_payloads_use_standard_base64() {
    assert_eq!(StandardBase64Encoder.encode(b"{}"), "e30=");
}
