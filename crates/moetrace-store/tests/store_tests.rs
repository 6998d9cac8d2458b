use chrono::{Duration, Utc};
use moetrace_engine::SessionRecorder;
use moetrace_store::{Error, FsSessionStore, Scope, SessionStore};
use moetrace_types::{Phase, RoutingEvent, SavedSession, SessionMetadata};
use tempfile::TempDir;

fn saved_session(offset_minutes: i64, prompt: &str) -> SavedSession {
    let mut recorder = SessionRecorder::new(4, 2, SessionMetadata::default());
    recorder
        .log_routing_decision(RoutingEvent {
            token_index: 0,
            layer_index: 0,
            phase: Phase::Prefill,
            gate_logits: vec![0.1, 0.2, 0.3, 0.4],
            selected_experts: vec![3, 2],
            expert_weights: vec![0.5, 0.5],
            input_token: Some("hi".to_string()),
        })
        .unwrap();
    let mut saved = recorder.finish(Some(prompt.to_string()), None);

    let start = Utc::now() + Duration::minutes(offset_minutes);
    saved.start_time = start;
    saved.session.start_time = start;
    saved
}

#[test]
fn put_then_get_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = FsSessionStore::new(dir.path());

    let session = saved_session(0, "hello world");
    let id = store.put(&Scope::Shared, &session).unwrap();
    assert!(id.starts_with("routing_"));

    let loaded = store.get(&Scope::Shared, &id).unwrap();
    assert_eq!(loaded, session);
}

#[test]
fn list_returns_most_recent_first_up_to_limit() {
    let dir = TempDir::new().unwrap();
    let store = FsSessionStore::new(dir.path());

    let mut ids = Vec::new();
    for i in 0..5 {
        let session = saved_session(i, &format!("prompt {}", i));
        ids.push(store.put(&Scope::Shared, &session).unwrap());
    }

    let listed = store.list(&Scope::Shared, 2).unwrap();
    assert_eq!(listed.len(), 2);
    // Offsets 4 and 3 have the latest start times.
    assert_eq!(listed[0].id, ids[4]);
    assert_eq!(listed[1].id, ids[3]);
    assert_eq!(listed[0].prompt_preview.as_deref(), Some("prompt 4"));
}

#[test]
fn same_second_saves_get_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let store = FsSessionStore::new(dir.path());

    let session = saved_session(0, "twin");
    let a = store.put(&Scope::Shared, &session).unwrap();
    let b = store.put(&Scope::Shared, &session).unwrap();

    assert_ne!(a, b);
    assert_eq!(store.list(&Scope::Shared, 10).unwrap().len(), 2);
}

#[test]
fn scopes_partition_sessions() {
    let dir = TempDir::new().unwrap();
    let store = FsSessionStore::new(dir.path());
    let agent = Scope::Agent("helper".to_string());

    let id = store.put(&agent, &saved_session(0, "scoped")).unwrap();

    assert!(store.list(&Scope::Shared, 10).unwrap().is_empty());
    assert!(matches!(
        store.get(&Scope::Shared, &id),
        Err(Error::NotFound(_))
    ));
    assert!(store.get(&agent, &id).is_ok());
}

#[test]
fn missing_artifact_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = FsSessionStore::new(dir.path());

    match store.get(&Scope::Shared, "routing_nope") {
        Err(Error::NotFound(id)) => assert_eq!(id, "routing_nope"),
        other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn corrupt_artifact_fails_get_but_not_list() {
    let dir = TempDir::new().unwrap();
    let store = FsSessionStore::new(dir.path());

    let id = store.put(&Scope::Shared, &saved_session(0, "fine")).unwrap();
    let corrupt_path = dir.path().join("shared").join("routing_garbage.json");
    std::fs::write(&corrupt_path, "{ not json").unwrap();

    match store.get(&Scope::Shared, "routing_garbage") {
        Err(Error::CorruptSnapshot { id, .. }) => assert_eq!(id, "routing_garbage"),
        other => panic!("expected CorruptSnapshot, got {:?}", other.map(|_| ())),
    }

    // The intact artifact still lists; the corrupt one is skipped.
    let listed = store.list(&Scope::Shared, 10).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}

#[test]
fn list_ids_sees_corrupt_artifacts() {
    let dir = TempDir::new().unwrap();
    let store = FsSessionStore::new(dir.path());

    store.put(&Scope::Shared, &saved_session(0, "fine")).unwrap();
    std::fs::write(dir.path().join("shared").join("zzz_broken.json"), "nope").unwrap();

    let ids = store.list_ids(&Scope::Shared).unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[0], "zzz_broken");
}

#[test]
fn put_leaves_no_temp_files_behind() {
    let dir = TempDir::new().unwrap();
    let store = FsSessionStore::new(dir.path());
    store.put(&Scope::Shared, &saved_session(0, "clean")).unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("shared"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
