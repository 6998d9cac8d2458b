use std::io::Cursor;
use std::sync::Arc;

use moetrace_engine::DEFAULT_CLUSTER_THRESHOLD;
use moetrace_runtime::{ingest_events, AnalysisService, RecorderService};
use moetrace_store::{FsSessionStore, Scope, SessionStore};
use moetrace_types::{Phase, RoutingEvent, SessionMetadata};
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> Arc<dyn SessionStore> {
    Arc::new(FsSessionStore::new(dir.path()))
}

fn recorder(store: Arc<dyn SessionStore>, category: Option<&str>) -> RecorderService {
    RecorderService::new(
        store,
        Scope::Shared,
        8,
        2,
        SessionMetadata {
            category: category.map(str::to_string),
            ..Default::default()
        },
    )
}

fn log_pair_session(service: &mut RecorderService, pair: (usize, usize), tokens: usize) {
    for token in 0..tokens {
        for layer in 0..2 {
            service
                .log(RoutingEvent {
                    token_index: token,
                    layer_index: layer,
                    phase: Phase::Generation,
                    gate_logits: vec![0.2; 8],
                    selected_experts: vec![pair.0, pair.1],
                    expert_weights: vec![0.7, 0.3],
                    input_token: None,
                })
                .unwrap();
        }
    }
}

#[test]
fn record_save_list_get_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut service = recorder(store.clone(), Some("code"));
    log_pair_session(&mut service, (1, 2), 4);
    let live_summary = service.summary();

    let receipt = service
        .save(Some("write a parser".to_string()), Some("done".to_string()))
        .unwrap();
    assert_eq!(receipt.token_count, 4);

    // Saving started a fresh session with the same configuration.
    let status = service.status();
    assert_eq!(status.num_experts, 8);
    assert_eq!(status.generation_tokens, 0);

    let analysis = AnalysisService::new(store, Scope::Shared);
    let listed = analysis.list(10).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, receipt.id);
    assert_eq!(listed[0].category.as_deref(), Some("code"));

    let loaded = analysis.get(&receipt.id).unwrap();
    assert_eq!(loaded.summary, live_summary);
    assert_eq!(
        loaded.session.metadata.prompt.as_deref(),
        Some("write a parser")
    );
}

#[test]
fn save_carries_context_metadata_into_the_next_session() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut service = recorder(store.clone(), Some("code"));
    log_pair_session(&mut service, (1, 2), 3);
    service.save(Some("first".to_string()), None).unwrap();

    // A long-lived service keeps recording under the same category.
    log_pair_session(&mut service, (1, 2), 3);
    let receipt = service.save(None, None).unwrap();

    let analysis = AnalysisService::new(store, Scope::Shared);
    let second = analysis.get(&receipt.id).unwrap();
    assert_eq!(second.session.metadata.category.as_deref(), Some("code"));
    // Prompt and response belong to the sealed session only.
    assert!(second.session.metadata.prompt.is_none());

    let report = analysis
        .aggregate(Some("code"), DEFAULT_CLUSTER_THRESHOLD)
        .unwrap();
    assert_eq!(report.sessions_scanned, 2);
}

#[test]
fn aggregate_skips_and_counts_corrupt_artifacts() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut service = recorder(store.clone(), None);
    log_pair_session(&mut service, (5, 7), 10);
    service.save(None, None).unwrap();
    log_pair_session(&mut service, (5, 7), 10);
    service.save(None, None).unwrap();

    std::fs::write(dir.path().join("shared").join("routing_bad.json"), "{oops").unwrap();

    let analysis = AnalysisService::new(store, Scope::Shared);
    let report = analysis.aggregate(None, DEFAULT_CLUSTER_THRESHOLD).unwrap();

    assert_eq!(report.sessions_scanned, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.analysis.usage.overall.total(), 80);
    assert_eq!(report.analysis.clusters, vec![vec![5, 7]]);
}

#[test]
fn aggregate_filters_by_category() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut code = recorder(store.clone(), Some("code"));
    log_pair_session(&mut code, (1, 2), 5);
    code.save(None, None).unwrap();

    let mut math = recorder(store.clone(), Some("math"));
    log_pair_session(&mut math, (5, 7), 5);
    math.save(None, None).unwrap();

    let analysis = AnalysisService::new(store, Scope::Shared);
    let report = analysis
        .aggregate(Some("math"), DEFAULT_CLUSTER_THRESHOLD)
        .unwrap();

    assert_eq!(report.sessions_scanned, 1);
    assert_eq!(report.analysis.usage.overall.count(5), 10);
    assert_eq!(report.analysis.usage.overall.count(1), 0);
}

#[test]
fn compare_groups_sessions_by_category_metadata() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    for (category, pair) in [("code", (1usize, 2usize)), ("math", (5, 7))] {
        let mut service = recorder(store.clone(), Some(category));
        log_pair_session(&mut service, pair, 6);
        service.save(None, None).unwrap();
    }
    // Uncategorized session is ignored by compare.
    let mut other = recorder(store.clone(), None);
    log_pair_session(&mut other, (0, 3), 2);
    other.save(None, None).unwrap();

    let analysis = AnalysisService::new(store, Scope::Shared);
    let report = analysis
        .compare(
            &["code".to_string(), "math".to_string()],
            DEFAULT_CLUSTER_THRESHOLD,
        )
        .unwrap();

    assert_eq!(report.sessions_scanned, 2);
    assert_eq!(report.comparison.per_category.len(), 2);
    assert_eq!(report.comparison.per_category["code"].session_count, 1);
}

#[test]
fn heatmap_respects_phase_filter() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut service = recorder(store.clone(), None);
    log_pair_session(&mut service, (1, 2), 3);
    service.save(None, None).unwrap();

    let analysis = AnalysisService::new(store, Scope::Shared);
    let prefill = analysis.heatmap(None, Some(Phase::Prefill)).unwrap();
    assert!(prefill.view.cells.is_empty());

    let generation = analysis.heatmap(None, Some(Phase::Generation)).unwrap();
    assert_eq!(generation.view.cells.len(), 4);
}

#[test]
fn ingest_replays_a_jsonl_stream() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let mut service = RecorderService::new(
        store,
        Scope::Shared,
        4,
        2,
        SessionMetadata::default(),
    );

    let jsonl = r#"
{"token_index":0,"layer_index":0,"phase":"prefill","gate_logits":[0.1,0.2,0.3,0.4],"selected_experts":[3,2],"expert_weights":[0.6,0.4]}
{"token_index":0,"layer_index":1,"phase":"prefill","gate_logits":[0.4,0.3,0.2,0.1],"selected_experts":[0,1],"expert_weights":[0.5,0.5]}
{"token_index":0,"layer_index":0,"phase":"generation","gate_logits":[0.1,0.1,0.1,0.7],"selected_experts":[3,0],"expert_weights":[0.8,0.2]}
"#;

    let stats = ingest_events(&mut service, Cursor::new(jsonl)).unwrap();
    assert_eq!(stats.events, 3);

    let status = service.status();
    assert_eq!(status.prefill_tokens, 1);
    assert_eq!(status.generation_tokens, 1);
    assert_eq!(status.total_selections, 6);
}

#[test]
fn ingest_rejects_malformed_lines_with_position() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let mut service = RecorderService::new(
        store,
        Scope::Shared,
        4,
        2,
        SessionMetadata::default(),
    );

    let err = ingest_events(&mut service, Cursor::new("not json\n")).unwrap_err();
    assert!(err.to_string().contains("line 1"));
}
