use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use stitch_config::StitchConfig;
use stitch_core::{ActivityRecord, Placement};
use stitch_engine::{ClusteringInput, cluster_heuristic_only, run_clustering};
use stitch_refine::{
    ClusterStore, FallbackReason, InMemoryClusterStore, NoopClient, RefineRequest,
    RefinementLlmClient, StoredCluster,
};

struct ScriptedClient {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl ScriptedClient {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RefinementLlmClient for ScriptedClient {
    async fn complete(&self, _request: &RefineRequest) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted"))
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 20, 12, 0, 0).unwrap()
}

fn record(id: &str, source: &str, days_ago: i64, title: &str) -> ActivityRecord {
    ActivityRecord {
        id: id.into(),
        source: source.into(),
        timestamp: now() - Duration::days(days_ago),
        title: title.into(),
        description: None,
        refs: vec![],
        raw: json!({}),
        parent_id: None,
        current_cluster_id: None,
    }
}

fn refine_enabled() -> StitchConfig {
    let mut config = StitchConfig::default();
    config.refine.enabled = true;
    config
}

fn payments_store() -> InMemoryClusterStore {
    InMemoryClusterStore::new(vec![StoredCluster {
        id: "pay-1".into(),
        name: "Payments hardening".into(),
        activity_count: 14,
        first_activity_at: now() - Duration::days(90),
        last_activity_at: now() - Duration::days(12),
        tools_involved: vec!["github".into(), "jira".into()],
        activity_titles: vec!["Retry failed captures".into()],
    }])
}

/// Five loosely related invoice activities plus one unrelated bug fix.
fn scenario_activities() -> Vec<ActivityRecord> {
    vec![
        record("gh-1", "github", 6, "Invoice export: PDF layout"),
        record("gh-2", "github", 5, "Invoice export pagination"),
        record("sl-3", "slack", 5, "invoice export looks off on Safari"),
        record("gd-4", "gdocs", 4, "Invoice export design notes"),
        record("gh-5", "github", 3, "Invoice export: currency rounding"),
        record("gh-6", "github", 2, "Null pointer in capture handler"),
    ]
}

#[tokio::test]
async fn test_new_and_move_assignments_produce_two_groups() {
    let client = ScriptedClient::new(&[r#"{
        "gh-1": "NEW:Invoice export",
        "gh-2": "NEW:Invoice export",
        "sl-3": "NEW:Invoice export",
        "gd-4": "NEW:Invoice export",
        "gh-5": "NEW:Invoice export",
        "gh-6": "MOVE:pay-1"
    }"#]);
    let input = ClusteringInput {
        activities: scenario_activities(),
        self_identities: vec!["alice".into()],
        now: now(),
    };

    let report = run_clustering(input, &payments_store(), &client, &refine_enabled())
        .await
        .unwrap();

    assert_eq!(client.calls(), 1);
    assert!(report.resolved.is_empty());
    assert_eq!(report.submitted, 6);
    assert_eq!(report.summaries, 1);
    assert!(!report.used_fallback);
    assert!(!report.refinement_skipped);

    let groups = report.partition.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[&Placement::New("Invoice export".into())].len(), 5);
    assert_eq!(
        groups[&Placement::Existing("pay-1".into())],
        vec!["gh-6".to_string()]
    );
    assert_eq!(report.partition.new_cluster_names(), vec!["Invoice export"]);
}

#[tokio::test]
async fn test_two_invalid_responses_fall_back_to_heuristic_placement() {
    let missing_one = r#"{"gh-1": "NEW:a", "gh-2": "NEW:a", "sl-3": "NEW:a",
        "gd-4": "NEW:a", "gh-5": "NEW:a"}"#;
    let client = ScriptedClient::new(&[missing_one, missing_one, missing_one]);
    let mut activities = scenario_activities();
    activities[5].current_cluster_id = Some("pay-1".into());
    let input = ClusteringInput {
        activities,
        self_identities: vec![],
        now: now(),
    };

    let report = run_clustering(input, &payments_store(), &client, &refine_enabled())
        .await
        .unwrap();

    assert_eq!(client.calls(), 2);
    assert!(report.used_fallback);
    assert_eq!(report.attempts, 2);
    assert!(matches!(
        report.fallback_reason,
        Some(FallbackReason::InvalidResponse(_))
    ));
    assert_eq!(report.partition.len(), 6);
    assert_eq!(report.partition.orphans().len(), 5);
    assert_eq!(
        report.partition.placement("gh-6"),
        Some(&Placement::Existing("pay-1".into()))
    );
}

#[tokio::test]
async fn test_disabled_refinement_never_calls_the_service() {
    let client = ScriptedClient::new(&[]);
    let input = ClusteringInput {
        activities: scenario_activities(),
        self_identities: vec![],
        now: now(),
    };

    let report = run_clustering(input, &payments_store(), &client, &StitchConfig::default())
        .await
        .unwrap();

    assert_eq!(client.calls(), 0);
    assert!(report.refinement_skipped);
    assert!(!report.used_fallback);
    assert_eq!(report.candidates.len(), 6);
    assert_eq!(report.partition.orphans().len(), 6);
}

#[tokio::test]
async fn test_fully_resolved_run_skips_refinement() {
    let mut activities = vec![
        record("j-1", "jira", 3, "Rotate signing keys"),
        record("g-2", "github", 2, "Key rotation job"),
    ];
    activities[0].refs = vec!["SEC-9".into()];
    activities[1].refs = vec!["SEC-9".into()];
    let input = ClusteringInput {
        activities,
        self_identities: vec![],
        now: now(),
    };

    let report = run_clustering(input, &payments_store(), &NoopClient, &refine_enabled())
        .await
        .unwrap();

    assert!(report.refinement_skipped);
    assert!(!report.used_fallback);
    assert_eq!(report.attempts, 0);
    assert_eq!(report.partition.placement("j-1"), Some(&Placement::Component(0)));
    assert_eq!(report.partition.placement("g-2"), Some(&Placement::Component(0)));
}

#[tokio::test]
async fn test_every_activity_is_placed_exactly_once() {
    let mut activities = scenario_activities();
    activities.push(record("j-7", "jira", 40, "Rotate signing keys"));
    activities.push(record("g-8", "github", 39, "Key rotation job"));
    activities[6].refs = vec!["SEC-9".into()];
    activities[7].refs = vec!["SEC-9".into()];
    let ids: BTreeSet<String> = activities.iter().map(|a| a.id.clone()).collect();
    let input = ClusteringInput {
        activities,
        self_identities: vec![],
        now: now(),
    };

    let report = run_clustering(input, &payments_store(), &NoopClient, &refine_enabled())
        .await
        .unwrap();

    assert!(report.used_fallback);
    let placed: BTreeSet<String> = report.partition.iter().map(|(id, _)| id.to_string()).collect();
    assert_eq!(placed, ids);
    assert_eq!(report.partition.len(), ids.len());
}

struct UnreadableStore;

impl ClusterStore for UnreadableStore {
    fn recent_clusters(&self, _since: DateTime<Utc>) -> Result<Vec<StoredCluster>> {
        Err(anyhow!("clusters.jsonl: permission denied"))
    }

    fn clusters_by_ids(&self, _ids: &[String]) -> Result<Vec<StoredCluster>> {
        Err(anyhow!("clusters.jsonl: permission denied"))
    }
}

#[tokio::test]
async fn test_unreadable_store_keeps_heuristic_partition() {
    let client = ScriptedClient::new(&[]);
    let mut activities = scenario_activities();
    activities.push(record("j-7", "jira", 3, "Rotate signing keys"));
    activities.push(record("g-8", "github", 2, "Key rotation job"));
    activities[6].refs = vec!["SEC-9".into()];
    activities[7].refs = vec!["SEC-9".into()];
    let input = ClusteringInput {
        activities,
        self_identities: vec![],
        now: now(),
    };

    let report = run_clustering(input, &UnreadableStore, &client, &refine_enabled())
        .await
        .unwrap();

    assert_eq!(client.calls(), 0);
    assert!(report.used_fallback);
    assert!(!report.refinement_skipped);
    assert_eq!(report.attempts, 0);
    assert!(matches!(
        &report.fallback_reason,
        Some(FallbackReason::ClusterStore(detail)) if detail.contains("permission denied")
    ));
    assert_eq!(report.partition.len(), 8);
    assert_eq!(report.partition.placement("j-7"), Some(&Placement::Component(0)));
    assert_eq!(report.partition.orphans().len(), 6);
}

#[tokio::test]
async fn test_invalid_thresholds_fail_the_run() {
    let mut config = refine_enabled();
    config.clustering.min_shared_collaborators = 0;
    let input = ClusteringInput {
        activities: scenario_activities(),
        self_identities: vec![],
        now: now(),
    };
    let err = run_clustering(input, &payments_store(), &NoopClient, &config)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("min_shared_collaborators"));
}

#[test]
fn test_heuristic_layer_is_idempotent() {
    let config = StitchConfig::default();
    let identities = vec!["alice".to_string()];
    let first = cluster_heuristic_only(&scenario_activities(), &identities, &config.clustering)
        .unwrap();
    let second = cluster_heuristic_only(&scenario_activities(), &identities, &config.clustering)
        .unwrap();
    assert_eq!(first, second);
}
