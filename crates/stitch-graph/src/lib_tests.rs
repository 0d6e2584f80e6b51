use super::*;
use chrono::{Duration, TimeZone};
use proptest::prelude::*;

fn at(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 10, 0, 0).unwrap()
}

fn signal(id: &str, timestamp: DateTime<Utc>) -> ActivitySignal {
    ActivitySignal {
        id: id.into(),
        source: "github".into(),
        timestamp,
        title: format!("title {id}"),
        refs: vec![],
        collaborators: vec![],
        container: None,
        keywords: vec![],
        parent_id: None,
        current_cluster_id: None,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn confidence_of(result: &HeuristicResult, id: &str) -> Option<Confidence> {
    result
        .candidates
        .iter()
        .find(|c| c.activity_id == id)
        .map(|c| c.confidence)
}

#[test]
fn test_shared_collaborators_within_a_week_form_one_component() {
    let signals: Vec<ActivitySignal> = (0..5)
        .map(|i| {
            let mut s = signal(&format!("a{i}"), at(3, 4 + i));
            s.collaborators = strings(&["bob", "carol"]);
            s.source = ["github", "slack", "jira", "google_calendar", "gdocs"][i as usize].into();
            s
        })
        .collect();

    let result = build_clusters(signals, &ClusteringConfig::default()).unwrap();
    assert_eq!(result.resolved.len(), 1);
    assert_eq!(result.resolved[0].activity_ids.len(), 5);
    assert!(result.candidates.is_empty());
}

#[test]
fn test_gap_of_22_days_splits_component_in_two() {
    let mut signals = Vec::new();
    for (id, ts) in [
        ("j1", at(1, 1)),
        ("j2", at(1, 5)),
        ("j3", at(1, 10)),
        ("f1", at(2, 1)),
        ("f2", at(2, 5)),
    ] {
        let mut s = signal(id, ts);
        s.container = Some("epic:PAY-7".into());
        signals.push(s);
    }

    let any_edge = connected_components(signals.clone(), &ClusteringConfig::default()).unwrap();
    assert_eq!(
        any_edge,
        vec![strings(&["j1", "j2", "j3"]), strings(&["f1", "f2"])]
    );

    let result = build_clusters(signals, &ClusteringConfig::default()).unwrap();
    assert_eq!(result.resolved.len(), 2);
    assert_eq!(result.resolved[0].activity_ids, strings(&["j1", "j2", "j3"]));
    assert_eq!(result.resolved[1].activity_ids, strings(&["f1", "f2"]));
    assert_eq!(result.resolved[0].start, at(1, 1));
    assert_eq!(result.resolved[0].end, at(1, 10));
}

#[test]
fn test_lexical_only_links_become_low_candidates() {
    let mut a = signal("a", at(4, 1));
    let mut b = signal("b", at(4, 3));
    a.keywords = strings(&["invoice", "export"]);
    b.keywords = strings(&["invoice", "export", "pdf"]);
    let c = signal("c", at(4, 4));

    let result = build_clusters(vec![a, b, c], &ClusteringConfig::default()).unwrap();
    assert!(result.resolved.is_empty());
    assert_eq!(confidence_of(&result, "a"), Some(Confidence::Low));
    assert_eq!(confidence_of(&result, "b"), Some(Confidence::Low));
    assert_eq!(confidence_of(&result, "c"), Some(Confidence::None));
}

#[test]
fn test_lexical_tail_does_not_join_resolved_cluster() {
    let mut a = signal("a", at(4, 1));
    let mut b = signal("b", at(4, 2));
    let mut c = signal("c", at(4, 3));
    a.refs = strings(&["PAY-1"]);
    b.refs = strings(&["PAY-1"]);
    b.keywords = strings(&["refund", "webhook"]);
    c.keywords = strings(&["refund", "webhook"]);

    let result = build_clusters(vec![a, b, c], &ClusteringConfig::default()).unwrap();
    assert_eq!(result.resolved.len(), 1);
    assert_eq!(result.resolved[0].activity_ids, strings(&["a", "b"]));
    assert_eq!(confidence_of(&result, "c"), Some(Confidence::Low));
}

#[test]
fn test_activity_cut_off_by_time_split_is_low_candidate() {
    let mut a = signal("a", at(1, 1));
    let mut b = signal("b", at(1, 2));
    let mut late = signal("late", at(3, 1));
    for s in [&mut a, &mut b, &mut late] {
        s.refs = strings(&["OPS-3"]);
    }

    let result = build_clusters(vec![a, b, late], &ClusteringConfig::default()).unwrap();
    assert_eq!(result.resolved.len(), 1);
    assert_eq!(confidence_of(&result, "late"), Some(Confidence::Low));
}

#[test]
fn test_main_branch_signals_never_share_a_container() {
    // The extractor never emits a container for default branches, so activities
    // on `main` only connect through other signals.
    let a = signal("a", at(5, 1));
    let b = signal("b", at(5, 2));
    let result = build_clusters(vec![a, b], &ClusteringConfig::default()).unwrap();
    assert!(result.resolved.is_empty());
    assert_eq!(result.stats.edges, 0);
}

#[test]
fn test_double_check_surfaces_high_candidates() {
    let mut a = signal("a", at(6, 1));
    let mut b = signal("b", at(6, 2));
    a.container = Some("thread:C1:1".into());
    b.container = Some("thread:C1:1".into());
    let config = ClusteringConfig {
        double_check_resolved: true,
        ..Default::default()
    };

    let result = build_clusters(vec![a.clone(), b.clone()], &config).unwrap();
    assert_eq!(result.resolved.len(), 1);
    assert_eq!(confidence_of(&result, "a"), Some(Confidence::High));
    assert_eq!(confidence_of(&result, "b"), Some(Confidence::High));

    let default = build_clusters(vec![a, b], &ClusteringConfig::default()).unwrap();
    assert!(default.candidates.is_empty());
}

#[test]
fn test_stats_report_edges_by_kind() {
    let mut a = signal("a", at(7, 1));
    let mut b = signal("b", at(7, 2));
    a.parent_id = Some("pr-9".into());
    b.parent_id = Some("pr-9".into());
    let result = build_clusters(vec![a, b], &ClusteringConfig::default()).unwrap();
    assert_eq!(result.stats.activities, 2);
    assert_eq!(result.stats.edges, 1);
    assert!(result.stats.edges_by_kind.contains(&(EdgeKind::Containment, 1)));
}

#[test]
fn test_zero_collaborator_threshold_is_rejected() {
    let config = ClusteringConfig {
        min_shared_collaborators: 0,
        ..Default::default()
    };
    let signals = vec![signal("a", at(8, 1)), signal("b", at(8, 2))];
    assert!(build_clusters(signals.clone(), &config).is_err());
    assert!(connected_components(signals, &config).is_err());
}

#[test]
fn test_huge_split_gap_is_an_error_not_a_panic() {
    let config = ClusteringConfig {
        split_gap_days: i64::MAX / 2,
        ..Default::default()
    };
    let err = build_clusters(vec![signal("a", at(8, 1))], &config).unwrap_err();
    assert!(format!("{err:#}").contains("split_gap_days"));
}

fn arb_signal(index: usize) -> impl Strategy<Value = ActivitySignal> {
    (
        0i64..120,
        prop::collection::vec(prop::sample::select(vec!["bob", "carol", "dave", "erin"]), 0..4),
        prop::collection::vec(prop::sample::select(vec!["invoice", "export", "refund", "sso"]), 0..4),
        prop::option::of(prop::sample::select(vec!["epic:A", "epic:B"])),
        prop::collection::vec(prop::sample::select(vec!["PAY-1", "PAY-2", "OPS-1"]), 0..2),
    )
        .prop_map(move |(day, people, words, container, refs)| {
            let mut s = signal(&format!("s{index:03}"), at(1, 1) + Duration::days(day));
            s.collaborators = people.into_iter().map(String::from).collect();
            s.collaborators.sort();
            s.collaborators.dedup();
            s.keywords = words.into_iter().map(String::from).collect();
            s.keywords.dedup();
            s.container = container.map(String::from);
            s.refs = refs.into_iter().map(String::from).collect();
            s
        })
}

fn arb_signals() -> impl Strategy<Value = Vec<ActivitySignal>> {
    (0usize..30).prop_flat_map(|n| (0..n).map(arb_signal).collect::<Vec<_>>())
}

proptest! {
    #[test]
    fn prop_heuristic_layer_is_idempotent(signals in arb_signals()) {
        let config = ClusteringConfig::default();
        let first = build_clusters(signals.clone(), &config).unwrap();
        let second = build_clusters(signals, &config).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_every_activity_is_resolved_or_candidate_once(signals in arb_signals()) {
        let ids: Vec<String> = signals.iter().map(|s| s.id.clone()).collect();
        let result = build_clusters(signals, &ClusteringConfig::default()).unwrap();
        let mut seen: Vec<String> = result
            .resolved
            .iter()
            .flat_map(|c| c.activity_ids.clone())
            .chain(result.candidates.iter().map(|c| c.activity_id.clone()))
            .collect();
        seen.sort();
        let mut expected = ids;
        expected.sort();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn prop_resolved_components_have_no_gap_over_threshold(signals in arb_signals()) {
        let by_id: std::collections::HashMap<String, DateTime<Utc>> =
            signals.iter().map(|s| (s.id.clone(), s.timestamp)).collect();
        let result = build_clusters(signals, &ClusteringConfig::default()).unwrap();
        for component in &result.resolved {
            for pair in component.activity_ids.windows(2) {
                let gap = by_id[&pair[1]] - by_id[&pair[0]];
                prop_assert!(gap <= Duration::days(14));
                prop_assert!(gap >= Duration::zero());
            }
        }
    }
}
