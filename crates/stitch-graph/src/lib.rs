//! Heuristic layer: multi-signal activity graph, connected components, temporal split.

pub mod edge;
pub mod graph;
pub mod temporal;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use stitch_config::{ClusteringConfig, validate_clustering};
use stitch_core::{ActivitySignal, Candidate, Confidence};
use tracing::debug;

pub use edge::EdgeKind;
pub use graph::ActivityGraph;
pub use temporal::split_by_time_gap;

/// A resolved heuristic cluster. Members are in time order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub activity_ids: Vec<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Component {
    fn from_members(members: &[usize], signals: &[ActivitySignal]) -> Option<Self> {
        let first = signals.get(*members.first()?)?;
        let last = signals.get(*members.last()?)?;
        Some(Self {
            activity_ids: members.iter().map(|&i| signals[i].id.clone()).collect(),
            start: first.timestamp,
            end: last.timestamp,
        })
    }

    pub fn contains(&self, activity_id: &str) -> bool {
        self.activity_ids.iter().any(|id| id == activity_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub activities: usize,
    pub edges: usize,
    pub edges_by_kind: Vec<(EdgeKind, usize)>,
}

/// Output of the heuristic layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HeuristicResult {
    pub resolved: Vec<Component>,
    /// Unclustered (`None`) and lexically attached (`Low`) activities, plus
    /// resolved members as `High` when double-checking is configured.
    pub candidates: Vec<Candidate>,
    pub stats: GraphStats,
}

/// Run the deterministic layer over extracted signals.
///
/// Strong edges (everything but lexical) form components, which are then cut
/// at time gaps. Pieces with at least two members are resolved clusters; every
/// activity left alone becomes a candidate. Fails when `config` breaks the
/// clustering thresholds.
pub fn build_clusters(
    signals: Vec<ActivitySignal>,
    config: &ClusteringConfig,
) -> Result<HeuristicResult> {
    let max_gap = split_gap(config)?;
    let graph = ActivityGraph::build(signals, config);

    let mut resolved: Vec<Component> = Vec::new();
    let mut resolved_members: Vec<usize> = Vec::new();
    let mut candidates: Vec<(usize, Confidence)> = Vec::new();

    for component in graph.components(|kind| kind.is_strong()) {
        for piece in split_by_time_gap(&component, graph.signals(), max_gap) {
            if piece.len() >= 2 {
                if let Some(cluster) = Component::from_members(&piece, graph.signals()) {
                    resolved_members.extend_from_slice(&piece);
                    resolved.push(cluster);
                }
            } else {
                for index in piece {
                    let confidence = if graph.degree(index) == 0 {
                        Confidence::None
                    } else {
                        Confidence::Low
                    };
                    candidates.push((index, confidence));
                }
            }
        }
    }

    if config.double_check_resolved {
        candidates.extend(resolved_members.iter().map(|&i| (i, Confidence::High)));
    }

    resolved.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.activity_ids.first().cmp(&b.activity_ids.first()))
    });
    candidates.sort_by(|&(a, _), &(b, _)| {
        let (sa, sb) = (graph.signal(a), graph.signal(b));
        sa.timestamp.cmp(&sb.timestamp).then_with(|| sa.id.cmp(&sb.id))
    });

    let stats = GraphStats {
        activities: graph.node_count(),
        edges: graph.edge_count(),
        edges_by_kind: graph.edge_histogram(),
    };
    debug!(
        activities = stats.activities,
        edges = stats.edges,
        resolved = resolved.len(),
        candidates = candidates.len(),
        "heuristic clustering done"
    );

    Ok(HeuristicResult {
        resolved,
        candidates: candidates
            .into_iter()
            .map(|(i, confidence)| Candidate::from_signal(graph.signal(i), confidence))
            .collect(),
        stats,
    })
}

/// Any-edge components after the temporal split, as activity ids.
///
/// Diagnostic view used by `stitch signals`; clustering itself only trusts strong edges.
pub fn connected_components(
    signals: Vec<ActivitySignal>,
    config: &ClusteringConfig,
) -> Result<Vec<Vec<String>>> {
    let max_gap = split_gap(config)?;
    let graph = ActivityGraph::build(signals, config);
    Ok(graph
        .components(|_| true)
        .into_iter()
        .flat_map(|component| split_by_time_gap(&component, graph.signals(), max_gap))
        .map(|piece| piece.iter().map(|&i| graph.signal(i).id.clone()).collect())
        .collect())
}

fn split_gap(config: &ClusteringConfig) -> Result<TimeDelta> {
    validate_clustering(config).context("Invalid clustering configuration")?;
    TimeDelta::try_days(config.split_gap_days)
        .with_context(|| format!("split_gap_days out of range: {}", config.split_gap_days))
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
