use std::collections::{BTreeSet, HashSet};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use stitch_config::ClusteringConfig;
use stitch_core::{Candidate, ClusterSummary, Confidence, DateRange};
use stitch_graph::Component;
use tracing::debug;

/// A cluster as the persistence layer keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCluster {
    pub id: String,
    pub name: String,
    pub activity_count: usize,
    pub first_activity_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    #[serde(default)]
    pub tools_involved: Vec<String>,
    /// Member titles, most recent first.
    #[serde(default)]
    pub activity_titles: Vec<String>,
}

impl StoredCluster {
    pub fn summary(&self, sample_titles: usize, referenced: bool) -> ClusterSummary {
        ClusterSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            activity_count: self.activity_count,
            date_range: DateRange {
                start: self.first_activity_at,
                end: self.last_activity_at,
            },
            tools_involved: self.tools_involved.clone(),
            sample_activity_titles: self
                .activity_titles
                .iter()
                .take(sample_titles)
                .cloned()
                .collect(),
            is_referenced_by_candidate: referenced,
        }
    }
}

/// Read side of the external cluster store.
pub trait ClusterStore: Send + Sync {
    /// Clusters with activity at or after `since`.
    fn recent_clusters(&self, since: DateTime<Utc>) -> Result<Vec<StoredCluster>>;
    /// Clusters with the given ids, in any order. Unknown ids are skipped.
    fn clusters_by_ids(&self, ids: &[String]) -> Result<Vec<StoredCluster>>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryClusterStore {
    clusters: Vec<StoredCluster>,
}

impl InMemoryClusterStore {
    pub fn new(clusters: Vec<StoredCluster>) -> Self {
        Self { clusters }
    }
}

impl ClusterStore for InMemoryClusterStore {
    fn recent_clusters(&self, since: DateTime<Utc>) -> Result<Vec<StoredCluster>> {
        Ok(self
            .clusters
            .iter()
            .filter(|cluster| cluster.last_activity_at >= since)
            .cloned()
            .collect())
    }

    fn clusters_by_ids(&self, ids: &[String]) -> Result<Vec<StoredCluster>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(self
            .clusters
            .iter()
            .filter(|cluster| wanted.contains(cluster.id.as_str()))
            .cloned()
            .collect())
    }
}

/// What gets sent to refinement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub candidates: Vec<Candidate>,
    pub summaries: Vec<ClusterSummary>,
}

/// Pick the candidates worth refining and the clusters they may be placed into.
///
/// `High` candidates survive only when double-checking is configured and they
/// really are members of a resolved component. Summaries cover recently active
/// clusters (newest first, capped) plus every cluster a candidate already
/// belongs to, however old.
pub fn select_candidates(
    resolved: &[Component],
    weak: &[Candidate],
    store: &dyn ClusterStore,
    now: DateTime<Utc>,
    config: &ClusteringConfig,
) -> Result<Selection> {
    let candidates: Vec<Candidate> = weak
        .iter()
        .filter(|candidate| match candidate.confidence {
            Confidence::High => {
                config.double_check_resolved
                    && resolved.iter().any(|c| c.contains(&candidate.activity_id))
            }
            Confidence::Low | Confidence::None => true,
        })
        .cloned()
        .collect();

    if candidates.is_empty() {
        return Ok(Selection::default());
    }

    let since = TimeDelta::try_days(config.recent_cluster_days)
        .and_then(|window| now.checked_sub_signed(window))
        .with_context(|| {
            format!(
                "recent_cluster_days out of range: {}",
                config.recent_cluster_days
            )
        })?;
    let mut recent = store
        .recent_clusters(since)
        .context("failed to load recent clusters")?;
    recent.sort_by(|a, b| {
        b.last_activity_at
            .cmp(&a.last_activity_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    recent.truncate(config.max_cluster_summaries);

    let referenced: BTreeSet<String> = candidates
        .iter()
        .filter_map(|candidate| candidate.current_cluster_id.clone())
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut summaries: Vec<ClusterSummary> = Vec::new();
    for cluster in &recent {
        if seen.insert(cluster.id.clone()) {
            let is_referenced = referenced.contains(&cluster.id);
            summaries.push(cluster.summary(config.sample_titles, is_referenced));
        }
    }

    let missing: Vec<String> = referenced
        .iter()
        .filter(|id| !seen.contains(id.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        let mut older = store
            .clusters_by_ids(&missing)
            .context("failed to load clusters referenced by candidates")?;
        older.sort_by(|a, b| a.id.cmp(&b.id));
        for cluster in &older {
            if seen.insert(cluster.id.clone()) {
                summaries.push(cluster.summary(config.sample_titles, true));
            }
        }
    }

    debug!(
        candidates = candidates.len(),
        summaries = summaries.len(),
        referenced = referenced.len(),
        "selected refinement candidates"
    );
    Ok(Selection {
        candidates,
        summaries,
    })
}
