use serde::{Deserialize, Serialize};

/// Thresholds of the deterministic heuristic layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Cut a component where consecutive activities are further apart than this.
    pub split_gap_days: i64,
    /// Maximum distance between two activities joined by a collaborator edge.
    pub collaborator_window_days: i64,
    /// Shared non-self collaborators needed for a collaborator edge.
    pub min_shared_collaborators: usize,
    /// Maximum distance between two activities joined by a lexical edge.
    pub lexical_window_days: i64,
    /// Shared title keywords needed for a lexical edge.
    pub min_shared_keywords: usize,
    /// Shorter title tokens are dropped from keywords.
    pub min_keyword_len: usize,
    /// Clusters with activity inside this window are summarized for refinement.
    pub recent_cluster_days: i64,
    /// Upper bound on recent summaries (referenced clusters are always added).
    pub max_cluster_summaries: usize,
    /// Sample titles carried per cluster summary.
    pub sample_titles: usize,
    /// Also send members of resolved clusters to refinement as high-confidence candidates.
    pub double_check_resolved: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            split_gap_days: 14,
            collaborator_window_days: 30,
            min_shared_collaborators: 2,
            lexical_window_days: 30,
            min_shared_keywords: 2,
            min_keyword_len: 3,
            recent_cluster_days: 30,
            max_cluster_summaries: 40,
            sample_titles: 5,
            double_check_resolved: false,
        }
    }
}

impl ClusteringConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
