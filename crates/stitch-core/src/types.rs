use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One timestamped record imported from an external tool.
///
/// Owned by the ingestion layer; the engine only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    /// Source tag such as `github`, `jira` or `slack`.
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Cross-tool references already extracted upstream (ticket keys, PR urls).
    #[serde(default)]
    pub refs: Vec<String>,
    /// Tool-specific payload, shape unknown to the engine.
    #[serde(default)]
    pub raw: Value,
    /// Record this activity provably belongs to (e.g. the PR a commit landed in).
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Stored cluster the activity is already filed under, if any.
    #[serde(default)]
    pub current_cluster_id: Option<String>,
}

/// Tool-agnostic subset of an activity used for clustering.
///
/// Recomputed on every run and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySignal {
    pub id: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub refs: Vec<String>,
    /// Normalized people identifiers, never including the acting user.
    pub collaborators: Vec<String>,
    /// Working context token: feature branch, thread, epic or folder.
    pub container: Option<String>,
    pub keywords: Vec<String>,
    pub parent_id: Option<String>,
    pub current_cluster_id: Option<String>,
}

/// How sure the heuristic layer is about an activity's placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Not connected to anything.
    None,
    /// Connected only through lexical overlap.
    Low,
    /// Connected through a strong edge; only refined when double-checking.
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An activity offered to the refinement step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub activity_id: String,
    pub current_cluster_id: Option<String>,
    pub confidence: Confidence,
    pub source: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
}

impl Candidate {
    pub fn from_signal(signal: &ActivitySignal, confidence: Confidence) -> Self {
        Self {
            activity_id: signal.id.clone(),
            current_cluster_id: signal.current_cluster_id.clone(),
            confidence,
            source: signal.source.clone(),
            title: signal.title.clone(),
            timestamp: signal.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Bounded description of a stored cluster, handed to refinement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub id: String,
    pub name: String,
    pub activity_count: usize,
    pub date_range: DateRange,
    pub tools_involved: Vec<String>,
    pub sample_activity_titles: Vec<String>,
    pub is_referenced_by_candidate: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssignmentAction {
    Keep,
    Move,
    New,
}

impl AssignmentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keep => "KEEP",
            Self::Move => "MOVE",
            Self::New => "NEW",
        }
    }
}

impl std::fmt::Display for AssignmentAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated refinement decision for one candidate.
///
/// `target` is a cluster id for `Keep`/`Move` and a free-text name for `New`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub activity_id: String,
    pub action: AssignmentAction,
    pub target: String,
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.action, self.target)
    }
}

/// Output format for CLI reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_activity_record_defaults_optional_fields() {
        let record: ActivityRecord = serde_json::from_str(
            r#"{"id":"a1","source":"github","timestamp":"2024-01-01T10:00:00Z","title":"Add login"}"#,
        )
        .unwrap();
        assert!(record.refs.is_empty());
        assert!(record.raw.is_null());
        assert_eq!(record.parent_id, None);
        assert_eq!(record.current_cluster_id, None);
    }

    #[test]
    fn test_confidence_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Confidence::Low).unwrap(), "\"low\"");
        assert_eq!(Confidence::None.to_string(), "none");
    }

    #[test]
    fn test_assignment_display_uses_action_grammar() {
        let assignment = Assignment {
            activity_id: "a1".into(),
            action: AssignmentAction::Move,
            target: "c-7".into(),
        };
        assert_eq!(assignment.to_string(), "MOVE:c-7");
    }

    #[test]
    fn test_candidate_from_signal_copies_context() {
        let signal = ActivitySignal {
            id: "a1".into(),
            source: "jira".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            title: "Checkout flow".into(),
            refs: vec![],
            collaborators: vec![],
            container: None,
            keywords: vec![],
            parent_id: None,
            current_cluster_id: Some("c-1".into()),
        };
        let candidate = Candidate::from_signal(&signal, Confidence::Low);
        assert_eq!(candidate.activity_id, "a1");
        assert_eq!(candidate.current_cluster_id.as_deref(), Some("c-1"));
        assert_eq!(candidate.confidence, Confidence::Low);
        assert_eq!(candidate.title, "Checkout flow");
    }
}
