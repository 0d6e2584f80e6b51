use anyhow::{Context, Result};
use serde::Serialize;
use stitch_core::{Candidate, ClusterSummary, Confidence};

pub const SYSTEM_PROMPT: &str = "\
You group work activities into efforts. You receive candidate activities that \
could not be placed with confidence, and summaries of existing clusters.

Reply with one JSON object and nothing else. It must contain every candidate id \
exactly once as a key, and no other keys. Each value is one of:
- \"KEEP:<clusterId>\" keep the activity in its current cluster. Only legal when \
<clusterId> equals the candidate's current_cluster_id.
- \"MOVE:<clusterId>\" move the activity to a different existing cluster from the list.
- \"NEW:<name>\" start a new cluster with a short descriptive name. Candidates \
given the same name end up in the same new cluster.

When uncertain, prefer NEW over merging into an existing cluster. Splitting \
later costs a quick merge; untangling a wrong merge costs much more.";

/// One refinement exchange. Both attempts send exactly this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefineRequest {
    pub system: String,
    pub user: String,
}

impl RefineRequest {
    pub fn build(candidates: &[Candidate], summaries: &[ClusterSummary]) -> Result<Self> {
        Ok(Self {
            system: SYSTEM_PROMPT.to_string(),
            user: user_prompt(candidates, summaries)?,
        })
    }
}

#[derive(Serialize)]
struct Payload<'a> {
    candidates: Vec<CandidateView<'a>>,
    clusters: Vec<ClusterView<'a>>,
}

#[derive(Serialize)]
struct CandidateView<'a> {
    id: &'a str,
    source: &'a str,
    title: &'a str,
    date: String,
    current_cluster_id: Option<&'a str>,
    confidence: Option<&'static str>,
}

#[derive(Serialize)]
struct ClusterView<'a> {
    id: &'a str,
    name: &'a str,
    activity_count: usize,
    first_activity: String,
    last_activity: String,
    sample_titles: &'a [String],
}

fn user_prompt(candidates: &[Candidate], summaries: &[ClusterSummary]) -> Result<String> {
    let payload = Payload {
        candidates: candidates
            .iter()
            .map(|c| CandidateView {
                id: &c.activity_id,
                source: &c.source,
                title: &c.title,
                date: c.timestamp.date_naive().to_string(),
                current_cluster_id: c.current_cluster_id.as_deref(),
                confidence: match c.confidence {
                    Confidence::None => None,
                    other => Some(other.as_str()),
                },
            })
            .collect(),
        clusters: summaries
            .iter()
            .map(|s| ClusterView {
                id: &s.id,
                name: &s.name,
                activity_count: s.activity_count,
                first_activity: s.date_range.start.date_naive().to_string(),
                last_activity: s.date_range.end.date_naive().to_string(),
                sample_titles: &s.sample_activity_titles,
            })
            .collect(),
    };
    let json =
        serde_json::to_string_pretty(&payload).context("failed to encode refinement payload")?;
    Ok(format!(
        "Assign every candidate below. Existing clusters are listed after the candidates.\n\n{json}"
    ))
}
