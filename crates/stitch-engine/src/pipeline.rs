use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use stitch_config::{ClusteringConfig, StitchConfig, validate_clustering};
use stitch_core::{ActivityRecord, Candidate, FinalPartition, StitchError};
use stitch_graph::{Component, GraphStats, HeuristicResult, build_clusters};
use stitch_refine::{
    ClusterStore, FallbackReason, RefineOutcome, RefinementLlmClient, Selection, refine,
    select_candidates,
};
use stitch_signal::SignalExtractor;
use tracing::{debug, info, warn};
use ulid::Ulid;

/// Everything one run needs from the ingestion layer.
#[derive(Debug, Clone)]
pub struct ClusteringInput {
    pub activities: Vec<ActivityRecord>,
    /// Identities of the acting user across tools; never counted as collaborators.
    pub self_identities: Vec<String>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusteringReport {
    pub run_id: String,
    pub partition: FinalPartition,
    pub resolved: Vec<Component>,
    /// Every activity the heuristic layer could not place on its own.
    pub candidates: Vec<Candidate>,
    /// How many candidates were actually sent to refinement.
    pub submitted: usize,
    pub summaries: usize,
    pub stats: GraphStats,
    pub refinement_skipped: bool,
    pub used_fallback: bool,
    pub attempts: u8,
    pub fallback_reason: Option<FallbackReason>,
}

/// Run only the deterministic layer. Same input, same output.
pub fn cluster_heuristic_only(
    activities: &[ActivityRecord],
    self_identities: &[String],
    config: &ClusteringConfig,
) -> Result<HeuristicResult> {
    validate_clustering(config)?;
    check_activity_ids(activities)?;
    let extractor = SignalExtractor::new(self_identities, config);
    build_clusters(extractor.extract_all(activities), config)
}

/// One full clustering run for one user.
///
/// Refinement only happens when it is enabled and there is something
/// ambiguous to refine; otherwise the heuristic placement is final. A cluster
/// store that cannot be read counts as a refinement fallback, not a failed run.
pub async fn run_clustering<C>(
    input: ClusteringInput,
    store: &dyn ClusterStore,
    client: &C,
    config: &StitchConfig,
) -> Result<ClusteringReport>
where
    C: RefinementLlmClient + ?Sized,
{
    let run_id = Ulid::new().to_string();
    info!(
        %run_id,
        activities = input.activities.len(),
        refine_enabled = config.refine.enabled,
        "clustering run started"
    );

    let heuristic = cluster_heuristic_only(
        &input.activities,
        &input.self_identities,
        &config.clustering,
    )?;
    debug!(
        %run_id,
        resolved = heuristic.resolved.len(),
        candidates = heuristic.candidates.len(),
        edges = heuristic.stats.edges,
        "heuristic layer done"
    );

    let mut store_failure = None;
    let selection = if config.refine.enabled {
        select_candidates(
            &heuristic.resolved,
            &heuristic.candidates,
            store,
            input.now,
            &config.clustering,
        )
        .unwrap_or_else(|e| {
            let error = StitchError::ClusterStore(format!("{e:#}"));
            warn!(%run_id, %error, "skipping refinement");
            store_failure = Some(FallbackReason::ClusterStore(error.to_string()));
            Selection::default()
        })
    } else {
        Selection::default()
    };

    let refinement_skipped = store_failure.is_none() && selection.candidates.is_empty();
    let outcome = if let Some(reason) = store_failure {
        RefineOutcome::fallback(0, reason)
    } else if refinement_skipped {
        RefineOutcome::default()
    } else {
        refine(
            client,
            &selection.candidates,
            &selection.summaries,
            Duration::from_millis(config.refine.timeout_ms),
        )
        .await
    };

    let partition = crate::apply(&heuristic.resolved, &heuristic.candidates, &outcome.assignments);
    info!(
        %run_id,
        placed = partition.len(),
        orphans = partition.orphans().len(),
        new_clusters = partition.new_cluster_names().len(),
        refinement_skipped,
        used_fallback = outcome.used_fallback,
        attempts = outcome.attempts,
        "clustering run finished"
    );

    Ok(ClusteringReport {
        run_id,
        partition,
        resolved: heuristic.resolved,
        candidates: heuristic.candidates,
        submitted: selection.candidates.len(),
        summaries: selection.summaries.len(),
        stats: heuristic.stats,
        refinement_skipped,
        used_fallback: outcome.used_fallback,
        attempts: outcome.attempts,
        fallback_reason: outcome.fallback_reason,
    })
}

/// Ids are compared exactly as given; a blank id is rejected.
fn check_activity_ids(activities: &[ActivityRecord]) -> Result<(), StitchError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(activities.len());
    for (position, activity) in activities.iter().enumerate() {
        if activity.id.trim().is_empty() {
            return Err(StitchError::EmptyActivityId(position));
        }
        if !seen.insert(activity.id.as_str()) {
            return Err(StitchError::DuplicateActivity(activity.id.clone()));
        }
    }
    Ok(())
}
