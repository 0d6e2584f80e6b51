use std::collections::BTreeMap;

use stitch_core::{Assignment, AssignmentAction, Candidate, FinalPartition, Placement};
use stitch_graph::Component;
use tracing::debug;

/// Turn heuristic output plus validated assignments into the final partition.
///
/// Resolved members start in their component; weak candidates start in the
/// stored cluster they already belong to, or as orphans. Assignments then
/// override that placement: KEEP leaves it, MOVE files the activity under an
/// existing cluster, NEW under a new cluster keyed by its trimmed name.
pub fn apply(
    resolved: &[Component],
    weak: &[Candidate],
    assignments: &BTreeMap<String, Assignment>,
) -> FinalPartition {
    let mut partition = FinalPartition::new();

    for (index, component) in resolved.iter().enumerate() {
        for id in &component.activity_ids {
            partition.place(id.as_str(), Placement::Component(index));
        }
    }
    for candidate in weak {
        if partition.placement(&candidate.activity_id).is_some() {
            continue;
        }
        let placement = match &candidate.current_cluster_id {
            Some(cluster_id) => Placement::Existing(cluster_id.clone()),
            None => Placement::Orphan,
        };
        partition.place(candidate.activity_id.as_str(), placement);
    }

    let mut moved = 0usize;
    let mut created = 0usize;
    for (activity_id, assignment) in assignments {
        if partition.placement(activity_id).is_none() {
            debug!(%activity_id, "ignoring assignment for unknown activity");
            continue;
        }
        match assignment.action {
            AssignmentAction::Keep => {}
            AssignmentAction::Move => {
                partition.place(
                    activity_id.as_str(),
                    Placement::Existing(assignment.target.clone()),
                );
                moved += 1;
            }
            AssignmentAction::New => {
                partition.place(
                    activity_id.as_str(),
                    Placement::New(assignment.target.trim().to_string()),
                );
                created += 1;
            }
        }
    }

    debug!(
        placed = partition.len(),
        moved,
        created,
        "applied refinement assignments"
    );
    partition
}
