use stitch_core::{ActivitySignal, Placement};
use stitch_engine::ClusteringReport;

pub(crate) fn render_clustering(report: &ClusteringReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("run {}\n", report.run_id));
    out.push_str(&format!(
        "activities: {}  edges: {}  resolved: {}  candidates: {}\n",
        report.stats.activities,
        report.stats.edges,
        report.resolved.len(),
        report.candidates.len()
    ));

    let refinement = if report.refinement_skipped {
        "skipped".to_string()
    } else if report.used_fallback {
        match &report.fallback_reason {
            Some(reason) => format!("fallback after {} attempt(s): {reason}", report.attempts),
            None => format!("fallback after {} attempt(s)", report.attempts),
        }
    } else {
        format!(
            "accepted after {} attempt(s), {} submitted, {} cluster summaries",
            report.attempts, report.submitted, report.summaries
        )
    };
    out.push_str(&format!("refinement: {refinement}\n"));

    for (placement, members) in report.partition.groups() {
        out.push_str(&format!("{placement}: {}\n", members.join(", ")));
    }
    let orphans = report.partition.orphans();
    if !orphans.is_empty() {
        out.push_str(&format!("{}: {}\n", Placement::Orphan, orphans.join(", ")));
    }
    out
}

pub(crate) fn render_signals(signals: &[ActivitySignal], components: &[Vec<String>]) -> String {
    let mut out = String::new();
    for signal in signals {
        out.push_str(&format!(
            "{} [{}] {}\n",
            signal.id,
            signal.source,
            signal.timestamp.format("%Y-%m-%d")
        ));
        out.push_str(&format!("  refs:          {}\n", list(&signal.refs)));
        out.push_str(&format!("  collaborators: {}\n", list(&signal.collaborators)));
        out.push_str(&format!(
            "  container:     {}\n",
            signal.container.as_deref().unwrap_or("-")
        ));
        out.push_str(&format!("  keywords:      {}\n", list(&signal.keywords)));
    }
    for (index, members) in components.iter().enumerate() {
        out.push_str(&format!("component #{index}: {}\n", members.join(", ")));
    }
    out
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_render_clustering_store_fallback() {
        let mut partition = stitch_core::FinalPartition::new();
        partition.place("gh-1", Placement::Orphan);
        let report = ClusteringReport {
            run_id: "01HZX".into(),
            partition,
            resolved: vec![],
            candidates: vec![],
            submitted: 0,
            summaries: 0,
            stats: stitch_graph::GraphStats::default(),
            refinement_skipped: false,
            used_fallback: true,
            attempts: 0,
            fallback_reason: Some(stitch_refine::FallbackReason::ClusterStore(
                "permission denied".into(),
            )),
        };
        let text = render_clustering(&report);
        assert!(text.starts_with("run 01HZX\n"));
        assert!(text.contains(
            "refinement: fallback after 0 attempt(s): cluster store unavailable: permission denied\n"
        ));
        assert!(text.ends_with("orphan: gh-1\n"));
    }

    #[test]
    fn test_render_signals() {
        let signal = ActivitySignal {
            id: "gh-1".into(),
            source: "github".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 4, 2, 8, 0, 0).unwrap(),
            title: "Cache warmup".into(),
            refs: vec![],
            collaborators: vec!["bob".into()],
            container: Some("branch:feature/warmup".into()),
            keywords: vec!["cache".into(), "warmup".into()],
            parent_id: None,
            current_cluster_id: None,
        };
        let text = render_signals(&[signal], &[vec!["gh-1".into()]]);
        assert!(text.contains("gh-1 [github] 2024-04-02"));
        assert!(text.contains("refs:          -"));
        assert!(text.contains("container:     branch:feature/warmup"));
        assert!(text.contains("component #0: gh-1"));
    }
}
