use std::collections::HashSet;

use chrono::TimeDelta;
use serde::Serialize;
use stitch_config::ClusteringConfig;
use stitch_core::ActivitySignal;

/// Why two activities are connected. Variants are ordered strongest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    ExplicitRef,
    Containment,
    Container,
    Collaborator,
    Lexical,
}

impl EdgeKind {
    /// Strong edges resolve clusters on their own; lexical ones only nominate candidates.
    pub fn is_strong(&self) -> bool {
        !matches!(self, Self::Lexical)
    }
}

/// Per-activity lookup sets, built once so pairwise checks stay cheap.
pub(crate) struct EdgeFeatures<'a> {
    refs: HashSet<&'a str>,
    collaborators: HashSet<&'a str>,
    keywords: HashSet<&'a str>,
}

impl<'a> EdgeFeatures<'a> {
    pub(crate) fn new(signal: &'a ActivitySignal) -> Self {
        Self {
            refs: signal.refs.iter().map(String::as_str).collect(),
            collaborators: signal.collaborators.iter().map(String::as_str).collect(),
            keywords: signal.keywords.iter().map(String::as_str).collect(),
        }
    }
}

/// Strongest edge rule matching the pair, if any.
pub(crate) fn classify(
    a: (&ActivitySignal, &EdgeFeatures<'_>),
    b: (&ActivitySignal, &EdgeFeatures<'_>),
    config: &ClusteringConfig,
) -> Option<EdgeKind> {
    let (sa, fa) = a;
    let (sb, fb) = b;

    if !fa.refs.is_disjoint(&fb.refs) {
        return Some(EdgeKind::ExplicitRef);
    }
    if contains(sa, sb) {
        return Some(EdgeKind::Containment);
    }
    if sa.container.is_some() && sa.container == sb.container {
        return Some(EdgeKind::Container);
    }

    let gap = (sa.timestamp - sb.timestamp).abs();
    if within(gap, config.collaborator_window_days)
        && fa.collaborators.intersection(&fb.collaborators).count()
            >= config.min_shared_collaborators
    {
        return Some(EdgeKind::Collaborator);
    }
    if within(gap, config.lexical_window_days)
        && fa.keywords.intersection(&fb.keywords).count() >= config.min_shared_keywords
    {
        return Some(EdgeKind::Lexical);
    }
    None
}

/// Windows too large for a `TimeDelta` match nothing.
fn within(gap: TimeDelta, window_days: i64) -> bool {
    TimeDelta::try_days(window_days).is_some_and(|window| gap <= window)
}

/// Strict membership only: parent/child, or siblings under the same parent.
fn contains(a: &ActivitySignal, b: &ActivitySignal) -> bool {
    match (a.parent_id.as_deref(), b.parent_id.as_deref()) {
        (Some(pa), Some(pb)) if pa == pb => true,
        (pa, pb) => pa == Some(b.id.as_str()) || pb == Some(a.id.as_str()),
    }
}
