//! Signal extraction: tool-specific activity records to uniform clustering signals.
//!
//! Extraction is pure and never fails. Unknown sources and malformed payloads
//! degrade to empty signal fields.

pub mod container;
pub mod keywords;
pub mod people;
pub mod source;

use std::collections::BTreeSet;

use stitch_config::ClusteringConfig;
use stitch_core::{ActivityRecord, ActivitySignal};
use tracing::trace;

pub use container::is_long_lived_branch;
pub use keywords::extract_keywords;
pub use people::normalize_identity;
pub use source::Source;

/// Extracts signals on behalf of one acting user.
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    self_ids: BTreeSet<String>,
    min_keyword_len: usize,
}

impl SignalExtractor {
    pub fn new<I, S>(self_identities: I, config: &ClusteringConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            self_ids: self_identities
                .into_iter()
                .filter_map(|id| normalize_identity(id.as_ref()))
                .collect(),
            min_keyword_len: config.min_keyword_len,
        }
    }

    pub fn extract(&self, activity: &ActivityRecord) -> ActivitySignal {
        let source = Source::from_tag(&activity.source);
        let collaborators =
            people::collect_people(&activity.raw, source.people_fields(), &self.self_ids);
        let container = container::container_for(source, &activity.raw);
        let keywords = extract_keywords(&activity.title, self.min_keyword_len);

        trace!(
            id = %activity.id,
            ?source,
            collaborators = collaborators.len(),
            container = container.as_deref().unwrap_or("-"),
            "extracted signal"
        );

        ActivitySignal {
            id: activity.id.clone(),
            source: activity.source.clone(),
            timestamp: activity.timestamp,
            title: activity.title.clone(),
            refs: clean_refs(&activity.refs),
            collaborators,
            container,
            keywords,
            parent_id: activity
                .parent_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(ToOwned::to_owned),
            current_cluster_id: activity.current_cluster_id.clone(),
        }
    }

    pub fn extract_all(&self, activities: &[ActivityRecord]) -> Vec<ActivitySignal> {
        activities.iter().map(|a| self.extract(a)).collect()
    }
}

/// Extract with default thresholds for a single self identity.
pub fn extract(activity: &ActivityRecord, self_identity: &str) -> ActivitySignal {
    SignalExtractor::new([self_identity], &ClusteringConfig::default()).extract(activity)
}

fn clean_refs(refs: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    refs.iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .filter(|r| seen.insert(r.to_string()))
        .map(ToOwned::to_owned)
        .collect()
}
