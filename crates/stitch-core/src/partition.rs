use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where one activity ends up after a clustering run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Placement {
    /// Member of the n-th resolved heuristic component.
    Component(usize),
    /// Filed under a cluster that already exists in the store.
    Existing(String),
    /// Member of a cluster to be created under this name.
    New(String),
    /// Left for the external orphan-handling policy.
    Orphan,
}

/// The partition handed to the persistence layer.
///
/// Every activity of the run has exactly one placement; the map keys are the
/// activity ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalPartition {
    placements: BTreeMap<String, Placement>,
}

impl FinalPartition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the placement of an activity.
    pub fn place(&mut self, activity_id: impl Into<String>, placement: Placement) {
        self.placements.insert(activity_id.into(), placement);
    }

    pub fn placement(&self, activity_id: &str) -> Option<&Placement> {
        self.placements.get(activity_id)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Placement)> {
        self.placements.iter().map(|(id, p)| (id.as_str(), p))
    }

    /// Non-orphan placements grouped by destination, members sorted by id.
    pub fn groups(&self) -> BTreeMap<Placement, Vec<String>> {
        let mut groups: BTreeMap<Placement, Vec<String>> = BTreeMap::new();
        for (id, placement) in &self.placements {
            if matches!(placement, Placement::Orphan) {
                continue;
            }
            groups.entry(placement.clone()).or_default().push(id.clone());
        }
        groups
    }

    pub fn orphans(&self) -> Vec<&str> {
        self.placements
            .iter()
            .filter(|(_, p)| matches!(p, Placement::Orphan))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Names of clusters the persistence layer has to create.
    pub fn new_cluster_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .placements
            .values()
            .filter_map(|p| match p {
                Placement::New(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Component(index) => write!(f, "component #{index}"),
            Self::Existing(id) => write!(f, "cluster {id}"),
            Self::New(name) => write!(f, "new cluster \"{name}\""),
            Self::Orphan => write!(f, "orphan"),
        }
    }
}
