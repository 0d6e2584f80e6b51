use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;
use stitch_core::{Assignment, AssignmentAction, Candidate, ClusterSummary};
use thiserror::Error;

/// Why a refinement response was rejected. Every variant counts toward the retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("response is not a JSON object: {0}")]
    Malformed(String),

    #[error("duplicate key '{0}' in response")]
    DuplicateKey(String),

    #[error("response is missing candidate ids: {}", .0.join(", "))]
    MissingIds(Vec<String>),

    #[error("response contains unexpected ids: {}", .0.join(", "))]
    UnexpectedIds(Vec<String>),

    #[error("value for '{activity_id}' is not a string")]
    NotAString { activity_id: String },

    #[error("value for '{activity_id}' is not KEEP:, MOVE: or NEW:, got '{value}'")]
    BadAction { activity_id: String, value: String },

    #[error("KEEP for '{activity_id}' names unknown cluster '{target}'")]
    KeepUnknownCluster { activity_id: String, target: String },

    #[error("KEEP for '{activity_id}' names '{target}' but the activity is not in it")]
    KeepNotCurrent { activity_id: String, target: String },

    #[error("MOVE for '{activity_id}' names unknown cluster '{target}'")]
    MoveUnknownCluster { activity_id: String, target: String },

    #[error("MOVE for '{activity_id}' targets its current cluster '{target}'")]
    MoveToCurrent { activity_id: String, target: String },

    #[error("NEW for '{activity_id}' has an empty name")]
    EmptyNewName { activity_id: String },
}

/// Validate a raw response against the submitted candidates and cluster summaries.
///
/// Rules run in a fixed order and the first failure is reported: well-formed
/// object, no duplicate key, exact id set, action grammar, then the KEEP, MOVE
/// and NEW target checks. On success every candidate has exactly one assignment.
pub fn validate_response(
    raw: &str,
    candidates: &[Candidate],
    summaries: &[ClusterSummary],
) -> Result<BTreeMap<String, Assignment>, ValidationError> {
    let body = strip_code_fence(raw);
    let entries = serde_json::from_str::<OrderedEntries>(body)
        .map_err(|e| ValidationError::Malformed(e.to_string()))?
        .0;

    let mut seen: HashSet<&str> = HashSet::with_capacity(entries.len());
    for (key, _) in &entries {
        if !seen.insert(key.as_str()) {
            return Err(ValidationError::DuplicateKey(key.clone()));
        }
    }

    let current: HashMap<&str, Option<&str>> = candidates
        .iter()
        .map(|c| (c.activity_id.as_str(), c.current_cluster_id.as_deref()))
        .collect();

    let missing: Vec<String> = candidates
        .iter()
        .filter(|c| !seen.contains(c.activity_id.as_str()))
        .map(|c| c.activity_id.clone())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingIds(missing));
    }
    let unexpected: Vec<String> = entries
        .iter()
        .filter(|(key, _)| !current.contains_key(key.as_str()))
        .map(|(key, _)| key.clone())
        .collect();
    if !unexpected.is_empty() {
        return Err(ValidationError::UnexpectedIds(unexpected));
    }

    let known: HashSet<&str> = summaries.iter().map(|s| s.id.as_str()).collect();
    let mut assignments = BTreeMap::new();
    for (activity_id, value) in &entries {
        let text = value
            .as_str()
            .ok_or_else(|| ValidationError::NotAString {
                activity_id: activity_id.clone(),
            })?;
        let (action, target) =
            parse_action(text).ok_or_else(|| ValidationError::BadAction {
                activity_id: activity_id.clone(),
                value: text.to_string(),
            })?;
        let current_cluster = current.get(activity_id.as_str()).copied().flatten();

        match action {
            AssignmentAction::Keep => {
                if !known.contains(target) {
                    return Err(ValidationError::KeepUnknownCluster {
                        activity_id: activity_id.clone(),
                        target: target.to_string(),
                    });
                }
                if current_cluster != Some(target) {
                    return Err(ValidationError::KeepNotCurrent {
                        activity_id: activity_id.clone(),
                        target: target.to_string(),
                    });
                }
            }
            AssignmentAction::Move => {
                if !known.contains(target) {
                    return Err(ValidationError::MoveUnknownCluster {
                        activity_id: activity_id.clone(),
                        target: target.to_string(),
                    });
                }
                if current_cluster == Some(target) {
                    return Err(ValidationError::MoveToCurrent {
                        activity_id: activity_id.clone(),
                        target: target.to_string(),
                    });
                }
            }
            AssignmentAction::New => {
                if target.is_empty() {
                    return Err(ValidationError::EmptyNewName {
                        activity_id: activity_id.clone(),
                    });
                }
            }
        }

        assignments.insert(
            activity_id.clone(),
            Assignment {
                activity_id: activity_id.clone(),
                action,
                target: target.to_string(),
            },
        );
    }

    Ok(assignments)
}

/// Split `ACTION:target`. The target is trimmed; KEEP and MOVE need a non-empty one.
fn parse_action(value: &str) -> Option<(AssignmentAction, &str)> {
    let (action, target) = value.trim().split_once(':')?;
    let target = target.trim();
    let action = match action {
        "KEEP" => AssignmentAction::Keep,
        "MOVE" => AssignmentAction::Move,
        "NEW" => return Some((AssignmentAction::New, target)),
        _ => return None,
    };
    (!target.is_empty()).then_some((action, target))
}

/// Drop a surrounding Markdown code fence (```` ```json ... ``` ````), if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Top-level object entries in document order, duplicates included.
///
/// Parsing straight into a map would silently keep only the last duplicate.
struct OrderedEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object of activity id to action")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
