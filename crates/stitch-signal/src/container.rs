//! Working-context tokens: feature branches, threads, epics, folders.
//!
//! A container is only emitted when the context is narrow enough to mean
//! "one effort". Default branches, channels and drive roots never qualify.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::source::Source;

const LONG_LIVED_BRANCHES: &[&str] = &[
    "main",
    "master",
    "develop",
    "development",
    "dev",
    "trunk",
    "staging",
    "production",
    "gh-pages",
];

fn release_branch_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(?:release|releases|hotfix|hotfixes)(?:[/-].*)?$").ok())
        .as_ref()
}

/// Whether `branch` names a default or long-lived branch.
pub fn is_long_lived_branch(branch: &str) -> bool {
    let name = branch.trim().trim_start_matches("refs/heads/").to_lowercase();
    if LONG_LIVED_BRANCHES.contains(&name.as_str()) {
        return true;
    }
    release_branch_pattern().is_some_and(|re| re.is_match(&name))
}

pub fn container_for(source: Source, payload: &Value) -> Option<String> {
    match source {
        Source::GitHub | Source::GitLab => branch_container(payload),
        Source::Jira => first_text(payload, &["epic_key", "epic", "parent_epic"], &["key"])
            .map(|key| format!("epic:{}", key.to_uppercase())),
        Source::Linear => first_text(payload, &["project_id", "project"], &["id"])
            .map(|id| format!("project:{id}")),
        Source::Slack => thread_container(payload),
        Source::Documents => folder_container(payload),
        Source::Calendar | Source::Generic => None,
    }
}

fn branch_container(payload: &Value) -> Option<String> {
    let branch = first_text(
        payload,
        &["head_ref", "branch", "source_branch"],
        &["ref", "name"],
    )?;
    let branch = branch.trim_start_matches("refs/heads/").to_string();
    if is_long_lived_branch(&branch) {
        return None;
    }
    let same_as = |field: &str| {
        first_text(payload, &[field], &["ref", "name"])
            .is_some_and(|other| other.trim_start_matches("refs/heads/") == branch)
    };
    if same_as("default_branch") || same_as("base_ref") {
        return None;
    }

    match first_text(payload, &["repository", "repo"], &["full_name", "name"]) {
        Some(repo) => Some(format!("branch:{}:{branch}", repo.to_lowercase())),
        None => Some(format!("branch:{branch}")),
    }
}

fn thread_container(payload: &Value) -> Option<String> {
    let thread = first_text(payload, &["thread_ts", "thread_id"], &[])?;
    let channel = first_text(payload, &["channel", "channel_id"], &["id"]).unwrap_or_default();
    Some(format!("thread:{channel}:{thread}"))
}

fn folder_container(payload: &Value) -> Option<String> {
    let folder = first_text(payload, &["folder_path", "folder"], &["path", "name"]).or_else(|| {
        let path = first_text(payload, &["path"], &[])?;
        path.rsplit_once('/').map(|(parent, _)| parent.to_string())
    })?;
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        return None;
    }
    Some(format!("folder:{folder}"))
}

/// First non-empty string among `fields`; object values are probed with `object_keys`.
fn first_text(payload: &Value, fields: &[&str], object_keys: &[&str]) -> Option<String> {
    let object = payload.as_object()?;
    fields.iter().find_map(|field| match object.get(*field)? {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(inner) => object_keys.iter().find_map(|key| match inner.get(*key)? {
            Value::String(s) => non_empty(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }),
        _ => None,
    })
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
