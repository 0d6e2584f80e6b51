use std::collections::BTreeSet;

use serde_json::Value;

/// Keys probed, in order, when a person is given as an object.
const PERSON_OBJECT_KEYS: &[&str] = &["login", "email", "username", "name", "id"];

/// Lowercase, trim and drop a leading `@`. Empty input yields `None`.
pub fn normalize_identity(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('@').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Collect normalized people from `fields` of `payload`, minus `self_ids`.
///
/// Non-object payloads and unexpected value types contribute nothing.
/// The result is sorted and deduplicated.
pub fn collect_people(
    payload: &Value,
    fields: &[&str],
    self_ids: &BTreeSet<String>,
) -> Vec<String> {
    let Some(object) = payload.as_object() else {
        return Vec::new();
    };

    let mut raw = Vec::new();
    for field in fields {
        if let Some(value) = object.get(*field) {
            person_ids(value, &mut raw);
        }
    }

    raw.iter()
        .filter_map(|id| normalize_identity(id))
        .filter(|id| !self_ids.contains(id))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn person_ids(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(id) => out.push(id.clone()),
        Value::Array(items) => {
            for item in items {
                person_ids(item, out);
            }
        }
        Value::Object(map) => {
            let id = PERSON_OBJECT_KEYS
                .iter()
                .find_map(|key| match map.get(*key) {
                    Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                });
            if let Some(id) = id {
                out.push(id);
            }
        }
        _ => {}
    }
}
