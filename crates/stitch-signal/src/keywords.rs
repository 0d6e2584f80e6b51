use std::collections::HashSet;

/// English filler plus words that show up in almost every engineering title.
const STOP_WORDS: &[&str] = &[
    // English
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "in",
    "into", "is", "it", "its", "not", "of", "on", "or", "our", "that", "the", "their", "then",
    "this", "to", "was", "were", "will", "with", "via", "when", "after", "before", "about",
    "all", "any", "can", "out", "new", "more", "some", "also", "just", "should", "would", "could",
    "re", "fwd", "fw",
    // developer noise
    "fix", "fixes", "fixed", "add", "adds", "added", "update", "updates", "updated", "merge",
    "merged", "chore", "bump", "refactor", "wip", "draft", "revert", "cleanup", "minor", "tweak",
    "misc", "remove", "removed", "change", "changes", "changed", "use", "make", "pull",
    "request", "branch", "feat", "feature", "docs", "test", "tests", "todo", "meeting", "sync",
];

/// Lowercased, punctuation-free title tokens with stop words and short tokens removed.
///
/// Order follows first occurrence; duplicates are dropped.
pub fn extract_keywords(title: &str, min_len: usize) -> Vec<String> {
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let mut seen = HashSet::new();
    title
        .split(|ch: char| !ch.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() >= min_len)
        .filter(|token| !stop.contains(token.as_str()))
        .filter(|token| seen.insert(token.clone()))
        .collect()
}
