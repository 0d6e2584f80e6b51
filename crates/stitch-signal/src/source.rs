use serde::Serialize;

/// Closed set of tools the extractor knows how to read.
///
/// Anything else is handled by [`Source::Generic`], which only probes a fixed
/// list of people-like fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Source {
    GitHub,
    GitLab,
    Jira,
    Linear,
    Slack,
    Documents,
    Calendar,
    Generic,
}

impl Source {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "github" | "gh" => Self::GitHub,
            "gitlab" => Self::GitLab,
            "jira" => Self::Jira,
            "linear" => Self::Linear,
            "slack" => Self::Slack,
            "google_drive" | "gdrive" | "gdocs" | "google_docs" | "notion" | "confluence" => {
                Self::Documents
            }
            "google_calendar" | "gcal" | "calendar" | "outlook_calendar" => Self::Calendar,
            _ => Self::Generic,
        }
    }

    /// Payload fields holding person identifiers for this source.
    pub fn people_fields(&self) -> &'static [&'static str] {
        match self {
            Self::GitHub | Self::GitLab => &[
                "author",
                "user",
                "reviewers",
                "requested_reviewers",
                "assignees",
                "assignee",
                "mentions",
                "commenters",
            ],
            Self::Jira => &["reporter", "assignee", "watchers", "creator", "mentions"],
            Self::Linear => &["creator", "assignee", "subscribers", "mentions"],
            Self::Slack => &["user", "author", "mentions", "participants", "reply_users"],
            Self::Documents => &[
                "owners",
                "owner",
                "last_modifying_user",
                "editors",
                "commenters",
                "mentions",
            ],
            Self::Calendar => &["organizer", "attendees", "creator"],
            Self::Generic => GENERIC_PEOPLE_FIELDS,
        }
    }
}

const GENERIC_PEOPLE_FIELDS: &[&str] = &[
    "author",
    "user",
    "owner",
    "creator",
    "assignee",
    "reporter",
    "participants",
    "attendees",
    "members",
    "mentions",
];
