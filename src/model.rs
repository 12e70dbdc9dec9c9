use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use time::format_description::{self, FormatItem};
use time::{Date, OffsetDateTime};

static DATE_KEY_FORMAT: Lazy<Vec<FormatItem<'static>>> = Lazy::new(|| {
    format_description::parse("[year]-[month]-[day]").expect("valid date format description")
});

/// Canonical `YYYY-MM-DD` key for a calendar day, used to scope drafts
/// and backend calls.
pub fn date_key(date: Date) -> String {
    date.format(&*DATE_KEY_FORMAT).unwrap_or_else(|_| {
        format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month() as u8,
            date.day()
        )
    })
}

pub fn parse_date_key(input: &str) -> Option<Date> {
    Date::parse(input, &*DATE_KEY_FORMAT).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    Task,
    Note,
    Event,
    Question,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    None,
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::None
    }
}

/// One journal entry as the backend hands it to the view layers. The
/// document core never parses these out of text itself; they arrive
/// pre-structured and are only scored, flattened and correlated here.
#[derive(Debug, Clone)]
pub struct Entry {
    pub entity_id: String,
    pub content: String,
    pub kind: EntryKind,
    pub priority: Priority,
    pub logged_at: OffsetDateTime,
    pub scheduled_for: Option<OffsetDateTime>,
    pub migration_count: u32,
    pub children: Vec<Entry>,
}

/// Correlation between a backend entry and the document line it occupied
/// at load time. Only used to recognise lines that disappear on edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMapping {
    pub entity_id: String,
    pub content: String,
    pub full_line: String,
}

/// An entry the user removed from the document view, pending save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedEntry {
    pub entity_id: String,
    pub content: String,
}
