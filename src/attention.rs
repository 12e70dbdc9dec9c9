use time::{Duration, OffsetDateTime};

use crate::model::{Entry, EntryKind, Priority};

const OVERDUE_POINTS: u32 = 50;
const PRIORITY_POINTS: u32 = 30;
const HIGH_PRIORITY_BONUS: u32 = 20;
const AGING_OLD_POINTS: u32 = 25;
const AGING_RECENT_POINTS: u32 = 15;
const AGING_OLD_DAYS: i64 = 7;
const AGING_RECENT_DAYS: i64 = 3;
const MIGRATION_POINTS_EACH: u32 = 15;
const URGENT_KEYWORD_POINTS: u32 = 20;
const QUESTION_POINTS: u32 = 10;
const EVENT_PARENT_POINTS: u32 = 5;

const URGENT_KEYWORDS: &[&str] = &["urgent", "asap", "critical", "deadline", "immediately"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttentionIndicator {
    Overdue,
    Priority,
    Aging,
    Migrated,
}

impl AttentionIndicator {
    pub fn as_str(self) -> &'static str {
        match self {
            AttentionIndicator::Overdue => "overdue",
            AttentionIndicator::Priority => "priority",
            AttentionIndicator::Aging => "aging",
            AttentionIndicator::Migrated => "migrated",
        }
    }
}

/// Derived urgency ranking for one entry. Recomputed on demand, never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttentionResult {
    pub score: u32,
    pub indicators: Vec<AttentionIndicator>,
    pub migration_count: Option<u32>,
    pub days_old: Option<i64>,
}

/// Additive heuristic score for sorting and highlighting. Each rule is
/// evaluated independently against `now`; indicators are recorded in
/// first-triggered order and are never duplicated.
pub fn score_entry(
    entry: &Entry,
    now: OffsetDateTime,
    parent_kind: Option<EntryKind>,
) -> AttentionResult {
    let mut result = AttentionResult::default();

    if let Some(scheduled) = entry.scheduled_for {
        if scheduled < now {
            result.score += OVERDUE_POINTS;
            result.indicators.push(AttentionIndicator::Overdue);
        }
    }

    if entry.priority != Priority::None {
        result.score += PRIORITY_POINTS;
        result.indicators.push(AttentionIndicator::Priority);
        if entry.priority == Priority::High {
            result.score += HIGH_PRIORITY_BONUS;
        }
    }

    let age_days = whole_days_between(entry.logged_at, now);
    if age_days > AGING_OLD_DAYS {
        result.score += AGING_OLD_POINTS;
        result.indicators.push(AttentionIndicator::Aging);
        result.days_old = Some(age_days);
    } else if age_days > AGING_RECENT_DAYS {
        result.score += AGING_RECENT_POINTS;
        result.indicators.push(AttentionIndicator::Aging);
        result.days_old = Some(age_days);
    }

    if entry.migration_count > 0 {
        result.score += MIGRATION_POINTS_EACH * entry.migration_count;
        result.indicators.push(AttentionIndicator::Migrated);
        result.migration_count = Some(entry.migration_count);
    }

    if contains_urgent_keyword(&entry.content) {
        result.score += URGENT_KEYWORD_POINTS;
    }

    if entry.kind == EntryKind::Question {
        result.score += QUESTION_POINTS;
    }

    if parent_kind == Some(EntryKind::Event) {
        result.score += EVENT_PARENT_POINTS;
    }

    result
}

fn whole_days_between(logged_at: OffsetDateTime, now: OffsetDateTime) -> i64 {
    let elapsed = now - logged_at;
    if elapsed < Duration::ZERO {
        0
    } else {
        elapsed.whole_days()
    }
}

fn contains_urgent_keyword(content: &str) -> bool {
    let lowered = content.to_lowercase();
    URGENT_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}
