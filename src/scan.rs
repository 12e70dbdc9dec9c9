use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a migrate (`>`) or move-to-list (`^`) line: the symbol must be
/// the first non-space character and must be followed by at least one
/// space and some content. Mid-line symbols never match.
static SPECIAL_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([>^])\s+(\S.*)$").expect("valid special-line pattern"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub migrated_entries: Vec<String>,
    pub moved_to_list_entries: Vec<String>,
}

impl ScanReport {
    pub fn has_special_entries(&self) -> bool {
        !self.migrated_entries.is_empty() || !self.moved_to_list_entries.is_empty()
    }
}

/// Classifies every line of `document` independently; blank lines are
/// skipped, child indentation is ignored (a nested line is special only
/// by its own leading symbol).
pub fn scan(document: &str) -> ScanReport {
    let mut report = ScanReport::default();
    for line in document.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(caps) = SPECIAL_LINE.captures(trimmed) {
            let content = caps[2].trim().to_string();
            match &caps[1] {
                ">" => report.migrated_entries.push(content),
                "^" => report.moved_to_list_entries.push(content),
                _ => unreachable!("pattern captures only > or ^"),
            }
        }
    }
    report
}

/// Reports special entries in `current` not accounted for by `baseline`,
/// matching by exact trimmed content with count-based duplicate
/// resolution: a content string present once in the baseline absorbs
/// exactly one occurrence in the current document.
pub fn scan_new(current: &str, baseline: &str) -> ScanReport {
    let current_report = scan(current);
    let baseline_report = scan(baseline);
    ScanReport {
        migrated_entries: subtract_counts(
            current_report.migrated_entries,
            &baseline_report.migrated_entries,
        ),
        moved_to_list_entries: subtract_counts(
            current_report.moved_to_list_entries,
            &baseline_report.moved_to_list_entries,
        ),
    }
}

fn subtract_counts(current: Vec<String>, baseline: &[String]) -> Vec<String> {
    let mut budget: HashMap<&str, usize> = HashMap::new();
    for content in baseline {
        *budget.entry(content.as_str()).or_insert(0) += 1;
    }
    let mut new_entries = Vec::new();
    for content in current {
        match budget.get_mut(content.as_str()) {
            Some(remaining) if *remaining > 0 => *remaining -= 1,
            _ => new_entries.push(content),
        }
    }
    new_entries
}
