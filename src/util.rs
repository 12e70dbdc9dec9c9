use time::Date;
use unicode_width::UnicodeWidthStr;

use crate::model::Entry;

/// Depth-first flattening of an entry tree, parents before children.
pub fn flatten_entries(entries: &[Entry]) -> Vec<&Entry> {
    let mut flat = Vec::new();
    for entry in entries {
        push_entry(entry, &mut flat);
    }
    flat
}

fn push_entry<'a>(entry: &'a Entry, flat: &mut Vec<&'a Entry>) {
    flat.push(entry);
    for child in &entry.children {
        push_entry(child, flat);
    }
}

/// ISO week bucket key (`2026-W35`) used to group dates in weekly views.
pub fn week_key(date: Date) -> String {
    let (year, week, _) = date.to_iso_week_date();
    format!("{year}-W{week:02}")
}

/// Display width of the widest label, for sizing a context menu.
pub fn menu_width(labels: &[&str]) -> usize {
    labels
        .iter()
        .map(|label| UnicodeWidthStr::width(*label))
        .max()
        .unwrap_or(0)
}

/// Clamps a menu anchored at (`x`, `y`) so the whole menu stays inside
/// the viewport. A menu larger than the viewport pins to the origin.
pub fn clamp_menu_position(
    x: usize,
    y: usize,
    menu_width: usize,
    menu_height: usize,
    viewport_width: usize,
    viewport_height: usize,
) -> (usize, usize) {
    let max_x = viewport_width.saturating_sub(menu_width);
    let max_y = viewport_height.saturating_sub(menu_height);
    (x.min(max_x), y.min(max_y))
}

/// Adjusts a scroll offset so `target` is visible in a viewport of
/// `viewport_rows` rows; an already-visible target leaves it unchanged.
pub fn scroll_offset_for(target: usize, viewport_rows: usize, current_offset: usize) -> usize {
    if viewport_rows == 0 {
        return current_offset;
    }
    if target < current_offset {
        target
    } else if target >= current_offset + viewport_rows {
        target + 1 - viewport_rows
    } else {
        current_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntryKind, Priority};
    use time::macros::{date, datetime};

    fn entry(id: &str, children: Vec<Entry>) -> Entry {
        Entry {
            entity_id: id.to_string(),
            content: id.to_string(),
            kind: EntryKind::Task,
            priority: Priority::None,
            logged_at: datetime!(2026-08-29 12:00 UTC),
            scheduled_for: None,
            migration_count: 0,
            children,
        }
    }

    #[test]
    fn flatten_walks_depth_first() {
        let tree = vec![
            entry("a", vec![entry("a1", vec![entry("a1x", vec![])]), entry("a2", vec![])]),
            entry("b", vec![]),
        ];
        let ids: Vec<&str> = flatten_entries(&tree)
            .iter()
            .map(|e| e.entity_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "a1", "a1x", "a2", "b"]);
    }

    #[test]
    fn week_key_pads_single_digit_weeks() {
        assert_eq!(week_key(date!(2026 - 01 - 07)), "2026-W02");
        assert_eq!(week_key(date!(2026 - 08 - 29)), "2026-W35");
    }

    #[test]
    fn week_key_uses_iso_year_at_boundaries() {
        // 2027-01-01 falls in ISO week 53 of 2026.
        assert_eq!(week_key(date!(2027 - 01 - 01)), "2026-W53");
    }

    #[test]
    fn menu_width_measures_display_columns() {
        assert_eq!(menu_width(&["Edit", "Migrate entry"]), 13);
        assert_eq!(menu_width(&[]), 0);
    }

    #[test]
    fn menu_position_is_clamped_to_viewport() {
        assert_eq!(clamp_menu_position(90, 40, 20, 8, 100, 45), (80, 37));
        assert_eq!(clamp_menu_position(5, 5, 20, 8, 100, 45), (5, 5));
        // Oversized menu pins to the origin.
        assert_eq!(clamp_menu_position(10, 10, 200, 80, 100, 45), (0, 0));
    }

    #[test]
    fn scroll_offset_keeps_target_visible() {
        assert_eq!(scroll_offset_for(3, 10, 0), 0); // already visible
        assert_eq!(scroll_offset_for(15, 10, 0), 6); // below viewport
        assert_eq!(scroll_offset_for(2, 10, 6), 2); // above viewport
        assert_eq!(scroll_offset_for(4, 0, 6), 6); // degenerate viewport
    }
}
