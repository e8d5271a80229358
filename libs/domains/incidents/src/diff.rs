//! Diff primitives shared by the entity update paths.
//!
//! Each changed field contributes one human-readable line; the lines are
//! joined into the text of a single generated report entry per update.

use std::collections::BTreeSet;
use std::fmt::Display;

/// Accumulates the audit lines for one update transaction.
#[derive(Debug, Default)]
pub struct ChangeLog {
    lines: Vec<String>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    /// The generated entry text: lines joined with newlines.
    pub fn into_text(self) -> String {
        self.lines.join("\n")
    }

    /// Record a scalar change as `Changed <field>: <value>`. Cleared values
    /// render as an empty tail.
    pub fn changed<T: Display>(&mut self, field: &str, value: Option<&T>) {
        match value {
            Some(v) => self.push(format!("Changed {}: {}", field, v)),
            None => self.push(format!("Changed {}: ", field)),
        }
    }
}

/// `desired − current` and `current − desired` for a set-valued association.
pub fn set_diff<T: Ord + Clone>(current: &[T], desired: &[T]) -> (Vec<T>, Vec<T>) {
    let current: BTreeSet<&T> = current.iter().collect();
    let desired: BTreeSet<&T> = desired.iter().collect();
    let add = desired.difference(&current).map(|v| (*v).clone()).collect();
    let remove = current.difference(&desired).map(|v| (*v).clone()).collect();
    (add, remove)
}

/// Apply one `Option`-wired scalar to a column value, recording the change.
/// `None` leaves the current value; empty text clears the column.
pub fn apply_text(
    log: &mut ChangeLog,
    field: &str,
    current: &Option<String>,
    incoming: &Option<String>,
) -> Option<String> {
    match incoming {
        None => current.clone(),
        Some(new) => {
            let new = if new.is_empty() {
                None
            } else {
                Some(new.clone())
            };
            if new != *current {
                log.changed(field, new.as_ref());
            }
            new
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_diff_computes_add_and_remove() {
        let current = vec!["Hardware".to_string(), "Tulsa".to_string()];
        let desired = vec!["Tulsa".to_string(), "Moonbeam".to_string()];
        let (add, remove) = set_diff(&current, &desired);
        assert_eq!(add, vec!["Moonbeam"]);
        assert_eq!(remove, vec!["Hardware"]);
    }

    #[test]
    fn apply_text_distinguishes_leave_clear_and_set() {
        let current = Some("old".to_string());

        let mut log = ChangeLog::new();
        assert_eq!(apply_text(&mut log, "summary", &current, &None), current);
        assert!(log.is_empty());

        let mut log = ChangeLog::new();
        let cleared = apply_text(&mut log, "summary", &current, &Some(String::new()));
        assert_eq!(cleared, None);
        assert_eq!(log.into_text(), "Changed summary: ");

        let mut log = ChangeLog::new();
        let set = apply_text(&mut log, "summary", &current, &Some("new".to_string()));
        assert_eq!(set.as_deref(), Some("new"));
        assert_eq!(log.into_text(), "Changed summary: new");
    }

    #[test]
    fn unchanged_value_logs_nothing() {
        let current = Some("same".to_string());
        let mut log = ChangeLog::new();
        apply_text(&mut log, "summary", &current, &Some("same".to_string()));
        assert!(log.is_empty());
    }
}
