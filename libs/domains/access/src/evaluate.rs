use crate::expression::{AccessExpression, AccessMode, AccessRule, Validity};
use crate::permissions::{EventPermissions, GlobalPermissions};
use std::collections::HashMap;

/// The attributes of an authenticated caller relevant to authorization,
/// as carried in verified token claims.
#[derive(Debug, Clone, Default)]
pub struct Subject {
    pub handle: String,
    pub on_site: bool,
    pub positions: Vec<String>,
    pub teams: Vec<String>,
    /// Position the subject is currently on duty in, when known.
    pub on_duty_position: Option<String>,
}

impl Subject {
    fn matches(&self, expression: &AccessExpression) -> bool {
        match expression {
            AccessExpression::Wildcard => true,
            AccessExpression::Person(handle) => self.handle == *handle,
            AccessExpression::Position(name) => self.positions.iter().any(|p| p == name),
            AccessExpression::Team(name) => self.teams.iter().any(|t| t == name),
            AccessExpression::OnDuty(position) => {
                self.on_duty_position.as_deref() == Some(position.as_str())
            }
        }
    }

    fn satisfies(&self, validity: Validity) -> bool {
        match validity {
            Validity::Always => true,
            Validity::OnSite => self.on_site,
        }
    }
}

fn mode_bundle(mode: AccessMode) -> EventPermissions {
    match mode {
        AccessMode::Read => EventPermissions::READER,
        AccessMode::Write => EventPermissions::WRITER,
        AccessMode::Report => EventPermissions::REPORTER,
        AccessMode::ReadStays => EventPermissions::READ_STAYS,
        AccessMode::WriteStays => EventPermissions::WRITE_STAYS,
    }
}

/// Compute the per-event permission mask for one event's rules.
///
/// Pure: the result depends only on the arguments.
pub fn evaluate_event(subject: &Subject, rules: &[AccessRule]) -> EventPermissions {
    let mut mask = EventPermissions::NONE;
    for rule in rules {
        if subject.matches(&rule.expression) && subject.satisfies(rule.validity) {
            mask |= mode_bundle(rule.mode);
        }
    }
    mask
}

/// Compute global and per-event permissions for a subject.
///
/// `rules_by_event` holds the stored access rules for every event the caller
/// asked about; `admins` is the configured administrator handle list.
pub fn evaluate(
    subject: &Subject,
    admins: &[String],
    rules_by_event: &HashMap<String, Vec<AccessRule>>,
) -> (GlobalPermissions, HashMap<String, EventPermissions>) {
    let mut global = GlobalPermissions::NONE;
    if !subject.handle.is_empty() {
        global |= GlobalPermissions::ANY_AUTHENTICATED;
        if admins.iter().any(|a| a == &subject.handle) {
            global |= GlobalPermissions::ADMINISTRATOR;
        }
    }

    let per_event = rules_by_event
        .iter()
        .map(|(event, rules)| (event.clone(), evaluate_event(subject, rules)))
        .collect();

    (global, per_event)
}
