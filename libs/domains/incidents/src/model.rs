//! Wire types.
//!
//! Read types serialize the full entity with RFC 3339 instants. Update types
//! are diff-shaped: `None` means "leave as is", an explicit empty value means
//! "clear". Numeric fields arrive as numbers or strings, so radial values and
//! similar use [`NumberOrText`].

use crate::error::{DomainError, DomainResult};
use crate::time::seconds_to_rfc3339;
use ims_store::rows::{
    FieldReportRow, IncidentRow, ReportEntryRow, StayRangerRow, StayRow,
};
use serde::{Deserialize, Serialize};

/// Incident state values the server recognizes. No transition machine: any
/// recognized value is persisted as supplied.
pub const INCIDENT_STATES: [&str; 5] = ["new", "on_hold", "dispatched", "on_scene", "closed"];

/// Incident priority values.
pub const INCIDENT_PRIORITIES: [i32; 3] = [1, 3, 5];

pub const DEFAULT_STATE: &str = "new";
pub const DEFAULT_PRIORITY: i32 = 3;

pub fn validate_state(state: &str) -> DomainResult<()> {
    if INCIDENT_STATES.contains(&state) {
        Ok(())
    } else {
        Err(DomainError::InvalidValue(format!(
            "unknown incident state '{}'",
            state
        )))
    }
}

pub fn validate_priority(priority: i32) -> DomainResult<()> {
    if INCIDENT_PRIORITIES.contains(&priority) {
        Ok(())
    } else {
        Err(DomainError::InvalidValue(format!(
            "unknown incident priority {}",
            priority
        )))
    }
}

/// A wire value that may arrive as a number or as its decimal text form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    /// Resolve to a column value: empty text clears the field.
    pub fn to_column(&self) -> DomainResult<Option<i32>> {
        match self {
            NumberOrText::Number(n) => Ok(Some(*n as i32)),
            NumberOrText::Text(s) if s.trim().is_empty() => Ok(None),
            NumberOrText::Text(s) => s
                .trim()
                .parse::<i32>()
                .map(Some)
                .map_err(|_| DomainError::InvalidValue(format!("not a number: '{}'", s))),
        }
    }
}

// ---------------------------------------------------------------------------
// Read types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub id: i32,
    pub created: String,
    pub author: String,
    pub text: String,
    pub generated: bool,
    pub stricken: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_file_media_type: Option<String>,
}

impl From<ReportEntryRow> for ReportEntry {
    fn from(row: ReportEntryRow) -> Self {
        Self {
            id: row.id,
            created: seconds_to_rfc3339(row.created),
            author: row.author,
            text: row.text,
            generated: row.generated,
            stricken: row.stricken,
            attached_file_name: row.attached_file_name,
            attached_file_media_type: row.attached_file_media_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct Location {
    pub name: Option<String>,
    pub concentric: Option<String>,
    pub radial_hour: Option<i32>,
    pub radial_minute: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Incident {
    pub event: String,
    pub number: i32,
    pub created: String,
    pub state: String,
    pub priority: i32,
    pub summary: Option<String>,
    pub location: Location,
    pub incident_types: Vec<String>,
    pub ranger_handles: Vec<String>,
    pub field_reports: Vec<i32>,
    pub stays: Vec<i32>,
    pub linked_incidents: Vec<i32>,
    pub report_entries: Vec<ReportEntry>,
}

impl Incident {
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        event_name: &str,
        row: IncidentRow,
        incident_types: Vec<String>,
        ranger_handles: Vec<String>,
        field_reports: Vec<i32>,
        stays: Vec<i32>,
        linked_incidents: Vec<i32>,
        entries: Vec<ReportEntryRow>,
    ) -> Self {
        Self {
            event: event_name.to_string(),
            number: row.number,
            created: seconds_to_rfc3339(row.created),
            state: row.state,
            priority: row.priority,
            summary: row.summary,
            location: Location {
                name: row.location_name,
                concentric: row.location_concentric,
                radial_hour: row.location_radial_hour,
                radial_minute: row.location_radial_minute,
                description: row.location_description,
            },
            incident_types,
            ranger_handles,
            field_reports,
            stays,
            linked_incidents,
            report_entries: entries.into_iter().map(ReportEntry::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    pub event: String,
    pub number: i32,
    pub created: String,
    pub summary: Option<String>,
    pub incident_number: Option<i32>,
    pub report_entries: Vec<ReportEntry>,
}

impl FieldReport {
    pub fn assemble(event_name: &str, row: FieldReportRow, entries: Vec<ReportEntryRow>) -> Self {
        Self {
            event: event_name.to_string(),
            number: row.number,
            created: seconds_to_rfc3339(row.created),
            summary: row.summary,
            incident_number: row.incident_number,
            report_entries: entries.into_iter().map(ReportEntry::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StayRanger {
    pub handle: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct TravelBlock {
    pub time: Option<String>,
    pub method: Option<String>,
    pub state: Option<String>,
    pub reason: Option<String>,
    pub belongings: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stay {
    pub event: String,
    pub number: i32,
    pub created: String,
    pub incident_number: Option<i32>,
    pub preferred_name: Option<String>,
    pub legal_name: Option<String>,
    pub guest_description: Option<String>,
    pub camp_info: Option<String>,
    pub arrival: TravelBlock,
    pub departure: TravelBlock,
    pub resource_use: Option<serde_json::Value>,
    pub ranger_assignments: Vec<StayRanger>,
    pub report_entries: Vec<ReportEntry>,
}

impl Stay {
    pub fn assemble(
        event_name: &str,
        row: StayRow,
        rangers: Vec<StayRangerRow>,
        entries: Vec<ReportEntryRow>,
    ) -> Self {
        Self {
            event: event_name.to_string(),
            number: row.number,
            created: seconds_to_rfc3339(row.created),
            incident_number: row.incident_number,
            preferred_name: row.preferred_name,
            legal_name: row.legal_name,
            guest_description: row.guest_description,
            camp_info: row.camp_info,
            arrival: TravelBlock {
                time: row.arrival_time.map(seconds_to_rfc3339),
                method: row.arrival_method,
                state: row.arrival_state,
                reason: row.arrival_reason,
                belongings: row.arrival_belongings,
            },
            departure: TravelBlock {
                time: row.departure_time.map(seconds_to_rfc3339),
                method: row.departure_method,
                state: row.departure_state,
                reason: row.departure_reason,
                belongings: row.departure_belongings,
            },
            resource_use: row.resource_use,
            ranger_assignments: rangers
                .into_iter()
                .map(|r| StayRanger {
                    handle: r.ranger_handle,
                    role: r.role,
                })
                .collect(),
            report_entries: entries.into_iter().map(ReportEntry::from).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Update types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NewReportEntry {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LocationUpdate {
    pub name: Option<String>,
    pub concentric: Option<String>,
    pub radial_hour: Option<NumberOrText>,
    pub radial_minute: Option<NumberOrText>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct IncidentUpdate {
    pub state: Option<String>,
    pub priority: Option<i32>,
    pub summary: Option<String>,
    pub location: Option<LocationUpdate>,
    pub incident_types: Option<Vec<String>>,
    pub ranger_handles: Option<Vec<String>>,
    pub field_reports: Option<Vec<i32>>,
    pub stays: Option<Vec<i32>>,
    pub linked_incidents: Option<Vec<i32>>,
    pub report_entries: Vec<NewReportEntry>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FieldReportUpdate {
    pub summary: Option<String>,
    pub report_entries: Vec<NewReportEntry>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TravelBlockUpdate {
    /// RFC 3339 text or Unix milliseconds; empty text clears.
    pub time: Option<serde_json::Value>,
    pub method: Option<String>,
    pub state: Option<String>,
    pub reason: Option<String>,
    pub belongings: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StayRangerAssignment {
    pub handle: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StayUpdate {
    pub incident_number: Option<NumberOrText>,
    pub preferred_name: Option<String>,
    pub legal_name: Option<String>,
    pub guest_description: Option<String>,
    pub camp_info: Option<String>,
    pub arrival: Option<TravelBlockUpdate>,
    pub departure: Option<TravelBlockUpdate>,
    pub resource_use: Option<serde_json::Value>,
    pub ranger_assignments: Option<Vec<StayRangerAssignment>>,
    pub report_entries: Vec<NewReportEntry>,
}

/// `None` leaves the flag as is; the toggle endpoint treats a null body
/// field as a no-op.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StrikeUpdate {
    pub stricken: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_or_text_accepts_both_forms() {
        assert_eq!(
            NumberOrText::Number(6).to_column().unwrap(),
            Some(6)
        );
        assert_eq!(
            NumberOrText::Text("6".to_string()).to_column().unwrap(),
            Some(6)
        );
        assert_eq!(NumberOrText::Text("".to_string()).to_column().unwrap(), None);
        assert!(NumberOrText::Text("six".to_string()).to_column().is_err());
    }

    #[test]
    fn state_and_priority_validation() {
        assert!(validate_state("dispatched").is_ok());
        assert!(validate_state("escalated").is_err());
        assert!(validate_priority(5).is_ok());
        assert!(validate_priority(2).is_err());
    }

    #[test]
    fn update_distinguishes_absent_from_empty() {
        let update: IncidentUpdate =
            serde_json::from_str(r#"{"summary": "", "priority": 5}"#).unwrap();
        assert_eq!(update.summary.as_deref(), Some(""));
        assert_eq!(update.priority, Some(5));
        assert!(update.state.is_none());
        assert!(update.ranger_handles.is_none());
    }

    #[test]
    fn location_radials_accept_text() {
        let update: IncidentUpdate = serde_json::from_str(
            r#"{"location": {"radial_hour": "6", "radial_minute": "00"}}"#,
        )
        .unwrap();
        let location = update.location.unwrap();
        assert_eq!(location.radial_hour.unwrap().to_column().unwrap(), Some(6));
        assert_eq!(location.radial_minute.unwrap().to_column().unwrap(), Some(0));
    }
}
