//! Typed result rows for the named statements.

use sea_orm::FromQueryResult;

#[derive(Debug, Clone, FromQueryResult)]
pub struct EventRow {
    pub id: i32,
    pub name: String,
    pub is_group: bool,
    pub parent_group: Option<i32>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct AccessRow {
    pub id: i32,
    pub event_id: i32,
    pub expression: String,
    pub mode: String,
    pub validity: String,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct IncidentTypeRow {
    pub id: i32,
    pub name: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct StreetRow {
    pub event_id: i32,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct IncidentRow {
    pub event_id: i32,
    pub number: i32,
    pub created: f64,
    pub state: String,
    pub priority: i32,
    pub summary: Option<String>,
    pub location_name: Option<String>,
    pub location_concentric: Option<String>,
    pub location_radial_hour: Option<i32>,
    pub location_radial_minute: Option<i32>,
    pub location_description: Option<String>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct FieldReportRow {
    pub event_id: i32,
    pub number: i32,
    pub created: f64,
    pub summary: Option<String>,
    pub incident_number: Option<i32>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct StayRow {
    pub event_id: i32,
    pub number: i32,
    pub created: f64,
    pub incident_number: Option<i32>,
    pub preferred_name: Option<String>,
    pub legal_name: Option<String>,
    pub guest_description: Option<String>,
    pub camp_info: Option<String>,
    pub arrival_time: Option<f64>,
    pub arrival_method: Option<String>,
    pub arrival_state: Option<String>,
    pub arrival_reason: Option<String>,
    pub arrival_belongings: Option<String>,
    pub departure_time: Option<f64>,
    pub departure_method: Option<String>,
    pub departure_state: Option<String>,
    pub departure_reason: Option<String>,
    pub departure_belongings: Option<String>,
    pub resource_use: Option<serde_json::Value>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct StayRangerRow {
    pub ranger_handle: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct ReportEntryRow {
    pub id: i32,
    pub created: f64,
    pub author: String,
    pub text: String,
    pub generated: bool,
    pub stricken: bool,
    pub attached_file: Option<String>,
    pub attached_file_name: Option<String>,
    pub attached_file_media_type: Option<String>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct DestinationRow {
    pub event_id: i32,
    pub destination_type: String,
    pub ordinal: i32,
    pub name: String,
    pub location_string: Option<String>,
    pub external_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, FromQueryResult)]
pub struct ActionLogRow {
    pub id: i32,
    pub created_at: f64,
    pub action_type: String,
    pub method: String,
    pub path: String,
    pub referrer: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub position_id: Option<String>,
    pub position_name: Option<String>,
    pub client_address: Option<String>,
    pub http_status: i32,
    pub duration_micros: i64,
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct VersionRow {
    pub version: i32,
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct NumberRow {
    pub number: i32,
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct IdRow {
    pub id: i32,
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct HandleRow {
    pub ranger_handle: String,
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct NameRow {
    pub name: String,
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct AuthorRow {
    pub author: String,
}
