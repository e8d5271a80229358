//! Incident, field report and stay domain logic.
//!
//! Every mutation follows the same shape: open a transaction, diff the
//! request against the current rows, write the changes, record the diff as
//! a generated report entry, commit, and only then tell the caller which
//! entities to announce. Creation routes through the update path so the
//! initial state and later edits share one audit trail.

pub mod diff;
pub mod error;
pub mod field_report;
pub mod incident;
pub mod model;
pub mod stay;
pub mod time;

pub use error::{DomainError, DomainResult};

/// Something that changed and should be announced after commit.
///
/// The bus lives in the application; domain operations return these so that
/// nothing is published for a rolled-back transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Incident { event_id: i32, number: i32 },
    FieldReport { event_id: i32, number: i32 },
    Stay { event_id: i32, number: i32 },
}
