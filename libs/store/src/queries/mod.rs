//! Named statements, grouped by entity.

mod destinations;
mod events;
mod field_reports;
mod incidents;
mod report_entries;
mod stays;
mod types;

pub use destinations::NewDestination;
pub use stays::StayValues;
