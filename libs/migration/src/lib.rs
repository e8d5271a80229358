pub use sea_orm_migration::prelude::*;

mod m20250301_000000_create_ims_schema;
mod m20250610_000000_create_destinations;

/// Schema version the code expects. The store compares this against the
/// `schema_info` row on startup; migrations bump the row as they apply.
pub const SCHEMA_VERSION: i32 = 2;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000000_create_ims_schema::Migration),
            Box::new(m20250610_000000_create_destinations::Migration),
        ]
    }
}
