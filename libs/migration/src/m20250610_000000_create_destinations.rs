use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Destination lists per (event, type); updates replace a full list,
        // so ordinal is part of the key.
        manager
            .create_table(
                Table::create()
                    .table(Destination::Table)
                    .if_not_exists()
                    .col(integer(Destination::EventId))
                    .col(string(Destination::DestinationType))
                    .col(integer(Destination::Ordinal))
                    .col(string(Destination::Name))
                    .col(string_null(Destination::LocationString))
                    .col(json_null(Destination::ExternalData))
                    .primary_key(
                        Index::create()
                            .col(Destination::EventId)
                            .col(Destination::DestinationType)
                            .col(Destination::Ordinal),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared("UPDATE schema_info SET version = 2")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS `destination`")
            .await?;
        manager
            .get_connection()
            .execute_unprepared("UPDATE schema_info SET version = 1")
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Destination {
    Table,
    EventId,
    DestinationType,
    Ordinal,
    Name,
    LocationString,
    ExternalData,
}
