use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Schema version bookkeeping. One row, compared against the code's
        // expected version on startup.
        manager
            .create_table(
                Table::create()
                    .table(SchemaInfo::Table)
                    .if_not_exists()
                    .col(integer(SchemaInfo::Version))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Event::Table)
                    .if_not_exists()
                    .col(pk_auto(Event::Id))
                    .col(string_uniq(Event::Name))
                    .col(boolean(Event::IsGroup).default(false))
                    .col(integer_null(Event::ParentGroup))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventAccess::Table)
                    .if_not_exists()
                    .col(pk_auto(EventAccess::Id))
                    .col(integer(EventAccess::EventId))
                    .col(string(EventAccess::Expression))
                    .col(string(EventAccess::Mode))
                    .col(string(EventAccess::Validity))
                    .foreign_key(
                        ForeignKey::create()
                            .from(EventAccess::Table, EventAccess::EventId)
                            .to(Event::Table, Event::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_event_access_unique")
                    .table(EventAccess::Table)
                    .col(EventAccess::EventId)
                    .col(EventAccess::Expression)
                    .col(EventAccess::Mode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IncidentType::Table)
                    .if_not_exists()
                    .col(pk_auto(IncidentType::Id))
                    .col(string_uniq(IncidentType::Name))
                    .col(boolean(IncidentType::Hidden).default(false))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ConcentricStreet::Table)
                    .if_not_exists()
                    .col(integer(ConcentricStreet::EventId))
                    .col(string(ConcentricStreet::Id))
                    .col(string(ConcentricStreet::Name))
                    .primary_key(
                        Index::create()
                            .col(ConcentricStreet::EventId)
                            .col(ConcentricStreet::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Incidents: number is dense per event, assigned by the insert
        // statement, hence the composite key.
        manager
            .create_table(
                Table::create()
                    .table(Incident::Table)
                    .if_not_exists()
                    .col(integer(Incident::EventId))
                    .col(integer(Incident::Number))
                    .col(double(Incident::Created))
                    .col(string(Incident::State))
                    .col(integer(Incident::Priority))
                    .col(text_null(Incident::Summary))
                    .col(text_null(Incident::LocationName))
                    .col(string_null(Incident::LocationConcentric))
                    .col(integer_null(Incident::LocationRadialHour))
                    .col(integer_null(Incident::LocationRadialMinute))
                    .col(text_null(Incident::LocationDescription))
                    .primary_key(Index::create().col(Incident::EventId).col(Incident::Number))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Incident::Table, Incident::EventId)
                            .to(Event::Table, Event::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IncidentRanger::Table)
                    .if_not_exists()
                    .col(integer(IncidentRanger::EventId))
                    .col(integer(IncidentRanger::IncidentNumber))
                    .col(string(IncidentRanger::RangerHandle))
                    .primary_key(
                        Index::create()
                            .col(IncidentRanger::EventId)
                            .col(IncidentRanger::IncidentNumber)
                            .col(IncidentRanger::RangerHandle),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IncidentIncidentType::Table)
                    .if_not_exists()
                    .col(integer(IncidentIncidentType::EventId))
                    .col(integer(IncidentIncidentType::IncidentNumber))
                    .col(string(IncidentIncidentType::Name))
                    .primary_key(
                        Index::create()
                            .col(IncidentIncidentType::EventId)
                            .col(IncidentIncidentType::IncidentNumber)
                            .col(IncidentIncidentType::Name),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IncidentLinked::Table)
                    .if_not_exists()
                    .col(integer(IncidentLinked::EventId))
                    .col(integer(IncidentLinked::IncidentNumber))
                    .col(integer(IncidentLinked::LinkedNumber))
                    .primary_key(
                        Index::create()
                            .col(IncidentLinked::EventId)
                            .col(IncidentLinked::IncidentNumber)
                            .col(IncidentLinked::LinkedNumber),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FieldReport::Table)
                    .if_not_exists()
                    .col(integer(FieldReport::EventId))
                    .col(integer(FieldReport::Number))
                    .col(double(FieldReport::Created))
                    .col(text_null(FieldReport::Summary))
                    .col(integer_null(FieldReport::IncidentNumber))
                    .primary_key(
                        Index::create()
                            .col(FieldReport::EventId)
                            .col(FieldReport::Number),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(FieldReport::Table, FieldReport::EventId)
                            .to(Event::Table, Event::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Stay::Table)
                    .if_not_exists()
                    .col(integer(Stay::EventId))
                    .col(integer(Stay::Number))
                    .col(double(Stay::Created))
                    .col(integer_null(Stay::IncidentNumber))
                    .col(string_null(Stay::PreferredName))
                    .col(string_null(Stay::LegalName))
                    .col(text_null(Stay::GuestDescription))
                    .col(text_null(Stay::CampInfo))
                    .col(double_null(Stay::ArrivalTime))
                    .col(string_null(Stay::ArrivalMethod))
                    .col(string_null(Stay::ArrivalState))
                    .col(text_null(Stay::ArrivalReason))
                    .col(text_null(Stay::ArrivalBelongings))
                    .col(double_null(Stay::DepartureTime))
                    .col(string_null(Stay::DepartureMethod))
                    .col(string_null(Stay::DepartureState))
                    .col(text_null(Stay::DepartureReason))
                    .col(text_null(Stay::DepartureBelongings))
                    .col(json_null(Stay::ResourceUse))
                    .primary_key(Index::create().col(Stay::EventId).col(Stay::Number))
                    .foreign_key(
                        ForeignKey::create()
                            .from(Stay::Table, Stay::EventId)
                            .to(Event::Table, Event::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StayRanger::Table)
                    .if_not_exists()
                    .col(integer(StayRanger::EventId))
                    .col(integer(StayRanger::StayNumber))
                    .col(string(StayRanger::RangerHandle))
                    .col(string_null(StayRanger::Role))
                    .primary_key(
                        Index::create()
                            .col(StayRanger::EventId)
                            .col(StayRanger::StayNumber)
                            .col(StayRanger::RangerHandle),
                    )
                    .to_owned(),
            )
            .await?;

        // Report entries: globally monotone id, joined to exactly one parent
        // through one of the three join tables below.
        manager
            .create_table(
                Table::create()
                    .table(ReportEntry::Table)
                    .if_not_exists()
                    .col(pk_auto(ReportEntry::Id))
                    .col(double(ReportEntry::Created))
                    .col(string(ReportEntry::Author))
                    .col(text(ReportEntry::Text))
                    .col(boolean(ReportEntry::Generated).default(false))
                    .col(boolean(ReportEntry::Stricken).default(false))
                    .col(string_null(ReportEntry::AttachedFile))
                    .col(string_null(ReportEntry::AttachedFileName))
                    .col(string_null(ReportEntry::AttachedFileMediaType))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IncidentReportEntry::Table)
                    .if_not_exists()
                    .col(integer(IncidentReportEntry::EventId))
                    .col(integer(IncidentReportEntry::IncidentNumber))
                    .col(integer(IncidentReportEntry::ReportEntryId))
                    .primary_key(
                        Index::create()
                            .col(IncidentReportEntry::EventId)
                            .col(IncidentReportEntry::IncidentNumber)
                            .col(IncidentReportEntry::ReportEntryId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FieldReportReportEntry::Table)
                    .if_not_exists()
                    .col(integer(FieldReportReportEntry::EventId))
                    .col(integer(FieldReportReportEntry::FieldReportNumber))
                    .col(integer(FieldReportReportEntry::ReportEntryId))
                    .primary_key(
                        Index::create()
                            .col(FieldReportReportEntry::EventId)
                            .col(FieldReportReportEntry::FieldReportNumber)
                            .col(FieldReportReportEntry::ReportEntryId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StayReportEntry::Table)
                    .if_not_exists()
                    .col(integer(StayReportEntry::EventId))
                    .col(integer(StayReportEntry::StayNumber))
                    .col(integer(StayReportEntry::ReportEntryId))
                    .primary_key(
                        Index::create()
                            .col(StayReportEntry::EventId)
                            .col(StayReportEntry::StayNumber)
                            .col(StayReportEntry::ReportEntryId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ActionLog::Table)
                    .if_not_exists()
                    .col(pk_auto(ActionLog::Id))
                    .col(double(ActionLog::CreatedAt))
                    .col(string(ActionLog::ActionType))
                    .col(string(ActionLog::Method))
                    .col(string(ActionLog::Path))
                    .col(string_null(ActionLog::Referrer))
                    .col(string_null(ActionLog::UserId))
                    .col(string_null(ActionLog::UserName))
                    .col(string_null(ActionLog::PositionId))
                    .col(string_null(ActionLog::PositionName))
                    .col(string_null(ActionLog::ClientAddress))
                    .col(integer(ActionLog::HttpStatus))
                    .col(big_integer(ActionLog::DurationMicros))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_action_log_created_at")
                    .table(ActionLog::Table)
                    .col(ActionLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared("INSERT INTO schema_info (version) VALUES (1)")
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            "action_log",
            "stay__report_entry",
            "field_report__report_entry",
            "incident__report_entry",
            "report_entry",
            "stay__ranger",
            "stay",
            "field_report",
            "incident__linked_incident",
            "incident__incident_type",
            "incident__ranger",
            "incident",
            "concentric_street",
            "incident_type",
            "event_access",
            "event",
            "schema_info",
        ] {
            manager
                .get_connection()
                .execute_unprepared(&format!("DROP TABLE IF EXISTS `{}`", table))
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum SchemaInfo {
    Table,
    Version,
}

#[derive(DeriveIden)]
enum Event {
    Table,
    Id,
    Name,
    IsGroup,
    ParentGroup,
}

#[derive(DeriveIden)]
enum EventAccess {
    Table,
    Id,
    EventId,
    Expression,
    Mode,
    Validity,
}

#[derive(DeriveIden)]
enum IncidentType {
    Table,
    Id,
    Name,
    Hidden,
}

#[derive(DeriveIden)]
enum ConcentricStreet {
    Table,
    EventId,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Incident {
    Table,
    EventId,
    Number,
    Created,
    State,
    Priority,
    Summary,
    LocationName,
    LocationConcentric,
    LocationRadialHour,
    LocationRadialMinute,
    LocationDescription,
}

#[derive(DeriveIden)]
enum IncidentRanger {
    #[sea_orm(iden = "incident__ranger")]
    Table,
    EventId,
    IncidentNumber,
    RangerHandle,
}

#[derive(DeriveIden)]
enum IncidentIncidentType {
    #[sea_orm(iden = "incident__incident_type")]
    Table,
    EventId,
    IncidentNumber,
    Name,
}

#[derive(DeriveIden)]
enum IncidentLinked {
    #[sea_orm(iden = "incident__linked_incident")]
    Table,
    EventId,
    IncidentNumber,
    LinkedNumber,
}

#[derive(DeriveIden)]
enum FieldReport {
    Table,
    EventId,
    Number,
    Created,
    Summary,
    IncidentNumber,
}

#[derive(DeriveIden)]
enum Stay {
    Table,
    EventId,
    Number,
    Created,
    IncidentNumber,
    PreferredName,
    LegalName,
    GuestDescription,
    CampInfo,
    ArrivalTime,
    ArrivalMethod,
    ArrivalState,
    ArrivalReason,
    ArrivalBelongings,
    DepartureTime,
    DepartureMethod,
    DepartureState,
    DepartureReason,
    DepartureBelongings,
    ResourceUse,
}

#[derive(DeriveIden)]
enum StayRanger {
    #[sea_orm(iden = "stay__ranger")]
    Table,
    EventId,
    StayNumber,
    RangerHandle,
    Role,
}

#[derive(DeriveIden)]
enum ReportEntry {
    Table,
    Id,
    Created,
    Author,
    Text,
    Generated,
    Stricken,
    AttachedFile,
    AttachedFileName,
    AttachedFileMediaType,
}

#[derive(DeriveIden)]
enum IncidentReportEntry {
    #[sea_orm(iden = "incident__report_entry")]
    Table,
    EventId,
    IncidentNumber,
    ReportEntryId,
}

#[derive(DeriveIden)]
enum FieldReportReportEntry {
    #[sea_orm(iden = "field_report__report_entry")]
    Table,
    EventId,
    FieldReportNumber,
    ReportEntryId,
}

#[derive(DeriveIden)]
enum StayReportEntry {
    #[sea_orm(iden = "stay__report_entry")]
    Table,
    EventId,
    StayNumber,
    ReportEntryId,
}

#[derive(DeriveIden)]
enum ActionLog {
    Table,
    Id,
    CreatedAt,
    ActionType,
    Method,
    Path,
    Referrer,
    UserId,
    UserName,
    PositionId,
    PositionName,
    ClientAddress,
    HttpStatus,
    DurationMicros,
}
