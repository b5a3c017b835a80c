use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(pk_auto(AuditLogs::Id))
                    .col(string(AuditLogs::EntityType))
                    .col(integer(AuditLogs::EntityId))
                    .col(string(AuditLogs::Action))
                    .col(json_null(AuditLogs::OldValues))
                    .col(json_null(AuditLogs::NewValues))
                    .col(integer(AuditLogs::ActorId))
                    .col(timestamp_with_time_zone(AuditLogs::LoggedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_entity")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::EntityType)
                    .col(AuditLogs::EntityId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    EntityType,
    EntityId,
    Action,
    OldValues,
    NewValues,
    ActorId,
    LoggedAt,
}
