use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(ConnectionStatus::Enum)
                    .values([
                        ConnectionStatus::Pending,
                        ConnectionStatus::Accepted,
                        ConnectionStatus::Declined,
                        ConnectionStatus::Withdrawn,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ConnectionRequests::Table)
                    .if_not_exists()
                    .col(pk_uuid(ConnectionRequests::Id))
                    .col(uuid(ConnectionRequests::RequesterId))
                    .col(uuid(ConnectionRequests::TargetId))
                    .col(uuid_null(ConnectionRequests::JobId))
                    .col(text(ConnectionRequests::Message).default(""))
                    .col(
                        ColumnDef::new(ConnectionRequests::Status)
                            .enumeration(
                                ConnectionStatus::Enum,
                                [
                                    ConnectionStatus::Pending,
                                    ConnectionStatus::Accepted,
                                    ConnectionStatus::Declined,
                                    ConnectionStatus::Withdrawn,
                                ],
                            )
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        timestamp_with_time_zone(ConnectionRequests::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(ConnectionRequests::RespondedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_connection_requests_requester_id")
                    .table(ConnectionRequests::Table)
                    .col(ConnectionRequests::RequesterId)
                    .col(ConnectionRequests::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_connection_requests_target_id")
                    .table(ConnectionRequests::Table)
                    .col(ConnectionRequests::TargetId)
                    .col(ConnectionRequests::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_connection_requests_job_id")
                    .table(ConnectionRequests::Table)
                    .col(ConnectionRequests::JobId)
                    .to_owned(),
            )
            .await?;

        // One active request per (requester, target, job); NULL job shares a single slot
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX uq_connection_requests_active
                    ON connection_requests (
                        requester_id,
                        target_id,
                        COALESCE(job_id, '00000000-0000-0000-0000-000000000000'::uuid)
                    )
                    WHERE status IN ('pending', 'accepted')
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uq_connection_requests_active")
            .await?;

        manager
            .drop_table(Table::drop().table(ConnectionRequests::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(ConnectionStatus::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum ConnectionRequests {
    Table,
    Id,
    RequesterId,
    TargetId,
    JobId,
    Message,
    Status,
    CreatedAt,
    RespondedAt,
}

#[derive(DeriveIden)]
enum ConnectionStatus {
    #[sea_orm(iden = "connection_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "accepted")]
    Accepted,
    #[sea_orm(iden = "declined")]
    Declined,
    #[sea_orm(iden = "withdrawn")]
    Withdrawn,
}
