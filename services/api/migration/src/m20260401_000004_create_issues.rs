use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Issues::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Issues::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Issues::UserId).uuid().not_null())
                    .col(ColumnDef::new(Issues::Type).string_len(50).not_null())
                    .col(ColumnDef::new(Issues::ShortDesc).string_len(200).not_null())
                    .col(ColumnDef::new(Issues::FullDesc).text().not_null())
                    .col(ColumnDef::new(Issues::Status).string_len(20).not_null())
                    .col(ColumnDef::new(Issues::Address).string_len(255).not_null())
                    .col(ColumnDef::new(Issues::Latitude).double().not_null())
                    .col(ColumnDef::new(Issues::Longitude).double().not_null())
                    .col(
                        ColumnDef::new(Issues::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Issues::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Issues::Status).is_in([
                        "есть проблема",
                        "в обработке",
                        "выполнено",
                    ]))
                    .check(Expr::col(Issues::Latitude).between(-90.0, 90.0))
                    .check(Expr::col(Issues::Longitude).between(-180.0, 180.0))
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_issues_user_id", Issues::UserId),
            ("idx_issues_type", Issues::Type),
            ("idx_issues_status", Issues::Status),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Issues::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx_issues_created_at_id")
                    .table(Issues::Table)
                    .col(Issues::CreatedAt)
                    .col(Issues::Id)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Issues::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Issues {
    Table,
    Id,
    UserId,
    Type,
    ShortDesc,
    FullDesc,
    Status,
    Address,
    Latitude,
    Longitude,
    CreatedAt,
    UpdatedAt,
}
