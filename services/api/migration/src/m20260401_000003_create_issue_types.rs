use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(IssueTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(IssueTypes::Type)
                            .string_len(50)
                            .not_null()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IssueTypes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum IssueTypes {
    Table,
    Type,
}
