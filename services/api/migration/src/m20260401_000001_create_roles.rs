use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roles::Role)
                            .string_len(20)
                            .not_null()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await?;

        // Built-in roles: every account starts as `user`, `admin` gates moderation.
        manager
            .get_connection()
            .execute_unprepared(
                "INSERT INTO roles (role) VALUES ('user'), ('admin') ON CONFLICT DO NOTHING",
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Roles {
    Table,
    Role,
}
