use sea_orm_migration::prelude::*;

use crate::{UQ_USERS_EMAIL, UQ_USERS_TOKEN, UQ_USERS_USERNAME, UQ_USERS_VERIFY_TOKEN};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string_len(50).not_null())
                    .col(ColumnDef::new(Users::Email).string_len(100).not_null())
                    .col(ColumnDef::new(Users::Password).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string_len(20)
                            .not_null()
                            .default("user"),
                    )
                    .col(
                        ColumnDef::new(Users::Rating)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Users::Token).uuid().not_null())
                    .col(
                        ColumnDef::new(Users::EmailVerify)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::VerifyToken).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Users::Table, Users::Role)
                            .to(Roles::Table, Roles::Role)
                            .on_update(ForeignKeyAction::Cascade)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            (UQ_USERS_USERNAME, Users::Username),
            (UQ_USERS_EMAIL, Users::Email),
            (UQ_USERS_TOKEN, Users::Token),
            (UQ_USERS_VERIFY_TOKEN, Users::VerifyToken),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Users::Table)
                        .col(column)
                        .unique()
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    Password,
    Role,
    Rating,
    CreatedAt,
    Token,
    EmailVerify,
    VerifyToken,
}

#[derive(Iden)]
enum Roles {
    Table,
    Role,
}
