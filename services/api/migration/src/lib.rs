use sea_orm_migration::prelude::*;

pub use sea_orm_migration::MigratorTrait;

mod m20260401_000001_create_roles;
mod m20260401_000002_create_users;
mod m20260401_000003_create_issue_types;
mod m20260401_000004_create_issues;
mod m20260401_000005_create_photos;

/// Unique index names; the API maps violations of these to conflict errors.
pub const UQ_USERS_USERNAME: &str = "uq_users_username";
pub const UQ_USERS_EMAIL: &str = "uq_users_email";
pub const UQ_USERS_TOKEN: &str = "uq_users_token";
pub const UQ_USERS_VERIFY_TOKEN: &str = "uq_users_verify_token";

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260401_000001_create_roles::Migration),
            Box::new(m20260401_000002_create_users::Migration),
            Box::new(m20260401_000003_create_issue_types::Migration),
            Box::new(m20260401_000004_create_issues::Migration),
            Box::new(m20260401_000005_create_photos::Migration),
        ]
    }
}
