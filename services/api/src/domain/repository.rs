#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use citywatch_domain::issue::{IssueStatus, TimeBucket};
use citywatch_domain::pagination::PageRequest;

use crate::domain::types::{Issue, IssueFilter, Photo, PhotoFilter, User};
use crate::error::ApiError;

/// Repository for accounts.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError>;
    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;
    async fn find_by_token(&self, token: Uuid) -> Result<Option<User>, ApiError>;
    async fn list(&self, page: PageRequest) -> Result<Vec<User>, ApiError>;

    /// Insert a new account. Duplicate email or username fail with
    /// `EmailTaken` / `UsernameTaken`.
    async fn create(&self, user: &User) -> Result<(), ApiError>;

    /// Mark the account holding `verify_token` as verified and replace the
    /// verification token. Returns `None` if no account holds it.
    async fn verify_email(
        &self,
        verify_token: Uuid,
        new_verify_token: Uuid,
    ) -> Result<Option<User>, ApiError>;

    /// Replace the password hash and both tokens. Returns `false` if no row matched.
    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        token: Uuid,
        verify_token: Uuid,
    ) -> Result<bool, ApiError>;

    /// Same as [`update_password`](Self::update_password), keyed by the
    /// current verification token.
    async fn reset_password(
        &self,
        verify_token: Uuid,
        password_hash: &str,
        token: Uuid,
        new_verify_token: Uuid,
    ) -> Result<Option<User>, ApiError>;

    /// Returns `false` if the user does not exist; `RoleNotFound` if the role does not.
    async fn update_role(&self, id: Uuid, role: &str) -> Result<bool, ApiError>;

    /// Delete an account. Returns `true` if a row was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, ApiError>;
}

/// Repository for the role catalogue.
pub trait RoleRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<String>, ApiError>;
    /// Fails with `RoleAlreadyExists` on a duplicate name.
    async fn create(&self, role: &str) -> Result<(), ApiError>;
}

/// Repository for the issue-type catalogue.
pub trait IssueTypeRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<String>, ApiError>;
    async fn exists(&self, issue_type: &str) -> Result<bool, ApiError>;
    /// Fails with `IssueTypeAlreadyExists` on a duplicate name.
    async fn create(&self, issue_type: &str) -> Result<(), ApiError>;
    /// Returns `true` if a row was deleted.
    async fn delete(&self, issue_type: &str) -> Result<bool, ApiError>;
}

/// Repository for issues and their photo rows.
pub trait IssueRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Issue>, ApiError>;
    async fn find(&self, filter: &IssueFilter, page: PageRequest) -> Result<Vec<Issue>, ApiError>;
    async fn count(&self) -> Result<u64, ApiError>;
    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, ApiError>;

    /// Insert the issue and all photo rows in one transaction.
    async fn create_with_photos(&self, issue: &Issue, photos: &[Photo]) -> Result<(), ApiError>;

    /// Set status and `updated_at`. Returns `None` if the issue does not exist.
    async fn update_status(
        &self,
        id: Uuid,
        status: IssueStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Issue>, ApiError>;

    /// Delete the issue and its photo rows in one transaction.
    /// Returns the deleted photos, or `None` if the issue does not exist.
    async fn delete_with_photos(&self, id: Uuid) -> Result<Option<Vec<Photo>>, ApiError>;
}

pub trait PhotoRepository: Send + Sync {
    async fn find(&self, filter: &PhotoFilter, page: PageRequest) -> Result<Vec<Photo>, ApiError>;
}

/// Aggregate queries over issues. Only non-empty groups are returned.
pub trait StatisticsRepository: Send + Sync {
    async fn count_by_type(&self) -> Result<Vec<(String, i64)>, ApiError>;
    async fn count_by_status(&self) -> Result<Vec<(String, i64)>, ApiError>;
    async fn count_by_time(&self, bucket: TimeBucket)
    -> Result<Vec<(DateTime<Utc>, i64)>, ApiError>;
    async fn count_by_area(&self) -> Result<Vec<(String, i64)>, ApiError>;
    /// Mean seconds from creation to `updated_at` over issues in `status`, and their count.
    async fn resolution_time(&self, status: IssueStatus) -> Result<(Option<f64>, i64), ApiError>;
}

/// Outgoing mail.
pub trait Mailer: Send + Sync {
    async fn send_verification(&self, to: &str, verify_token: Uuid) -> anyhow::Result<()>;
    async fn send_password_reset(&self, to: &str, verify_token: Uuid) -> anyhow::Result<()>;
    async fn send_status_changed(&self, to: &str, issue: &Issue) -> anyhow::Result<()>;
}

/// Blob storage for photo files.
pub trait PhotoStorage: Send + Sync {
    /// Persist `bytes` and return the path relative to the static root.
    async fn store(&self, id: Uuid, extension: &str, bytes: &[u8]) -> anyhow::Result<String>;
    /// Remove a stored file. Missing files are not an error.
    async fn remove(&self, file_path: &str) -> anyhow::Result<()>;
}
