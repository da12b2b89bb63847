use uuid::Uuid;

use crate::domain::repository::{IssueTypeRepository, UserRepository};
use crate::domain::types::{MAX_ISSUE_TYPE_LEN, validate_text};
use crate::error::ApiError;
use crate::usecase::admin::require_admin;

fn validate_issue_type(issue_type: &str) -> Result<(), ApiError> {
    if !validate_text(issue_type, MAX_ISSUE_TYPE_LEN) || issue_type.trim() != issue_type {
        return Err(ApiError::Validation("type must be 1-50 characters".into()));
    }
    Ok(())
}

// ── ListIssueTypes ───────────────────────────────────────────────────────────

pub struct ListIssueTypesUseCase<T: IssueTypeRepository> {
    pub issue_types: T,
}

impl<T: IssueTypeRepository> ListIssueTypesUseCase<T> {
    pub async fn execute(&self) -> Result<Vec<String>, ApiError> {
        self.issue_types.list().await
    }
}

// ── CreateIssueType ──────────────────────────────────────────────────────────

pub struct CreateIssueTypeUseCase<U: UserRepository, T: IssueTypeRepository> {
    pub users: U,
    pub issue_types: T,
}

impl<U: UserRepository, T: IssueTypeRepository> CreateIssueTypeUseCase<U, T> {
    pub async fn execute(&self, token: Uuid, issue_type: &str) -> Result<(), ApiError> {
        validate_issue_type(issue_type)?;
        require_admin(&self.users, token).await?;
        self.issue_types.create(issue_type).await
    }
}

// ── DeleteIssueType ──────────────────────────────────────────────────────────

pub struct DeleteIssueTypeUseCase<U: UserRepository, T: IssueTypeRepository> {
    pub users: U,
    pub issue_types: T,
}

impl<U: UserRepository, T: IssueTypeRepository> DeleteIssueTypeUseCase<U, T> {
    /// Remove a type from the catalogue. Existing issues keep their type value.
    pub async fn execute(&self, token: Uuid, issue_type: &str) -> Result<(), ApiError> {
        require_admin(&self.users, token).await?;
        if !self.issue_types.delete(issue_type).await? {
            return Err(ApiError::IssueTypeNotFound);
        }
        Ok(())
    }
}
