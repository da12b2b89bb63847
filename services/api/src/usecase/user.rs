use uuid::Uuid;

use citywatch_domain::pagination::PageRequest;

use crate::domain::repository::{IssueRepository, RoleRepository, UserRepository};
use crate::domain::types::{MAX_ROLE_LEN, User, validate_text};
use crate::error::ApiError;
use crate::usecase::admin::require_admin;

// ── ListUsers ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListUsersUseCase<U> {
    pub async fn execute(&self, page: PageRequest) -> Result<Vec<User>, ApiError> {
        self.users.list(page.clamped()).await
    }
}

// ── DeleteUser ───────────────────────────────────────────────────────────────

pub struct DeleteUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> DeleteUserUseCase<U> {
    pub async fn execute(&self, token: Uuid, user_id: Uuid) -> Result<(), ApiError> {
        require_admin(&self.users, token).await?;
        if !self.users.delete(user_id).await? {
            return Err(ApiError::UserNotFound);
        }
        Ok(())
    }
}

// ── ChangeRole ───────────────────────────────────────────────────────────────

pub struct ChangeRoleUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ChangeRoleUseCase<U> {
    pub async fn execute(&self, token: Uuid, user_id: Uuid, role: &str) -> Result<User, ApiError> {
        require_admin(&self.users, token).await?;
        if !self.users.update_role(user_id, role).await? {
            return Err(ApiError::UserNotFound);
        }
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}

// ── Roles ────────────────────────────────────────────────────────────────────

pub struct CreateRoleUseCase<U: UserRepository, R: RoleRepository> {
    pub users: U,
    pub roles: R,
}

impl<U: UserRepository, R: RoleRepository> CreateRoleUseCase<U, R> {
    pub async fn execute(&self, token: Uuid, role: &str) -> Result<(), ApiError> {
        if !validate_text(role, MAX_ROLE_LEN) || role.trim() != role {
            return Err(ApiError::Validation("role must be 1-20 characters".into()));
        }
        require_admin(&self.users, token).await?;
        self.roles.create(role).await
    }
}

pub struct ListRolesUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> ListRolesUseCase<R> {
    pub async fn execute(&self) -> Result<Vec<String>, ApiError> {
        self.roles.list().await
    }
}

// ── CountUserIssues ──────────────────────────────────────────────────────────

pub struct CountUserIssuesUseCase<I: IssueRepository> {
    pub issues: I,
}

impl<I: IssueRepository> CountUserIssuesUseCase<I> {
    /// Unknown users simply have zero issues.
    pub async fn execute(&self, user_id: Uuid) -> Result<u64, ApiError> {
        self.issues.count_by_user(user_id).await
    }
}
