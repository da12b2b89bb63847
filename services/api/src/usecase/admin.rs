use uuid::Uuid;

use citywatch_domain::user::is_admin;

use crate::domain::repository::UserRepository;
use crate::domain::types::User;
use crate::error::ApiError;

/// Resolve a bearer token to an administrator account.
///
/// Unknown tokens yield `UserNotFound`; non-admin accounts yield `Forbidden`.
pub async fn require_admin<U: UserRepository>(users: &U, token: Uuid) -> Result<User, ApiError> {
    let user = users
        .find_by_token(token)
        .await?
        .ok_or(ApiError::UserNotFound)?;
    if !is_admin(&user.role) {
        return Err(ApiError::Forbidden);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, test_user};

    #[tokio::test]
    async fn should_accept_admin_token() {
        let admin = test_user("root", "admin", true);
        let users = MemoryStore::with_users(vec![admin.clone()]);
        let resolved = require_admin(&users, admin.token).await.unwrap();
        assert_eq!(resolved.id, admin.id);
    }

    #[tokio::test]
    async fn should_forbid_regular_user() {
        let alice = test_user("alice", "user", true);
        let users = MemoryStore::with_users(vec![alice.clone()]);
        let result = require_admin(&users, alice.token).await;
        assert!(matches!(result, Err(ApiError::Forbidden)));
    }

    #[tokio::test]
    async fn should_reject_unknown_token() {
        let users = MemoryStore::new();
        let result = require_admin(&users, Uuid::new_v4()).await;
        assert!(matches!(result, Err(ApiError::UserNotFound)));
    }
}
