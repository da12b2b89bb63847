use chrono::Utc;
use uuid::Uuid;

use citywatch_domain::user::DEFAULT_ROLE;

use crate::domain::repository::{Mailer, UserRepository};
use crate::domain::types::{
    User, normalize_email, validate_email, validate_password, validate_username,
};
use crate::error::ApiError;
use crate::usecase::password::{hash_password, verify_password};

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginInput {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: String,
}

pub struct LoginUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> LoginUseCase<U> {
    pub async fn execute(&self, input: LoginInput) -> Result<User, ApiError> {
        let user = match (input.email, input.username) {
            (Some(email), None) => self.users.find_by_email(&normalize_email(&email)).await?,
            (None, Some(username)) => self.users.find_by_username(&username).await?,
            _ => {
                return Err(ApiError::Validation(
                    "exactly one of email or username is required".into(),
                ));
            }
        }
        .ok_or(ApiError::UserNotFound)?;

        if !verify_password(&input.password, &user.password_hash) {
            return Err(ApiError::InvalidCredential);
        }
        Ok(user)
    }
}

// ── Register ─────────────────────────────────────────────────────────────────

pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct RegisterUseCase<U: UserRepository, M: Mailer> {
    pub users: U,
    pub mailer: M,
}

impl<U: UserRepository, M: Mailer> RegisterUseCase<U, M> {
    /// Create an unverified account and mail its verification link.
    ///
    /// Mail delivery is best-effort: the account exists even if sending fails.
    pub async fn execute(&self, input: RegisterInput) -> Result<User, ApiError> {
        let email = normalize_email(&input.email);
        if !validate_username(&input.username) {
            return Err(ApiError::Validation("username must be 1-50 characters".into()));
        }
        if !validate_email(&email) {
            return Err(ApiError::Validation("invalid email address".into()));
        }
        if !validate_password(&input.password) {
            return Err(ApiError::Validation("password must not be empty".into()));
        }

        let user = User {
            id: Uuid::now_v7(),
            username: input.username,
            email,
            password_hash: hash_password(&input.password)?,
            role: DEFAULT_ROLE.to_owned(),
            rating: 0,
            created_at: Utc::now(),
            token: Uuid::new_v4(),
            email_verify: false,
            verify_token: Uuid::new_v4(),
        };
        self.users.create(&user).await?;

        if let Err(e) = self
            .mailer
            .send_verification(&user.email, user.verify_token)
            .await
        {
            tracing::warn!(user_id = %user.id, to = %user.email, error = %e, "failed to send verification mail");
        }
        Ok(user)
    }
}

// ── VerifyEmail ──────────────────────────────────────────────────────────────

pub struct VerifyEmailUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> VerifyEmailUseCase<U> {
    /// Consume a verification token. The token is rotated, so a link works once.
    pub async fn execute(&self, verify_token: Uuid) -> Result<User, ApiError> {
        self.users
            .verify_email(verify_token, Uuid::new_v4())
            .await?
            .ok_or(ApiError::TokenNotFound)
    }
}

// ── ChangePassword ───────────────────────────────────────────────────────────

pub struct ChangePasswordInput {
    pub token: Uuid,
    pub old_password: String,
    pub new_password: String,
}

pub struct ChangePasswordUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ChangePasswordUseCase<U> {
    /// Returns the account with its rotated tokens.
    pub async fn execute(&self, input: ChangePasswordInput) -> Result<User, ApiError> {
        if !validate_password(&input.new_password) {
            return Err(ApiError::Validation("password must not be empty".into()));
        }
        let mut user = self
            .users
            .find_by_token(input.token)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if !verify_password(&input.old_password, &user.password_hash) {
            return Err(ApiError::InvalidCredential);
        }

        user.password_hash = hash_password(&input.new_password)?;
        user.token = Uuid::new_v4();
        user.verify_token = Uuid::new_v4();
        let updated = self
            .users
            .update_password(user.id, &user.password_hash, user.token, user.verify_token)
            .await?;
        if !updated {
            return Err(ApiError::UserNotFound);
        }
        Ok(user)
    }
}

// ── ForgotPassword ───────────────────────────────────────────────────────────

pub struct ForgotPasswordUseCase<U: UserRepository, M: Mailer> {
    pub users: U,
    pub mailer: M,
}

impl<U: UserRepository, M: Mailer> ForgotPasswordUseCase<U, M> {
    /// Mail a reset link to a verified account. Delivery failure is reported.
    pub async fn execute(&self, email: &str) -> Result<(), ApiError> {
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if !user.email_verify {
            return Err(ApiError::EmailNotVerified);
        }
        self.mailer
            .send_password_reset(&user.email, user.verify_token)
            .await
            .map_err(|e| {
                tracing::warn!(user_id = %user.id, to = %user.email, error = %e, "failed to send password reset mail");
                ApiError::MailUnavailable
            })
    }
}

// ── ResetPassword ────────────────────────────────────────────────────────────

pub struct ResetPasswordInput {
    pub verify_token: Uuid,
    pub new_password: String,
}

pub struct ResetPasswordUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ResetPasswordUseCase<U> {
    /// Set a new password from a mailed token. Both tokens are rotated.
    pub async fn execute(&self, input: ResetPasswordInput) -> Result<User, ApiError> {
        if !validate_password(&input.new_password) {
            return Err(ApiError::Validation("password must not be empty".into()));
        }
        let password_hash = hash_password(&input.new_password)?;
        self.users
            .reset_password(
                input.verify_token,
                &password_hash,
                Uuid::new_v4(),
                Uuid::new_v4(),
            )
            .await?
            .ok_or(ApiError::InvalidToken)
    }
}
