use axum::{
    Json,
    extract::{Query, RawQuery, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use citywatch_core::cache::{cache_aside, cache_key};
use citywatch_domain::pagination::PageRequest;

use crate::domain::types::User;
use crate::error::ApiError;
use crate::handlers::parse_query;
use crate::state::AppState;
use crate::usecase::auth::{
    ChangePasswordInput, ChangePasswordUseCase, ForgotPasswordUseCase, LoginInput, LoginUseCase,
    RegisterInput, RegisterUseCase, ResetPasswordInput, ResetPasswordUseCase, VerifyEmailUseCase,
};
use crate::usecase::user::{
    ChangeRoleUseCase, CountUserIssuesUseCase, CreateRoleUseCase, DeleteUserUseCase,
    ListRolesUseCase, ListUsersUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

/// The caller's own account, including the bearer token.
#[derive(Serialize)]
pub struct IdentityResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub rating: i32,
    pub token: Uuid,
    pub email_verify: bool,
    #[serde(serialize_with = "citywatch_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for IdentityResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            rating: user.rating,
            token: user.token,
            email_verify: user.email_verify,
            created_at: user.created_at,
        }
    }
}

/// Account as seen by other callers; never carries credentials.
#[derive(Serialize, Deserialize)]
pub struct PublicUserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub rating: i32,
    #[serde(serialize_with = "citywatch_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            rating: user.rating,
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct RoleResponse {
    pub role: String,
}

#[derive(Serialize, Deserialize)]
pub struct IssuesCountResponse {
    pub user_id: Uuid,
    pub count: u64,
}

// ── Request types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct DeleteUserRequest {
    pub id: Uuid,
    pub token: Uuid,
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub token: Uuid,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub token: Uuid,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Uuid,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub user_id: Uuid,
    pub token: Uuid,
    pub role: String,
}

#[derive(Deserialize)]
pub struct CreateRoleRequest {
    pub token: Uuid,
    pub role: String,
}

#[derive(Deserialize, Serialize, Default)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Deserialize)]
pub struct IssuesCountQuery {
    pub user_id: Uuid,
}

// ── POST /user/login ─────────────────────────────────────────────────────────

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let uc = LoginUseCase {
        users: state.user_repo(),
    };
    let user = uc
        .execute(LoginInput {
            email: body.email,
            username: body.username,
            password: body.password,
        })
        .await?;
    Ok(Json(user.into()))
}

// ── POST /user/register ──────────────────────────────────────────────────────

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<IdentityResponse>), ApiError> {
    let uc = RegisterUseCase {
        users: state.user_repo(),
        mailer: state.mailer.clone(),
    };
    let user = uc
        .execute(RegisterInput {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

// ── GET /user ────────────────────────────────────────────────────────────────

pub async fn list_users(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Vec<PublicUserResponse>>, ApiError> {
    let query: ListUsersQuery = parse_query(raw_query)?;
    let page = PageRequest::new(query.page, query.page_size);
    let key = cache_key("users:list", &page);
    let users = cache_aside(&state.cache(), &key, state.cache_ttl.list, || async {
        let uc = ListUsersUseCase {
            users: state.user_repo(),
        };
        let users = uc.execute(page).await?;
        Ok::<_, ApiError>(
            users
                .into_iter()
                .map(PublicUserResponse::from)
                .collect::<Vec<_>>(),
        )
    })
    .await?;
    Ok(Json(users))
}

// ── DELETE /user ─────────────────────────────────────────────────────────────

pub async fn delete_user(
    State(state): State<AppState>,
    Json(body): Json<DeleteUserRequest>,
) -> Result<StatusCode, ApiError> {
    let uc = DeleteUserUseCase {
        users: state.user_repo(),
    };
    uc.execute(body.token, body.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── POST/GET /user/verify-email ──────────────────────────────────────────────

pub async fn verify_email(
    State(state): State<AppState>,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let uc = VerifyEmailUseCase {
        users: state.user_repo(),
    };
    let user = uc.execute(body.token).await?;
    Ok(Json(user.into()))
}

/// Target of the mailed verification link.
pub async fn verify_email_link(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailRequest>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let uc = VerifyEmailUseCase {
        users: state.user_repo(),
    };
    let user = uc.execute(query.token).await?;
    Ok(Json(user.into()))
}

// ── POST /user/change-password ───────────────────────────────────────────────

pub async fn change_password(
    State(state): State<AppState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let uc = ChangePasswordUseCase {
        users: state.user_repo(),
    };
    let user = uc
        .execute(ChangePasswordInput {
            token: body.token,
            old_password: body.old_password,
            new_password: body.new_password,
        })
        .await?;
    Ok(Json(user.into()))
}

// ── POST /user/forgot-password ───────────────────────────────────────────────

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let uc = ForgotPasswordUseCase {
        users: state.user_repo(),
        mailer: state.mailer.clone(),
    };
    uc.execute(&body.email).await?;
    Ok(StatusCode::ACCEPTED)
}

// ── POST /user/reset-password ────────────────────────────────────────────────

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let uc = ResetPasswordUseCase {
        users: state.user_repo(),
    };
    let user = uc
        .execute(ResetPasswordInput {
            verify_token: body.token,
            new_password: body.new_password,
        })
        .await?;
    Ok(Json(user.into()))
}

// ── POST /user/change-role ───────────────────────────────────────────────────

pub async fn change_role(
    State(state): State<AppState>,
    Json(body): Json<ChangeRoleRequest>,
) -> Result<Json<PublicUserResponse>, ApiError> {
    let uc = ChangeRoleUseCase {
        users: state.user_repo(),
    };
    let user = uc.execute(body.token, body.user_id, &body.role).await?;
    Ok(Json(user.into()))
}

// ── POST /user/create-role ───────────────────────────────────────────────────

pub async fn create_role(
    State(state): State<AppState>,
    Json(body): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleResponse>), ApiError> {
    let uc = CreateRoleUseCase {
        users: state.user_repo(),
        roles: state.role_repo(),
    };
    uc.execute(body.token, &body.role).await?;
    Ok((StatusCode::CREATED, Json(RoleResponse { role: body.role })))
}

// ── GET /user/roles ──────────────────────────────────────────────────────────

pub async fn list_roles(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleResponse>>, ApiError> {
    let uc = ListRolesUseCase {
        roles: state.role_repo(),
    };
    let roles = uc.execute().await?;
    Ok(Json(
        roles.into_iter().map(|role| RoleResponse { role }).collect(),
    ))
}

// ── GET /user/issues-count ───────────────────────────────────────────────────

pub async fn issues_count(
    State(state): State<AppState>,
    Query(query): Query<IssuesCountQuery>,
) -> Result<Json<IssuesCountResponse>, ApiError> {
    let key = cache_key("users:issues-count", &query.user_id);
    let response = cache_aside(&state.cache(), &key, state.cache_ttl.list, || async {
        let uc = CountUserIssuesUseCase {
            issues: state.issue_repo(),
        };
        let count = uc.execute(query.user_id).await?;
        Ok::<_, ApiError>(IssuesCountResponse {
            user_id: query.user_id,
            count,
        })
    })
    .await?;
    Ok(Json(response))
}
