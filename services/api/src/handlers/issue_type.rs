use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use citywatch_core::cache::cache_aside;

use crate::error::ApiError;
use crate::state::AppState;
use crate::usecase::issue_type::{
    CreateIssueTypeUseCase, DeleteIssueTypeUseCase, ListIssueTypesUseCase,
};

#[derive(Serialize, Deserialize)]
pub struct IssueTypeResponse {
    #[serde(rename = "type")]
    pub issue_type: String,
}

#[derive(Deserialize)]
pub struct IssueTypeRequest {
    pub token: Uuid,
    #[serde(rename = "type")]
    pub issue_type: String,
}

// ── GET /issue/types ─────────────────────────────────────────────────────────

pub async fn list_issue_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<IssueTypeResponse>>, ApiError> {
    let types = cache_aside(&state.cache(), "issue-types:list", state.cache_ttl.list, || async {
        let uc = ListIssueTypesUseCase {
            issue_types: state.issue_type_repo(),
        };
        let types = uc.execute().await?;
        Ok::<_, ApiError>(
            types
                .into_iter()
                .map(|issue_type| IssueTypeResponse { issue_type })
                .collect::<Vec<_>>(),
        )
    })
    .await?;
    Ok(Json(types))
}

// ── POST /issue/types ────────────────────────────────────────────────────────

pub async fn create_issue_type(
    State(state): State<AppState>,
    Json(body): Json<IssueTypeRequest>,
) -> Result<(StatusCode, Json<IssueTypeResponse>), ApiError> {
    let uc = CreateIssueTypeUseCase {
        users: state.user_repo(),
        issue_types: state.issue_type_repo(),
    };
    uc.execute(body.token, &body.issue_type).await?;
    Ok((
        StatusCode::CREATED,
        Json(IssueTypeResponse {
            issue_type: body.issue_type,
        }),
    ))
}

// ── DELETE /issue/types ──────────────────────────────────────────────────────

pub async fn delete_issue_type(
    State(state): State<AppState>,
    Json(body): Json<IssueTypeRequest>,
) -> Result<StatusCode, ApiError> {
    let uc = DeleteIssueTypeUseCase {
        users: state.user_repo(),
        issue_types: state.issue_type_repo(),
    };
    uc.execute(body.token, &body.issue_type).await?;
    Ok(StatusCode::NO_CONTENT)
}
