use std::collections::HashMap;

use axum::{
    Json,
    extract::{Multipart, RawQuery, State, multipart::MultipartError},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use citywatch_core::cache::{cache_aside, cache_key};
use citywatch_domain::issue::IssueStatus;
use citywatch_domain::pagination::PageRequest;

use crate::domain::types::{Issue, IssueFilter, MAX_FILE_BYTES, MAX_FILES_PER_ISSUE, Upload};
use crate::error::ApiError;
use crate::handlers::parse_query;
use crate::handlers::photo::PhotoResponse;
use crate::state::AppState;
use crate::usecase::issue::{
    CountIssuesUseCase, CreateIssueInput, CreateIssueUseCase, DeleteIssueUseCase,
    FindIssuesUseCase, UpdateIssueStatusUseCase,
};

/// Body limit for `/issue/create`. Leaves room for one photo past the
/// per-issue cap, so a batch of full-size photos that is one too many still
/// reaches the file-count check, plus 1 MiB of form overhead.
pub const CREATE_ISSUE_BODY_LIMIT: usize =
    (MAX_FILES_PER_ISSUE + 1) * MAX_FILE_BYTES + 1024 * 1024;

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct IssueResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub issue_type: String,
    pub short_desc: String,
    pub full_desc: String,
    pub status: IssueStatus,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(serialize_with = "citywatch_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "citywatch_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
}

impl From<Issue> for IssueResponse {
    fn from(issue: Issue) -> Self {
        Self {
            id: issue.id,
            user_id: issue.user_id,
            issue_type: issue.issue_type,
            short_desc: issue.short_desc,
            full_desc: issue.full_desc,
            status: issue.status,
            address: issue.address,
            latitude: issue.latitude,
            longitude: issue.longitude,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
        }
    }
}

#[derive(Serialize)]
pub struct CreatedIssueResponse {
    #[serde(flatten)]
    pub issue: IssueResponse,
    pub photos: Vec<PhotoResponse>,
}

#[derive(Serialize, Deserialize)]
pub struct IssueAmountResponse {
    pub amount: u64,
}

// ── Request types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub id: Uuid,
    pub token: Uuid,
    pub status: String,
}

#[derive(Deserialize)]
pub struct DeleteIssueRequest {
    pub id: Uuid,
    pub token: Uuid,
}

#[derive(Deserialize, Serialize, Default)]
pub struct FindIssuesQuery {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    pub short_desc: Option<String>,
    pub full_desc: Option<String>,
    pub status: Option<String>,
    pub address: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// ── POST /issue/create ───────────────────────────────────────────────────────

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::Validation(format!(
            "request body exceeds {CREATE_ISSUE_BODY_LIMIT} bytes"
        ))
    } else {
        ApiError::Validation(format!("malformed multipart body: {}", e.body_text()))
    }
}

fn required(fields: &mut HashMap<String, String>, name: &str) -> Result<String, ApiError> {
    fields
        .remove(name)
        .ok_or_else(|| ApiError::Validation(format!("missing field `{name}`")))
}

fn coordinate(fields: &mut HashMap<String, String>, name: &str) -> Result<f64, ApiError> {
    required(fields, name)?
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation(format!("`{name}` must be a number")))
}

/// Collect text fields and `files` parts from the form. Empty file parts
/// (a file input left blank) are skipped.
async fn read_form(
    mut multipart: Multipart,
) -> Result<(HashMap<String, String>, Vec<Upload>), ApiError> {
    let mut fields = HashMap::new();
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_owned();
        if name == "files" || name == "file" {
            let file_name = field.file_name().map(str::to_owned);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            if bytes.is_empty() && file_name.as_deref().is_none_or(str::is_empty) {
                continue;
            }
            files.push(Upload { file_name, bytes });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            fields.insert(name, value);
        }
    }
    Ok((fields, files))
}

pub async fn create_issue(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedIssueResponse>), ApiError> {
    let (mut fields, files) = read_form(multipart).await?;
    let token = required(&mut fields, "token")?
        .trim()
        .parse::<Uuid>()
        .map_err(|_| ApiError::Validation("`token` must be a UUID".into()))?;
    let input = CreateIssueInput {
        token,
        issue_type: required(&mut fields, "type")?,
        short_desc: required(&mut fields, "short_desc")?,
        full_desc: fields.remove("full_desc").unwrap_or_default(),
        address: required(&mut fields, "address")?,
        latitude: coordinate(&mut fields, "latitude")?,
        longitude: coordinate(&mut fields, "longitude")?,
        files,
    };

    let uc = CreateIssueUseCase {
        users: state.user_repo(),
        issue_types: state.issue_type_repo(),
        issues: state.issue_repo(),
        storage: state.storage.clone(),
    };
    let (issue, photos) = uc.execute(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedIssueResponse {
            issue: issue.into(),
            photos: photos.into_iter().map(PhotoResponse::from).collect(),
        }),
    ))
}

// ── POST /issue/status ───────────────────────────────────────────────────────

pub async fn update_status(
    State(state): State<AppState>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<IssueResponse>, ApiError> {
    let uc = UpdateIssueStatusUseCase {
        users: state.user_repo(),
        issues: state.issue_repo(),
        mailer: state.mailer.clone(),
    };
    let issue = uc.execute(body.token, body.id, &body.status).await?;
    Ok(Json(issue.into()))
}

// ── DELETE /issue/delete ─────────────────────────────────────────────────────

pub async fn delete_issue(
    State(state): State<AppState>,
    Json(body): Json<DeleteIssueRequest>,
) -> Result<StatusCode, ApiError> {
    let uc = DeleteIssueUseCase {
        users: state.user_repo(),
        issues: state.issue_repo(),
        storage: state.storage.clone(),
    };
    uc.execute(body.token, body.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── GET /issue/find ──────────────────────────────────────────────────────────

pub async fn find_issues(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Vec<IssueResponse>>, ApiError> {
    let query: FindIssuesQuery = parse_query(raw_query)?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<IssueStatus>)
        .transpose()
        .map_err(|_| ApiError::UnknownStatus)?;
    let filter = IssueFilter {
        id: query.id,
        user_id: query.user_id,
        issue_type: query.issue_type.clone(),
        short_desc: query.short_desc.clone(),
        full_desc: query.full_desc.clone(),
        status,
        address: query.address.clone(),
    };
    let page = PageRequest::new(query.page, query.page_size);

    let key = cache_key("issues:find", &query);
    let issues = cache_aside(&state.cache(), &key, state.cache_ttl.list, || async {
        let uc = FindIssuesUseCase {
            issues: state.issue_repo(),
        };
        let issues = uc.execute(&filter, page).await?;
        Ok::<_, ApiError>(
            issues
                .into_iter()
                .map(IssueResponse::from)
                .collect::<Vec<_>>(),
        )
    })
    .await?;
    Ok(Json(issues))
}

// ── GET /issue/amount ────────────────────────────────────────────────────────

pub async fn issue_amount(
    State(state): State<AppState>,
) -> Result<Json<IssueAmountResponse>, ApiError> {
    let response = cache_aside(&state.cache(), "issues:amount", state.cache_ttl.list, || async {
        let uc = CountIssuesUseCase {
            issues: state.issue_repo(),
        };
        let amount = uc.execute().await?;
        Ok::<_, ApiError>(IssueAmountResponse { amount })
    })
    .await?;
    Ok(Json(response))
}
