use axum::{
    Json,
    extract::{RawQuery, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use citywatch_core::cache::{cache_aside, cache_key};
use citywatch_domain::issue::{IssueStatus, TimeBucket};

use crate::error::ApiError;
use crate::handlers::parse_query;
use crate::state::AppState;
use crate::usecase::statistics::{
    AverageResolutionTimeUseCase, IssuesByAreaUseCase, IssuesByStatusUseCase,
    IssuesByTypeUseCase, IssuesOverTimeUseCase,
};

// ── Response types ───────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct TypeCountResponse {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub count: i64,
}

#[derive(Serialize, Deserialize)]
pub struct StatusCountResponse {
    pub status: IssueStatus,
    pub count: i64,
}

#[derive(Serialize, Deserialize)]
pub struct TimeCountResponse {
    #[serde(serialize_with = "citywatch_core::serde::to_rfc3339_ms")]
    pub period: DateTime<Utc>,
    pub count: i64,
}

#[derive(Serialize, Deserialize)]
pub struct AreaCountResponse {
    pub address: String,
    pub count: i64,
}

#[derive(Serialize, Deserialize)]
pub struct ResolutionTimeResponse {
    /// `null` until at least one issue is completed.
    pub average_seconds: Option<f64>,
    pub completed: i64,
}

#[derive(Deserialize, Serialize, Default)]
pub struct OverTimeQuery {
    #[serde(default)]
    pub bucket: TimeBucket,
}

// ── GET /statistics/types ────────────────────────────────────────────────────

pub async fn issues_by_type(
    State(state): State<AppState>,
) -> Result<Json<Vec<TypeCountResponse>>, ApiError> {
    let counts = cache_aside(&state.cache(), "stats:types", state.cache_ttl.stats, || async {
        let uc = IssuesByTypeUseCase {
            stats: state.statistics_repo(),
            issue_types: state.issue_type_repo(),
        };
        let counts = uc.execute().await?;
        Ok::<_, ApiError>(
            counts
                .into_iter()
                .map(|c| TypeCountResponse {
                    issue_type: c.issue_type,
                    count: c.count,
                })
                .collect::<Vec<_>>(),
        )
    })
    .await?;
    Ok(Json(counts))
}

// ── GET /statistics/status ───────────────────────────────────────────────────

pub async fn issues_by_status(
    State(state): State<AppState>,
) -> Result<Json<Vec<StatusCountResponse>>, ApiError> {
    let counts = cache_aside(&state.cache(), "stats:status", state.cache_ttl.stats, || async {
        let uc = IssuesByStatusUseCase {
            stats: state.statistics_repo(),
        };
        let counts = uc.execute().await?;
        Ok::<_, ApiError>(
            counts
                .into_iter()
                .map(|c| StatusCountResponse {
                    status: c.status,
                    count: c.count,
                })
                .collect::<Vec<_>>(),
        )
    })
    .await?;
    Ok(Json(counts))
}

// ── GET /statistics/time ─────────────────────────────────────────────────────

pub async fn issues_over_time(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Vec<TimeCountResponse>>, ApiError> {
    let query: OverTimeQuery = parse_query(raw_query)?;
    let key = cache_key("stats:time", &query);
    let counts = cache_aside(&state.cache(), &key, state.cache_ttl.stats, || async {
        let uc = IssuesOverTimeUseCase {
            stats: state.statistics_repo(),
        };
        let counts = uc.execute(query.bucket).await?;
        Ok::<_, ApiError>(
            counts
                .into_iter()
                .map(|c| TimeCountResponse {
                    period: c.bucket,
                    count: c.count,
                })
                .collect::<Vec<_>>(),
        )
    })
    .await?;
    Ok(Json(counts))
}

// ── GET /statistics/area ─────────────────────────────────────────────────────

pub async fn issues_by_area(
    State(state): State<AppState>,
) -> Result<Json<Vec<AreaCountResponse>>, ApiError> {
    let counts = cache_aside(&state.cache(), "stats:area", state.cache_ttl.stats, || async {
        let uc = IssuesByAreaUseCase {
            stats: state.statistics_repo(),
        };
        let counts = uc.execute().await?;
        Ok::<_, ApiError>(
            counts
                .into_iter()
                .map(|c| AreaCountResponse {
                    address: c.address,
                    count: c.count,
                })
                .collect::<Vec<_>>(),
        )
    })
    .await?;
    Ok(Json(counts))
}

// ── GET /statistics/average-time ─────────────────────────────────────────────

pub async fn average_resolution_time(
    State(state): State<AppState>,
) -> Result<Json<ResolutionTimeResponse>, ApiError> {
    let response = cache_aside(
        &state.cache(),
        "stats:average-time",
        state.cache_ttl.stats,
        || async {
            let uc = AverageResolutionTimeUseCase {
                stats: state.statistics_repo(),
            };
            let time = uc.execute().await?;
            Ok::<_, ApiError>(ResolutionTimeResponse {
                average_seconds: time.average_seconds,
                completed: time.completed,
            })
        },
    )
    .await?;
    Ok(Json(response))
}
