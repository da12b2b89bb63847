use axum::{
    Json,
    extract::{RawQuery, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use citywatch_core::cache::{cache_aside, cache_key};
use citywatch_domain::pagination::PageRequest;

use crate::domain::types::{Photo, PhotoFilter};
use crate::error::ApiError;
use crate::handlers::parse_query;
use crate::state::AppState;
use crate::usecase::photo::FindPhotosUseCase;

#[derive(Serialize, Deserialize)]
pub struct PhotoResponse {
    pub id: Uuid,
    pub issue_id: Uuid,
    /// Path relative to the static root.
    pub file_path: String,
    /// Where the file is served by this API.
    pub url: String,
    #[serde(serialize_with = "citywatch_core::serde::to_rfc3339_ms")]
    pub uploaded_at: DateTime<Utc>,
}

impl From<Photo> for PhotoResponse {
    fn from(photo: Photo) -> Self {
        Self {
            id: photo.id,
            issue_id: photo.issue_id,
            url: format!("/static/{}", photo.file_path),
            file_path: photo.file_path,
            uploaded_at: photo.uploaded_at,
        }
    }
}

#[derive(Deserialize, Serialize, Default)]
pub struct FindPhotosQuery {
    pub id: Option<Uuid>,
    pub issue_id: Option<Uuid>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// ── GET /photos ──────────────────────────────────────────────────────────────

pub async fn find_photos(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
) -> Result<Json<Vec<PhotoResponse>>, ApiError> {
    let query: FindPhotosQuery = parse_query(raw_query)?;
    let filter = PhotoFilter {
        id: query.id,
        issue_id: query.issue_id,
    };
    let page = PageRequest::new(query.page, query.page_size);

    let key = cache_key("photos:find", &query);
    let photos = cache_aside(&state.cache(), &key, state.cache_ttl.list, || async {
        let uc = FindPhotosUseCase {
            photos: state.photo_repo(),
        };
        let photos = uc.execute(&filter, page).await?;
        Ok::<_, ApiError>(
            photos
                .into_iter()
                .map(PhotoResponse::from)
                .collect::<Vec<_>>(),
        )
    })
    .await?;
    Ok(Json(photos))
}
