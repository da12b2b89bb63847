use citywatch_domain::pagination::PageRequest;

use crate::domain::repository::PhotoRepository;
use crate::domain::types::{Photo, PhotoFilter};
use crate::error::ApiError;

pub struct FindPhotosUseCase<P: PhotoRepository> {
    pub photos: P,
}

impl<P: PhotoRepository> FindPhotosUseCase<P> {
    pub async fn execute(
        &self,
        filter: &PhotoFilter,
        page: PageRequest,
    ) -> Result<Vec<Photo>, ApiError> {
        self.photos.find(filter, page.clamped()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::testing::MemoryStore;

    fn photo(issue_id: Uuid) -> Photo {
        Photo {
            id: Uuid::now_v7(),
            issue_id,
            file_path: format!("photos/{}.jpg", Uuid::now_v7()),
            uploaded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn should_filter_photos_by_issue() {
        let issue = Uuid::now_v7();
        let uc = FindPhotosUseCase {
            photos: MemoryStore::with_issues(
                vec![],
                vec![photo(issue), photo(issue), photo(Uuid::now_v7())],
            ),
        };
        let found = uc
            .execute(
                &PhotoFilter {
                    issue_id: Some(issue),
                    ..PhotoFilter::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.issue_id == issue));
    }

    #[tokio::test]
    async fn should_return_empty_for_unknown_photo_id() {
        let uc = FindPhotosUseCase {
            photos: MemoryStore::with_issues(vec![], vec![photo(Uuid::now_v7())]),
        };
        let found = uc
            .execute(
                &PhotoFilter {
                    id: Some(Uuid::now_v7()),
                    ..PhotoFilter::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert!(found.is_empty());
    }
}
