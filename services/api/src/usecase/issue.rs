use chrono::Utc;
use uuid::Uuid;

use citywatch_domain::issue::IssueStatus;
use citywatch_domain::pagination::PageRequest;

use crate::domain::repository::{
    IssueRepository, IssueTypeRepository, Mailer, PhotoStorage, UserRepository,
};
use crate::domain::types::{
    Issue, IssueFilter, MAX_ADDRESS_LEN, MAX_FILE_BYTES, MAX_FILES_PER_ISSUE, MAX_SHORT_DESC_LEN,
    Photo, Upload, photo_extension, validate_coordinates, validate_text,
};
use crate::error::ApiError;
use crate::usecase::admin::require_admin;

// ── CreateIssue ──────────────────────────────────────────────────────────────

pub struct CreateIssueInput {
    pub token: Uuid,
    pub issue_type: String,
    pub short_desc: String,
    pub full_desc: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub files: Vec<Upload>,
}

impl CreateIssueInput {
    fn validate(&self) -> Result<(), ApiError> {
        if !validate_text(&self.short_desc, MAX_SHORT_DESC_LEN) {
            return Err(ApiError::Validation(
                "short_desc must be 1-200 characters".into(),
            ));
        }
        if !validate_text(&self.address, MAX_ADDRESS_LEN) {
            return Err(ApiError::Validation("address must be 1-255 characters".into()));
        }
        if !validate_coordinates(self.latitude, self.longitude) {
            return Err(ApiError::Validation(
                "latitude must be within [-90, 90] and longitude within [-180, 180]".into(),
            ));
        }
        if self.files.len() > MAX_FILES_PER_ISSUE {
            return Err(ApiError::TooManyFiles);
        }
        if self.files.iter().any(|f| f.bytes.len() > MAX_FILE_BYTES) {
            return Err(ApiError::FileTooLarge);
        }
        Ok(())
    }
}

pub struct CreateIssueUseCase<U, T, I, S>
where
    U: UserRepository,
    T: IssueTypeRepository,
    I: IssueRepository,
    S: PhotoStorage,
{
    pub users: U,
    pub issue_types: T,
    pub issues: I,
    pub storage: S,
}

impl<U, T, I, S> CreateIssueUseCase<U, T, I, S>
where
    U: UserRepository,
    T: IssueTypeRepository,
    I: IssueRepository,
    S: PhotoStorage,
{
    /// Create an issue with its photos, all or nothing.
    ///
    /// Every upload is checked before anything is written. Files are stored
    /// first and removed again if the database insert fails.
    pub async fn execute(&self, input: CreateIssueInput) -> Result<(Issue, Vec<Photo>), ApiError> {
        input.validate()?;

        let user = self
            .users
            .find_by_token(input.token)
            .await?
            .ok_or(ApiError::UserNotFound)?;
        if !user.email_verify {
            return Err(ApiError::EmailNotVerified);
        }
        if !self.issue_types.exists(&input.issue_type).await? {
            return Err(ApiError::UnknownIssueType);
        }

        let now = Utc::now();
        let issue = Issue {
            id: Uuid::now_v7(),
            user_id: user.id,
            issue_type: input.issue_type,
            short_desc: input.short_desc,
            full_desc: input.full_desc,
            status: IssueStatus::Open,
            address: input.address,
            latitude: input.latitude,
            longitude: input.longitude,
            created_at: now,
            updated_at: now,
        };

        let mut photos = Vec::with_capacity(input.files.len());
        for upload in &input.files {
            let id = Uuid::now_v7();
            let extension = photo_extension(upload.file_name.as_deref());
            match self.storage.store(id, &extension, &upload.bytes).await {
                Ok(file_path) => photos.push(Photo {
                    id,
                    issue_id: issue.id,
                    file_path,
                    uploaded_at: now,
                }),
                Err(e) => {
                    self.discard_files(&photos).await;
                    return Err(e.context("store photo").into());
                }
            }
        }

        if let Err(e) = self.issues.create_with_photos(&issue, &photos).await {
            self.discard_files(&photos).await;
            return Err(e);
        }
        Ok((issue, photos))
    }

    async fn discard_files(&self, photos: &[Photo]) {
        for photo in photos {
            if let Err(e) = self.storage.remove(&photo.file_path).await {
                tracing::warn!(path = %photo.file_path, error = %e, "failed to remove orphaned photo");
            }
        }
    }
}

// ── UpdateIssueStatus ────────────────────────────────────────────────────────

pub struct UpdateIssueStatusUseCase<U, I, M>
where
    U: UserRepository,
    I: IssueRepository,
    M: Mailer,
{
    pub users: U,
    pub issues: I,
    pub mailer: M,
}

impl<U, I, M> UpdateIssueStatusUseCase<U, I, M>
where
    U: UserRepository,
    I: IssueRepository,
    M: Mailer,
{
    /// Change an issue's status and notify its reporter.
    ///
    /// The status literal is checked before authorization so an invalid
    /// request never touches storage. Notification is best-effort.
    pub async fn execute(
        &self,
        token: Uuid,
        issue_id: Uuid,
        status: &str,
    ) -> Result<Issue, ApiError> {
        let status: IssueStatus = status.parse().map_err(|_| ApiError::UnknownStatus)?;
        require_admin(&self.users, token).await?;

        let issue = self
            .issues
            .update_status(issue_id, status, Utc::now())
            .await?
            .ok_or(ApiError::IssueNotFound)?;

        match self.users.find_by_id(issue.user_id).await {
            Ok(Some(owner)) => {
                if let Err(e) = self.mailer.send_status_changed(&owner.email, &issue).await {
                    tracing::warn!(issue_id = %issue.id, to = %owner.email, error = %e, "failed to send status notification");
                }
            }
            Ok(None) => {
                tracing::warn!(issue_id = %issue.id, "issue reporter no longer exists");
            }
            Err(e) => {
                tracing::warn!(issue_id = %issue.id, error = %e, "failed to load issue reporter");
            }
        }
        Ok(issue)
    }
}

// ── DeleteIssue ──────────────────────────────────────────────────────────────

pub struct DeleteIssueUseCase<U, I, S>
where
    U: UserRepository,
    I: IssueRepository,
    S: PhotoStorage,
{
    pub users: U,
    pub issues: I,
    pub storage: S,
}

impl<U, I, S> DeleteIssueUseCase<U, I, S>
where
    U: UserRepository,
    I: IssueRepository,
    S: PhotoStorage,
{
    /// Delete an issue and its photo rows; stored files are removed afterwards.
    pub async fn execute(&self, token: Uuid, issue_id: Uuid) -> Result<(), ApiError> {
        require_admin(&self.users, token).await?;
        let photos = self
            .issues
            .delete_with_photos(issue_id)
            .await?
            .ok_or(ApiError::IssueNotFound)?;
        for photo in &photos {
            if let Err(e) = self.storage.remove(&photo.file_path).await {
                tracing::warn!(path = %photo.file_path, error = %e, "failed to remove photo file");
            }
        }
        Ok(())
    }
}

// ── FindIssues ───────────────────────────────────────────────────────────────

pub struct FindIssuesUseCase<I: IssueRepository> {
    pub issues: I,
}

impl<I: IssueRepository> FindIssuesUseCase<I> {
    pub async fn execute(
        &self,
        filter: &IssueFilter,
        page: PageRequest,
    ) -> Result<Vec<Issue>, ApiError> {
        self.issues.find(filter, page.clamped()).await
    }
}

// ── CountIssues ──────────────────────────────────────────────────────────────

pub struct CountIssuesUseCase<I: IssueRepository> {
    pub issues: I,
}

impl<I: IssueRepository> CountIssuesUseCase<I> {
    pub async fn execute(&self) -> Result<u64, ApiError> {
        self.issues.count().await
    }
}
