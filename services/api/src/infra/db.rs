use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, FromQueryResult, IntoActiveModel as _, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, Statement, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use citywatch_api_migration::{UQ_USERS_EMAIL, UQ_USERS_USERNAME};
use citywatch_api_schema::{issue_types, issues, photos, roles, users};
use citywatch_domain::issue::{IssueStatus, TimeBucket};
use citywatch_domain::pagination::PageRequest;

use crate::domain::repository::{
    IssueRepository, IssueTypeRepository, PhotoRepository, RoleRepository, StatisticsRepository,
    UserRepository,
};
use crate::domain::types::{Issue, IssueFilter, Photo, PhotoFilter, User};
use crate::error::ApiError;

/// Message of a unique-constraint violation, if `err` is one.
fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => Some(message),
        _ => None,
    }
}

fn is_foreign_key_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl DbUserRepository {
    async fn find_one(
        &self,
        filter: sea_orm::sea_query::SimpleExpr,
        what: &'static str,
    ) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find()
            .filter(filter)
            .one(&self.db)
            .await
            .context(what)?;
        Ok(model.map(user_from_model))
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        Ok(model.map(user_from_model))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        self.find_one(users::Column::Username.eq(username), "find user by username")
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        self.find_one(users::Column::Email.eq(email), "find user by email")
            .await
    }

    async fn find_by_token(&self, token: Uuid) -> Result<Option<User>, ApiError> {
        self.find_one(users::Column::Token.eq(token), "find user by token")
            .await
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<User>, ApiError> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("list users")?;
        Ok(models.into_iter().map(user_from_model).collect())
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        let result = users::ActiveModel {
            id: Set(user.id),
            username: Set(user.username.clone()),
            email: Set(user.email.clone()),
            password: Set(user.password_hash.clone()),
            role: Set(user.role.clone()),
            rating: Set(user.rating),
            created_at: Set(user.created_at),
            token: Set(user.token),
            email_verify: Set(user.email_verify),
            verify_token: Set(user.verify_token),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match unique_violation(&e) {
                Some(message) if message.contains(UQ_USERS_EMAIL) => Err(ApiError::EmailTaken),
                Some(message) if message.contains(UQ_USERS_USERNAME) => {
                    Err(ApiError::UsernameTaken)
                }
                _ => Err(anyhow::Error::new(e).context("create user").into()),
            },
        }
    }

    async fn verify_email(
        &self,
        verify_token: Uuid,
        new_verify_token: Uuid,
    ) -> Result<Option<User>, ApiError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::EmailVerify, Expr::value(true))
            .col_expr(users::Column::VerifyToken, Expr::value(new_verify_token))
            .filter(users::Column::VerifyToken.eq(verify_token))
            .exec(&self.db)
            .await
            .context("verify email")?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_one(
            users::Column::VerifyToken.eq(new_verify_token),
            "find user by verify token",
        )
        .await
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        token: Uuid,
        verify_token: Uuid,
    ) -> Result<bool, ApiError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::Password, Expr::value(password_hash))
            .col_expr(users::Column::Token, Expr::value(token))
            .col_expr(users::Column::VerifyToken, Expr::value(verify_token))
            .filter(users::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .context("update password")?;
        Ok(result.rows_affected > 0)
    }

    async fn reset_password(
        &self,
        verify_token: Uuid,
        password_hash: &str,
        token: Uuid,
        new_verify_token: Uuid,
    ) -> Result<Option<User>, ApiError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::Password, Expr::value(password_hash))
            .col_expr(users::Column::Token, Expr::value(token))
            .col_expr(users::Column::VerifyToken, Expr::value(new_verify_token))
            .filter(users::Column::VerifyToken.eq(verify_token))
            .exec(&self.db)
            .await
            .context("reset password")?;
        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_token(token).await
    }

    async fn update_role(&self, id: Uuid, role: &str) -> Result<bool, ApiError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::Role, Expr::value(role))
            .filter(users::Column::Id.eq(id))
            .exec(&self.db)
            .await;
        match result {
            Ok(result) => Ok(result.rows_affected > 0),
            Err(e) if is_foreign_key_violation(&e) => Err(ApiError::RoleNotFound),
            Err(e) => Err(anyhow::Error::new(e).context("update user role").into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = users::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected > 0)
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        password_hash: model.password,
        role: model.role,
        rating: model.rating,
        created_at: model.created_at,
        token: model.token,
        email_verify: model.email_verify,
        verify_token: model.verify_token,
    }
}

// ── Role repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRoleRepository {
    pub db: DatabaseConnection,
}

impl RoleRepository for DbRoleRepository {
    async fn list(&self) -> Result<Vec<String>, ApiError> {
        let models = roles::Entity::find()
            .order_by_asc(roles::Column::Role)
            .all(&self.db)
            .await
            .context("list roles")?;
        Ok(models.into_iter().map(|m| m.role).collect())
    }

    async fn create(&self, role: &str) -> Result<(), ApiError> {
        let result = roles::ActiveModel {
            role: Set(role.to_owned()),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if unique_violation(&e).is_some() => Err(ApiError::RoleAlreadyExists),
            Err(e) => Err(anyhow::Error::new(e).context("create role").into()),
        }
    }
}

// ── Issue type repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbIssueTypeRepository {
    pub db: DatabaseConnection,
}

impl IssueTypeRepository for DbIssueTypeRepository {
    async fn list(&self) -> Result<Vec<String>, ApiError> {
        let models = issue_types::Entity::find()
            .order_by_asc(issue_types::Column::IssueType)
            .all(&self.db)
            .await
            .context("list issue types")?;
        Ok(models.into_iter().map(|m| m.issue_type).collect())
    }

    async fn exists(&self, issue_type: &str) -> Result<bool, ApiError> {
        let model = issue_types::Entity::find_by_id(issue_type.to_owned())
            .one(&self.db)
            .await
            .context("find issue type")?;
        Ok(model.is_some())
    }

    async fn create(&self, issue_type: &str) -> Result<(), ApiError> {
        let result = issue_types::ActiveModel {
            issue_type: Set(issue_type.to_owned()),
        }
        .insert(&self.db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if unique_violation(&e).is_some() => Err(ApiError::IssueTypeAlreadyExists),
            Err(e) => Err(anyhow::Error::new(e).context("create issue type").into()),
        }
    }

    async fn delete(&self, issue_type: &str) -> Result<bool, ApiError> {
        let result = issue_types::Entity::delete_by_id(issue_type.to_owned())
            .exec(&self.db)
            .await
            .context("delete issue type")?;
        Ok(result.rows_affected > 0)
    }
}

// ── Issue repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbIssueRepository {
    pub db: DatabaseConnection,
}

impl IssueRepository for DbIssueRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Issue>, ApiError> {
        let model = issues::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find issue by id")?;
        model.map(issue_from_model).transpose()
    }

    async fn find(&self, filter: &IssueFilter, page: PageRequest) -> Result<Vec<Issue>, ApiError> {
        let mut query = issues::Entity::find();
        if let Some(id) = filter.id {
            query = query.filter(issues::Column::Id.eq(id));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(issues::Column::UserId.eq(user_id));
        }
        if let Some(ref issue_type) = filter.issue_type {
            query = query.filter(issues::Column::IssueType.eq(issue_type.as_str()));
        }
        if let Some(ref short_desc) = filter.short_desc {
            query = query.filter(issues::Column::ShortDesc.eq(short_desc.as_str()));
        }
        if let Some(ref full_desc) = filter.full_desc {
            query = query.filter(issues::Column::FullDesc.eq(full_desc.as_str()));
        }
        if let Some(status) = filter.status {
            query = query.filter(issues::Column::Status.eq(status.as_str()));
        }
        if let Some(ref address) = filter.address {
            query = query.filter(issues::Column::Address.eq(address.as_str()));
        }

        let models = query
            .order_by_asc(issues::Column::CreatedAt)
            .order_by_asc(issues::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("find issues")?;
        models.into_iter().map(issue_from_model).collect()
    }

    async fn count(&self) -> Result<u64, ApiError> {
        let count = issues::Entity::find()
            .count(&self.db)
            .await
            .context("count issues")?;
        Ok(count)
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, ApiError> {
        let count = issues::Entity::find()
            .filter(issues::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .context("count issues by user")?;
        Ok(count)
    }

    async fn create_with_photos(
        &self,
        issue: &Issue,
        new_photos: &[Photo],
    ) -> Result<(), ApiError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                let issue = issue.clone();
                let rows = new_photos.to_vec();
                Box::pin(async move {
                    issues::ActiveModel {
                        id: Set(issue.id),
                        user_id: Set(issue.user_id),
                        issue_type: Set(issue.issue_type),
                        short_desc: Set(issue.short_desc),
                        full_desc: Set(issue.full_desc),
                        status: Set(issue.status.as_str().to_owned()),
                        address: Set(issue.address),
                        latitude: Set(issue.latitude),
                        longitude: Set(issue.longitude),
                        created_at: Set(issue.created_at),
                        updated_at: Set(issue.updated_at),
                    }
                    .insert(txn)
                    .await?;

                    for photo in rows {
                        photos::ActiveModel {
                            id: Set(photo.id),
                            issue_id: Set(photo.issue_id),
                            file_path: Set(photo.file_path),
                            uploaded_at: Set(photo.uploaded_at),
                        }
                        .insert(txn)
                        .await?;
                    }
                    Ok(())
                })
            })
            .await
            .context("create issue with photos")?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: IssueStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Issue>, ApiError> {
        let Some(model) = issues::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find issue by id")?
        else {
            return Ok(None);
        };
        let mut am = model.into_active_model();
        am.status = Set(status.as_str().to_owned());
        am.updated_at = Set(updated_at);
        let model = am.update(&self.db).await.context("update issue status")?;
        issue_from_model(model).map(Some)
    }

    async fn delete_with_photos(&self, id: Uuid) -> Result<Option<Vec<Photo>>, ApiError> {
        let deleted = self
            .db
            .transaction::<_, Option<Vec<photos::Model>>, DbErr>(|txn| {
                Box::pin(async move {
                    if issues::Entity::find_by_id(id).one(txn).await?.is_none() {
                        return Ok(None);
                    }
                    let rows = photos::Entity::find()
                        .filter(photos::Column::IssueId.eq(id))
                        .all(txn)
                        .await?;
                    photos::Entity::delete_many()
                        .filter(photos::Column::IssueId.eq(id))
                        .exec(txn)
                        .await?;
                    issues::Entity::delete_by_id(id).exec(txn).await?;
                    Ok(Some(rows))
                })
            })
            .await
            .context("delete issue with photos")?;
        Ok(deleted.map(|rows| rows.into_iter().map(photo_from_model).collect()))
    }
}

fn issue_from_model(model: issues::Model) -> Result<Issue, ApiError> {
    let status: IssueStatus = model
        .status
        .parse()
        .with_context(|| format!("issue {} has invalid status", model.id))?;
    Ok(Issue {
        id: model.id,
        user_id: model.user_id,
        issue_type: model.issue_type,
        short_desc: model.short_desc,
        full_desc: model.full_desc,
        status,
        address: model.address,
        latitude: model.latitude,
        longitude: model.longitude,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Photo repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPhotoRepository {
    pub db: DatabaseConnection,
}

impl PhotoRepository for DbPhotoRepository {
    async fn find(&self, filter: &PhotoFilter, page: PageRequest) -> Result<Vec<Photo>, ApiError> {
        let mut query = photos::Entity::find();
        if let Some(id) = filter.id {
            query = query.filter(photos::Column::Id.eq(id));
        }
        if let Some(issue_id) = filter.issue_id {
            query = query.filter(photos::Column::IssueId.eq(issue_id));
        }
        let models = query
            .order_by_asc(photos::Column::UploadedAt)
            .order_by_asc(photos::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .context("find photos")?;
        Ok(models.into_iter().map(photo_from_model).collect())
    }
}

fn photo_from_model(model: photos::Model) -> Photo {
    Photo {
        id: model.id,
        issue_id: model.issue_id,
        file_path: model.file_path,
        uploaded_at: model.uploaded_at,
    }
}

// ── Statistics repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbStatisticsRepository {
    pub db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct GroupCountRow {
    group_key: String,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct BucketCountRow {
    bucket: DateTime<Utc>,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct ResolutionRow {
    average_seconds: Option<f64>,
    completed: i64,
}

impl DbStatisticsRepository {
    /// Count issues grouped by one of a fixed set of columns.
    async fn count_grouped(&self, column: &'static str) -> Result<Vec<(String, i64)>, ApiError> {
        let sql = format!(
            r#"SELECT "{column}" AS group_key, COUNT(*) AS count FROM issues GROUP BY "{column}""#
        );
        let rows = GroupCountRow::find_by_statement(Statement::from_string(
            self.db.get_database_backend(),
            sql,
        ))
        .all(&self.db)
        .await
        .with_context(|| format!("count issues by {column}"))?;
        Ok(rows.into_iter().map(|r| (r.group_key, r.count)).collect())
    }
}

impl StatisticsRepository for DbStatisticsRepository {
    async fn count_by_type(&self) -> Result<Vec<(String, i64)>, ApiError> {
        self.count_grouped("type").await
    }

    async fn count_by_status(&self) -> Result<Vec<(String, i64)>, ApiError> {
        self.count_grouped("status").await
    }

    async fn count_by_time(
        &self,
        bucket: TimeBucket,
    ) -> Result<Vec<(DateTime<Utc>, i64)>, ApiError> {
        let sql = format!(
            r#"
            SELECT date_trunc('{}', created_at, 'UTC') AS bucket, COUNT(*) AS count
            FROM issues
            GROUP BY 1
            ORDER BY 1
            "#,
            bucket.as_str()
        );
        let rows = BucketCountRow::find_by_statement(Statement::from_string(
            self.db.get_database_backend(),
            sql,
        ))
        .all(&self.db)
        .await
        .context("count issues over time")?;
        Ok(rows.into_iter().map(|r| (r.bucket, r.count)).collect())
    }

    async fn count_by_area(&self) -> Result<Vec<(String, i64)>, ApiError> {
        self.count_grouped("address").await
    }

    async fn resolution_time(&self, status: IssueStatus) -> Result<(Option<f64>, i64), ApiError> {
        let row = ResolutionRow::find_by_statement(Statement::from_sql_and_values(
            self.db.get_database_backend(),
            r#"
            SELECT
                AVG(EXTRACT(EPOCH FROM (updated_at - created_at)))::float8 AS average_seconds,
                COUNT(*) AS completed
            FROM issues
            WHERE status = $1
            "#,
            [status.as_str().into()],
        ))
        .one(&self.db)
        .await
        .context("average resolution time")?;
        Ok(row.map_or((None, 0), |r| (r.average_seconds, r.completed)))
    }
}
