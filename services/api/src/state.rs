use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use citywatch_core::cache::RedisResponseCache;

use crate::infra::db::{
    DbIssueRepository, DbIssueTypeRepository, DbPhotoRepository, DbRoleRepository,
    DbStatisticsRepository, DbUserRepository,
};
use crate::infra::mail::SmtpMailer;
use crate::infra::storage::LocalPhotoStorage;

/// Response cache lifetimes, in seconds.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtl {
    pub list: u64,
    pub stats: u64,
}

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub mailer: SmtpMailer,
    pub storage: LocalPhotoStorage,
    pub cache_ttl: CacheTtl,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn role_repo(&self) -> DbRoleRepository {
        DbRoleRepository {
            db: self.db.clone(),
        }
    }

    pub fn issue_repo(&self) -> DbIssueRepository {
        DbIssueRepository {
            db: self.db.clone(),
        }
    }

    pub fn issue_type_repo(&self) -> DbIssueTypeRepository {
        DbIssueTypeRepository {
            db: self.db.clone(),
        }
    }

    pub fn photo_repo(&self) -> DbPhotoRepository {
        DbPhotoRepository {
            db: self.db.clone(),
        }
    }

    pub fn statistics_repo(&self) -> DbStatisticsRepository {
        DbStatisticsRepository {
            db: self.db.clone(),
        }
    }

    pub fn cache(&self) -> RedisResponseCache {
        RedisResponseCache {
            pool: self.redis.clone(),
        }
    }
}
