//! In-memory ports shared by the unit tests and `tests/integration`.
//!
//! Compiled for `cfg(test)` and behind the `testing` feature. Never used by
//! the service binary.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use uuid::Uuid;

use citywatch_domain::issue::{IssueStatus, TimeBucket};
use citywatch_domain::pagination::PageRequest;
use citywatch_domain::user::{ADMIN_ROLE, DEFAULT_ROLE};

use crate::domain::repository::{
    IssueRepository, IssueTypeRepository, Mailer, PhotoRepository, PhotoStorage, RoleRepository,
    StatisticsRepository, UserRepository,
};
use crate::domain::types::{Issue, IssueFilter, Photo, PhotoFilter, User};
use crate::error::ApiError;
use crate::usecase::password::hash_password;

pub const PASSWORD: &str = "correct horse";

fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap()).clone()
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// A stored account whose password is [`PASSWORD`].
pub fn test_user(username: &str, role: &str, verified: bool) -> User {
    User {
        id: Uuid::now_v7(),
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        password_hash: password_hash(),
        role: role.to_owned(),
        rating: 0,
        created_at: Utc::now(),
        token: Uuid::new_v4(),
        email_verify: verified,
        verify_token: Uuid::new_v4(),
    }
}

pub fn test_issue(user_id: Uuid, issue_type: &str) -> Issue {
    let now = Utc::now();
    Issue {
        id: Uuid::now_v7(),
        user_id,
        issue_type: issue_type.to_owned(),
        short_desc: "Pothole".into(),
        full_desc: "Deep pothole near the crossing".into(),
        status: IssueStatus::Open,
        address: "Lenina 1".into(),
        latitude: 55.75,
        longitude: 37.62,
        created_at: now,
        updated_at: now,
    }
}

// ── MemoryStore ──────────────────────────────────────────────────────────────

/// One in-memory database backing every repository port.
///
/// Clones share state, so a test can hand copies to several use cases and
/// inspect the result afterwards.
#[derive(Clone)]
pub struct MemoryStore {
    pub users: Arc<Mutex<Vec<User>>>,
    pub roles: Arc<Mutex<Vec<String>>>,
    pub issue_types: Arc<Mutex<Vec<String>>>,
    pub issues: Arc<Mutex<Vec<Issue>>>,
    pub photos: Arc<Mutex<Vec<Photo>>>,
    /// Make `create_with_photos` fail as a lost database would.
    pub fail_create: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            users: Arc::default(),
            roles: Arc::new(Mutex::new(vec![
                DEFAULT_ROLE.to_owned(),
                ADMIN_ROLE.to_owned(),
            ])),
            issue_types: Arc::default(),
            issues: Arc::default(),
            photos: Arc::default(),
            fail_create: false,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<User>) -> Self {
        let store = Self::default();
        *store.users.lock().unwrap() = users;
        store
    }

    pub fn with_types(types: &[&str]) -> Self {
        let store = Self::default();
        *store.issue_types.lock().unwrap() = types.iter().map(|t| (*t).to_owned()).collect();
        store
    }

    pub fn with_issues(issues: Vec<Issue>, photos: Vec<Photo>) -> Self {
        let store = Self::default();
        *store.issues.lock().unwrap() = issues;
        *store.photos.lock().unwrap() = photos;
        store
    }

    pub fn user(&self, username: &str) -> User {
        self.find_user(|u| u.username == username).unwrap()
    }

    /// Operator shortcut: grant admin and mark verified.
    pub fn promote(&self, username: &str) -> User {
        self.update_user(
            |u| u.username == username,
            |u| {
                u.role = ADMIN_ROLE.to_owned();
                u.email_verify = true;
            },
        )
        .unwrap()
    }

    fn update_user(&self, pred: impl Fn(&User) -> bool, f: impl FnOnce(&mut User)) -> Option<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| pred(u))?;
        f(user);
        Some(user.clone())
    }

    fn find_user(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| pred(u)).cloned()
    }

    fn grouped<K: Clone + Eq + std::hash::Hash + Ord>(&self, key: impl Fn(&Issue) -> K) -> Vec<(K, i64)> {
        let mut counts: HashMap<K, i64> = HashMap::new();
        for issue in self.issues.lock().unwrap().iter() {
            *counts.entry(key(issue)).or_default() += 1;
        }
        let mut counts: Vec<_> = counts.into_iter().collect();
        counts.sort_by(|a, b| a.0.cmp(&b.0));
        counts
    }
}

fn paged<T>(rows: Vec<T>, page: PageRequest) -> Vec<T> {
    rows.into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

fn matches_filter(issue: &Issue, filter: &IssueFilter) -> bool {
    filter.id.is_none_or(|id| issue.id == id)
        && filter.user_id.is_none_or(|id| issue.user_id == id)
        && filter.issue_type.as_ref().is_none_or(|t| &issue.issue_type == t)
        && filter.short_desc.as_ref().is_none_or(|d| &issue.short_desc == d)
        && filter.full_desc.as_ref().is_none_or(|d| &issue.full_desc == d)
        && filter.status.is_none_or(|s| issue.status == s)
        && filter.address.as_ref().is_none_or(|a| &issue.address == a)
}

fn truncate(at: DateTime<Utc>, bucket: TimeBucket) -> DateTime<Utc> {
    let day = at.date_naive();
    let start = match bucket {
        TimeBucket::Day => day,
        TimeBucket::Week => day - Duration::days(day.weekday().num_days_from_monday() as i64),
        TimeBucket::Month => day.with_day(1).unwrap(),
    };
    start.and_time(NaiveTime::MIN).and_utc()
}

impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.find_user(|u| u.id == id))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        Ok(self.find_user(|u| u.username == username))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self.find_user(|u| u.email == email))
    }

    async fn find_by_token(&self, token: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.find_user(|u| u.token == token))
    }

    async fn list(&self, page: PageRequest) -> Result<Vec<User>, ApiError> {
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(paged(users, page))
    }

    async fn create(&self, user: &User) -> Result<(), ApiError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(ApiError::EmailTaken);
        }
        if users.iter().any(|u| u.username == user.username) {
            return Err(ApiError::UsernameTaken);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn verify_email(
        &self,
        verify_token: Uuid,
        new_verify_token: Uuid,
    ) -> Result<Option<User>, ApiError> {
        Ok(self.update_user(
            |u| u.verify_token == verify_token,
            |u| {
                u.email_verify = true;
                u.verify_token = new_verify_token;
            },
        ))
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        token: Uuid,
        verify_token: Uuid,
    ) -> Result<bool, ApiError> {
        Ok(self
            .update_user(
                |u| u.id == id,
                |u| {
                    u.password_hash = password_hash.to_owned();
                    u.token = token;
                    u.verify_token = verify_token;
                },
            )
            .is_some())
    }

    async fn reset_password(
        &self,
        verify_token: Uuid,
        password_hash: &str,
        token: Uuid,
        new_verify_token: Uuid,
    ) -> Result<Option<User>, ApiError> {
        Ok(self.update_user(
            |u| u.verify_token == verify_token,
            |u| {
                u.password_hash = password_hash.to_owned();
                u.token = token;
                u.verify_token = new_verify_token;
            },
        ))
    }

    async fn update_role(&self, id: Uuid, role: &str) -> Result<bool, ApiError> {
        if !self.roles.lock().unwrap().iter().any(|r| r == role) {
            return Err(ApiError::RoleNotFound);
        }
        Ok(self
            .update_user(|u| u.id == id, |u| u.role = role.to_owned())
            .is_some())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}

impl RoleRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<String>, ApiError> {
        let mut roles = self.roles.lock().unwrap().clone();
        roles.sort();
        Ok(roles)
    }

    async fn create(&self, role: &str) -> Result<(), ApiError> {
        let mut roles = self.roles.lock().unwrap();
        if roles.iter().any(|r| r == role) {
            return Err(ApiError::RoleAlreadyExists);
        }
        roles.push(role.to_owned());
        Ok(())
    }
}

impl IssueTypeRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<String>, ApiError> {
        let mut types = self.issue_types.lock().unwrap().clone();
        types.sort();
        Ok(types)
    }

    async fn exists(&self, issue_type: &str) -> Result<bool, ApiError> {
        Ok(self.issue_types.lock().unwrap().iter().any(|t| t == issue_type))
    }

    async fn create(&self, issue_type: &str) -> Result<(), ApiError> {
        let mut types = self.issue_types.lock().unwrap();
        if types.iter().any(|t| t == issue_type) {
            return Err(ApiError::IssueTypeAlreadyExists);
        }
        types.push(issue_type.to_owned());
        Ok(())
    }

    async fn delete(&self, issue_type: &str) -> Result<bool, ApiError> {
        let mut types = self.issue_types.lock().unwrap();
        let before = types.len();
        types.retain(|t| t != issue_type);
        Ok(types.len() != before)
    }
}

impl IssueRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Issue>, ApiError> {
        Ok(self.issues.lock().unwrap().iter().find(|i| i.id == id).cloned())
    }

    async fn find(&self, filter: &IssueFilter, page: PageRequest) -> Result<Vec<Issue>, ApiError> {
        let mut found: Vec<Issue> = self
            .issues
            .lock()
            .unwrap()
            .iter()
            .filter(|i| matches_filter(i, filter))
            .cloned()
            .collect();
        found.sort_by_key(|i| (i.created_at, i.id));
        Ok(paged(found, page))
    }

    async fn count(&self) -> Result<u64, ApiError> {
        Ok(self.issues.lock().unwrap().len() as u64)
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, ApiError> {
        Ok(self
            .issues
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.user_id == user_id)
            .count() as u64)
    }

    async fn create_with_photos(&self, issue: &Issue, photos: &[Photo]) -> Result<(), ApiError> {
        if self.fail_create {
            return Err(anyhow::anyhow!("database unavailable").into());
        }
        self.issues.lock().unwrap().push(issue.clone());
        self.photos.lock().unwrap().extend_from_slice(photos);
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: IssueStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Issue>, ApiError> {
        let mut issues = self.issues.lock().unwrap();
        Ok(issues.iter_mut().find(|i| i.id == id).map(|issue| {
            issue.status = status;
            issue.updated_at = updated_at;
            issue.clone()
        }))
    }

    async fn delete_with_photos(&self, id: Uuid) -> Result<Option<Vec<Photo>>, ApiError> {
        let mut issues = self.issues.lock().unwrap();
        let Some(pos) = issues.iter().position(|i| i.id == id) else {
            return Ok(None);
        };
        issues.remove(pos);
        let mut photos = self.photos.lock().unwrap();
        let (removed, kept): (Vec<Photo>, Vec<Photo>) =
            photos.drain(..).partition(|p| p.issue_id == id);
        *photos = kept;
        Ok(Some(removed))
    }
}

impl PhotoRepository for MemoryStore {
    async fn find(&self, filter: &PhotoFilter, page: PageRequest) -> Result<Vec<Photo>, ApiError> {
        let mut found: Vec<Photo> = self
            .photos
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter.id.is_none_or(|id| p.id == id))
            .filter(|p| filter.issue_id.is_none_or(|id| p.issue_id == id))
            .cloned()
            .collect();
        found.sort_by_key(|p| (p.uploaded_at, p.id));
        Ok(paged(found, page))
    }
}

impl StatisticsRepository for MemoryStore {
    async fn count_by_type(&self) -> Result<Vec<(String, i64)>, ApiError> {
        Ok(self.grouped(|i| i.issue_type.clone()))
    }

    async fn count_by_status(&self) -> Result<Vec<(String, i64)>, ApiError> {
        Ok(self.grouped(|i| i.status.as_str().to_owned()))
    }

    async fn count_by_time(
        &self,
        bucket: TimeBucket,
    ) -> Result<Vec<(DateTime<Utc>, i64)>, ApiError> {
        Ok(self.grouped(|i| truncate(i.created_at, bucket)))
    }

    async fn count_by_area(&self) -> Result<Vec<(String, i64)>, ApiError> {
        Ok(self.grouped(|i| i.address.clone()))
    }

    async fn resolution_time(&self, status: IssueStatus) -> Result<(Option<f64>, i64), ApiError> {
        let durations: Vec<f64> = self
            .issues
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.status == status)
            .map(|i| (i.updated_at - i.created_at).num_milliseconds() as f64 / 1000.0)
            .collect();
        let completed = durations.len() as i64;
        let average = (completed > 0).then(|| durations.iter().sum::<f64>() / completed as f64);
        Ok((average, completed))
    }
}

// ── RecordingMailer ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub kind: &'static str,
    pub to: String,
    pub token: Option<Uuid>,
}

/// Records every mail instead of sending it.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<SentMail>>>,
    pub down: bool,
}

impl RecordingMailer {
    /// A relay that refuses every message.
    pub fn down() -> Self {
        Self {
            down: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// `(kind, recipient)` of every mail, in send order.
    pub fn recipients(&self) -> Vec<(&'static str, String)> {
        self.sent()
            .into_iter()
            .map(|mail| (mail.kind, mail.to))
            .collect()
    }

    fn record(&self, kind: &'static str, to: &str, token: Option<Uuid>) -> anyhow::Result<()> {
        if self.down {
            anyhow::bail!("relay unreachable");
        }
        self.sent.lock().unwrap().push(SentMail {
            kind,
            to: to.to_owned(),
            token,
        });
        Ok(())
    }
}

impl Mailer for RecordingMailer {
    async fn send_verification(&self, to: &str, verify_token: Uuid) -> anyhow::Result<()> {
        self.record("verification", to, Some(verify_token))
    }

    async fn send_password_reset(&self, to: &str, verify_token: Uuid) -> anyhow::Result<()> {
        self.record("password_reset", to, Some(verify_token))
    }

    async fn send_status_changed(&self, to: &str, _issue: &Issue) -> anyhow::Result<()> {
        self.record("status_changed", to, None)
    }
}

// ── MemoryStorage ────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryStorage {
    pub files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    /// Fail every store once this many files are held.
    pub capacity: Option<usize>,
}

impl MemoryStorage {
    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PhotoStorage for MemoryStorage {
    async fn store(&self, id: Uuid, extension: &str, bytes: &[u8]) -> anyhow::Result<String> {
        let mut files = self.files.lock().unwrap();
        if self.capacity.is_some_and(|cap| files.len() >= cap) {
            anyhow::bail!("disk full");
        }
        let path = format!("photos/{id}.{extension}");
        files.insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    async fn remove(&self, file_path: &str) -> anyhow::Result<()> {
        self.files.lock().unwrap().remove(file_path);
        Ok(())
    }
}
