use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use citywatch_domain::issue::IssueStatus;

/// Maximum number of photos attached to one issue.
pub const MAX_FILES_PER_ISSUE: usize = 5;

/// Maximum size of a single photo in bytes (1 MiB).
pub const MAX_FILE_BYTES: usize = 1024 * 1024;

pub const MAX_USERNAME_LEN: usize = 50;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MAX_SHORT_DESC_LEN: usize = 200;
pub const MAX_ADDRESS_LEN: usize = 255;
pub const MAX_ISSUE_TYPE_LEN: usize = 50;
pub const MAX_ROLE_LEN: usize = 20;

/// A registered account.
///
/// `token` is the long-lived bearer credential; `verify_token` is the
/// single-use value mailed for email verification and password reset.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub token: Uuid,
    pub email_verify: bool,
    pub verify_token: Uuid,
}

/// A citizen-reported problem at a location.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub id: Uuid,
    pub user_id: Uuid,
    pub issue_type: String,
    pub short_desc: String,
    pub full_desc: String,
    pub status: IssueStatus,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Photo metadata. `file_path` is relative to the static root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub id: Uuid,
    pub issue_id: Uuid,
    pub file_path: String,
    pub uploaded_at: DateTime<Utc>,
}

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// Exact-match filters for issue search. `None` fields are ignored.
#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub issue_type: Option<String>,
    pub short_desc: Option<String>,
    pub full_desc: Option<String>,
    pub status: Option<IssueStatus>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PhotoFilter {
    pub id: Option<Uuid>,
    pub issue_id: Option<Uuid>,
}

// ── Statistics ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCount {
    pub issue_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCount {
    pub status: IssueStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeCount {
    pub bucket: DateTime<Utc>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaCount {
    pub address: String,
    pub count: i64,
}

/// Mean time from creation to the last status change, over completed issues.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionTime {
    pub average_seconds: Option<f64>,
    pub completed: i64,
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Lowercase and trim an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Username: 1-50 characters, no surrounding whitespace.
pub fn validate_username(username: &str) -> bool {
    let len = username.chars().count();
    (1..=MAX_USERNAME_LEN).contains(&len) && username.trim() == username
}

/// Email: `local@domain.tld`, at most 100 characters, no whitespace.
pub fn validate_email(email: &str) -> bool {
    if email.is_empty() || email.chars().count() > MAX_EMAIL_LEN {
        return false;
    }
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn validate_password(password: &str) -> bool {
    !password.is_empty()
}

/// Non-empty text of at most `max` characters.
pub fn validate_text(value: &str, max: usize) -> bool {
    let len = value.trim().chars().count();
    len >= 1 && value.chars().count() <= max
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

/// File extension to store an upload under, derived from the client file name.
///
/// Falls back to `bin` when the name has no usable extension.
pub fn photo_extension(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| "bin".to_owned())
}
