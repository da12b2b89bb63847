use bytes::Bytes;
use uuid::Uuid;

use citywatch_api::domain::types::{Upload, User};
use citywatch_api::error::ApiError;
use citywatch_api::usecase::auth::{RegisterInput, RegisterUseCase};
use citywatch_api::usecase::issue::CreateIssueInput;

pub use citywatch_api::testing::{MemoryStorage, MemoryStore, PASSWORD, RecordingMailer};

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// Register an account through the public flow.
pub async fn register(store: &MemoryStore, mailer: &RecordingMailer, username: &str) -> User {
    RegisterUseCase {
        users: store.clone(),
        mailer: mailer.clone(),
    }
    .execute(RegisterInput {
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        password: PASSWORD.to_owned(),
    })
    .await
    .unwrap()
}

pub fn photo(name: &str, size: usize) -> Upload {
    Upload {
        file_name: Some(name.to_owned()),
        bytes: Bytes::from(vec![0xAB; size]),
    }
}

pub fn issue_input(token: Uuid, issue_type: &str, files: Vec<Upload>) -> CreateIssueInput {
    CreateIssueInput {
        token,
        issue_type: issue_type.to_owned(),
        short_desc: "Street light is out".to_owned(),
        full_desc: "The lamp at the bus stop has been dark for a week".to_owned(),
        address: "Mira 12".to_owned(),
        latitude: 56.84,
        longitude: 60.61,
        files,
    }
}

pub fn assert_err<T: std::fmt::Debug>(result: Result<T, ApiError>, expected: &str) {
    match result {
        Err(e) => assert_eq!(e.kind(), expected, "unexpected error: {e}"),
        Ok(v) => panic!("expected {expected}, got Ok({v:?})"),
    }
}
