use std::collections::HashSet;

use citywatch_api::domain::types::{IssueFilter, PhotoFilter};
use citywatch_api::usecase::auth::VerifyEmailUseCase;
use citywatch_api::usecase::issue::{
    CreateIssueUseCase, DeleteIssueUseCase, FindIssuesUseCase, UpdateIssueStatusUseCase,
};
use citywatch_api::usecase::issue_type::CreateIssueTypeUseCase;
use citywatch_api::usecase::photo::FindPhotosUseCase;
use citywatch_domain::issue::IssueStatus;
use citywatch_domain::pagination::PageRequest;

use crate::helpers::{
    MemoryStorage, MemoryStore, RecordingMailer, assert_err, issue_input, photo, register,
};

struct World {
    store: MemoryStore,
    mailer: RecordingMailer,
    storage: MemoryStorage,
}

impl World {
    fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            mailer: RecordingMailer::default(),
            storage: MemoryStorage::default(),
        }
    }

    fn create_issue(&self) -> CreateIssueUseCase<MemoryStore, MemoryStore, MemoryStore, MemoryStorage> {
        CreateIssueUseCase {
            users: self.store.clone(),
            issue_types: self.store.clone(),
            issues: self.store.clone(),
            storage: self.storage.clone(),
        }
    }

    fn update_status(&self) -> UpdateIssueStatusUseCase<MemoryStore, MemoryStore, RecordingMailer> {
        UpdateIssueStatusUseCase {
            users: self.store.clone(),
            issues: self.store.clone(),
            mailer: self.mailer.clone(),
        }
    }

    /// A verified reporter, an admin, and the "Lighting" type.
    async fn seeded(&self) -> (uuid::Uuid, uuid::Uuid) {
        register(&self.store, &self.mailer, "root").await;
        let admin = self.store.promote("root");
        let reporter = register(&self.store, &self.mailer, "alice").await;
        VerifyEmailUseCase {
            users: self.store.clone(),
        }
        .execute(reporter.verify_token)
        .await
        .unwrap();
        CreateIssueTypeUseCase {
            users: self.store.clone(),
            issue_types: self.store.clone(),
        }
        .execute(admin.token, "Lighting")
        .await
        .unwrap();
        (reporter.token, admin.token)
    }
}

// ── End to end ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_walk_issue_from_report_to_in_progress() {
    let world = World::new();
    let store = &world.store;

    register(store, &world.mailer, "root").await;
    let admin = store.promote("root");
    let alice = register(store, &world.mailer, "alice").await;

    // A plain user cannot touch the type catalogue.
    let types = CreateIssueTypeUseCase {
        users: store.clone(),
        issue_types: store.clone(),
    };
    assert_err(types.execute(alice.token, "Lighting").await, "FORBIDDEN");
    types.execute(admin.token, "Lighting").await.unwrap();

    // Reporting requires a verified email.
    assert_err(
        world
            .create_issue()
            .execute(issue_input(alice.token, "Lighting", vec![]))
            .await,
        "EMAIL_NOT_VERIFIED",
    );
    VerifyEmailUseCase {
        users: store.clone(),
    }
    .execute(alice.verify_token)
    .await
    .unwrap();

    let (issue, photos) = world
        .create_issue()
        .execute(issue_input(
            alice.token,
            "Lighting",
            vec![photo("lamp.jpg", 512), photo("pole.PNG", 1024)],
        ))
        .await
        .unwrap();
    assert_eq!(issue.status, IssueStatus::Open);
    assert_eq!(issue.user_id, alice.id);
    assert_eq!(photos.len(), 2);
    assert!(photos[1].file_path.ends_with(".png"));
    assert_eq!(world.storage.len(), 2);

    let updated = world
        .update_status()
        .execute(admin.token, issue.id, "в обработке")
        .await
        .unwrap();
    assert_eq!(updated.status, IssueStatus::InProgress);
    assert!(updated.updated_at >= issue.updated_at);

    let found = FindIssuesUseCase {
        issues: store.clone(),
    }
    .execute(
        &IssueFilter {
            status: Some(IssueStatus::InProgress),
            ..IssueFilter::default()
        },
        PageRequest::default(),
    )
    .await
    .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, issue.id);

    let notice = world.mailer.sent().pop().unwrap();
    assert_eq!(notice.kind, "status_changed");
    assert_eq!(notice.to, "alice@example.com");
}

// ── FindIssues ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_cover_every_match_exactly_once_across_pages() {
    let world = World::new();
    let (reporter, admin) = world.seeded().await;
    CreateIssueTypeUseCase {
        users: world.store.clone(),
        issue_types: world.store.clone(),
    }
    .execute(admin, "Roads")
    .await
    .unwrap();

    let mut matching = HashSet::new();
    for i in 0..11 {
        let issue_type = if i % 3 == 0 { "Roads" } else { "Lighting" };
        let (issue, _) = world
            .create_issue()
            .execute(issue_input(reporter, issue_type, vec![]))
            .await
            .unwrap();
        if issue_type == "Lighting" {
            matching.insert(issue.id);
        }
    }
    assert_eq!(matching.len(), 7);

    let find = FindIssuesUseCase {
        issues: world.store.clone(),
    };
    let filter = IssueFilter {
        issue_type: Some("Lighting".into()),
        ..IssueFilter::default()
    };
    let mut seen = Vec::new();
    for page in 0..4 {
        let rows = find
            .execute(&filter, PageRequest::new(Some(page), Some(3)))
            .await
            .unwrap();
        assert!(rows.len() <= 3);
        seen.extend(rows.into_iter().map(|i| i.id));
    }

    let unique: HashSet<_> = seen.iter().copied().collect();
    assert_eq!(unique.len(), seen.len());
    assert_eq!(unique, matching);
}

// ── CreateIssue ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_whole_batch_when_any_file_is_too_large() {
    let world = World::new();
    let (reporter, _) = world.seeded().await;

    let result = world
        .create_issue()
        .execute(issue_input(
            reporter,
            "Lighting",
            vec![photo("a.jpg", 10), photo("b.jpg", 1024 * 1024 + 1)],
        ))
        .await;

    assert_err(result, "FILE_TOO_LARGE");
    assert_eq!(world.storage.len(), 0);
    assert!(world.store.issues.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_more_than_five_files() {
    let world = World::new();
    let (reporter, _) = world.seeded().await;
    let files = (0..6).map(|n| photo(&format!("{n}.jpg"), 8)).collect();

    let result = world
        .create_issue()
        .execute(issue_input(reporter, "Lighting", files))
        .await;

    assert_err(result, "TOO_MANY_FILES");
    assert_eq!(world.storage.len(), 0);
}

#[tokio::test]
async fn should_accept_exactly_five_files_of_one_mebibyte() {
    let world = World::new();
    let (reporter, _) = world.seeded().await;
    let files = (0..5)
        .map(|n| photo(&format!("{n}.jpg"), 1024 * 1024))
        .collect();

    let (issue, photos) = world
        .create_issue()
        .execute(issue_input(reporter, "Lighting", files))
        .await
        .unwrap();

    assert_eq!(photos.len(), 5);
    let stored = FindPhotosUseCase {
        photos: world.store.clone(),
    }
    .execute(
        &PhotoFilter {
            issue_id: Some(issue.id),
            ..PhotoFilter::default()
        },
        PageRequest::default(),
    )
    .await
    .unwrap();
    assert_eq!(stored.len(), 5);
}

#[tokio::test]
async fn should_reject_unknown_type_and_bad_coordinates() {
    let world = World::new();
    let (reporter, _) = world.seeded().await;

    assert_err(
        world
            .create_issue()
            .execute(issue_input(reporter, "Potholes", vec![]))
            .await,
        "UNKNOWN_ISSUE_TYPE",
    );

    let mut input = issue_input(reporter, "Lighting", vec![]);
    input.latitude = 90.5;
    assert_err(world.create_issue().execute(input).await, "VALIDATION");

    let mut input = issue_input(reporter, "Lighting", vec![]);
    input.longitude = -180.0;
    world.create_issue().execute(input).await.unwrap();
}

// ── UpdateIssueStatus ────────────────────────────────────────────────────────

#[tokio::test]
async fn should_leave_status_unchanged_for_unknown_literal() {
    let world = World::new();
    let (reporter, admin) = world.seeded().await;
    let (issue, _) = world
        .create_issue()
        .execute(issue_input(reporter, "Lighting", vec![]))
        .await
        .unwrap();

    for bogus in ["done", "Выполнено", ""] {
        assert_err(
            world.update_status().execute(admin, issue.id, bogus).await,
            "UNKNOWN_STATUS",
        );
    }
    let stored = world.store.issues.lock().unwrap()[0].clone();
    assert_eq!(stored.status, IssueStatus::Open);
}

#[tokio::test]
async fn should_keep_status_change_when_notification_fails() {
    let world = World::new();
    let (reporter, admin) = world.seeded().await;
    let (issue, _) = world
        .create_issue()
        .execute(issue_input(reporter, "Lighting", vec![]))
        .await
        .unwrap();

    let updated = UpdateIssueStatusUseCase {
        users: world.store.clone(),
        issues: world.store.clone(),
        mailer: RecordingMailer::down(),
    }
    .execute(admin, issue.id, "выполнено")
    .await
    .unwrap();

    assert_eq!(updated.status, IssueStatus::Done);
    assert_eq!(world.store.issues.lock().unwrap()[0].status, IssueStatus::Done);
}

#[tokio::test]
async fn should_forbid_status_change_by_reporter() {
    let world = World::new();
    let (reporter, _) = world.seeded().await;
    let (issue, _) = world
        .create_issue()
        .execute(issue_input(reporter, "Lighting", vec![]))
        .await
        .unwrap();

    assert_err(
        world.update_status().execute(reporter, issue.id, "выполнено").await,
        "FORBIDDEN",
    );
}

// ── DeleteIssue ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_delete_issue_with_photo_rows_and_files() {
    let world = World::new();
    let (reporter, admin) = world.seeded().await;
    let (issue, _) = world
        .create_issue()
        .execute(issue_input(
            reporter,
            "Lighting",
            vec![photo("a.jpg", 4), photo("b.jpg", 4)],
        ))
        .await
        .unwrap();

    let delete = DeleteIssueUseCase {
        users: world.store.clone(),
        issues: world.store.clone(),
        storage: world.storage.clone(),
    };
    delete.execute(admin, issue.id).await.unwrap();

    assert!(world.store.issues.lock().unwrap().is_empty());
    assert!(world.store.photos.lock().unwrap().is_empty());
    assert_eq!(world.storage.len(), 0);
    assert_err(delete.execute(admin, issue.id).await, "ISSUE_NOT_FOUND");
}
