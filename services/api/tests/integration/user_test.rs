use citywatch_api::usecase::user::{
    ChangeRoleUseCase, CountUserIssuesUseCase, CreateRoleUseCase, DeleteUserUseCase,
    ListRolesUseCase, ListUsersUseCase,
};
use citywatch_domain::pagination::PageRequest;
use uuid::Uuid;

use crate::helpers::{MemoryStore, RecordingMailer, assert_err, register};

async fn with_admin() -> (MemoryStore, Uuid) {
    let store = MemoryStore::new();
    register(&store, &RecordingMailer::default(), "root").await;
    let admin = store.promote("root");
    (store, admin.token)
}

#[tokio::test]
async fn should_page_user_list() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::default();
    for n in 0..7 {
        register(&store, &mailer, &format!("user{n}")).await;
    }
    let uc = ListUsersUseCase {
        users: store.clone(),
    };

    let first = uc.execute(PageRequest::new(None, Some(5))).await.unwrap();
    assert_eq!(first.len(), 5);
    let second = uc.execute(PageRequest::new(Some(1), Some(5))).await.unwrap();
    assert_eq!(second.len(), 2);
    assert!(second.iter().all(|u| !first.iter().any(|f| f.id == u.id)));

    let capped = uc.execute(PageRequest::new(None, Some(500))).await.unwrap();
    assert_eq!(capped.len(), 7);
}

#[tokio::test]
async fn should_grant_role_only_from_catalogue() {
    let (store, admin) = with_admin().await;
    let alice = register(&store, &RecordingMailer::default(), "alice").await;
    let change = ChangeRoleUseCase {
        users: store.clone(),
    };

    assert_err(change.execute(admin, alice.id, "moderator").await, "ROLE_NOT_FOUND");
    assert_eq!(store.user("alice").role, "user");

    CreateRoleUseCase {
        users: store.clone(),
        roles: store.clone(),
    }
    .execute(admin, "moderator")
    .await
    .unwrap();
    let updated = change.execute(admin, alice.id, "moderator").await.unwrap();
    assert_eq!(updated.role, "moderator");

    let roles = ListRolesUseCase {
        roles: store.clone(),
    }
    .execute()
    .await
    .unwrap();
    assert!(roles.contains(&"moderator".to_owned()));
}

#[tokio::test]
async fn should_reject_duplicate_role() {
    let (store, admin) = with_admin().await;
    let result = CreateRoleUseCase {
        users: store.clone(),
        roles: store.clone(),
    }
    .execute(admin, "admin")
    .await;
    assert_err(result, "ROLE_ALREADY_EXISTS");
}

#[tokio::test]
async fn should_require_admin_for_user_deletion() {
    let (store, admin) = with_admin().await;
    let alice = register(&store, &RecordingMailer::default(), "alice").await;
    let bob = register(&store, &RecordingMailer::default(), "bob").await;
    let delete = DeleteUserUseCase {
        users: store.clone(),
    };

    assert_err(delete.execute(alice.token, bob.id).await, "FORBIDDEN");
    assert_err(delete.execute(Uuid::new_v4(), bob.id).await, "USER_NOT_FOUND");

    delete.execute(admin, bob.id).await.unwrap();
    assert_err(delete.execute(admin, bob.id).await, "USER_NOT_FOUND");
    assert_eq!(store.users.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn should_count_zero_issues_for_unknown_user() {
    let store = MemoryStore::new();
    let count = CountUserIssuesUseCase {
        issues: store.clone(),
    }
    .execute(Uuid::new_v4())
    .await
    .unwrap();
    assert_eq!(count, 0);
}
