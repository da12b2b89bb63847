use citywatch_api::usecase::auth::{
    ChangePasswordInput, ChangePasswordUseCase, ForgotPasswordUseCase, LoginInput, LoginUseCase,
    RegisterInput, RegisterUseCase, ResetPasswordInput, ResetPasswordUseCase, VerifyEmailUseCase,
};

use crate::helpers::{MemoryStore, PASSWORD, RecordingMailer, assert_err, register};

// ── Registration and verification ────────────────────────────────────────────

#[tokio::test]
async fn should_register_then_verify_through_mailed_token() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::default();
    let alice = register(&store, &mailer, "alice").await;
    assert!(!alice.email_verify);
    assert_eq!(alice.role, "user");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, "verification");
    assert_eq!(sent[0].to, "alice@example.com");

    let verify = VerifyEmailUseCase {
        users: store.clone(),
    };
    let verified = verify.execute(sent[0].token.unwrap()).await.unwrap();
    assert!(verified.email_verify);
    assert!(store.user("alice").email_verify);

    // The mailed token is single-use.
    assert_err(verify.execute(sent[0].token.unwrap()).await, "TOKEN_NOT_FOUND");
}

#[tokio::test]
async fn should_reject_reused_email_in_any_case() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::default();
    register(&store, &mailer, "alice").await;

    let result = RegisterUseCase {
        users: store.clone(),
        mailer: mailer.clone(),
    }
    .execute(RegisterInput {
        username: "alice2".into(),
        email: "ALICE@Example.com".into(),
        password: PASSWORD.into(),
    })
    .await;

    assert_err(result, "EMAIL_TAKEN");
    assert_eq!(store.users.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn should_create_account_even_when_relay_is_down() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::down();
    let alice = register(&store, &mailer, "alice").await;
    assert_eq!(store.user("alice").id, alice.id);
    assert!(mailer.sent().is_empty());
}

// ── Login ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_current_token_on_login() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::default();
    let alice = register(&store, &mailer, "alice").await;
    let uc = LoginUseCase {
        users: store.clone(),
    };

    let by_email = uc
        .execute(LoginInput {
            email: Some("Alice@Example.COM".into()),
            username: None,
            password: PASSWORD.into(),
        })
        .await
        .unwrap();
    assert_eq!(by_email.token, alice.token);

    let by_username = uc
        .execute(LoginInput {
            email: None,
            username: Some("alice".into()),
            password: PASSWORD.into(),
        })
        .await
        .unwrap();
    assert_eq!(by_username.token, alice.token);
}

#[tokio::test]
async fn should_fail_login_with_wrong_password_or_unknown_account() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::default();
    register(&store, &mailer, "alice").await;
    let uc = LoginUseCase {
        users: store.clone(),
    };

    let wrong = uc
        .execute(LoginInput {
            email: None,
            username: Some("alice".into()),
            password: "nope".into(),
        })
        .await;
    assert_err(wrong, "INVALID_CREDENTIAL");

    let unknown = uc
        .execute(LoginInput {
            email: None,
            username: Some("bob".into()),
            password: PASSWORD.into(),
        })
        .await;
    assert_err(unknown, "USER_NOT_FOUND");
}

// ── Password management ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_invalidate_old_token_after_password_change() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::default();
    let alice = register(&store, &mailer, "alice").await;

    let changed = ChangePasswordUseCase {
        users: store.clone(),
    }
    .execute(ChangePasswordInput {
        token: alice.token,
        old_password: PASSWORD.into(),
        new_password: "new secret".into(),
    })
    .await
    .unwrap();
    assert_ne!(changed.token, alice.token);

    let login = LoginUseCase {
        users: store.clone(),
    };
    let old = login
        .execute(LoginInput {
            email: None,
            username: Some("alice".into()),
            password: PASSWORD.into(),
        })
        .await;
    assert_err(old, "INVALID_CREDENTIAL");

    let fresh = login
        .execute(LoginInput {
            email: None,
            username: Some("alice".into()),
            password: "new secret".into(),
        })
        .await
        .unwrap();
    assert_eq!(fresh.token, changed.token);
}

#[tokio::test]
async fn should_reset_forgotten_password_for_verified_account() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::default();
    register(&store, &mailer, "alice").await;
    let forgot = ForgotPasswordUseCase {
        users: store.clone(),
        mailer: mailer.clone(),
    };

    assert_err(forgot.execute("alice@example.com").await, "EMAIL_NOT_VERIFIED");

    let verify_token = mailer.sent()[0].token.unwrap();
    VerifyEmailUseCase {
        users: store.clone(),
    }
    .execute(verify_token)
    .await
    .unwrap();

    forgot.execute("alice@example.com").await.unwrap();
    let reset_mail = mailer.sent().pop().unwrap();
    assert_eq!(reset_mail.kind, "password_reset");

    let old_token = store.user("alice").token;
    let reset = ResetPasswordUseCase {
        users: store.clone(),
    };
    let updated = reset
        .execute(ResetPasswordInput {
            verify_token: reset_mail.token.unwrap(),
            new_password: "fresh".into(),
        })
        .await
        .unwrap();
    assert_ne!(updated.token, old_token);

    // The bearer token issued before the reset no longer authenticates.
    let change = ChangePasswordUseCase {
        users: store.clone(),
    };
    assert_err(
        change
            .execute(ChangePasswordInput {
                token: old_token,
                old_password: "fresh".into(),
                new_password: "other".into(),
            })
            .await,
        "USER_NOT_FOUND",
    );
    change
        .execute(ChangePasswordInput {
            token: updated.token,
            old_password: "fresh".into(),
            new_password: "fresh again".into(),
        })
        .await
        .unwrap();

    let again = reset
        .execute(ResetPasswordInput {
            verify_token: reset_mail.token.unwrap(),
            new_password: "other".into(),
        })
        .await;
    assert_err(again, "INVALID_TOKEN");
}

#[tokio::test]
async fn should_surface_relay_outage_on_forgot_password() {
    let store = MemoryStore::new();
    register(&store, &RecordingMailer::default(), "alice").await;
    store.promote("alice");

    let result = ForgotPasswordUseCase {
        users: store.clone(),
        mailer: RecordingMailer::down(),
    }
    .execute("alice@example.com")
    .await;
    assert_err(result, "MAIL_UNAVAILABLE");
}
