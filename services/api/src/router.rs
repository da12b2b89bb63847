use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use citywatch_core::health::health;
use citywatch_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    issue::{
        CREATE_ISSUE_BODY_LIMIT, create_issue, delete_issue, find_issues, issue_amount,
        update_status,
    },
    issue_type::{create_issue_type, delete_issue_type, list_issue_types},
    photo::find_photos,
    statistics::{
        average_resolution_time, issues_by_area, issues_by_status, issues_by_type,
        issues_over_time,
    },
    user::{
        change_password, change_role, create_role, delete_user, forgot_password, issues_count,
        list_roles, list_users, login, register, reset_password, verify_email, verify_email_link,
    },
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.storage.root);

    Router::new()
        // Health
        .route("/health", get(health))
        // Users
        .route("/user", get(list_users).delete(delete_user))
        .route("/user/login", post(login))
        .route("/user/register", post(register))
        .route("/user/verify-email", get(verify_email_link).post(verify_email))
        .route("/user/change-password", post(change_password))
        .route("/user/forgot-password", post(forgot_password))
        .route("/user/reset-password", post(reset_password))
        .route("/user/change-role", post(change_role))
        .route("/user/create-role", post(create_role))
        .route("/user/roles", get(list_roles))
        .route("/user/issues-count", get(issues_count))
        // Issues
        .route(
            "/issue/create",
            post(create_issue).layer(DefaultBodyLimit::max(CREATE_ISSUE_BODY_LIMIT)),
        )
        .route("/issue/status", post(update_status))
        .route("/issue/delete", delete(delete_issue))
        .route("/issue/find", get(find_issues))
        .route("/issue/amount", get(issue_amount))
        // Issue types
        .route(
            "/issue/types",
            get(list_issue_types)
                .post(create_issue_type)
                .delete(delete_issue_type),
        )
        // Photos
        .route("/photos", get(find_photos))
        // Statistics
        .route("/statistics/types", get(issues_by_type))
        .route("/statistics/status", get(issues_by_status))
        .route("/statistics/time", get(issues_over_time))
        .route("/statistics/area", get(issues_by_area))
        .route("/statistics/average-time", get(average_resolution_time))
        // Uploaded photos
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id_layer())
        .layer(request_id_layer())
        .with_state(state)
}
