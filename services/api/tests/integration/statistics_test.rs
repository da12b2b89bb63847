use chrono::Duration;

use citywatch_api::usecase::issue::{CountIssuesUseCase, CreateIssueUseCase};
use citywatch_api::usecase::issue_type::CreateIssueTypeUseCase;
use citywatch_api::usecase::statistics::{
    AverageResolutionTimeUseCase, IssuesByAreaUseCase, IssuesByStatusUseCase,
    IssuesByTypeUseCase, IssuesOverTimeUseCase,
};
use citywatch_domain::issue::{IssueStatus, TimeBucket};

use crate::helpers::{MemoryStorage, MemoryStore, RecordingMailer, issue_input, register};

/// Three "Lighting" issues and one "Roads" issue; "Parks" has none.
async fn populated() -> MemoryStore {
    let store = MemoryStore::new();
    register(&store, &RecordingMailer::default(), "root").await;
    let admin = store.promote("root");
    let types = CreateIssueTypeUseCase {
        users: store.clone(),
        issue_types: store.clone(),
    };
    for t in ["Lighting", "Roads", "Parks"] {
        types.execute(admin.token, t).await.unwrap();
    }
    let create = CreateIssueUseCase {
        users: store.clone(),
        issue_types: store.clone(),
        issues: store.clone(),
        storage: MemoryStorage::default(),
    };
    for t in ["Lighting", "Lighting", "Lighting", "Roads"] {
        create
            .execute(issue_input(admin.token, t, vec![]))
            .await
            .unwrap();
    }
    store
}

#[tokio::test]
async fn should_sum_status_counts_to_issue_amount() {
    let store = populated().await;
    {
        let mut issues = store.issues.lock().unwrap();
        issues[0].status = IssueStatus::Done;
        issues[1].status = IssueStatus::InProgress;
    }

    let by_status = IssuesByStatusUseCase {
        stats: store.clone(),
    }
    .execute()
    .await
    .unwrap();
    let amount = CountIssuesUseCase {
        issues: store.clone(),
    }
    .execute()
    .await
    .unwrap();

    assert_eq!(by_status.len(), 3);
    assert_eq!(by_status.iter().map(|s| s.count).sum::<i64>() as u64, amount);
    assert_eq!(by_status[0].status, IssueStatus::Open);
    assert_eq!(by_status[0].count, 2);
}

#[tokio::test]
async fn should_report_empty_types_with_zero() {
    let store = populated().await;
    let by_type = IssuesByTypeUseCase {
        stats: store.clone(),
        issue_types: store.clone(),
    }
    .execute()
    .await
    .unwrap();

    let count = |name: &str| by_type.iter().find(|c| c.issue_type == name).unwrap().count;
    assert_eq!(count("Lighting"), 3);
    assert_eq!(count("Roads"), 1);
    assert_eq!(count("Parks"), 0);
}

#[tokio::test]
async fn should_group_by_area_and_day() {
    let store = populated().await;
    store.issues.lock().unwrap()[3].address = "Lenina 5".into();

    let by_area = IssuesByAreaUseCase {
        stats: store.clone(),
    }
    .execute()
    .await
    .unwrap();
    assert_eq!(by_area[0].address, "Mira 12");
    assert_eq!(by_area[0].count, 3);
    assert_eq!(by_area[1].count, 1);

    let by_day = IssuesOverTimeUseCase {
        stats: store.clone(),
    }
    .execute(TimeBucket::Day)
    .await
    .unwrap();
    assert_eq!(by_day.iter().map(|c| c.count).sum::<i64>(), 4);
}

#[tokio::test]
async fn should_average_resolution_over_done_issues_only() {
    let store = populated().await;
    let uc = AverageResolutionTimeUseCase {
        stats: store.clone(),
    };

    let none = uc.execute().await.unwrap();
    assert_eq!(none.completed, 0);
    assert_eq!(none.average_seconds, None);

    {
        let mut issues = store.issues.lock().unwrap();
        for (issue, hours) in issues.iter_mut().zip([1, 3]) {
            issue.status = IssueStatus::Done;
            issue.updated_at = issue.created_at + Duration::hours(hours);
        }
    }
    let done = uc.execute().await.unwrap();
    assert_eq!(done.completed, 2);
    assert_eq!(done.average_seconds, Some(7200.0));
}
