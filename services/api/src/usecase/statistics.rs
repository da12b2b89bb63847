use std::collections::HashMap;

use citywatch_domain::issue::{IssueStatus, TimeBucket};

use crate::domain::repository::{IssueTypeRepository, StatisticsRepository};
use crate::domain::types::{AreaCount, ResolutionTime, StatusCount, TimeCount, TypeCount};
use crate::error::ApiError;

// ── IssuesByType ─────────────────────────────────────────────────────────────

pub struct IssuesByTypeUseCase<S: StatisticsRepository, T: IssueTypeRepository> {
    pub stats: S,
    pub issue_types: T,
}

impl<S: StatisticsRepository, T: IssueTypeRepository> IssuesByTypeUseCase<S, T> {
    /// Every catalogued type with its count (zero included), followed by any
    /// uncatalogued type still referenced by issues.
    pub async fn execute(&self) -> Result<Vec<TypeCount>, ApiError> {
        let mut counts: HashMap<String, i64> = self.stats.count_by_type().await?.into_iter().collect();
        let mut result: Vec<TypeCount> = self
            .issue_types
            .list()
            .await?
            .into_iter()
            .map(|issue_type| {
                let count = counts.remove(&issue_type).unwrap_or(0);
                TypeCount { issue_type, count }
            })
            .collect();

        let mut orphaned: Vec<TypeCount> = counts
            .into_iter()
            .map(|(issue_type, count)| TypeCount { issue_type, count })
            .collect();
        orphaned.sort_by(|a, b| a.issue_type.cmp(&b.issue_type));
        result.extend(orphaned);
        Ok(result)
    }
}

// ── IssuesByStatus ───────────────────────────────────────────────────────────

pub struct IssuesByStatusUseCase<S: StatisticsRepository> {
    pub stats: S,
}

impl<S: StatisticsRepository> IssuesByStatusUseCase<S> {
    /// One entry per status, in lifecycle order.
    pub async fn execute(&self) -> Result<Vec<StatusCount>, ApiError> {
        let mut counts: HashMap<IssueStatus, i64> = HashMap::new();
        for (status, count) in self.stats.count_by_status().await? {
            match status.parse::<IssueStatus>() {
                Ok(status) => *counts.entry(status).or_default() += count,
                Err(e) => tracing::warn!(error = %e, "skipping issues with unknown status"),
            }
        }
        Ok(IssueStatus::ALL
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: counts.get(&status).copied().unwrap_or(0),
            })
            .collect())
    }
}

// ── IssuesOverTime ───────────────────────────────────────────────────────────

pub struct IssuesOverTimeUseCase<S: StatisticsRepository> {
    pub stats: S,
}

impl<S: StatisticsRepository> IssuesOverTimeUseCase<S> {
    /// Non-empty buckets in chronological order.
    pub async fn execute(&self, bucket: TimeBucket) -> Result<Vec<TimeCount>, ApiError> {
        let mut counts: Vec<TimeCount> = self
            .stats
            .count_by_time(bucket)
            .await?
            .into_iter()
            .map(|(bucket, count)| TimeCount { bucket, count })
            .collect();
        counts.sort_by_key(|c| c.bucket);
        Ok(counts)
    }
}

// ── IssuesByArea ─────────────────────────────────────────────────────────────

pub struct IssuesByAreaUseCase<S: StatisticsRepository> {
    pub stats: S,
}

impl<S: StatisticsRepository> IssuesByAreaUseCase<S> {
    /// Areas are grouped by exact address, busiest first.
    pub async fn execute(&self) -> Result<Vec<AreaCount>, ApiError> {
        let mut counts: Vec<AreaCount> = self
            .stats
            .count_by_area()
            .await?
            .into_iter()
            .map(|(address, count)| AreaCount { address, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.address.cmp(&b.address)));
        Ok(counts)
    }
}

// ── AverageResolutionTime ────────────────────────────────────────────────────

pub struct AverageResolutionTimeUseCase<S: StatisticsRepository> {
    pub stats: S,
}

impl<S: StatisticsRepository> AverageResolutionTimeUseCase<S> {
    /// Completion time of an issue is its last status change.
    pub async fn execute(&self) -> Result<ResolutionTime, ApiError> {
        let (average_seconds, completed) = self.stats.resolution_time(IssueStatus::Done).await?;
        Ok(ResolutionTime {
            average_seconds: if completed == 0 { None } else { average_seconds },
            completed,
        })
    }
}
