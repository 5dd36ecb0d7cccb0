use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::api::Pagination;
use crate::database::models::{TaskDeadline, TaskFilter, TaskPriority, TaskStatus};
use crate::database::{ContactRepository, StoreResult, TaskRepository};
use crate::services::activity_service::{merge_recent, paginate, Activity, Page};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub task_count: i64,
    pub completed_task_count: i64,
    pub contact_count: i64,
    pub high_priority_task_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalCounts {
    pub tasks: i64,
    pub contacts: i64,
}

pub async fn summary<S>(store: &S, owner: Uuid) -> StoreResult<DashboardSummary>
where
    S: TaskRepository + ContactRepository + ?Sized,
{
    let completed = TaskFilter {
        status: Some(TaskStatus::Completed),
        ..TaskFilter::default()
    };
    let high_priority = TaskFilter {
        priority: Some(TaskPriority::High),
        ..TaskFilter::default()
    };

    let (task_count, completed_task_count, contact_count, high_priority_task_count) = tokio::try_join!(
        store.count_tasks(owner, TaskFilter::default()),
        store.count_tasks(owner, completed),
        store.count_contacts(owner),
        store.count_tasks(owner, high_priority),
    )?;

    Ok(DashboardSummary {
        task_count,
        completed_task_count,
        contact_count,
        high_priority_task_count,
    })
}

pub async fn total_counts<S>(store: &S, owner: Uuid) -> StoreResult<TotalCounts>
where
    S: TaskRepository + ContactRepository + ?Sized,
{
    let (tasks, contacts) = tokio::try_join!(
        store.count_tasks(owner, TaskFilter::default()),
        store.count_contacts(owner),
    )?;

    Ok(TotalCounts { tasks, contacts })
}

/// Recently changed tasks and contacts, newest first
pub async fn recent_activity<S>(store: &S, owner: Uuid, pagination: Pagination) -> StoreResult<Page<Activity>>
where
    S: TaskRepository + ContactRepository + ?Sized,
{
    let (tasks, contacts) = tokio::try_join!(store.recent_tasks(owner), store.recent_contacts(owner))?;

    Ok(paginate(merge_recent(tasks, contacts), pagination.page, pagination.limit))
}

/// Tasks due from now on, soonest first
pub async fn upcoming_deadlines<S>(store: &S, owner: Uuid, pagination: Pagination) -> StoreResult<Page<TaskDeadline>>
where
    S: TaskRepository + ?Sized,
{
    let deadlines = store.tasks_due_from(owner, Utc::now()).await?;
    Ok(paginate(deadlines, pagination.page, pagination.limit))
}
