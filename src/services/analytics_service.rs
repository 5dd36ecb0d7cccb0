//! Per-resource facet bundles and the combined analytics view.
//!
//! Each bundle is all-or-nothing: if any of its sub-aggregations fails the
//! bundle fails. The combined view runs the three bundles concurrently and
//! replaces a failed one with an empty object instead of failing the request.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::database::models::{GroupCount, SalesField, TaskField, TaskStatus};
use crate::database::{ContactRepository, SalesRepository, StoreResult, TaskRepository};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAnalytics {
    pub status_counts: Vec<GroupCount>,
    pub priority_counts: Vec<GroupCount>,
    pub owner_distribution: Vec<GroupCount>,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAnalytics {
    pub company_counts: Vec<GroupCount>,
    pub total_contacts: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesAnalytics {
    pub stage_counts: Vec<GroupCount>,
    pub priority_counts: Vec<GroupCount>,
    pub owner_counts: Vec<GroupCount>,
    pub total_value: Decimal,
}

/// Serializes as `{}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Empty {}

/// A facet bundle, or `{}` when its fetch failed
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Facet<T> {
    Ready(T),
    Failed(Empty),
}

impl<T> Facet<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Facet::Ready(_))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedAnalytics {
    pub task_analytics: Facet<TaskAnalytics>,
    pub contact_analytics: Facet<ContactAnalytics>,
    pub sales_analytics: Facet<SalesAnalytics>,
}

/// Percentage of completed tasks, 0 when there are none
pub fn completion_rate(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let completed = completed.clamp(0, total);
    completed as f64 / total as f64 * 100.0
}

fn sum_counts(groups: &[GroupCount]) -> i64 {
    groups.iter().map(|g| g.count).sum()
}

pub async fn task_analytics<R>(repo: &R, owner: Uuid) -> StoreResult<TaskAnalytics>
where
    R: TaskRepository + ?Sized,
{
    let (status_counts, priority_counts, owner_distribution) = tokio::try_join!(
        repo.group_tasks(owner, TaskField::Status),
        repo.group_tasks(owner, TaskField::Priority),
        repo.group_tasks(owner, TaskField::Owner),
    )?;

    let total_tasks = sum_counts(&status_counts);
    let completed_tasks = status_counts
        .iter()
        .find(|g| g.key.as_deref() == Some(TaskStatus::Completed.as_str()))
        .map_or(0, |g| g.count);

    Ok(TaskAnalytics {
        status_counts,
        priority_counts,
        owner_distribution,
        total_tasks,
        completed_tasks,
        completion_rate: completion_rate(completed_tasks, total_tasks),
    })
}

pub async fn contact_analytics<R>(repo: &R, owner: Uuid) -> StoreResult<ContactAnalytics>
where
    R: ContactRepository + ?Sized,
{
    let company_counts = repo.group_contacts_by_company(owner).await?;
    let total_contacts = sum_counts(&company_counts);

    Ok(ContactAnalytics {
        company_counts,
        total_contacts,
    })
}

pub async fn sales_analytics<R>(repo: &R, owner: Uuid) -> StoreResult<SalesAnalytics>
where
    R: SalesRepository + ?Sized,
{
    let (stage_counts, priority_counts, owner_counts, total_value) = tokio::try_join!(
        repo.group_sales(owner, SalesField::Stage),
        repo.group_sales(owner, SalesField::Priority),
        repo.group_sales(owner, SalesField::Owner),
        repo.total_sales_value(owner),
    )?;

    Ok(SalesAnalytics {
        stage_counts,
        priority_counts,
        owner_counts,
        total_value,
    })
}

fn settle<T>(facet: &str, owner: Uuid, result: StoreResult<T>) -> Facet<T> {
    match result {
        Ok(value) => Facet::Ready(value),
        Err(e) => {
            tracing::warn!("{} analytics failed for user {}: {}", facet, owner, e);
            Facet::Failed(Empty {})
        }
    }
}

/// Run all three bundles concurrently and wait for every one to settle
pub async fn combined<T, C, S>(tasks: &T, contacts: &C, sales: &S, owner: Uuid) -> CombinedAnalytics
where
    T: TaskRepository + ?Sized,
    C: ContactRepository + ?Sized,
    S: SalesRepository + ?Sized,
{
    let (task_result, contact_result, sales_result) = tokio::join!(
        task_analytics(tasks, owner),
        contact_analytics(contacts, owner),
        sales_analytics(sales, owner),
    );

    CombinedAnalytics {
        task_analytics: settle("Task", owner, task_result),
        contact_analytics: settle("Contact", owner, contact_result),
        sales_analytics: settle("Sales", owner, sales_result),
    }
}
