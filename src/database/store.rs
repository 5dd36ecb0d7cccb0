//! Ownership-scoped storage accessors.
//!
//! Every read, update and delete takes the caller's id alongside the record
//! id and only touches a record whose owner matches. A miss is reported as
//! `None` whether the record is absent or belongs to someone else. Creates
//! always stamp the caller as owner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::*;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage call exceeded {0:?}")]
    Timeout(Duration),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Numeric overflow in {0}")]
    Overflow(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create_task(&self, owner: Uuid, new: NewTask) -> StoreResult<Task>;

    async fn list_tasks(&self, owner: Uuid) -> StoreResult<Vec<Task>>;

    async fn find_task(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Task>>;

    /// Ownership check and mutation happen as one atomic step
    async fn update_task(&self, owner: Uuid, id: Uuid, patch: TaskPatch) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Task>>;

    async fn count_tasks(&self, owner: Uuid, filter: TaskFilter) -> StoreResult<i64>;

    async fn group_tasks(&self, owner: Uuid, field: TaskField) -> StoreResult<Vec<GroupCount>>;

    /// Activity projections, most recently updated first
    async fn recent_tasks(&self, owner: Uuid) -> StoreResult<Vec<TaskActivity>>;

    /// Tasks due at or after `from`, soonest first
    async fn tasks_due_from(&self, owner: Uuid, from: DateTime<Utc>) -> StoreResult<Vec<TaskDeadline>>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create_contact(&self, owner: Uuid, new: NewContact) -> StoreResult<Contact>;

    async fn list_contacts(&self, owner: Uuid) -> StoreResult<Vec<Contact>>;

    async fn find_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>>;

    async fn update_contact(&self, owner: Uuid, id: Uuid, patch: ContactPatch) -> StoreResult<Option<Contact>>;

    async fn delete_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>>;

    async fn count_contacts(&self, owner: Uuid) -> StoreResult<i64>;

    async fn group_contacts_by_company(&self, owner: Uuid) -> StoreResult<Vec<GroupCount>>;

    async fn company_summary(&self, owner: Uuid) -> StoreResult<Vec<CompanySummary>>;

    /// Activity projections, most recently updated first
    async fn recent_contacts(&self, owner: Uuid) -> StoreResult<Vec<ContactActivity>>;
}

#[async_trait]
pub trait SalesRepository: Send + Sync {
    async fn create_sale(&self, owner: Uuid, new: NewSalesOpportunity) -> StoreResult<SalesOpportunity>;

    async fn list_sales(&self, owner: Uuid) -> StoreResult<Vec<SalesOpportunity>>;

    async fn find_sale(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<SalesOpportunity>>;

    async fn update_sale(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: SalesOpportunityPatch,
    ) -> StoreResult<Option<SalesOpportunity>>;

    async fn delete_sale(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<SalesOpportunity>>;

    async fn group_sales(&self, owner: Uuid, field: SalesField) -> StoreResult<Vec<GroupCount>>;

    /// Sum of `value`; zero when the caller has no opportunities
    async fn total_sales_value(&self, owner: Uuid) -> StoreResult<Decimal>;

    /// Opportunities expected to close within `[start, end]`, soonest first
    async fn sales_closing_between(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<SalesOpportunity>>;

    async fn pipeline_summary(&self, owner: Uuid) -> StoreResult<Vec<StageSummary>>;
}

/// Process-wide storage handle
#[async_trait]
pub trait Store: TaskRepository + ContactRepository + SalesRepository {
    async fn health_check(&self) -> StoreResult<()>;

    async fn close(&self);
}
