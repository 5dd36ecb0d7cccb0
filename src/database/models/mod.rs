pub mod contact;
pub mod sales;
pub mod task;

use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

pub use contact::{CompanySummary, Contact, ContactActivity, ContactBrief, ContactPatch, NewContact};
pub use sales::{
    NewSalesOpportunity, SalesField, SalesOpportunity, SalesOpportunityPatch, SalesPriority, SalesStage,
    StageSummary,
};
pub use task::{
    NewTask, Task, TaskActivity, TaskDeadline, TaskField, TaskFilter, TaskPatch, TaskPriority, TaskStatus,
};

/// Patch field that tells an absent key (`None`) apart from an explicit
/// `null` (`Some(None)`). Pair with `#[serde(default)]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// One bucket of a grouped count. The grouped field's literal value is the
/// key; records without a value share the `None` bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct GroupCount {
    pub key: Option<String>,
    pub count: i64,
}

impl GroupCount {
    pub fn new(key: Option<impl Into<String>>, count: i64) -> Self {
        Self { key: key.map(Into::into), count }
    }
}

/// Count occurrences of each key. Output is ordered by key with the
/// `None` bucket first.
pub fn group_counts<I>(keys: I) -> Vec<GroupCount>
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut buckets = std::collections::BTreeMap::<Option<String>, i64>::new();
    for key in keys {
        *buckets.entry(key).or_insert(0) += 1;
    }
    buckets
        .into_iter()
        .map(|(key, count)| GroupCount { key, count })
        .collect()
}
