use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::api::format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum TaskPriority {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "format::date")]
    pub due_date: DateTime<Utc>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    #[serde(rename = "user")]
    pub owner: Uuid,
    #[serde(with = "format::date")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "format::date")]
    pub updated_at: DateTime<Utc>,
}

/// Create payload. Any owner field sent by the client is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "format::date")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Mutable task fields. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    /// `null` clears the description
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "format::date_opt")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

impl Task {
    pub fn from_new(owner: Uuid, new: NewTask) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            due_date: new.due_date,
            priority: new.priority.unwrap_or_default(),
            status: new.status.unwrap_or_default(),
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}

/// Optional equality filters for counting tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
    }
}

/// Fields tasks can be grouped on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Status,
    Priority,
    Owner,
}

/// Projection used by the recent-activity feed
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskActivity {
    pub id: Uuid,
    pub title: String,
    #[serde(with = "format::date_opt")]
    pub updated_at: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(with = "format::date")]
    pub due_date: DateTime<Utc>,
    pub description: Option<String>,
}

impl From<&Task> for TaskActivity {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            updated_at: Some(task.updated_at),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            description: task.description.clone(),
        }
    }
}

/// Projection used by the upcoming-deadlines listing
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeadline {
    pub id: Uuid,
    pub title: String,
    #[serde(with = "format::date")]
    pub due_date: DateTime<Utc>,
    pub priority: TaskPriority,
}

impl From<&Task> for TaskDeadline {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            due_date: task.due_date,
            priority: task.priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_task_defaults_to_low_pending() {
        let new: NewTask = serde_json::from_value(json!({
            "title": "Call supplier",
            "dueDate": "2025-06-01",
            "user": "00000000-0000-0000-0000-000000000000"
        }))
        .unwrap();
        let owner = Uuid::new_v4();
        let task = Task::from_new(owner, new);

        assert_eq!(task.priority, TaskPriority::Low);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.owner, owner);
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let err = serde_json::from_value::<TaskPatch>(json!({ "user": "someone-else" }));
        assert!(err.is_err());
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let new: NewTask = serde_json::from_value(json!({
            "title": "Draft report",
            "description": "Q3",
            "dueDate": "2025-06-01",
            "priority": "High"
        }))
        .unwrap();
        let mut task = Task::from_new(Uuid::new_v4(), new);
        let patch: TaskPatch = serde_json::from_value(json!({ "status": "Completed" })).unwrap();
        task.apply(patch);

        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(task.description.as_deref(), Some("Q3"));
    }

    #[test]
    fn null_clears_description_but_absence_keeps_it() {
        let new: NewTask = serde_json::from_value(json!({
            "title": "Draft report",
            "description": "Q3",
            "dueDate": "2025-06-01"
        }))
        .unwrap();
        let mut task = Task::from_new(Uuid::new_v4(), new);

        let absent: TaskPatch = serde_json::from_value(json!({ "title": "Final report" })).unwrap();
        assert_eq!(absent.description, None);
        task.apply(absent);
        assert_eq!(task.description.as_deref(), Some("Q3"));

        let cleared: TaskPatch = serde_json::from_value(json!({ "description": null })).unwrap();
        assert_eq!(cleared.description, Some(None));
        task.apply(cleared);
        assert_eq!(task.description, None);
        assert_eq!(task.title, "Final report");
    }

    #[test]
    fn serializes_dates_and_owner_for_clients() {
        let new: NewTask = serde_json::from_value(json!({
            "title": "Ship",
            "dueDate": "12/24/2025"
        }))
        .unwrap();
        let task = Task::from_new(Uuid::new_v4(), new);
        let v = serde_json::to_value(&task).unwrap();
        assert_eq!(v["dueDate"], "12/24/2025");
        assert!(v.get("user").is_some());
        assert_eq!(v["status"], "Pending");
    }
}
