//! Recent-activity feed: merge per-resource change feeds and slice pages out of them.
//!
//! Both functions are pure. The same inputs always produce the same output.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::models::{ContactActivity, TaskActivity};

/// One entry of the merged feed, tagged with its origin
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Activity {
    Task(TaskActivity),
    Contact(ContactActivity),
}

impl Activity {
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Activity::Task(t) => t.updated_at,
            Activity::Contact(c) => c.updated_at,
        }
    }

    /// Merge key. A missing timestamp counts as the Unix epoch.
    fn recency(&self) -> DateTime<Utc> {
        self.updated_at().unwrap_or_default()
    }
}

/// Tag and merge both feeds, most recent first. Ties keep input order, tasks before contacts.
pub fn merge_recent(tasks: Vec<TaskActivity>, contacts: Vec<ContactActivity>) -> Vec<Activity> {
    let mut merged: Vec<Activity> = tasks
        .into_iter()
        .map(Activity::Task)
        .chain(contacts.into_iter().map(Activity::Contact))
        .collect();

    merged.sort_by_key(|a| std::cmp::Reverse(a.recency()));
    merged
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

/// Items at positions `[(page-1)*limit, page*limit)`. `page` and `limit` are
/// validated upstream; zero is treated as one.
pub fn paginate<T>(items: Vec<T>, page: usize, limit: usize) -> Page<T> {
    let page = page.max(1);
    let limit = limit.max(1);
    let total_count = items.len();
    let start = (page - 1).saturating_mul(limit);

    let data = items.into_iter().skip(start).take(limit).collect();

    Page {
        data,
        total_count,
        total_pages: total_count.div_ceil(limit),
        current_page: page,
    }
}
