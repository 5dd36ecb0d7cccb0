//! In-process store with the same ownership and grouping semantics as the
//! Postgres store. Used by tests and `--in-memory` runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::*;
use crate::database::store::*;

#[derive(Default)]
pub struct MemoryStore {
    tasks: RwLock<Vec<Task>>,
    contacts: RwLock<Vec<Contact>>,
    sales: RwLock<Vec<SalesOpportunity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(contacts: &[Contact], email: &str, except: Option<Uuid>) -> bool {
    contacts
        .iter()
        .any(|c| c.email == email && Some(c.id) != except)
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create_task(&self, owner: Uuid, new: NewTask) -> StoreResult<Task> {
        let task = Task::from_new(owner, new);
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn list_tasks(&self, owner: Uuid) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().filter(|t| t.owner == owner).cloned().collect())
    }

    async fn find_task(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|t| t.id == id && t.owner == owner).cloned())
    }

    async fn update_task(&self, owner: Uuid, id: Uuid, patch: TaskPatch) -> StoreResult<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks
            .iter_mut()
            .find(|t| t.id == id && t.owner == owner)
            .map(|task| {
                task.apply(patch);
                task.clone()
            }))
    }

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks
            .iter()
            .position(|t| t.id == id && t.owner == owner)
            .map(|idx| tasks.remove(idx)))
    }

    async fn count_tasks(&self, owner: Uuid, filter: TaskFilter) -> StoreResult<i64> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .filter(|t| t.owner == owner && filter.matches(t))
            .count() as i64)
    }

    async fn group_tasks(&self, owner: Uuid, field: TaskField) -> StoreResult<Vec<GroupCount>> {
        let tasks = self.tasks.read().await;
        Ok(group_counts(tasks.iter().filter(|t| t.owner == owner).map(|t| {
            Some(match field {
                TaskField::Status => t.status.as_str().to_string(),
                TaskField::Priority => t.priority.as_str().to_string(),
                TaskField::Owner => t.owner.to_string(),
            })
        })))
    }

    async fn recent_tasks(&self, owner: Uuid) -> StoreResult<Vec<TaskActivity>> {
        let tasks = self.tasks.read().await;
        let mut recent: Vec<TaskActivity> = tasks
            .iter()
            .filter(|t| t.owner == owner)
            .map(TaskActivity::from)
            .collect();
        recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(recent)
    }

    async fn tasks_due_from(&self, owner: Uuid, from: DateTime<Utc>) -> StoreResult<Vec<TaskDeadline>> {
        let tasks = self.tasks.read().await;
        let mut due: Vec<TaskDeadline> = tasks
            .iter()
            .filter(|t| t.owner == owner && t.due_date >= from)
            .map(TaskDeadline::from)
            .collect();
        due.sort_by_key(|d| d.due_date);
        Ok(due)
    }
}

#[async_trait]
impl ContactRepository for MemoryStore {
    async fn create_contact(&self, owner: Uuid, new: NewContact) -> StoreResult<Contact> {
        let mut contacts = self.contacts.write().await;
        if email_taken(&contacts, &new.email, None) {
            return Err(StoreError::Conflict(format!("email {} already exists", new.email)));
        }
        let contact = Contact::from_new(owner, new);
        contacts.push(contact.clone());
        Ok(contact)
    }

    async fn list_contacts(&self, owner: Uuid) -> StoreResult<Vec<Contact>> {
        let contacts = self.contacts.read().await;
        let mut mine: Vec<Contact> = contacts.iter().filter(|c| c.owner == owner).cloned().collect();
        mine.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(mine)
    }

    async fn find_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>> {
        let contacts = self.contacts.read().await;
        Ok(contacts.iter().find(|c| c.id == id && c.owner == owner).cloned())
    }

    async fn update_contact(&self, owner: Uuid, id: Uuid, patch: ContactPatch) -> StoreResult<Option<Contact>> {
        let mut contacts = self.contacts.write().await;
        let Some(idx) = contacts.iter().position(|c| c.id == id && c.owner == owner) else {
            return Ok(None);
        };
        if let Some(email) = patch.email.as_deref() {
            if email_taken(&contacts, email, Some(id)) {
                return Err(StoreError::Conflict(format!("email {} already exists", email)));
            }
        }
        contacts[idx].apply(patch);
        Ok(Some(contacts[idx].clone()))
    }

    async fn delete_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>> {
        let mut contacts = self.contacts.write().await;
        Ok(contacts
            .iter()
            .position(|c| c.id == id && c.owner == owner)
            .map(|idx| contacts.remove(idx)))
    }

    async fn count_contacts(&self, owner: Uuid) -> StoreResult<i64> {
        let contacts = self.contacts.read().await;
        Ok(contacts.iter().filter(|c| c.owner == owner).count() as i64)
    }

    async fn group_contacts_by_company(&self, owner: Uuid) -> StoreResult<Vec<GroupCount>> {
        let contacts = self.contacts.read().await;
        Ok(group_counts(
            contacts
                .iter()
                .filter(|c| c.owner == owner)
                .map(|c| c.company.clone()),
        ))
    }

    async fn company_summary(&self, owner: Uuid) -> StoreResult<Vec<CompanySummary>> {
        let contacts = self.contacts.read().await;
        let mut by_company = BTreeMap::<Option<String>, Vec<ContactBrief>>::new();
        for c in contacts.iter().filter(|c| c.owner == owner) {
            by_company.entry(c.company.clone()).or_default().push(ContactBrief {
                first_name: c.first_name.clone(),
                last_name: c.last_name.clone(),
                notes: c.notes.clone(),
            });
        }
        Ok(by_company
            .into_iter()
            .map(|(company, contacts)| CompanySummary {
                company,
                count: contacts.len() as i64,
                contacts,
            })
            .collect())
    }

    async fn recent_contacts(&self, owner: Uuid) -> StoreResult<Vec<ContactActivity>> {
        let contacts = self.contacts.read().await;
        let mut recent: Vec<ContactActivity> = contacts
            .iter()
            .filter(|c| c.owner == owner)
            .map(ContactActivity::from)
            .collect();
        recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(recent)
    }
}

#[async_trait]
impl SalesRepository for MemoryStore {
    async fn create_sale(&self, owner: Uuid, new: NewSalesOpportunity) -> StoreResult<SalesOpportunity> {
        let opp = SalesOpportunity::from_new(owner, new);
        self.sales.write().await.push(opp.clone());
        Ok(opp)
    }

    async fn list_sales(&self, owner: Uuid) -> StoreResult<Vec<SalesOpportunity>> {
        let sales = self.sales.read().await;
        Ok(sales.iter().filter(|s| s.owner == owner).cloned().collect())
    }

    async fn find_sale(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<SalesOpportunity>> {
        let sales = self.sales.read().await;
        Ok(sales.iter().find(|s| s.id == id && s.owner == owner).cloned())
    }

    async fn update_sale(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: SalesOpportunityPatch,
    ) -> StoreResult<Option<SalesOpportunity>> {
        let mut sales = self.sales.write().await;
        Ok(sales
            .iter_mut()
            .find(|s| s.id == id && s.owner == owner)
            .map(|opp| {
                opp.apply(patch);
                opp.clone()
            }))
    }

    async fn delete_sale(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<SalesOpportunity>> {
        let mut sales = self.sales.write().await;
        Ok(sales
            .iter()
            .position(|s| s.id == id && s.owner == owner)
            .map(|idx| sales.remove(idx)))
    }

    async fn group_sales(&self, owner: Uuid, field: SalesField) -> StoreResult<Vec<GroupCount>> {
        let sales = self.sales.read().await;
        Ok(group_counts(sales.iter().filter(|s| s.owner == owner).map(|s| {
            Some(match field {
                SalesField::Stage => s.stage.as_str().to_string(),
                SalesField::Priority => s.priority.as_str().to_string(),
                SalesField::Owner => s.owner.to_string(),
            })
        })))
    }

    async fn total_sales_value(&self, owner: Uuid) -> StoreResult<Decimal> {
        let sales = self.sales.read().await;
        sales
            .iter()
            .filter(|s| s.owner == owner)
            .try_fold(Decimal::ZERO, |total, s| total.checked_add(s.value))
            .ok_or(StoreError::Overflow("total sales value"))
    }

    async fn sales_closing_between(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<SalesOpportunity>> {
        let sales = self.sales.read().await;
        let mut hits: Vec<SalesOpportunity> = sales
            .iter()
            .filter(|s| s.owner == owner && s.expected_close_date >= start && s.expected_close_date <= end)
            .cloned()
            .collect();
        hits.sort_by_key(|s| s.expected_close_date);
        Ok(hits)
    }

    async fn pipeline_summary(&self, owner: Uuid) -> StoreResult<Vec<StageSummary>> {
        let sales = self.sales.read().await;
        let mut by_stage = BTreeMap::<&'static str, StageSummary>::new();
        for s in sales.iter().filter(|s| s.owner == owner) {
            let entry = by_stage.entry(s.stage.as_str()).or_insert(StageSummary {
                stage: s.stage,
                count: 0,
                total_value: Decimal::ZERO,
            });
            entry.count += 1;
            entry.total_value = entry
                .total_value
                .checked_add(s.value)
                .ok_or(StoreError::Overflow("pipeline stage value"))?;
        }
        Ok(by_stage.into_values().collect())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn new_task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            due_date: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            priority: None,
            status: None,
        }
    }

    fn new_contact(email: &str, company: Option<&str>) -> NewContact {
        NewContact {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            phone: "555-0100".to_string(),
            company: company.map(str::to_string),
            notes: None,
        }
    }

    fn new_sale(stage: SalesStage, value: i64) -> NewSalesOpportunity {
        NewSalesOpportunity {
            title: "Deal".to_string(),
            description: None,
            stage,
            value: Decimal::from(value),
            expected_close_date: Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap(),
            priority: SalesPriority::Medium,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn other_owners_only_ever_see_not_found() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let task = store.create_task(alice, new_task("private")).await.unwrap();

        assert!(store.find_task(bob, task.id).await.unwrap().is_none());
        let patch = TaskPatch { title: Some("hijacked".into()), ..Default::default() };
        assert!(store.update_task(bob, task.id, patch).await.unwrap().is_none());
        assert!(store.delete_task(bob, task.id).await.unwrap().is_none());

        let still = store.find_task(alice, task.id).await.unwrap().unwrap();
        assert_eq!(still.title, "private");
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let task = store.create_task(owner, new_task("gone")).await.unwrap();
        assert!(store.delete_task(owner, task.id).await.unwrap().is_some());
        assert!(store.find_task(owner, task.id).await.unwrap().is_none());
        assert!(store.delete_task(owner, task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn contact_email_is_globally_unique() {
        let store = MemoryStore::new();
        store
            .create_contact(Uuid::new_v4(), new_contact("a@example.com", None))
            .await
            .unwrap();
        let dup = store
            .create_contact(Uuid::new_v4(), new_contact("a@example.com", None))
            .await;
        assert!(matches!(dup, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn contact_email_update_to_existing_conflicts() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store.create_contact(owner, new_contact("a@example.com", None)).await.unwrap();
        let b = store.create_contact(owner, new_contact("b@example.com", None)).await.unwrap();

        let patch = ContactPatch { email: Some("a@example.com".into()), ..Default::default() };
        assert!(matches!(
            store.update_contact(owner, b.id, patch).await,
            Err(StoreError::Conflict(_))
        ));

        let same = ContactPatch { email: Some("b@example.com".into()), ..Default::default() };
        assert!(store.update_contact(owner, b.id, same).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn company_groups_keep_missing_company() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store.create_contact(owner, new_contact("1@x.io", Some("Acme"))).await.unwrap();
        store.create_contact(owner, new_contact("2@x.io", None)).await.unwrap();
        store.create_contact(owner, new_contact("3@x.io", Some("Acme"))).await.unwrap();
        store.create_contact(Uuid::new_v4(), new_contact("4@x.io", Some("Acme"))).await.unwrap();

        let groups = store.group_contacts_by_company(owner).await.unwrap();
        assert_eq!(
            groups,
            vec![GroupCount::new(None::<String>, 1), GroupCount::new(Some("Acme"), 2)]
        );

        let summary = store.company_summary(owner).await.unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[1].contacts.len(), 2);
    }

    #[tokio::test]
    async fn empty_owner_has_empty_groups_and_zero_value() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        assert!(store.group_contacts_by_company(owner).await.unwrap().is_empty());
        assert!(store.group_tasks(owner, TaskField::Status).await.unwrap().is_empty());
        assert_eq!(store.total_sales_value(owner).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn pipeline_summary_totals_per_stage() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store.create_sale(owner, new_sale(SalesStage::Prospect, 100)).await.unwrap();
        store.create_sale(owner, new_sale(SalesStage::Prospect, 50)).await.unwrap();
        store.create_sale(owner, new_sale(SalesStage::ClosedWon, 700)).await.unwrap();

        let summary = store.pipeline_summary(owner).await.unwrap();
        let prospect = summary.iter().find(|s| s.stage == SalesStage::Prospect).unwrap();
        assert_eq!(prospect.count, 2);
        assert_eq!(prospect.total_value, Decimal::from(150));
        assert_eq!(store.total_sales_value(owner).await.unwrap(), Decimal::from(850));
    }

    #[tokio::test]
    async fn closing_range_is_inclusive() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let opp = store.create_sale(owner, new_sale(SalesStage::Qualified, 10)).await.unwrap();
        let day = opp.expected_close_date;

        assert_eq!(store.sales_closing_between(owner, day, day).await.unwrap().len(), 1);
        let later = day + Duration::days(1);
        assert!(store
            .sales_closing_between(owner, later, later + Duration::days(5))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn deadlines_are_future_only_and_ascending() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let now = Utc::now();
        for offset in [5, -3, 1] {
            let mut t = new_task(&format!("t{}", offset));
            t.due_date = now + Duration::days(offset);
            store.create_task(owner, t).await.unwrap();
        }

        let due = store.tasks_due_from(owner, now).await.unwrap();
        let titles: Vec<_> = due.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["t1", "t5"]);
    }

    #[tokio::test]
    async fn value_sums_report_overflow_instead_of_panicking() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        for _ in 0..2 {
            let mut sale = new_sale(SalesStage::Prospect, 0);
            sale.value = Decimal::MAX;
            store.create_sale(owner, sale).await.unwrap();
        }

        assert!(matches!(
            store.total_sales_value(owner).await,
            Err(StoreError::Overflow(_))
        ));
        assert!(matches!(
            store.pipeline_summary(owner).await,
            Err(StoreError::Overflow(_))
        ));
    }
}
