// Ownership-scoped repository implementations for Postgres.
//
// Every statement filters on `owner = $n`. Updates and deletes are single
// statements with RETURNING so the ownership check and the write cannot be
// separated by another writer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::manager::PgStore;
use crate::database::models::*;
use crate::database::store::*;

const TASK_COLUMNS: &str = "id, title, description, due_date, priority, status, owner, created_at, updated_at";
const CONTACT_COLUMNS: &str = "id, first_name, last_name, email, phone, company, notes, owner, updated_at";
const SALE_COLUMNS: &str = "id, title, description, stage, value, expected_close_date, priority, created_by, owner, created_at, updated_at";

#[async_trait]
impl TaskRepository for PgStore {
    async fn create_task(&self, owner: Uuid, new: NewTask) -> StoreResult<Task> {
        let task = Task::from_new(owner, new);
        let sql = format!(
            "INSERT INTO tasks ({TASK_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {TASK_COLUMNS}"
        );
        self.guarded(
            "create_task",
            sqlx::query_as::<_, Task>(&sql)
                .bind(task.id)
                .bind(&task.title)
                .bind(&task.description)
                .bind(task.due_date)
                .bind(task.priority)
                .bind(task.status)
                .bind(task.owner)
                .bind(task.created_at)
                .bind(task.updated_at)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn list_tasks(&self, owner: Uuid) -> StoreResult<Vec<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE owner = $1 ORDER BY created_at");
        self.guarded("list_tasks", sqlx::query_as::<_, Task>(&sql).bind(owner).fetch_all(&self.pool))
            .await
    }

    async fn find_task(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND owner = $2");
        self.guarded(
            "find_task",
            sqlx::query_as::<_, Task>(&sql).bind(id).bind(owner).fetch_optional(&self.pool),
        )
        .await
    }

    async fn update_task(&self, owner: Uuid, id: Uuid, patch: TaskPatch) -> StoreResult<Option<Task>> {
        let sql = format!(
            "UPDATE tasks SET
                title = COALESCE($3, title),
                description = CASE WHEN $8::boolean THEN $4::text ELSE description END,
                due_date = COALESCE($5, due_date),
                priority = COALESCE($6, priority),
                status = COALESCE($7, status),
                updated_at = now()
             WHERE id = $1 AND owner = $2
             RETURNING {TASK_COLUMNS}"
        );
        let set_description = patch.description.is_some();
        self.guarded(
            "update_task",
            sqlx::query_as::<_, Task>(&sql)
                .bind(id)
                .bind(owner)
                .bind(patch.title)
                .bind(patch.description.flatten())
                .bind(patch.due_date)
                .bind(patch.priority)
                .bind(patch.status)
                .bind(set_description)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!("DELETE FROM tasks WHERE id = $1 AND owner = $2 RETURNING {TASK_COLUMNS}");
        self.guarded(
            "delete_task",
            sqlx::query_as::<_, Task>(&sql).bind(id).bind(owner).fetch_optional(&self.pool),
        )
        .await
    }

    async fn count_tasks(&self, owner: Uuid, filter: TaskFilter) -> StoreResult<i64> {
        self.guarded(
            "count_tasks",
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM tasks
                 WHERE owner = $1
                   AND ($2::text IS NULL OR status = $2)
                   AND ($3::text IS NULL OR priority = $3)",
            )
            .bind(owner)
            .bind(filter.status)
            .bind(filter.priority)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn group_tasks(&self, owner: Uuid, field: TaskField) -> StoreResult<Vec<GroupCount>> {
        let sql = match field {
            TaskField::Status => {
                "SELECT status AS key, COUNT(*) AS count FROM tasks WHERE owner = $1 GROUP BY status ORDER BY key NULLS FIRST"
            }
            TaskField::Priority => {
                "SELECT priority AS key, COUNT(*) AS count FROM tasks WHERE owner = $1 GROUP BY priority ORDER BY key NULLS FIRST"
            }
            TaskField::Owner => {
                "SELECT owner::text AS key, COUNT(*) AS count FROM tasks WHERE owner = $1 GROUP BY owner ORDER BY key NULLS FIRST"
            }
        };
        self.guarded("group_tasks", sqlx::query_as::<_, GroupCount>(sql).bind(owner).fetch_all(&self.pool))
            .await
    }

    async fn recent_tasks(&self, owner: Uuid) -> StoreResult<Vec<TaskActivity>> {
        self.guarded(
            "recent_tasks",
            sqlx::query_as::<_, TaskActivity>(
                "SELECT id, title, updated_at, status, priority, due_date, description
                 FROM tasks WHERE owner = $1 ORDER BY updated_at DESC",
            )
            .bind(owner)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn tasks_due_from(&self, owner: Uuid, from: DateTime<Utc>) -> StoreResult<Vec<TaskDeadline>> {
        self.guarded(
            "tasks_due_from",
            sqlx::query_as::<_, TaskDeadline>(
                "SELECT id, title, due_date, priority
                 FROM tasks WHERE owner = $1 AND due_date >= $2 ORDER BY due_date",
            )
            .bind(owner)
            .bind(from)
            .fetch_all(&self.pool),
        )
        .await
    }
}

#[derive(FromRow)]
struct CompanyRow {
    company: Option<String>,
    count: i64,
    contacts: Json<Vec<ContactBrief>>,
}

#[async_trait]
impl ContactRepository for PgStore {
    async fn create_contact(&self, owner: Uuid, new: NewContact) -> StoreResult<Contact> {
        let contact = Contact::from_new(owner, new);
        let sql = format!(
            "INSERT INTO contacts ({CONTACT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {CONTACT_COLUMNS}"
        );
        self.guarded(
            "create_contact",
            sqlx::query_as::<_, Contact>(&sql)
                .bind(contact.id)
                .bind(&contact.first_name)
                .bind(&contact.last_name)
                .bind(&contact.email)
                .bind(&contact.phone)
                .bind(&contact.company)
                .bind(&contact.notes)
                .bind(contact.owner)
                .bind(contact.updated_at)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn list_contacts(&self, owner: Uuid) -> StoreResult<Vec<Contact>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE owner = $1 ORDER BY updated_at DESC");
        self.guarded("list_contacts", sqlx::query_as::<_, Contact>(&sql).bind(owner).fetch_all(&self.pool))
            .await
    }

    async fn find_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1 AND owner = $2");
        self.guarded(
            "find_contact",
            sqlx::query_as::<_, Contact>(&sql).bind(id).bind(owner).fetch_optional(&self.pool),
        )
        .await
    }

    async fn update_contact(&self, owner: Uuid, id: Uuid, patch: ContactPatch) -> StoreResult<Option<Contact>> {
        let sql = format!(
            "UPDATE contacts SET
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                company = CASE WHEN $9::boolean THEN $7::text ELSE company END,
                notes = CASE WHEN $10::boolean THEN $8::text ELSE notes END,
                updated_at = now()
             WHERE id = $1 AND owner = $2
             RETURNING {CONTACT_COLUMNS}"
        );
        let (set_company, set_notes) = (patch.company.is_some(), patch.notes.is_some());
        self.guarded(
            "update_contact",
            sqlx::query_as::<_, Contact>(&sql)
                .bind(id)
                .bind(owner)
                .bind(patch.first_name)
                .bind(patch.last_name)
                .bind(patch.email)
                .bind(patch.phone)
                .bind(patch.company.flatten())
                .bind(patch.notes.flatten())
                .bind(set_company)
                .bind(set_notes)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>> {
        let sql = format!("DELETE FROM contacts WHERE id = $1 AND owner = $2 RETURNING {CONTACT_COLUMNS}");
        self.guarded(
            "delete_contact",
            sqlx::query_as::<_, Contact>(&sql).bind(id).bind(owner).fetch_optional(&self.pool),
        )
        .await
    }

    async fn count_contacts(&self, owner: Uuid) -> StoreResult<i64> {
        self.guarded(
            "count_contacts",
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM contacts WHERE owner = $1")
                .bind(owner)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn group_contacts_by_company(&self, owner: Uuid) -> StoreResult<Vec<GroupCount>> {
        self.guarded(
            "group_contacts_by_company",
            sqlx::query_as::<_, GroupCount>(
                "SELECT company AS key, COUNT(*) AS count FROM contacts
                 WHERE owner = $1 GROUP BY company ORDER BY key NULLS FIRST",
            )
            .bind(owner)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn company_summary(&self, owner: Uuid) -> StoreResult<Vec<CompanySummary>> {
        let rows = self
            .guarded(
                "company_summary",
                sqlx::query_as::<_, CompanyRow>(
                    "SELECT company,
                            COUNT(*) AS count,
                            json_agg(json_build_object(
                                'firstName', first_name,
                                'lastName', last_name,
                                'notes', notes
                            )) AS contacts
                     FROM contacts WHERE owner = $1
                     GROUP BY company ORDER BY company NULLS FIRST",
                )
                .bind(owner)
                .fetch_all(&self.pool),
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| CompanySummary {
                company: row.company,
                count: row.count,
                contacts: row.contacts.0,
            })
            .collect())
    }

    async fn recent_contacts(&self, owner: Uuid) -> StoreResult<Vec<ContactActivity>> {
        self.guarded(
            "recent_contacts",
            sqlx::query_as::<_, ContactActivity>(
                "SELECT id, first_name, last_name, email, phone, company, notes, updated_at
                 FROM contacts WHERE owner = $1 ORDER BY updated_at DESC",
            )
            .bind(owner)
            .fetch_all(&self.pool),
        )
        .await
    }
}

#[async_trait]
impl SalesRepository for PgStore {
    async fn create_sale(&self, owner: Uuid, new: NewSalesOpportunity) -> StoreResult<SalesOpportunity> {
        let opp = SalesOpportunity::from_new(owner, new);
        let sql = format!(
            "INSERT INTO sales_opportunities ({SALE_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {SALE_COLUMNS}"
        );
        self.guarded(
            "create_sale",
            sqlx::query_as::<_, SalesOpportunity>(&sql)
                .bind(opp.id)
                .bind(&opp.title)
                .bind(&opp.description)
                .bind(opp.stage)
                .bind(opp.value)
                .bind(opp.expected_close_date)
                .bind(opp.priority)
                .bind(opp.created_by)
                .bind(opp.owner)
                .bind(opp.created_at)
                .bind(opp.updated_at)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn list_sales(&self, owner: Uuid) -> StoreResult<Vec<SalesOpportunity>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales_opportunities WHERE owner = $1 ORDER BY created_at");
        self.guarded(
            "list_sales",
            sqlx::query_as::<_, SalesOpportunity>(&sql).bind(owner).fetch_all(&self.pool),
        )
        .await
    }

    async fn find_sale(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<SalesOpportunity>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales_opportunities WHERE id = $1 AND owner = $2");
        self.guarded(
            "find_sale",
            sqlx::query_as::<_, SalesOpportunity>(&sql)
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn update_sale(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: SalesOpportunityPatch,
    ) -> StoreResult<Option<SalesOpportunity>> {
        let sql = format!(
            "UPDATE sales_opportunities SET
                title = COALESCE(btrim($3), title),
                description = CASE WHEN $9::boolean THEN btrim($4::text) ELSE description END,
                stage = COALESCE($5, stage),
                value = COALESCE($6, value),
                expected_close_date = COALESCE($7, expected_close_date),
                priority = COALESCE($8, priority),
                updated_at = now()
             WHERE id = $1 AND owner = $2
             RETURNING {SALE_COLUMNS}"
        );
        let set_description = patch.description.is_some();
        self.guarded(
            "update_sale",
            sqlx::query_as::<_, SalesOpportunity>(&sql)
                .bind(id)
                .bind(owner)
                .bind(patch.title)
                .bind(patch.description.flatten())
                .bind(patch.stage)
                .bind(patch.value)
                .bind(patch.expected_close_date)
                .bind(patch.priority)
                .bind(set_description)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete_sale(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<SalesOpportunity>> {
        let sql = format!("DELETE FROM sales_opportunities WHERE id = $1 AND owner = $2 RETURNING {SALE_COLUMNS}");
        self.guarded(
            "delete_sale",
            sqlx::query_as::<_, SalesOpportunity>(&sql)
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn group_sales(&self, owner: Uuid, field: SalesField) -> StoreResult<Vec<GroupCount>> {
        let sql = match field {
            SalesField::Stage => {
                "SELECT stage AS key, COUNT(*) AS count FROM sales_opportunities WHERE owner = $1 GROUP BY stage ORDER BY key NULLS FIRST"
            }
            SalesField::Priority => {
                "SELECT priority AS key, COUNT(*) AS count FROM sales_opportunities WHERE owner = $1 GROUP BY priority ORDER BY key NULLS FIRST"
            }
            SalesField::Owner => {
                "SELECT owner::text AS key, COUNT(*) AS count FROM sales_opportunities WHERE owner = $1 GROUP BY owner ORDER BY key NULLS FIRST"
            }
        };
        self.guarded("group_sales", sqlx::query_as::<_, GroupCount>(sql).bind(owner).fetch_all(&self.pool))
            .await
    }

    async fn total_sales_value(&self, owner: Uuid) -> StoreResult<Decimal> {
        self.guarded(
            "total_sales_value",
            sqlx::query_scalar::<_, Decimal>(
                "SELECT COALESCE(SUM(value), 0) FROM sales_opportunities WHERE owner = $1",
            )
            .bind(owner)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn sales_closing_between(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<SalesOpportunity>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales_opportunities
             WHERE owner = $1 AND expected_close_date BETWEEN $2 AND $3
             ORDER BY expected_close_date"
        );
        self.guarded(
            "sales_closing_between",
            sqlx::query_as::<_, SalesOpportunity>(&sql)
                .bind(owner)
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn pipeline_summary(&self, owner: Uuid) -> StoreResult<Vec<StageSummary>> {
        self.guarded(
            "pipeline_summary",
            sqlx::query_as::<_, StageSummary>(
                "SELECT stage, COUNT(*) AS count, COALESCE(SUM(value), 0) AS total_value
                 FROM sales_opportunities WHERE owner = $1
                 GROUP BY stage ORDER BY stage",
            )
            .bind(owner)
            .fetch_all(&self.pool),
        )
        .await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        self.ping().await
    }

    async fn close(&self) {
        self.shutdown().await;
    }
}
