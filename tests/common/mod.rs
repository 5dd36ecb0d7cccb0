#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use workdesk_api::auth::{issue_session_token, JwtIdentityProvider};
use workdesk_api::config::AppConfig;
use workdesk_api::database::models::*;
use workdesk_api::database::{
    ContactRepository, MemoryStore, SalesRepository, Store, StoreError, StoreResult, TaskRepository,
};
use workdesk_api::{app, AppState};

pub const SECRET: &str = "integration-test-secret";

/// A caller with a valid bearer token
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

/// The full router over a fresh in-memory store, driven in-process
pub struct TestApp {
    router: Router,
    config: AppConfig,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = SECRET.to_string();
    config.pagination.max_limit = 50;
    config
}

impl TestApp {
    pub fn new() -> Result<Self> {
        Self::with_store(Arc::new(MemoryStore::new()), test_config())
    }

    pub fn with_config(config: AppConfig) -> Result<Self> {
        Self::with_store(Arc::new(MemoryStore::new()), config)
    }

    pub fn with_store(store: Arc<dyn Store>, config: AppConfig) -> Result<Self> {
        let identity = JwtIdentityProvider::new(&config.security.jwt_secret)?;
        let state = AppState::new(store, Arc::new(identity), config.clone());
        Ok(Self { router: app(state), config })
    }

    pub fn user(&self) -> Result<TestUser> {
        let id = Uuid::new_v4();
        let token = issue_session_token(&self.config.security, id, Some(format!("{}@example.com", id)))?;
        Ok(TestUser { id, token })
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json)?)
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body)?).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .context("failed to read response body")?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body from {}", uri))?
        };

        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, user: &TestUser, uri: &str) -> Result<TestResponse> {
        self.request(Method::GET, uri, Some(&user.token), None).await
    }

    pub async fn post(&self, user: &TestUser, uri: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, uri, Some(&user.token), Some(body)).await
    }

    pub async fn put(&self, user: &TestUser, uri: &str, body: Value) -> Result<TestResponse> {
        self.request(Method::PUT, uri, Some(&user.token), Some(body)).await
    }

    pub async fn delete(&self, user: &TestUser, uri: &str) -> Result<TestResponse> {
        self.request(Method::DELETE, uri, Some(&user.token), None).await
    }

    /// Create a record and return its id
    pub async fn create(&self, user: &TestUser, uri: &str, body: Value) -> Result<String> {
        let res = self.post(user, uri, body).await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "create failed: {} {}", res.status, res.body);
        res.data()["id"]
            .as_str()
            .map(String::from)
            .context("created record has no id")
    }
}

/// Tasks and contacts are served from memory; every sales call fails
pub struct SalesOutage(pub MemoryStore);

impl SalesOutage {
    pub fn new() -> Self {
        Self(MemoryStore::new())
    }
}

fn sales_down<T>() -> StoreResult<T> {
    Err(StoreError::ConnectionError("sales backend unavailable".into()))
}

#[async_trait]
impl TaskRepository for SalesOutage {
    async fn create_task(&self, owner: Uuid, new: NewTask) -> StoreResult<Task> {
        self.0.create_task(owner, new).await
    }

    async fn list_tasks(&self, owner: Uuid) -> StoreResult<Vec<Task>> {
        self.0.list_tasks(owner).await
    }

    async fn find_task(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
        self.0.find_task(owner, id).await
    }

    async fn update_task(&self, owner: Uuid, id: Uuid, patch: TaskPatch) -> StoreResult<Option<Task>> {
        self.0.update_task(owner, id, patch).await
    }

    async fn delete_task(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
        self.0.delete_task(owner, id).await
    }

    async fn count_tasks(&self, owner: Uuid, filter: TaskFilter) -> StoreResult<i64> {
        self.0.count_tasks(owner, filter).await
    }

    async fn group_tasks(&self, owner: Uuid, field: TaskField) -> StoreResult<Vec<GroupCount>> {
        self.0.group_tasks(owner, field).await
    }

    async fn recent_tasks(&self, owner: Uuid) -> StoreResult<Vec<TaskActivity>> {
        self.0.recent_tasks(owner).await
    }

    async fn tasks_due_from(&self, owner: Uuid, from: DateTime<Utc>) -> StoreResult<Vec<TaskDeadline>> {
        self.0.tasks_due_from(owner, from).await
    }
}

#[async_trait]
impl ContactRepository for SalesOutage {
    async fn create_contact(&self, owner: Uuid, new: NewContact) -> StoreResult<Contact> {
        self.0.create_contact(owner, new).await
    }

    async fn list_contacts(&self, owner: Uuid) -> StoreResult<Vec<Contact>> {
        self.0.list_contacts(owner).await
    }

    async fn find_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>> {
        self.0.find_contact(owner, id).await
    }

    async fn update_contact(&self, owner: Uuid, id: Uuid, patch: ContactPatch) -> StoreResult<Option<Contact>> {
        self.0.update_contact(owner, id, patch).await
    }

    async fn delete_contact(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Contact>> {
        self.0.delete_contact(owner, id).await
    }

    async fn count_contacts(&self, owner: Uuid) -> StoreResult<i64> {
        self.0.count_contacts(owner).await
    }

    async fn group_contacts_by_company(&self, owner: Uuid) -> StoreResult<Vec<GroupCount>> {
        self.0.group_contacts_by_company(owner).await
    }

    async fn company_summary(&self, owner: Uuid) -> StoreResult<Vec<CompanySummary>> {
        self.0.company_summary(owner).await
    }

    async fn recent_contacts(&self, owner: Uuid) -> StoreResult<Vec<ContactActivity>> {
        self.0.recent_contacts(owner).await
    }
}

#[async_trait]
impl SalesRepository for SalesOutage {
    async fn create_sale(&self, _: Uuid, _: NewSalesOpportunity) -> StoreResult<SalesOpportunity> {
        sales_down()
    }

    async fn list_sales(&self, _: Uuid) -> StoreResult<Vec<SalesOpportunity>> {
        sales_down()
    }

    async fn find_sale(&self, _: Uuid, _: Uuid) -> StoreResult<Option<SalesOpportunity>> {
        sales_down()
    }

    async fn update_sale(
        &self,
        _: Uuid,
        _: Uuid,
        _: SalesOpportunityPatch,
    ) -> StoreResult<Option<SalesOpportunity>> {
        sales_down()
    }

    async fn delete_sale(&self, _: Uuid, _: Uuid) -> StoreResult<Option<SalesOpportunity>> {
        sales_down()
    }

    async fn group_sales(&self, _: Uuid, _: SalesField) -> StoreResult<Vec<GroupCount>> {
        sales_down()
    }

    async fn total_sales_value(&self, _: Uuid) -> StoreResult<Decimal> {
        sales_down()
    }

    async fn sales_closing_between(
        &self,
        _: Uuid,
        _: DateTime<Utc>,
        _: DateTime<Utc>,
    ) -> StoreResult<Vec<SalesOpportunity>> {
        sales_down()
    }

    async fn pipeline_summary(&self, _: Uuid) -> StoreResult<Vec<StageSummary>> {
        sales_down()
    }
}

#[async_trait]
impl Store for SalesOutage {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) {}
}
