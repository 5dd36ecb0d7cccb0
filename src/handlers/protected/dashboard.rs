// handlers/protected/dashboard.rs - /api/dashboard/* handlers

use axum::extract::State;

use crate::api::Pagination;
use crate::app::AppState;
use crate::database::models::{CompanySummary, GroupCount, TaskDeadline, TaskField};
use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::services::dashboard_service;
use crate::services::{Activity, DashboardSummary, Page, TotalCounts};

/// GET /api/dashboard/summary
pub async fn summary(State(state): State<AppState>, caller: Caller) -> ApiResult<DashboardSummary> {
    let summary = dashboard_service::summary(&*state.store, caller.id()).await?;
    Ok(ApiResponse::success(summary))
}

/// GET /api/dashboard/total-counts
pub async fn total_counts(State(state): State<AppState>, caller: Caller) -> ApiResult<TotalCounts> {
    let counts = dashboard_service::total_counts(&*state.store, caller.id()).await?;
    Ok(ApiResponse::success(counts))
}

/// GET /api/dashboard/recent-activity?page&limit
pub async fn recent_activity(
    State(state): State<AppState>,
    caller: Caller,
    pagination: Pagination,
) -> ApiResult<Page<Activity>> {
    let page = dashboard_service::recent_activity(&*state.store, caller.id(), pagination).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/dashboard/upcoming-deadlines?page&limit
pub async fn upcoming_deadlines(
    State(state): State<AppState>,
    caller: Caller,
    pagination: Pagination,
) -> ApiResult<Page<TaskDeadline>> {
    let page = dashboard_service::upcoming_deadlines(&*state.store, caller.id(), pagination).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/dashboard/tasks-summary/status
pub async fn tasks_by_status(State(state): State<AppState>, caller: Caller) -> ApiResult<Vec<GroupCount>> {
    let groups = state.store.group_tasks(caller.id(), TaskField::Status).await?;
    Ok(ApiResponse::success(groups))
}

/// GET /api/dashboard/tasks-summary/priority
pub async fn tasks_by_priority(State(state): State<AppState>, caller: Caller) -> ApiResult<Vec<GroupCount>> {
    let groups = state.store.group_tasks(caller.id(), TaskField::Priority).await?;
    Ok(ApiResponse::success(groups))
}

/// GET /api/dashboard/contacts-summary
pub async fn contacts_summary(State(state): State<AppState>, caller: Caller) -> ApiResult<Vec<CompanySummary>> {
    let companies = state.store.company_summary(caller.id()).await?;
    Ok(ApiResponse::success(companies))
}
