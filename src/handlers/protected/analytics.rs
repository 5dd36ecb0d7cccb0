// handlers/protected/analytics.rs - /api/analytics handlers

use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::format::parse_date;
use crate::app::AppState;
use crate::database::models::{SalesOpportunity, StageSummary};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::services::analytics_service;
use crate::services::CombinedAnalytics;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateRangeQuery {
    /// Both bounds required, parseable, and in order
    pub fn bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
        let (Some(start), Some(end)) = (self.start_date.as_deref(), self.end_date.as_deref()) else {
            return Err(ApiError::bad_request("startDate and endDate are required"));
        };

        let start = parse_date(start).ok_or_else(|| ApiError::field("startDate", "Invalid date format"))?;
        let end = parse_date(end).ok_or_else(|| ApiError::field("endDate", "Invalid date format"))?;

        if start > end {
            return Err(ApiError::bad_request("startDate must not be after endDate"));
        }
        Ok((start, end))
    }
}

/// GET /api/analytics - Task, contact and sales bundles; a failed bundle is `{}`
pub async fn combined(State(state): State<AppState>, caller: Caller) -> ApiResult<CombinedAnalytics> {
    let store = &*state.store;
    let analytics = analytics_service::combined(store, store, store, caller.id()).await;
    Ok(ApiResponse::success(analytics))
}

/// GET /api/analytics/sales-by-date-range?startDate&endDate
pub async fn sales_by_date_range(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<DateRangeQuery>,
) -> ApiResult<Vec<SalesOpportunity>> {
    let (start, end) = query.bounds()?;
    let sales = state.store.sales_closing_between(caller.id(), start, end).await?;
    Ok(ApiResponse::success(sales))
}

/// GET /api/analytics/sales-pipeline-summary
pub async fn sales_pipeline_summary(State(state): State<AppState>, caller: Caller) -> ApiResult<Vec<StageSummary>> {
    let pipeline = state.store.pipeline_summary(caller.id()).await?;
    Ok(ApiResponse::success(pipeline))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(start: Option<&str>, end: Option<&str>) -> DateRangeQuery {
        DateRangeQuery {
            start_date: start.map(String::from),
            end_date: end.map(String::from),
        }
    }

    #[test]
    fn both_bounds_are_required() {
        assert!(query(Some("2025-01-01"), None).bounds().is_err());
        assert!(query(None, None).bounds().is_err());
    }

    #[test]
    fn bounds_must_parse_and_be_ordered() {
        assert!(query(Some("yesterday"), Some("2025-01-01")).bounds().is_err());
        assert!(query(Some("2025-02-01"), Some("2025-01-01")).bounds().is_err());

        let (start, end) = query(Some("01/01/2025"), Some("2025-01-01")).bounds().unwrap();
        assert_eq!(start, end);
    }
}
