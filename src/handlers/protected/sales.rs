// handlers/protected/sales.rs - /api/sales-opportunities handlers

use axum::extract::{Path, State};

use crate::api::ValidJson;
use crate::app::AppState;
use crate::database::models::{NewSalesOpportunity, SalesOpportunity, SalesOpportunityPatch};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller, Removed};

use super::{record_id, require_text, require_text_opt};

const RESOURCE: &str = "Sales opportunity";

/// GET /api/sales-opportunities
pub async fn list(State(state): State<AppState>, caller: Caller) -> ApiResult<Vec<SalesOpportunity>> {
    let sales = state.store.list_sales(caller.id()).await?;
    Ok(ApiResponse::success(sales))
}

/// POST /api/sales-opportunities - `createdBy` defaults to the caller
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    ValidJson(new): ValidJson<NewSalesOpportunity>,
) -> ApiResult<SalesOpportunity> {
    require_text("title", &new.title)?;

    let sale = state.store.create_sale(caller.id(), new).await?;
    tracing::info!("Sales opportunity {} created by {}", sale.id, caller.id());

    Ok(ApiResponse::created(sale))
}

/// GET /api/sales-opportunities/:id
pub async fn get(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<SalesOpportunity> {
    let id = record_id(&id, RESOURCE)?;

    state
        .store
        .find_sale(caller.id(), id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found_or_unauthorized(RESOURCE))
}

/// PUT /api/sales-opportunities/:id
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<SalesOpportunityPatch>,
) -> ApiResult<SalesOpportunity> {
    let id = record_id(&id, RESOURCE)?;
    require_text_opt("title", patch.title.as_deref())?;

    state
        .store
        .update_sale(caller.id(), id, patch)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found_or_unauthorized(RESOURCE))
}

/// DELETE /api/sales-opportunities/:id
pub async fn delete(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<Removed> {
    let id = record_id(&id, RESOURCE)?;

    match state.store.delete_sale(caller.id(), id).await? {
        Some(sale) => {
            tracing::info!("Sales opportunity {} deleted by {}", sale.id, caller.id());
            Ok(ApiResponse::success(Removed::new(RESOURCE)))
        }
        None => Err(ApiError::not_found_or_unauthorized(RESOURCE)),
    }
}
