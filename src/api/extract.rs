// Request extractors that report failures through ApiError instead of
// axum's default plain-text rejections.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, StatusCode},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::app::AppState;
use crate::config::PaginationConfig;
use crate::error::ApiError;

/// JSON body whose parse failures become 400 INVALID_JSON. Bodies over the
/// configured size limit are 413.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Err(ApiError::payload_too_large("Request body is too large"))
            }
            Err(rejection) => Err(ApiError::invalid_json(rejection.body_text())),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PageParams {
    page: Option<String>,
    limit: Option<String>,
}

/// Validated `page`/`limit` query parameters (1-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
}

impl Pagination {
    /// Absent or empty values fall back to defaults; `limit` is clamped to the configured maximum
    pub fn parse(page: Option<&str>, limit: Option<&str>, config: &PaginationConfig) -> Result<Self, ApiError> {
        let page = positive("page", page, 1)?;
        let limit = positive("limit", limit, config.default_limit as usize)?;
        let max_limit = (config.max_limit as usize).max(1);

        Ok(Self {
            page,
            limit: limit.min(max_limit),
        })
    }
}

fn positive(name: &str, raw: Option<&str>, default: usize) -> Result<usize, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default.max(1)),
        Some(s) => s
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ApiError::bad_request(format!("'{}' must be a positive integer.", name))),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Pagination {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PageParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        Pagination::parse(params.page.as_deref(), params.limit.as_deref(), &state.config.pagination)
    }
}
