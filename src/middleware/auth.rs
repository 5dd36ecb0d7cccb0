use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated caller identity, injected by `jwt_auth_middleware`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller(pub Uuid);

impl Caller {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("No token, authorization denied"))
    }
}

/// Bearer token gate for every /api route
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;

    let user_id = state.identity.verify(token).map_err(|e| {
        tracing::debug!("Rejected bearer token on {}: {}", request.uri().path(), e);
        ApiError::unauthorized("Token is not valid")
    })?;

    request.extensions_mut().insert(Caller(user_id));

    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("No token, authorization denied")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err("No token, authorization denied"),
        None => Err("Authorization header must use Bearer token format"),
    }
}
