// handlers/protected/mod.rs - Protected handlers (bearer JWT required)
//
// Every handler receives the caller via the `Caller` extractor and passes it to
// storage, which only ever touches records owned by that caller.

pub mod analytics;
pub mod contacts;
pub mod dashboard;
pub mod sales;
pub mod tasks;

use uuid::Uuid;

use crate::error::ApiError;

/// Parse a path id. A malformed id cannot belong to the caller, so it gets
/// the same answer as any other miss.
pub(crate) fn record_id(raw: &str, resource: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found_or_unauthorized(resource))
}

/// Reject missing or whitespace-only required text
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::field(field, format!("{} is required", field)));
    }
    Ok(())
}

/// Same check for fields a patch may or may not carry
pub(crate) fn require_text_opt(field: &str, value: Option<&str>) -> Result<(), ApiError> {
    match value {
        Some(v) => require_text(field, v),
        None => Ok(()),
    }
}
