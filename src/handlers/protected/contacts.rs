// handlers/protected/contacts.rs - /api/contacts handlers

use axum::extract::{Path, State};

use crate::api::ValidJson;
use crate::app::AppState;
use crate::database::models::{Contact, ContactPatch, NewContact};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Caller, Removed};

use super::{record_id, require_text, require_text_opt};

const RESOURCE: &str = "Contact";

fn validate_new(new: &NewContact) -> Result<(), ApiError> {
    require_text("firstName", &new.first_name)?;
    require_text("lastName", &new.last_name)?;
    require_text("email", &new.email)?;
    require_text("phone", &new.phone)
}

fn validate_patch(patch: &ContactPatch) -> Result<(), ApiError> {
    require_text_opt("firstName", patch.first_name.as_deref())?;
    require_text_opt("lastName", patch.last_name.as_deref())?;
    require_text_opt("email", patch.email.as_deref())?;
    require_text_opt("phone", patch.phone.as_deref())
}

/// GET /api/contacts - All of the caller's contacts, most recently updated first
pub async fn list(State(state): State<AppState>, caller: Caller) -> ApiResult<Vec<Contact>> {
    let contacts = state.store.list_contacts(caller.id()).await?;
    Ok(ApiResponse::success(contacts))
}

/// POST /api/contacts - 409 when the email is already taken
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    ValidJson(new): ValidJson<NewContact>,
) -> ApiResult<Contact> {
    validate_new(&new)?;

    let contact = state.store.create_contact(caller.id(), new).await?;
    tracing::info!("Contact {} created by {}", contact.id, caller.id());

    Ok(ApiResponse::created(contact))
}

/// GET /api/contacts/:id
pub async fn get(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<Contact> {
    let id = record_id(&id, RESOURCE)?;

    state
        .store
        .find_contact(caller.id(), id)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found_or_unauthorized(RESOURCE))
}

/// PUT /api/contacts/:id
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ValidJson(patch): ValidJson<ContactPatch>,
) -> ApiResult<Contact> {
    let id = record_id(&id, RESOURCE)?;
    validate_patch(&patch)?;

    state
        .store
        .update_contact(caller.id(), id, patch)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found_or_unauthorized(RESOURCE))
}

/// DELETE /api/contacts/:id
pub async fn delete(State(state): State<AppState>, caller: Caller, Path(id): Path<String>) -> ApiResult<Removed> {
    let id = record_id(&id, RESOURCE)?;

    match state.store.delete_contact(caller.id(), id).await? {
        Some(contact) => {
            tracing::info!("Contact {} deleted by {}", contact.id, caller.id());
            Ok(ApiResponse::success(Removed::new(RESOURCE)))
        }
        None => Err(ApiError::not_found_or_unauthorized(RESOURCE)),
    }
}
