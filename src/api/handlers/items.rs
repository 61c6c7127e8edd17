use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::api::multipart::{read_item_form, FormError, ItemForm};
use crate::api::response::{ApiError, AppJson, MessageBody};
use crate::store::models::{Item, ItemUpdate, Patch, Quantity};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub message: String,
    pub item: Item,
}

#[derive(Debug, Deserialize)]
pub struct PatchItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<Quantity>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
}

/// Distinguishes between a missing field (`None`) and an explicit `null` (`Some(None)`).
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: DeserializeOwned,
    D: Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn list_items(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Item>>, ApiError> {
    let items = state
        .store
        .load()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let form = read_item_form(&mut multipart, &state.blobs)
        .await
        .map_err(form_error)?;

    // The image may have streamed to disk before the text fields arrived, so
    // validation failures must reclaim it -- nothing references it yet.
    let fields = match validate_form(&state, &form) {
        Ok(fields) => fields,
        Err(e) => {
            discard_blob(&state, form.image.as_deref()).await;
            return Err(e);
        }
    };

    let item = Item {
        id: uuid::Uuid::new_v4().to_string(),
        name: fields.name,
        quantity: fields.quantity,
        category: fields.category,
        image: form.image.clone(),
    };

    if let Err(e) = state.store.append(item.clone()).await {
        discard_blob(&state, form.image.as_deref()).await;
        return Err(ApiError::internal(e.to_string()));
    }

    tracing::debug!(item_id = %item.id, "Created item");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Item added".to_string(),
            id: item.id,
            image: item.image,
        }),
    ))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ItemResponse>, ApiError> {
    let form = read_item_form(&mut multipart, &state.blobs)
        .await
        .map_err(form_error)?;

    let fields = match validate_form(&state, &form) {
        Ok(fields) => fields,
        Err(e) => {
            discard_blob(&state, form.image.as_deref()).await;
            return Err(e);
        }
    };

    let update = ItemUpdate {
        name: Some(fields.name),
        quantity: Some(fields.quantity),
        category: match fields.category {
            Some(category) => Patch::Value(category),
            None => Patch::Absent,
        },
        image: form.image.clone(),
    };

    let outcome = match state.store.update(&id, update).await {
        Ok(Some(outcome)) => outcome,
        Ok(None) => {
            discard_blob(&state, form.image.as_deref()).await;
            return Err(ApiError::not_found("Item not found"));
        }
        Err(e) => {
            discard_blob(&state, form.image.as_deref()).await;
            return Err(ApiError::internal(e.to_string()));
        }
    };

    // The superseded blob goes away only after the commit has succeeded
    discard_blob(&state, outcome.superseded_image.as_deref()).await;

    tracing::debug!(item_id = %id, "Updated item");

    Ok(Json(ItemResponse {
        message: "Item updated".to_string(),
        item: outcome.item,
    }))
}

pub async fn patch_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<PatchItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    // Blobs enter only through multipart upload; a JSON body can touch the
    // text fields but never `image` or `id`.
    let update = ItemUpdate {
        name: req.name,
        quantity: req.quantity,
        category: Patch::from(req.category),
        image: None,
    };

    let outcome = state
        .store
        .update(&id, update)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Item not found"))?;

    tracing::debug!(item_id = %id, "Partially updated item");

    Ok(Json(ItemResponse {
        message: "Item partially updated".to_string(),
        item: outcome.item,
    }))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    let item = state
        .store
        .remove(&id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Item not found"))?;

    // Commit first, reclaim the blob after
    discard_blob(&state, item.image.as_deref()).await;

    tracing::debug!(item_id = %id, "Deleted item");

    Ok(Json(MessageBody {
        message: "Item and associated image deleted".to_string(),
    }))
}

// ============================================================================
// Helpers
// ============================================================================

struct RequiredFields {
    name: String,
    quantity: Quantity,
    category: Option<String>,
}

/// Enforce the create/full-update contract: `name` and `quantity` non-empty,
/// plus `category` when the service runs the later protocol revision.
fn validate_form(state: &AppState, form: &ItemForm) -> Result<RequiredFields, ApiError> {
    let name = form.name.as_deref().filter(|name| !name.is_empty());
    let quantity = form.quantity.as_deref().filter(|quantity| !quantity.is_empty());
    let category = form.category.as_deref().filter(|category| !category.is_empty());

    let (Some(name), Some(quantity)) = (name, quantity) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    if state.config.require_category && category.is_none() {
        return Err(ApiError::bad_request("Missing required fields"));
    }

    Ok(RequiredFields {
        name: name.to_string(),
        quantity: Quantity::from(quantity.to_string()),
        category: category.map(str::to_string),
    })
}

fn form_error(e: FormError) -> ApiError {
    match e {
        FormError::Malformed(e) => ApiError::bad_request(format!("Image upload failed: {e}")),
        FormError::Blob(e) => ApiError::internal(e.to_string()),
    }
}

/// Best-effort removal of a blob no record references.
async fn discard_blob(state: &AppState, image: Option<&str>) {
    if let Some(name) = image {
        if let Err(e) = state.blobs.delete(name).await {
            tracing::warn!(blob = %name, error = %e, "Failed to remove unreferenced blob");
        }
    }
}
