mod items;
mod uploads;

use crate::api::response::ApiError;

pub use items::{create_item, delete_item, list_items, patch_item, update_item};
pub use uploads::serve_upload;

/// Fallback for any unmatched method/path pair.
pub async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
