//! shopping-list - a single-collection CRUD API backed by plain files
//!
//! This crate serves one shopping list over HTTP with:
//! - A single JSON document on disk as the collection, swapped in atomically
//! - Image blobs stored as write-once files under collision-resistant names
//! - Streaming multipart decode -- uploads reach disk without buffering
//! - REST API over axum

pub mod api;
pub mod blob;
pub mod config;
pub mod store;

use blob::BlobStore;
use config::Config;
use store::DocumentStore;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub store: DocumentStore,
    pub blobs: BlobStore,
}
