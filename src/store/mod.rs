pub mod document;
mod items;
pub mod models;

pub use document::{DocumentStore, StoreError};
