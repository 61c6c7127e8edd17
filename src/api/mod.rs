pub mod handlers;
pub mod multipart;
pub mod response;
mod routes;

pub use routes::create_router;
