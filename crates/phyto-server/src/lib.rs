//! HTTP surface of the diagnosis gateway.
//!
//! - `POST /classify`: multipart upload, one `image` field
//! - `POST /chat`: JSON treatment question, always answered
//! - `GET /health`: liveness

pub mod app;
pub mod handlers;
pub mod routes;

pub use app::{AppBootstrap, AppState};
pub use routes::routes;
