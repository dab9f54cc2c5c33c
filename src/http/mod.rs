//! Axum HTTP binding for the token, authorization, and sample resource endpoints.

pub mod context;
mod handler_authorize;
mod handler_resource;
mod handler_token;
pub mod server;
pub mod utils_request;

pub use context::{AppEngine, AppState};
pub use server::build_router;
