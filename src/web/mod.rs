//! Web API module for cloudbox.
//!
//! A JSON API over the file, trash, comment and account services, with
//! JWT bearer authentication and an OpenAPI document.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_router, RouterOptions};
pub use server::WebServer;
