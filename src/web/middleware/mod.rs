//! Middleware for Web API.

pub mod auth;
pub mod cors;
pub mod rate_limit;
pub mod request_log;
pub mod security;

pub use auth::{jwt_auth, AuthUser, JwtClaims, JwtState, OptionalAuthUser, ADMIN_ROLE};
pub use cors::create_cors_layer;
pub use rate_limit::{api_rate_limit, login_rate_limit, RateLimitState};
pub use request_log::log_failures;
pub use security::security_headers;
